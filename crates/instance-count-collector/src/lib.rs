//! instance-count-collector: EC2 instance inventory published as CloudWatch counts
//!
//! Each pass lists the account's regions, fetches every instance per region,
//! groups them by type, location, tenancy and product, and publishes one
//! count metric per group.

pub mod aws;
pub mod config;
pub mod logging;
pub mod operations;
pub mod orchestrator;
pub mod sink;

pub use config::{CollectorConfig, RunSettings};
pub use orchestrator::{Orchestrator, RegionOutcome, RunError, RunReport};
