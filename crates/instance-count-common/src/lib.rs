//! instance-count-common - Instance classification and metric shaping
//!
//! This crate holds the pure part of instance-count, without any AWS SDK
//! dependencies so it can be tested without credentials or network.
//!
//! ## Modules
//!
//! - [`instance`]: raw instance records, grouping keys and classification
//! - [`aggregate`]: per-key counting with deterministic ordering
//! - [`metrics`]: metric points, dimension names and region derivation
//! - [`defaults`]: default configuration values

pub mod aggregate;
pub mod defaults;
pub mod instance;
pub mod metrics;

// Re-export commonly used types
pub use aggregate::AggregatedCounts;
pub use instance::{GroupingKey, InstanceRecord, MalformedRecord, RawInstance, classify, classify_all};
pub use metrics::{Dimension, MetricPoint, MetricUnit, build_metric_points, region_from_location};
