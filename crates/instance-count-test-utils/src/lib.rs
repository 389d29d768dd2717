//! Shared test utilities for instance-count
//!
//! Used by the collector's integration tests. It depends on
//! instance-count-common for the record types, so the common crate tests
//! itself with its own inline fixtures.
//!
//! ## Modules
//!
//! - [`aws`]: AWS region detection for live integration tests
//! - [`fixtures`]: raw instance builders and a pinned pass timestamp

pub mod aws;
pub mod fixtures;

pub use aws::get_test_region;
pub use fixtures::{RawInstanceBuilder, fixed_timestamp, random_fleet};
