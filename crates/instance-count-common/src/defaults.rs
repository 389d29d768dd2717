//! Default configuration values
//!
//! Shared by the collector's CLI and its tests so both agree on what an
//! unconfigured deployment emits.

/// Default CloudWatch namespace
pub const DEFAULT_NAMESPACE: &str = "Trackit";

/// Default metric name for instance counts
pub const DEFAULT_METRIC_NAME: &str = "Instance count";

/// Product reported when an instance has no platform (the EC2 API leaves it
/// empty for Linux/UNIX)
pub const DEFAULT_PRODUCT: &str = "Linux/UNIX";

/// Default number of regions processed concurrently
pub const DEFAULT_CONCURRENCY: usize = 4;

/// Default interval between passes in watch mode, in seconds
pub const DEFAULT_WATCH_INTERVAL_SECS: u64 = 300;
