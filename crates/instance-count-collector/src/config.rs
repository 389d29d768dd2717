//! Configuration types for the collector

use instance_count_common::defaults::{DEFAULT_CONCURRENCY, DEFAULT_METRIC_NAME, DEFAULT_NAMESPACE};

/// Configuration for counting passes
///
/// Built from CLI arguments (with environment fallbacks) in the binary; the
/// library never reads the environment itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectorConfig {
    /// Home region used for region discovery and CloudWatch
    pub region: String,
    /// AWS profile name (overrides default credential resolution)
    pub profile: Option<String>,
    /// CloudWatch namespace
    pub namespace: String,
    /// Metric name shared by every point
    pub metric_name: String,
    /// Log metric batches instead of publishing them
    pub debug: bool,
    /// Number of regions processed concurrently
    pub concurrency: usize,
    /// Lifecycle states to count; empty counts every state
    pub states: Vec<String>,
}

impl CollectorConfig {
    /// Configuration with defaults for everything but the home region
    pub fn new(region: impl Into<String>) -> Self {
        Self {
            region: region.into(),
            profile: None,
            namespace: DEFAULT_NAMESPACE.to_string(),
            metric_name: DEFAULT_METRIC_NAME.to_string(),
            debug: false,
            concurrency: DEFAULT_CONCURRENCY,
            states: Vec::new(),
        }
    }

    /// Settings the orchestrator needs for a pass
    pub fn run_settings(&self) -> RunSettings {
        RunSettings {
            metric_name: self.metric_name.clone(),
            concurrency: self.concurrency,
            debug: self.debug,
        }
    }
}

/// Per-pass orchestrator settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSettings {
    pub metric_name: String,
    pub concurrency: usize,
    pub debug: bool,
}

impl Default for RunSettings {
    fn default() -> Self {
        CollectorConfig::new(String::new()).run_settings()
    }
}
