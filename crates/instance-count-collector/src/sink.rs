//! Metric sink selection
//!
//! In debug mode batches are logged instead of transmitted; otherwise they
//! go to CloudWatch. The choice is made once, from configuration.

use crate::aws::{AwsContext, CloudWatchSink, TransmitError};
use crate::config::CollectorConfig;
use crate::operations::MetricSink;
use chrono::{DateTime, Utc};
use instance_count_common::MetricPoint;
use tracing::{debug, info};

/// Sink that logs each point instead of publishing it
#[derive(Debug, Clone)]
pub struct LogSink {
    namespace: String,
}

impl LogSink {
    pub fn new(namespace: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
        }
    }
}

impl MetricSink for LogSink {
    async fn transmit(
        &self,
        timestamp: DateTime<Utc>,
        points: &[MetricPoint],
    ) -> Result<(), TransmitError> {
        info!(
            namespace = %self.namespace,
            timestamp = %timestamp,
            points = points.len(),
            "Debug mode, logging metric data instead of publishing"
        );
        for point in points {
            match serde_json::to_string_pretty(point) {
                Ok(json) => debug!("MD: {json}"),
                Err(e) => debug!(error = %e, point = ?point, "MD"),
            }
        }
        Ok(())
    }
}

/// The sink used by the binary
pub enum CollectorSink {
    CloudWatch(CloudWatchSink),
    Log(LogSink),
}

impl CollectorSink {
    /// Log sink when `debug` is set, CloudWatch otherwise
    pub fn from_config(ctx: &AwsContext, config: &CollectorConfig) -> Self {
        if config.debug {
            CollectorSink::Log(LogSink::new(&config.namespace))
        } else {
            CollectorSink::CloudWatch(CloudWatchSink::from_context(ctx, &config.namespace))
        }
    }

    pub fn is_debug(&self) -> bool {
        matches!(self, CollectorSink::Log(_))
    }
}

impl MetricSink for CollectorSink {
    async fn transmit(
        &self,
        timestamp: DateTime<Utc>,
        points: &[MetricPoint],
    ) -> Result<(), TransmitError> {
        match self {
            CollectorSink::CloudWatch(sink) => sink.transmit(timestamp, points).await,
            CollectorSink::Log(sink) => sink.transmit(timestamp, points).await,
        }
    }
}
