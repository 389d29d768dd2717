//! CloudWatch metrics publishing

use crate::aws::context::AwsContext;
use crate::aws::error::{AwsError, TransmitError, from_sdk_error};
use crate::operations::MetricSink;
use aws_sdk_cloudwatch::primitives::DateTime as AwsDateTime;
use aws_sdk_cloudwatch::types::{Dimension, MetricDatum, StandardUnit};
use chrono::{DateTime, Utc};
use instance_count_common::{MetricPoint, MetricUnit};
use std::future::Future;
use tracing::debug;

/// Maximum number of datums accepted by a single `PutMetricData` call
pub const MAX_DATUMS_PER_REQUEST: usize = 1000;

/// Publishes metric points to a CloudWatch namespace
pub struct CloudWatchSink {
    client: aws_sdk_cloudwatch::Client,
    namespace: String,
}

impl CloudWatchSink {
    /// Create a sink publishing into `namespace` in the context's home region
    pub fn from_context(ctx: &AwsContext, namespace: impl Into<String>) -> Self {
        Self {
            client: ctx.cloudwatch_client(),
            namespace: namespace.into(),
        }
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }
}

impl MetricSink for CloudWatchSink {
    async fn transmit(
        &self,
        timestamp: DateTime<Utc>,
        points: &[MetricPoint],
    ) -> Result<(), TransmitError> {
        send_batches(datum_batches(timestamp, points), |batch| async move {
            debug!(
                namespace = %self.namespace,
                datums = batch.len(),
                "Putting metric data"
            );

            self.client
                .put_metric_data()
                .namespace(&self.namespace)
                .set_metric_data(Some(batch))
                .send()
                .await
                .map(|_| ())
                .map_err(|e| from_sdk_error(&e))
        })
        .await
    }
}

/// Send batches in order through `put`, stopping at the first failure.
///
/// `PutMetricData` requests are independent, so batches sent before a
/// failing one stay published. The error carries how many points that was.
pub async fn send_batches<F, Fut>(
    batches: Vec<Vec<MetricDatum>>,
    mut put: F,
) -> Result<(), TransmitError>
where
    F: FnMut(Vec<MetricDatum>) -> Fut,
    Fut: Future<Output = Result<(), AwsError>>,
{
    let mut delivered = 0;
    for batch in batches {
        let len = batch.len();
        put(batch)
            .await
            .map_err(|source| TransmitError { delivered, source })?;
        delivered += len;
    }
    Ok(())
}

fn standard_unit(unit: MetricUnit) -> StandardUnit {
    match unit {
        MetricUnit::Count => StandardUnit::Count,
    }
}

/// Convert a point into a datum stamped with the pass timestamp
pub fn to_metric_datum(timestamp: DateTime<Utc>, point: &MetricPoint) -> MetricDatum {
    let dimensions = point
        .dimensions
        .iter()
        .map(|d| Dimension::builder().name(d.name).value(&d.value).build())
        .collect();

    MetricDatum::builder()
        .metric_name(&point.metric_name)
        .timestamp(AwsDateTime::from_millis(timestamp.timestamp_millis()))
        .value(point.value as f64)
        .unit(standard_unit(point.unit))
        .set_dimensions(Some(dimensions))
        .build()
}

/// Split points into request-sized datum batches. No points, no batches.
pub fn datum_batches(timestamp: DateTime<Utc>, points: &[MetricPoint]) -> Vec<Vec<MetricDatum>> {
    points
        .chunks(MAX_DATUMS_PER_REQUEST)
        .map(|chunk| chunk.iter().map(|p| to_metric_datum(timestamp, p)).collect())
        .collect()
}
