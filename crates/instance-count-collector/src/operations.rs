//! Collaborator traits for the counting pipeline
//!
//! These abstract the cloud provider and the metrics backend so the
//! orchestrator can be driven by mocks in tests. Implementations are handed
//! to the orchestrator at construction; nothing here is global.

use crate::aws::{AwsError, TransmitError};
use chrono::{DateTime, Utc};
use instance_count_common::{MetricPoint, RawInstance};

/// Lists the regions to inventory
#[allow(async_fn_in_trait)] // Internal use only, Send+Sync bounds on trait are sufficient
#[cfg_attr(test, mockall::automock)]
pub trait RegionLister: Send + Sync {
    /// List region identifiers
    async fn list_regions(&self) -> Result<Vec<String>, AwsError>;
}

/// Fetches raw instance records for one region
#[allow(async_fn_in_trait)]
#[cfg_attr(test, mockall::automock)]
pub trait InstanceFetcher: Send + Sync {
    /// Fetch every instance in `region`, following pagination
    async fn fetch_instances(&self, region: &str) -> Result<Vec<RawInstance>, AwsError>;
}

/// Delivers a batch of metric points
#[allow(async_fn_in_trait)]
#[cfg_attr(test, mockall::automock)]
pub trait MetricSink: Send + Sync {
    /// Transmit one region's batch. `timestamp` is the pass timestamp shared
    /// by every point. An empty batch is a successful no-op.
    ///
    /// On failure the error says how many points were published before it;
    /// a sink sending in several requests may have delivered a prefix.
    async fn transmit(
        &self,
        timestamp: DateTime<Utc>,
        points: &[MetricPoint],
    ) -> Result<(), TransmitError>;
}

impl<T: RegionLister + ?Sized> RegionLister for &T {
    async fn list_regions(&self) -> Result<Vec<String>, AwsError> {
        (**self).list_regions().await
    }
}

impl<T: InstanceFetcher + ?Sized> InstanceFetcher for &T {
    async fn fetch_instances(&self, region: &str) -> Result<Vec<RawInstance>, AwsError> {
        (**self).fetch_instances(region).await
    }
}

impl<T: MetricSink + ?Sized> MetricSink for &T {
    async fn transmit(
        &self,
        timestamp: DateTime<Utc>,
        points: &[MetricPoint],
    ) -> Result<(), TransmitError> {
        (**self).transmit(timestamp, points).await
    }
}
