//! Shared test utilities for integration tests
//!
//! In-memory collaborators that record what the orchestrator asks of them.
//! Record fixtures live in instance-count-test-utils.

#![allow(dead_code)]

use chrono::{DateTime, Utc};
use instance_count_collector::aws::{AwsError, TransmitError, classify_aws_error};
use instance_count_collector::operations::{InstanceFetcher, MetricSink, RegionLister};
use instance_count_common::metrics::dimensions;
use instance_count_common::{MetricPoint, RawInstance};
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use tokio_util::sync::CancellationToken;

pub use instance_count_test_utils::{RawInstanceBuilder, fixed_timestamp, random_fleet};

/// Region lister returning a fixed list, or failing with an error code
pub struct StaticRegionLister {
    regions: Vec<String>,
    failure: Option<&'static str>,
}

impl StaticRegionLister {
    pub fn new(regions: &[&str]) -> Self {
        Self {
            regions: regions.iter().map(|r| r.to_string()).collect(),
            failure: None,
        }
    }

    pub fn failing(code: &'static str) -> Self {
        Self {
            regions: Vec::new(),
            failure: Some(code),
        }
    }
}

impl RegionLister for StaticRegionLister {
    async fn list_regions(&self) -> Result<Vec<String>, AwsError> {
        match self.failure {
            Some(code) => Err(classify_aws_error(Some(code), Some("region discovery failed"))),
            None => Ok(self.regions.clone()),
        }
    }
}

/// Fetcher serving per-region fleets; unknown regions are empty
#[derive(Default)]
pub struct FleetFetcher {
    fleets: HashMap<String, Vec<RawInstance>>,
    failures: HashMap<String, &'static str>,
    cancel_on_fetch: Option<CancellationToken>,
    calls: Mutex<Vec<String>>,
}

impl FleetFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_fleet(mut self, region: &str, fleet: Vec<RawInstance>) -> Self {
        self.fleets.insert(region.to_string(), fleet);
        self
    }

    pub fn with_failure(mut self, region: &str, code: &'static str) -> Self {
        self.failures.insert(region.to_string(), code);
        self
    }

    /// Cancel `token` from inside the first fetch, while that region is in flight
    pub fn cancelling(mut self, token: CancellationToken) -> Self {
        self.cancel_on_fetch = Some(token);
        self
    }

    /// Regions fetched so far, in call order
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

impl InstanceFetcher for FleetFetcher {
    async fn fetch_instances(&self, region: &str) -> Result<Vec<RawInstance>, AwsError> {
        self.calls.lock().unwrap().push(region.to_string());
        if let Some(token) = &self.cancel_on_fetch {
            token.cancel();
        }
        if let Some(code) = self.failures.get(region) {
            return Err(classify_aws_error(Some(code), Some("describe instances failed")));
        }
        Ok(self.fleets.get(region).cloned().unwrap_or_default())
    }
}

/// One transmitted batch
#[derive(Debug, Clone)]
pub struct SentBatch {
    pub timestamp: DateTime<Utc>,
    pub points: Vec<MetricPoint>,
}

impl SentBatch {
    /// Region dimension of the batch's first point
    pub fn region(&self) -> Option<&str> {
        self.points
            .first()
            .and_then(|p| p.dimension(dimensions::REGION))
    }

    pub fn total(&self) -> u64 {
        self.points.iter().map(|p| p.value).sum()
    }
}

/// Sink recording every batch, optionally failing for some regions.
///
/// Failed batches are not recorded. A partial failure reports `delivered`
/// points as already published, the way a multi-request backend would.
#[derive(Default)]
pub struct RecordingSink {
    failing_regions: HashSet<String>,
    partial_regions: HashMap<String, usize>,
    sent: Mutex<Vec<SentBatch>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_for(mut self, region: &str) -> Self {
        self.failing_regions.insert(region.to_string());
        self
    }

    pub fn partially_failing_for(mut self, region: &str, delivered: usize) -> Self {
        self.partial_regions.insert(region.to_string(), delivered);
        self
    }

    pub fn sent(&self) -> Vec<SentBatch> {
        self.sent.lock().unwrap().clone()
    }

    pub fn sent_for(&self, region: &str) -> Option<SentBatch> {
        self.sent().into_iter().find(|b| b.region() == Some(region))
    }
}

impl MetricSink for RecordingSink {
    async fn transmit(
        &self,
        timestamp: DateTime<Utc>,
        points: &[MetricPoint],
    ) -> Result<(), TransmitError> {
        let batch = SentBatch {
            timestamp,
            points: points.to_vec(),
        };
        if batch
            .region()
            .is_some_and(|region| self.failing_regions.contains(region))
        {
            return Err(
                classify_aws_error(Some("InternalFailure"), Some("put metric data failed")).into(),
            );
        }
        if let Some(&delivered) = batch.region().and_then(|r| self.partial_regions.get(r)) {
            return Err(TransmitError {
                delivered,
                source: classify_aws_error(Some("InternalFailure"), Some("put metric data failed")),
            });
        }
        self.sent.lock().unwrap().push(batch);
        Ok(())
    }
}
