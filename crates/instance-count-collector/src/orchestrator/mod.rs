//! Counting pass orchestration
//!
//! A pass lists regions once, then runs an independent pipeline per region:
//! fetch, classify, aggregate, build points, log the total, transmit. Region
//! pipelines run concurrently up to `RunSettings::concurrency`. A failing
//! region is recorded in the report and never stops the others; only region
//! discovery can fail the whole pass.

mod types;

pub use types::{
    FailureKind, RegionError, RegionOutcome, RegionReport, RegionSummary, RunError, RunReport,
};

use crate::aws::{AwsContext, Ec2InstanceFetcher, Ec2RegionLister, FromAwsContext};
use crate::config::{CollectorConfig, RunSettings};
use crate::operations::{InstanceFetcher, MetricSink, RegionLister};
use crate::sink::CollectorSink;
use chrono::{DateTime, Utc};
use futures::StreamExt;
use futures::stream;
use instance_count_common::metrics::total;
use instance_count_common::{AggregatedCounts, build_metric_points, classify_all};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// Drives counting passes over injected collaborators
pub struct Orchestrator<L, F, S> {
    lister: L,
    fetcher: F,
    sink: S,
    settings: RunSettings,
}

/// Orchestrator wired to EC2 and CloudWatch (or the log sink in debug mode)
pub type AwsOrchestrator = Orchestrator<Ec2RegionLister, Ec2InstanceFetcher, CollectorSink>;

impl AwsOrchestrator {
    /// Load AWS configuration and build the production collaborators
    pub async fn from_config(config: &CollectorConfig) -> Self {
        let ctx = AwsContext::with_profile(&config.region, config.profile.as_deref()).await;

        Self::new(
            Ec2RegionLister::from_context(&ctx),
            Ec2InstanceFetcher::from_context(&ctx).with_states(config.states.clone()),
            CollectorSink::from_config(&ctx, config),
            config.run_settings(),
        )
    }
}

impl<L, F, S> Orchestrator<L, F, S>
where
    L: RegionLister,
    F: InstanceFetcher,
    S: MetricSink,
{
    pub fn new(lister: L, fetcher: F, sink: S, settings: RunSettings) -> Self {
        Self {
            lister,
            fetcher,
            sink,
            settings,
        }
    }

    pub fn settings(&self) -> &RunSettings {
        &self.settings
    }

    /// Run one pass with `timestamp` as the as-of instant for every point.
    ///
    /// Once `cancel` fires, regions that have not started are reported as
    /// skipped while in-flight regions run to completion.
    pub async fn run(
        &self,
        timestamp: DateTime<Utc>,
        cancel: &CancellationToken,
    ) -> Result<RunReport, RunError> {
        info!(
            timestamp = %timestamp,
            debug = self.settings.debug,
            concurrency = self.settings.concurrency,
            "Starting instance count pass"
        );

        let regions = self.lister.list_regions().await.map_err(|e| {
            error!(error = %e, suggestion = ?e.suggestion(), "Region discovery failed");
            RunError::Discovery(e)
        })?;
        info!(count = regions.len(), "Discovered regions");

        let mut reports: Vec<(usize, RegionReport)> = stream::iter(regions.into_iter().enumerate())
            .map(|(index, region)| async move {
                let outcome = if cancel.is_cancelled() {
                    debug!(region = %region, "Cancelled, skipping region");
                    RegionOutcome::Skipped
                } else {
                    self.run_region(&region, timestamp).await
                };
                (index, RegionReport { region, outcome })
            })
            .buffer_unordered(self.settings.concurrency.max(1))
            .collect()
            .await;

        reports.sort_by_key(|(index, _)| *index);
        let report = RunReport {
            timestamp,
            regions: reports.into_iter().map(|(_, report)| report).collect(),
        };

        log_summary(&report);
        Ok(report)
    }

    async fn run_region(&self, region: &str, timestamp: DateTime<Utc>) -> RegionOutcome {
        let result = self.process_region(region, timestamp).await;
        if let Err(e) = &result {
            error!(
                region = %region,
                kind = %e.kind(),
                delivered = e.delivered(),
                suggestion = ?e.suggestion(),
                error = %e,
                "Region pass failed"
            );
        }
        result.into()
    }

    /// The per-region pipeline. A malformed record fails the region before
    /// anything is handed to the sink.
    async fn process_region(
        &self,
        region: &str,
        timestamp: DateTime<Utc>,
    ) -> Result<RegionSummary, RegionError> {
        let raw = self
            .fetcher
            .fetch_instances(region)
            .await
            .map_err(RegionError::Fetch)?;

        let records = classify_all(&raw)?;
        let counts = AggregatedCounts::from_records(&records);
        let points = build_metric_points(&self.settings.metric_name, timestamp, &counts);

        let summary = RegionSummary {
            total: total(&points),
            groups: points.len(),
        };
        info!(
            region = %region,
            total = summary.total,
            groups = summary.groups,
            "{region} total instances: {}",
            summary.total
        );

        if points.is_empty() {
            debug!(region = %region, "No instances, nothing to transmit");
            return Ok(summary);
        }

        self.sink
            .transmit(timestamp, &points)
            .await
            .map_err(RegionError::Transmit)?;

        Ok(summary)
    }
}

fn log_summary(report: &RunReport) {
    let skipped = report.skipped();
    if skipped > 0 {
        warn!(skipped, "Pass cancelled before every region started");
    }
    info!(
        timestamp = %report.timestamp,
        regions = report.regions.len(),
        completed = report.completed(),
        failed = report.failed(),
        skipped,
        instances = report.total_instances(),
        "Instance count pass finished"
    );
}
