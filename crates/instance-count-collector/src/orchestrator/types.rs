//! Outcome and error types for counting passes

use crate::aws::{AwsError, TransmitError};
use chrono::{DateTime, Utc};
use instance_count_common::MalformedRecord;
use thiserror::Error;

/// Fatal error for a whole pass
#[derive(Debug, Error)]
pub enum RunError {
    /// Regions could not be listed, nothing was processed
    #[error("Failed to discover regions: {0}")]
    Discovery(#[source] AwsError),
}

/// Failure of one region's pass; other regions are unaffected
#[derive(Debug, Error)]
pub enum RegionError {
    #[error("Failed to fetch instances: {0}")]
    Fetch(#[source] AwsError),

    #[error(transparent)]
    Malformed(#[from] MalformedRecord),

    #[error("Failed to transmit metrics: {0}")]
    Transmit(#[source] TransmitError),
}

impl RegionError {
    pub fn kind(&self) -> FailureKind {
        match self {
            RegionError::Fetch(_) => FailureKind::Fetch,
            RegionError::Malformed(_) => FailureKind::MalformedRecord,
            RegionError::Transmit(_) => FailureKind::Transmit,
        }
    }

    /// Hint for the operator, for AWS errors with a known code
    pub fn suggestion(&self) -> Option<&'static str> {
        match self {
            RegionError::Fetch(e) => e.suggestion(),
            RegionError::Transmit(e) => e.source.suggestion(),
            RegionError::Malformed(_) => None,
        }
    }

    /// Points published before the failure; only a transmit failure can
    /// leave part of a batch delivered
    pub fn delivered(&self) -> usize {
        match self {
            RegionError::Transmit(e) => e.delivered,
            RegionError::Fetch(_) | RegionError::Malformed(_) => 0,
        }
    }
}

/// Which stage of a region's pass failed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    Fetch,
    MalformedRecord,
    Transmit,
}

impl FailureKind {
    pub fn as_str(self) -> &'static str {
        match self {
            FailureKind::Fetch => "fetch",
            FailureKind::MalformedRecord => "malformed_record",
            FailureKind::Transmit => "transmit",
        }
    }
}

impl std::fmt::Display for FailureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of a successful region pass
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegionSummary {
    /// Sum of all point values, equal to the number of instances fetched
    pub total: u64,
    /// Number of points built (distinct grouping keys)
    pub groups: usize,
}

/// What happened to one region during a pass
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegionOutcome {
    Completed(RegionSummary),
    Failed { kind: FailureKind, message: String },
    /// Cancelled before the region's pass started
    Skipped,
}

impl From<Result<RegionSummary, RegionError>> for RegionOutcome {
    fn from(result: Result<RegionSummary, RegionError>) -> Self {
        match result {
            Ok(summary) => RegionOutcome::Completed(summary),
            Err(e) => RegionOutcome::Failed {
                kind: e.kind(),
                message: e.to_string(),
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegionReport {
    pub region: String,
    pub outcome: RegionOutcome,
}

/// Report for one pass, regions in discovery order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunReport {
    pub timestamp: DateTime<Utc>,
    pub regions: Vec<RegionReport>,
}

impl RunReport {
    /// Outcome for a region, if it was discovered
    pub fn outcome(&self, region: &str) -> Option<&RegionOutcome> {
        self.regions
            .iter()
            .find(|r| r.region == region)
            .map(|r| &r.outcome)
    }

    /// Instances counted across completed regions
    pub fn total_instances(&self) -> u64 {
        self.regions
            .iter()
            .filter_map(|r| match r.outcome {
                RegionOutcome::Completed(summary) => Some(summary.total),
                _ => None,
            })
            .sum()
    }

    pub fn completed(&self) -> usize {
        self.count(|o| matches!(o, RegionOutcome::Completed(_)))
    }

    pub fn failed(&self) -> usize {
        self.count(|o| matches!(o, RegionOutcome::Failed { .. }))
    }

    pub fn skipped(&self) -> usize {
        self.count(|o| matches!(o, RegionOutcome::Skipped))
    }

    fn count(&self, pred: impl Fn(&RegionOutcome) -> bool) -> usize {
        self.regions.iter().filter(|r| pred(&r.outcome)).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aws::error::classify_aws_error;
    use instance_count_common::instance::fields;

    fn report(outcomes: Vec<(&str, RegionOutcome)>) -> RunReport {
        RunReport {
            timestamp: Utc::now(),
            regions: outcomes
                .into_iter()
                .map(|(region, outcome)| RegionReport {
                    region: region.to_string(),
                    outcome,
                })
                .collect(),
        }
    }

    #[test]
    fn test_error_kinds() {
        let fetch = RegionError::Fetch(classify_aws_error(Some("AuthFailure"), Some("bad")));
        assert_eq!(fetch.kind(), FailureKind::Fetch);
        assert!(fetch.suggestion().is_some());

        let malformed: RegionError = MalformedRecord {
            field: fields::TENANCY,
            instance_id: Some("i-1".to_string()),
        }
        .into();
        assert_eq!(malformed.kind(), FailureKind::MalformedRecord);
        assert_eq!(
            malformed.to_string(),
            "instance i-1 is missing mandatory field 'tenancy'"
        );
        assert!(malformed.suggestion().is_none());

        let transmit = RegionError::Transmit(classify_aws_error(None, Some("timeout")).into());
        assert_eq!(transmit.kind().to_string(), "transmit");
        assert_eq!(transmit.delivered(), 0);
        assert_eq!(
            transmit.to_string(),
            "Failed to transmit metrics: AWS error: timeout"
        );

        let partial = RegionError::Transmit(TransmitError {
            delivered: 1000,
            source: classify_aws_error(Some("Throttling"), Some("slow down")),
        });
        assert_eq!(partial.delivered(), 1000);
        assert!(partial.suggestion().is_some());
        assert_eq!(
            partial.to_string(),
            "Failed to transmit metrics: Rate limit exceeded: slow down \
             (1000 points were already published)"
        );
    }

    #[test]
    fn test_outcome_from_result() {
        let ok: RegionOutcome = Ok(RegionSummary { total: 3, groups: 2 }).into();
        assert_eq!(ok, RegionOutcome::Completed(RegionSummary { total: 3, groups: 2 }));

        let err: RegionOutcome =
            Err(RegionError::Fetch(classify_aws_error(None, Some("boom")))).into();
        assert!(matches!(
            err,
            RegionOutcome::Failed {
                kind: FailureKind::Fetch,
                ..
            }
        ));
    }

    #[test]
    fn test_report_totals() {
        let report = report(vec![
            (
                "us-east-1",
                RegionOutcome::Completed(RegionSummary { total: 5, groups: 2 }),
            ),
            (
                "us-west-2",
                RegionOutcome::Completed(RegionSummary { total: 0, groups: 0 }),
            ),
            (
                "eu-west-1",
                RegionOutcome::Failed {
                    kind: FailureKind::Transmit,
                    message: "down".to_string(),
                },
            ),
            ("ap-south-1", RegionOutcome::Skipped),
        ]);

        assert_eq!(report.total_instances(), 5);
        assert_eq!(report.completed(), 2);
        assert_eq!(report.failed(), 1);
        assert_eq!(report.skipped(), 1);
        assert_eq!(report.outcome("ap-south-1"), Some(&RegionOutcome::Skipped));
        assert!(report.outcome("sa-east-1").is_none());
    }
}
