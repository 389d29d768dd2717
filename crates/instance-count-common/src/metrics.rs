//! Metric shaping for instance counts.
//!
//! This module is the single source of truth for dimension names and their
//! order. The CloudWatch sink maps [`MetricPoint`]s one to one onto
//! `MetricDatum`s, so every point built here carries the same five dimensions
//! in the same order.

use crate::aggregate::AggregatedCounts;
use chrono::{DateTime, Utc};
use serde::Serialize;

/// Dimension names, in the order they appear on every point
pub mod dimensions {
    pub const INSTANCE_TYPE: &str = "InstanceType";
    pub const REGION: &str = "Region";
    pub const LOCATION: &str = "Location";
    pub const TENANCY: &str = "Tenancy";
    pub const PRODUCT: &str = "Product";

    /// All dimension names in emission order
    pub const ORDERED: [&str; 5] = [INSTANCE_TYPE, REGION, LOCATION, TENANCY, PRODUCT];
}

/// Unit attached to every instance count point
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum MetricUnit {
    Count,
}

impl MetricUnit {
    pub fn as_str(self) -> &'static str {
        match self {
            MetricUnit::Count => "Count",
        }
    }
}

/// A named dimension value
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Dimension {
    pub name: &'static str,
    pub value: String,
}

impl Dimension {
    fn new(name: &'static str, value: impl Into<String>) -> Self {
        Self {
            name,
            value: value.into(),
        }
    }
}

/// One data point ready for transmission
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricPoint {
    pub metric_name: String,
    pub timestamp: DateTime<Utc>,
    pub value: u64,
    pub unit: MetricUnit,
    pub dimensions: Vec<Dimension>,
}

impl MetricPoint {
    /// Look up a dimension value by name
    pub fn dimension(&self, name: &str) -> Option<&str> {
        self.dimensions
            .iter()
            .find(|d| d.name == name)
            .map(|d| d.value.as_str())
    }
}

/// Derive the region from an availability zone by dropping one trailing
/// lowercase letter.
///
/// `"us-west-2a"` becomes `"us-west-2"`. Locations without a letter suffix,
/// and single-character locations, are returned unchanged. Local zones such
/// as `"us-east-1-bos-1a"` only lose the final letter.
pub fn region_from_location(location: &str) -> &str {
    let mut chars = location.chars();
    match chars.next_back() {
        Some(last) if last.is_ascii_lowercase() && !chars.as_str().is_empty() => chars.as_str(),
        _ => location,
    }
}

/// Build one point per aggregated group, all sharing `timestamp`.
///
/// Points come out in the counts' key order. No groups means no points,
/// which is not an error.
pub fn build_metric_points(
    metric_name: &str,
    timestamp: DateTime<Utc>,
    counts: &AggregatedCounts,
) -> Vec<MetricPoint> {
    counts
        .iter()
        .map(|(key, count)| MetricPoint {
            metric_name: metric_name.to_string(),
            timestamp,
            value: count,
            unit: MetricUnit::Count,
            dimensions: vec![
                Dimension::new(dimensions::INSTANCE_TYPE, &key.size),
                Dimension::new(dimensions::REGION, region_from_location(&key.location)),
                Dimension::new(dimensions::LOCATION, &key.location),
                Dimension::new(dimensions::TENANCY, &key.tenancy),
                Dimension::new(dimensions::PRODUCT, &key.product),
            ],
        })
        .collect()
}

/// Sum of point values
pub fn total(points: &[MetricPoint]) -> u64 {
    points.iter().map(|p| p.value).sum()
}
