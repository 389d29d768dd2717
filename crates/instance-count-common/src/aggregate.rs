//! Per-key instance counting

use crate::instance::{GroupingKey, InstanceRecord};
use std::collections::BTreeMap;

/// Instance counts per grouping key.
///
/// Backed by a `BTreeMap`, so iteration follows [`GroupingKey`]'s structural
/// ordering regardless of the order records were added in.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AggregatedCounts {
    counts: BTreeMap<GroupingKey, u64>,
}

impl AggregatedCounts {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count records in a single pass
    pub fn from_records<'a>(records: impl IntoIterator<Item = &'a InstanceRecord>) -> Self {
        let mut counts = Self::new();
        for record in records {
            counts.add(&record.key);
        }
        counts
    }

    /// Increment the count for `key`
    pub fn add(&mut self, key: &GroupingKey) {
        match self.counts.get_mut(key) {
            Some(count) => *count += 1,
            None => {
                self.counts.insert(key.clone(), 1);
            }
        }
    }

    /// Count for `key`, zero when never seen
    pub fn get(&self, key: &GroupingKey) -> u64 {
        self.counts.get(key).copied().unwrap_or(0)
    }

    /// Number of distinct groups
    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    /// Sum of all counts
    pub fn total(&self) -> u64 {
        self.counts.values().sum()
    }

    /// Groups in key order
    pub fn iter(&self) -> impl Iterator<Item = (&GroupingKey, u64)> {
        self.counts.iter().map(|(key, count)| (key, *count))
    }

    /// Consume into `(key, count)` pairs sorted by key
    pub fn into_sorted_vec(self) -> Vec<(GroupingKey, u64)> {
        self.counts.into_iter().collect()
    }
}
