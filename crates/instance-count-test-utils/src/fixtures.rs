//! Raw instance fixtures
//!
//! Builders produce records shaped like what the EC2 adapter hands the
//! classifier, with every mandatory field present unless removed explicitly.

use chrono::{DateTime, TimeZone, Utc};
use instance_count_common::RawInstance;
use instance_count_common::instance::fields;
use rand::Rng;
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use std::sync::atomic::{AtomicU32, Ordering};

const SIZES: &[&str] = &["t3.micro", "t3.small", "m5.large", "c6i.xlarge", "r7g.2xlarge"];
const ZONES: &[&str] = &[
    "us-east-1a",
    "us-east-1b",
    "us-west-2a",
    "us-east-1-bos-1a",
    "eu-central-1c",
];
const TENANCIES: &[&str] = &["default", "dedicated", "host"];
const STATES: &[&str] = &["pending", "running", "stopping", "stopped"];

/// The as-of instant used by tests that pin the pass timestamp
pub fn fixed_timestamp() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap()
}

fn next_instance_id() -> String {
    static COUNTER: AtomicU32 = AtomicU32::new(0);
    format!("i-{:017x}", COUNTER.fetch_add(1, Ordering::Relaxed))
}

/// Builder for [`RawInstance`] test records.
///
/// Defaults to a running linux `m5.large` in `us-west-2a` with default
/// tenancy and a unique instance id.
///
/// ```
/// use instance_count_test_utils::RawInstanceBuilder;
///
/// let raw = RawInstanceBuilder::new().instance_type("t2.micro").platform("Windows").build();
/// assert_eq!(raw.platform.as_deref(), Some("Windows"));
/// ```
#[derive(Debug, Clone)]
pub struct RawInstanceBuilder {
    raw: RawInstance,
}

impl Default for RawInstanceBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl RawInstanceBuilder {
    pub fn new() -> Self {
        Self {
            raw: RawInstance {
                instance_id: Some(next_instance_id()),
                instance_type: Some("m5.large".to_string()),
                availability_zone: Some("us-west-2a".to_string()),
                tenancy: Some("default".to_string()),
                platform: None,
                state: Some("running".to_string()),
            },
        }
    }

    pub fn instance_id(mut self, id: &str) -> Self {
        self.raw.instance_id = Some(id.to_string());
        self
    }

    pub fn instance_type(mut self, size: &str) -> Self {
        self.raw.instance_type = Some(size.to_string());
        self
    }

    pub fn zone(mut self, zone: &str) -> Self {
        self.raw.availability_zone = Some(zone.to_string());
        self
    }

    pub fn tenancy(mut self, tenancy: &str) -> Self {
        self.raw.tenancy = Some(tenancy.to_string());
        self
    }

    pub fn platform(mut self, platform: &str) -> Self {
        self.raw.platform = Some(platform.to_string());
        self
    }

    pub fn state(mut self, state: &str) -> Self {
        self.raw.state = Some(state.to_string());
        self
    }

    /// Clear a field by its classifier name (see `instance::fields`).
    ///
    /// Panics on unknown field names so typos fail the test loudly.
    pub fn without(mut self, field: &str) -> Self {
        match field {
            fields::INSTANCE_TYPE => self.raw.instance_type = None,
            fields::AVAILABILITY_ZONE => self.raw.availability_zone = None,
            fields::TENANCY => self.raw.tenancy = None,
            fields::STATE => self.raw.state = None,
            other => panic!("unknown instance field: {other}"),
        }
        self
    }

    pub fn build(self) -> RawInstance {
        self.raw
    }
}

/// A reproducible fleet of `count` valid records spread over a few zones,
/// sizes, tenancies and platforms.
pub fn random_fleet(seed: u64, count: usize) -> Vec<RawInstance> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..count)
        .map(|_| {
            let mut builder = RawInstanceBuilder::new()
                .instance_type(SIZES.choose(&mut rng).copied().unwrap_or("m5.large"))
                .zone(ZONES.choose(&mut rng).copied().unwrap_or("us-west-2a"))
                .tenancy(TENANCIES.choose(&mut rng).copied().unwrap_or("default"))
                .state(STATES.choose(&mut rng).copied().unwrap_or("running"));
            if rng.gen_bool(0.25) {
                builder = builder.platform("windows");
            }
            builder.build()
        })
        .collect()
}
