//! Instance records and their canonical grouping keys
//!
//! A [`RawInstance`] is what a fetcher hands back for one instance, with every
//! field optional. [`classify`] turns it into an [`InstanceRecord`]: a
//! [`GroupingKey`] plus the lifecycle status.

use crate::defaults::DEFAULT_PRODUCT;
use serde::Serialize;
use thiserror::Error;

/// Field names reported by [`MalformedRecord`]
pub mod fields {
    pub const INSTANCE_TYPE: &str = "instance_type";
    pub const AVAILABILITY_ZONE: &str = "availability_zone";
    pub const TENANCY: &str = "tenancy";
    pub const STATE: &str = "state";
}

/// One instance as returned by the cloud provider, before validation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawInstance {
    /// Provider instance id, used only for error context
    pub instance_id: Option<String>,
    /// Instance type (e.g., "m5.large")
    pub instance_type: Option<String>,
    /// Availability zone (e.g., "us-west-2a")
    pub availability_zone: Option<String>,
    /// Placement tenancy ("default", "dedicated" or "host")
    pub tenancy: Option<String>,
    /// Platform; absent for Linux/UNIX instances
    pub platform: Option<String>,
    /// Lifecycle state name (e.g., "running")
    pub state: Option<String>,
}

/// Canonical identity used to bucket instances for counting.
///
/// Ordering is lexicographic over the fields in declaration order, so a
/// `BTreeMap<GroupingKey, _>` iterates size first, then location, tenancy
/// and product.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct GroupingKey {
    pub size: String,
    pub location: String,
    pub tenancy: String,
    pub product: String,
}

impl GroupingKey {
    pub fn new(
        size: impl Into<String>,
        location: impl Into<String>,
        tenancy: impl Into<String>,
        product: impl Into<String>,
    ) -> Self {
        Self {
            size: size.into(),
            location: location.into(),
            tenancy: tenancy.into(),
            product: product.into(),
        }
    }
}

/// A classified instance: its grouping key and lifecycle status
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstanceRecord {
    pub key: GroupingKey,
    pub status: String,
}

/// A raw instance is missing a field needed to classify it
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("instance {} is missing mandatory field '{field}'", .instance_id.as_deref().unwrap_or("<unknown>"))]
pub struct MalformedRecord {
    /// Name of the missing field, one of [`fields`]
    pub field: &'static str,
    /// Instance id, when the provider returned one
    pub instance_id: Option<String>,
}

/// Classify a raw instance into its grouping key and status.
///
/// Instance type, availability zone, tenancy and state are mandatory. A
/// missing platform falls back to [`DEFAULT_PRODUCT`]; a present one is kept
/// verbatim.
pub fn classify(raw: &RawInstance) -> Result<InstanceRecord, MalformedRecord> {
    let require = |value: &Option<String>, field: &'static str| {
        value.clone().ok_or_else(|| MalformedRecord {
            field,
            instance_id: raw.instance_id.clone(),
        })
    };

    let size = require(&raw.instance_type, fields::INSTANCE_TYPE)?;
    let location = require(&raw.availability_zone, fields::AVAILABILITY_ZONE)?;
    let tenancy = require(&raw.tenancy, fields::TENANCY)?;
    let status = require(&raw.state, fields::STATE)?;
    let product = raw
        .platform
        .clone()
        .unwrap_or_else(|| DEFAULT_PRODUCT.to_string());

    Ok(InstanceRecord {
        key: GroupingKey {
            size,
            location,
            tenancy,
            product,
        },
        status,
    })
}

/// Classify every raw instance, stopping at the first malformed one.
pub fn classify_all(raw: &[RawInstance]) -> Result<Vec<InstanceRecord>, MalformedRecord> {
    raw.iter().map(classify).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(platform: Option<&str>) -> RawInstance {
        RawInstance {
            instance_id: Some("i-0123456789abcdef0".to_string()),
            instance_type: Some("m5.large".to_string()),
            availability_zone: Some("us-west-2a".to_string()),
            tenancy: Some("default".to_string()),
            platform: platform.map(str::to_string),
            state: Some("running".to_string()),
        }
    }

    #[test]
    fn test_classify_complete_record() {
        let record = classify(&raw(Some("Windows"))).unwrap();
        assert_eq!(
            record.key,
            GroupingKey::new("m5.large", "us-west-2a", "default", "Windows")
        );
        assert_eq!(record.status, "running");
    }

    #[test]
    fn test_missing_platform_defaults_to_linux() {
        let record = classify(&raw(None)).unwrap();
        assert_eq!(record.key.product, DEFAULT_PRODUCT);
        assert_eq!(record.key.product, "Linux/UNIX");
    }

    #[test]
    fn test_platform_kept_verbatim() {
        // The EC2 API reports "windows"; no case folding happens here
        let record = classify(&raw(Some("windows"))).unwrap();
        assert_eq!(record.key.product, "windows");
    }

    #[test]
    fn test_missing_mandatory_fields() {
        let cases: [(fn(&mut RawInstance), &str); 4] = [
            (|r| r.instance_type = None, fields::INSTANCE_TYPE),
            (|r| r.availability_zone = None, fields::AVAILABILITY_ZONE),
            (|r| r.tenancy = None, fields::TENANCY),
            (|r| r.state = None, fields::STATE),
        ];

        for (strip, field) in cases {
            let mut record = raw(None);
            strip(&mut record);
            let err = classify(&record).unwrap_err();
            assert_eq!(err.field, field);
            assert_eq!(err.instance_id.as_deref(), Some("i-0123456789abcdef0"));
        }
    }

    #[test]
    fn test_malformed_record_display() {
        let err = MalformedRecord {
            field: fields::TENANCY,
            instance_id: None,
        };
        assert_eq!(
            err.to_string(),
            "instance <unknown> is missing mandatory field 'tenancy'"
        );
    }

    #[test]
    fn test_classify_all_stops_at_first_malformed() {
        let mut bad = raw(None);
        bad.tenancy = None;
        bad.instance_id = Some("i-bad".to_string());

        let err = classify_all(&[raw(None), bad, raw(None)]).unwrap_err();
        assert_eq!(err.instance_id.as_deref(), Some("i-bad"));

        assert_eq!(classify_all(&[raw(None), raw(None)]).unwrap().len(), 2);
        assert!(classify_all(&[]).unwrap().is_empty());
    }

    #[test]
    fn test_grouping_key_ordering_is_field_order() {
        let a = GroupingKey::new("m5.large", "us-west-2b", "default", "Linux/UNIX");
        let b = GroupingKey::new("m5.xlarge", "us-east-1a", "default", "Linux/UNIX");
        let c = GroupingKey::new("m5.large", "us-west-2b", "dedicated", "Linux/UNIX");
        assert!(a < b, "size compares first");
        assert!(a < c, "tenancy breaks ties after location");
    }
}
