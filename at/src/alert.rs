//! Alert records, label sets, and fingerprinting

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::AlertError;

/// Identifying and descriptive labels for an alert.
///
/// A BTreeMap keeps iteration order deterministic, which the fingerprint
/// computation depends on.
pub type LabelSet = BTreeMap<String, String>;

/// FNV-1a 64 parameters
const FNV_OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;

/// Byte separating label names and values while hashing, so that
/// `{"ab": "c"}` and `{"a": "bc"}` never collide.
const SEP: u8 = 0xff;

/// Stable identifier of a logical alert, derived from its label set.
///
/// The fingerprint is the sole key used for lookup, merge, and
/// eviction notification. It is immutable for the lifetime of a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Fingerprint(pub u64);

impl Fingerprint {
    /// Hash a label set with FNV-1a 64 over the sorted name/value pairs
    pub fn of(labels: &LabelSet) -> Self {
        let mut hash = FNV_OFFSET;
        let mut mix = |bytes: &[u8]| {
            for &b in bytes {
                hash ^= u64::from(b);
                hash = hash.wrapping_mul(FNV_PRIME);
            }
        };
        for (name, value) in labels {
            mix(name.as_bytes());
            mix(&[SEP]);
            mix(value.as_bytes());
            mix(&[SEP]);
        }
        Self(hash)
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:016x}", self.0)
    }
}

/// A single occurrence of an alert.
///
/// The activity window is half-open: the alert is active while the current
/// time lies within `[starts_at, ends_at)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Alert {
    /// Identifying label set; determines the fingerprint
    pub labels: LabelSet,

    /// Free-form annotations; carry no identity
    #[serde(default)]
    pub annotations: LabelSet,

    /// Start of the activity window
    pub starts_at: DateTime<Utc>,

    /// End of the activity window
    pub ends_at: DateTime<Utc>,

    /// Source that generated this alert
    #[serde(rename = "generatorURL", default)]
    pub generator_url: String,

    /// When this occurrence was last observed or modified
    pub updated_at: DateTime<Utc>,
}

impl Alert {
    /// Create an alert with the given labels and activity window
    pub fn new(labels: LabelSet, starts_at: DateTime<Utc>, ends_at: DateTime<Utc>) -> Self {
        Self {
            labels,
            annotations: LabelSet::new(),
            starts_at,
            ends_at,
            generator_url: String::new(),
            updated_at: Utc::now(),
        }
    }

    /// Fingerprint of the identifying label set
    pub fn fingerprint(&self) -> Fingerprint {
        Fingerprint::of(&self.labels)
    }

    /// Whether the alert is active at the given instant
    pub fn is_active(&self, at: DateTime<Utc>) -> bool {
        self.starts_at <= at && at < self.ends_at
    }

    /// Whether the activity window has ended at the given instant
    pub fn resolved_at(&self, at: DateTime<Utc>) -> bool {
        self.ends_at <= at
    }

    /// Reject malformed records before they reach the store
    pub fn validate(&self) -> Result<(), AlertError> {
        if self.labels.is_empty() {
            return Err(AlertError::Validation("alert has no labels".into()));
        }
        if self.starts_at > self.ends_at {
            return Err(AlertError::Validation(format!(
                "alert window starts after it ends ({} > {})",
                self.starts_at, self.ends_at
            )));
        }
        Ok(())
    }

    /// Merge two occurrences of the same logical alert.
    ///
    /// The more recently updated record contributes annotations and source;
    /// the activity window is widened to cover both records. Labels are
    /// identical by construction (same fingerprint), so the result keeps the
    /// fingerprint of both inputs.
    pub fn merge(&self, other: &Alert) -> Alert {
        // Let `younger` always be the more recently updated record.
        let (older, younger) = if other.updated_at < self.updated_at {
            (other, self)
        } else {
            (self, other)
        };

        let mut res = younger.clone();
        res.starts_at = res.starts_at.min(older.starts_at);
        res.ends_at = res.ends_at.max(older.ends_at);
        res
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use proptest::prelude::*;

    fn labels(pairs: &[(&str, &str)]) -> LabelSet {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    fn alert(pairs: &[(&str, &str)], start_min: i64, end_min: i64) -> Alert {
        let t0 = Utc::now();
        Alert::new(
            labels(pairs),
            t0 + Duration::minutes(start_min),
            t0 + Duration::minutes(end_min),
        )
    }

    #[test]
    fn test_fingerprint_deterministic() {
        let a = labels(&[("alertname", "HighLatency"), ("job", "api")]);
        let b = labels(&[("job", "api"), ("alertname", "HighLatency")]);
        assert_eq!(Fingerprint::of(&a), Fingerprint::of(&b));
    }

    #[test]
    fn test_fingerprint_distinguishes_label_boundaries() {
        let a = labels(&[("ab", "c")]);
        let b = labels(&[("a", "bc")]);
        assert_ne!(Fingerprint::of(&a), Fingerprint::of(&b));
    }

    #[test]
    fn test_fingerprint_distinct_values() {
        let a = labels(&[("alertname", "HighLatency")]);
        let b = labels(&[("alertname", "HighErrorRate")]);
        assert_ne!(Fingerprint::of(&a), Fingerprint::of(&b));
    }

    #[test]
    fn test_active_window_half_open() {
        let a = alert(&[("alertname", "x")], 0, 10);
        assert!(a.is_active(a.starts_at));
        assert!(a.is_active(a.starts_at + Duration::minutes(5)));
        assert!(!a.is_active(a.ends_at));
    }

    #[test]
    fn test_validate_rejects_inverted_window() {
        let a = alert(&[("alertname", "x")], 10, 0);
        assert!(matches!(a.validate(), Err(AlertError::Validation(_))));
    }

    #[test]
    fn test_validate_rejects_empty_labels() {
        let a = alert(&[], 0, 10);
        assert!(matches!(a.validate(), Err(AlertError::Validation(_))));
    }

    #[test]
    fn test_merge_widens_window() {
        let mut first = alert(&[("alertname", "x")], 0, 10);
        let mut second = alert(&[("alertname", "x")], 5, 20);
        first.updated_at = Utc::now() - Duration::seconds(10);
        second.updated_at = Utc::now();

        let merged = first.merge(&second);
        assert_eq!(merged.starts_at, first.starts_at);
        assert_eq!(merged.ends_at, second.ends_at);
        assert_eq!(merged.fingerprint(), first.fingerprint());
    }

    #[test]
    fn test_merge_prefers_newest_metadata() {
        let mut first = alert(&[("alertname", "x")], 0, 10);
        first.annotations = labels(&[("summary", "old")]);
        first.updated_at = Utc::now() - Duration::seconds(10);

        let mut second = alert(&[("alertname", "x")], 5, 20);
        second.annotations = labels(&[("summary", "new")]);
        second.updated_at = Utc::now();

        // Symmetric: the younger record's metadata wins either way.
        let merged = first.merge(&second);
        assert_eq!(merged.annotations["summary"], "new");
        let merged = second.merge(&first);
        assert_eq!(merged.annotations["summary"], "new");
    }

    proptest! {
        #[test]
        fn prop_merged_window_covers_both(s1 in -1000i64..1000, len1 in 0i64..1000,
                                          s2 in -1000i64..1000, len2 in 0i64..1000) {
            let a = alert(&[("alertname", "x")], s1, s1 + len1);
            let b = alert(&[("alertname", "x")], s2, s2 + len2);
            let merged = a.merge(&b);
            prop_assert!(merged.starts_at <= a.starts_at && merged.starts_at <= b.starts_at);
            prop_assert!(merged.ends_at >= a.ends_at && merged.ends_at >= b.ends_at);
        }
    }
}
