//! UTC timestamps for order and subscription bookkeeping.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Immutable point in time, always UTC.
///
/// Serialized as RFC 3339 at the transport boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Timestamp(DateTime<Utc>);

impl Timestamp {
    pub fn now() -> Self {
        Self(Utc::now())
    }

    pub fn from_datetime(dt: DateTime<Utc>) -> Self {
        Self(dt)
    }

    pub fn as_datetime(&self) -> &DateTime<Utc> {
        &self.0
    }

    pub fn is_before(&self, other: &Timestamp) -> bool {
        self.0 < other.0
    }

    pub fn is_after(&self, other: &Timestamp) -> bool {
        self.0 > other.0
    }

    /// Whole days from `other` to `self`, truncated toward zero. Negative
    /// when `other` is later.
    pub fn whole_days_since(&self, other: &Timestamp) -> i64 {
        self.0.signed_duration_since(other.0).num_days()
    }

    /// Negative values move backwards.
    pub fn add_days(&self, days: i64) -> Self {
        Self(self.0 + Duration::days(days))
    }

    pub fn plus_secs(&self, secs: u64) -> Self {
        Self(self.0 + Duration::seconds(secs as i64))
    }

    /// Formats as RFC 3339 with second precision.
    pub fn to_rfc3339(&self) -> String {
        self.0.to_rfc3339_opts(chrono::SecondsFormat::Secs, true)
    }
}

impl Default for Timestamp {
    fn default() -> Self {
        Self::now()
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_rfc3339())
    }
}

impl From<DateTime<Utc>> for Timestamp {
    fn from(dt: DateTime<Utc>) -> Self {
        Self(dt)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(s: &str) -> Timestamp {
        Timestamp::from_datetime(DateTime::parse_from_rfc3339(s).unwrap().with_timezone(&Utc))
    }

    #[test]
    fn ordering_helpers_agree_with_ord() {
        let earlier = at("2024-01-15T10:30:00Z");
        let later = at("2024-01-15T10:30:01Z");

        assert!(earlier.is_before(&later));
        assert!(later.is_after(&earlier));
        assert!(earlier < later);
    }

    #[test]
    fn whole_days_since_truncates_partial_days() {
        let start = at("2024-03-01T12:00:00Z");
        let end = at("2024-03-11T11:59:59Z");
        assert_eq!(end.whole_days_since(&start), 9);
        assert_eq!(start.whole_days_since(&end), -9);
    }

    #[test]
    fn add_days_handles_negative_offsets() {
        let ts = at("2024-03-10T00:00:00Z");
        assert_eq!(ts.add_days(-10), at("2024-02-29T00:00:00Z"));
    }

    #[test]
    fn timestamp_serializes_as_rfc3339() {
        let ts = at("2024-01-15T10:30:00Z");
        let json = serde_json::to_string(&ts).unwrap();
        assert!(json.contains("2024-01-15T10:30:00"));

        let back: Timestamp = serde_json::from_str(&json).unwrap();
        assert_eq!(back, ts);
    }

    #[test]
    fn display_uses_second_precision() {
        assert_eq!(at("2024-01-15T10:30:00Z").to_string(), "2024-01-15T10:30:00Z");
    }

    #[test]
    fn plus_secs_crosses_midnight() {
        let ts = at("2024-01-15T23:59:30Z");
        assert_eq!(ts.plus_secs(60), at("2024-01-16T00:00:30Z"));
    }
}
