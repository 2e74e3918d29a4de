//! # Temporal Types — UTC-Only Timestamps
//!
//! Defines `Timestamp`, a UTC-only instant truncated to seconds precision,
//! and the `duration_secs` serde adapter used for policy durations.
//!
//! SLA deadlines are compared against the sweep clock and persisted in
//! several places (work order, violation, notification). Truncating to
//! whole seconds keeps every stored copy byte-identical, so a deadline read
//! back from the store compares equal to the one that was computed.

use std::time::Duration;

use chrono::{DateTime, Timelike, Utc};
use serde::{Deserialize, Serialize};

use crate::error::WorkixError;

/// A UTC-only timestamp, truncated to seconds precision.
///
/// # Construction
///
/// - [`Timestamp::now()`] — current UTC time, truncated.
/// - [`Timestamp::from_utc()`] — from a `DateTime<Utc>`, truncating sub-seconds.
/// - [`Timestamp::parse()`] — from an RFC 3339 string with `Z` suffix.
/// - [`Timestamp::parse_lenient()`] — from any RFC 3339 offset, converted to UTC.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Timestamp(DateTime<Utc>);

impl Timestamp {
    /// Create a timestamp from the current UTC time, truncated to seconds.
    pub fn now() -> Self {
        Self(truncate_to_seconds(Utc::now()))
    }

    /// Create a timestamp from a `chrono::DateTime<Utc>`, truncating sub-seconds.
    pub fn from_utc(dt: DateTime<Utc>) -> Self {
        Self(truncate_to_seconds(dt))
    }

    /// Parse a timestamp from an RFC 3339 string.
    ///
    /// Only the `Z` suffix is accepted; explicit offsets are rejected.
    pub fn parse(s: &str) -> Result<Self, WorkixError> {
        if !s.ends_with('Z') {
            return Err(WorkixError::Temporal(format!(
                "timestamp must use Z suffix (UTC only), got: {s:?}"
            )));
        }
        Self::parse_lenient(s)
    }

    /// Parse a timestamp from an RFC 3339 string, accepting any offset and
    /// converting to UTC.
    pub fn parse_lenient(s: &str) -> Result<Self, WorkixError> {
        let dt = DateTime::parse_from_rfc3339(s)
            .map_err(|e| WorkixError::Temporal(format!("invalid RFC 3339 timestamp {s:?}: {e}")))?;
        Ok(Self(truncate_to_seconds(dt.with_timezone(&Utc))))
    }

    /// Create a timestamp from a Unix epoch timestamp (seconds).
    pub fn from_epoch_secs(secs: i64) -> Result<Self, WorkixError> {
        let dt = DateTime::from_timestamp(secs, 0)
            .ok_or_else(|| WorkixError::Temporal(format!("invalid Unix timestamp: {secs}")))?;
        Ok(Self(dt))
    }

    /// Access the inner `DateTime<Utc>`.
    pub fn as_datetime(&self) -> &DateTime<Utc> {
        &self.0
    }

    /// Returns the Unix epoch timestamp in seconds.
    pub fn epoch_secs(&self) -> i64 {
        self.0.timestamp()
    }

    /// Add a duration, returning `None` on overflow.
    pub fn checked_add(&self, duration: Duration) -> Option<Timestamp> {
        let delta = chrono::Duration::from_std(duration).ok()?;
        self.0.checked_add_signed(delta).map(Self::from_utc)
    }

    /// Time elapsed from `earlier` to `self`, or zero if `earlier` is later.
    pub fn saturating_since(&self, earlier: Timestamp) -> Duration {
        (self.0 - earlier.0).to_std().unwrap_or(Duration::ZERO)
    }

    /// Render as ISO 8601 with Z suffix (e.g., `2026-01-15T12:00:00Z`).
    pub fn to_iso8601(&self) -> String {
        self.0.format("%Y-%m-%dT%H:%M:%SZ").to_string()
    }
}

impl std::fmt::Display for Timestamp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_iso8601())
    }
}

impl From<DateTime<Utc>> for Timestamp {
    fn from(dt: DateTime<Utc>) -> Self {
        Self::from_utc(dt)
    }
}

/// Truncate a `DateTime<Utc>` to seconds precision (discard nanoseconds).
fn truncate_to_seconds(dt: DateTime<Utc>) -> DateTime<Utc> {
    dt.with_nanosecond(0).unwrap_or(dt)
}

/// Serde adapter storing a `std::time::Duration` as whole seconds.
///
/// Policy files and database columns carry durations as integer seconds
/// (`response_time: 3600`). Sub-second precision is dropped on write.
pub mod duration_secs {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    /// Serialize as integer seconds.
    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(d.as_secs())
    }

    /// Deserialize from integer seconds.
    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        u64::deserialize(d).map(Duration::from_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use proptest::prelude::*;

    #[test]
    fn test_now_has_no_subseconds() {
        let ts = Timestamp::now();
        assert_eq!(ts.as_datetime().nanosecond(), 0);
    }

    #[test]
    fn test_from_utc_truncates() {
        let dt = Utc.with_ymd_and_hms(2026, 1, 15, 12, 30, 45).unwrap();
        let ts = Timestamp::from_utc(dt.with_nanosecond(123_456_789).unwrap());
        assert_eq!(ts.to_iso8601(), "2026-01-15T12:30:45Z");
    }

    #[test]
    fn test_parse_rejects_offsets() {
        assert!(Timestamp::parse("2026-01-15T12:00:00Z").is_ok());
        assert!(Timestamp::parse("2026-01-15T12:00:00+00:00").is_err());
        assert!(Timestamp::parse("2026-01-15T17:00:00+05:00").is_err());
        assert!(Timestamp::parse("not-a-date").is_err());
    }

    #[test]
    fn test_parse_lenient_converts_offset() {
        let ts = Timestamp::parse_lenient("2026-01-15T17:00:00+05:00").unwrap();
        assert_eq!(ts.to_iso8601(), "2026-01-15T12:00:00Z");
    }

    #[test]
    fn test_checked_add_hours() {
        let ts = Timestamp::parse("2026-01-15T12:00:00Z").unwrap();
        let later = ts.checked_add(Duration::from_secs(3600)).unwrap();
        assert_eq!(later.to_iso8601(), "2026-01-15T13:00:00Z");
    }

    #[test]
    fn test_saturating_since() {
        let a = Timestamp::parse("2026-01-15T12:00:00Z").unwrap();
        let b = Timestamp::parse("2026-01-15T12:01:40Z").unwrap();
        assert_eq!(b.saturating_since(a), Duration::from_secs(100));
        assert_eq!(a.saturating_since(b), Duration::ZERO);
    }

    #[test]
    fn test_duration_secs_adapter() {
        #[derive(Serialize, Deserialize)]
        struct Holder {
            #[serde(with = "duration_secs")]
            d: Duration,
        }
        let json = serde_json::to_string(&Holder {
            d: Duration::from_secs(5400),
        })
        .unwrap();
        assert_eq!(json, r#"{"d":5400}"#);
        let back: Holder = serde_json::from_str(&json).unwrap();
        assert_eq!(back.d, Duration::from_secs(5400));
    }

    proptest! {
        #[test]
        fn prop_checked_add_is_monotonic(secs in 0u64..10_000_000, extra in 0u64..10_000_000) {
            let base = Timestamp::parse("2026-01-01T00:00:00Z").unwrap();
            let a = base.checked_add(Duration::from_secs(secs)).unwrap();
            let b = base.checked_add(Duration::from_secs(secs + extra)).unwrap();
            prop_assert!(a <= b);
            prop_assert_eq!(b.saturating_since(a), Duration::from_secs(extra));
        }
    }
}
