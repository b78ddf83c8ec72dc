//! Timestamp parsing and facility-local time helpers
//!
//! The platform API mixes RFC 3339 timestamps with naive ones; naive values are UTC.
//! The local store keeps facility wall-clock time as `YYYY-MM-DD HH:MM:SS` text so
//! range filters can compare strings.

use anyhow::Result;
use chrono::{DateTime, Duration, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, Utc};

/// Storage format for facility-local datetimes
pub const DB_DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
/// Display format used in chat messages
pub const DISPLAY_FORMAT: &str = "%Y-%m-%d %H:%M";

const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
];

/// Parse an API timestamp into UTC.
///
/// Strings carrying `Z` or an explicit offset are RFC 3339; anything else is read
/// as naive UTC. A bare date means midnight UTC.
pub fn parse_api_timestamp(raw: &str) -> Result<DateTime<Utc>> {
    let raw = raw.trim();

    if raw.contains('Z') || raw.contains('+') || has_negative_offset(raw) {
        let normalized = raw.replace('Z', "+00:00");
        return DateTime::parse_from_rfc3339(&normalized)
            .or_else(|_| DateTime::parse_from_str(&normalized, "%Y-%m-%dT%H:%M:%S%.f%:z"))
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(|e| anyhow::anyhow!("Invalid timestamp '{}': {}", raw, e));
    }

    for format in NAIVE_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
            return Ok(naive.and_utc());
        }
    }

    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Ok(date.and_time(NaiveTime::MIN).and_utc());
    }

    Err(anyhow::anyhow!("Unrecognized timestamp format: '{}'", raw))
}

/// `-HH:MM` after the time part; date dashes do not count
fn has_negative_offset(raw: &str) -> bool {
    raw.find('T')
        .map(|t| raw[t..].contains('-'))
        .unwrap_or(false)
}

/// Current facility wall-clock time
pub fn local_now(offset: FixedOffset) -> NaiveDateTime {
    Utc::now().with_timezone(&offset).naive_local()
}

/// Render a UTC instant in facility time for chat output
pub fn format_local(instant: DateTime<Utc>, offset: FixedOffset) -> String {
    instant.with_timezone(&offset).format(DISPLAY_FORMAT).to_string()
}

pub fn format_naive(dt: &NaiveDateTime) -> String {
    dt.format(DISPLAY_FORMAT).to_string()
}

pub fn to_db(dt: &NaiveDateTime) -> String {
    dt.format(DB_DATETIME_FORMAT).to_string()
}

pub fn from_db(raw: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(raw, DB_DATETIME_FORMAT).ok()
}

/// Inclusive facility-local time window used by queries
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeRange {
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
}

impl TimeRange {
    pub fn new(start: NaiveDateTime, end: NaiveDateTime) -> Self {
        TimeRange { start, end }
    }

    /// The whole calendar day
    pub fn day(date: NaiveDate) -> Self {
        let (start, end) = day_bounds(date);
        TimeRange { start, end }
    }

    pub fn contains(&self, dt: &NaiveDateTime) -> bool {
        *dt >= self.start && *dt <= self.end
    }
}

/// First and last instant of a calendar day
pub fn day_bounds(date: NaiveDate) -> (NaiveDateTime, NaiveDateTime) {
    let start = date.and_time(NaiveTime::MIN);
    let end = start + Duration::days(1) - Duration::microseconds(1);
    (start, end)
}
