use std::fmt::Display;

use chrono::{DateTime, FixedOffset, Local, NaiveDate, NaiveDateTime, TimeZone, Utc};
use serde_json::Value;

/// Shown in place of a date when a task carries no deadline.
pub const NO_DEADLINE: &str = "No deadline";

const LONG_DATE: &str = "%A, %B %-d";
const SHORT_TIME: &str = "%-I:%M %p";
const CLOCK_TIME: &str = "%-I:%M:%S %p";

/// Where dates and times are shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisplayZone {
    /// The host's time zone rules, so each instant gets the offset in effect at that instant.
    Local,
    /// A pinned offset from config.
    Fixed(FixedOffset),
}

impl DisplayZone {
    /// Parse a deadline value: epoch milliseconds or a date string.
    pub fn deadline(&self, value: &Value) -> Option<DateTime<FixedOffset>> {
        match self {
            Self::Local => deadline_in(value, &Local),
            Self::Fixed(offset) => deadline_in(value, offset),
        }
    }

    /// "Saturday, November 1"
    pub fn long_date<Tz: TimeZone>(&self, dt: &DateTime<Tz>) -> String {
        self.render(dt, LONG_DATE)
    }

    /// "9:05 AM"
    pub fn short_time<Tz: TimeZone>(&self, dt: &DateTime<Tz>) -> String {
        self.render(dt, SHORT_TIME)
    }

    /// Wall-clock time used to stamp debug feed entries.
    pub fn clock_time<Tz: TimeZone>(&self, dt: &DateTime<Tz>) -> String {
        self.render(dt, CLOCK_TIME)
    }

    fn render<Tz: TimeZone>(&self, dt: &DateTime<Tz>, fmt: &str) -> String {
        match self {
            Self::Local => render_in(dt, &Local, fmt),
            Self::Fixed(offset) => render_in(dt, offset, fmt),
        }
    }
}

fn render_in<Tz: TimeZone, Z: TimeZone>(dt: &DateTime<Tz>, zone: &Z, fmt: &str) -> String
where
    Z::Offset: Display,
{
    dt.with_timezone(zone).format(fmt).to_string()
}

fn deadline_in<Z: TimeZone>(value: &Value, zone: &Z) -> Option<DateTime<FixedOffset>> {
    match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.is_finite()).map(|f| f.trunc() as i64))
            .and_then(DateTime::from_timestamp_millis)
            .map(|dt| dt.fixed_offset()),
        Value::String(s) => parse_deadline(s, zone),
        _ => None,
    }
}

/// Parse a deadline string the way the assistant's tools emit them.
///
/// - RFC 3339 (`2025-11-01T00:00:00Z`, `...+02:00`)
/// - naive date-time, read as wall-clock time in `zone`
/// - bare date, read as UTC midnight
pub fn parse_deadline<Z: TimeZone>(raw: &str, zone: &Z) -> Option<DateTime<FixedOffset>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt);
    }

    for fmt in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M:%S"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, fmt) {
            // A wall-clock time skipped by a DST jump has no reading.
            return zone
                .from_local_datetime(&naive)
                .earliest()
                .map(|dt| dt.fixed_offset());
        }
    }

    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| Utc.from_utc_datetime(&naive).fixed_offset())
}
