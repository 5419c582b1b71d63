//! Date helpers for period and week bucketing.

use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveDateTime};

pub use grocery_domain::days_in_month;

/// The Monday on or before `date`.
pub fn week_start(date: NaiveDate) -> NaiveDate {
    date - Duration::days(i64::from(date.weekday().num_days_from_monday()))
}

pub fn same_week(a: NaiveDate, b: NaiveDate) -> bool {
    week_start(a) == week_start(b)
}

/// Days left in the month after `today`.
pub fn days_remaining_in_month(today: NaiveDate) -> u32 {
    days_in_month(today.year(), today.month()) - today.day()
}

/// Parses a feed timestamp into the calendar date it names.
///
/// Offsets are kept as written: `2025-08-24T23:30:00-04:00` is August 24th.
/// Accepts RFC 3339 (including a `Z` suffix), naive date-times and bare dates.
pub fn parse_message_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Some(parsed.date_naive());
    }
    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(parsed) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(parsed.date());
        }
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d").ok()
}
