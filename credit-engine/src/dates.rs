//! Calendar-day helpers
//!
//! All comparisons happen on `NaiveDate`, so time-of-day never leaks into
//! overdue decisions.

use chrono::{DateTime, Local, NaiveDate, NaiveDateTime};

/// Local calendar day right now
pub fn today() -> NaiveDate {
    Local::now().date_naive()
}

/// Whole days from `from` to `to` (negative when `to` is earlier)
pub fn days_between(from: NaiveDate, to: NaiveDate) -> i64 {
    to.signed_duration_since(from).num_days()
}

/// Days remaining until `due_date`; negative once past due
pub fn days_until_due(due_date: NaiveDate, as_of: NaiveDate) -> i64 {
    days_between(as_of, due_date)
}

/// Short label for an overdue badge
pub fn format_overdue_text(days_overdue: u32) -> String {
    match days_overdue {
        0 => "Due today".to_string(),
        1 => "1 day overdue".to_string(),
        n => format!("{} days overdue", n),
    }
}

/// Parse a date or timestamp into its calendar day.
///
/// Accepts `YYYY-MM-DD`, RFC 3339 (day taken in the timestamp's own offset)
/// and naive `YYYY-MM-DDTHH:MM:SS[.f]`.
pub fn parse_calendar_day(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Some(date);
    }

    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.date_naive());
    }

    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%.f"))
        .ok()
        .map(|ts| ts.date())
}
