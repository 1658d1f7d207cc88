// src/format.rs
//! Display helpers shared by the components: dates, percentages, escaping.

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime};

const NAIVE_DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M",
];

enum Parsed {
    Date(NaiveDate),
    DateTime(NaiveDateTime),
}

/// Accepts what the backend emits: RFC 3339, Python `isoformat()` without an
/// offset, plain dates, and RFC 2822. Offset-aware values keep their own offset.
fn parse_timestamp(raw: &str) -> Option<Parsed> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::<FixedOffset>::parse_from_rfc3339(s) {
        return Some(Parsed::DateTime(dt.naive_local()));
    }
    for fmt in NAIVE_DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(Parsed::DateTime(dt));
        }
    }
    if let Ok(d) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return Some(Parsed::Date(d));
    }
    DateTime::<FixedOffset>::parse_from_rfc2822(s)
        .ok()
        .map(|dt| Parsed::DateTime(dt.naive_local()))
}

/// Date only, e.g. `3/7/2024`. Unparseable input comes back unchanged.
pub fn format_date(raw: &str) -> String {
    match parse_timestamp(raw) {
        Some(Parsed::Date(d)) => d.format("%-m/%-d/%Y").to_string(),
        Some(Parsed::DateTime(dt)) => dt.format("%-m/%-d/%Y").to_string(),
        None => raw.to_string(),
    }
}

/// Date and time, e.g. `3/7/2024 2:05:09 PM`. Unparseable input comes back unchanged.
pub fn format_date_time(raw: &str) -> String {
    match parse_timestamp(raw) {
        Some(Parsed::Date(d)) => d.format("%-m/%-d/%Y 12:00:00 AM").to_string(),
        Some(Parsed::DateTime(dt)) => dt.format("%-m/%-d/%Y %-I:%M:%S %p").to_string(),
        None => raw.to_string(),
    }
}

/// `"Never"` for a missing or empty timestamp.
pub fn format_last_run(raw: Option<&str>) -> String {
    match raw {
        Some(s) if !s.is_empty() => format_date_time(s),
        _ => "Never".to_string(),
    }
}

/// `round(fraction * 100)` followed by `%`, rounding halves up.
pub fn percent(fraction: f64) -> String {
    format!("{}%", (fraction * 100.0 + 0.5).floor() as i64)
}

/// Relevance score as given (no clamping), trimmed of a useless `.0`.
pub fn score(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{}", value as i64)
    } else {
        format!("{value}")
    }
}

pub fn text(s: &str) -> std::borrow::Cow<'_, str> {
    html_escape::encode_text(s)
}

pub fn attr(s: &str) -> std::borrow::Cow<'_, str> {
    html_escape::encode_double_quoted_attribute(s)
}
