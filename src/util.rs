// Utility helpers for parsing and formatting.
//
// This module centralizes all the "dirty" CSV/number/date handling so the
// rest of the code can assume clean, typed values.
use chrono::{Duration, NaiveDate, NaiveDateTime};
use num_format::{Locale, ToFormattedString};

/// Parse a string-like value into `f64` while being forgiving about
/// formatting issues that are common in spreadsheet exports (commas, spaces,
/// stray text).
///
/// - Accepts `Option<&str>` so callers can pass through optional fields.
/// - Trims whitespace.
/// - Rejects values that contain alphabetic characters.
/// - Strips thousands separators like `","` before parsing.
/// - Returns `None` for anything that cannot be safely parsed.
pub fn parse_f64_safe(s: Option<&str>) -> Option<f64> {
    let s = s?.trim();
    if s.is_empty() {
        return None;
    }
    if s.chars().any(|c| c.is_ascii_alphabetic()) {
        return None;
    }
    let s = s.replace(",", "");
    s.parse::<f64>().ok()
}

pub fn parse_date_safe(s: Option<&str>) -> Option<NaiveDate> {
    // Sheet dates are expected in `YYYY-MM-DD` format.
    let s = s?.trim();
    if s.is_empty() {
        return None;
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d").ok()
}

/// Parse a submission timestamp. The form sheet stores either a full
/// `YYYY-MM-DD HH:MM:SS` timestamp or a bare date; a bare date is treated
/// as midnight so the calendar-day projection stays correct either way.
pub fn parse_datetime_safe(s: Option<&str>) -> Option<NaiveDateTime> {
    let s = s?.trim();
    if s.is_empty() {
        return None;
    }
    NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S")
        .ok()
        .or_else(|| parse_date_safe(Some(s)).and_then(|d| d.and_hms_opt(0, 0, 0)))
}

/// Parse a travel-time string (`H:MM:SS`, `H:MM`, optionally prefixed with
/// `D days`) into a `Duration`.
///
/// Returns `None` for anything else. The aggregation layer coerces `None`
/// to a zero duration rather than dropping the row, so the reported trip
/// count and the summed time can diverge for dirty data.
pub fn parse_travel_time(s: &str) -> Option<Duration> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }
    let (days, clock) = match s.split_once(" days ").or_else(|| s.split_once(" day ")) {
        Some((d, rest)) => (d.trim().parse::<i64>().ok()?, rest.trim()),
        None => (0, s),
    };
    let parts: Vec<&str> = clock.split(':').collect();
    let (h, m, sec) = match parts.as_slice() {
        [h, m] => (
            h.trim().parse::<i64>().ok()?,
            m.trim().parse::<i64>().ok()?,
            0,
        ),
        [h, m, sec] => (
            h.trim().parse::<i64>().ok()?,
            m.trim().parse::<i64>().ok()?,
            sec.trim().parse::<i64>().ok()?,
        ),
        _ => return None,
    };
    if !(0..60).contains(&m) || !(0..60).contains(&sec) || h < 0 {
        return None;
    }
    Some(Duration::seconds(((days * 24 + h) * 60 + m) * 60 + sec))
}

/// Render a duration as `HH:MM:SS` (hours can exceed 24).
pub fn format_duration_hms(d: Duration) -> String {
    let total = d.num_seconds().max(0);
    format!(
        "{:02}:{:02}:{:02}",
        total / 3600,
        (total % 3600) / 60,
        total % 60
    )
}

pub fn format_number(n: f64, decimals: usize) -> String {
    // Format a floating-point value with:
    // - a fixed number of decimal places, and
    // - locale-aware thousands separators (e.g., `1,234,567.89`).
    let neg = n.is_sign_negative();
    let abs_n = n.abs();
    // First, format to a plain fixed-decimal string like `1234567.89`.
    let s = format!("{:.*}", decimals, abs_n);
    let mut parts = s.split('.');
    let int_part = parts.next().unwrap_or("0");
    let frac_part = parts.next();
    // Use `num-format` to insert commas into the integer portion.
    let int_val: i64 = int_part.parse().unwrap_or(0);
    let mut res = int_val.to_formatted_string(&Locale::en);
    if let Some(frac) = frac_part {
        if decimals > 0 {
            res.push('.');
            res.push_str(frac);
        }
    } else if decimals > 0 {
        res.push('.');
        res.push_str(&"0".repeat(decimals));
    }
    if neg {
        format!("-{}", res)
    } else {
        res
    }
}

pub fn format_int<T>(n: T) -> String
where
    T: ToFormattedString,
{
    // Thin wrapper around `num-format` for integer-like values. This is used
    // for counts in console messages (e.g., `1,204 rows loaded`).
    n.to_formatted_string(&Locale::en)
}
