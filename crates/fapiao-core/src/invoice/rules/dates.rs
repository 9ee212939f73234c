//! Issue date normalization.

use chrono::NaiveDate;

use crate::models::config::ExtractionConfig;

use super::patterns::DATE_PARTS;

/// Normalize a matched date to `yyyy-MM-dd`.
///
/// Accepts `2025年8月6日`, `2025-8-6` and `2025/08/06` anywhere in `value`.
/// When no valid calendar date is found the trimmed input is returned as is.
pub fn normalize_date(value: &str) -> String {
    let value = value.trim();

    DATE_PARTS
        .captures(value)
        .and_then(|caps| {
            let year: i32 = caps[1].parse().ok()?;
            let month: u32 = caps[2].parse().ok()?;
            let day: u32 = caps[3].parse().ok()?;
            NaiveDate::from_ymd_opt(year, month, day)
        })
        .map(|date| date.format("%Y-%m-%d").to_string())
        .unwrap_or_else(|| value.to_string())
}

pub(super) fn normalize_field(value: String, _config: &ExtractionConfig) -> String {
    normalize_date(&value)
}
