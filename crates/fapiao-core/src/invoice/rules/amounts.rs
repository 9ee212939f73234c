//! Monetary field cleanup.
//!
//! Amounts stay strings: thousands separators and decimals are kept exactly
//! as printed and numeric interpretation is left to the consumer.

use crate::models::config::ExtractionConfig;

/// Currency symbols that may surround an amount.
pub const CURRENCY_SYMBOLS: [char; 2] = ['¥', '￥'];

/// Strip currency symbols and surrounding whitespace from an amount.
pub fn strip_currency(value: &str) -> String {
    value
        .trim_matches(|c: char| CURRENCY_SYMBOLS.contains(&c) || c.is_whitespace())
        .to_string()
}

pub(super) fn clean_field(value: String, _config: &ExtractionConfig) -> String {
    strip_currency(&value)
}
