//! Invoice code/number disambiguation.
//!
//! Some electronic invoices print the invoice code and the invoice number as
//! one digit run after `发票号码:`. The run length tells where to cut.

use crate::models::config::{ExtractionConfig, SplitRules};

use super::keyword::KeywordScan;
use super::patterns::{INVOICE_NUMBER_RELAXED, INVOICE_NUMBER_STRICT};

/// Keywords of the invoice-number fallback scan.
pub const NUMBER_KEYWORDS: KeywordScan<'static> = KeywordScan::new(&["发票号码", "发票号"]);

/// A digit run split into its code and number parts.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SplitNumber {
    /// Invoice code; empty when the run was not split.
    pub code: String,
    /// Invoice number; the whole run when it was not split.
    pub number: String,
}

impl SplitNumber {
    /// Whether a code was separated from the run.
    pub fn is_split(&self) -> bool {
        !self.code.is_empty()
    }
}

/// Split a concatenated code+number digit run.
///
/// * lengths in `paired_lengths`: code = first `min(paired_code_max, len - paired_number_min)` digits
/// * `short_length`: code = first `short_code_len` digits
/// * anything else, including non-digit input, is left unsplit
pub fn split_code_and_number(digits: &str, rules: &SplitRules) -> SplitNumber {
    let unsplit = || SplitNumber {
        code: String::new(),
        number: digits.to_string(),
    };

    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return unsplit();
    }

    let len = digits.len();
    let code_len = if rules.paired_lengths.contains(&len) {
        rules
            .paired_code_max
            .min(len.saturating_sub(rules.paired_number_min))
    } else if len == rules.short_length {
        rules.short_code_len.min(len)
    } else {
        0
    };

    if code_len == 0 {
        return unsplit();
    }

    SplitNumber {
        code: digits[..code_len].to_string(),
        number: digits[code_len..].to_string(),
    }
}

/// The digit run printed after `发票号码:`, preferring runs of at least 8 digits.
pub fn labeled_number_run(text: &str) -> Option<&str> {
    INVOICE_NUMBER_STRICT
        .captures(text)
        .or_else(|| INVOICE_NUMBER_RELAXED.captures(text))
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

/// Number part of an extracted invoice number.
pub fn number_part(value: String, config: &ExtractionConfig) -> String {
    let split = split_code_and_number(&value, &config.split);
    if split.is_split() { split.number } else { value }
}

/// The invoice-number value before splitting, found the same way the
/// invoice-number rule finds it.
pub fn number_run(text: &str, config: &ExtractionConfig) -> Option<String> {
    labeled_number_run(text)
        .map(str::to_string)
        .or_else(|| NUMBER_KEYWORDS.scan(text, config))
        .map(|run| run.trim().to_string())
        .filter(|run| !run.is_empty())
}

/// Code part of the invoice-number run, when the run holds one.
pub fn code_from_number_run(text: &str, config: &ExtractionConfig) -> Option<String> {
    let run = number_run(text, config)?;
    let split = split_code_and_number(&run, &config.split);
    split.is_split().then_some(split.code)
}
