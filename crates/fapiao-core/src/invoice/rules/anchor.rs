//! Section-bounded extraction.
//!
//! Chinese VAT invoices print the same `名称:` label in both the buyer and
//! the seller block. An [`AnchorScope`] restricts a lookup to the text
//! between a section anchor (e.g. `购买方信息`) and the next known anchor.

use regex::Regex;

use super::{find_ignore_ascii_case, find_ignore_ascii_case_from};

/// A named section of invoice text and how to read a labeled value from it.
#[derive(Debug, Clone, Copy)]
pub struct AnchorScope {
    /// Anchor that opens the section.
    pub start: &'static str,
    /// Anchors that may close the section; the earliest one after `start` wins.
    pub end_anchors: &'static [&'static str],
    /// Field labels looked up inside the section.
    pub labels: &'static [&'static str],
    /// Sub-strings that end the value following the label.
    pub terminators: &'static [&'static str],
}

/// Buyer block: `购买方信息 ... 名称:xxx统一社会信用代码/纳税人识别号: ...`.
pub const PURCHASER_SECTION: AnchorScope = AnchorScope {
    start: "购买方信息",
    end_anchors: &["销售方信息"],
    labels: &["名称:", "名称："],
    terminators: &["统一社会信用代码", "纳税人识别号", "销售方"],
};

/// Seller block, closed by the goods table header.
pub const SELLER_SECTION: AnchorScope = AnchorScope {
    start: "销售方信息",
    end_anchors: &["项目名称", "货物或应税劳务"],
    labels: &["名称:", "名称："],
    terminators: &["统一社会信用代码", "纳税人识别号", "项目名称"],
};

impl AnchorScope {
    /// The bounded section of `text`. A missing start anchor scopes the whole text.
    pub fn section<'t>(&self, text: &'t str) -> &'t str {
        self.bounded_section(text).unwrap_or(text)
    }

    /// The bounded section of `text`, or `None` when the start anchor is absent.
    pub fn bounded_section<'t>(&self, text: &'t str) -> Option<&'t str> {
        let start = find_ignore_ascii_case(text, self.start)?;

        let after_anchor = start + self.start.len();
        let end = self
            .end_anchors
            .iter()
            .filter_map(|anchor| find_ignore_ascii_case_from(text, anchor, after_anchor))
            .min()
            .unwrap_or(text.len());

        Some(&text[start..end])
    }

    /// Read the labeled value inside the section.
    ///
    /// The value is trimmed and must be at least `min_chars` characters long.
    pub fn extract(&self, text: &str, min_chars: usize) -> Option<String> {
        let section = self.section(text);

        let (label_pos, label) = self
            .labels
            .iter()
            .filter_map(|label| find_ignore_ascii_case(section, label).map(|pos| (pos, *label)))
            .min_by_key(|(pos, _)| *pos)?;

        let after = &section[label_pos + label.len()..];
        let cut = self
            .terminators
            .iter()
            .filter_map(|t| find_ignore_ascii_case(after, t))
            .min()
            .unwrap_or(after.len());

        let value = after[..cut].trim();
        (!value.is_empty() && value.chars().count() >= min_chars).then(|| value.to_string())
    }

    /// First capture of `pattern` inside the section.
    ///
    /// Unlike [`AnchorScope::extract`], a missing start anchor finds nothing.
    pub fn find_pattern(&self, text: &str, pattern: &Regex) -> Option<String> {
        let section = self.bounded_section(text)?;
        pattern
            .captures(section)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str().trim().to_string())
            .filter(|v| !v.is_empty())
    }
}
