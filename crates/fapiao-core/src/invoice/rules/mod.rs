//! Rule-based field extractors for Chinese VAT invoices.
//!
//! Every field owns an ordered list of [`Strategy`] values. They are tried in
//! order and the first non-blank result wins; a field nothing matches is the
//! empty string.

pub mod amounts;
pub mod anchor;
pub mod dates;
pub mod keyword;
pub mod numbers;
pub mod patterns;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::invoice::observer::ExtractionObserver;
use crate::models::config::ExtractionConfig;
use crate::models::invoice::InvoiceType;

pub use anchor::{AnchorScope, PURCHASER_SECTION, SELLER_SECTION};
pub use dates::normalize_date;
pub use keyword::KeywordScan;
pub use numbers::{split_code_and_number, SplitNumber};
pub use patterns::*;

/// Logical invoice fields read from raw text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    InvoiceNumber,
    InvoiceCode,
    InvoiceDate,
    PurchaserName,
    PurchaserTaxId,
    SellerName,
    SellerTaxId,
    TotalAmount,
    TotalTax,
    AmountInFigures,
    InvoiceType,
}

impl Field {
    /// All fields, in the order the builder extracts them.
    pub const ALL: [Field; 11] = [
        Field::InvoiceNumber,
        Field::InvoiceCode,
        Field::InvoiceDate,
        Field::PurchaserName,
        Field::PurchaserTaxId,
        Field::SellerName,
        Field::SellerTaxId,
        Field::TotalAmount,
        Field::TotalTax,
        Field::AmountInFigures,
        Field::InvoiceType,
    ];

    /// Field name used in diagnostics.
    pub fn name(&self) -> &'static str {
        match self {
            Field::InvoiceNumber => "invoice_number",
            Field::InvoiceCode => "invoice_code",
            Field::InvoiceDate => "invoice_date",
            Field::PurchaserName => "purchaser_name",
            Field::PurchaserTaxId => "purchaser_tax_id",
            Field::SellerName => "seller_name",
            Field::SellerTaxId => "seller_tax_id",
            Field::TotalAmount => "total_amount",
            Field::TotalTax => "total_tax",
            Field::AmountInFigures => "amount_in_figures",
            Field::InvoiceType => "invoice_type",
        }
    }
}

impl std::fmt::Display for Field {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Function computing a value from the whole text.
pub type DeriveFn = fn(&str, &ExtractionConfig) -> Option<String>;

/// Post-processing applied to whichever strategy matched.
pub type PostFn = fn(String, &ExtractionConfig) -> String;

/// One way of finding a field value.
#[derive(Debug, Clone, Copy)]
pub enum Strategy {
    /// First capture group of a labeled regex.
    Pattern(&'static Regex),
    /// Labeled value inside a named section.
    Anchored(AnchorScope),
    /// First capture of a regex inside a named section.
    ScopedPattern(AnchorScope, &'static Regex),
    /// Value derived from other text structure.
    Derived(DeriveFn),
    /// Generic keyword scan.
    Keyword(KeywordScan<'static>),
}

impl Strategy {
    /// Short name used in diagnostics.
    pub fn kind(&self) -> &'static str {
        match self {
            Strategy::Pattern(_) => "pattern",
            Strategy::Anchored(_) => "anchored",
            Strategy::ScopedPattern(..) => "scoped-pattern",
            Strategy::Derived(_) => "derived",
            Strategy::Keyword(_) => "keyword",
        }
    }

    /// Run the strategy; `None` when it finds nothing.
    pub fn apply(&self, text: &str, config: &ExtractionConfig) -> Option<String> {
        match self {
            Strategy::Pattern(re) => re
                .captures(text)
                .and_then(|caps| caps.get(1))
                .map(|m| m.as_str().to_string()),
            Strategy::Anchored(scope) => scope.extract(text, config.min_value_chars),
            Strategy::ScopedPattern(scope, re) => scope.find_pattern(text, re),
            Strategy::Derived(derive) => derive(text, config),
            Strategy::Keyword(scan) => scan.scan(text, config),
        }
    }
}

/// Ordered strategies for one field.
#[derive(Debug, Clone)]
pub struct FieldRule {
    field: Field,
    strategies: Vec<Strategy>,
    post: Option<PostFn>,
}

impl FieldRule {
    /// Create a rule trying `strategies` in order.
    pub fn new(field: Field, strategies: Vec<Strategy>) -> Self {
        Self {
            field,
            strategies,
            post: None,
        }
    }

    /// Post-process the winning value.
    pub fn with_post(mut self, post: PostFn) -> Self {
        self.post = Some(post);
        self
    }

    pub fn field(&self) -> Field {
        self.field
    }

    pub fn strategies(&self) -> &[Strategy] {
        &self.strategies
    }

    /// Extract the field, reporting the winning strategy to `observer`.
    pub fn extract(
        &self,
        text: &str,
        config: &ExtractionConfig,
        observer: &dyn ExtractionObserver,
    ) -> String {
        for (index, strategy) in self.strategies.iter().enumerate() {
            let Some(raw) = strategy.apply(text, config) else {
                continue;
            };
            let raw = raw.trim();
            if raw.is_empty() {
                continue;
            }

            let value = match self.post {
                Some(post) => post(raw.to_string(), config),
                None => raw.to_string(),
            };
            if value.trim().is_empty() {
                continue;
            }

            observer.field_resolved(self.field, index, strategy.kind(), &value);
            return value;
        }

        observer.field_missing(self.field);
        String::new()
    }
}

/// The full set of field rules.
#[derive(Debug, Clone)]
pub struct FieldLibrary {
    config: ExtractionConfig,
    rules: Vec<FieldRule>,
}

impl FieldLibrary {
    /// Build the default Chinese VAT invoice rules.
    pub fn new(config: ExtractionConfig) -> Self {
        let rules = Field::ALL.iter().map(|&field| default_rule(field)).collect();
        Self { config, rules }
    }

    pub fn config(&self) -> &ExtractionConfig {
        &self.config
    }

    /// Rule for `field`.
    pub fn rule(&self, field: Field) -> &FieldRule {
        // Field::ALL builds exactly one rule per field
        &self.rules[Field::ALL.iter().position(|f| *f == field).unwrap_or_default()]
    }

    /// Extract one field from raw text.
    pub fn extract(&self, field: Field, text: &str, observer: &dyn ExtractionObserver) -> String {
        self.rule(field).extract(text, &self.config, observer)
    }
}

impl Default for FieldLibrary {
    fn default() -> Self {
        Self::new(ExtractionConfig::default())
    }
}

fn default_rule(field: Field) -> FieldRule {
    use Strategy::*;

    match field {
        Field::InvoiceNumber => FieldRule::new(
            field,
            vec![
                Pattern(&INVOICE_NUMBER_STRICT),
                Pattern(&INVOICE_NUMBER_RELAXED),
                Keyword(numbers::NUMBER_KEYWORDS),
            ],
        )
        .with_post(numbers::number_part),

        Field::InvoiceCode => FieldRule::new(
            field,
            vec![
                Pattern(&INVOICE_CODE_STRICT),
                Pattern(&INVOICE_CODE_RELAXED),
                Derived(numbers::code_from_number_run),
                Pattern(&INVOICE_CODE_NEXT_LINE),
                Keyword(KeywordScan::new(&["发票代码"])),
            ],
        ),

        Field::InvoiceDate => FieldRule::new(
            field,
            vec![
                Pattern(&ISSUE_DATE_LABELED),
                Pattern(&DATE_LABELED),
                Pattern(&DATE_CHINESE),
                Pattern(&DATE_DASHED),
                Pattern(&DATE_SLASHED),
                Keyword(KeywordScan::new(&["开票日期", "日期"])),
            ],
        )
        .with_post(dates::normalize_field),

        Field::PurchaserName => FieldRule::new(
            field,
            vec![
                Anchored(PURCHASER_SECTION),
                Pattern(&PURCHASER_NAME_SECTION),
                Pattern(&PURCHASER_NAME_LOOSE),
                Keyword(KeywordScan::new(&["购买方", "买方"])),
            ],
        ),

        Field::PurchaserTaxId => FieldRule::new(
            field,
            vec![
                Pattern(&PURCHASER_TAX_ID),
                Pattern(&PURCHASER_TAX_ID_SHORT),
                Pattern(&TAX_ID_LABELED),
                ScopedPattern(PURCHASER_SECTION, &TAX_ID_TOKEN),
                Keyword(KeywordScan::new(&["购买方税号", "购买方纳税人识别号"])),
            ],
        ),

        Field::SellerName => FieldRule::new(
            field,
            vec![
                Anchored(SELLER_SECTION),
                Pattern(&SELLER_NAME_SECTION),
                Pattern(&SELLER_NAME_LOOSE),
                Keyword(KeywordScan::new(&["销售方", "卖方"])),
            ],
        ),

        Field::SellerTaxId => FieldRule::new(
            field,
            vec![
                Pattern(&SELLER_TAX_ID),
                Pattern(&SELLER_TAX_ID_SHORT),
                ScopedPattern(SELLER_SECTION, &TAX_ID_TOKEN),
                Keyword(KeywordScan::new(&["销售方税号", "销售方纳税人识别号"])),
            ],
        ),

        Field::TotalAmount => FieldRule::new(
            field,
            vec![
                Pattern(&TOTAL_AMOUNT),
                Pattern(&TOTAL_AMOUNT_LABELED),
                Pattern(&AMOUNT_COLUMN),
                Keyword(KeywordScan::new(&["金额合计", "合计", "金额"])),
            ],
        )
        .with_post(amounts::clean_field),

        Field::TotalTax => FieldRule::new(
            field,
            vec![
                Pattern(&TOTAL_TAX),
                Pattern(&TAX_AMOUNT_LABELED),
                Pattern(&VAT_LABELED),
                Keyword(KeywordScan::new(&["税额"])),
            ],
        )
        .with_post(amounts::clean_field),

        Field::AmountInFigures => FieldRule::new(
            field,
            vec![
                Pattern(&AMOUNT_IN_FIGURES_FULL),
                Pattern(&AMOUNT_IN_FIGURES),
                Pattern(&AMOUNT_IN_FIGURES_SMALL),
                Pattern(&GRAND_TOTAL),
                Keyword(KeywordScan::new(&["价税合计", "总计"])),
            ],
        )
        .with_post(amounts::clean_field),

        Field::InvoiceType => FieldRule::new(field, vec![Derived(classify_type)]),
    }
}

fn classify_type(text: &str, _config: &ExtractionConfig) -> Option<String> {
    Some(InvoiceType::classify(text).label().to_string())
}

/// Byte offset of the first ASCII-case-insensitive occurrence of `needle`.
///
/// ASCII lowercasing keeps every byte offset valid for the original text.
pub(crate) fn find_ignore_ascii_case(haystack: &str, needle: &str) -> Option<usize> {
    find_ignore_ascii_case_from(haystack, needle, 0)
}

/// Like [`find_ignore_ascii_case`], searching from byte offset `from`.
pub(crate) fn find_ignore_ascii_case_from(haystack: &str, needle: &str, from: usize) -> Option<usize> {
    if needle.is_empty() || from > haystack.len() || !haystack.is_char_boundary(from) {
        return None;
    }
    haystack[from..]
        .to_ascii_lowercase()
        .find(&needle.to_ascii_lowercase())
        .map(|pos| pos + from)
}
