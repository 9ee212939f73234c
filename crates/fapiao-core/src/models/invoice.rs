//! Canonical invoice record produced by the extraction engine.

use serde::{Deserialize, Serialize};

use crate::invoice::rules::keyword::KeywordScan;
use crate::models::config::ExtractionConfig;

/// A recognized Chinese VAT invoice.
///
/// Every field is a string; an empty string means the value is unknown.
/// Monetary fields are kept as the document printed them (thousands
/// separators included) and are never parsed into numbers here.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceRecord {
    /// Invoice number (发票号码).
    pub invoice_number: String,

    /// Invoice code (发票代码). Falls back to the invoice number.
    pub invoice_code: String,

    /// Issue date (开票日期), `yyyy-MM-dd` when recognized.
    pub invoice_date: String,

    /// Buyer name (购买方名称).
    pub purchaser_name: String,

    /// Buyer taxpayer identification number.
    pub purchaser_tax_id: String,

    /// Seller name (销售方名称).
    pub seller_name: String,

    /// Seller taxpayer identification number.
    pub seller_tax_id: String,

    /// Total amount excluding tax (金额合计).
    pub total_amount_excl_tax: String,

    /// Total tax (税额合计).
    pub total_tax: String,

    /// Total amount including tax (价税合计).
    pub total_amount_incl_tax: String,

    /// Invoice type label.
    pub invoice_type: InvoiceType,

    /// Opaque identifier of the originating document.
    pub source_file_path: String,

    /// Commodity/service breakdown.
    #[serde(default)]
    pub line_items: Vec<LineItem>,

    /// Text or key/value payload the record was built from.
    pub raw_source_text: String,
}

/// Known Chinese VAT invoice types.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum InvoiceType {
    /// 增值税专用发票
    #[serde(rename = "增值税专用发票")]
    Special,
    /// 增值税普通发票
    #[serde(rename = "增值税普通发票")]
    Ordinary,
    /// 电子发票
    #[serde(rename = "电子发票")]
    Electronic,
    /// Generic label used when no known type is recognized.
    #[default]
    #[serde(rename = "增值税发票")]
    Generic,
}

impl InvoiceType {
    /// Classify a document by the type labels it contains.
    ///
    /// Special invoices are checked before ordinary ones, and both before
    /// the bare electronic label, so "电子发票（增值税专用发票）" is special.
    pub fn classify(text: &str) -> Self {
        if text.contains("增值税专用发票") || text.contains("专用发票") {
            InvoiceType::Special
        } else if text.contains("增值税普通发票") || text.contains("普通发票") {
            InvoiceType::Ordinary
        } else if text.contains("电子发票") {
            InvoiceType::Electronic
        } else {
            InvoiceType::Generic
        }
    }

    /// The label printed for this type.
    pub fn label(&self) -> &'static str {
        match self {
            InvoiceType::Special => "增值税专用发票",
            InvoiceType::Ordinary => "增值税普通发票",
            InvoiceType::Electronic => "电子发票",
            InvoiceType::Generic => "增值税发票",
        }
    }
}

impl std::fmt::Display for InvoiceType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// One row of the goods/services breakdown.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineItem {
    /// Goods or service name (项目名称).
    pub name: String,

    /// Specification/model (规格型号).
    pub specification: String,

    /// Unit of measure (单位).
    pub unit: String,

    /// Quantity (数量).
    pub quantity: String,

    /// Unit price (单价).
    pub unit_price: String,

    /// Line amount excluding tax (金额).
    pub amount: String,

    /// Tax rate (税率).
    pub tax_rate: String,

    /// Tax amount (税额).
    pub tax: String,
}

impl LineItem {
    /// Fill `specification` from the trailing space-separated token of `name`
    /// when no explicit specification is present.
    pub fn backfill_specification(&mut self) {
        if !self.specification.is_empty() || self.name.is_empty() {
            return;
        }
        if let Some(idx) = self.name.rfind(' ') {
            self.specification = self.name[idx + 1..].to_string();
        }
    }
}

impl InvoiceRecord {
    /// Create an empty record for the given source document.
    pub fn new(source_file_path: impl Into<String>) -> Self {
        Self {
            source_file_path: source_file_path.into(),
            ..Self::default()
        }
    }

    /// Apply the invoice-code fallback: a record with a number always has a code.
    ///
    /// Returns `true` when the fallback was applied.
    pub fn apply_code_fallback(&mut self) -> bool {
        if self.invoice_code.is_empty() && !self.invoice_number.is_empty() {
            self.invoice_code = self.invoice_number.clone();
            true
        } else {
            false
        }
    }

    /// Look up an unmodeled value in the retained source text by keyword.
    pub fn lookup(&self, keywords: &[&str], config: &ExtractionConfig) -> String {
        KeywordScan::new(keywords)
            .scan(&self.raw_source_text, config)
            .unwrap_or_default()
    }

    /// Validate the record and return any issues found.
    pub fn validate(&self) -> Vec<String> {
        let mut issues = Vec::new();

        if self.invoice_number.is_empty() {
            issues.push("Missing invoice number".to_string());
        }

        if self.invoice_date.is_empty() {
            issues.push("Missing invoice date".to_string());
        }

        if self.purchaser_name.is_empty() {
            issues.push("Missing purchaser name".to_string());
        }

        if self.seller_name.is_empty() {
            issues.push("Missing seller name".to_string());
        }

        if self.total_amount_incl_tax.is_empty() {
            issues.push("Missing total amount including tax".to_string());
        }

        if self.total_amount_excl_tax.is_empty() && self.total_tax.is_empty() {
            issues.push("Missing amount and tax totals".to_string());
        }

        issues
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_invoice_type_classify() {
        assert_eq!(InvoiceType::classify("增值税专用发票"), InvoiceType::Special);
        assert_eq!(
            InvoiceType::classify("电子发票（增值税专用发票）"),
            InvoiceType::Special
        );
        assert_eq!(InvoiceType::classify("电子发票（普通发票）"), InvoiceType::Ordinary);
        assert_eq!(InvoiceType::classify("电子发票"), InvoiceType::Electronic);
        assert_eq!(InvoiceType::classify("收据"), InvoiceType::Generic);
        assert_eq!(InvoiceType::classify(""), InvoiceType::Generic);
    }

    #[test]
    fn test_invoice_type_serializes_as_label() {
        let json = serde_json::to_string(&InvoiceType::Ordinary).unwrap();
        assert_eq!(json, "\"增值税普通发票\"");

        let parsed: InvoiceType = serde_json::from_str("\"增值税发票\"").unwrap();
        assert_eq!(parsed, InvoiceType::Generic);
    }

    #[test]
    fn test_backfill_specification() {
        let mut item = LineItem {
            name: "*通信终端*手机 Mate60".to_string(),
            ..LineItem::default()
        };
        item.backfill_specification();
        assert_eq!(item.specification, "Mate60");
        assert_eq!(item.name, "*通信终端*手机 Mate60");

        let mut explicit = LineItem {
            name: "螺丝 M6".to_string(),
            specification: "M6x20".to_string(),
            ..LineItem::default()
        };
        explicit.backfill_specification();
        assert_eq!(explicit.specification, "M6x20");

        let mut plain = LineItem {
            name: "咨询服务".to_string(),
            ..LineItem::default()
        };
        plain.backfill_specification();
        assert_eq!(plain.specification, "");
    }

    #[test]
    fn test_code_fallback() {
        let mut record = InvoiceRecord::new("a.pdf");
        record.invoice_number = "123456".to_string();
        assert!(record.apply_code_fallback());
        assert_eq!(record.invoice_code, "123456");

        let mut empty = InvoiceRecord::new("b.pdf");
        assert!(!empty.apply_code_fallback());
        assert_eq!(empty.invoice_code, "");
    }

    #[test]
    fn test_lookup_in_raw_source() {
        let mut record = InvoiceRecord::new("c.txt");
        record.raw_source_text = "购买方税号：91410104MAD3TRFC98\n销售方税号：914419000585344943".to_string();

        let config = ExtractionConfig::default();
        assert_eq!(record.lookup(&["购买方税号"], &config), "91410104MAD3TRFC98");
        assert_eq!(record.lookup(&["销售方税号"], &config), "914419000585344943");
        assert_eq!(record.lookup(&["开户行"], &config), "");
    }

    #[test]
    fn test_validate() {
        let record = InvoiceRecord::new("d.txt");
        let issues = record.validate();
        assert!(issues.contains(&"Missing invoice number".to_string()));
        assert!(issues.contains(&"Missing seller name".to_string()));

        let complete = InvoiceRecord {
            invoice_number: "84857775".to_string(),
            invoice_code: "254470000016".to_string(),
            invoice_date: "2025-08-06".to_string(),
            purchaser_name: "测试公司".to_string(),
            seller_name: "另一公司".to_string(),
            total_amount_excl_tax: "167.26".to_string(),
            total_tax: "21.74".to_string(),
            total_amount_incl_tax: "189.00".to_string(),
            ..InvoiceRecord::default()
        };
        assert!(complete.validate().is_empty());
    }

    #[test]
    fn test_record_json_keys() {
        let record = InvoiceRecord::new("e.txt");
        let value = serde_json::to_value(&record).unwrap();
        assert!(value.get("invoiceNumber").is_some());
        assert!(value.get("totalAmountInclTax").is_some());
        assert_eq!(value["invoiceType"], "增值税发票");
    }
}
