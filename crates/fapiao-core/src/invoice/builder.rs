//! Invoice record builder.
//!
//! Turns either a structured OCR response or raw page text into one
//! [`InvoiceRecord`]. The builder holds no mutable state and is shared
//! freely between threads.

use std::fmt;
use std::sync::Arc;

use tracing::{debug, info};

use crate::error::ExtractionError;
use crate::models::config::ExtractionConfig;
use crate::models::invoice::{InvoiceRecord, InvoiceType};

use super::line_items::reconcile;
use super::observer::{ExtractionObserver, TracingObserver};
use super::rules::amounts::strip_currency;
use super::rules::{normalize_date, Field, FieldLibrary};
use super::structured::{OcrResponse, WordsResult};
use super::{InvoiceExtractor, Result};

/// Builds invoice records from OCR output.
pub struct InvoiceRecordBuilder {
    library: FieldLibrary,
    observer: Arc<dyn ExtractionObserver>,
}

impl InvoiceRecordBuilder {
    /// Create a builder reporting diagnostics to `tracing`.
    pub fn new(config: ExtractionConfig) -> Self {
        Self {
            library: FieldLibrary::new(config),
            observer: Arc::new(TracingObserver),
        }
    }

    /// Replace the diagnostics observer.
    pub fn with_observer(mut self, observer: Arc<dyn ExtractionObserver>) -> Self {
        self.observer = observer;
        self
    }

    pub fn config(&self) -> &ExtractionConfig {
        self.library.config()
    }

    pub fn library(&self) -> &FieldLibrary {
        &self.library
    }

    /// Build a record from unlabeled page text.
    ///
    /// Fields are extracted in a fixed order and the invoice-code fallback
    /// is applied. Raw text carries no line items.
    pub fn from_text(&self, text: &str, source: &str) -> Result<InvoiceRecord> {
        if text.trim().is_empty() {
            return Err(ExtractionError::EmptyInput);
        }

        info!(source, chars = text.chars().count(), "extracting invoice from text");

        let observer = self.observer.as_ref();
        let mut record = InvoiceRecord::new(source);

        for field in Field::ALL {
            let value = self.library.extract(field, text, observer);
            match field {
                Field::InvoiceNumber => record.invoice_number = value,
                Field::InvoiceCode => record.invoice_code = value,
                Field::InvoiceDate => record.invoice_date = value,
                Field::PurchaserName => record.purchaser_name = value,
                Field::PurchaserTaxId => record.purchaser_tax_id = value,
                Field::SellerName => record.seller_name = value,
                Field::SellerTaxId => record.seller_tax_id = value,
                Field::TotalAmount => record.total_amount_excl_tax = value,
                Field::TotalTax => record.total_tax = value,
                Field::AmountInFigures => record.total_amount_incl_tax = value,
                Field::InvoiceType => record.invoice_type = InvoiceType::classify(&value),
            }
        }

        self.finish(&mut record);
        record.raw_source_text = text.to_string();

        debug!(
            source,
            number = %record.invoice_number,
            missing = record.validate().len(),
            "text extraction finished"
        );

        Ok(record)
    }

    /// Build a record from a structured OCR response body.
    pub fn from_structured(&self, payload: &str, source: &str) -> Result<InvoiceRecord> {
        let response = OcrResponse::parse(payload)?;
        self.from_response(&response, payload, source)
    }

    /// Build a record from an already decoded OCR response.
    ///
    /// `raw` is kept on the record as its source text.
    pub fn from_response(&self, response: &OcrResponse, raw: &str, source: &str) -> Result<InvoiceRecord> {
        let words = response.words()?;

        info!(source, log_id = ?response.log_id, "building invoice from structured result");

        let mut record = record_from_words(words, source);
        self.finish(&mut record);
        record.raw_source_text = raw.to_string();

        debug!(
            source,
            number = %record.invoice_number,
            line_items = record.line_items.len(),
            "structured extraction finished"
        );

        Ok(record)
    }

    fn finish(&self, record: &mut InvoiceRecord) {
        if record.apply_code_fallback() {
            self.observer.fallback_applied(Field::InvoiceCode, &record.invoice_code);
        }
    }
}

impl Default for InvoiceRecordBuilder {
    fn default() -> Self {
        Self::new(ExtractionConfig::default())
    }
}

impl fmt::Debug for InvoiceRecordBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InvoiceRecordBuilder")
            .field("config", self.library.config())
            .finish_non_exhaustive()
    }
}

impl InvoiceExtractor for InvoiceRecordBuilder {
    fn extract_structured(&self, payload: &str, source: &str) -> Result<InvoiceRecord> {
        self.from_structured(payload, source)
    }

    fn extract_from_text(&self, text: &str, source: &str) -> Result<InvoiceRecord> {
        self.from_text(text, source)
    }
}

fn record_from_words(words: &WordsResult, source: &str) -> InvoiceRecord {
    let mut invoice_type = InvoiceType::classify(&words.invoice_type);
    if invoice_type == InvoiceType::Generic {
        invoice_type = InvoiceType::classify(&words.invoice_type_org);
    }

    InvoiceRecord {
        invoice_number: words.invoice_num.trim().to_string(),
        invoice_code: words.invoice_code.trim().to_string(),
        invoice_date: normalize_date(&words.invoice_date),
        purchaser_name: words.purchaser_name.trim().to_string(),
        purchaser_tax_id: words.purchaser_register_num.trim().to_string(),
        seller_name: words.seller_name.trim().to_string(),
        seller_tax_id: words.seller_register_num.trim().to_string(),
        total_amount_excl_tax: strip_currency(&words.total_amount),
        total_tax: strip_currency(&words.total_tax),
        total_amount_incl_tax: strip_currency(&words.amount_in_figures),
        invoice_type,
        source_file_path: source.to_string(),
        line_items: reconcile(&words.commodity_columns()),
        raw_source_text: String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::invoice::observer::testing::RecordingObserver;
    use crate::invoice::observer::NoopObserver;
    use crate::models::invoice::LineItem;
    use pretty_assertions::assert_eq;

    const ELECTRONIC_INVOICE: &str = "电子发票（普通发票）\n\
        发票号码:25447000001684857775\n\
        开票日期:2025年08月06日\n\
        购买方信息  91410104MAD3TRFC98名称:郑州琳之星通讯有限公司统一社会信用代码/纳税人识别号:\n\
        销售方信息  914419000585344943名称:华为终端有限公司统一社会信用代码/纳税人识别号:\n\
        项目名称 规格型号 单位 数量 单价 金额 税率/征收率 税额\n\
        *通信终端*手机 ALN-AL00 台 1 167.26 167.26 13% 21.74\n\
        合        计¥167.26¥21.74\n\
        价税合计（大写）壹佰捌拾玖圆整（小写）¥189.00\n";

    fn builder() -> InvoiceRecordBuilder {
        InvoiceRecordBuilder::default().with_observer(Arc::new(NoopObserver))
    }

    #[test]
    fn test_from_text_full_invoice() {
        let record = builder().from_text(ELECTRONIC_INVOICE, "invoice.pdf").unwrap();

        assert_eq!(
            record,
            InvoiceRecord {
                invoice_number: "84857775".to_string(),
                invoice_code: "254470000016".to_string(),
                invoice_date: "2025-08-06".to_string(),
                purchaser_name: "郑州琳之星通讯有限公司".to_string(),
                purchaser_tax_id: "91410104MAD3TRFC98".to_string(),
                seller_name: "华为终端有限公司".to_string(),
                seller_tax_id: "914419000585344943".to_string(),
                total_amount_excl_tax: "167.26".to_string(),
                total_tax: "21.74".to_string(),
                total_amount_incl_tax: "189.00".to_string(),
                invoice_type: InvoiceType::Ordinary,
                source_file_path: "invoice.pdf".to_string(),
                line_items: Vec::new(),
                raw_source_text: ELECTRONIC_INVOICE.to_string(),
            }
        );
        assert!(record.validate().is_empty());
    }

    #[test]
    fn test_from_text_split_number() {
        let record = builder().from_text("发票号码:25447000001684857775", "a.pdf").unwrap();
        assert_eq!(record.invoice_number, "84857775");
        assert_eq!(record.invoice_code, "254470000016");
    }

    #[test]
    fn test_from_text_code_fallback() {
        let record = builder().from_text("发票号码：0012", "a.pdf").unwrap();
        assert_eq!(record.invoice_number, "0012");
        assert_eq!(record.invoice_code, "0012");
    }

    #[test]
    fn test_from_text_split_number_without_colon() {
        let record = builder()
            .from_text("发票号码 25447000001684857775 开票日期 2025年08月06日", "a.pdf")
            .unwrap();
        assert_eq!(record.invoice_number, "84857775");
        assert_eq!(record.invoice_code, "254470000016");
        assert_eq!(record.invoice_date, "2025-08-06");
    }

    #[test]
    fn test_from_text_number_ends_at_line_break() {
        let record = builder()
            .from_text("发票号码 12345678\n开票日期 2025年08月06日", "a.pdf")
            .unwrap();
        assert_eq!(record.invoice_number, "12345678");
        assert_eq!(record.invoice_code, "12345678");
    }

    #[test]
    fn test_from_text_tax_ids_need_party_sections() {
        let builder = builder();

        let record = builder.from_text("发票号码:25447000001684857775", "a.pdf").unwrap();
        assert_eq!(record.purchaser_tax_id, "");
        assert_eq!(record.seller_tax_id, "");

        let record = builder
            .from_text("发票号码:12345678\n开户行及账号：中国银行 622202123456789012\n", "a.pdf")
            .unwrap();
        assert_eq!(record.purchaser_tax_id, "");
        assert_eq!(record.seller_tax_id, "");
    }

    #[test]
    fn test_from_text_anchor_disambiguation() {
        let text = "购买方信息 名称:测试公司统一社会信用代码/纳税人识别号: \
                    销售方信息 名称:另一公司统一社会信用代码/纳税人识别号:";
        let record = builder().from_text(text, "a.pdf").unwrap();
        assert_eq!(record.purchaser_name, "测试公司");
        assert_eq!(record.seller_name, "另一公司");
    }

    #[test]
    fn test_from_text_empty_input() {
        for text in ["", "   ", "\n\t \r\n"] {
            assert_eq!(builder().from_text(text, "a.pdf"), Err(ExtractionError::EmptyInput));
        }
    }

    #[test]
    fn test_from_text_unrecognized_text() {
        let record = builder().from_text("这不是一张发票", "note.txt").unwrap();
        assert_eq!(record.invoice_number, "");
        assert_eq!(record.invoice_code, "");
        assert_eq!(record.invoice_type, InvoiceType::Generic);
        assert_eq!(record.raw_source_text, "这不是一张发票");
    }

    #[test]
    fn test_from_text_is_idempotent() {
        let builder = builder();
        let first = builder.from_text(ELECTRONIC_INVOICE, "invoice.pdf").unwrap();
        let second = builder.from_text(ELECTRONIC_INVOICE, "invoice.pdf").unwrap();
        assert_eq!(first, second);

        let again = builder.from_text(&first.raw_source_text, "invoice.pdf").unwrap();
        assert_eq!(first, again);
    }

    #[test]
    fn test_from_structured() {
        let payload = r#"{
            "log_id": 42,
            "words_result": {
                "InvoiceNum": "12345678",
                "InvoiceCode": "044001900111",
                "InvoiceDate": "2025年08月06日",
                "PurchaserName": "测试公司",
                "PurchaserRegisterNum": "91410104MAD3TRFC98",
                "SellerName": "另一公司",
                "SellerRegisterNum": "914419000585344943",
                "TotalAmount": "1200.00",
                "TotalTax": "86.00",
                "AmountInFiguers": "¥1286.00",
                "InvoiceType": "专用发票",
                "CommodityName": [
                    {"row": "1", "word": "*信息技术服务*软件开发"},
                    {"row": "2", "word": "*办公用品*打印纸 A4"}
                ],
                "CommodityUnit": [{"row": "2", "word": "箱"}],
                "CommodityNum": ["1", "10"],
                "CommodityPrice": ["1000.00", "20.00"],
                "CommodityAmount": ["1000.00", "200.00"],
                "CommodityTaxRate": ["6%", "13%"],
                "CommodityTax": ["60.00", "26.00"]
            }
        }"#;

        let record = builder().from_structured(payload, "scan.jpg").unwrap();
        assert_eq!(record.invoice_number, "12345678");
        assert_eq!(record.invoice_code, "044001900111");
        assert_eq!(record.invoice_date, "2025-08-06");
        assert_eq!(record.purchaser_tax_id, "91410104MAD3TRFC98");
        assert_eq!(record.total_amount_incl_tax, "1286.00");
        assert_eq!(record.invoice_type, InvoiceType::Special);
        assert_eq!(record.source_file_path, "scan.jpg");
        assert_eq!(record.raw_source_text, payload);

        assert_eq!(record.line_items.len(), 2);
        assert_eq!(
            record.line_items[1],
            LineItem {
                name: "*办公用品*打印纸 A4".to_string(),
                specification: "A4".to_string(),
                unit: String::new(),
                quantity: "10".to_string(),
                unit_price: "20.00".to_string(),
                amount: "200.00".to_string(),
                tax_rate: "13%".to_string(),
                tax: "26.00".to_string(),
            }
        );
        // Cells are matched by position, not by their row label
        assert_eq!(record.line_items[0].unit, "箱");
    }

    #[test]
    fn test_from_structured_code_fallback() {
        let payload = r#"{"words_result": {"InvoiceNum": "123456", "InvoiceCode": ""}}"#;
        let record = builder().from_structured(payload, "a.jpg").unwrap();
        assert_eq!(record.invoice_code, "123456");
        assert_eq!(record.invoice_type, InvoiceType::Generic);
        assert!(record.line_items.is_empty());
    }

    #[test]
    fn test_from_structured_regional_type() {
        let payload = r#"{"words_result": {"InvoiceType": "", "InvoiceTypeOrg": "广东增值税电子普通发票"}}"#;
        let record = builder().from_structured(payload, "a.jpg").unwrap();
        assert_eq!(record.invoice_type, InvoiceType::Ordinary);
    }

    #[test]
    fn test_from_structured_uneven_commodities() {
        let payload = r#"{"words_result": {
            "CommodityName": ["a", "b"],
            "CommodityUnit": ["个"],
            "CommodityNum": ["1", "2"],
            "CommodityPrice": [],
            "CommodityAmount": ["1.00", "2.00"],
            "CommodityTaxRate": ["13%"],
            "CommodityTax": ["0.13", "0.26"]
        }}"#;
        let record = builder().from_structured(payload, "a.jpg").unwrap();
        assert_eq!(record.line_items.len(), 2);
        assert!(record.line_items.iter().all(|i| i.unit_price.is_empty()));
    }

    #[test]
    fn test_from_structured_errors() {
        let builder = builder();

        assert_eq!(
            builder.from_structured(r#"{"error_code": 17, "error_msg": "Open api daily request limit reached"}"#, "a.jpg"),
            Err(ExtractionError::MalformedUpstream {
                code: Some("17".to_string()),
                message: "Open api daily request limit reached".to_string(),
            })
        );
        assert_eq!(
            builder.from_structured("{}", "a.jpg"),
            Err(ExtractionError::MalformedUpstream {
                code: None,
                message: ExtractionError::EMPTY_RESULT.to_string(),
            })
        );
        assert!(matches!(
            builder.from_structured("{not json", "a.jpg"),
            Err(ExtractionError::InvalidPayload(_))
        ));
        assert_eq!(builder.from_structured(" ", "a.jpg"), Err(ExtractionError::EmptyInput));
    }

    #[test]
    fn test_from_structured_is_idempotent() {
        let payload = r#"{"words_result": {"InvoiceNum": "123456", "CommodityName": ["x y"]}}"#;
        let builder = builder();
        assert_eq!(
            builder.from_structured(payload, "a.jpg").unwrap(),
            builder.from_structured(payload, "a.jpg").unwrap()
        );
    }

    #[test]
    fn test_observer_receives_events() {
        let observer = Arc::new(RecordingObserver::default());
        let builder = InvoiceRecordBuilder::default().with_observer(observer.clone());

        builder.from_text("发票号码：0012", "a.pdf").unwrap();

        let events = observer.events();
        assert!(events.contains(&"resolved invoice_number #1 pattern".to_string()));
        assert!(events.contains(&"missing invoice_code".to_string()));
        assert!(events.contains(&"fallback invoice_code 0012".to_string()));
    }

    #[test]
    fn test_extractor_trait() {
        let extractor: &dyn InvoiceExtractor = &builder();
        let record = extractor.extract_from_text("发票号码：12345678", "a.pdf").unwrap();
        assert_eq!(record.invoice_number, "12345678");

        let record = extractor
            .extract_structured(r#"{"words_result": {"InvoiceNum": "1"}}"#, "b.jpg")
            .unwrap();
        assert_eq!(record.invoice_code, "1");
    }

    #[test]
    fn test_builder_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<InvoiceRecordBuilder>();
    }
}
