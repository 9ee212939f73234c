//! Invoice field extraction module.

pub mod builder;
pub mod line_items;
pub mod observer;
pub mod rules;
pub mod structured;

pub use builder::InvoiceRecordBuilder;
pub use line_items::{reconcile, CommodityColumns};
pub use observer::{ExtractionObserver, NoopObserver, TracingObserver};
pub use structured::{OcrResponse, WordsResult};

use crate::error::ExtractionError;
use crate::models::invoice::InvoiceRecord;

/// Result type for extraction operations.
pub type Result<T> = std::result::Result<T, ExtractionError>;

/// Trait for invoice field extractors.
pub trait InvoiceExtractor {
    /// Extract an invoice from a structured OCR response body.
    fn extract_structured(&self, payload: &str, source: &str) -> Result<InvoiceRecord>;

    /// Extract an invoice from plain page text.
    fn extract_from_text(&self, text: &str, source: &str) -> Result<InvoiceRecord>;
}
