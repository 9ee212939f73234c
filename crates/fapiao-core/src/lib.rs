//! Core library for Chinese VAT invoice field extraction.
//!
//! This crate provides:
//! - A typed reader for cloud OCR invoice results (`words_result`)
//! - Rule-based field extraction from raw page text
//! - Section-anchored party disambiguation and code/number splitting
//! - A canonical [`InvoiceRecord`] with line items
//!
//! OCR itself happens elsewhere; this crate only interprets its output.

pub mod error;
pub mod invoice;
pub mod models;

pub use error::{ExtractionError, FapiaoError, Result};
pub use invoice::{
    ExtractionObserver, InvoiceExtractor, InvoiceRecordBuilder, NoopObserver, OcrResponse,
    TracingObserver,
};
pub use models::config::{ExtractionConfig, FapiaoConfig, OutputConfig, SplitRules};
pub use models::invoice::{InvoiceRecord, InvoiceType, LineItem};
