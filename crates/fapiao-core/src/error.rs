//! Error types for the fapiao-core library.

use thiserror::Error;

/// Main error type for the fapiao library.
#[derive(Error, Debug)]
pub enum FapiaoError {
    /// Invoice extraction error.
    #[error("extraction error: {0}")]
    Extraction(#[from] ExtractionError),

    /// JSON (de)serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),
}

/// Whole-document extraction failures.
///
/// A field that cannot be found is never an error; it is reported as an
/// empty string on the record. These variants mean the document as a
/// whole produced no usable input.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ExtractionError {
    /// The input text is empty or whitespace only.
    #[error("input text is empty, no invoice fields can be extracted")]
    EmptyInput,

    /// The structured OCR result lacks its `words_result` payload.
    #[error("{}", format_upstream(.code.as_deref(), .message))]
    MalformedUpstream {
        /// Upstream error code, when the service supplied one.
        code: Option<String>,
        /// Upstream error message, or a generic description.
        message: String,
    },

    /// The structured payload could not be decoded at all.
    #[error("invalid OCR payload: {0}")]
    InvalidPayload(String),
}

impl ExtractionError {
    /// Generic message used when the upstream service gave no reason.
    pub const EMPTY_RESULT: &'static str = "empty result";

    /// Build a malformed-upstream error, defaulting the message when absent.
    pub fn malformed_upstream(code: Option<String>, message: Option<String>) -> Self {
        let message = message
            .filter(|m| !m.trim().is_empty())
            .unwrap_or_else(|| Self::EMPTY_RESULT.to_string());
        ExtractionError::MalformedUpstream { code, message }
    }
}

fn format_upstream(code: Option<&str>, message: &str) -> String {
    match code {
        Some(code) => format!("OCR service error {}: {}", code, message),
        None => format!("OCR service error: {}", message),
    }
}

/// Result type for the fapiao library.
pub type Result<T> = std::result::Result<T, FapiaoError>;
