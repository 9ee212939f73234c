//! Typed cloud OCR response for VAT invoices.
//!
//! The service returns a `words_result` object keyed by PascalCase field
//! names. Every key is optional and scalars arrive as strings or numbers,
//! so all values go through lenient deserializers that never fail.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::error::ExtractionError;

use super::line_items::CommodityColumns;

/// Top-level OCR service response.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OcrResponse {
    /// Recognized fields; absent when the request failed.
    #[serde(default)]
    pub words_result: Option<WordsResult>,

    /// Upstream error code.
    #[serde(default, deserialize_with = "lenient_optional")]
    pub error_code: Option<String>,

    /// Upstream error message.
    #[serde(default, deserialize_with = "lenient_optional")]
    pub error_msg: Option<String>,

    #[serde(default, deserialize_with = "lenient_optional")]
    pub log_id: Option<String>,
}

impl OcrResponse {
    /// Decode a response body.
    pub fn parse(payload: &str) -> Result<Self, ExtractionError> {
        if payload.trim().is_empty() {
            return Err(ExtractionError::EmptyInput);
        }
        serde_json::from_str(payload).map_err(|e| ExtractionError::InvalidPayload(e.to_string()))
    }

    /// The recognized fields, or the upstream failure.
    pub fn words(&self) -> Result<&WordsResult, ExtractionError> {
        self.words_result.as_ref().ok_or_else(|| {
            ExtractionError::malformed_upstream(self.error_code.clone(), self.error_msg.clone())
        })
    }
}

/// Recognized VAT invoice fields.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct WordsResult {
    #[serde(deserialize_with = "lenient_string")]
    pub invoice_num: String,
    #[serde(deserialize_with = "lenient_string")]
    pub invoice_code: String,
    #[serde(deserialize_with = "lenient_string")]
    pub invoice_date: String,
    #[serde(deserialize_with = "lenient_string")]
    pub purchaser_name: String,
    #[serde(deserialize_with = "lenient_string")]
    pub purchaser_register_num: String,
    #[serde(deserialize_with = "lenient_string")]
    pub seller_name: String,
    #[serde(deserialize_with = "lenient_string")]
    pub seller_register_num: String,
    #[serde(deserialize_with = "lenient_string")]
    pub total_amount: String,
    #[serde(deserialize_with = "lenient_string")]
    pub total_tax: String,
    /// Total including tax. The service historically misspells the key.
    #[serde(alias = "AmountInFiguers", deserialize_with = "lenient_string")]
    pub amount_in_figures: String,
    #[serde(deserialize_with = "lenient_string")]
    pub invoice_type: String,
    /// Regional type label, e.g. "广东增值税电子普通发票".
    #[serde(deserialize_with = "lenient_string")]
    pub invoice_type_org: String,

    #[serde(deserialize_with = "lenient_column")]
    pub commodity_name: Vec<String>,
    #[serde(deserialize_with = "lenient_column")]
    pub commodity_unit: Vec<String>,
    #[serde(deserialize_with = "lenient_column")]
    pub commodity_num: Vec<String>,
    #[serde(deserialize_with = "lenient_column")]
    pub commodity_price: Vec<String>,
    #[serde(deserialize_with = "lenient_column")]
    pub commodity_amount: Vec<String>,
    #[serde(deserialize_with = "lenient_column")]
    pub commodity_tax_rate: Vec<String>,
    #[serde(deserialize_with = "lenient_column")]
    pub commodity_tax: Vec<String>,
}

impl WordsResult {
    /// The seven commodity arrays as reconciler input.
    pub fn commodity_columns(&self) -> CommodityColumns {
        CommodityColumns {
            names: self.commodity_name.clone(),
            units: self.commodity_unit.clone(),
            quantities: self.commodity_num.clone(),
            prices: self.commodity_price.clone(),
            amounts: self.commodity_amount.clone(),
            tax_rates: self.commodity_tax_rate.clone(),
            taxes: self.commodity_tax.clone(),
        }
    }
}

/// Text of a JSON value: strings as is, numbers and booleans printed,
/// `{row, word}` cells by their word, anything else empty.
fn value_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Object(map) => map.get("word").map(value_text).unwrap_or_default(),
        Value::Array(_) | Value::Null => String::new(),
    }
}

fn lenient_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(value_text(&value))
}

fn lenient_optional<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let text = lenient_string(deserializer)?;
    Ok(Some(text).filter(|t| !t.is_empty()))
}

fn lenient_column<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::Array(cells) => cells.iter().map(value_text).collect(),
        Value::Null => Vec::new(),
        other => {
            let text = value_text(&other);
            if text.is_empty() { Vec::new() } else { vec![text] }
        }
    })
}
