//! Configuration structures for the extraction engine and CLI.

use serde::{Deserialize, Serialize};

use crate::error::{FapiaoError, Result};

/// Main configuration for fapiao.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FapiaoConfig {
    /// Invoice extraction configuration.
    pub extraction: ExtractionConfig,

    /// Output configuration used by the command-line application.
    pub output: OutputConfig,
}

/// Invoice extraction configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionConfig {
    /// Maximum characters taken by a keyword scan.
    pub keyword_max_chars: usize,

    /// Maximum offset of the space that ends a number/date token.
    pub space_token_limit: usize,

    /// Minimum length (in characters) of an anchor-scoped value.
    pub min_value_chars: usize,

    /// Sub-strings that mark the start of the next field in a keyword scan.
    pub stop_words: Vec<String>,

    /// Length rules for splitting a concatenated code+number run.
    pub split: SplitRules,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            keyword_max_chars: 100,
            space_token_limit: 50,
            min_value_chars: 2,
            stop_words: ["统一", "社会", "信用", "代码", "纳税人", "识别号"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            split: SplitRules::default(),
        }
    }
}

/// Digit-run lengths at which an invoice code and number were printed as one token.
///
/// The thresholds come from sampled documents, so they are data rather than
/// constants. Lengths outside these rules are never split.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SplitRules {
    /// Run lengths holding a code of up to `paired_code_max` digits.
    pub paired_lengths: Vec<usize>,

    /// Longest code taken from a paired run.
    pub paired_code_max: usize,

    /// Shortest number left after taking the code from a paired run.
    pub paired_number_min: usize,

    /// Run length holding a fixed-width code.
    pub short_length: usize,

    /// Code width for `short_length` runs.
    pub short_code_len: usize,
}

impl Default for SplitRules {
    fn default() -> Self {
        Self {
            paired_lengths: vec![20, 22],
            paired_code_max: 12,
            paired_number_min: 8,
            short_length: 18,
            short_code_len: 10,
        }
    }
}

/// Output configuration for the command-line application.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Default output format (`json`, `csv` or `text`).
    pub format: String,

    /// Number of documents processed in parallel by `batch`.
    pub jobs: usize,

    /// Pretty-print JSON output.
    pub pretty: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            format: "json".to_string(),
            jobs: 4,
            pretty: false,
        }
    }
}

impl FapiaoConfig {
    /// Load configuration from a JSON file.
    pub fn from_file(path: &std::path::Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to a JSON file.
    pub fn save(&self, path: &std::path::Path) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Reject settings the engine cannot work with.
    pub fn validate(&self) -> Result<()> {
        let split = &self.extraction.split;
        if split.short_code_len > split.short_length {
            return Err(FapiaoError::Config(format!(
                "split.short_code_len ({}) exceeds split.short_length ({})",
                split.short_code_len, split.short_length
            )));
        }
        if let Some(len) = split
            .paired_lengths
            .iter()
            .find(|&&len| len < split.paired_number_min)
        {
            return Err(FapiaoError::Config(format!(
                "split.paired_lengths entry {} is shorter than split.paired_number_min ({})",
                len, split.paired_number_min
            )));
        }
        if self.extraction.keyword_max_chars == 0 {
            return Err(FapiaoError::Config(
                "extraction.keyword_max_chars must be positive".to_string(),
            ));
        }
        if self.output.jobs == 0 {
            return Err(FapiaoError::Config("output.jobs must be positive".to_string()));
        }
        Ok(())
    }
}
