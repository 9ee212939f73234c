//! Subcommand implementations.

pub mod batch;
pub mod config;
pub mod process;

use std::fs;
use std::path::{Path, PathBuf};

use clap::ValueEnum;
use tracing::debug;

use fapiao_core::invoice::InvoiceRecordBuilder;
use fapiao_core::models::config::FapiaoConfig;
use fapiao_core::models::invoice::InvoiceRecord;

/// Kind of OCR output stored in an input file.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum SourceKind {
    /// Raw page text from a document text extractor
    Text,
    /// Cloud OCR JSON response with `words_result`
    Structured,
}

impl SourceKind {
    /// Guess the kind from the file extension: `.json` is structured.
    pub fn detect(path: &Path) -> Self {
        let is_json = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("json"));
        if is_json { SourceKind::Structured } else { SourceKind::Text }
    }
}

/// Default configuration file location.
pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("fapiao")
        .join("config.json")
}

/// Load the configuration from `--config`, the default location, or defaults.
pub fn load_config(config_path: Option<&str>) -> anyhow::Result<FapiaoConfig> {
    if let Some(path) = config_path {
        return Ok(FapiaoConfig::from_file(Path::new(path))?);
    }

    let path = default_config_path();
    if path.exists() {
        debug!("Loading configuration from {}", path.display());
        Ok(FapiaoConfig::from_file(&path)?)
    } else {
        Ok(FapiaoConfig::default())
    }
}

/// Read one OCR output file and build its invoice record.
pub fn extract_file(
    builder: &InvoiceRecordBuilder,
    path: &Path,
    source: Option<SourceKind>,
) -> anyhow::Result<InvoiceRecord> {
    let content = fs::read_to_string(path)?;
    let content = content.trim_start_matches('\u{feff}');
    let source_id = path.display().to_string();

    let record = match source.unwrap_or_else(|| SourceKind::detect(path)) {
        SourceKind::Text => builder.from_text(content, &source_id)?,
        SourceKind::Structured => builder.from_structured(content, &source_id)?,
    };

    Ok(record)
}
