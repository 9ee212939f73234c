//! Batch processing command for multiple OCR output files.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use clap::Args;
use console::style;
use glob::glob;
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use tokio::sync::Semaphore;
use tokio::task::JoinError;
use tracing::{debug, warn};

use fapiao_core::invoice::InvoiceRecordBuilder;
use fapiao_core::models::invoice::InvoiceRecord;

use super::process::{format_record, OutputFormat};
use super::{extract_file, load_config, SourceKind};

/// Arguments for the batch command.
#[derive(Args)]
pub struct BatchArgs {
    /// Glob pattern matching input files
    #[arg(required = true)]
    input: String,

    /// Output directory for per-file results
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Output format for each file (default: from config)
    #[arg(short, long, value_enum)]
    format: Option<OutputFormat>,

    /// Input kind for every file (default: detected per file)
    #[arg(short, long, value_enum)]
    source: Option<SourceKind>,

    /// Also generate a summary CSV
    #[arg(long)]
    summary: bool,

    /// Number of parallel workers (default: from config)
    #[arg(short = 'j', long)]
    jobs: Option<usize>,
}

/// Result of processing a single file.
struct ProcessResult {
    path: PathBuf,
    record: Option<InvoiceRecord>,
    error: Option<String>,
    processing_time_ms: u64,
}

/// One row of the summary CSV.
#[derive(Serialize)]
struct SummaryRow<'a> {
    filename: &'a str,
    status: &'a str,
    invoice_number: &'a str,
    invoice_code: &'a str,
    invoice_date: &'a str,
    purchaser_name: &'a str,
    purchaser_tax_id: &'a str,
    seller_name: &'a str,
    seller_tax_id: &'a str,
    total_amount_excl_tax: &'a str,
    total_tax: &'a str,
    total_amount_incl_tax: &'a str,
    invoice_type: &'a str,
    line_items: usize,
    processing_time_ms: u64,
    error: &'a str,
}

pub async fn run(args: BatchArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let start = Instant::now();
    let config = load_config(config_path)?;

    let format = OutputFormat::resolve(args.format, &config.output.format)?;
    let jobs = args.jobs.unwrap_or(config.output.jobs);
    if jobs == 0 {
        anyhow::bail!("Number of jobs must be at least 1");
    }

    let files: Vec<PathBuf> = glob(&args.input)?
        .filter_map(|r| r.ok())
        .filter(|p| p.is_file() && (args.source.is_some() || is_ocr_output(p)))
        .collect();

    if files.is_empty() {
        anyhow::bail!("No matching files found for pattern: {}", args.input);
    }

    println!(
        "{} Found {} files to process",
        style("ℹ").blue(),
        files.len()
    );

    if let Some(ref output_dir) = args.output_dir {
        fs::create_dir_all(output_dir)?;
    }

    let overall_pb = ProgressBar::new(files.len() as u64);
    overall_pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} files")?
            .progress_chars("=>-"),
    );

    let builder = Arc::new(InvoiceRecordBuilder::new(config.extraction.clone()));
    let semaphore = Arc::new(Semaphore::new(jobs));
    let mut handles = Vec::with_capacity(files.len());

    for path in files {
        let permit = Arc::clone(&semaphore).acquire_owned().await?;
        let builder = Arc::clone(&builder);
        let pb = overall_pb.clone();
        let source = args.source;

        let handle_path = path.clone();
        handles.push((handle_path, tokio::task::spawn_blocking(move || {
            let _permit = permit;
            let file_start = Instant::now();
            let result = extract_file(&builder, &path, source);
            let processing_time_ms = file_start.elapsed().as_millis() as u64;
            pb.inc(1);

            match result {
                Ok(record) => ProcessResult {
                    path,
                    record: Some(record),
                    error: None,
                    processing_time_ms,
                },
                Err(e) => {
                    warn!("Failed to process {}: {}", path.display(), e);
                    ProcessResult {
                        path,
                        record: None,
                        error: Some(e.to_string()),
                        processing_time_ms,
                    }
                }
            }
        })));
    }

    let mut results = Vec::with_capacity(handles.len());
    for (path, handle) in handles {
        results.push(joined_result(path, handle.await));
    }

    overall_pb.finish_with_message("Complete");

    let successful: Vec<_> = results.iter().filter(|r| r.record.is_some()).collect();
    let failed: Vec<_> = results.iter().filter(|r| r.error.is_some()).collect();

    if let Some(output_dir) = &args.output_dir {
        for result in &successful {
            if let Some(record) = &result.record {
                let output_name = result.path
                    .file_stem()
                    .and_then(|s| s.to_str())
                    .unwrap_or("invoice");
                let output_path = output_dir.join(format!("{}.{}", output_name, format.extension()));

                fs::write(&output_path, format_record(record, format, config.output.pretty)?)?;
                debug!("Wrote output to {}", output_path.display());
            }
        }
    }

    if args.summary {
        let summary_path = args.output_dir
            .as_ref()
            .map(|d| d.join("summary.csv"))
            .unwrap_or_else(|| PathBuf::from("summary.csv"));

        write_summary(&summary_path, &results)?;
        println!(
            "{} Summary written to {}",
            style("✓").green(),
            summary_path.display()
        );
    }

    println!();
    println!(
        "{} Processed {} files in {:?}",
        style("✓").green(),
        results.len(),
        start.elapsed()
    );
    println!(
        "   {} successful, {} failed",
        style(successful.len()).green(),
        style(failed.len()).red()
    );

    if !failed.is_empty() {
        println!();
        println!("{}", style("Failed files:").red());
        for result in &failed {
            println!(
                "  - {}: {}",
                result.path.display(),
                result.error.as_deref().unwrap_or("unknown error")
            );
        }
    }

    Ok(())
}

/// A worker that panicked counts as a failed file.
fn joined_result(path: PathBuf, joined: Result<ProcessResult, JoinError>) -> ProcessResult {
    joined.unwrap_or_else(|e| {
        warn!("Worker for {} failed: {}", path.display(), e);
        ProcessResult {
            path,
            record: None,
            error: Some(format!("worker failed: {}", e)),
            processing_time_ms: 0,
        }
    })
}

fn is_ocr_output(path: &Path) -> bool {
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
    matches!(ext.to_lowercase().as_str(), "txt" | "text" | "json")
}

fn write_summary(path: &Path, results: &[ProcessResult]) -> anyhow::Result<()> {
    let mut wtr = csv::Writer::from_path(path)?;

    for result in results {
        let filename = result.path.file_name()
            .and_then(|s| s.to_str())
            .unwrap_or("");

        let row = match &result.record {
            Some(record) => SummaryRow {
                filename,
                status: "success",
                invoice_number: &record.invoice_number,
                invoice_code: &record.invoice_code,
                invoice_date: &record.invoice_date,
                purchaser_name: &record.purchaser_name,
                purchaser_tax_id: &record.purchaser_tax_id,
                seller_name: &record.seller_name,
                seller_tax_id: &record.seller_tax_id,
                total_amount_excl_tax: &record.total_amount_excl_tax,
                total_tax: &record.total_tax,
                total_amount_incl_tax: &record.total_amount_incl_tax,
                invoice_type: record.invoice_type.label(),
                line_items: record.line_items.len(),
                processing_time_ms: result.processing_time_ms,
                error: "",
            },
            None => SummaryRow {
                filename,
                status: "error",
                invoice_number: "",
                invoice_code: "",
                invoice_date: "",
                purchaser_name: "",
                purchaser_tax_id: "",
                seller_name: "",
                seller_tax_id: "",
                total_amount_excl_tax: "",
                total_tax: "",
                total_amount_incl_tax: "",
                invoice_type: "",
                line_items: 0,
                processing_time_ms: result.processing_time_ms,
                error: result.error.as_deref().unwrap_or("unknown error"),
            },
        };

        wtr.serialize(row)?;
    }

    wtr.flush()?;
    Ok(())
}
