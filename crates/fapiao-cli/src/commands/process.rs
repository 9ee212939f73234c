//! Process command - extract an invoice from a single OCR output file.

use std::fs;
use std::path::PathBuf;
use std::time::Instant;

use clap::{Args, ValueEnum};
use console::style;
use tracing::{debug, info};

use fapiao_core::invoice::InvoiceRecordBuilder;
use fapiao_core::models::invoice::InvoiceRecord;

use super::{extract_file, load_config, SourceKind};

/// Arguments for the process command.
#[derive(Args)]
pub struct ProcessArgs {
    /// Input file (raw text or OCR JSON response)
    #[arg(required = true)]
    input: PathBuf,

    /// Output file (default: stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Output format (default: from config)
    #[arg(short, long, value_enum)]
    format: Option<OutputFormat>,

    /// Input kind (default: `.json` is structured, anything else text)
    #[arg(short, long, value_enum)]
    source: Option<SourceKind>,

    /// Pretty-print JSON output
    #[arg(long)]
    pretty: bool,

    /// Report missing key fields
    #[arg(long)]
    validate: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// JSON output
    Json,
    /// CSV output
    Csv,
    /// Plain text summary
    Text,
}

impl OutputFormat {
    /// Resolve the format from the command line or the configured name.
    pub fn resolve(arg: Option<Self>, configured: &str) -> anyhow::Result<Self> {
        match arg {
            Some(format) => Ok(format),
            None => Self::from_str(configured, true)
                .map_err(|_| anyhow::anyhow!("Unknown output format in config: {}", configured)),
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Json => "json",
            OutputFormat::Csv => "csv",
            OutputFormat::Text => "txt",
        }
    }
}

pub async fn run(args: ProcessArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let start = Instant::now();
    let config = load_config(config_path)?;

    if !args.input.exists() {
        anyhow::bail!("Input file not found: {}", args.input.display());
    }

    let format = OutputFormat::resolve(args.format, &config.output.format)?;
    let pretty = args.pretty || config.output.pretty;

    info!("Processing file: {}", args.input.display());

    let builder = InvoiceRecordBuilder::new(config.extraction);
    let record = extract_file(&builder, &args.input, args.source)?;

    if args.validate {
        let issues = record.validate();
        if !issues.is_empty() {
            eprintln!("{}", style("Validation issues:").yellow());
            for issue in &issues {
                eprintln!("  - {}", issue);
            }
        }
    }

    let output = format_record(&record, format, pretty)?;

    if let Some(output_path) = &args.output {
        fs::write(output_path, &output)?;
        println!(
            "{} Output written to {}",
            style("✓").green(),
            output_path.display()
        );
    } else {
        println!("{}", output);
    }

    debug!("Total processing time: {:?}", start.elapsed());

    Ok(())
}

/// Render a record in the requested format.
pub fn format_record(record: &InvoiceRecord, format: OutputFormat, pretty: bool) -> anyhow::Result<String> {
    Ok(match format {
        OutputFormat::Json if pretty => serde_json::to_string_pretty(record)?,
        OutputFormat::Json => serde_json::to_string(record)?,
        OutputFormat::Csv => format_record_csv(record)?,
        OutputFormat::Text => format_record_text(record),
    })
}

/// Column names shared by the per-record CSV and the batch summary.
pub const RECORD_COLUMNS: [&str; 11] = [
    "invoice_number",
    "invoice_code",
    "invoice_date",
    "purchaser_name",
    "purchaser_tax_id",
    "seller_name",
    "seller_tax_id",
    "total_amount_excl_tax",
    "total_tax",
    "total_amount_incl_tax",
    "invoice_type",
];

/// Values in [`RECORD_COLUMNS`] order.
pub fn record_values(record: &InvoiceRecord) -> [&str; 11] {
    [
        &record.invoice_number,
        &record.invoice_code,
        &record.invoice_date,
        &record.purchaser_name,
        &record.purchaser_tax_id,
        &record.seller_name,
        &record.seller_tax_id,
        &record.total_amount_excl_tax,
        &record.total_tax,
        &record.total_amount_incl_tax,
        record.invoice_type.label(),
    ]
}

fn format_record_csv(record: &InvoiceRecord) -> anyhow::Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);

    wtr.write_record(RECORD_COLUMNS)?;
    wtr.write_record(record_values(record))?;

    let data = String::from_utf8(wtr.into_inner()?)?;
    Ok(data)
}

fn format_record_text(record: &InvoiceRecord) -> String {
    let mut output = String::new();

    output.push_str(&format!("Invoice: {}\n", record.invoice_number));
    output.push_str(&format!("Code: {}\n", record.invoice_code));
    output.push_str(&format!("Date: {}\n", record.invoice_date));
    output.push_str(&format!("Type: {}\n", record.invoice_type));
    output.push('\n');

    output.push_str("Purchaser:\n");
    output.push_str(&format!("  {}\n", record.purchaser_name));
    if !record.purchaser_tax_id.is_empty() {
        output.push_str(&format!("  Tax ID: {}\n", record.purchaser_tax_id));
    }
    output.push('\n');

    output.push_str("Seller:\n");
    output.push_str(&format!("  {}\n", record.seller_name));
    if !record.seller_tax_id.is_empty() {
        output.push_str(&format!("  Tax ID: {}\n", record.seller_tax_id));
    }
    output.push('\n');

    output.push_str("Summary:\n");
    output.push_str(&format!("  Amount: {}\n", record.total_amount_excl_tax));
    output.push_str(&format!("  Tax:    {}\n", record.total_tax));
    output.push_str(&format!("  Total:  {}\n", record.total_amount_incl_tax));

    if !record.line_items.is_empty() {
        output.push_str(&format!("\nLine items ({}):\n", record.line_items.len()));
        for item in &record.line_items {
            output.push_str(&format!(
                "  - {} {} x {} = {} ({} {})\n",
                item.name, item.quantity, item.unit_price, item.amount, item.tax_rate, item.tax
            ));
        }
    }

    output
}
