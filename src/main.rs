//! mcs-extract CLI: collect, resolve and parse Mineral Commodity Summaries.

use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use mcs_extract::collector::{self, CollectionPlan, Collector};
use mcs_extract::config::CollectorConfig;
use mcs_extract::schema::{now_iso8601, CollectionReport};
use mcs_extract::source::pdf::{PdfDecoder, TextDecoder};
use mcs_extract::source::{AutoDecoder, DecoderKind, PageDecoder};
use mcs_extract::audit::{self, LabelField};
use mcs_extract::{catalog, export, locator};

#[derive(Parser)]
#[command(
    name = "mcs-extract",
    version,
    about = "Production and reserves tables from the Mineral Commodity Summaries"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Fetch and parse every commodity for a range of years
    Collect {
        /// Commodity ids, e.g. "barite", "rare earths"
        #[arg(long = "commodity", required = true, num_args = 1..)]
        commodities: Vec<String>,
        #[arg(long)]
        from: u16,
        /// Defaults to `--from`
        #[arg(long)]
        to: Option<u16>,
        /// JSON config file
        #[arg(long, env = "MCS_CONFIG")]
        config: Option<PathBuf>,
        #[arg(long)]
        workers: Option<usize>,
        #[arg(long)]
        interval_ms: Option<u64>,
        /// Write the full report as JSON
        #[arg(long)]
        json: Option<PathBuf>,
        /// Write accepted rows as CSV
        #[arg(long)]
        csv: Option<PathBuf>,
    },
    /// Print the candidate addresses for one commodity and year
    Resolve {
        #[arg(long)]
        commodity: String,
        #[arg(long)]
        year: u16,
    },
    /// Run the extractor and normalizer on a local document
    Parse {
        #[arg(long)]
        file: PathBuf,
        #[arg(long)]
        commodity: String,
        #[arg(long)]
        year: u16,
        /// "pdf" or "text"; sniffed from the file when omitted
        #[arg(long)]
        format: Option<String>,
    },
    /// Re-normalize the country names of a saved JSON report
    Clean {
        #[arg(long)]
        report: PathBuf,
        /// Defaults to rewriting `--report` in place
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Label frequencies, suspicious labels and years without data
    Analyze {
        #[arg(long)]
        report: PathBuf,
        /// Analyze the labels as extracted instead of the normalized names
        #[arg(long)]
        raw: bool,
        #[arg(long, default_value_t = 20)]
        top: usize,
        /// Write the full analysis as JSON
        #[arg(long)]
        json: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "mcs_extract=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    catalog::validate_static_tables().context("Static lookup tables are inconsistent")?;

    match Cli::parse().command {
        Command::Collect {
            commodities,
            from,
            to,
            config,
            workers,
            interval_ms,
            json,
            csv,
        } => {
            let mut config = CollectorConfig::load(config.as_deref())?;
            if let Some(workers) = workers {
                config.workers = workers;
            }
            if let Some(interval_ms) = interval_ms {
                config.min_request_interval_ms = interval_ms;
            }
            let plan = CollectionPlan::new(commodities, from, to.unwrap_or(from));
            run_collect(plan, config.sanitized(), json.as_deref(), csv.as_deref()).await
        }
        Command::Resolve { commodity, year } => run_resolve(&commodity, year),
        Command::Parse {
            file,
            commodity,
            year,
            format,
        } => run_parse(&file, &commodity, year, format.as_deref()),
        Command::Clean { report, out } => run_clean(&report, out.as_deref()),
        Command::Analyze {
            report,
            raw,
            top,
            json,
        } => run_analyze(&report, raw, top, json.as_deref()),
    }
}

async fn run_collect(
    plan: CollectionPlan,
    config: CollectorConfig,
    json: Option<&Path>,
    csv: Option<&Path>,
) -> Result<()> {
    let jobs = plan.jobs();
    info!(
        "Collecting {} jobs with {} workers, {}ms between requests",
        jobs.len(),
        config.workers,
        config.min_request_interval_ms
    );

    let started_at = now_iso8601();
    let collector = Collector::http(config).context("Failed to build HTTP collector")?;
    let results = collector.collect_all(jobs).await;
    let report = CollectionReport::new(started_at, results);

    for result in &report.results {
        println!(
            "{:<20} {} {:<30} {:>4} rows",
            result.commodity,
            result.year,
            result.outcome,
            result.rows.len()
        );
    }
    println!(
        "\n{} parsed, {} zero rows, {} no table, {} not resolvable, {} rows total",
        report.summary.resolved_and_parsed,
        report.summary.resolved_but_zero_valid_rows,
        report.summary.resolved_but_no_table_found,
        report.summary.not_resolvable,
        report.summary.total_rows
    );

    if let Some(path) = json {
        export::write_json_file(&report, path)?;
        info!("Wrote report {} to {:?}", report.id, path);
    }
    if let Some(path) = csv {
        let written = export::write_rows_csv_file(&report, path)?;
        info!("Wrote {} rows to {:?}", written, path);
    }
    Ok(())
}

fn run_resolve(commodity: &str, year: u16) -> Result<()> {
    match locator::resolve(commodity, year) {
        Ok(located) => {
            for (index, address) in located.candidates().enumerate() {
                let role = if index == 0 { "primary" } else { "alternate" };
                println!("{:<9} {}", role, address);
            }
        }
        Err(reason) => println!("not resolvable: {}", reason),
    }
    Ok(())
}

fn run_parse(file: &Path, commodity: &str, year: u16, format: Option<&str>) -> Result<()> {
    let bytes = std::fs::read(file).with_context(|| format!("Failed to read {:?}", file))?;
    let pages = match format {
        Some(name) => {
            let kind = DecoderKind::from_str(name)
                .with_context(|| format!("Unknown format {:?}, expected pdf or text", name))?;
            match kind {
                DecoderKind::Pdf => PdfDecoder.decode(&bytes)?,
                DecoderKind::Text => TextDecoder.decode(&bytes)?,
            }
        }
        None => AutoDecoder.decode(&bytes)?,
    };

    let address = file.display().to_string();
    let extraction = collector::extract_normalized(&pages, commodity, year, &address);
    match extraction.header_line() {
        Some(line) => println!("header:     {}", line.trim()),
        None => println!("header:     (none found)"),
    }
    println!("multiplier: {}", extraction.multiplier());
    println!("layout:     {:?} (verified: {})", extraction.layout, extraction.layout_verified);
    println!("rejected:   {} lines\n", extraction.rejected);
    for row in &extraction.rows {
        println!(
            "{:<28} {:>14} {:>16}   [{}]",
            row.country,
            format_volume(row.production_volume),
            format_volume(row.reserves_volume),
            row.country_raw
        );
    }
    Ok(())
}

fn run_clean(report_path: &Path, out: Option<&Path>) -> Result<()> {
    let mut report = export::read_json_file(report_path)?;
    let summary = audit::clean_report(&mut report);
    let out = out.unwrap_or(report_path);
    export::write_json_file(&report, out)?;
    println!(
        "{} records, {} corrections, written to {:?}",
        summary.records, summary.corrections, out
    );
    Ok(())
}

fn run_analyze(report_path: &Path, raw: bool, top: usize, json: Option<&Path>) -> Result<()> {
    let report = export::read_json_file(report_path)?;
    let field = if raw { LabelField::Raw } else { LabelField::Country };
    let analysis = audit::analyze(&report, field);

    println!("Total labels:  {}", analysis.total_labels);
    println!("Unique labels: {}", analysis.unique_labels);
    println!("\nTop {} labels:", top);
    for entry in analysis.frequencies.iter().take(top) {
        println!("  {:>6}  {}", entry.count, entry.label);
    }
    println!("\nSuspicious labels ({}):", analysis.suspicious.len());
    for label in &analysis.suspicious {
        println!("  {}", label);
    }
    println!("\nYears without data:");
    for (commodity, years) in &analysis.missing_years {
        let years: Vec<String> = years.iter().map(u16::to_string).collect();
        println!("  {:<20} {}", commodity, years.join(", "));
    }

    if let Some(path) = json {
        let file = std::fs::File::create(path)
            .with_context(|| format!("Failed to create {:?}", path))?;
        let mut writer = std::io::BufWriter::new(file);
        serde_json::to_writer_pretty(&mut writer, &analysis)
            .with_context(|| format!("Failed to write {:?}", path))?;
        writer.flush().with_context(|| format!("Failed to write {:?}", path))?;
        info!("Wrote analysis to {:?}", path);
    }
    Ok(())
}

fn format_volume(value: Option<f64>) -> String {
    value.map(|v| v.to_string()).unwrap_or_else(|| "-".to_string())
}
