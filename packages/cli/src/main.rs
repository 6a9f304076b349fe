//! Batch upgrade of stored metadata items
//!
//! Reads items as JSON lines (`{"uuid": ..., "item_type": ..., "properties": {...}}`),
//! upgrades each to its type's current schema version and writes them back out
//! in the same order.
//!
//! # Usage
//!
//! ```bash
//! upgrade-records --input items.jsonl --output upgraded.jsonl --skip-errors
//! cat items.jsonl | upgrade-records > upgraded.jsonl
//! ```
//!
//! Logging goes to stderr and is controlled with `RUST_LOG`.

mod io;

use anyhow::{bail, Context, Result};
use clap::Parser;
use encoded_upgrade::{default_registry, BatchReport, ErrorPolicy, SchemaVersion, UpgradeConfig};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

const DEFAULT_LOG_FILTER: &str = "upgrade_records=info,encoded_upgrade=info";

#[derive(Parser)]
#[command(name = "upgrade-records")]
#[command(about = "Upgrade JSON-lines metadata items to their current schema version", long_about = None)]
struct Cli {
    /// Input file, or `-` for stdin
    #[arg(short, long, default_value = "-")]
    input: PathBuf,

    /// Output file, or `-` for stdout
    #[arg(short, long, default_value = "-")]
    output: PathBuf,

    /// JSON file with registry settings
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Keep going past failing items, writing them unchanged
    #[arg(long)]
    skip_errors: bool,

    /// Upgrade to this version instead of each type's current version
    #[arg(short, long)]
    target: Option<SchemaVersion>,

    /// Write the run summary as JSON to this file
    #[arg(long)]
    report: Option<PathBuf>,
}

#[derive(Serialize)]
struct RunSummary<'a> {
    /// Absent when the input was rejected before any item was upgraded
    #[serde(flatten)]
    batch: Option<&'a BatchReport>,
    parse_failures: &'a [io::ParseFailure],
    /// True when an undecodable line stopped the run under `Abort`
    input_rejected: bool,
}

async fn write_report(path: Option<&Path>, summary: &RunSummary<'_>) -> Result<()> {
    let Some(path) = path else {
        return Ok(());
    };

    let json = serde_json::to_string_pretty(summary)?;
    tokio::fs::write(path, json)
        .await
        .with_context(|| format!("Failed to write report {}", path.display()))
}

fn load_config(cli: &Cli) -> Result<UpgradeConfig> {
    let mut config = match &cli.config {
        Some(path) => UpgradeConfig::from_json_file(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => UpgradeConfig::default(),
    };

    if cli.skip_errors {
        config.on_error = ErrorPolicy::Skip;
    }

    Ok(config)
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER)),
        )
        .init();

    let cli = Cli::parse();
    let config = load_config(&cli)?;
    let on_error = config.on_error;
    let registry = default_registry(config);

    let mut batch = io::read_batch(&cli.input).await?;
    tracing::info!(
        items = batch.items.len(),
        undecodable = batch.parse_failures.len(),
        "Read input"
    );

    if on_error == ErrorPolicy::Abort {
        if let Some(first) = batch.parse_failures.first() {
            let summary = RunSummary {
                batch: None,
                parse_failures: &batch.parse_failures,
                input_rejected: true,
            };
            write_report(cli.report.as_deref(), &summary).await?;
            bail!("Line {} is not a valid item: {}", first.line, first.error);
        }
    }

    let report = registry.upgrade_batch_to(&mut batch.items, cli.target.as_ref());

    tracing::info!(
        upgraded = report.upgraded,
        unchanged = report.unchanged,
        failed = report.failures.len(),
        "Upgrade finished"
    );

    let summary = RunSummary {
        batch: Some(&report),
        parse_failures: &batch.parse_failures,
        input_rejected: false,
    };
    write_report(cli.report.as_deref(), &summary).await?;

    if let Some(failure) = report.failures.first().filter(|_| report.aborted) {
        bail!(
            "Upgrade aborted at item {} ({}): {}",
            failure.index,
            failure.label,
            failure.error
        );
    }

    io::write_batch(&cli.output, &batch, &report).await?;
    Ok(())
}
