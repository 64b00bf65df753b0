//! doi-abstracts - fetch missing abstracts for a CSV of DOIs
//!
//! Reads a CSV with a `doi` column, looks each DOI-bearing row up on
//! OpenAlex, and writes the enriched table back out, saving progress
//! periodically so an interrupted run loses at most one checkpoint window.
//!
//! ## Usage
//!
//! ```bash
//! doi-abstracts papers.csv enriched.csv --num_workers 4 --save_interval 50
//! ```

use anyhow::{Context, Result};
use clap::Parser;
use doi_abstracts::enrich::{self, RunOptions};
use doi_abstracts::openalex::OpenAlexClient;
use doi_abstracts::table::RecordTable;
use std::path::PathBuf;
use tracing::{info, Level};
use tracing_subscriber::{fmt, EnvFilter};

/// Fetch abstracts for DOIs in a CSV file and save periodically
#[derive(Parser)]
#[command(name = "doi-abstracts")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Path to the input CSV file
    input_file: PathBuf,

    /// Path to the output CSV file
    output_file: PathBuf,

    /// Number of parallel workers
    #[arg(long = "num_workers", default_value_t = 4)]
    num_workers: usize,

    /// Save progress after this many processed rows (0 to disable)
    #[arg(long = "save_interval", default_value_t = 50)]
    save_interval: usize,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.debug { Level::DEBUG } else { Level::INFO };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(log_level.to_string()));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(false)
        .init();

    let mut table = RecordTable::load(&cli.input_file)
        .with_context(|| format!("Failed to read input file {:?}", cli.input_file))?;
    info!(rows = table.len(), "Loaded input table");

    let client = OpenAlexClient::new().context("Failed to build OpenAlex client")?;

    let opts = RunOptions {
        num_workers: cli.num_workers,
        save_interval: cli.save_interval,
    };

    let stats = enrich::enrich(&mut table, &cli.output_file, &opts, |job| {
        enrich::fetch_row(&client, job)
    })
    .await
    .context("Enrichment run failed")?;

    println!(
        "Processing complete. {} of {} rows updated. Results saved to '{}'.",
        stats.updated,
        stats.rows,
        cli.output_file.display()
    );

    Ok(())
}
