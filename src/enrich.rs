//! Enrichment run loop.
//!
//! Fans out one fetch per row with a bounded number in flight, consumes the
//! outcomes in completion order, merges them into the table by row index,
//! and checkpoints the full table on a fixed cadence. The table is only ever
//! touched here; workers get owned [`RowJob`] snapshots and return plain
//! [`FetchOutcome`] values.

use crate::error::Result;
use crate::openalex::OpenAlexClient;
use crate::table::RecordTable;
use futures::stream::{self, StreamExt};
use indicatif::{ProgressBar, ProgressStyle};
use std::future::Future;
use std::path::Path;
use tracing::{info, warn};

/// Run configuration
#[derive(Debug, Clone)]
pub struct RunOptions {
    /// Maximum concurrent fetches
    pub num_workers: usize,
    /// Checkpoint after this many completed rows (0 disables checkpoints)
    pub save_interval: usize,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            num_workers: 4,
            save_interval: 50,
        }
    }
}

/// Per-row input snapshot handed to a worker. Owns its data so workers never
/// borrow the table.
#[derive(Debug, Clone)]
pub struct RowJob {
    /// Positional index of the record in the table
    pub row: usize,
    /// DOI to resolve, if the row has one
    pub doi: Option<String>,
    /// Whether the row already carries an abstract
    pub has_abstract: bool,
}

/// Per-row result handed back to the merge loop.
#[derive(Debug, Clone)]
pub struct FetchOutcome {
    /// Positional index of the record in the table
    pub row: usize,
    /// `None` means "no update": skipped, DOI-less, unresolved, or failed
    pub abstract_text: Option<String>,
}

/// Counts from a completed run.
#[derive(Debug, Default, Clone, Copy)]
pub struct RunStats {
    /// Rows processed (always the full table)
    pub rows: usize,
    /// Rows that received a fetched abstract
    pub updated: usize,
}

/// Checkpoint cadence: a completion counter with a modulo check.
#[derive(Debug)]
pub struct Checkpointer {
    interval: usize,
    processed: usize,
}

impl Checkpointer {
    pub fn new(interval: usize) -> Self {
        Self {
            interval,
            processed: 0,
        }
    }

    /// Record one completed row. Returns true when a checkpoint is due.
    pub fn record(&mut self) -> bool {
        self.processed += 1;
        self.interval > 0 && self.processed % self.interval == 0
    }

    /// Rows recorded so far.
    pub fn processed(&self) -> usize {
        self.processed
    }
}

/// Decide and fetch for a single row.
///
/// Rows with an existing abstract or no DOI are skipped without a request.
/// A service failure is logged with the DOI and degrades to "no abstract";
/// it never crosses the row boundary.
pub async fn fetch_row(client: &OpenAlexClient, job: RowJob) -> FetchOutcome {
    if job.has_abstract {
        info!(row = job.row, "Abstract already present, skipping");
        return FetchOutcome {
            row: job.row,
            abstract_text: None,
        };
    }

    let Some(doi) = job.doi else {
        return FetchOutcome {
            row: job.row,
            abstract_text: None,
        };
    };

    match client.abstract_for_doi(&doi).await {
        Ok(abstract_text) => FetchOutcome {
            row: job.row,
            abstract_text,
        },
        Err(e) => {
            warn!(doi = %doi, error = %e, "Could not fetch abstract");
            FetchOutcome {
                row: job.row,
                abstract_text: None,
            }
        }
    }
}

/// Run the full enrichment over `table`, writing checkpoints and the final
/// result to `output`.
///
/// `fetch` runs once per row with up to `num_workers` in flight; outcomes
/// arrive in completion order and are merged here, by row index, so output
/// row order always matches the input. The final save happens regardless of
/// whether the last row landed on a checkpoint boundary.
pub async fn enrich<F, Fut>(
    table: &mut RecordTable,
    output: &Path,
    opts: &RunOptions,
    fetch: F,
) -> Result<RunStats>
where
    F: Fn(RowJob) -> Fut,
    Fut: Future<Output = FetchOutcome>,
{
    let jobs = row_jobs(table);
    let total = jobs.len();
    info!(
        rows = total,
        workers = opts.num_workers,
        save_interval = opts.save_interval,
        "Starting enrichment"
    );

    let bar = ProgressBar::new(total as u64);
    bar.set_style(progress_style());

    let mut checkpointer = Checkpointer::new(opts.save_interval);
    let mut stats = RunStats {
        rows: total,
        updated: 0,
    };

    let mut outcomes = stream::iter(jobs)
        .map(|job| fetch(job))
        .buffer_unordered(opts.num_workers.max(1));

    while let Some(outcome) = outcomes.next().await {
        if let Some(text) = outcome.abstract_text.as_deref() {
            table.set_abstract(outcome.row, text);
            stats.updated += 1;
        }

        bar.inc(1);

        if checkpointer.record() {
            info!(processed = checkpointer.processed(), "Saving progress");
            table.save(output)?;
        }
    }

    bar.finish_and_clear();

    table.save(output)?;
    info!(
        rows = stats.rows,
        updated = stats.updated,
        "Enrichment complete"
    );

    Ok(stats)
}

/// Snapshot one independent job per record.
fn row_jobs(table: &RecordTable) -> Vec<RowJob> {
    (0..table.len())
        .map(|row| RowJob {
            row,
            doi: table.doi(row).map(str::to_string),
            has_abstract: table.has_abstract(row),
        })
        .collect()
}

fn progress_style() -> ProgressStyle {
    ProgressStyle::default_bar()
        .template("{bar:30.green/dim} {pos:>7}/{len:7} {eta:>4} {wide_msg:.dim}")
        .expect("invalid template")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_checkpointer_cadence() {
        // save_interval = 2 over 5 rows: checkpoints after rows 2 and 4,
        // never after the trailing odd row
        let mut cp = Checkpointer::new(2);
        let due: Vec<bool> = (0..5).map(|_| cp.record()).collect();
        assert_eq!(due, vec![false, true, false, true, false]);
        assert_eq!(cp.processed(), 5);
    }

    #[test]
    fn test_checkpointer_zero_interval_never_due() {
        let mut cp = Checkpointer::new(0);
        assert!((0..100).all(|_| !cp.record()));
    }

    #[test]
    fn test_checkpointer_every_row() {
        let mut cp = Checkpointer::new(1);
        assert!((0..3).all(|_| cp.record()));
    }

    // Port 9 has no listener; the connection is refused immediately, which
    // stands in for any service failure.
    fn refused_client() -> OpenAlexClient {
        OpenAlexClient::with_api_base("http://127.0.0.1:9").expect("client")
    }

    #[tokio::test]
    async fn test_fetch_row_skips_populated_rows() {
        let outcome = fetch_row(
            &refused_client(),
            RowJob {
                row: 3,
                doi: Some("10.1/a".to_string()),
                has_abstract: true,
            },
        )
        .await;
        assert_eq!(outcome.row, 3);
        assert!(outcome.abstract_text.is_none());
    }

    #[tokio::test]
    async fn test_fetch_row_skips_missing_doi() {
        let outcome = fetch_row(
            &refused_client(),
            RowJob {
                row: 0,
                doi: None,
                has_abstract: false,
            },
        )
        .await;
        assert!(outcome.abstract_text.is_none());
    }

    #[tokio::test]
    async fn test_fetch_row_absorbs_service_errors() {
        let outcome = fetch_row(
            &refused_client(),
            RowJob {
                row: 7,
                doi: Some("10.1/x".to_string()),
                has_abstract: false,
            },
        )
        .await;
        assert_eq!(outcome.row, 7);
        assert!(outcome.abstract_text.is_none());
    }
}
