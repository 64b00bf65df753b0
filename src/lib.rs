//! # doi-abstracts
//!
//! Batch abstract enrichment for bibliographic CSVs: fill the `abstract`
//! column by resolving each row's DOI against OpenAlex.
//!
//! ## Modules
//!
//! - [`table`] - CSV table load/merge/save
//! - [`openalex`] - OpenAlex work lookups by DOI
//! - [`enrich`] - concurrent fetch loop with periodic checkpoints
//! - [`error`] - Custom error types
//!
//! ## Usage
//!
//! ```rust,no_run
//! use doi_abstracts::{enrich, openalex::OpenAlexClient, table::RecordTable};
//! use std::path::Path;
//!
//! # async fn run() -> anyhow::Result<()> {
//! let mut table = RecordTable::load(Path::new("papers.csv"))?;
//! let client = OpenAlexClient::new()?;
//! let opts = enrich::RunOptions::default();
//! let stats = enrich::enrich(&mut table, Path::new("enriched.csv"), &opts, |job| {
//!     enrich::fetch_row(&client, job)
//! })
//! .await?;
//! println!("{} rows updated", stats.updated);
//! # Ok(())
//! # }
//! ```

pub mod enrich;
pub mod error;
pub mod openalex;
pub mod table;

pub use error::{EnrichError, Result};
