//! OpenAlex API Client
//!
//! Fetches one work record per DOI and extracts its abstract. OpenAlex serves
//! abstracts as an inverted index (word -> positions) rather than plaintext,
//! so the full text is reconstructed here.
//!
//! API Best Practices (per OpenAlex docs):
//! - Use `mailto:email` parameter for polite pool (10 req/s vs 1 req/s)
//! - Use `select` to request only the fields consumed
//! - Works are addressable by their canonical DOI resolver URL

use crate::error::{EnrichError, Result};
use reqwest::Client;
use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;
use tracing::debug;

/// OpenAlex API base URL
const OPENALEX_API_BASE: &str = "https://api.openalex.org";

/// Canonical DOI resolver prefix; OpenAlex accepts resolver URLs as work ids
const DOI_RESOLVER_BASE: &str = "https://doi.org";

/// Email for polite pool access
const POLITE_EMAIL: &str = "doi-abstracts@example.com";

/// OpenAlex work record, narrowed to the single field this tool consumes
#[derive(Debug, Deserialize)]
struct OpenAlexWork {
    #[serde(rename = "abstract_inverted_index")]
    abstract_index: Option<HashMap<String, Vec<i64>>>,
}

/// Client for per-DOI work lookups
pub struct OpenAlexClient {
    client: Client,
    api_base: String,
}

impl OpenAlexClient {
    /// Create a client against the public OpenAlex API.
    pub fn new() -> Result<Self> {
        Self::with_api_base(OPENALEX_API_BASE)
    }

    /// Create a client against a non-default API base (mirrors, tests).
    pub fn with_api_base(api_base: impl Into<String>) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .user_agent(format!("doi-abstracts/1.0 (mailto:{})", POLITE_EMAIL))
            .build()
            .map_err(|e| EnrichError::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            api_base: api_base.into(),
        })
    }

    /// Fetch the abstract for a DOI.
    ///
    /// Returns `Ok(None)` when OpenAlex has no record for the DOI or the
    /// record carries no abstract. Never returns `Some("")`. No retries:
    /// a transient failure surfaces as an error and the caller decides what
    /// a failed row means.
    pub async fn abstract_for_doi(&self, doi: &str) -> Result<Option<String>> {
        let url = work_url(&self.api_base, doi);
        debug!(url = %url, "Fetching OpenAlex work");

        let response = self.client.get(&url).send().await?;
        let status = response.status();

        if status == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }

        if !status.is_success() {
            return Err(EnrichError::Api {
                code: status.as_u16() as i32,
                message: format!("OpenAlex API error: {}", status),
            });
        }

        let body = response.text().await?;
        let work: OpenAlexWork = serde_json::from_str(&body)
            .map_err(|e| EnrichError::Parse(format!("Failed to parse OpenAlex work: {}", e)))?;

        Ok(work
            .abstract_index
            .map(|index| reconstruct_abstract(&index))
            .filter(|text| !text.is_empty()))
    }
}

/// Build the work-record URL for a DOI.
///
/// The DOI rides in the path as a full resolver URL, slashes intact, exactly
/// as OpenAlex expects for external-id lookups.
fn work_url(api_base: &str, doi: &str) -> String {
    format!(
        "{}/works/{}/{}?select=abstract_inverted_index&mailto={}",
        api_base, DOI_RESOLVER_BASE, doi, POLITE_EMAIL
    )
}

/// Reconstruct plaintext from OpenAlex's inverted index.
/// OpenAlex provides abstracts as inverted index for legal reasons.
fn reconstruct_abstract(inverted_index: &HashMap<String, Vec<i64>>) -> String {
    let mut words: Vec<(i64, &str)> = Vec::new();

    for (word, positions) in inverted_index {
        for &pos in positions {
            words.push((pos, word.as_str()));
        }
    }

    words.sort_by_key(|(pos, _)| *pos);
    words.iter().map(|(_, w)| *w).collect::<Vec<_>>().join(" ")
}
