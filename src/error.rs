//! Custom error types for doi-abstracts.
//!
//! These cover the paths that abort a run: reading the input table, building
//! the HTTP client, and persisting checkpoints. Per-row fetch failures are
//! absorbed in [`crate::enrich::fetch_row`] and never surface as this type.

use thiserror::Error;

/// Main error type for enrichment operations.
///
/// Uses `thiserror` for ergonomic error handling and automatic `Display` implementation.
#[derive(Debug, Error)]
pub enum EnrichError {
    /// Network/HTTP request error
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// External API returned a non-success status
    #[error("API error: {code} - {message}")]
    Api {
        /// HTTP status code from the API
        code: i32,
        /// Error message from API
        message: String,
    },

    /// Response body could not be interpreted
    #[error("Parse error: {0}")]
    Parse(String),

    /// File I/O error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV read/write error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Configuration error
    #[error("Config error: {0}")]
    Config(String),
}

/// Result type alias using `EnrichError`
pub type Result<T> = std::result::Result<T, EnrichError>;
