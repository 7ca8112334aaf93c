//! Error types for the fetcher
//!
//! Early stops inside the page loop (bad status, unparseable body, odd
//! shape) are not errors; they end the loop and keep what was fetched.
//! These variants cover the failures that abort a whole endpoint.

use thiserror::Error;

/// Fetcher error types
#[derive(Error, Debug)]
pub enum FetchError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// No HTTP response was obtained (connect, DNS, timeout, body read)
    #[error("HTTP request error: {0}")]
    HttpError(#[from] reqwest::Error),

    /// Filesystem error while persisting output
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// Serializing the raw capture failed
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// Writing a CSV file failed
    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),
}

/// Result type for fetcher operations
pub type FetchResult<T> = Result<T, FetchError>;

impl FetchError {
    /// Check if the error came from the transport layer
    pub fn is_transport_error(&self) -> bool {
        matches!(self, FetchError::HttpError(_))
    }
}
