//! Error types for the graph builder

use std::path::PathBuf;

use thiserror::Error;

/// Graph builder error types
#[derive(Error, Debug)]
pub enum GraphError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Filesystem error
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// Reading or writing CSV failed
    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),

    /// An input file lacks a required column
    #[error("{path} is missing the required column '{column}'", path = .file.display())]
    MissingColumn {
        /// File that was read
        file: PathBuf,
        /// Column that was expected
        column: String,
    },
}

/// Result type for graph operations
pub type GraphResult<T> = Result<T, GraphError>;
