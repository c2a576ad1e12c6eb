//! Error types for the credit engine
//!
//! The status and scoring engines never fail; these errors only surface at
//! the ingestion, configuration and storage boundaries.

use thiserror::Error;

/// Credit engine error
#[derive(Debug, Error)]
pub enum Error {
    /// Dataset could not be read as JSON
    #[error("Ingest error: {0}")]
    Ingest(String),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Key-value store failure
    #[error("Storage error: {0}")]
    Storage(String),

    /// New invoice would push the customer past their credit limit
    #[error("Credit limit exceeded: {0}")]
    CreditLimitExceeded(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Ingest(err.to_string())
    }
}

/// Result type
pub type Result<T> = std::result::Result<T, Error>;
