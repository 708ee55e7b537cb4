//! Error types for the ingestion crate.

use aq_common::AqError;
use thiserror::Error;

/// Errors that can occur during ingestion.
#[derive(Error, Debug)]
pub enum IngestionError {
    #[error("Request to {url} failed: {source}")]
    Fetch {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Provider returned HTTP {status} for page {page}")]
    HttpStatus { status: u16, page: u32 },

    #[error("Failed to decode page {page}: {message}")]
    Decode { page: u32, message: String },

    #[error("Malformed record: {0}")]
    MalformedRecord(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Storage error: {0}")]
    Storage(#[from] AqError),
}

impl IngestionError {
    /// Whether retrying the same request could succeed.
    ///
    /// Timeouts, connection failures, 5xx and 429 are transient. Decoding
    /// and storage failures never are.
    pub fn is_transient(&self) -> bool {
        match self {
            IngestionError::Fetch { source, .. } => source.is_timeout() || source.is_connect(),
            IngestionError::HttpStatus { status, .. } => *status >= 500 || *status == 429,
            _ => false,
        }
    }
}

/// Result type for ingestion operations.
pub type Result<T> = std::result::Result<T, IngestionError>;
