//! Error types for caldir-feeds.

use thiserror::Error;

/// Errors that can occur while mirroring feeds.
#[derive(Error, Debug)]
pub enum FeedsError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Feed not found: {0}")]
    FeedNotFound(String),

    #[error("Feed request failed with HTTP status {status}")]
    FetchFailure { status: u16 },

    #[error("HTTP error: {0}")]
    Http(String),

    #[error("Missing required field {0}")]
    FieldMissing(&'static str),

    #[error("Invalid date value: {0}")]
    DateParse(String),

    #[error("Calendar store error: {0}")]
    Store(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Result type alias for caldir-feeds operations.
pub type FeedsResult<T> = Result<T, FeedsError>;
