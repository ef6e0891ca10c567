//! Error types for configuration, delivery and reporting.
//!
//! # Design Decisions
//! - Errors of the wrapped service are never converted into these types;
//!   they are propagated untouched
//! - `ReportError` only ever reaches a log line

use thiserror::Error;

/// Error returned when configuration overrides cannot be merged.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid configuration: {0}")]
    Invalid(#[from] serde_json::Error),

    #[error("configuration overrides must be an object, got {0}")]
    NotAnObject(&'static str),
}

/// A semantic problem found in an otherwise well-typed configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("`{field}` must not be empty")]
    Empty { field: &'static str },

    #[error("`level` must be between 0 and 7, got {0}")]
    LevelOutOfRange(u8),

    #[error("`max_chunk_size` must be greater than zero")]
    ZeroChunkSize,
}

/// Failure to deliver a record to the log aggregator.
#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("port 0 is not a valid destination")]
    InvalidPort,

    #[error("could not resolve {target}")]
    Unresolved { target: String },

    #[error("socket error: {0}")]
    Io(#[from] std::io::Error),

    #[error("could not encode record: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("encoded record is {size} bytes, limit is {limit}")]
    Oversized { size: usize, limit: usize },

    #[error("{0}")]
    Rejected(String),
}

/// Failure anywhere in the reporting path.
#[derive(Debug, Error)]
pub enum ReportError {
    #[error(transparent)]
    Notify(#[from] NotifyError),

    #[error("reporting panicked: {0}")]
    Panicked(String),
}
