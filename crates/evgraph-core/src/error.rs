//! Centralized error types for evgraph.

use std::path::PathBuf;

use thiserror::Error;

/// Main error type for event-log ingestion.
#[derive(Error, Debug)]
pub enum EvgraphError {
    #[error("Source unavailable ({path}): {reason}")]
    SourceUnavailable { path: PathBuf, reason: String },

    #[error("Schema violation: missing required column(s): {}", .0.join(", "))]
    SchemaViolation(Vec<String>),

    #[error("Invalid timestamp '{value}' for event {event_id}")]
    InvalidTimestamp { event_id: String, value: String },

    #[error("Invariant violation: {0}")]
    InvariantViolation(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

/// Result type for evgraph operations.
pub type CoreResult<T> = Result<T, EvgraphError>;

impl EvgraphError {
    /// Create a source unavailable error.
    pub fn source_unavailable(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        Self::SourceUnavailable {
            path: path.into(),
            reason: reason.to_string(),
        }
    }

    /// Create an invariant violation error.
    pub fn invariant(msg: impl Into<String>) -> Self {
        Self::InvariantViolation(msg.into())
    }

    /// Create a configuration error.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }
}
