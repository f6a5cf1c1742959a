//! Error types for the analytics pipeline.
//!
//! Uses `thiserror` for ergonomic error definitions with automatic `From` implementations.

use std::fmt;
use thiserror::Error;

/// Why the safety gate refused a candidate statement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UnsafeReason {
    /// Statement does not start with `select`
    NotSelect,
    /// Statement separator found before the final character
    MultipleStatements,
}

impl fmt::Display for UnsafeReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotSelect => write!(f, "only SELECT statements are allowed"),
            Self::MultipleStatements => write!(f, "only a single SQL statement is allowed"),
        }
    }
}

/// Error type for every pipeline stage.
#[derive(Error, Debug)]
pub enum AnalyticsError {
    /// Table metadata could not be read
    #[error("Schema unavailable: {0}")]
    SchemaUnavailable(String),

    /// Candidate statement failed an allow-list rule
    #[error("Unsafe statement: {0}")]
    UnsafeStatement(UnsafeReason),

    /// Candidate statement failed the dry-run against the store
    #[error("Invalid statement: {0}")]
    InvalidStatement(String),

    /// Store rejected a validated statement at execution time
    #[error("{0}")]
    ExecutionFailure(String),

    /// Language model call failed or returned an unusable response
    #[error("LLM request failed: {0}")]
    LlmError(String),

    /// CSV import failed
    #[error("Ingest failed: {0}")]
    IngestError(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Storage layer error (SQLite)
    #[error("Storage error: {0}")]
    StorageError(#[from] rusqlite::Error),

    /// CSV reader error
    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// I/O error
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// HTTP client error (for model APIs)
    #[error("HTTP error: {0}")]
    HttpError(#[from] reqwest::Error),

    /// Internal error (blocking task panicked or was cancelled)
    #[error("Internal error: {0}")]
    InternalError(String),
}

impl AnalyticsError {
    /// Create an LLM error with context.
    pub fn llm(msg: impl Into<String>) -> Self {
        Self::LlmError(msg.into())
    }

    /// Create an ingest error with context.
    pub fn ingest(msg: impl Into<String>) -> Self {
        Self::IngestError(msg.into())
    }
}

impl From<tokio::task::JoinError> for AnalyticsError {
    fn from(err: tokio::task::JoinError) -> Self {
        Self::InternalError(format!("blocking task failed: {}", err))
    }
}

/// Result alias used across the crate.
pub type Result<T> = std::result::Result<T, AnalyticsError>;
