//! Error types for u-report.

use std::path::PathBuf;

/// Result type alias for u-report operations.
pub type Result<T> = std::result::Result<T, ReportError>;

/// All errors produced by u-report operations.
#[derive(Debug, thiserror::Error)]
pub enum ReportError {
    /// Input file does not exist.
    #[error("file '{}' not found", path.display())]
    DataUnavailable { path: PathBuf },

    /// Input could not be parsed as delimited text.
    #[error("malformed data at line {line}: {message}")]
    DataMalformed { line: usize, message: String },

    /// Column length does not match the table's row count.
    #[error("expected {expected} elements, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    /// I/O error during file reading or writing.
    #[error("I/O error at '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// CSV writer failure.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// JSON serialization failure.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Chat completion request or response failure.
    #[error("LLM error: {0}")]
    Llm(String),

    /// Database connection or query failure.
    #[error("database error: {0}")]
    Database(String),

    /// HTTP request failure outside the LLM client.
    #[error("HTTP error: {0}")]
    Http(String),

    /// Invalid configuration.
    #[error("invalid configuration: {0}")]
    Config(String),
}

impl ReportError {
    /// Wraps an I/O error with the path it occurred on.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

impl From<sqlx::Error> for ReportError {
    fn from(e: sqlx::Error) -> Self {
        Self::Database(e.to_string())
    }
}

impl From<figment::Error> for ReportError {
    fn from(e: figment::Error) -> Self {
        Self::Config(e.to_string())
    }
}
