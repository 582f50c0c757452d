//! Error types for the docrec-core library.

use std::path::PathBuf;

use thiserror::Error;

/// Main error type for the docrec library.
#[derive(Error, Debug)]
pub enum DocrecError {
    /// Document extraction error.
    #[error("extraction error: {0}")]
    Extraction(#[from] ExtractError),

    /// Validation error that aborts the run.
    #[error("validation error: {0}")]
    Validation(#[from] ValidationError),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON (de)serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),
}

/// Errors raised by an extraction backend.
#[derive(Error, Debug)]
pub enum ExtractError {
    /// The input document does not exist.
    #[error("document not found: {}", .0.display())]
    NotFound(PathBuf),

    /// The input document exists but could not be read.
    #[error("failed to read {}: {source}", path.display())]
    Unreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The document format is not handled by the backend.
    #[error("unsupported document format: {0}")]
    UnsupportedFormat(String),

    /// A pre-extracted document could not be decoded.
    #[error("invalid extracted document {}: {reason}", path.display())]
    InvalidDocument { path: PathBuf, reason: String },
}

/// Errors raised by the validation engine.
#[derive(Error, Debug)]
pub enum ValidationError {
    /// The `fail` policy exceeded its error budget.
    #[error("too many validation errors: {count} (max {max})")]
    TooManyErrors { count: usize, max: usize },
}

/// Result type for the docrec library.
pub type Result<T> = std::result::Result<T, DocrecError>;
