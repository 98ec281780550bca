//! Error types for the preprocessing pipeline and the dataset reader.

use std::path::PathBuf;
use thiserror::Error;

/// Every failure is fatal: callers abort the run and treat the output
/// directory as incomplete.
#[derive(Error, Debug)]
pub enum PreprocessError {
    /// Invalid option or option combination, detected before any input is read
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// A corpus line that is not a JSON object with a `text` field
    #[error("Parse error in {path} at line {line}: {message}")]
    Parse {
        path: PathBuf,
        line: usize,
        message: String,
    },

    /// I/O error with file context
    #[error("I/O error for {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Covariate file shorter than the matrix it labels
    #[error("No covariate for row {row}: covariate file has {available} lines")]
    Alignment { row: usize, available: usize },

    /// Malformed sparse matrix container
    #[error("Invalid matrix file {path}: {message}")]
    Format { path: PathBuf, message: String },

    /// Zip archive error
    #[error("Archive error: {0}")]
    Zip(#[from] zip::result::ZipError),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Failure inside the model-based tokenizer
    #[error("Tokenization error: {0}")]
    Tokenize(String),
}

impl PreprocessError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        PreprocessError::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn format(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        PreprocessError::Format {
            path: path.into(),
            message: message.into(),
        }
    }
}

/// Result type alias for pipeline operations.
pub type Result<T> = std::result::Result<T, PreprocessError>;
