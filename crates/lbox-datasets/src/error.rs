//! Error types for lbox-datasets.

use thiserror::Error;

/// Result type for lbox-datasets operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in lbox-datasets.
#[derive(Error, Debug)]
pub enum Error {
    /// Dataset not found.
    #[error("dataset not found: {0}")]
    NotFound(String),

    /// Invalid dataset format.
    #[error("invalid dataset format: {0}")]
    InvalidFormat(String),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl From<Error> for eval_harness::Error {
    fn from(err: Error) -> Self {
        eval_harness::Error::DatasetError(err.to_string())
    }
}
