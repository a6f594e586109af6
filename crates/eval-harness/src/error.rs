//! Error types for eval-harness.

use thiserror::Error;

/// Result type for eval-harness operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in eval-harness.
#[derive(Error, Debug)]
pub enum Error {
    /// Gold label is not a key of the task's label dictionary.
    #[error("unknown label `{label}` for task {task}")]
    UnknownLabel { task: String, label: String },

    /// Requested dataset split does not exist.
    #[error("split not found: {0}")]
    MissingSplit(String),

    /// Raw record is missing a field or has the wrong shape.
    #[error("invalid record: {0}")]
    InvalidRecord(String),

    /// Task not found.
    #[error("task not found: {0}")]
    TaskNotFound(String),

    /// Dataset error.
    #[error("dataset error: {0}")]
    DatasetError(String),

    /// Scoring backend error.
    #[error("backend error: {0}")]
    BackendError(String),

    /// Backend or task returned the wrong number of scores.
    #[error("expected {expected} scores, got {actual}")]
    ResponseMismatch { expected: usize, actual: usize },

    /// Fewer labelled examples are available than the few-shot count asks for.
    #[error("{task}: requested {requested} few-shot examples, only {available} available")]
    InsufficientFewshot {
        task: String,
        requested: usize,
        available: usize,
    },

    /// Metric samples of the wrong kind were handed to an aggregation.
    #[error("invalid metric input: {0}")]
    InvalidMetric(String),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
