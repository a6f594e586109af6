//! Scoring requests issued by tasks and the responses backends give back.

use serde::{Deserialize, Serialize};

/// A log-likelihood request: score `continuation` given `context`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Request {
    pub context: String,
    pub continuation: String,
}

impl Request {
    /// Create a log-likelihood request.
    pub fn loglikelihood(context: impl Into<String>, continuation: impl Into<String>) -> Self {
        Self {
            context: context.into(),
            continuation: continuation.into(),
        }
    }
}

/// Backend answer to a [`Request`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Loglikelihood {
    /// Summed log-probability of the continuation tokens.
    pub value: f64,
    /// Whether the continuation is the greedy decode of the context.
    pub is_greedy: bool,
}

impl Loglikelihood {
    pub fn new(value: f64, is_greedy: bool) -> Self {
        Self { value, is_greedy }
    }
}
