//! Mock backend for testing.

use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;

use crate::backend::LoglikelihoodBackend;
use crate::error::Result;
use crate::request::{Loglikelihood, Request};

/// A scoring rule: when the context contains `context_contains` and the
/// continuation matches, answer with `value`.
#[derive(Debug, Clone)]
struct ScoreRule {
    context_contains: String,
    continuation: String,
    value: f64,
}

/// A mock backend for testing.
///
/// Can be configured with:
/// - Scores per continuation, optionally conditioned on the context
/// - A default score for everything else
/// - Call and request counting
pub struct MockBackend {
    rules: Vec<ScoreRule>,
    default_score: f64,
    call_count: AtomicUsize,
    request_count: AtomicUsize,
}

impl MockBackend {
    /// Create a new mock backend that scores everything as `-1.0`.
    pub fn new() -> Self {
        Self {
            rules: Vec::new(),
            default_score: -1.0,
            call_count: AtomicUsize::new(0),
            request_count: AtomicUsize::new(0),
        }
    }

    /// Score a continuation the same regardless of context.
    pub fn with_score(self, continuation: impl Into<String>, value: f64) -> Self {
        self.with_context_score("", continuation, value)
    }

    /// Score a continuation when the context contains `context_contains`.
    ///
    /// Rules are checked in insertion order; the first match wins.
    pub fn with_context_score(
        mut self,
        context_contains: impl Into<String>,
        continuation: impl Into<String>,
        value: f64,
    ) -> Self {
        self.rules.push(ScoreRule {
            context_contains: context_contains.into(),
            continuation: continuation.into(),
            value,
        });
        self
    }

    /// Set the score for requests no rule matches.
    pub fn with_default_score(mut self, value: f64) -> Self {
        self.default_score = value;
        self
    }

    /// Get the number of batches scored.
    pub fn call_count(&self) -> usize {
        self.call_count.load(Ordering::Relaxed)
    }

    /// Get the number of individual requests scored.
    pub fn request_count(&self) -> usize {
        self.request_count.load(Ordering::Relaxed)
    }

    fn score(&self, request: &Request) -> f64 {
        self.rules
            .iter()
            .find(|r| {
                r.continuation == request.continuation
                    && request.context.contains(&r.context_contains)
            })
            .map(|r| r.value)
            .unwrap_or(self.default_score)
    }
}

impl Default for MockBackend {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl LoglikelihoodBackend for MockBackend {
    fn name(&self) -> &str {
        "mock"
    }

    async fn loglikelihood(&self, requests: &[Request]) -> Result<Vec<Loglikelihood>> {
        self.call_count.fetch_add(1, Ordering::Relaxed);
        self.request_count
            .fetch_add(requests.len(), Ordering::Relaxed);

        Ok(requests
            .iter()
            .map(|r| Loglikelihood::new(self.score(r), false))
            .collect())
    }
}
