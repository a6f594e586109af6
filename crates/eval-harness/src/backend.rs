//! Scoring backend trait.

use async_trait::async_trait;

use crate::error::Result;
use crate::request::{Loglikelihood, Request};

/// A model (or a stand-in for one) that scores continuations.
///
/// Backends answer a whole batch at once and must return exactly one
/// [`Loglikelihood`] per request, in request order.
#[async_trait]
pub trait LoglikelihoodBackend: Send + Sync {
    /// Backend name for logs and reports.
    fn name(&self) -> &str;

    /// Score every request in the batch.
    async fn loglikelihood(&self, requests: &[Request]) -> Result<Vec<Loglikelihood>>;
}
