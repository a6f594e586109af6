//! Task trait and registration metadata.

use std::collections::BTreeMap;

use rand::Rng;
use rand::seq::IndexedRandom;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::metrics::{Aggregation, DocResult};
use crate::request::Request;

/// Registration metadata the harness uses to locate and version a task's dataset.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskMetadata {
    /// Task name as used on the command line.
    pub name: String,
    /// Task version; bump when prompts or scoring change.
    pub version: u32,
    /// Dataset path (hub identifier).
    pub dataset_path: String,
    /// Dataset configuration name.
    pub dataset_name: Option<String>,
}

impl TaskMetadata {
    /// Create metadata for a named task.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Set the version.
    pub fn with_version(mut self, version: u32) -> Self {
        self.version = version;
        self
    }

    /// Set the dataset path.
    pub fn with_dataset_path(mut self, path: impl Into<String>) -> Self {
        self.dataset_path = path.into();
        self
    }

    /// Set the dataset configuration name.
    pub fn with_dataset_name(mut self, name: impl Into<String>) -> Self {
        self.dataset_name = Some(name.into());
        self
    }
}

/// A log-likelihood evaluation task.
///
/// Implementations map raw records to documents, documents to prompts and
/// candidate continuations, and continuation scores to per-document metric
/// samples. Everything here is synchronous; the evaluator owns batching.
pub trait Task: Send + Sync {
    /// Normalized document type.
    type Doc: Clone + PartialEq + Serialize + Send + Sync;

    /// Registration metadata.
    fn metadata(&self) -> &TaskMetadata;

    fn has_training_docs(&self) -> bool;
    fn has_validation_docs(&self) -> bool;
    fn has_test_docs(&self) -> bool;

    /// Training documents. Materialised once and cached by the task.
    fn training_docs(&self) -> Result<&[Self::Doc]>;

    fn validation_docs(&self) -> Result<Vec<Self::Doc>>;

    fn test_docs(&self) -> Result<Vec<Self::Doc>>;

    /// Prompt text for a document, without its answer.
    fn doc_to_text(&self, doc: &Self::Doc) -> String;

    /// Gold continuation for a document, used in few-shot examples.
    fn doc_to_target(&self, doc: &Self::Doc) -> Result<String>;

    /// Requests to score for a document given its full prompt.
    fn construct_requests(&self, doc: &Self::Doc, ctx: &str) -> Vec<Request>;

    /// Turn the scores of [`Task::construct_requests`] (same order) into metric samples.
    fn process_results(&self, doc: &Self::Doc, results: &[f64]) -> Result<DocResult>;

    /// Aggregation per metric name.
    fn aggregation(&self) -> BTreeMap<&'static str, Aggregation>;

    /// Whether a higher value is better, per metric name.
    fn higher_is_better(&self) -> BTreeMap<&'static str, bool>;

    /// Documents to draw few-shot examples from when there is no training split.
    fn fewshot_docs(&self) -> Result<Vec<Self::Doc>> {
        if self.has_validation_docs() {
            self.validation_docs()
        } else if self.has_test_docs() {
            self.test_docs()
        } else {
            Err(Error::MissingSplit(format!(
                "{}: no split to draw few-shot examples from",
                self.metadata().name
            )))
        }
    }

    /// Full prompt for `doc`: optional description, `num_fewshot` labelled
    /// examples, then the document's own text.
    fn fewshot_context<R: Rng + ?Sized>(
        &self,
        doc: &Self::Doc,
        num_fewshot: usize,
        rng: &mut R,
        description: Option<&str>,
    ) -> Result<String> {
        let mut ctx = match description {
            Some(d) if !d.is_empty() => format!("{d}\n\n"),
            _ => String::new(),
        };

        if num_fewshot > 0 {
            let examples: Vec<Self::Doc> = if self.has_training_docs() {
                self.training_docs()?
                    .choose_multiple(rng, num_fewshot)
                    .cloned()
                    .collect()
            } else {
                // Draw one extra so the document itself can be dropped.
                self.fewshot_docs()?
                    .choose_multiple(rng, num_fewshot + 1)
                    .filter(|d| *d != doc)
                    .take(num_fewshot)
                    .cloned()
                    .collect()
            };
            if examples.len() < num_fewshot {
                return Err(Error::InsufficientFewshot {
                    task: self.metadata().name.clone(),
                    requested: num_fewshot,
                    available: examples.len(),
                });
            }

            let mut labeled = Vec::with_capacity(examples.len());
            for d in &examples {
                let target = self.doc_to_target(d)?;
                labeled.push(format!("{}{target}", self.doc_to_text(d)));
            }
            ctx.push_str(&labeled.join("\n\n"));
            ctx.push_str("\n\n");
        }

        ctx.push_str(&self.doc_to_text(doc));
        Ok(ctx)
    }
}
