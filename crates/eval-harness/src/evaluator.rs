//! Evaluation loop: documents to prompts, prompts to scores, scores to metrics.

use std::collections::BTreeMap;
use std::fs;
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::backend::LoglikelihoodBackend;
use crate::error::{Error, Result};
use crate::metrics::{Aggregation, DocResult, MetricSample, macro_f1_score};
use crate::report::{EvalReport, MetricReport, TaskReport};
use crate::stats::{bootstrap_stderr, standard_error};
use crate::task::{Task, TaskMetadata};

/// Configuration for an evaluation run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvalConfig {
    /// Run name, used to prefix output files.
    pub name: String,
    /// Output directory for per-document samples.
    pub output_dir: PathBuf,
    /// Number of labelled examples in each prompt.
    pub num_fewshot: usize,
    /// Maximum documents per task (for debugging).
    pub limit: Option<usize>,
    /// Seed for document shuffling, few-shot sampling and bootstrap.
    pub seed: u64,
    /// Bootstrap resamples for metrics without a closed-form stderr.
    pub bootstrap_iters: usize,
    /// Text placed before the few-shot examples.
    pub description: Option<String>,
    /// Whether to write per-document samples as JSONL.
    pub write_samples: bool,
}

impl EvalConfig {
    /// Create a new evaluation config.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            output_dir: PathBuf::from("./results"),
            num_fewshot: 0,
            limit: None,
            seed: 42,
            bootstrap_iters: 1000,
            description: None,
            write_samples: false,
        }
    }

    /// Set the output directory.
    pub fn output_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.output_dir = path.into();
        self
    }

    /// Set the number of few-shot examples.
    pub fn num_fewshot(mut self, n: usize) -> Self {
        self.num_fewshot = n;
        self
    }

    /// Set maximum documents per task.
    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Set random seed.
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Set bootstrap iterations.
    pub fn bootstrap_iters(mut self, iters: usize) -> Self {
        self.bootstrap_iters = iters;
        self
    }

    /// Set the prompt description.
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Set whether per-document samples are written.
    pub fn write_samples(mut self, write: bool) -> Self {
        self.write_samples = write;
        self
    }
}

/// One line of the per-document samples file.
#[derive(Serialize)]
struct SampleRecord<'a, D: Serialize> {
    doc_id: usize,
    doc: &'a D,
    scores: &'a [f64],
    metrics: &'a DocResult,
}

/// Runs tasks against a scoring backend.
pub struct Evaluator {
    config: EvalConfig,
    backend: Arc<dyn LoglikelihoodBackend>,
}

impl Evaluator {
    /// Create a new evaluator.
    pub fn new(config: EvalConfig, backend: Arc<dyn LoglikelihoodBackend>) -> Self {
        Self { config, backend }
    }

    pub fn config(&self) -> &EvalConfig {
        &self.config
    }

    /// Evaluate a single task.
    pub async fn evaluate<T: Task>(&self, task: &T) -> Result<TaskReport> {
        let metadata = task.metadata();
        info!(task = %metadata.name, version = metadata.version, "Evaluating task");

        let mut docs = if task.has_test_docs() {
            task.test_docs()?
        } else if task.has_validation_docs() {
            task.validation_docs()?
        } else {
            return Err(Error::MissingSplit(format!(
                "{}: no test or validation split",
                metadata.name
            )));
        };

        let mut rng = StdRng::seed_from_u64(self.config.seed);
        docs.shuffle(&mut rng);
        if let Some(limit) = self.config.limit {
            docs.truncate(limit);
        }
        if docs.is_empty() {
            warn!(task = %metadata.name, "Evaluation split is empty");
        }

        // Build every prompt first so the backend sees one batch.
        let mut requests = Vec::new();
        let mut spans = Vec::with_capacity(docs.len());
        for doc in &docs {
            let ctx = task.fewshot_context(
                doc,
                self.config.num_fewshot,
                &mut rng,
                self.config.description.as_deref(),
            )?;
            let doc_requests = task.construct_requests(doc, &ctx);
            let start = requests.len();
            spans.push(start..start + doc_requests.len());
            requests.extend(doc_requests);
        }

        debug!(
            task = %metadata.name,
            backend = self.backend.name(),
            docs = docs.len(),
            requests = requests.len(),
            "Scoring requests"
        );
        let responses = self.backend.loglikelihood(&requests).await?;
        if responses.len() != requests.len() {
            return Err(Error::ResponseMismatch {
                expected: requests.len(),
                actual: responses.len(),
            });
        }

        let mut samples_file = if self.config.write_samples {
            fs::create_dir_all(&self.config.output_dir)?;
            let file_name = format!("{}_{}_samples.jsonl", self.config.name, metadata.name);
            Some(fs::File::create(self.config.output_dir.join(file_name))?)
        } else {
            None
        };

        let mut samples: BTreeMap<String, Vec<MetricSample>> = BTreeMap::new();
        for (doc_id, (doc, span)) in docs.iter().zip(spans).enumerate() {
            let scores: Vec<f64> = responses[span].iter().map(|r| r.value).collect();
            let result = task.process_results(doc, &scores)?;

            if let Some(file) = samples_file.as_mut() {
                let record = SampleRecord {
                    doc_id,
                    doc,
                    scores: &scores,
                    metrics: &result,
                };
                writeln!(file, "{}", serde_json::to_string(&record)?)?;
            }

            for (metric, sample) in result {
                samples.entry(metric).or_default().push(sample);
            }
        }

        let higher_is_better = task.higher_is_better();
        let mut metrics = Vec::new();
        for (name, aggregation) in task.aggregation() {
            let items = samples.get(name).map(Vec::as_slice).unwrap_or_default();
            let value = aggregation.apply(items)?;
            let stderr = self.stderr(aggregation, items)?;
            metrics.push(MetricReport {
                name: name.to_string(),
                value,
                stderr,
                higher_is_better: higher_is_better.get(name).copied().unwrap_or(true),
            });
        }

        info!(
            task = %metadata.name,
            docs = docs.len(),
            metrics = ?metrics.iter().map(|m| (m.name.as_str(), m.value)).collect::<Vec<_>>(),
            "Task complete"
        );

        Ok(TaskReport {
            task: metadata.name.clone(),
            version: metadata.version,
            dataset_path: metadata.dataset_path.clone(),
            dataset_name: metadata.dataset_name.clone(),
            num_docs: docs.len(),
            num_fewshot: self.config.num_fewshot,
            metrics,
        })
    }

    /// Evaluate several tasks in order and collect their reports.
    pub async fn evaluate_all(&self, tasks: &[Box<dyn EvalTask>]) -> Result<EvalReport> {
        let mut report = EvalReport::new(self.config.clone(), self.backend.name());
        for task in tasks {
            report.tasks.push(task.evaluate_with(self).await?);
        }
        Ok(report)
    }

    fn stderr(&self, aggregation: Aggregation, samples: &[MetricSample]) -> Result<Option<f64>> {
        if samples.len() < 2 {
            return Ok(None);
        }
        let stderr = match aggregation {
            Aggregation::Mean => standard_error(&aggregation.values(samples)?),
            Aggregation::MacroF1 => {
                let pairs = aggregation.pairs(samples)?;
                let iters = self.config.bootstrap_iters;
                let mut rng = StdRng::seed_from_u64(self.config.seed);
                bootstrap_stderr(&pairs, macro_f1_score, iters, &mut rng)
            }
        };
        Ok(Some(stderr))
    }
}

/// Type-erased task, so tasks with different document types can share a list.
#[async_trait]
pub trait EvalTask: Send + Sync {
    fn task_metadata(&self) -> &TaskMetadata;

    async fn evaluate_with(&self, evaluator: &Evaluator) -> Result<TaskReport>;
}

#[async_trait]
impl<T: Task> EvalTask for T {
    fn task_metadata(&self) -> &TaskMetadata {
        self.metadata()
    }

    async fn evaluate_with(&self, evaluator: &Evaluator) -> Result<TaskReport> {
        evaluator.evaluate(self).await
    }
}
