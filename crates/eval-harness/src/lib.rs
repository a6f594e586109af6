//! Log-likelihood evaluation harness.
//!
//! This crate provides the pieces dataset adapters plug into:
//! - The [`Task`] trait: documents to prompts, prompts to requests, scores to metrics
//! - Scoring backends answering log-likelihood [`Request`]s
//! - Metric aggregation (mean accuracy, macro-F1) with standard errors
//! - An [`Evaluator`] that runs tasks and a report table renderer
//!
//! # Example
//!
//! ```rust,ignore
//! use eval_harness::{EvalConfig, Evaluator, backends::ScoreFileBackend};
//!
//! let backend = Arc::new(ScoreFileBackend::from_path("scores.jsonl")?);
//! let evaluator = Evaluator::new(EvalConfig::new("lbox").num_fewshot(1), backend);
//! let report = evaluator.evaluate(&task).await?;
//! ```

mod backend;
pub mod backends;
mod dataset;
mod error;
mod evaluator;
mod metrics;
mod report;
mod request;
pub mod stats;
mod task;

pub use backend::LoglikelihoodBackend;
pub use dataset::{DatasetDict, RawRecord};
pub use error::{Error, Result};
pub use evaluator::{EvalConfig, EvalTask, Evaluator};
pub use metrics::{
    ACC, Aggregation, DocResult, MACRO_F1, MetricSample, argmax, macro_f1_score, mean,
};
pub use report::{EvalReport, MetricReport, TaskReport};
pub use request::{Loglikelihood, Request};
pub use task::{Task, TaskMetadata};
