//! Backend that answers from precomputed scores.
//!
//! Scores are produced offline by whatever runs the model and stored as JSONL,
//! one [`ScoreEntry`] per line.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::backend::LoglikelihoodBackend;
use crate::error::{Error, Result};
use crate::request::{Loglikelihood, Request};

/// One precomputed score.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoreEntry {
    pub context: String,
    pub continuation: String,
    pub loglikelihood: f64,
    #[serde(default)]
    pub is_greedy: bool,
}

/// Backend serving precomputed log-likelihoods.
pub struct ScoreFileBackend {
    name: String,
    scores: HashMap<Request, Loglikelihood>,
}

impl ScoreFileBackend {
    /// Build from entries already in memory. Later entries override earlier ones.
    pub fn from_entries(entries: impl IntoIterator<Item = ScoreEntry>) -> Self {
        let scores = entries
            .into_iter()
            .map(|e| {
                (
                    Request::loglikelihood(e.context, e.continuation),
                    Loglikelihood::new(e.loglikelihood, e.is_greedy),
                )
            })
            .collect();
        Self {
            name: "score-file".to_string(),
            scores,
        }
    }

    /// Load scores from a JSONL file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)?;
        let mut entries = Vec::new();

        for (line_num, line) in content.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            let entry: ScoreEntry = serde_json::from_str(line).map_err(|e| {
                Error::BackendError(format!("{}:{}: {}", path.display(), line_num + 1, e))
            })?;
            entries.push(entry);
        }

        debug!(path = %path.display(), entries = entries.len(), "Loaded precomputed scores");
        let mut backend = Self::from_entries(entries);
        backend.name = path.display().to_string();
        Ok(backend)
    }

    pub fn len(&self) -> usize {
        self.scores.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scores.is_empty()
    }
}

#[async_trait]
impl LoglikelihoodBackend for ScoreFileBackend {
    fn name(&self) -> &str {
        &self.name
    }

    async fn loglikelihood(&self, requests: &[Request]) -> Result<Vec<Loglikelihood>> {
        requests
            .iter()
            .map(|r| {
                self.scores.get(r).copied().ok_or_else(|| {
                    Error::BackendError(format!(
                        "no precomputed score for continuation {:?} (context {} chars)",
                        r.continuation,
                        r.context.chars().count()
                    ))
                })
            })
            .collect()
    }
}
