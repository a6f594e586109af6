//! Per-document metric samples and corpus-level aggregations.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Name of the accuracy metric.
pub const ACC: &str = "acc";
/// Name of the macro-averaged F1 metric.
pub const MACRO_F1: &str = "macro_f1";

/// One document's contribution to a metric.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MetricSample {
    /// Correctness flag, folded by [`Aggregation::Mean`].
    Bool(bool),
    /// `(gold, pred)` label indices, folded by [`Aggregation::MacroF1`].
    Pair(usize, usize),
}

impl MetricSample {
    fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
            Self::Pair(..) => None,
        }
    }

    fn as_pair(&self) -> Option<(usize, usize)> {
        match self {
            Self::Pair(gold, pred) => Some((*gold, *pred)),
            Self::Bool(_) => None,
        }
    }
}

/// Metric samples produced by processing one document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DocResult {
    samples: BTreeMap<String, MetricSample>,
}

impl DocResult {
    /// Create an empty result.
    pub fn new() -> Self {
        Self::default()
    }

    /// Result of a classification decision: `acc` and the `(gold, pred)` pair.
    pub fn classification(gold: usize, pred: usize) -> Self {
        Self::new()
            .with(ACC, MetricSample::Bool(gold == pred))
            .with(MACRO_F1, MetricSample::Pair(gold, pred))
    }

    /// Add a metric sample.
    pub fn with(mut self, metric: impl Into<String>, sample: MetricSample) -> Self {
        self.samples.insert(metric.into(), sample);
        self
    }

    pub fn get(&self, metric: &str) -> Option<&MetricSample> {
        self.samples.get(metric)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &MetricSample)> {
        self.samples.iter().map(|(k, v)| (k.as_str(), v))
    }
}

impl IntoIterator for DocResult {
    type Item = (String, MetricSample);
    type IntoIter = std::collections::btree_map::IntoIter<String, MetricSample>;

    fn into_iter(self) -> Self::IntoIter {
        self.samples.into_iter()
    }
}

/// How a metric's samples are folded into one corpus score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Aggregation {
    Mean,
    MacroF1,
}

impl Aggregation {
    /// Aggregate samples into a corpus-level score.
    pub fn apply(&self, samples: &[MetricSample]) -> Result<f64> {
        match self {
            Self::Mean => Ok(mean(&self.values(samples)?)),
            Self::MacroF1 => Ok(macro_f1_score(&self.pairs(samples)?)),
        }
    }

    pub(crate) fn values(&self, samples: &[MetricSample]) -> Result<Vec<f64>> {
        samples
            .iter()
            .map(|s| {
                s.as_f64().ok_or_else(|| {
                    Error::InvalidMetric(format!("{self:?} expects booleans, got {s:?}"))
                })
            })
            .collect()
    }

    pub(crate) fn pairs(&self, samples: &[MetricSample]) -> Result<Vec<(usize, usize)>> {
        samples
            .iter()
            .map(|s| {
                s.as_pair().ok_or_else(|| {
                    Error::InvalidMetric(format!("{self:?} expects (gold, pred) pairs, got {s:?}"))
                })
            })
            .collect()
    }
}

/// Arithmetic mean; 0 for an empty slice.
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        0.0
    } else {
        values.iter().sum::<f64>() / values.len() as f64
    }
}

/// Macro-averaged F1 over `(gold, pred)` pairs.
///
/// The label set is the union of gold and predicted labels. A label whose
/// F1 denominator is zero contributes 0. An empty input scores 0.
pub fn macro_f1_score(pairs: &[(usize, usize)]) -> f64 {
    let labels: BTreeSet<usize> = pairs.iter().flat_map(|&(g, p)| [g, p]).collect();
    if labels.is_empty() {
        return 0.0;
    }

    let total: f64 = labels
        .iter()
        .map(|&label| {
            let mut tp = 0usize;
            let mut fp = 0usize;
            let mut fn_ = 0usize;
            for &(gold, pred) in pairs {
                match (pred == label, gold == label) {
                    (true, true) => tp += 1,
                    (true, false) => fp += 1,
                    (false, true) => fn_ += 1,
                    (false, false) => {}
                }
            }
            let denom = 2 * tp + fp + fn_;
            if denom == 0 {
                0.0
            } else {
                (2 * tp) as f64 / denom as f64
            }
        })
        .sum();

    total / labels.len() as f64
}

/// Index of the largest value. Ties go to the lowest index; `None` for an empty slice.
///
/// A NaN compares greater than everything, so the first NaN wins.
pub fn argmax(values: &[f64]) -> Option<usize> {
    if let Some(i) = values.iter().position(|v| v.is_nan()) {
        return Some(i);
    }
    let (first, rest) = values.split_first()?;
    let mut best = (0, *first);
    for (i, &v) in rest.iter().enumerate() {
        if v > best.1 {
            best = (i + 1, v);
        }
    }
    Some(best.0)
}
