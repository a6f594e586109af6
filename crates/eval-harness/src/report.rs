//! Evaluation reports and their table renderings.

use std::fmt::Write as _;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::evaluator::EvalConfig;

/// Aggregated value of one metric on one task.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricReport {
    pub name: String,
    pub value: f64,
    /// Standard error; absent when fewer than two documents were scored.
    pub stderr: Option<f64>,
    pub higher_is_better: bool,
}

/// Results of one task.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskReport {
    pub task: String,
    pub version: u32,
    pub dataset_path: String,
    pub dataset_name: Option<String>,
    pub num_docs: usize,
    pub num_fewshot: usize,
    pub metrics: Vec<MetricReport>,
}

impl TaskReport {
    /// Look up a metric by name.
    pub fn metric(&self, name: &str) -> Option<&MetricReport> {
        self.metrics.iter().find(|m| m.name == name)
    }
}

/// Results of a whole run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvalReport {
    pub config: EvalConfig,
    pub backend: String,
    pub tasks: Vec<TaskReport>,
}

impl EvalReport {
    /// Create an empty report.
    pub fn new(config: EvalConfig, backend: impl Into<String>) -> Self {
        Self {
            config,
            backend: backend.into(),
            tasks: Vec::new(),
        }
    }

    /// Render as a markdown table, one row per (task, metric).
    pub fn to_markdown(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(
            out,
            "backend: {}, num_fewshot: {}, limit: {}",
            self.backend,
            self.config.num_fewshot,
            self.config
                .limit
                .map_or_else(|| "None".to_string(), |l| l.to_string())
        );
        out.push_str("| Task | Version | Metric | Value |   | Stderr |\n");
        out.push_str("|------|--------:|--------|------:|---|-------:|\n");

        for task in &self.tasks {
            for (i, metric) in task.metrics.iter().enumerate() {
                let (name, version) = if i == 0 {
                    (task.task.as_str(), task.version.to_string())
                } else {
                    ("", String::new())
                };
                let arrow = if metric.higher_is_better { "↑" } else { "↓" };
                let stderr = metric
                    .stderr
                    .map_or_else(|| "N/A".to_string(), |s| format!("{s:.4}"));
                let _ = writeln!(
                    out,
                    "| {name} | {version} | {} {arrow} | {:.4} | ± | {stderr} |",
                    metric.name, metric.value
                );
            }
        }
        out
    }

    /// Render as pretty-printed JSON.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Write the JSON rendering to `path`.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        fs::write(path, self.to_json()?)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_report() -> EvalReport {
        let mut report = EvalReport::new(EvalConfig::new("lbox"), "mock");
        report.tasks.push(TaskReport {
            task: "ljp_civil".into(),
            version: 0,
            dataset_path: "lbox/lbox_open".into(),
            dataset_name: Some("ljp_civil".into()),
            num_docs: 4,
            num_fewshot: 0,
            metrics: vec![
                MetricReport {
                    name: "acc".into(),
                    value: 0.75,
                    stderr: Some(0.25),
                    higher_is_better: true,
                },
                MetricReport {
                    name: "macro_f1".into(),
                    value: 0.5,
                    stderr: None,
                    higher_is_better: true,
                },
            ],
        });
        report
    }

    #[test]
    fn test_markdown() {
        let table = sample_report().to_markdown();
        let lines: Vec<&str> = table.lines().collect();

        assert_eq!(lines[0], "backend: mock, num_fewshot: 0, limit: None");
        assert_eq!(lines[3], "| ljp_civil | 0 | acc ↑ | 0.7500 | ± | 0.2500 |");
        assert_eq!(lines[4], "|  |  | macro_f1 ↑ | 0.5000 | ± | N/A |");
    }

    #[test]
    fn test_save_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.json");
        sample_report().save(&path).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        let saved: EvalReport = serde_json::from_str(&content).unwrap();
        assert_eq!(saved.tasks[0].metric("acc").unwrap().value, 0.75);
        assert_eq!(saved.config.name, "lbox");
    }
}
