//! Local dataset loading.
//!
//! A dataset lives in `<data_dir>/<dataset_name>/` with one file per split:
//! `train.jsonl`, `valid.jsonl`, `test.jsonl`, ... A `.json` file holding an
//! array of records is accepted when no `.jsonl` file exists for that split.

use std::fs;
use std::path::{Path, PathBuf};

use eval_harness::{DatasetDict, RawRecord};
use rand::SeedableRng;
use rand::seq::SliceRandom;
use tracing::{debug, info};

use crate::error::{Error, Result};

/// Configuration for dataset loading.
#[derive(Debug, Clone)]
pub struct DatasetConfig {
    /// Root directory holding one sub-directory per dataset.
    pub data_dir: PathBuf,
    /// Shuffle every split after loading.
    pub shuffle: bool,
    /// Shuffle seed.
    pub seed: Option<u64>,
}

impl DatasetConfig {
    /// Create a config rooted at `data_dir`.
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            shuffle: false,
            seed: None,
        }
    }

    /// Shuffle splits with the given seed.
    pub fn with_shuffle(mut self, seed: u64) -> Self {
        self.shuffle = true;
        self.seed = Some(seed);
        self
    }
}

/// Loads dataset splits from JSONL files.
pub struct JsonlDatasetLoader {
    config: DatasetConfig,
}

impl JsonlDatasetLoader {
    /// Create a new loader.
    pub fn new(config: DatasetConfig) -> Self {
        Self { config }
    }

    /// Create with just a path.
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        Self::new(DatasetConfig::new(path))
    }

    /// Load every split found for `dataset_name`.
    pub async fn load(&self, dataset_name: &str) -> Result<DatasetDict> {
        let dir = self.config.data_dir.join(dataset_name);
        if !dir.is_dir() {
            return Err(Error::NotFound(format!(
                "dataset directory not found: {}",
                dir.display()
            )));
        }

        let mut files: Vec<PathBuf> = fs::read_dir(&dir)?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|p| p.is_file() && split_file_kind(p).is_some())
            .collect();
        files.sort();

        let mut dataset = DatasetDict::new();
        for path in &files {
            let Some(split) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            if split_file_kind(path) == Some(SplitFile::Json)
                && path.with_extension("jsonl").is_file()
            {
                debug!(path = %path.display(), "Skipping .json split shadowed by .jsonl");
                continue;
            }

            let mut records = load_split_file(path)?;
            if self.config.shuffle {
                let seed = self.config.seed.unwrap_or(42);
                let mut rng = rand::rngs::StdRng::seed_from_u64(seed);
                records.shuffle(&mut rng);
            }

            debug!(split, records = records.len(), "Loaded split");
            dataset.insert_split(split, records);
        }

        if dataset.split_names().next().is_none() {
            return Err(Error::NotFound(format!(
                "no .jsonl or .json splits in {}",
                dir.display()
            )));
        }

        info!(
            dataset = dataset_name,
            splits = ?dataset.split_names().collect::<Vec<_>>(),
            "Loaded dataset"
        );
        Ok(dataset)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SplitFile {
    Jsonl,
    Json,
}

fn split_file_kind(path: &Path) -> Option<SplitFile> {
    match path.extension()?.to_str()? {
        "jsonl" => Some(SplitFile::Jsonl),
        "json" => Some(SplitFile::Json),
        _ => None,
    }
}

fn load_split_file(path: &Path) -> Result<Vec<RawRecord>> {
    let content = fs::read_to_string(path)?;

    match split_file_kind(path) {
        Some(SplitFile::Json) => {
            let records: Vec<RawRecord> = serde_json::from_str(&content)?;
            Ok(records)
        }
        _ => {
            let mut records = Vec::new();
            for (line_num, line) in content.lines().enumerate() {
                if line.trim().is_empty() {
                    continue;
                }
                let record: RawRecord = serde_json::from_str(line).map_err(|e| {
                    Error::InvalidFormat(format!("{}:{}: {}", path.display(), line_num + 1, e))
                })?;
                records.push(record);
            }
            Ok(records)
        }
    }
}
