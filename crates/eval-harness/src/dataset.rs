//! Named dataset splits as handed to tasks.

use std::collections::BTreeMap;

use crate::error::{Error, Result};

/// A raw dataset record, exactly as read from the source.
pub type RawRecord = serde_json::Value;

/// Dataset splits keyed by name (`train`, `valid`, `validation`, `test`, ...).
#[derive(Debug, Clone, Default)]
pub struct DatasetDict {
    splits: BTreeMap<String, Vec<RawRecord>>,
}

impl DatasetDict {
    /// Create an empty dataset.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a split.
    pub fn with_split(mut self, name: impl Into<String>, records: Vec<RawRecord>) -> Self {
        self.insert_split(name, records);
        self
    }

    /// Insert or replace a split.
    pub fn insert_split(&mut self, name: impl Into<String>, records: Vec<RawRecord>) {
        self.splits.insert(name.into(), records);
    }

    /// Records of a split. Asking for a split the dataset does not have is an error.
    pub fn split(&self, name: &str) -> Result<&[RawRecord]> {
        self.splits
            .get(name)
            .map(Vec::as_slice)
            .ok_or_else(|| Error::MissingSplit(name.to_string()))
    }

    pub fn split_names(&self) -> impl Iterator<Item = &str> {
        self.splits.keys().map(String::as_str)
    }
}
