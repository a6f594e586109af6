//! LBox Open legal judgment prediction tasks.
//!
//! Adapters plugging Korean court-ruling classification into `eval-harness`:
//! - `legal_binary`: civil vs criminal case type
//! - `ljp_civil`: civil case name (4 classes)
//! - `ljp_criminal`: criminal case name (7 classes)
//!
//! Datasets are read from a local directory with one sub-directory per
//! dataset configuration and one JSONL file per split.

mod dataset;
mod error;
pub mod lbox;
mod registry;

pub use dataset::{DatasetConfig, JsonlDatasetLoader};
pub use error::{Error, Result};
pub use lbox::{CaseClassificationTask, CaseDocument, TaskConfig};
pub use registry::{load_task, load_tasks, task_config, task_names};
