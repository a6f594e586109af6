//! Task registry: names to loaded, ready-to-evaluate tasks.

use eval_harness::{Error, EvalTask, Result};
use tracing::info;

use crate::dataset::{DatasetConfig, JsonlDatasetLoader};
use crate::lbox::{ALL_TASKS, CaseClassificationTask, TaskConfig};

/// Names of every registered task.
pub fn task_names() -> Vec<&'static str> {
    ALL_TASKS.iter().map(|c| c.name).collect()
}

/// Configuration of a registered task.
pub fn task_config(name: &str) -> Option<&'static TaskConfig> {
    ALL_TASKS.iter().copied().find(|c| c.name == name)
}

/// Load a task's dataset from `config.data_dir` and build the task.
pub async fn load_task(name: &str, config: &DatasetConfig) -> Result<Box<dyn EvalTask>> {
    let Some(task_config) = task_config(name) else {
        return Err(Error::TaskNotFound(name.to_string()));
    };

    let dataset = JsonlDatasetLoader::new(config.clone())
        .load(task_config.dataset_name)
        .await?;
    info!(
        task = name,
        dataset = task_config.dataset_name,
        "Task ready"
    );

    Ok(Box::new(CaseClassificationTask::new(task_config, dataset)))
}

/// Load several tasks, failing on the first unknown name or missing dataset.
pub async fn load_tasks(
    names: &[String],
    config: &DatasetConfig,
) -> Result<Vec<Box<dyn EvalTask>>> {
    let mut tasks = Vec::with_capacity(names.len());
    for name in names {
        tasks.push(load_task(name, config).await?);
    }
    Ok(tasks)
}
