//! LBox Open evaluation runner
//!
//! Scores the legal judgment prediction tasks from precomputed
//! log-likelihoods and prints a results table.
//!
//! # Usage
//!
//! ```bash
//! # Evaluate two tasks against a score file
//! cargo run --bin eval_runner -- \
//!   --tasks legal_binary,ljp_civil \
//!   --data-dir ./data \
//!   --scores ./scores.jsonl
//!
//! # Five-shot on a subset, JSON output
//! cargo run --bin eval_runner -- \
//!   --tasks ljp_criminal \
//!   --data-dir ./data \
//!   --scores ./scores.jsonl \
//!   --num-fewshot 5 \
//!   --limit 100 \
//!   --format json
//!
//! # Smoke test the pipeline without scores
//! cargo run --bin eval_runner -- --data-dir ./data --mock
//!
//! # List registered tasks
//! cargo run --bin eval_runner -- --list-tasks
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, bail};
use clap::{Parser, ValueEnum};
use eval_harness::backends::{MockBackend, ScoreFileBackend};
use eval_harness::{EvalConfig, Evaluator, LoglikelihoodBackend};
use lbox_datasets::{DatasetConfig, load_tasks, task_config, task_names};
use tracing_subscriber::EnvFilter;

/// Report output formats.
#[derive(Debug, Clone, Copy, ValueEnum)]
enum ReportFormat {
    /// Markdown table
    Markdown,
    /// JSON format
    Json,
}

/// Evaluate Korean legal judgment prediction tasks from log-likelihood scores
#[derive(Parser, Debug)]
#[command(name = "eval_runner")]
struct Args {
    /// Tasks to evaluate, comma separated (defaults to every registered task)
    #[arg(long, value_delimiter = ',')]
    tasks: Vec<String>,

    /// Directory holding one sub-directory of JSONL splits per dataset
    #[arg(long, default_value = "./data")]
    data_dir: PathBuf,

    /// JSONL file of precomputed log-likelihoods
    #[arg(long)]
    scores: Option<PathBuf>,

    /// Number of labelled examples prepended to each prompt
    #[arg(long, default_value = "0")]
    num_fewshot: usize,

    /// Maximum number of documents per task (for testing)
    #[arg(long)]
    limit: Option<usize>,

    /// Seed for document order, few-shot sampling and bootstrap
    #[arg(long, default_value = "42")]
    seed: u64,

    /// Bootstrap iterations for the macro-F1 standard error
    #[arg(long, default_value = "1000")]
    bootstrap_iters: usize,

    /// Text placed before the few-shot examples
    #[arg(long)]
    description: Option<String>,

    /// Output directory for results
    #[arg(long, default_value = "./results")]
    output: PathBuf,

    /// Format of the report printed to stdout
    #[arg(long, value_enum, default_value = "markdown")]
    format: ReportFormat,

    /// Also write per-document samples
    #[arg(long)]
    write_samples: bool,

    /// Use mock backend for testing (scores every continuation the same)
    #[arg(long)]
    mock: bool,

    /// List registered tasks and exit
    #[arg(long)]
    list_tasks: bool,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

impl Args {
    fn eval_config(&self) -> EvalConfig {
        let mut config = EvalConfig::new("lbox")
            .output_dir(&self.output)
            .num_fewshot(self.num_fewshot)
            .seed(self.seed)
            .bootstrap_iters(self.bootstrap_iters)
            .write_samples(self.write_samples);
        if let Some(limit) = self.limit {
            config = config.limit(limit);
        }
        if let Some(description) = &self.description {
            config = config.description(description);
        }
        config
    }

    fn task_list(&self) -> Vec<String> {
        if self.tasks.is_empty() {
            task_names().into_iter().map(String::from).collect()
        } else {
            self.tasks.clone()
        }
    }
}

fn create_backend(args: &Args) -> anyhow::Result<Arc<dyn LoglikelihoodBackend>> {
    if args.mock {
        tracing::info!("Using mock backend for testing");
        return Ok(Arc::new(MockBackend::new()));
    }
    let Some(path) = &args.scores else {
        bail!("--scores is required unless --mock is given");
    };
    let backend = ScoreFileBackend::from_path(path)
        .with_context(|| format!("loading scores from {}", path.display()))?;
    tracing::info!(scores = backend.len(), path = %path.display(), "Using score file backend");
    Ok(Arc::new(backend))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let default_level = if args.verbose { "debug" } else { "info" };
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    if args.list_tasks {
        for name in task_names() {
            if let Some(config) = task_config(name) {
                println!(
                    "{name}\t{}/{}\t{} labels",
                    config.dataset_path,
                    config.dataset_name,
                    config.labels.len()
                );
            }
        }
        return Ok(());
    }

    let backend = create_backend(&args)?;
    let task_list = args.task_list();
    tracing::info!(tasks = ?task_list, data_dir = %args.data_dir.display(), "Loading tasks");

    let tasks = load_tasks(&task_list, &DatasetConfig::new(&args.data_dir))
        .await
        .context("loading tasks")?;

    let evaluator = Evaluator::new(args.eval_config(), backend);
    let start = std::time::Instant::now();
    let report = evaluator.evaluate_all(&tasks).await?;
    let duration_secs = start.elapsed().as_secs_f64();
    tracing::info!(duration_secs, "Evaluation complete");

    match args.format {
        ReportFormat::Markdown => println!("{}", report.to_markdown()),
        ReportFormat::Json => println!("{}", report.to_json()?),
    }

    std::fs::create_dir_all(&args.output)?;
    let results_path = args.output.join("results.json");
    report.save(&results_path)?;
    tracing::info!(path = %results_path.display(), "Results saved");

    Ok(())
}
