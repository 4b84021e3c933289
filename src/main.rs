//! patchwright - turn repository issues into candidate patches
//!
//! Reads a SWE-bench-style dataset, and for each issue clones the
//! repository at its base commit, picks the file the issue is about, lets
//! an external model edit it under a syntax-check loop, and records the
//! resulting unified diff in a JSONL prediction log.

use anyhow::{bail, Context, Result};
use clap::Parser;
use patchwright::config::Config;
use patchwright::dataset::{load_dataset, OutputLog};
use patchwright::llm::LlmClient;
use patchwright::orchestrator::Orchestrator;
use patchwright::repo::validate_repo_ident;
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Parser)]
#[command(
    name = "patchwright",
    about = "Generate candidate patches for repository issues",
    version
)]
struct Args {
    /// Dataset file (JSON array of issue records)
    dataset: PathBuf,

    /// Prediction log to write (truncated at start)
    #[arg(short, long, default_value = "patches.jsonl")]
    output: PathBuf,

    /// Only process these instance ids
    #[arg(long)]
    instances: Vec<String>,

    /// Ignore reference patches and always run file selection
    #[arg(long)]
    no_oracle: bool,

    /// Directory for repository snapshots
    #[arg(long)]
    work_dir: Option<PathBuf>,

    /// Override the model_name_or_path recorded in the prediction log
    #[arg(long)]
    generator_id: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let mut config = Config::load();
    if let Some(generator_id) = args.generator_id {
        config.generator_id = generator_id;
    }

    let Some(api_key) = Config::openrouter_api_key() else {
        bail!("OPENROUTER_API_KEY is not set");
    };
    let Some(github_token) = Config::github_token() else {
        bail!("GITHUB_TOKEN is not set");
    };

    let mut records = load_dataset(&args.dataset)?;
    if !args.instances.is_empty() {
        records.retain(|r| args.instances.contains(&r.instance_id));
        if records.is_empty() {
            bail!("No dataset records match the requested instance ids");
        }
    }

    // Reject malformed records up front; a bad dataset is a configuration
    // problem, not a per-issue failure.
    for record in &records {
        validate_repo_ident(&record.repo)
            .with_context(|| format!("Record {}", record.instance_id))?;
        if record.issue_number().is_none() {
            bail!(
                "Record {} has no trailing issue number in its instance id",
                record.instance_id
            );
        }
    }

    let work_dir = args
        .work_dir
        .unwrap_or_else(|| std::env::temp_dir().join("patchwright"));
    fs::create_dir_all(&work_dir)
        .with_context(|| format!("Failed to create work dir {}", work_dir.display()))?;

    let timeout = Duration::from_secs(config.request_timeout_secs);
    let generator = LlmClient::new(api_key, timeout)?;
    let http = reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .context("Failed to create HTTP client")?;

    let log = OutputLog::create(&args.output)?;
    let orchestrator = Orchestrator::new(generator, http, github_token, config, work_dir);

    eprintln!("Running {} issue(s)", records.len());
    let mut empty = 0usize;
    for record in &records {
        let result = orchestrator.run_issue(record, !args.no_oracle).await;
        if result.model_patch.is_empty() {
            empty += 1;
        }
        log.append(&result)?;
    }

    eprintln!(
        "Done: {} issue(s), {} with patches, {} empty -> {}",
        records.len(),
        records.len() - empty,
        empty,
        args.output.display()
    );
    Ok(())
}
