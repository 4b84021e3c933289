//! Per-issue pipeline orchestration
//!
//! One issue in, one patch record out, always. Any failure inside the
//! pipeline is reported and collapsed into an empty patch so a batch run
//! never stops on a bad record.

use crate::config::Config;
use crate::dataset::{IssueRecord, PatchResult};
use crate::diff::build_patch;
use crate::edit::EditSession;
use crate::llm::Generator;
use crate::repo;
use crate::select::FileSelection;
use anyhow::{bail, Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub struct Orchestrator<G> {
    generator: G,
    http: reqwest::Client,
    github_token: String,
    config: Config,
    work_dir: PathBuf,
}

impl<G: Generator + Sync> Orchestrator<G> {
    pub fn new(
        generator: G,
        http: reqwest::Client,
        github_token: String,
        config: Config,
        work_dir: PathBuf,
    ) -> Self {
        Orchestrator {
            generator,
            http,
            github_token,
            config,
            work_dir,
        }
    }

    /// Process one record. Never fails: pipeline errors become an empty
    /// patch for this instance.
    pub async fn run_issue(&self, record: &IssueRecord, use_oracle: bool) -> PatchResult {
        eprintln!("Processing {}", record.instance_id);
        let model_patch = match self.process(record, use_oracle).await {
            Ok(patch) => patch,
            Err(e) => {
                eprintln!("  {}: {e:#}", record.instance_id);
                String::new()
            }
        };
        PatchResult {
            instance_id: record.instance_id.clone(),
            model_patch,
            model_name_or_path: self.config.generator_id.clone(),
        }
    }

    async fn process(&self, record: &IssueRecord, use_oracle: bool) -> Result<String> {
        let Some(issue_number) = record.issue_number() else {
            bail!("Instance id has no trailing issue number");
        };

        let snapshot = self.work_dir.join(&record.instance_id);
        let issue = repo::acquire(
            &self.http,
            &self.github_token,
            &record.repo,
            issue_number,
            &record.base_commit,
            &snapshot,
        )
        .await?;

        let result = self.resolve_and_patch(record, &issue, use_oracle).await;
        repo::remove_snapshot(&issue.snapshot);
        result
    }

    async fn resolve_and_patch(
        &self,
        record: &IssueRecord,
        issue: &repo::AcquiredIssue,
        use_oracle: bool,
    ) -> Result<String> {
        let selection = if use_oracle && !record.patch.is_empty() {
            FileSelection::Oracle(record.patch.clone())
        } else {
            FileSelection::MapReduce
        };

        let Some(target) = selection
            .resolve(
                &self.generator,
                &issue.snapshot,
                &issue.title,
                &issue.body,
                self.config.chunk_token_limit,
                self.config.chars_per_token,
            )
            .await?
        else {
            eprintln!("  No target file selected; recording empty patch");
            return Ok(String::new());
        };
        if !target.is_file() {
            eprintln!(
                "  Selected file {} does not exist; recording empty patch",
                target.display()
            );
            return Ok(String::new());
        }
        eprintln!("  Editing {}", target.display());

        let session = EditSession::begin(
            &target,
            self.config.max_fix_iterations,
            Duration::from_secs(self.config.fix_round_delay_secs),
        )?;
        let before = fs::read_to_string(session.backup_path())
            .context("Failed to read pre-edit backup")?;

        let outcome = session.run(&self.generator, &issue.title, &issue.body).await?;
        if !outcome.converged() {
            eprintln!("  File still fails the syntax check; emitting the diff anyway");
        }

        let after = fs::read_to_string(&target).context("Failed to read edited file")?;
        let rel = relative_to_snapshot(&target, &issue.snapshot)?;
        Ok(build_patch(&before, &after, &rel))
    }
}

fn relative_to_snapshot(target: &Path, snapshot: &Path) -> Result<String> {
    let rel = target
        .strip_prefix(snapshot)
        .with_context(|| format!("{} is outside the snapshot", target.display()))?;
    Ok(rel.to_string_lossy().into_owned())
}
