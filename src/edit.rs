//! Edit convergence loop
//!
//! Drives the developer and error-fixer agents over a single target file.
//! The developer applies the initial change; every following round runs the
//! syntax check, and while it fails the fixer gets one corrective edit per
//! round, up to a fixed number of rounds. The pre-edit content is kept as a
//! sibling backup so the caller can diff before against after.

use crate::llm::{prompts, Generator, Model};
use crate::syntax::check_python_file;
use crate::tools::{FileTools, ToolAction};
use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// How an edit session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConvergenceOutcome {
    /// The file parses; `rounds` fix rounds were spent getting there.
    Converged { rounds: usize },
    /// The fix budget ran out with the file still broken.
    StillBroken { rounds: usize },
}

impl ConvergenceOutcome {
    pub fn converged(&self) -> bool {
        matches!(self, ConvergenceOutcome::Converged { .. })
    }
}

/// One editing pass over one file.
pub struct EditSession {
    target: PathBuf,
    backup_path: PathBuf,
    max_iterations: usize,
    round_delay: Duration,
}

impl EditSession {
    /// Snapshot the file's current content next to it, then hand back a
    /// session ready to run.
    pub fn begin(target: &Path, max_iterations: usize, round_delay: Duration) -> Result<Self> {
        let mut backup_name = target.as_os_str().to_owned();
        backup_name.push(".bak");
        let backup_path = PathBuf::from(backup_name);
        fs::copy(target, &backup_path)
            .with_context(|| format!("Failed to back up {}", target.display()))?;
        Ok(EditSession {
            target: target.to_path_buf(),
            backup_path,
            max_iterations,
            round_delay,
        })
    }

    pub fn backup_path(&self) -> &Path {
        &self.backup_path
    }

    /// Run the developer once, then fix rounds until the file parses or
    /// the budget is exhausted. A failed or timed-out generation call
    /// forfeits only that round; the loop carries on and the diff captures
    /// whatever state the file is in.
    pub async fn run<G: Generator + Sync>(
        &self,
        generator: &G,
        issue_title: &str,
        issue_body: &str,
    ) -> Result<ConvergenceOutcome> {
        let mut tools = FileTools::open(&self.target)?;

        let task = prompts::developer_task(issue_title, issue_body, &tools.view()?);
        match generator
            .generate(Model::Smart, prompts::DEVELOPER_SYSTEM, &task)
            .await
        {
            Ok(response) => apply_actions(&mut tools, &response),
            Err(e) => eprintln!("  Developer call failed: {e}"),
        }

        for round in 0..self.max_iterations {
            let report = check_python_file(&self.target);
            eprintln!("  {}", report.message);
            if report.ok {
                return Ok(ConvergenceOutcome::Converged { rounds: round });
            }

            tokio::time::sleep(self.round_delay).await;

            let task = prompts::error_fixer_task(&report.message, &tools.view()?);
            match generator
                .generate(Model::Smart, prompts::ERROR_FIXER_SYSTEM, &task)
                .await
            {
                Ok(response) => apply_first_edit(&tools, &response),
                Err(e) => eprintln!("  Fixer call failed: {e}"),
            }
        }

        let report = check_python_file(&self.target);
        eprintln!("  {}", report.message);
        if report.ok {
            return Ok(ConvergenceOutcome::Converged {
                rounds: self.max_iterations,
            });
        }
        Ok(ConvergenceOutcome::StillBroken {
            rounds: self.max_iterations,
        })
    }
}

/// Apply every action the developer returned, in order. Unparseable
/// responses simply produce no actions.
fn apply_actions(tools: &mut FileTools, response: &str) {
    let actions = crate::tools::parse_actions(response);
    if actions.is_empty() {
        eprintln!("  Developer response contained no actions");
    }
    for action in actions {
        match action {
            ToolAction::Scroll { direction, lines } => tools.scroll(direction, lines),
            ToolAction::EditFile {
                start_line,
                end_line,
                text,
            } => {
                if let Err(e) = tools.edit_file(start_line, end_line, &text) {
                    eprintln!("  Edit failed: {e}");
                }
            }
        }
    }
}

/// The fixer gets exactly one edit per round; anything past the first
/// edit_file action is ignored.
fn apply_first_edit(tools: &FileTools, response: &str) {
    let edit = crate::tools::parse_actions(response)
        .into_iter()
        .find(|a| matches!(a, ToolAction::EditFile { .. }));
    match edit {
        Some(ToolAction::EditFile {
            start_line,
            end_line,
            text,
        }) => {
            if let Err(e) = tools.edit_file(start_line, end_line, &text) {
                eprintln!("  Fix edit failed: {e}");
            }
        }
        _ => eprintln!("  Fixer response contained no edit"),
    }
}
