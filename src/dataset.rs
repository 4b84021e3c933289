//! Dataset input and prediction log output
//!
//! Issues are read from a JSON array (SWE-bench export format); results are
//! appended to a JSONL prediction log, one record per issue.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

/// One issue from the dataset. Unknown fields are ignored so richer
/// SWE-bench exports load unchanged.
#[derive(Debug, Clone, Deserialize)]
pub struct IssueRecord {
    /// Repository identifier, `owner/repo`.
    pub repo: String,
    /// e.g. `pallets__flask-4045`; the issue number is the trailing
    /// dash-separated component.
    pub instance_id: String,
    /// Commit SHA the snapshot is materialized at.
    pub base_commit: String,
    /// Gold reference patch; only its diff header is read (oracle path).
    #[serde(default)]
    pub patch: String,
}

impl IssueRecord {
    /// The issue number encoded in the instance id, or `None` when the
    /// trailing component is not numeric.
    pub fn issue_number(&self) -> Option<&str> {
        let tail = self.instance_id.rsplit('-').next()?;
        if !tail.is_empty() && tail.bytes().all(|b| b.is_ascii_digit()) {
            Some(tail)
        } else {
            None
        }
    }
}

/// One line of the prediction log.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PatchResult {
    pub instance_id: String,
    pub model_patch: String,
    pub model_name_or_path: String,
}

/// Load the dataset file as-is, without modification.
pub fn load_dataset(path: &Path) -> Result<Vec<IssueRecord>> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Dataset file {} not found", path.display()))?;
    let records: Vec<IssueRecord> = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse dataset {}", path.display()))?;
    Ok(records)
}

/// Append-only JSONL prediction log. Created (truncated) once at batch
/// start; every record afterwards is a single appended line.
#[derive(Debug)]
pub struct OutputLog {
    path: PathBuf,
}

impl OutputLog {
    /// Truncate (or create) the log, ready for a fresh batch.
    pub fn create(path: &Path) -> Result<Self> {
        fs::write(path, "")
            .with_context(|| format!("Failed to create output log {}", path.display()))?;
        Ok(OutputLog {
            path: path.to_path_buf(),
        })
    }

    /// Append one record as a single JSON line.
    pub fn append(&self, result: &PatchResult) -> Result<()> {
        let mut line = serde_json::to_string(result)?;
        line.push('\n');
        let mut file = OpenOptions::new()
            .append(true)
            .create(true)
            .open(&self.path)?;
        file.write_all(line.as_bytes())?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_dataset_ignores_extra_fields() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dataset.json");
        fs::write(
            &path,
            r#"[{"repo": "pallets/flask", "instance_id": "pallets__flask-4045",
                "base_commit": "abc123", "patch": "diff --git a/x b/x",
                "problem_statement": "ignored", "hints_text": ""}]"#,
        )
        .unwrap();

        let records = load_dataset(&path).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].repo, "pallets/flask");
        assert_eq!(records[0].issue_number(), Some("4045"));
    }

    #[test]
    fn test_missing_dataset_is_an_error() {
        assert!(load_dataset(Path::new("/no/such/dataset.json")).is_err());
    }

    #[test]
    fn test_issue_number_rejects_non_numeric_tail() {
        let record = IssueRecord {
            repo: "a/b".to_string(),
            instance_id: "weird-id".to_string(),
            base_commit: "c".to_string(),
            patch: String::new(),
        };
        assert_eq!(record.issue_number(), None);
    }

    #[test]
    fn test_output_log_truncates_then_appends() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("patches.jsonl");
        fs::write(&path, "stale contents\n").unwrap();

        let log = OutputLog::create(&path).unwrap();
        for id in ["one", "two"] {
            log.append(&PatchResult {
                instance_id: id.to_string(),
                model_patch: String::new(),
                model_name_or_path: "patchwright".to_string(),
            })
            .unwrap();
        }

        let content = fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 2, "stale contents should be gone");
        let first: PatchResult = serde_json::from_str(lines[0]).unwrap();
        assert_eq!(first.instance_id, "one");
    }
}
