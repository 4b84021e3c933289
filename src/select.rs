//! File selection
//!
//! Decides which file in a repository snapshot an issue is about. Two
//! strategies: an oracle mode that reads the path straight out of a known
//! good patch, and a map-reduce mode that scans the directory listing in
//! token-bounded chunks with a fast model, then asks a second pass to pick
//! one path from the aggregated candidates.

use crate::chunk::split_directory_tree;
use crate::extract::{extract_paths, path_from_patch};
use crate::llm::{prompts, Generator, Model};
use anyhow::Result;
use std::path::{Path, PathBuf};

/// How the target file for an issue is determined.
#[derive(Debug, Clone)]
pub enum FileSelection {
    /// Read the path from a reference patch.
    Oracle(String),
    /// Scan the snapshot's file tree with the map-reduce pipeline.
    MapReduce,
}

impl FileSelection {
    /// Resolve the selection against a snapshot. An oracle patch without a
    /// usable diff header falls back to the tree scan. Returns `None` when
    /// no file could be identified; the caller records an empty patch.
    pub async fn resolve<G: Generator + Sync>(
        &self,
        generator: &G,
        snapshot: &Path,
        issue_title: &str,
        issue_body: &str,
        token_limit: usize,
        chars_per_token: f64,
    ) -> Result<Option<PathBuf>> {
        if let FileSelection::Oracle(patch) = self {
            if let Some(target) = resolve_oracle(snapshot, patch) {
                return Ok(Some(target));
            }
            eprintln!("  Reference patch has no diff header; scanning the tree instead");
        }
        select_file(
            generator,
            snapshot,
            issue_title,
            issue_body,
            token_limit,
            chars_per_token,
        )
        .await
    }
}

/// Pull the first changed path out of a reference patch and anchor it in
/// the snapshot.
fn resolve_oracle(snapshot: &Path, patch: &str) -> Option<PathBuf> {
    let rel = path_from_patch(patch)?;
    Some(snapshot.join(rel.trim_start_matches('/')))
}

/// Map-reduce selection over the snapshot's Python files.
///
/// Map: every chunk of the directory listing goes to the fast model
/// concurrently, in listing order. A failed call contributes an empty
/// answer rather than aborting the scan. Reduce: the concatenated answers
/// are handed to a second pass that must copy one path verbatim.
pub async fn select_file<G: Generator + Sync>(
    generator: &G,
    snapshot: &Path,
    issue_title: &str,
    issue_body: &str,
    token_limit: usize,
    chars_per_token: f64,
) -> Result<Option<PathBuf>> {
    let chunks = split_directory_tree(snapshot, token_limit, chars_per_token, None);
    if chunks.is_empty() {
        eprintln!("  No candidate files found in snapshot");
        return Ok(None);
    }
    eprintln!("  Scanning file tree in {} chunk(s)", chunks.len());

    let calls = chunks.iter().map(|tree| async move {
        let task = prompts::file_selector_task(issue_title, issue_body, tree);
        match generator
            .generate(Model::Fast, prompts::FILE_SELECTOR_SYSTEM, &task)
            .await
        {
            Ok(answer) => answer,
            Err(e) => {
                eprintln!("  File selector call failed: {e}");
                String::new()
            }
        }
    });
    let answers = futures::future::join_all(calls).await;
    let aggregated = answers.join("\n");

    let filter_task = prompts::file_filter_task(issue_title, issue_body, &aggregated);
    let verdict = generator
        .generate(Model::Fast, prompts::FILE_FILTER_SYSTEM, &filter_task)
        .await?;

    let Some(path) = extract_paths(&verdict).into_iter().next() else {
        eprintln!("  Filter pass produced no usable path");
        return Ok(None);
    };
    Ok(Some(anchor_in_snapshot(snapshot, &path)))
}

/// The scan shows the model absolute paths, so a verdict normally echoes
/// one back; anything else is re-rooted under the snapshot.
fn anchor_in_snapshot(snapshot: &Path, path: &str) -> PathBuf {
    let candidate = PathBuf::from(path);
    if candidate.starts_with(snapshot) {
        candidate
    } else {
        snapshot.join(path.trim_start_matches('/'))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;
    use std::fs;
    use std::sync::Mutex;

    /// Hands out canned responses in call order.
    struct ScriptedGenerator {
        responses: Mutex<Vec<Result<String>>>,
    }

    impl ScriptedGenerator {
        fn new(responses: Vec<Result<String>>) -> Self {
            ScriptedGenerator {
                responses: Mutex::new(responses),
            }
        }
    }

    impl Generator for ScriptedGenerator {
        async fn generate(&self, _model: Model, _system: &str, _user: &str) -> Result<String> {
            let mut responses = self.responses.lock().unwrap();
            if responses.is_empty() {
                return Err(anyhow!("no scripted response left"));
            }
            responses.remove(0)
        }
    }

    #[test]
    fn test_oracle_anchors_patch_path_in_snapshot() {
        let patch = "diff --git a/pkg/mod.py b/pkg/mod.py\n--- a/pkg/mod.py\n+++ b/pkg/mod.py\n";
        let resolved = resolve_oracle(Path::new("/tmp/snap"), patch).unwrap();
        assert_eq!(resolved, PathBuf::from("/tmp/snap/pkg/mod.py"));
    }

    #[test]
    fn test_anchor_accepts_absolute_snapshot_path() {
        let snap = Path::new("/tmp/snap");
        assert_eq!(
            anchor_in_snapshot(snap, "/tmp/snap/pkg/mod.py"),
            PathBuf::from("/tmp/snap/pkg/mod.py")
        );
        assert_eq!(
            anchor_in_snapshot(snap, "/pkg/mod.py"),
            PathBuf::from("/tmp/snap/pkg/mod.py")
        );
    }

    #[test]
    fn test_oracle_without_diff_header_is_none() {
        assert!(resolve_oracle(Path::new("/tmp/snap"), "not a patch").is_none());
    }

    #[tokio::test]
    async fn test_oracle_without_header_falls_back_to_scan() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("a.py"), "x = 1\n").unwrap();

        let generator = ScriptedGenerator::new(vec![
            Ok("- Path: /a.py".to_string()),
            Ok("- Path: /a.py".to_string()),
        ]);
        let picked = FileSelection::Oracle("not a usable patch".to_string())
            .resolve(&generator, dir.path(), "t", "b", 512, 4.0)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(picked, dir.path().join("a.py"));
    }

    #[tokio::test]
    async fn test_empty_snapshot_skips_llm_entirely() {
        let dir = tempfile::tempdir().unwrap();
        let generator = ScriptedGenerator::new(vec![]);
        let picked = select_file(&generator, dir.path(), "t", "b", 512, 4.0)
            .await
            .unwrap();
        assert!(picked.is_none());
    }

    #[tokio::test]
    async fn test_map_reduce_picks_filtered_path() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("good.py"), "x = 1\n").unwrap();
        fs::write(dir.path().join("other.py"), "y = 2\n").unwrap();

        let generator = ScriptedGenerator::new(vec![
            Ok("- Path: /good.py".to_string()),
            Ok("I think the culprit is\n- Path: /good.py".to_string()),
        ]);
        let picked = select_file(&generator, dir.path(), "t", "b", 512, 4.0)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(picked, dir.path().join("good.py"));
    }

    #[tokio::test]
    async fn test_failed_map_call_does_not_abort_scan() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("a.py"), "x = 1\n").unwrap();
        fs::write(dir.path().join("b.py"), "y = 2\n").unwrap();

        // Tiny limit forces one chunk per line; the first map call fails.
        let generator = ScriptedGenerator::new(vec![
            Err(anyhow!("boom")),
            Ok("- Path: /b.py".to_string()),
            Ok("- Path: /b.py".to_string()),
        ]);
        let picked = select_file(&generator, dir.path(), "t", "b", 1, 4.0)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(picked, dir.path().join("b.py"));
    }

    #[tokio::test]
    async fn test_unusable_filter_verdict_is_none() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("a.py"), "x = 1\n").unwrap();

        let generator = ScriptedGenerator::new(vec![
            Ok("- Path: /a.py".to_string()),
            Ok("none of these look right".to_string()),
        ]);
        let picked = select_file(&generator, dir.path(), "t", "b", 512, 4.0)
            .await
            .unwrap();
        assert!(picked.is_none());
    }
}
