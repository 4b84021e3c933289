//! Issue acquisition and repository snapshots
//!
//! Fetches the issue text from the GitHub REST API and materializes a
//! working snapshot of the repository at the record's base commit by
//! shelling out to git. Snapshots are throwaway; removal failures are
//! logged, never fatal.

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

const GITHUB_API: &str = "https://api.github.com";

/// An issue ready for the pipeline, with its snapshot on disk.
#[derive(Debug)]
pub struct AcquiredIssue {
    pub title: String,
    pub body: String,
    pub snapshot: PathBuf,
}

#[derive(Deserialize)]
struct IssueResponse {
    title: String,
    #[serde(default)]
    body: Option<String>,
}

/// `owner/name`, as stored in dataset records.
pub fn validate_repo_ident(repo: &str) -> Result<()> {
    let mut parts = repo.splitn(2, '/');
    let owner = parts.next().unwrap_or_default();
    let name = parts.next().unwrap_or_default();
    if owner.is_empty() || name.is_empty() {
        bail!("Invalid repository identifier '{repo}' (expected owner/name)");
    }
    Ok(())
}

/// Fetch an issue's title and body.
pub async fn fetch_issue(
    client: &reqwest::Client,
    token: &str,
    repo: &str,
    issue_number: &str,
) -> Result<(String, String)> {
    let url = format!("{GITHUB_API}/repos/{repo}/issues/{issue_number}");
    let response = client
        .get(&url)
        .header("Authorization", format!("token {token}"))
        .header("Accept", "application/vnd.github+json")
        .header("User-Agent", "patchwright")
        .send()
        .await
        .with_context(|| format!("Failed to reach GitHub for {repo}#{issue_number}"))?;

    let status = response.status();
    if !status.is_success() {
        bail!("GitHub returned {status} for {repo}#{issue_number}");
    }

    let issue: IssueResponse = response
        .json()
        .await
        .with_context(|| format!("Malformed issue payload for {repo}#{issue_number}"))?;
    Ok((issue.title, issue.body.unwrap_or_default()))
}

/// Clone the repository into `dest` and check out `base_commit`. Any stale
/// directory at `dest` is removed first; a failed checkout removes the
/// partial clone so no snapshot outlives its acquisition error.
pub fn materialize_snapshot(repo: &str, base_commit: &str, dest: &Path) -> Result<()> {
    let url = format!("https://github.com/{repo}.git");
    clone_at(&url, base_commit, dest).with_context(|| format!("Failed to materialize {repo}"))
}

fn clone_at(url: &str, base_commit: &str, dest: &Path) -> Result<()> {
    if dest.exists() {
        fs::remove_dir_all(dest)
            .with_context(|| format!("Failed to clear stale snapshot {}", dest.display()))?;
    }

    run_git(&["clone", "--quiet", url, &dest.to_string_lossy()])
        .with_context(|| format!("Failed to clone {url}"))?;
    if let Err(e) = run_git(&[
        "-C",
        &dest.to_string_lossy(),
        "checkout",
        "--quiet",
        base_commit,
    ]) {
        remove_snapshot(dest);
        return Err(e).with_context(|| format!("Failed to check out {base_commit}"));
    }
    Ok(())
}

fn run_git(args: &[&str]) -> Result<()> {
    let output = Command::new("git")
        .args(args)
        .output()
        .context("Failed to spawn git")?;
    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        bail!("git {} failed: {}", args[0], stderr.trim());
    }
    Ok(())
}

/// Delete a snapshot. Errors are logged only; a leftover directory must
/// never fail the batch.
pub fn remove_snapshot(snapshot: &Path) {
    if let Err(e) = fs::remove_dir_all(snapshot) {
        eprintln!("  Could not remove snapshot {}: {e}", snapshot.display());
    }
}

/// Fetch the issue and lay down the snapshot for one dataset record.
pub async fn acquire(
    client: &reqwest::Client,
    token: &str,
    repo: &str,
    issue_number: &str,
    base_commit: &str,
    snapshot: &Path,
) -> Result<AcquiredIssue> {
    let (title, body) = fetch_issue(client, token, repo, issue_number).await?;
    materialize_snapshot(repo, base_commit, snapshot)?;
    Ok(AcquiredIssue {
        title,
        body,
        snapshot: snapshot.to_path_buf(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_repo_ident() {
        assert!(validate_repo_ident("django/django").is_ok());
        assert!(validate_repo_ident("a/b").is_ok());
    }

    #[test]
    fn test_invalid_repo_idents() {
        assert!(validate_repo_ident("django").is_err());
        assert!(validate_repo_ident("/django").is_err());
        assert!(validate_repo_ident("django/").is_err());
        assert!(validate_repo_ident("").is_err());
    }

    /// Local git repository with one commit; returns the commit sha.
    fn init_fixture_repo(dir: &Path) -> String {
        let git = |args: &[&str]| {
            let output = Command::new("git").args(args).output().unwrap();
            assert!(
                output.status.success(),
                "git {args:?}: {}",
                String::from_utf8_lossy(&output.stderr)
            );
            String::from_utf8_lossy(&output.stdout).trim().to_string()
        };
        let root = dir.to_string_lossy();
        git(&["init", "--quiet", &root]);
        fs::write(dir.join("a.py"), "x = 1\n").unwrap();
        git(&["-C", &root, "add", "a.py"]);
        git(&[
            "-C",
            &root,
            "-c",
            "user.name=t",
            "-c",
            "user.email=t@example.com",
            "commit",
            "--quiet",
            "-m",
            "init",
        ]);
        git(&["-C", &root, "rev-parse", "HEAD"])
    }

    #[test]
    fn test_clone_at_commit() {
        let dir = tempfile::tempdir().unwrap();
        let origin = dir.path().join("origin");
        fs::create_dir(&origin).unwrap();
        let sha = init_fixture_repo(&origin);

        let dest = dir.path().join("snap");
        clone_at(&origin.to_string_lossy(), &sha, &dest).unwrap();
        assert!(dest.join("a.py").is_file());
    }

    #[test]
    fn test_failed_checkout_removes_partial_clone() {
        let dir = tempfile::tempdir().unwrap();
        let origin = dir.path().join("origin");
        fs::create_dir(&origin).unwrap();
        init_fixture_repo(&origin);

        let dest = dir.path().join("snap");
        let bogus = "0000000000000000000000000000000000000000";
        assert!(clone_at(&origin.to_string_lossy(), bogus, &dest).is_err());
        assert!(!dest.exists(), "partial clone must not outlive the error");
    }

    #[test]
    fn test_remove_snapshot_tolerates_missing_dir() {
        // Only logs; must not panic.
        remove_snapshot(Path::new("/nonexistent/patchwright-snapshot"));
    }

    #[test]
    fn test_remove_snapshot_deletes_dir() {
        let dir = tempfile::tempdir().unwrap();
        let snap = dir.path().join("snap");
        fs::create_dir(&snap).unwrap();
        fs::write(snap.join("f.py"), "x = 1\n").unwrap();
        remove_snapshot(&snap);
        assert!(!snap.exists());
    }
}
