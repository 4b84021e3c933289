//! Directory description and token-budgeted chunking
//!
//! Turns a repository tree into `- Path: <p>` lines (one per Python file)
//! and packs those lines into chunks that fit an LLM context budget.

use std::path::Path;
use walkdir::WalkDir;

/// Directories that never contain interesting source files.
const IGNORE_DIRS: &[&str] = &[
    ".git",
    "node_modules",
    "target",
    "vendor",
    "dist",
    "build",
    "__pycache__",
    ".venv",
    "venv",
];

/// Approximate the token cost of a piece of text.
///
/// Assumes an average token length of `chars_per_token` characters (4.0 is
/// the usual heuristic). The division truncates; callers that sum per-line
/// estimates depend on that truncation happening per line, not on the
/// concatenated text.
pub fn approximate_token_count(text: &str, chars_per_token: f64) -> usize {
    (text.len() as f64 / chars_per_token) as usize
}

/// Walk `root` and collect one description line per `.py` file.
///
/// Lines have the form `- Path: <path>`. If `base` is given, paths are made
/// relative to it; otherwise absolute paths are used. Order is directory-walk
/// order, which varies across platforms; callers must not rely on it for
/// correctness, only for stable chunk boundaries within a single run.
pub fn describe_directory(root: &Path, base: Option<&Path>) -> Vec<String> {
    let mut lines = Vec::new();

    for entry in WalkDir::new(root)
        .follow_links(false)
        .into_iter()
        .filter_entry(|e| !should_ignore(e))
    {
        let entry = match entry {
            Ok(e) => e,
            Err(_) => continue,
        };

        if !entry.file_type().is_file() {
            continue;
        }

        let path = entry.path();
        if path.extension().and_then(|e| e.to_str()) != Some("py") {
            continue;
        }

        let shown = match base {
            Some(base) => path.strip_prefix(base).unwrap_or(path),
            None => path,
        };
        lines.push(format!("- Path: {}", shown.display()));
    }

    lines
}

fn should_ignore(entry: &walkdir::DirEntry) -> bool {
    entry
        .file_name()
        .to_str()
        .map(|name| IGNORE_DIRS.contains(&name))
        .unwrap_or(false)
}

/// Pack description lines into chunks whose estimated token count stays
/// under `token_limit`.
///
/// Greedy: a line is appended to the current chunk unless doing so would
/// exceed the limit and the chunk is non-empty, in which case the chunk is
/// flushed first. Every line lands in exactly one chunk, in input order; a
/// single line whose own estimate exceeds the limit still forms its own
/// chunk rather than being dropped.
pub fn pack_lines(lines: &[String], token_limit: usize, chars_per_token: f64) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut current: Vec<&str> = Vec::new();
    let mut running = 0usize;

    for line in lines {
        let estimate = approximate_token_count(line, chars_per_token);
        if running + estimate > token_limit && !current.is_empty() {
            chunks.push(current.join("\n"));
            current.clear();
            running = 0;
        }
        current.push(line);
        running += estimate;
    }

    if !current.is_empty() {
        chunks.push(current.join("\n"));
    }

    chunks
}

/// Describe a repository tree and pack it in one step.
pub fn split_directory_tree(
    root: &Path,
    token_limit: usize,
    chars_per_token: f64,
    base: Option<&Path>,
) -> Vec<String> {
    let lines = describe_directory(root, base);
    pack_lines(&lines, token_limit, chars_per_token)
}
