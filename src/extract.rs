//! Recovering file paths from free-form text
//!
//! LLM responses are expected to contain a `- Path: /x/y.py` line but often
//! don't; extraction failing is a recoverable condition, not an error.

use regex::Regex;
use std::sync::LazyLock;

/// Matches the path markers the selection prompts ask for. The path must
/// start with a separator so prose containing "Path: maybe" doesn't match.
static PATH_MARKER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:- Path: |Path: |File: )(/\S+.*)").expect("PATH_MARKER_RE should compile")
});

/// First `diff --git a/<path> b/<path>` header of a unified diff.
static DIFF_HEADER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^diff --git a/(\S+)\s+b/\S+").expect("DIFF_HEADER_RE should compile")
});

/// Extract every path-like substring flagged by a known marker, in
/// appearance order. Returns an empty list when no marker is present.
pub fn extract_paths(text: &str) -> Vec<String> {
    PATH_MARKER_RE
        .captures_iter(text)
        .map(|cap| cap[1].to_string())
        .collect()
}

/// Pull the repository-relative target path out of a reference patch's
/// first diff header (oracle retrieval). `None` when the text has no
/// `diff --git` header.
pub fn path_from_patch(patch_text: &str) -> Option<String> {
    DIFF_HEADER_RE
        .captures(patch_text)
        .map(|cap| cap[1].to_string())
}
