//! Unified diff synthesis
//!
//! `build_patch` turns a before/after snapshot of one file into the patch
//! text that lands in the prediction log.

use similar::TextDiff;

/// Build a unified diff between two versions of one file.
///
/// The diff carries `a/<path>` / `b/<path>` file headers preceded by a
/// synthetic `diff --git` line, matching what `git diff` emits. Identical
/// inputs produce the empty string (no header for a no-op).
pub fn build_patch(before: &str, after: &str, rel_path: &str) -> String {
    if before == after {
        return String::new();
    }

    let diff = TextDiff::from_lines(before, after);
    let body = diff
        .unified_diff()
        .context_radius(3)
        .header(&format!("a/{rel_path}"), &format!("b/{rel_path}"))
        .to_string();

    if body.is_empty() {
        return String::new();
    }

    format!("diff --git a/{rel_path} b/{rel_path}\n{body}")
}
