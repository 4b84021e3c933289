//! Python syntax gate
//!
//! Parses a file with tree-sitter and reports whether it is syntactically
//! well-formed. Every failure mode (parse errors, unreadable files, bad
//! encodings) is captured in the returned report; this check never
//! surfaces an `Err` to the caller because syntax errors are expected data
//! that drive the edit retry loop.

use std::cell::RefCell;
use std::fs;
use std::path::Path;
use tree_sitter::{Node, Parser};

thread_local! {
    static PYTHON_PARSER: RefCell<Parser> = RefCell::new({
        let mut p = Parser::new();
        // Ignore error here - a misconfigured language shows up at parse time
        let _ = p.set_language(&tree_sitter_python::LANGUAGE.into());
        p
    });
}

/// Outcome of a syntax check. `message` is human-readable and is fed
/// verbatim into the fix-the-error prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyntaxReport {
    pub ok: bool,
    pub message: String,
}

impl SyntaxReport {
    fn pass() -> Self {
        SyntaxReport {
            ok: true,
            message: "Compilation successful!".to_string(),
        }
    }

    fn fail(message: String) -> Self {
        SyntaxReport { ok: false, message }
    }
}

/// Check whether the Python file at `path` parses.
pub fn check_python_file(path: &Path) -> SyntaxReport {
    let source = match fs::read_to_string(path) {
        Ok(s) => s,
        Err(e) => return SyntaxReport::fail(format!("Error: {e}")),
    };
    check_python_source(path, &source)
}

/// Check source text directly (the file variant is a thin wrapper).
pub fn check_python_source(path: &Path, source: &str) -> SyntaxReport {
    let tree = PYTHON_PARSER.with(|p| p.borrow_mut().parse(source, None));
    let tree = match tree {
        Some(t) => t,
        None => return SyntaxReport::fail("Error: parser unavailable".to_string()),
    };

    let root = tree.root_node();
    if !root.has_error() {
        return SyntaxReport::pass();
    }

    let node = first_error_node(root).unwrap_or(root);
    let pos = node.start_position();

    // A MISSING token is zero-width and can sit past the last real line
    // (e.g. an unclosed paren reported at EOF). Anchor the report to the
    // nearest preceding non-empty line so the message points at code.
    let lines: Vec<&str> = source.lines().collect();
    let mut row = pos.row.min(lines.len().saturating_sub(1));
    while row > 0 && lines.get(row).map(|l| l.trim().is_empty()).unwrap_or(true) {
        row -= 1;
    }
    let line_no = row + 1;
    let offending = lines.get(row).map(|l| l.trim()).unwrap_or("");

    let detail = if node.is_missing() {
        format!("expected {}", node.kind())
    } else {
        "invalid syntax".to_string()
    };

    let mut message = format!(
        "Syntax error in file {} at line {}, offset {}:\n",
        path.display(),
        line_no,
        pos.column
    );
    if !offending.is_empty() {
        message.push_str(&format!("  {offending}\n"));
    }
    message.push_str(&detail);

    SyntaxReport::fail(message)
}

/// Depth-first search for the first ERROR or MISSING node.
fn first_error_node(node: Node<'_>) -> Option<Node<'_>> {
    if node.is_error() || node.is_missing() {
        return Some(node);
    }
    if !node.has_error() {
        return None;
    }
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        if let Some(found) = first_error_node(child) {
            return Some(found);
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn check(source: &str) -> SyntaxReport {
        check_python_source(&PathBuf::from("snippet.py"), source)
    }

    #[test]
    fn test_valid_file_passes() {
        let report = check("def add(a, b):\n    return a + b\n");
        assert!(report.ok, "unexpected failure: {}", report.message);
        assert!(report.message.contains("successful"));
    }

    #[test]
    fn test_unmatched_paren_reports_its_line() {
        let report = check("y = 1\nx = (1 + 2\n");
        assert!(!report.ok);
        assert!(
            report.message.contains("line 2"),
            "expected line 2 in: {}",
            report.message
        );
    }

    #[test]
    fn test_corrected_file_passes() {
        let broken = check("y = 1\nx = (1 + 2\n");
        assert!(!broken.ok);
        let fixed = check("y = 1\nx = (1 + 2)\n");
        assert!(fixed.ok, "correction should pass: {}", fixed.message);
    }

    #[test]
    fn test_offending_line_included_trimmed() {
        let report = check("if True:\n    x = ((\n");
        assert!(!report.ok);
        assert!(
            report.message.contains("x = (("),
            "missing source excerpt: {}",
            report.message
        );
    }

    #[test]
    fn test_missing_file_is_generic_error() {
        let report = check_python_file(&PathBuf::from("/definitely/not/here.py"));
        assert!(!report.ok);
        assert!(report.message.starts_with("Error:"));
    }

    #[test]
    fn test_empty_file_passes() {
        let report = check("");
        assert!(report.ok);
    }
}
