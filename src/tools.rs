//! File-editing toolset
//!
//! The edit loop hands these commands to the external collaborator: open a
//! file, scroll a numbered window over it, replace a line range. Commands
//! are executed as-is; their effect is only ever verified by the syntax
//! check that follows.

use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

/// Lines shown per window, matching the 100-line pager the agents expect.
const WINDOW_LINES: usize = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScrollDirection {
    Up,
    Down,
}

/// One opaque command parsed from a collaborator response.
#[derive(Debug, Clone, PartialEq)]
pub enum ToolAction {
    Scroll {
        direction: ScrollDirection,
        lines: usize,
    },
    EditFile {
        start_line: usize,
        end_line: usize,
        text: String,
    },
}

/// An open file plus the window position the collaborator sees.
#[derive(Debug)]
pub struct FileTools {
    path: PathBuf,
    window_start: usize,
}

impl FileTools {
    /// Open a file for viewing and editing.
    pub fn open(path: &Path) -> Result<Self> {
        fs::metadata(path).with_context(|| format!("Cannot open {}", path.display()))?;
        Ok(FileTools {
            path: path.to_path_buf(),
            window_start: 0,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Numbered view of the current window.
    pub fn view(&self) -> Result<String> {
        let content = fs::read_to_string(&self.path)?;
        let lines: Vec<&str> = content.lines().collect();
        let start = self.window_start.min(lines.len().saturating_sub(1));
        let end = (start + WINDOW_LINES).min(lines.len());
        Ok(format_lines(&lines, start, end))
    }

    /// Move the window. Clamped to the file; never fails.
    pub fn scroll(&mut self, direction: ScrollDirection, lines: usize) {
        match direction {
            ScrollDirection::Up => {
                self.window_start = self.window_start.saturating_sub(lines);
            }
            ScrollDirection::Down => {
                self.window_start += lines;
            }
        }
    }

    /// Replace lines `start_line..=end_line` (1-based, inclusive) with
    /// `text`. Out-of-range bounds are clamped; a start past the end of
    /// the file appends. The original's trailing-newline convention is
    /// preserved.
    pub fn edit_file(&self, start_line: usize, end_line: usize, text: &str) -> Result<()> {
        let original = fs::read_to_string(&self.path)?;
        let mut lines: Vec<String> = original.lines().map(|s| s.to_string()).collect();

        let start = start_line.max(1) - 1;
        let start = start.min(lines.len());
        let end = end_line.max(start_line).min(lines.len()).max(start);

        let replacement: Vec<String> = text.lines().map(|s| s.to_string()).collect();
        lines.splice(start..end, replacement);

        let mut updated = lines.join("\n");
        if original.ends_with('\n') && !updated.is_empty() {
            updated.push('\n');
        }
        fs::write(&self.path, updated)
            .with_context(|| format!("Failed to write {}", self.path.display()))?;
        Ok(())
    }
}

/// Format a range of lines with 1-based line numbers.
fn format_lines(lines: &[&str], start: usize, end: usize) -> String {
    lines[start..end.min(lines.len())]
        .iter()
        .enumerate()
        .map(|(i, l)| format!("{:4} | {}", start + i + 1, l))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Parse collaborator output into tool actions.
///
/// Best-effort by contract: the response is free text that should contain a
/// JSON object with an `actions` array (or a bare array). Anything
/// unparseable, whether the whole response or an individual entry, is
/// dropped silently.
pub fn parse_actions(text: &str) -> Vec<ToolAction> {
    let Some(json) = first_json_value(text) else {
        return Vec::new();
    };

    let items = match &json {
        serde_json::Value::Array(items) => items.as_slice(),
        serde_json::Value::Object(map) => match map.get("actions").and_then(|v| v.as_array()) {
            Some(items) => items.as_slice(),
            None => return Vec::new(),
        },
        _ => return Vec::new(),
    };

    items.iter().filter_map(parse_action).collect()
}

fn parse_action(value: &serde_json::Value) -> Option<ToolAction> {
    match value.get("action").and_then(|v| v.as_str())? {
        "scroll" => {
            let direction = match value.get("direction").and_then(|v| v.as_str())? {
                "up" => ScrollDirection::Up,
                "down" => ScrollDirection::Down,
                _ => return None,
            };
            let lines = value.get("lines").and_then(|v| v.as_u64()).unwrap_or(100) as usize;
            Some(ToolAction::Scroll { direction, lines })
        }
        "edit_file" => {
            let start_line = value.get("start_line").and_then(|v| v.as_u64())? as usize;
            let end_line = value.get("end_line").and_then(|v| v.as_u64())? as usize;
            let text = value.get("text").and_then(|v| v.as_str())?.to_string();
            Some(ToolAction::EditFile {
                start_line,
                end_line,
                text,
            })
        }
        _ => None,
    }
}

/// Pull the first JSON value out of free text (models often wrap JSON in
/// prose or code fences).
fn first_json_value(text: &str) -> Option<serde_json::Value> {
    let start = text.find(['{', '['])?;
    let open = text.as_bytes()[start] as char;
    let close = if open == '{' { '}' } else { ']' };
    let end = text.rfind(close)?;
    if end <= start {
        return None;
    }
    serde_json::from_str(&text[start..=end]).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_file(dir: &tempfile::TempDir, name: &str, content: &str) -> PathBuf {
        let path = dir.path().join(name);
        fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_view_numbers_lines() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(&dir, "a.py", "one\ntwo\nthree\n");
        let tools = FileTools::open(&path).unwrap();
        let view = tools.view().unwrap();
        assert!(view.contains("   1 | one"));
        assert!(view.contains("   3 | three"));
    }

    #[test]
    fn test_scroll_moves_window() {
        let dir = tempfile::tempdir().unwrap();
        let content: String = (1..=250).map(|i| format!("line{i}\n")).collect();
        let path = write_file(&dir, "a.py", &content);
        let mut tools = FileTools::open(&path).unwrap();

        tools.scroll(ScrollDirection::Down, 150);
        let view = tools.view().unwrap();
        assert!(view.contains("line151"));
        assert!(!view.contains("line1 "));

        tools.scroll(ScrollDirection::Up, 1000); // clamped
        let view = tools.view().unwrap();
        assert!(view.contains("   1 | line1"));
    }

    #[test]
    fn test_edit_replaces_inclusive_range() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(&dir, "a.py", "a\nb\nc\nd\n");
        let tools = FileTools::open(&path).unwrap();

        tools.edit_file(2, 3, "B").unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "a\nB\nd\n");
    }

    #[test]
    fn test_edit_clamps_out_of_range() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(&dir, "a.py", "a\nb\n");
        let tools = FileTools::open(&path).unwrap();

        tools.edit_file(5, 9, "tail").unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "a\nb\ntail\n");
    }

    #[test]
    fn test_edit_preserves_missing_trailing_newline() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(&dir, "a.py", "a\nb");
        let tools = FileTools::open(&path).unwrap();

        tools.edit_file(2, 2, "B").unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "a\nB");
    }

    #[test]
    fn test_parse_actions_object_form() {
        let text = r#"Sure! Here is the fix:
{"actions": [
  {"action": "scroll", "direction": "down", "lines": 50},
  {"action": "edit_file", "start_line": 3, "end_line": 4, "text": "x = 1"}
]}"#;
        let actions = parse_actions(text);
        assert_eq!(actions.len(), 2);
        assert_eq!(
            actions[1],
            ToolAction::EditFile {
                start_line: 3,
                end_line: 4,
                text: "x = 1".to_string()
            }
        );
    }

    #[test]
    fn test_parse_actions_skips_malformed_entries() {
        let text = r#"{"actions": [
  {"action": "edit_file", "start_line": "not a number"},
  {"action": "teleport"},
  {"action": "edit_file", "start_line": 1, "end_line": 1, "text": "ok"}
]}"#;
        let actions = parse_actions(text);
        assert_eq!(actions.len(), 1);
    }

    #[test]
    fn test_parse_actions_without_json_is_empty() {
        assert!(parse_actions("I could not produce a fix.").is_empty());
        assert!(parse_actions("").is_empty());
    }
}
