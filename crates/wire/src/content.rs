//! Line-content normalization shared by every exam type.
//!
//! Historical records stored field content in three shapes:
//! - an array of strings (sometimes of tagged line records),
//! - a string holding a JSON-encoded array,
//! - a bare scalar (string, number, boolean) or `null`.
//!
//! All of them normalize to a non-empty ordered sequence of strings, `[""]` by default.

use serde_json::Value;

use crate::echography::untag_line;

/// Normalizes any historical content shape into a non-empty sequence of lines.
pub fn normalize_lines(value: &Value) -> Vec<String> {
    let lines = match value {
        Value::Array(items) => items.iter().map(line_text).collect(),
        Value::String(text) => match serde_json::from_str::<Value>(text) {
            Ok(Value::Array(items)) => items.iter().map(line_text).collect(),
            _ => vec![text.clone()],
        },
        Value::Null => Vec::new(),
        Value::Object(_) => vec![line_text(value)],
        Value::Bool(_) | Value::Number(_) => vec![value.to_string()],
    };

    non_empty(lines)
}

/// Ensures a line sequence is never literally empty.
pub(crate) fn non_empty(lines: Vec<String>) -> Vec<String> {
    if lines.is_empty() {
        vec![String::new()]
    } else {
        lines
    }
}

/// Returns true if every line is blank (or there are no lines at all).
pub fn is_blank_lines(lines: &[String]) -> bool {
    lines.iter().all(|line| line.trim().is_empty())
}

/// Returns the persisted form of a line sequence: blank-only sequences become `[]`.
pub fn collapse_for_storage(lines: &[String]) -> Vec<String> {
    if is_blank_lines(lines) {
        Vec::new()
    } else {
        lines.to_vec()
    }
}

fn line_text(item: &Value) -> String {
    match item {
        Value::String(text) => text.clone(),
        Value::Null => String::new(),
        Value::Object(_) => untag_line(item).unwrap_or_else(|| item.to_string()),
        other => other.to_string(),
    }
}
