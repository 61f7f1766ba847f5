//! Echography tagged line records.
//!
//! The print collaborator renders echography lines according to a presentation role carried
//! on every line: descriptive text, conclusion, or conduct to hold. The role is chosen purely
//! from the field key being serialized.

use report_types::{is_conclusion_family, is_conduct_family};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Presentation role of an echography line.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LineRole {
    /// Descriptive findings (`desc`).
    Descriptive,
    /// Conclusion (`conc`).
    Conclusion,
    /// Conduct to hold (`cat`).
    ConductToHold,
}

impl LineRole {
    /// Returns the role used for every line of the field `key`.
    pub fn for_key(key: &str) -> Self {
        if is_conclusion_family(key) {
            LineRole::Conclusion
        } else if is_conduct_family(key) {
            LineRole::ConductToHold
        } else {
            LineRole::Descriptive
        }
    }

    /// Returns the tag written on the wire.
    pub fn tag(&self) -> &'static str {
        match self {
            LineRole::Descriptive => "desc",
            LineRole::Conclusion => "conc",
            LineRole::ConductToHold => "cat",
        }
    }

    pub(crate) fn wrap(&self, text: String) -> TaggedLine {
        match self {
            LineRole::Descriptive => TaggedLine::Desc(text),
            LineRole::Conclusion => TaggedLine::Conc(text),
            LineRole::ConductToHold => TaggedLine::Cat(text),
        }
    }
}

/// Wire representation of one echography line: `{"desc": "..."}`, `{"conc": "..."}` or
/// `{"cat": "..."}`.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub(crate) enum TaggedLine {
    #[serde(rename = "desc")]
    Desc(String),
    #[serde(rename = "conc")]
    Conc(String),
    #[serde(rename = "cat")]
    Cat(String),
}

impl TaggedLine {
    pub(crate) fn into_text(self) -> String {
        match self {
            TaggedLine::Desc(text) | TaggedLine::Conc(text) | TaggedLine::Cat(text) => text,
        }
    }
}

/// Tags every line of `key` with its role.
pub(crate) fn tag_lines(key: &str, lines: Vec<String>) -> Vec<TaggedLine> {
    let role = LineRole::for_key(key);
    lines.into_iter().map(|line| role.wrap(line)).collect()
}

/// Extracts the text of a loosely shaped tagged record (legacy documents).
///
/// Accepts a single-key object whose key is one of the three tags and whose value is a string
/// or `null`.
pub(crate) fn untag_line(item: &Value) -> Option<String> {
    let object = item.as_object()?;
    if object.len() != 1 {
        return None;
    }
    let (tag, value) = object.iter().next()?;
    if !matches!(tag.as_str(), "desc" | "conc" | "cat") {
        return None;
    }
    match value {
        Value::String(text) => Some(text.clone()),
        Value::Null => Some(String::new()),
        _ => None,
    }
}
