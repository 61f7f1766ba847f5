//! Public carrier types.
//!
//! These types are independent of the document generation they were read from, so callers
//! never need to know whether a record was legacy or enveloped.

use chrono::{DateTime, Utc};
use report_types::ExamType;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// Domain-level carrier for a persisted report.
///
/// This type is symmetric with both parsing and rendering:
/// - [`crate::ReportDocument::parse`] extracts a `ReportData` from stored text
/// - [`crate::ReportDocument::render`] builds stored text from a `ReportData`
///
/// Field content decoded from storage is never empty (at least `[""]`). Rendering collapses
/// blank-only sequences to `[]`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReportData {
    pub exam_type: ExamType,

    /// Subtype code as stored. Validation against the exam type happens in the core.
    pub sub_type: String,

    /// Field key to lines, including custom fields.
    pub fields: BTreeMap<String, Vec<String>>,

    pub bold_fields: BTreeMap<String, bool>,

    /// Keys marked hidden. Their content is not stored; the key and attributes are.
    pub hidden_fields: BTreeSet<String>,

    /// User-added fields in display order. Their content lives in `fields`.
    pub custom_fields: Vec<CustomFieldData>,

    pub saved_at: Option<DateTime<Utc>>,
}

impl ReportData {
    /// Creates an empty carrier for the given exam type and subtype.
    pub fn new(exam_type: ExamType, sub_type: impl Into<String>) -> Self {
        Self {
            exam_type,
            sub_type: sub_type.into(),
            fields: BTreeMap::new(),
            bold_fields: BTreeMap::new(),
            hidden_fields: BTreeSet::new(),
            custom_fields: Vec::new(),
            saved_at: None,
        }
    }
}

/// A user-added field registration: its generated key and human-readable label.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct CustomFieldData {
    pub key: String,
    pub label: String,
}

/// Result of decoding a stored document.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Decoded {
    pub data: ReportData,

    /// Envelope version the document was decoded as (1 for legacy records).
    pub version: u64,

    /// Fields dropped or repaired while decoding.
    pub warnings: Vec<WireWarning>,
}

/// A non-fatal problem found while decoding a document.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum WireWarning {
    /// A Doppler label matched no template field, no custom field and no field key.
    UnknownLabel { label: String },

    /// A Doppler label matched several field keys.
    AmbiguousLabel {
        label: String,
        candidates: Vec<String>,
    },

    /// A legacy custom field entry had no usable key or label.
    MalformedCustomField { index: usize },
}

impl fmt::Display for WireWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WireWarning::UnknownLabel { label } => {
                write!(f, "label '{label}' does not match any field; dropped")
            }
            WireWarning::AmbiguousLabel { label, candidates } => write!(
                f,
                "label '{label}' matches several fields ({}); dropped",
                candidates.join(", ")
            ),
            WireWarning::MalformedCustomField { index } => {
                write!(f, "custom field entry #{index} has no key or label; dropped")
            }
        }
    }
}

/// Outcome of looking up a label.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LabelLookup {
    Unique(String),
    Ambiguous(Vec<String>),
    Unknown,
}

/// Label to field key index used to decode label-keyed (legacy Doppler) records.
///
/// Labels are compared after trimming. A label that matches nothing may still be a field key
/// written directly, which is accepted as-is.
#[derive(Clone, Debug, Default)]
pub struct LabelIndex {
    by_label: BTreeMap<String, Vec<String>>,
    keys: BTreeSet<String>,
}

impl LabelIndex {
    /// Builds an index from `(key, label)` pairs.
    pub fn new<K, L>(entries: impl IntoIterator<Item = (K, L)>) -> Self
    where
        K: Into<String>,
        L: AsRef<str>,
    {
        let mut index = Self::default();
        for (key, label) in entries {
            index.insert(key.into(), label.as_ref());
        }
        index
    }

    /// Adds one `(key, label)` pair. Re-adding the same pair is a no-op.
    pub fn insert(&mut self, key: String, label: &str) {
        let keys = self.by_label.entry(label.trim().to_string()).or_default();
        if !keys.contains(&key) {
            keys.push(key.clone());
        }
        self.keys.insert(key);
    }

    pub fn lookup(&self, label: &str) -> LabelLookup {
        let label = label.trim();
        match self.by_label.get(label).map(Vec::as_slice) {
            Some([key]) => LabelLookup::Unique(key.clone()),
            Some(keys) if keys.len() > 1 => LabelLookup::Ambiguous(keys.to_vec()),
            _ if self.keys.contains(label) => LabelLookup::Unique(label.to_string()),
            _ => LabelLookup::Unknown,
        }
    }
}
