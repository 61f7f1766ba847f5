//! Read-only view consumed by print rendering.

use super::Report;
use report_types::{ExamType, FieldKey, SubType};
use report_wire::is_blank_lines;
use serde::Serialize;
use std::collections::BTreeMap;

/// Printable content of a report.
///
/// Only visible fields with at least one non-blank line are listed, in display order.
/// `bold_fields` covers exactly the listed fields.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct PrintSnapshot {
    pub exam_type: ExamType,
    pub sub_type: SubType,
    pub fields: Vec<PrintField>,
    pub bold_fields: BTreeMap<FieldKey, bool>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct PrintField {
    pub key: FieldKey,
    /// Custom or template label; the key itself when neither is known.
    pub label: String,
    pub lines: Vec<String>,
}

impl Report {
    pub fn print_snapshot(&self) -> PrintSnapshot {
        let fields: Vec<PrintField> = self
            .keys()
            .filter(|key| !self.is_hidden(key.as_str()))
            .filter_map(|key| {
                let entry = self.field(key.as_str())?;
                if is_blank_lines(entry.lines()) {
                    return None;
                }
                Some(PrintField {
                    key: key.clone(),
                    label: self.label(key.as_str()).unwrap_or(key.as_str()).to_string(),
                    lines: entry.lines().to_vec(),
                })
            })
            .collect();

        let bold_fields = fields
            .iter()
            .map(|field| (field.key.clone(), self.is_bold(field.key.as_str())))
            .collect();

        PrintSnapshot {
            exam_type: self.exam_type(),
            sub_type: self.sub_type(),
            fields,
            bold_fields,
        }
    }
}
