//! Decode-only adapter for legacy (unversioned) report records.
//!
//! Legacy records are flat JSON objects. Besides a handful of reserved keys, every member is a
//! field whose content may be in any historical shape. Attribute maps and the custom field
//! list may themselves be JSON-encoded strings. Key spellings differ between editors, so each
//! reserved member accepts both camelCase and snake_case.

use crate::content::normalize_lines;
use crate::data::{CustomFieldData, Decoded, LabelIndex, ReportData, WireWarning};
use crate::doppler::decode_label_keyed;
use crate::{WireError, WireResult};
use report_types::ExamType;
use serde_json::{Map, Value};
use std::collections::{BTreeMap, BTreeSet};

const SUB_TYPE_KEYS: &[&str] = &["subType", "sub_type", "subtype"];
const BOLD_KEYS: &[&str] = &["boldFields", "bold_fields"];
const HIDDEN_KEYS: &[&str] = &["hiddenFields", "hidden_fields"];
const CUSTOM_KEYS: &[&str] = &["customFields", "custom_fields"];
const DOPPLER_KEYS: &[&str] = &["dopplerData", "doppler_data", "doppler"];

/// Row metadata that older stores wrote next to the fields.
const METADATA_KEYS: &[&str] = &[
    "id",
    "consultationId",
    "consultation_id",
    "examType",
    "exam_type",
    "createdAt",
    "created_at",
    "updatedAt",
    "updated_at",
];

/// Decodes a legacy record for `exam_type`.
///
/// # Errors
///
/// Returns [`WireError::Translation`] if the record has no subtype.
pub(crate) fn decode(
    exam_type: ExamType,
    record: &Map<String, Value>,
    labels: &LabelIndex,
) -> WireResult<Decoded> {
    let sub_type = first_member(record, SUB_TYPE_KEYS)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| WireError::Translation("legacy record has no subtype".into()))?;

    let mut data = ReportData::new(exam_type, sub_type);
    let mut warnings = Vec::new();

    data.bold_fields = first_member(record, BOLD_KEYS)
        .map(decode_flag_map)
        .unwrap_or_default();
    data.hidden_fields = first_member(record, HIDDEN_KEYS)
        .map(decode_flag_map)
        .unwrap_or_default()
        .into_iter()
        .filter_map(|(key, hidden)| hidden.then_some(key))
        .collect();

    let custom_entries = first_member(record, CUSTOM_KEYS)
        .map(decode_custom_fields)
        .unwrap_or_default();

    for (name, value) in record {
        if is_reserved(exam_type, name) {
            continue;
        }
        data.fields.insert(name.clone(), normalize_lines(value));
    }

    if exam_type == ExamType::Doppler {
        if let Some(envelope) = first_member(record, DOPPLER_KEYS) {
            let mut index = labels.clone();
            for (_, entry) in custom_entries.iter().flatten() {
                index.insert(entry.key.clone(), &entry.label);
            }
            decode_label_keyed(envelope, &index, &mut data.fields, &mut warnings);
        }
    }

    let mut seen = BTreeSet::new();
    for (index, entry) in custom_entries.into_iter().enumerate() {
        let Some((content, custom)) = entry else {
            warnings.push(WireWarning::MalformedCustomField { index });
            continue;
        };
        if !seen.insert(custom.key.clone()) {
            continue;
        }
        data.fields.entry(custom.key.clone()).or_insert(content);
        data.custom_fields.push(custom);
    }

    Ok(Decoded {
        data,
        version: 1,
        warnings,
    })
}

/// Doppler envelope names are only reserved in Doppler records; elsewhere they are fields.
fn is_reserved(exam_type: ExamType, name: &str) -> bool {
    if exam_type == ExamType::Doppler && DOPPLER_KEYS.contains(&name) {
        return true;
    }
    [SUB_TYPE_KEYS, BOLD_KEYS, HIDDEN_KEYS, CUSTOM_KEYS, METADATA_KEYS]
        .iter()
        .any(|keys| keys.contains(&name))
}

fn first_member<'a>(record: &'a Map<String, Value>, names: &[&str]) -> Option<&'a Value> {
    names.iter().find_map(|name| record.get(*name))
}

/// Decodes an attribute map given as an object or as a JSON-encoded object.
fn decode_flag_map(value: &Value) -> BTreeMap<String, bool> {
    let object = match value {
        Value::Object(object) => object.clone(),
        Value::String(text) => match serde_json::from_str::<Value>(text) {
            Ok(Value::Object(object)) => object,
            _ => return BTreeMap::new(),
        },
        _ => return BTreeMap::new(),
    };

    object
        .into_iter()
        .map(|(key, flag)| {
            let flag = match flag {
                Value::Bool(b) => b,
                Value::Number(n) => n.as_i64().is_some_and(|n| n != 0),
                Value::String(s) => s.eq_ignore_ascii_case("true"),
                _ => false,
            };
            (key, flag)
        })
        .collect()
}

/// Decodes the legacy custom field list. Entries without a key or label become `None`.
fn decode_custom_fields(value: &Value) -> Vec<Option<(Vec<String>, CustomFieldData)>> {
    let items = match value {
        Value::Array(items) => items.clone(),
        Value::String(text) => match serde_json::from_str::<Value>(text) {
            Ok(Value::Array(items)) => items,
            _ => return Vec::new(),
        },
        _ => return Vec::new(),
    };

    items
        .iter()
        .map(|item| {
            let object = item.as_object()?;
            let key = ["key", "id"]
                .iter()
                .find_map(|name| object.get(*name))
                .and_then(text_of)?;
            let label = ["label", "name"]
                .iter()
                .find_map(|name| object.get(*name))
                .and_then(text_of)?;
            let content = object
                .get("content")
                .map(normalize_lines)
                .unwrap_or_else(|| vec![String::new()]);
            Some((content, CustomFieldData { key, label }))
        })
        .collect()
}

fn text_of(value: &Value) -> Option<String> {
    let text = match value {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        _ => return None,
    };
    (!text.is_empty()).then_some(text)
}
