//! Doppler nested field envelope.
//!
//! Doppler reports keep all their dynamic fields inside one envelope field. Enveloped
//! documents key it by field key:
//!
//! ```json
//! { "doppler": { "fields": { "aorte": ["Aorte de calibre normal"] } } }
//! ```
//!
//! Legacy records keyed the same envelope by human-readable label, sometimes as a
//! JSON-encoded string. Those are decoded once through a [`LabelIndex`] and rewritten
//! key-keyed on the next save.

use crate::content::normalize_lines;
use crate::data::{LabelIndex, LabelLookup, WireWarning};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Key-keyed Doppler envelope.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub(crate) struct DopplerEnvelope {
    pub fields: BTreeMap<String, Vec<String>>,
}

/// Decodes a legacy label-keyed envelope value into `fields`.
///
/// Labels that cannot be resolved to exactly one key are dropped and reported in `warnings`;
/// the rest of the report is unaffected.
pub(crate) fn decode_label_keyed(
    value: &Value,
    index: &LabelIndex,
    fields: &mut BTreeMap<String, Vec<String>>,
    warnings: &mut Vec<WireWarning>,
) {
    let parsed;
    let object = match value {
        Value::Object(object) => object,
        Value::String(text) => match serde_json::from_str::<Value>(text) {
            Ok(Value::Object(object)) => {
                parsed = object;
                &parsed
            }
            _ => return,
        },
        _ => return,
    };

    for (label, content) in object {
        match index.lookup(label) {
            LabelLookup::Unique(key) => {
                fields.insert(key, normalize_lines(content));
            }
            LabelLookup::Ambiguous(candidates) => warnings.push(WireWarning::AmbiguousLabel {
                label: label.clone(),
                candidates,
            }),
            LabelLookup::Unknown => warnings.push(WireWarning::UnknownLabel {
                label: label.clone(),
            }),
        }
    }
}
