//! Versioned report envelope.
//!
//! Every document written by this crate has the shape:
//!
//! ```json
//! {
//!   "version": 2,
//!   "exam_type": "thyroid",
//!   "saved_at": "2026-03-02T09:30:00Z",
//!   "payload": { "sub_type": "avec_schema", "fields": { ... } }
//! }
//! ```
//!
//! Decoding dispatches on `version`. Version 2 payloads are strict: unknown keys and wrong
//! types are rejected with the path of the offending member. Version 1 (and documents without
//! any `version` key) go through the tolerant legacy adapter.

use crate::content::{collapse_for_storage, non_empty};
use crate::data::{CustomFieldData, Decoded, LabelIndex, ReportData};
use crate::doppler::DopplerEnvelope;
use crate::echography::{tag_lines, TaggedLine};
use crate::{legacy, WireError, WireResult};
use chrono::{DateTime, Utc};
use report_types::ExamType;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};

/// Envelope version written by [`ReportDocument::render`].
pub const CURRENT_VERSION: u64 = 2;

const LEGACY_VERSION: u64 = 1;

// ============================================================================
// Public operations
// ============================================================================

/// Persisted report document operations.
///
/// This is a zero-sized type used for namespacing. All methods are associated functions.
pub struct ReportDocument;

impl ReportDocument {
    /// Parse a stored report document for `exam_type`.
    ///
    /// `labels` is only consulted for legacy Doppler records, whose fields are keyed by label.
    ///
    /// # Errors
    ///
    /// Returns [`WireError`] if:
    /// - the text is not a JSON object,
    /// - the envelope version is not supported,
    /// - the envelope was written for another exam type,
    /// - a version 2 payload does not match its schema,
    /// - a legacy record has no subtype.
    pub fn parse(exam_type: ExamType, text: &str, labels: &LabelIndex) -> WireResult<Decoded> {
        let value: Value = serde_json::from_str(text)?;
        let Value::Object(object) = value else {
            return Err(WireError::NotAnObject);
        };

        let Some(version) = object.get("version") else {
            return legacy::decode(exam_type, &object, labels);
        };
        let version = version.as_u64().ok_or_else(|| {
            WireError::Translation("envelope version must be a non-negative integer".into())
        })?;

        match version {
            LEGACY_VERSION => {
                let envelope: EnvelopeWire = strict(Value::Object(object), "Envelope")?;
                check_exam_type(exam_type, envelope.exam_type)?;
                let Value::Object(payload) = envelope.payload else {
                    return Err(WireError::NotAnObject);
                };
                let mut decoded = legacy::decode(exam_type, &payload, labels)?;
                decoded.data.saved_at = envelope.saved_at;
                Ok(decoded)
            }
            CURRENT_VERSION => {
                let envelope: EnvelopeWire = strict(Value::Object(object), "Envelope")?;
                check_exam_type(exam_type, envelope.exam_type)?;
                let data = decode_v2(exam_type, envelope.saved_at, envelope.payload)?;
                Ok(Decoded {
                    data,
                    version: CURRENT_VERSION,
                    warnings: Vec::new(),
                })
            }
            other => Err(WireError::UnsupportedVersion(other)),
        }
    }

    /// Render a report as a current-version envelope.
    ///
    /// Blank-only line sequences are written as `[]`. Echography lines are tagged by role and
    /// Doppler fields are nested in the `doppler` envelope field.
    ///
    /// # Errors
    ///
    /// Returns [`WireError::InvalidInput`] if the subtype or a field key is blank, and
    /// [`WireError::InvalidJson`] if serialization fails.
    pub fn render(data: &ReportData) -> WireResult<String> {
        if data.sub_type.trim().is_empty() {
            return Err(WireError::InvalidInput("sub_type cannot be empty".into()));
        }
        if let Some(key) = data.fields.keys().find(|key| key.trim().is_empty()) {
            return Err(WireError::InvalidInput(format!(
                "field key cannot be blank: '{key}'"
            )));
        }

        let payload = match data.exam_type {
            ExamType::Echography => serde_json::to_value(PlainPayload {
                sub_type: data.sub_type.clone(),
                fields: data
                    .fields
                    .iter()
                    .map(|(key, lines)| (key.clone(), tag_lines(key, collapse_for_storage(lines))))
                    .collect(),
                bold_fields: data.bold_fields.clone(),
                hidden_fields: data.hidden_fields.clone(),
                custom_fields: data.custom_fields.clone(),
            })?,
            ExamType::Doppler => serde_json::to_value(DopplerPayload {
                sub_type: data.sub_type.clone(),
                doppler: DopplerEnvelope {
                    fields: collapsed(&data.fields),
                },
                bold_fields: data.bold_fields.clone(),
                hidden_fields: data.hidden_fields.clone(),
                custom_fields: data.custom_fields.clone(),
            })?,
            ExamType::Thyroid | ExamType::Ecg => serde_json::to_value(PlainPayload {
                sub_type: data.sub_type.clone(),
                fields: collapsed(&data.fields),
                bold_fields: data.bold_fields.clone(),
                hidden_fields: data.hidden_fields.clone(),
                custom_fields: data.custom_fields.clone(),
            })?,
        };

        let envelope = EnvelopeWire {
            version: CURRENT_VERSION,
            exam_type: data.exam_type,
            saved_at: data.saved_at,
            payload,
        };
        Ok(serde_json::to_string_pretty(&envelope)?)
    }
}

// ============================================================================
// Wire types (internal)
// ============================================================================

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
#[serde(deny_unknown_fields)]
struct EnvelopeWire {
    version: u64,
    exam_type: ExamType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    saved_at: Option<DateTime<Utc>>,
    payload: Value,
}

/// Payload for exam types whose fields sit directly under `fields`. `L` is the line
/// representation: plain strings, or tagged records for echography.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
struct PlainPayload<L> {
    sub_type: String,
    fields: BTreeMap<String, Vec<L>>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    bold_fields: BTreeMap<String, bool>,
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    hidden_fields: BTreeSet<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    custom_fields: Vec<CustomFieldData>,
}

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
struct DopplerPayload {
    sub_type: String,
    doppler: DopplerEnvelope,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    bold_fields: BTreeMap<String, bool>,
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    hidden_fields: BTreeSet<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    custom_fields: Vec<CustomFieldData>,
}

// ============================================================================
// Helpers
// ============================================================================

fn decode_v2(
    exam_type: ExamType,
    saved_at: Option<DateTime<Utc>>,
    payload: Value,
) -> WireResult<ReportData> {
    let mut data = match exam_type {
        ExamType::Echography => {
            let payload: PlainPayload<TaggedLine> = strict(payload, "Echography payload")?;
            let mut data = ReportData::new(exam_type, payload.sub_type);
            data.fields = payload
                .fields
                .into_iter()
                .map(|(key, lines)| {
                    let lines = lines.into_iter().map(TaggedLine::into_text).collect();
                    (key, lines)
                })
                .collect();
            data.bold_fields = payload.bold_fields;
            data.hidden_fields = payload.hidden_fields;
            data.custom_fields = payload.custom_fields;
            data
        }
        ExamType::Doppler => {
            let payload: DopplerPayload = strict(payload, "Doppler payload")?;
            let mut data = ReportData::new(exam_type, payload.sub_type);
            data.fields = payload.doppler.fields;
            data.bold_fields = payload.bold_fields;
            data.hidden_fields = payload.hidden_fields;
            data.custom_fields = payload.custom_fields;
            data
        }
        ExamType::Thyroid | ExamType::Ecg => {
            let payload: PlainPayload<String> = strict(payload, "Payload")?;
            let mut data = ReportData::new(exam_type, payload.sub_type);
            data.fields = payload.fields;
            data.bold_fields = payload.bold_fields;
            data.hidden_fields = payload.hidden_fields;
            data.custom_fields = payload.custom_fields;
            data
        }
    };

    for lines in data.fields.values_mut() {
        *lines = non_empty(std::mem::take(lines));
    }
    data.saved_at = saved_at;
    Ok(data)
}

/// Deserializes `value` into `T`, reporting the path of the first mismatching member.
fn strict<T: DeserializeOwned>(value: Value, what: &str) -> WireResult<T> {
    serde_path_to_error::deserialize::<_, T>(value).map_err(|err| {
        let path = err.path().to_string();
        let source = err.into_inner();
        let path = if path.is_empty() || path == "." {
            "<root>"
        } else {
            path.as_str()
        };
        WireError::Translation(format!("{what} schema mismatch at {path}: {source}"))
    })
}

fn check_exam_type(expected: ExamType, found: ExamType) -> WireResult<()> {
    if expected != found {
        return Err(WireError::ExamTypeMismatch { expected, found });
    }
    Ok(())
}

fn collapsed(fields: &BTreeMap<String, Vec<String>>) -> BTreeMap<String, Vec<String>> {
    fields
        .iter()
        .map(|(key, lines)| (key.clone(), collapse_for_storage(lines)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample(exam_type: ExamType, sub_type: &str) -> ReportData {
        let mut data = ReportData::new(exam_type, sub_type);
        data.fields.insert("Technique".into(), vec!["Sonde 12 MHz".into()]);
        data.fields.insert(
            "Conclusion".into(),
            vec!["Examen normal".into(), "".into(), "Pas de nodule".into()],
        );
        data.fields.insert(
            "custom_550e8400e29b41d4a716446655440000".into(),
            vec!["Voir dossier".into()],
        );
        data.bold_fields.insert("Conclusion".into(), true);
        data.bold_fields.insert("Technique".into(), false);
        data.custom_fields.push(CustomFieldData {
            key: "custom_550e8400e29b41d4a716446655440000".into(),
            label: "Note spéciale".into(),
        });
        data.saved_at = Some("2026-03-02T09:30:00Z".parse().expect("timestamp"));
        data
    }

    #[test]
    fn test_round_trips_thyroid_ecg_and_echography() {
        for (exam_type, sub_type) in [
            (ExamType::Thyroid, "avec_schema"),
            (ExamType::Ecg, "repos"),
            (ExamType::Echography, "abdominale"),
        ] {
            let data = sample(exam_type, sub_type);
            let text = ReportDocument::render(&data).expect("render");
            let decoded =
                ReportDocument::parse(exam_type, &text, &LabelIndex::default()).expect("parse");

            assert_eq!(decoded.version, CURRENT_VERSION);
            assert_eq!(decoded.data, data, "round trip for {exam_type}");
        }
    }

    #[test]
    fn test_thyroid_fields_are_plain_string_arrays() {
        let text = ReportDocument::render(&sample(ExamType::Thyroid, "avec_schema")).expect("render");
        let value: Value = serde_json::from_str(&text).expect("json");

        assert_eq!(value["version"], json!(2));
        assert_eq!(value["exam_type"], json!("thyroid"));
        assert_eq!(value["payload"]["fields"]["Technique"], json!(["Sonde 12 MHz"]));
    }

    #[test]
    fn test_echography_lines_are_tagged_by_field_key() {
        let mut data = ReportData::new(ExamType::Echography, "abdominale");
        data.fields.insert("foie".into(), vec!["Foie normal".into()]);
        data.fields.insert("Conclusion".into(), vec!["Examen normal".into()]);
        data.fields.insert("conduite_a_tenir".into(), vec!["Contrôle".into()]);

        let text = ReportDocument::render(&data).expect("render");
        let value: Value = serde_json::from_str(&text).expect("json");
        let fields = &value["payload"]["fields"];

        assert_eq!(fields["foie"], json!([{ "desc": "Foie normal" }]));
        assert_eq!(fields["Conclusion"], json!([{ "conc": "Examen normal" }]));
        assert_eq!(fields["conduite_a_tenir"], json!([{ "cat": "Contrôle" }]));
    }

    #[test]
    fn test_doppler_fields_are_nested_and_key_keyed() {
        let mut data = ReportData::new(ExamType::Doppler, "arteriel_mi");
        data.fields.insert("aorte".into(), vec!["Calibre normal".into()]);

        let text = ReportDocument::render(&data).expect("render");
        let value: Value = serde_json::from_str(&text).expect("json");

        assert_eq!(
            value["payload"]["doppler"]["fields"]["aorte"],
            json!(["Calibre normal"])
        );
        assert!(value["payload"].get("fields").is_none());

        let decoded =
            ReportDocument::parse(ExamType::Doppler, &text, &LabelIndex::default()).expect("parse");
        assert_eq!(decoded.data, data);
    }

    #[test]
    fn test_blank_only_fields_persist_as_empty_arrays_and_reload_as_one_blank_line() {
        let mut data = ReportData::new(ExamType::Thyroid, "sans_schema");
        data.fields.insert("Technique".into(), vec!["".into(), "  ".into()]);

        let text = ReportDocument::render(&data).expect("render");
        let value: Value = serde_json::from_str(&text).expect("json");
        assert_eq!(value["payload"]["fields"]["Technique"], json!([]));

        let decoded =
            ReportDocument::parse(ExamType::Thyroid, &text, &LabelIndex::default()).expect("parse");
        assert_eq!(decoded.data.fields["Technique"], vec![""]);
    }

    #[test]
    fn test_rejects_unknown_payload_keys_with_path() {
        let text = r#"{
            "version": 2,
            "exam_type": "thyroid",
            "payload": { "sub_type": "avec_schema", "fields": {}, "unexpected_key": 1 }
        }"#;

        let err = ReportDocument::parse(ExamType::Thyroid, text, &LabelIndex::default())
            .expect_err("should reject unknown key");
        match err {
            WireError::Translation(msg) => {
                assert!(msg.contains("unexpected_key") || msg.contains("unknown field"));
            }
            other => panic!("expected Translation error, got {other:?}"),
        }
    }

    #[test]
    fn test_rejects_wrong_line_types() {
        let text = r#"{
            "version": 2,
            "exam_type": "ecg",
            "payload": { "sub_type": "repos", "fields": { "Rythme": "Sinusal" } }
        }"#;

        let err = ReportDocument::parse(ExamType::Ecg, text, &LabelIndex::default())
            .expect_err("should reject wrong type");
        match err {
            WireError::Translation(msg) => assert!(msg.contains("Rythme")),
            other => panic!("expected Translation error, got {other:?}"),
        }
    }

    #[test]
    fn test_rejects_unsupported_version_and_exam_mismatch() {
        let future = r#"{ "version": 9, "exam_type": "ecg", "payload": {} }"#;
        assert!(matches!(
            ReportDocument::parse(ExamType::Ecg, future, &LabelIndex::default()),
            Err(WireError::UnsupportedVersion(9))
        ));

        let text = ReportDocument::render(&ReportData::new(ExamType::Ecg, "repos")).expect("render");
        assert!(matches!(
            ReportDocument::parse(ExamType::Thyroid, &text, &LabelIndex::default()),
            Err(WireError::ExamTypeMismatch { .. })
        ));
    }

    #[test]
    fn test_unversioned_documents_use_the_legacy_adapter() {
        let text = r#"{ "subType": "repos", "Rythme": "[\"Sinusal\"]" }"#;
        let decoded =
            ReportDocument::parse(ExamType::Ecg, text, &LabelIndex::default()).expect("parse");

        assert_eq!(decoded.version, 1);
        assert_eq!(decoded.data.fields["Rythme"], vec!["Sinusal"]);
    }

    #[test]
    fn test_version_one_envelope_dispatches_to_legacy_payload() {
        let text = r#"{
            "version": 1,
            "exam_type": "doppler",
            "payload": { "subType": "veineux_mi", "dopplerData": { "Veine fémorale": ["Perméable"] } }
        }"#;
        let labels = LabelIndex::new([("vf", "Veine fémorale")]);

        let decoded = ReportDocument::parse(ExamType::Doppler, text, &labels).expect("parse");

        assert_eq!(decoded.version, 1);
        assert_eq!(decoded.data.fields["vf"], vec!["Perméable"]);
    }

    #[test]
    fn test_rejects_non_object_documents() {
        assert!(matches!(
            ReportDocument::parse(ExamType::Ecg, "[1,2]", &LabelIndex::default()),
            Err(WireError::NotAnObject)
        ));
        assert!(matches!(
            ReportDocument::parse(ExamType::Ecg, "not json", &LabelIndex::default()),
            Err(WireError::InvalidJson(_))
        ));
    }
}
