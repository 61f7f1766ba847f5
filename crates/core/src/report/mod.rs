//! In-session report model.
//!
//! A [`Report`] is the mutable document an editor works on for one consultation and exam type.
//! It combines three concerns over one set of field keys:
//! - the field store: ordered lines per field ([`fields`] operations)
//! - the attribute overlay: bold and hidden flags ([`attributes`] operations)
//! - the custom field registry: user-added fields with generated keys ([`custom`] operations)
//!
//! The template used to build the report is kept alongside it so single fields can be reset to
//! their default content later.

mod attributes;
mod custom;
mod fields;
mod snapshot;

pub use snapshot::{PrintField, PrintSnapshot};

use crate::catalog::TemplateSet;
use crate::consultation::ConsultationId;
use crate::{ReportError, ReportResult};
use chrono::{DateTime, Utc};
use report_types::{ExamType, FieldKey, NonEmptyText, SubType};
use report_wire::{CustomFieldData, ReportData};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

/// Lifecycle of a field's content.
///
/// Visibility is tracked separately and does not affect the state.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldState {
    /// Content comes straight from a template or the fallback defaults.
    TemplateDefault,
    /// Content was changed during this session and not yet saved.
    UserEdited,
    /// Content matches what was last loaded from or written to the store.
    Saved,
}

/// Content of one field.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FieldEntry {
    lines: Vec<String>,
    state: FieldState,
}

impl FieldEntry {
    fn new(lines: Vec<String>, state: FieldState) -> Self {
        Self {
            lines: non_empty_lines(lines),
            state,
        }
    }

    /// Ordered lines; never empty.
    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    pub fn state(&self) -> FieldState {
        self.state
    }
}

/// A user-added field.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct CustomField {
    pub key: FieldKey,
    pub label: NonEmptyText,
}

/// Outcome of [`Report::reset_field_to_template`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ResetOutcome {
    /// Content was replaced by the template default.
    Reset,
    /// The template has no non-blank content for this key; nothing changed.
    NoTemplateContent,
}

/// One consultation's report for one exam type.
#[derive(Clone, Debug)]
pub struct Report {
    consultation_id: ConsultationId,
    sub_type: SubType,
    fields: BTreeMap<FieldKey, FieldEntry>,
    /// Display order: template fields, then custom fields, then any other saved keys.
    order: Vec<FieldKey>,
    bold_fields: BTreeMap<FieldKey, bool>,
    hidden_fields: BTreeMap<FieldKey, bool>,
    custom_fields: Vec<CustomField>,
    /// Custom keys removed during this session; never reissued.
    retired_keys: BTreeSet<FieldKey>,
    templates: TemplateSet,
    saved_at: Option<DateTime<Utc>>,
}

impl Report {
    /// Builds a fresh report from template defaults.
    ///
    /// Empty defaults become `[""]`. Conclusion-family fields start bold, every other field
    /// starts not bold. Nothing is hidden and there are no custom fields.
    pub(crate) fn from_templates(
        consultation_id: ConsultationId,
        sub_type: SubType,
        templates: TemplateSet,
    ) -> Self {
        let mut fields = BTreeMap::new();
        let mut order = Vec::new();
        let mut bold_fields = BTreeMap::new();

        for template in templates.fields() {
            fields.insert(
                template.key.clone(),
                FieldEntry::new(template.lines.clone(), FieldState::TemplateDefault),
            );
            bold_fields.insert(template.key.clone(), template.key.is_conclusion());
            order.push(template.key.clone());
        }

        Self {
            consultation_id,
            sub_type,
            fields,
            order,
            bold_fields,
            hidden_fields: BTreeMap::new(),
            custom_fields: Vec::new(),
            retired_keys: BTreeSet::new(),
            templates,
            saved_at: None,
        }
    }

    /// Builds a report from decoded persisted (or imported) data.
    ///
    /// Content is taken verbatim. Template keys missing from `data` are added as `[""]` and keys
    /// unknown to the template are kept. Custom field registrations that are blank, duplicated or
    /// that shadow a template key are dropped with a warning.
    pub(crate) fn from_data(
        consultation_id: ConsultationId,
        sub_type: SubType,
        templates: TemplateSet,
        data: ReportData,
        state: FieldState,
    ) -> Self {
        let mut fields = BTreeMap::new();
        for (key, lines) in data.fields {
            match FieldKey::new(&key) {
                Ok(key) => {
                    fields.insert(key, FieldEntry::new(lines, state));
                }
                Err(_) => tracing::warn!("dropping field with blank key"),
            }
        }

        let mut custom_fields: Vec<CustomField> = Vec::new();
        for custom in data.custom_fields {
            let (Ok(key), Ok(label)) = (
                FieldKey::new(&custom.key),
                NonEmptyText::new(&custom.label),
            ) else {
                tracing::warn!("dropping custom field with blank key or label: {:?}", custom.key);
                continue;
            };
            if templates.get(key.as_str()).is_some() {
                tracing::warn!("custom field key {key} shadows a template field; registration dropped");
                continue;
            }
            if custom_fields.iter().any(|existing| existing.key == key) {
                tracing::warn!("duplicate custom field key {key}; keeping the first registration");
                continue;
            }
            fields
                .entry(key.clone())
                .or_insert_with(|| FieldEntry::new(Vec::new(), state));
            custom_fields.push(CustomField { key, label });
        }

        let mut order = Vec::new();
        for template in templates.fields() {
            fields
                .entry(template.key.clone())
                .or_insert_with(|| FieldEntry::new(Vec::new(), state));
            order.push(template.key.clone());
        }
        order.extend(custom_fields.iter().map(|custom| custom.key.clone()));
        let remaining: Vec<FieldKey> = fields
            .keys()
            .filter(|key| !order.contains(key))
            .cloned()
            .collect();
        order.extend(remaining);

        let bold_fields = data
            .bold_fields
            .into_iter()
            .filter_map(|(key, bold)| FieldKey::new(&key).ok().map(|key| (key, bold)))
            .collect();
        let hidden_fields = data
            .hidden_fields
            .into_iter()
            .filter_map(|key| FieldKey::new(&key).ok().map(|key| (key, true)))
            .collect();

        Self {
            consultation_id,
            sub_type,
            fields,
            order,
            bold_fields,
            hidden_fields,
            custom_fields,
            retired_keys: BTreeSet::new(),
            templates,
            saved_at: data.saved_at,
        }
    }

    pub fn consultation_id(&self) -> &ConsultationId {
        &self.consultation_id
    }

    pub fn exam_type(&self) -> ExamType {
        self.sub_type.exam_type()
    }

    pub fn sub_type(&self) -> SubType {
        self.sub_type
    }

    /// Active field keys in display order, hidden fields included.
    pub fn keys(&self) -> impl Iterator<Item = &FieldKey> {
        self.order.iter()
    }

    pub fn field(&self, key: &str) -> Option<&FieldEntry> {
        self.fields.get(key)
    }

    /// Lines of `key`.
    ///
    /// # Errors
    ///
    /// Returns [`ReportError::UnknownField`] if `key` is not an active field.
    pub fn lines(&self, key: &str) -> ReportResult<&[String]> {
        self.fields
            .get(key)
            .map(FieldEntry::lines)
            .ok_or_else(|| ReportError::UnknownField(key.to_string()))
    }

    /// Human-readable label: the custom label, else the template label.
    pub fn label(&self, key: &str) -> Option<&str> {
        self.custom_fields
            .iter()
            .find(|custom| custom.key.as_str() == key)
            .map(|custom| custom.label.as_str())
            .or_else(|| self.templates.get(key).map(|template| template.label.as_str()))
    }

    pub fn custom_fields(&self) -> &[CustomField] {
        &self.custom_fields
    }

    pub fn is_custom(&self, key: &str) -> bool {
        self.custom_fields
            .iter()
            .any(|custom| custom.key.as_str() == key)
    }

    /// Template the report was built from, kept for field resets.
    pub fn templates(&self) -> &TemplateSet {
        &self.templates
    }

    /// Time of the last successful save, if any.
    pub fn saved_at(&self) -> Option<DateTime<Utc>> {
        self.saved_at
    }

    /// Returns true if any field has unsaved changes.
    pub fn has_unsaved_changes(&self) -> bool {
        self.fields
            .values()
            .any(|entry| entry.state == FieldState::UserEdited)
    }

    /// Converts the report into its persisted form.
    ///
    /// Hidden fields keep their key, bold flag and custom registration but their content is not
    /// written; they reopen hidden and blank. Stale bold keys are carried over untouched.
    pub fn to_data(&self) -> ReportData {
        let mut data = ReportData::new(self.exam_type(), self.sub_type.as_str());

        for key in &self.order {
            if self.is_hidden(key.as_str()) {
                continue;
            }
            if let Some(entry) = self.fields.get(key) {
                data.fields.insert(key.to_string(), entry.lines.clone());
            }
        }
        data.bold_fields = self
            .bold_fields
            .iter()
            .map(|(key, bold)| (key.to_string(), *bold))
            .collect();
        data.hidden_fields = self.hidden_keys().map(FieldKey::to_string).collect();
        data.custom_fields = self
            .custom_fields
            .iter()
            .map(|custom| CustomFieldData {
                key: custom.key.to_string(),
                label: custom.label.to_string(),
            })
            .collect();
        data.saved_at = self.saved_at;
        data
    }

    /// Marks every field as saved at `at`.
    pub(crate) fn mark_saved(&mut self, at: DateTime<Utc>) {
        for entry in self.fields.values_mut() {
            entry.state = FieldState::Saved;
        }
        self.saved_at = Some(at);
    }

    fn entry_mut(&mut self, key: &str) -> ReportResult<&mut FieldEntry> {
        self.fields
            .get_mut(key)
            .ok_or_else(|| ReportError::UnknownField(key.to_string()))
    }

    fn known_key(&self, key: &str) -> ReportResult<FieldKey> {
        self.fields
            .get_key_value(key)
            .map(|(key, _)| key.clone())
            .ok_or_else(|| ReportError::UnknownField(key.to_string()))
    }
}

fn non_empty_lines(lines: Vec<String>) -> Vec<String> {
    if lines.is_empty() {
        vec![String::new()]
    } else {
        lines
    }
}
