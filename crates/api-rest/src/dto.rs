//! REST request and response bodies.
//!
//! These mirror the core types with plain strings so they can be described in the OpenAPI
//! document; conversion happens at the handler boundary.

use chrono::{DateTime, Utc};
use report_core::{
    ExamType, FieldState, Notice, PrintSnapshot, Report, ReportData, Resolution,
    ResolutionSource,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use utoipa::{IntoParams, ToSchema};

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct HealthRes {
    pub ok: bool,
    pub message: String,
}

/// Optional subtype selector; the subtype last saved for the report is used when absent.
#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct SubTypeQuery {
    pub sub_type: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct FieldDto {
    pub key: String,
    /// Template or custom label, when one is known.
    pub label: Option<String>,
    pub lines: Vec<String>,
    pub bold: bool,
    pub hidden: bool,
    pub custom: bool,
    /// `template_default`, `user_edited` or `saved`.
    pub state: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ReportDto {
    pub consultation_id: String,
    pub exam_type: String,
    pub sub_type: String,
    /// Every field in display order, hidden ones included.
    pub fields: Vec<FieldDto>,
    pub saved_at: Option<DateTime<Utc>>,
    pub unsaved_changes: bool,
}

impl From<&Report> for ReportDto {
    fn from(report: &Report) -> Self {
        let fields = report
            .keys()
            .filter_map(|key| {
                let entry = report.field(key.as_str())?;
                Some(FieldDto {
                    key: key.to_string(),
                    label: report.label(key.as_str()).map(str::to_string),
                    lines: entry.lines().to_vec(),
                    bold: report.is_bold(key.as_str()),
                    hidden: report.is_hidden(key.as_str()),
                    custom: report.is_custom(key.as_str()),
                    state: state_name(entry.state()).to_string(),
                })
            })
            .collect();

        Self {
            consultation_id: report.consultation_id().to_string(),
            exam_type: report.exam_type().to_string(),
            sub_type: report.sub_type().to_string(),
            fields,
            saved_at: report.saved_at(),
            unsaved_changes: report.has_unsaved_changes(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct NoticeDto {
    /// `template_fetch_failure`, `report_load_failure`, `serialization_ambiguity` or
    /// `no_template_content`.
    pub kind: String,
    pub message: String,
}

impl From<&Notice> for NoticeDto {
    fn from(notice: &Notice) -> Self {
        let kind = match notice {
            Notice::TemplateFetchFailure { .. } => "template_fetch_failure",
            Notice::ReportLoadFailure { .. } => "report_load_failure",
            Notice::SerializationAmbiguity { .. } => "serialization_ambiguity",
            Notice::NoTemplateContent { .. } => "no_template_content",
        };
        Self {
            kind: kind.into(),
            message: notice.to_string(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ResolutionRes {
    /// `saved`, `template` or `fallback`.
    pub source: String,
    pub notices: Vec<NoticeDto>,
    pub report: ReportDto,
}

impl From<&Resolution> for ResolutionRes {
    fn from(resolution: &Resolution) -> Self {
        let source = match resolution.source {
            ResolutionSource::Saved => "saved",
            ResolutionSource::Template => "template",
            ResolutionSource::Fallback => "fallback",
        };
        Self {
            source: source.into(),
            notices: resolution.notices.iter().map(NoticeDto::from).collect(),
            report: ReportDto::from(&resolution.report),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct CustomFieldDto {
    pub key: String,
    pub label: String,
}

/// An edited report document submitted for saving.
///
/// Custom field content lives in `fields` under the custom key; `custom_fields` carries the
/// registrations.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct SaveReportReq {
    pub sub_type: String,
    pub fields: BTreeMap<String, Vec<String>>,
    #[serde(default)]
    pub bold_fields: BTreeMap<String, bool>,
    #[serde(default)]
    pub hidden_fields: Vec<String>,
    #[serde(default)]
    pub custom_fields: Vec<CustomFieldDto>,
}

impl SaveReportReq {
    pub fn into_data(self, exam_type: ExamType) -> ReportData {
        let mut data = ReportData::new(exam_type, self.sub_type);
        data.fields = self.fields;
        data.bold_fields = self.bold_fields;
        data.hidden_fields = self.hidden_fields.into_iter().collect();
        data.custom_fields = self
            .custom_fields
            .into_iter()
            .map(|custom| report_core::CustomFieldData {
                key: custom.key,
                label: custom.label,
            })
            .collect();
        data
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct PrintFieldDto {
    pub key: String,
    pub label: String,
    pub lines: Vec<String>,
    pub bold: bool,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct PrintSnapshotDto {
    pub exam_type: String,
    pub sub_type: String,
    pub fields: Vec<PrintFieldDto>,
}

impl From<PrintSnapshot> for PrintSnapshotDto {
    fn from(snapshot: PrintSnapshot) -> Self {
        let fields = snapshot
            .fields
            .into_iter()
            .map(|field| {
                let bold = snapshot
                    .bold_fields
                    .get(field.key.as_str())
                    .copied()
                    .unwrap_or(false);
                PrintFieldDto {
                    key: field.key.to_string(),
                    label: field.label,
                    lines: field.lines,
                    bold,
                }
            })
            .collect();

        Self {
            exam_type: snapshot.exam_type.to_string(),
            sub_type: snapshot.sub_type.to_string(),
            fields,
        }
    }
}

fn state_name(state: FieldState) -> &'static str {
    match state {
        FieldState::TemplateDefault => "template_default",
        FieldState::UserEdited => "user_edited",
        FieldState::Saved => "saved",
    }
}
