//! Report resolution.
//!
//! When an editor opens, the report is built from the first source that applies:
//! 1. the saved report, if it was saved under the requested subtype
//! 2. the subtype template, if any template field has default content
//! 3. the hardcoded fallback fields of the exam type
//!
//! Failures along the way never abort resolution. Each one degrades to the next source and is
//! returned as a [`Notice`].

use crate::catalog::{TemplateCatalog, TemplateSet};
use crate::consultation::ConsultationId;
use crate::fallback::fallback_templates;
use crate::report::{FieldState, Report};
use crate::store::PersistenceStore;
use crate::{ReportError, ReportResult};
use report_types::{ExamType, SubType};
use report_wire::{LabelIndex, ReportDocument, WireWarning};
use serde::Serialize;
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

/// Where the resolved report came from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolutionSource {
    Saved,
    Template,
    Fallback,
}

/// A non-fatal problem met during resolution.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Notice {
    /// The template could not be fetched; defaults came from the fallback set.
    TemplateFetchFailure { message: String },
    /// The saved report could not be loaded or decoded; defaults were used instead.
    ReportLoadFailure { message: String },
    /// A saved field could not be mapped back to a key and was dropped.
    SerializationAmbiguity { message: String },
    /// The template exists but has no default content; the fallback set was used.
    NoTemplateContent { sub_type: String },
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Notice::TemplateFetchFailure { message } => {
                write!(f, "template fetch failed: {message}")
            }
            Notice::ReportLoadFailure { message } => write!(f, "report load failed: {message}"),
            Notice::SerializationAmbiguity { message } => write!(f, "field dropped: {message}"),
            Notice::NoTemplateContent { sub_type } => {
                write!(f, "no template content for subtype {sub_type}; using fallback fields")
            }
        }
    }
}

/// Outcome of [`ResolutionEngine::resolve`].
#[derive(Clone, Debug)]
pub struct Resolution {
    pub report: Report,
    pub source: ResolutionSource,
    pub notices: Vec<Notice>,
}

/// Builds the initial report for an editor from saved data, templates and fallbacks.
#[derive(Debug)]
pub struct ResolutionEngine<C, P> {
    catalog: Arc<C>,
    store: Arc<P>,
    io_timeout: Duration,
}

impl<C, P> Clone for ResolutionEngine<C, P> {
    fn clone(&self) -> Self {
        Self {
            catalog: Arc::clone(&self.catalog),
            store: Arc::clone(&self.store),
            io_timeout: self.io_timeout,
        }
    }
}

impl<C: TemplateCatalog, P: PersistenceStore> ResolutionEngine<C, P> {
    pub fn new(catalog: Arc<C>, store: Arc<P>, io_timeout: Duration) -> Self {
        Self {
            catalog,
            store,
            io_timeout,
        }
    }

    /// Resolves the report for (`consultation_id`, `sub_type`).
    ///
    /// The template is always fetched first: it is cached on the report for field resets and
    /// maps legacy Doppler labels back to keys.
    pub async fn resolve(
        &self,
        consultation_id: &ConsultationId,
        sub_type: SubType,
    ) -> Resolution {
        let exam_type = sub_type.exam_type();
        let mut notices = Vec::new();

        let templates = match self.fetch_templates(sub_type).await {
            Ok(templates) => Some(templates),
            Err(err) => {
                push_notice(
                    &mut notices,
                    Notice::TemplateFetchFailure {
                        message: err.to_string(),
                    },
                );
                None
            }
        };

        // A missing or blank template is replaced by the fallback fields in every branch.
        let effective = match &templates {
            Some(templates) if templates.has_content() => templates.clone(),
            _ => fallback_templates(exam_type),
        };

        let loaded = with_timeout(
            self.io_timeout,
            "report load",
            self.store.load_report(consultation_id, exam_type),
        )
        .await;

        match loaded {
            Ok(Some(document)) => {
                let labels = effective.label_index();
                match ReportDocument::parse(exam_type, &document, &labels) {
                    Ok(decoded) if decoded.data.sub_type == sub_type.as_str() => {
                        for warning in &decoded.warnings {
                            push_notice(&mut notices, ambiguity(warning));
                        }
                        tracing::debug!(
                            "resolved {consultation_id}/{exam_type}/{sub_type} from saved report (v{})",
                            decoded.version
                        );
                        let report = Report::from_data(
                            consultation_id.clone(),
                            sub_type,
                            effective,
                            decoded.data,
                            FieldState::Saved,
                        );
                        return Resolution {
                            report,
                            source: ResolutionSource::Saved,
                            notices,
                        };
                    }
                    Ok(decoded) => {
                        tracing::debug!(
                            "saved report for {consultation_id}/{exam_type} is subtype {}, requested {sub_type}; not reused",
                            decoded.data.sub_type
                        );
                    }
                    Err(err) => push_notice(
                        &mut notices,
                        Notice::ReportLoadFailure {
                            message: err.to_string(),
                        },
                    ),
                }
            }
            Ok(None) => {}
            Err(err) => push_notice(
                &mut notices,
                Notice::ReportLoadFailure {
                    message: err.to_string(),
                },
            ),
        }

        let source = match &templates {
            Some(templates) if templates.has_content() => ResolutionSource::Template,
            Some(_) => {
                push_notice(
                    &mut notices,
                    Notice::NoTemplateContent {
                        sub_type: sub_type.to_string(),
                    },
                );
                ResolutionSource::Fallback
            }
            None => ResolutionSource::Fallback,
        };
        tracing::debug!("resolved {consultation_id}/{exam_type}/{sub_type} from {source:?}");
        Resolution {
            report: Report::from_templates(consultation_id.clone(), sub_type, effective),
            source,
            notices,
        }
    }

    /// Subtype of the saved report for (`consultation_id`, `exam_type`), if one is stored and
    /// decodes.
    ///
    /// Lets callers that were given no subtype reopen what was last saved.
    pub async fn saved_sub_type(
        &self,
        consultation_id: &ConsultationId,
        exam_type: ExamType,
    ) -> Option<SubType> {
        let loaded = with_timeout(
            self.io_timeout,
            "report load",
            self.store.load_report(consultation_id, exam_type),
        )
        .await;
        let document = match loaded {
            Ok(document) => document?,
            Err(err) => {
                tracing::warn!("looking up saved subtype for {consultation_id}/{exam_type}: {err}");
                return None;
            }
        };
        let decoded = ReportDocument::parse(exam_type, &document, &LabelIndex::default()).ok()?;
        SubType::parse(exam_type, &decoded.data.sub_type).ok()
    }

    /// Fetches the template for `sub_type`, bounded by the I/O timeout.
    pub async fn fetch_templates(&self, sub_type: SubType) -> ReportResult<TemplateSet> {
        with_timeout(
            self.io_timeout,
            "template fetch",
            self.catalog.get_templates(sub_type),
        )
        .await
    }
}

/// Awaits `future`, failing with [`ReportError::Timeout`] once `limit` has elapsed.
pub(crate) async fn with_timeout<T>(
    limit: Duration,
    operation: &'static str,
    future: impl Future<Output = ReportResult<T>>,
) -> ReportResult<T> {
    match tokio::time::timeout(limit, future).await {
        Ok(result) => result,
        Err(_) => Err(ReportError::Timeout {
            operation,
            after: limit,
        }),
    }
}

fn ambiguity(warning: &WireWarning) -> Notice {
    Notice::SerializationAmbiguity {
        message: warning.to_string(),
    }
}

fn push_notice(notices: &mut Vec<Notice>, notice: Notice) {
    tracing::warn!("{notice}");
    notices.push(notice);
}
