//! Report persistence.
//!
//! Stores deal in raw documents; encoding and decoding happen in `report_wire`. One document
//! exists per (consultation, exam type) and the last write wins.

use crate::constants::REPORT_FILE_EXTENSION;
use crate::consultation::ConsultationId;
use crate::{ReportError, ReportResult};
use report_types::ExamType;
use report_uuid::Uuid;
use std::collections::HashMap;
use std::future::Future;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::sync::RwLock;

/// Durable storage of report documents.
pub trait PersistenceStore: Send + Sync {
    /// Returns the stored document, or `None` if the report was never saved.
    fn load_report(
        &self,
        consultation_id: &ConsultationId,
        exam_type: ExamType,
    ) -> impl Future<Output = ReportResult<Option<String>>> + Send;

    /// Replaces the stored document. A failed save must leave the previous document intact.
    fn save_report(
        &self,
        consultation_id: &ConsultationId,
        exam_type: ExamType,
        document: String,
    ) -> impl Future<Output = ReportResult<()>> + Send;
}

// ============================================================================
// JSON file store
// ============================================================================

/// Stores each report at `<reports_dir>/<consultation_id>/<exam_type>.json`.
///
/// Writes go to a temporary sibling file which is then renamed over the target, so readers
/// never observe a partially written document.
#[derive(Clone, Debug)]
pub struct FileReportStore {
    reports_dir: PathBuf,
}

impl FileReportStore {
    pub fn new(reports_dir: impl Into<PathBuf>) -> Self {
        Self {
            reports_dir: reports_dir.into(),
        }
    }

    pub fn reports_dir(&self) -> &Path {
        &self.reports_dir
    }

    /// Path of the document for (`consultation_id`, `exam_type`).
    pub fn report_path(&self, consultation_id: &ConsultationId, exam_type: ExamType) -> PathBuf {
        self.reports_dir
            .join(consultation_id.as_str())
            .join(format!("{}.{REPORT_FILE_EXTENSION}", exam_type.as_str()))
    }
}

impl PersistenceStore for FileReportStore {
    async fn load_report(
        &self,
        consultation_id: &ConsultationId,
        exam_type: ExamType,
    ) -> ReportResult<Option<String>> {
        let path = self.report_path(consultation_id, exam_type);
        match tokio::fs::read_to_string(&path).await {
            Ok(text) => Ok(Some(text)),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
            Err(err) => Err(ReportError::FileRead(err)),
        }
    }

    async fn save_report(
        &self,
        consultation_id: &ConsultationId,
        exam_type: ExamType,
        document: String,
    ) -> ReportResult<()> {
        let path = self.report_path(consultation_id, exam_type);
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(ReportError::StorageDirCreation)?;
        }

        // One temporary file per save.
        let tmp_path = path.with_extension(format!(
            "{REPORT_FILE_EXTENSION}.{}.tmp",
            Uuid::new_v4().simple()
        ));
        if let Err(err) = tokio::fs::write(&tmp_path, document.as_bytes()).await {
            let _ = tokio::fs::remove_file(&tmp_path).await;
            return Err(ReportError::FileWrite(err));
        }
        if let Err(err) = tokio::fs::rename(&tmp_path, &path).await {
            let _ = tokio::fs::remove_file(&tmp_path).await;
            return Err(ReportError::FileWrite(err));
        }

        tracing::debug!("wrote {}", path.display());
        Ok(())
    }
}

// ============================================================================
// In-memory store
// ============================================================================

/// Store keeping documents in memory, for tests and embedders.
#[derive(Debug, Default)]
pub struct InMemoryReportStore {
    documents: RwLock<HashMap<(ConsultationId, ExamType), String>>,
}

impl InMemoryReportStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds a raw document, e.g. a legacy record.
    pub async fn insert(
        &self,
        consultation_id: ConsultationId,
        exam_type: ExamType,
        document: impl Into<String>,
    ) {
        self.documents
            .write()
            .await
            .insert((consultation_id, exam_type), document.into());
    }

    /// Returns the raw stored document, if any.
    pub async fn document(
        &self,
        consultation_id: &ConsultationId,
        exam_type: ExamType,
    ) -> Option<String> {
        self.documents
            .read()
            .await
            .get(&(consultation_id.clone(), exam_type))
            .cloned()
    }
}

impl PersistenceStore for InMemoryReportStore {
    async fn load_report(
        &self,
        consultation_id: &ConsultationId,
        exam_type: ExamType,
    ) -> ReportResult<Option<String>> {
        Ok(self.document(consultation_id, exam_type).await)
    }

    async fn save_report(
        &self,
        consultation_id: &ConsultationId,
        exam_type: ExamType,
        document: String,
    ) -> ReportResult<()> {
        self.insert(consultation_id.clone(), exam_type, document)
            .await;
        Ok(())
    }
}
