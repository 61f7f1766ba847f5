//! Report service.
//!
//! Entry point used by the outer layers. It owns the configuration, the template catalog and
//! the persistence store, and exposes the editor lifecycle: open, save, import and print.

use crate::catalog::TemplateCatalog;
use crate::config::CoreConfig;
use crate::consultation::ConsultationId;
use crate::report::{FieldState, PrintSnapshot, Report};
use crate::resolution::{with_timeout, Resolution, ResolutionEngine};
use crate::store::PersistenceStore;
use crate::{ReportError, ReportResult};
use chrono::Utc;
use report_types::{ExamType, SubType};
use report_wire::{ReportData, ReportDocument};
use std::sync::Arc;

/// Report operations for one catalog and one store.
#[derive(Debug)]
pub struct ReportService<C, P> {
    cfg: Arc<CoreConfig>,
    engine: ResolutionEngine<C, P>,
    store: Arc<P>,
}

impl<C, P> Clone for ReportService<C, P> {
    fn clone(&self) -> Self {
        Self {
            cfg: Arc::clone(&self.cfg),
            engine: self.engine.clone(),
            store: Arc::clone(&self.store),
        }
    }
}

impl<C: TemplateCatalog, P: PersistenceStore> ReportService<C, P> {
    /// Creates a new `ReportService`.
    ///
    /// # Arguments
    ///
    /// * `cfg` - Core configuration; supplies the I/O timeout.
    /// * `catalog` - Template catalog used for resolution, imports and resets.
    /// * `store` - Persistence store for report documents.
    pub fn new(cfg: Arc<CoreConfig>, catalog: Arc<C>, store: Arc<P>) -> Self {
        let engine = ResolutionEngine::new(catalog, Arc::clone(&store), cfg.io_timeout());
        Self { cfg, engine, store }
    }

    pub fn config(&self) -> &CoreConfig {
        &self.cfg
    }

    /// Opens the report for an editor. Never fails; degradations are listed in the notices.
    pub async fn open(&self, consultation_id: &ConsultationId, sub_type: SubType) -> Resolution {
        self.engine.resolve(consultation_id, sub_type).await
    }

    /// Opens the report for `exam_type` under the subtype it was last saved with, or the exam
    /// type's default subtype when nothing usable is stored.
    pub async fn open_latest(
        &self,
        consultation_id: &ConsultationId,
        exam_type: ExamType,
    ) -> Resolution {
        let sub_type = self
            .engine
            .saved_sub_type(consultation_id, exam_type)
            .await
            .unwrap_or_else(|| exam_type.default_sub_type());
        self.open(consultation_id, sub_type).await
    }

    /// Encodes and persists `report`.
    ///
    /// Field states move to [`FieldState::Saved`] only once the store has accepted the
    /// document; on failure the report is left exactly as it was.
    ///
    /// # Errors
    ///
    /// Returns [`ReportError::Wire`] if the report cannot be encoded, [`ReportError::Timeout`]
    /// if the store does not answer in time, and [`ReportError::ReportSave`] for store failures.
    pub async fn save(&self, report: &mut Report) -> ReportResult<()> {
        let saved_at = Utc::now();
        let mut data = report.to_data();
        data.saved_at = Some(saved_at);
        let document = ReportDocument::render(&data)?;

        let exam_type = report.exam_type();
        let result = with_timeout(
            self.cfg.io_timeout(),
            "report save",
            self.store
                .save_report(report.consultation_id(), exam_type, document),
        )
        .await;

        match result {
            Ok(()) => {
                report.mark_saved(saved_at);
                tracing::info!(
                    "saved report {}/{exam_type}/{}",
                    report.consultation_id(),
                    report.sub_type()
                );
                Ok(())
            }
            Err(err @ ReportError::Timeout { .. }) => {
                tracing::error!("saving {}/{exam_type}: {err}", report.consultation_id());
                Err(err)
            }
            Err(err) => {
                tracing::error!("saving {}/{exam_type}: {err}", report.consultation_id());
                Err(ReportError::ReportSave(err.to_string()))
            }
        }
    }

    /// Builds a report from an externally edited document, using the current template for
    /// field order, labels and resets. The result is not saved.
    ///
    /// # Errors
    ///
    /// Returns an input error if the subtype is not offered by the exam type, and
    /// [`ReportError::TemplateFetch`] or [`ReportError::Timeout`] if the template is unavailable.
    pub async fn import(
        &self,
        consultation_id: &ConsultationId,
        data: ReportData,
    ) -> ReportResult<Report> {
        let sub_type = SubType::parse(data.exam_type, &data.sub_type)?;
        let templates = self.engine.fetch_templates(sub_type).await?;
        Ok(Report::from_data(
            consultation_id.clone(),
            sub_type,
            templates,
            data,
            FieldState::UserEdited,
        ))
    }

    pub fn print_snapshot(&self, report: &Report) -> PrintSnapshot {
        report.print_snapshot()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{InMemoryTemplateCatalog, TemplateField, TemplateSet};
    use crate::resolution::ResolutionSource;
    use crate::store::InMemoryReportStore;
    use std::future::Future;
    use std::time::Duration;

    struct FailingStore;

    impl PersistenceStore for FailingStore {
        async fn load_report(
            &self,
            _consultation_id: &ConsultationId,
            _exam_type: ExamType,
        ) -> ReportResult<Option<String>> {
            Ok(None)
        }

        fn save_report(
            &self,
            _consultation_id: &ConsultationId,
            _exam_type: ExamType,
            _document: String,
        ) -> impl Future<Output = ReportResult<()>> + Send {
            async {
                Err(ReportError::FileWrite(std::io::Error::other("disk full")))
            }
        }
    }

    fn cfg() -> Arc<CoreConfig> {
        Arc::new(
            CoreConfig::new("data".into(), "templates".into(), Duration::from_secs(5))
                .expect("valid config"),
        )
    }

    fn ecg_catalog() -> InMemoryTemplateCatalog {
        let sub_type = SubType::parse(ExamType::Ecg, "repos").expect("subtype");
        InMemoryTemplateCatalog::new().with_templates(
            sub_type,
            TemplateSet::new(vec![
                TemplateField::new("Rythme", "Rythme", vec!["Sinusal".into()]).expect("field"),
                TemplateField::new("Conclusion", "Conclusion", vec!["ECG normal".into()])
                    .expect("field"),
            ])
            .expect("set"),
        )
    }

    fn consultation() -> ConsultationId {
        ConsultationId::parse("cons-001").expect("valid consultation id")
    }

    #[tokio::test]
    async fn test_save_marks_fields_saved_and_persists_envelope() {
        let store = Arc::new(InMemoryReportStore::new());
        let service = ReportService::new(cfg(), Arc::new(ecg_catalog()), Arc::clone(&store));
        let sub_type = SubType::parse(ExamType::Ecg, "repos").expect("subtype");

        let mut report = service.open(&consultation(), sub_type).await.report;
        report.set_line("Rythme", 0, "Fibrillation atriale").expect("set");
        service.save(&mut report).await.expect("save");

        assert!(!report.has_unsaved_changes());
        assert!(report.saved_at().is_some());
        let document = store
            .document(&consultation(), ExamType::Ecg)
            .await
            .expect("stored");
        let value: serde_json::Value = serde_json::from_str(&document).expect("json");
        assert_eq!(value["version"], 2);
        assert_eq!(
            value["payload"]["fields"]["Rythme"],
            serde_json::json!(["Fibrillation atriale"])
        );
    }

    #[tokio::test]
    async fn test_failed_save_leaves_report_unchanged() {
        let service = ReportService::new(cfg(), Arc::new(ecg_catalog()), Arc::new(FailingStore));
        let sub_type = SubType::parse(ExamType::Ecg, "repos").expect("subtype");

        let mut report = service.open(&consultation(), sub_type).await.report;
        report.set_line("Rythme", 0, "Flutter").expect("set");

        let err = service.save(&mut report).await.expect_err("should fail");

        assert!(matches!(err, ReportError::ReportSave(msg) if msg.contains("disk full")));
        assert!(report.has_unsaved_changes());
        assert!(report.saved_at().is_none());
        assert_eq!(report.lines("Rythme").expect("lines"), ["Flutter"]);
    }

    #[tokio::test]
    async fn test_open_latest_follows_saved_subtype() {
        let store = Arc::new(InMemoryReportStore::new());
        let service = ReportService::new(cfg(), Arc::new(ecg_catalog()), Arc::clone(&store));

        let fresh = service.open_latest(&consultation(), ExamType::Ecg).await;
        assert_eq!(fresh.report.sub_type().as_str(), "repos");
        assert_eq!(fresh.source, ResolutionSource::Template);

        let effort = SubType::parse(ExamType::Ecg, "effort").expect("subtype");
        let mut report = service.open(&consultation(), effort).await.report;
        report.set_line("Conclusion", 0, "Test d'effort négatif").expect("set");
        service.save(&mut report).await.expect("save");

        let reopened = service.open_latest(&consultation(), ExamType::Ecg).await;
        assert_eq!(reopened.source, ResolutionSource::Saved);
        assert_eq!(reopened.report.sub_type(), effort);
        assert_eq!(
            reopened.report.lines("Conclusion").expect("lines"),
            ["Test d'effort négatif"]
        );
    }

    #[tokio::test]
    async fn test_open_latest_ignores_undecodable_document() {
        let store = Arc::new(InMemoryReportStore::new());
        store
            .insert(consultation(), ExamType::Ecg, "{not json")
            .await;
        let service = ReportService::new(cfg(), Arc::new(ecg_catalog()), store);

        let resolution = service.open_latest(&consultation(), ExamType::Ecg).await;

        assert_eq!(resolution.report.sub_type().as_str(), "repos");
    }

    #[tokio::test]
    async fn test_import_validates_subtype_and_uses_template_order() {
        let service = ReportService::new(
            cfg(),
            Arc::new(ecg_catalog()),
            Arc::new(InMemoryReportStore::new()),
        );

        let mut data = ReportData::new(ExamType::Ecg, "repos");
        data.fields.insert("Conclusion".into(), vec!["BAV 1".into()]);
        let report = service.import(&consultation(), data).await.expect("import");

        let keys: Vec<&str> = report.keys().map(|k| k.as_str()).collect();
        assert_eq!(keys, vec!["Rythme", "Conclusion"]);
        assert_eq!(report.lines("Rythme").expect("lines"), [""]);
        assert!(report.has_unsaved_changes());

        let bad = ReportData::new(ExamType::Ecg, "avec_schema");
        let err = service
            .import(&consultation(), bad)
            .await
            .expect_err("should reject");
        assert!(err.is_input_error());
    }
}
