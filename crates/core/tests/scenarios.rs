use report_core::{
    ConsultationId, CoreConfig, ExamType, FileReportStore, InMemoryReportStore,
    InMemoryTemplateCatalog, Notice, PersistenceStore, ReportError, ReportResult, ReportService,
    ResolutionSource, SubType, TemplateField, TemplateSet, YamlTemplateCatalog,
};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

fn consultation() -> ConsultationId {
    ConsultationId::parse("cons-2026-0042").expect("valid consultation id")
}

fn sub(exam_type: ExamType, code: &str) -> SubType {
    SubType::parse(exam_type, code).expect("valid subtype")
}

fn cfg(io_timeout: Duration) -> Arc<CoreConfig> {
    Arc::new(
        CoreConfig::new("report_data".into(), "templates".into(), io_timeout)
            .expect("valid config"),
    )
}

fn field(key: &str, label: &str, lines: &[&str]) -> TemplateField {
    TemplateField::new(key, label, lines.iter().map(|l| l.to_string()).collect())
        .expect("template field")
}

fn thyroid_catalog() -> InMemoryTemplateCatalog {
    InMemoryTemplateCatalog::new()
        .with_templates(
            sub(ExamType::Thyroid, "avec_schema"),
            TemplateSet::new(vec![
                field("Technique", "Technique", &[]),
                field("Conclusion", "Conclusion", &["Conclusion normale"]),
            ])
            .expect("set"),
        )
        .with_templates(
            sub(ExamType::Thyroid, "sans_schema"),
            TemplateSet::new(vec![
                field("Indication", "Indication", &[]),
                field("Resultats", "Résultats", &["Thyroïde normale"]),
                field("Conclusion", "Conclusion", &["Examen sans particularité"]),
            ])
            .expect("set"),
        )
}

fn visible_content(report: &report_core::Report) -> Vec<(String, Vec<String>)> {
    report
        .keys()
        .filter(|key| !report.is_hidden(key.as_str()))
        .map(|key| {
            let lines = report.lines(key.as_str()).expect("lines").to_vec();
            (key.to_string(), lines)
        })
        .collect()
}

struct SlowStore {
    delay: Duration,
}

impl PersistenceStore for SlowStore {
    async fn load_report(
        &self,
        _consultation_id: &ConsultationId,
        _exam_type: ExamType,
    ) -> ReportResult<Option<String>> {
        tokio::time::sleep(self.delay).await;
        Ok(None)
    }

    async fn save_report(
        &self,
        _consultation_id: &ConsultationId,
        _exam_type: ExamType,
        _document: String,
    ) -> ReportResult<()> {
        tokio::time::sleep(self.delay).await;
        Ok(())
    }
}

#[tokio::test]
async fn test_scenario_a_fresh_report_from_template() {
    let service = ReportService::new(
        cfg(Duration::from_secs(5)),
        Arc::new(thyroid_catalog()),
        Arc::new(InMemoryReportStore::new()),
    );

    let resolution = service
        .open(&consultation(), sub(ExamType::Thyroid, "avec_schema"))
        .await;
    let report = resolution.report;

    assert_eq!(resolution.source, ResolutionSource::Template);
    assert!(resolution.notices.is_empty());
    assert_eq!(
        report.lines("Conclusion").expect("conclusion"),
        ["Conclusion normale"]
    );
    assert!(report.is_bold("Conclusion"));
    assert_eq!(report.lines("Technique").expect("technique"), [""]);
    assert!(!report.is_bold("Technique"));
    assert_eq!(report.hidden_keys().count(), 0);
    assert!(report.custom_fields().is_empty());
}

#[tokio::test]
async fn test_scenario_b_custom_field() {
    let service = ReportService::new(
        cfg(Duration::from_secs(5)),
        Arc::new(thyroid_catalog()),
        Arc::new(InMemoryReportStore::new()),
    );
    let mut report = service
        .open(&consultation(), sub(ExamType::Thyroid, "avec_schema"))
        .await
        .report;

    let key = report
        .add_custom_field("Note spéciale", Some("Voir dossier"))
        .expect("add custom field");

    assert!(report.templates().get(key.as_str()).is_none());
    assert_eq!(report.lines(key.as_str()).expect("lines"), ["Voir dossier"]);
    assert!(!report.is_bold(key.as_str()));
    assert!(!report.is_hidden(key.as_str()));
}

#[tokio::test]
async fn test_scenario_c_hidden_fields_are_not_saved() {
    let store = Arc::new(InMemoryReportStore::new());
    let service = ReportService::new(
        cfg(Duration::from_secs(5)),
        Arc::new(thyroid_catalog()),
        Arc::clone(&store),
    );
    let mut report = service
        .open(&consultation(), sub(ExamType::Thyroid, "avec_schema"))
        .await
        .report;
    report
        .set_line("Technique", 0, "Sonde linéaire 12 MHz")
        .expect("set line");
    let before = visible_content(&report);

    report.hide_field("Technique").expect("hide");
    service.save(&mut report).await.expect("save");

    let document = store
        .document(&consultation(), ExamType::Thyroid)
        .await
        .expect("stored document");
    let value: serde_json::Value = serde_json::from_str(&document).expect("json");
    assert!(value["payload"]["fields"].get("Technique").is_none());
    assert!(value["payload"]["fields"].get("Conclusion").is_some());

    report.restore_all_hidden();
    assert_eq!(visible_content(&report), before);
}

#[tokio::test]
async fn test_scenario_d_subtype_switch_uses_new_template() {
    let store = Arc::new(InMemoryReportStore::new());
    let service = ReportService::new(
        cfg(Duration::from_secs(5)),
        Arc::new(thyroid_catalog()),
        Arc::clone(&store),
    );
    let mut report = service
        .open(&consultation(), sub(ExamType::Thyroid, "avec_schema"))
        .await
        .report;
    report
        .set_line("Conclusion", 0, "Nodule EU-TIRADS 4")
        .expect("set line");
    service.save(&mut report).await.expect("save");

    let resolution = service
        .open(&consultation(), sub(ExamType::Thyroid, "sans_schema"))
        .await;

    assert_eq!(resolution.source, ResolutionSource::Template);
    let report = resolution.report;
    assert_eq!(
        report.lines("Conclusion").expect("conclusion"),
        ["Examen sans particularité"]
    );
    assert_eq!(report.lines("Resultats").expect("resultats"), ["Thyroïde normale"]);
    assert!(report.lines("Technique").is_err());

    let reopened = service
        .open(&consultation(), sub(ExamType::Thyroid, "avec_schema"))
        .await;
    assert_eq!(reopened.source, ResolutionSource::Saved);
    assert_eq!(
        reopened.report.lines("Conclusion").expect("conclusion"),
        ["Nodule EU-TIRADS 4"]
    );
}

#[tokio::test]
async fn test_save_and_reopen_round_trips_visible_content() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let template_root = report_core::resolve_template_dir(None).expect("bundled templates");
    let store = Arc::new(FileReportStore::new(temp_dir.path().join("reports")));
    let service = ReportService::new(
        cfg(Duration::from_secs(5)),
        Arc::new(YamlTemplateCatalog::new(template_root)),
        store,
    );

    for (exam_type, code) in [
        (ExamType::Thyroid, "sans_schema"),
        (ExamType::Ecg, "effort"),
        (ExamType::Echography, "abdominale"),
        (ExamType::Doppler, "arteriel_mi"),
    ] {
        let sub_type = sub(exam_type, code);
        let mut report = service.open(&consultation(), sub_type).await.report;
        let first = report.keys().next().expect("at least one field").clone();
        report.set_line(first.as_str(), 0, "Ligne modifiée").expect("set");
        report.append_line(first.as_str()).expect("append");
        report.toggle_bold(first.as_str()).expect("bold");
        let note = report
            .add_custom_field("Note spéciale", Some("Voir dossier"))
            .expect("add");
        service.save(&mut report).await.expect("save");

        let reopened = service.open(&consultation(), sub_type).await;

        assert_eq!(reopened.source, ResolutionSource::Saved, "{exam_type}");
        assert!(reopened.notices.is_empty(), "{exam_type}: {:?}", reopened.notices);
        assert_eq!(visible_content(&reopened.report), visible_content(&report));
        assert!(reopened.report.is_bold(first.as_str()));
        assert_eq!(reopened.report.label(note.as_str()), Some("Note spéciale"));
    }
}

#[tokio::test]
async fn test_legacy_records_are_read_and_rewritten_as_envelopes() {
    let store = Arc::new(InMemoryReportStore::new());
    let sub_type = sub(ExamType::Doppler, "veineux_mi");
    let catalog = InMemoryTemplateCatalog::new().with_templates(
        sub_type,
        TemplateSet::new(vec![
            field("reseau_profond", "Réseau veineux profond", &["Perméable"]),
            field("Conclusion", "Conclusion", &["Pas de thrombose"]),
        ])
        .expect("set"),
    );
    store
        .insert(
            consultation(),
            ExamType::Doppler,
            r#"{
                "subType": "veineux_mi",
                "dopplerData": "{\"Réseau veineux profond\":\"[\\\"Thrombose fémorale\\\"]\",\"Conclusion\":[\"TVP\"]}",
                "boldFields": "{\"Conclusion\":true}"
            }"#,
        )
        .await;
    let service = ReportService::new(cfg(Duration::from_secs(5)), Arc::new(catalog), Arc::clone(&store));

    let resolution = service.open(&consultation(), sub_type).await;
    assert_eq!(resolution.source, ResolutionSource::Saved);
    let mut report = resolution.report;
    assert_eq!(
        report.lines("reseau_profond").expect("lines"),
        ["Thrombose fémorale"]
    );
    assert_eq!(report.lines("Conclusion").expect("lines"), ["TVP"]);
    assert!(report.is_bold("Conclusion"));

    service.save(&mut report).await.expect("save");
    let document = store
        .document(&consultation(), ExamType::Doppler)
        .await
        .expect("stored");
    let value: serde_json::Value = serde_json::from_str(&document).expect("json");
    assert_eq!(value["version"], 2);
    assert_eq!(
        value["payload"]["doppler"]["fields"]["reseau_profond"],
        serde_json::json!(["Thrombose fémorale"])
    );
}

#[tokio::test]
async fn test_fallback_fields_survive_save_and_reopen() {
    let store = Arc::new(InMemoryReportStore::new());
    let service = ReportService::new(
        cfg(Duration::from_secs(5)),
        Arc::new(InMemoryTemplateCatalog::new()),
        Arc::clone(&store),
    );
    let sub_type = sub(ExamType::Thyroid, "avec_schema");

    let resolution = service.open(&consultation(), sub_type).await;
    assert_eq!(resolution.source, ResolutionSource::Fallback);
    let mut report = resolution.report;
    let default_keys: Vec<String> = report.keys().map(|key| key.to_string()).collect();
    report.set_line("Resultats", 0, "Nodule isthmique").expect("set");
    report.hide_field("Technique").expect("hide");
    service.save(&mut report).await.expect("save");

    let reopened = service.open(&consultation(), sub_type).await;
    assert_eq!(reopened.source, ResolutionSource::Saved);
    let mut report = reopened.report;

    let keys: Vec<String> = report.keys().map(|key| key.to_string()).collect();
    assert_eq!(keys, default_keys);
    assert_eq!(report.label("Resultats"), Some("Résultats"));
    assert!(report.is_hidden("Technique"));
    assert_eq!(report.lines("Technique").expect("technique"), [""]);
    assert_eq!(report.lines("Resultats").expect("resultats"), ["Nodule isthmique"]);

    let outcome = report.reset_field_to_template("Resultats").expect("reset");
    assert_eq!(outcome, report_core::ResetOutcome::Reset);
    let default = report
        .templates()
        .get("Resultats")
        .expect("fallback field")
        .lines
        .clone();
    assert_eq!(report.lines("Resultats").expect("resultats"), default.as_slice());
}

#[tokio::test]
async fn test_default_field_hidden_after_fetch_failure_still_exists_on_reopen() {
    let sub_type = sub(ExamType::Ecg, "repos");
    let service = ReportService::new(
        cfg(Duration::from_secs(5)),
        Arc::new(InMemoryTemplateCatalog::new().with_failure(sub_type, "catalog offline")),
        Arc::new(InMemoryReportStore::new()),
    );

    let mut report = service.open(&consultation(), sub_type).await.report;
    report.hide_field("Axe").expect("hide");
    service.save(&mut report).await.expect("save");

    let reopened = service.open(&consultation(), sub_type).await;
    assert_eq!(reopened.source, ResolutionSource::Saved);
    let mut report = reopened.report;
    assert!(report.is_hidden("Axe"));
    assert_eq!(report.lines("Axe").expect("axe"), [""]);

    report.restore_all_hidden();
    assert!(!report.is_hidden("Axe"));
    assert_eq!(report.label("Axe"), Some("Axe"));
}

#[tokio::test]
async fn test_hidden_custom_field_survives_save_and_reopen() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let service = ReportService::new(
        cfg(Duration::from_secs(5)),
        Arc::new(thyroid_catalog()),
        Arc::new(FileReportStore::new(temp_dir.path().join("reports"))),
    );
    let sub_type = sub(ExamType::Thyroid, "avec_schema");

    let mut report = service.open(&consultation(), sub_type).await.report;
    let note = report
        .add_custom_field("Note spéciale", Some("Voir dossier"))
        .expect("add");
    report.hide_field(note.as_str()).expect("hide");
    service.save(&mut report).await.expect("save");

    let mut report = service.open(&consultation(), sub_type).await.report;
    assert!(report.is_custom(note.as_str()));
    assert!(report.is_hidden(note.as_str()));
    assert!(report.print_snapshot().fields.iter().all(|f| f.key != note));

    report.restore_all_hidden();
    assert_eq!(report.lines(note.as_str()).expect("custom field"), [""]);
    assert_eq!(report.label(note.as_str()), Some("Note spéciale"));

    report.remove_custom_field(note.as_str()).expect("remove");
    service.save(&mut report).await.expect("save");
    let report = service.open(&consultation(), sub_type).await.report;
    assert!(report.lines(note.as_str()).is_err());
}

#[tokio::test]
async fn test_slow_store_load_times_out_into_template_resolution() {
    let service = ReportService::new(
        cfg(Duration::from_millis(20)),
        Arc::new(thyroid_catalog()),
        Arc::new(SlowStore {
            delay: Duration::from_millis(500),
        }),
    );

    let resolution = service
        .open(&consultation(), sub(ExamType::Thyroid, "avec_schema"))
        .await;

    assert_eq!(resolution.source, ResolutionSource::Template);
    assert!(matches!(
        resolution.notices.as_slice(),
        [Notice::ReportLoadFailure { message }] if message.contains("timed out")
    ));
}

#[tokio::test]
async fn test_slow_store_save_times_out_and_keeps_state() {
    let service = ReportService::new(
        cfg(Duration::from_millis(20)),
        Arc::new(thyroid_catalog()),
        Arc::new(SlowStore {
            delay: Duration::from_millis(500),
        }),
    );
    let mut report = service
        .open(&consultation(), sub(ExamType::Thyroid, "avec_schema"))
        .await
        .report;
    report.set_line("Technique", 0, "Sonde linéaire").expect("set");

    let err = service.save(&mut report).await.expect_err("should time out");

    assert!(matches!(err, ReportError::Timeout { .. }));
    assert!(report.has_unsaved_changes());
    assert!(report.saved_at().is_none());
}
