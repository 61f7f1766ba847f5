//! # API REST
//!
//! REST API for the clinical report engine.
//!
//! Handles:
//! - HTTP endpoints with axum
//! - OpenAPI/Swagger documentation
//! - REST-specific concerns (JSON bodies, status codes, CORS)
//!
//! All report semantics live in `report-core`; handlers only parse identifiers, call the
//! [`ReportService`] and map its results onto HTTP.

#![warn(rust_2018_idioms)]

pub mod dto;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
    routing::get,
    Router,
};
use report_core::{
    ConsultationId, CoreConfig, ExamType, FileReportStore, ReportError, ReportService, Resolution,
    SubType, YamlTemplateCatalog,
};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use dto::{
    CustomFieldDto, FieldDto, HealthRes, NoticeDto, PrintFieldDto, PrintSnapshotDto, ReportDto,
    ResolutionRes, SaveReportReq, SubTypeQuery,
};

type RestError = (StatusCode, &'static str);

/// Application state shared across REST API handlers
///
/// Holds the report service backed by the YAML template catalog and the JSON file store.
#[derive(Clone)]
pub struct AppState {
    report_service: ReportService<YamlTemplateCatalog, FileReportStore>,
}

impl AppState {
    /// Builds the state from resolved configuration.
    pub fn new(cfg: Arc<CoreConfig>) -> Self {
        let catalog = Arc::new(YamlTemplateCatalog::new(cfg.template_dir()));
        let store = Arc::new(FileReportStore::new(cfg.reports_dir()));
        Self {
            report_service: ReportService::new(cfg, catalog, store),
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(health, get_report, put_report, print_report),
    components(schemas(
        HealthRes,
        ResolutionRes,
        NoticeDto,
        ReportDto,
        FieldDto,
        SaveReportReq,
        CustomFieldDto,
        PrintSnapshotDto,
        PrintFieldDto
    ))
)]
pub struct ApiDoc;

/// Builds the REST router with Swagger UI and permissive CORS.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route(
            "/reports/:consultation_id/:exam_type",
            get(get_report).put(put_report),
        )
        .route(
            "/reports/:consultation_id/:exam_type/print",
            get(print_report),
        )
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Health check response", body = HealthRes)
    )
)]
/// Health check endpoint for the REST API
#[axum::debug_handler]
async fn health(State(_state): State<AppState>) -> Json<HealthRes> {
    Json(HealthRes {
        ok: true,
        message: "report engine is alive".into(),
    })
}

#[utoipa::path(
    get,
    path = "/reports/{consultation_id}/{exam_type}",
    params(
        ("consultation_id" = String, Path, description = "Consultation identifier"),
        ("exam_type" = String, Path, description = "echography, doppler, thyroid or ecg"),
        SubTypeQuery
    ),
    responses(
        (status = 200, description = "Resolved report with its source and notices", body = ResolutionRes),
        (status = 400, description = "Bad request")
    )
)]
/// Open a report
///
/// Resolves the report from the saved document, the subtype template or the fallback fields.
/// Without a `sub_type`, the subtype the report was last saved with is used. Resolution never
/// fails; degradations are listed in `notices`.
#[axum::debug_handler]
async fn get_report(
    State(state): State<AppState>,
    Path((consultation_id, exam_type)): Path<(String, String)>,
    Query(query): Query<SubTypeQuery>,
) -> Result<Json<ResolutionRes>, RestError> {
    let resolution = open_report(
        &state,
        &consultation_id,
        &exam_type,
        query.sub_type.as_deref(),
    )
    .await?;
    Ok(Json(ResolutionRes::from(&resolution)))
}

#[utoipa::path(
    put,
    path = "/reports/{consultation_id}/{exam_type}",
    params(
        ("consultation_id" = String, Path, description = "Consultation identifier"),
        ("exam_type" = String, Path, description = "echography, doppler, thyroid or ecg")
    ),
    request_body = SaveReportReq,
    responses(
        (status = 200, description = "Report saved", body = ReportDto),
        (status = 400, description = "Bad request"),
        (status = 500, description = "Internal server error")
    )
)]
/// Save an edited report
///
/// The document is rebuilt against the current template for its subtype and persisted as a
/// versioned envelope. The content of hidden fields is not persisted.
#[axum::debug_handler]
async fn put_report(
    State(state): State<AppState>,
    Path((consultation_id, exam_type)): Path<(String, String)>,
    Json(req): Json<SaveReportReq>,
) -> Result<Json<ReportDto>, RestError> {
    let consultation_id = parse_consultation_id(&consultation_id)?;
    let exam_type = parse_exam_type(&exam_type)?;

    let mut report = state
        .report_service
        .import(&consultation_id, req.into_data(exam_type))
        .await
        .map_err(|e| map_report_error("Import report", e))?;
    state
        .report_service
        .save(&mut report)
        .await
        .map_err(|e| map_report_error("Save report", e))?;

    Ok(Json(ReportDto::from(&report)))
}

#[utoipa::path(
    get,
    path = "/reports/{consultation_id}/{exam_type}/print",
    params(
        ("consultation_id" = String, Path, description = "Consultation identifier"),
        ("exam_type" = String, Path, description = "echography, doppler, thyroid or ecg"),
        SubTypeQuery
    ),
    responses(
        (status = 200, description = "Printable fields", body = PrintSnapshotDto),
        (status = 400, description = "Bad request")
    )
)]
/// Printable view of a report
///
/// Lists visible fields with content, in display order, with their emphasis. Without a
/// `sub_type`, the subtype the report was last saved with is used.
#[axum::debug_handler]
async fn print_report(
    State(state): State<AppState>,
    Path((consultation_id, exam_type)): Path<(String, String)>,
    Query(query): Query<SubTypeQuery>,
) -> Result<Json<PrintSnapshotDto>, RestError> {
    let resolution = open_report(
        &state,
        &consultation_id,
        &exam_type,
        query.sub_type.as_deref(),
    )
    .await?;
    let snapshot = state.report_service.print_snapshot(&resolution.report);
    Ok(Json(PrintSnapshotDto::from(snapshot)))
}

/// Opens the requested subtype, or the last saved one when no subtype is given.
async fn open_report(
    state: &AppState,
    consultation_id: &str,
    exam_type: &str,
    sub_type: Option<&str>,
) -> Result<Resolution, RestError> {
    let consultation_id = parse_consultation_id(consultation_id)?;
    let exam_type = parse_exam_type(exam_type)?;
    let service = &state.report_service;
    let resolution = match sub_type {
        Some(code) => {
            let sub_type = SubType::parse(exam_type, code).map_err(|e| {
                tracing::debug!("Rejected subtype: {}", e);
                (StatusCode::BAD_REQUEST, "Unknown subtype")
            })?;
            service.open(&consultation_id, sub_type).await
        }
        None => service.open_latest(&consultation_id, exam_type).await,
    };
    Ok(resolution)
}

fn parse_consultation_id(input: &str) -> Result<ConsultationId, RestError> {
    ConsultationId::parse(input).map_err(|e| {
        tracing::debug!("Rejected consultation id: {}", e);
        (StatusCode::BAD_REQUEST, "Invalid consultation id")
    })
}

fn parse_exam_type(input: &str) -> Result<ExamType, RestError> {
    input.parse::<ExamType>().map_err(|e| {
        tracing::debug!("Rejected exam type: {}", e);
        (StatusCode::BAD_REQUEST, "Unknown exam type")
    })
}

fn map_report_error(operation: &str, err: ReportError) -> RestError {
    if err.is_input_error() {
        tracing::debug!("{} rejected: {}", operation, err);
        return (StatusCode::BAD_REQUEST, "Bad request");
    }
    tracing::error!("{} error: {:?}", operation, err);
    (StatusCode::INTERNAL_SERVER_ERROR, "Internal error")
}
