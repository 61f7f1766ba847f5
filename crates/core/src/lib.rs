//! # Report Core
//!
//! Field and template resolution engine for clinical exam reports.
//!
//! For one consultation and one exam type this crate decides which fields a report has, where
//! their default content comes from, how users edit, emphasise, hide and extend them during a
//! session, and how the result is persisted:
//! - [`TemplateCatalog`] supplies subtype-specific defaults (YAML directory or in memory)
//! - [`ResolutionEngine`] combines saved data, templates and hardcoded fallbacks
//! - [`Report`] holds the in-session field store, attribute overlay and custom field registry
//! - [`PersistenceStore`] loads and saves raw report documents (JSON files or in memory)
//! - [`ReportService`] ties these together behind `open`, `save`, `import` and `print_snapshot`
//!
//! **No API concerns**: HTTP servers and command-line handling belong in `api-rest` and `cli`.

pub mod catalog;
pub mod config;
pub mod constants;
pub mod consultation;
pub mod error;
pub mod fallback;
pub mod report;
pub mod resolution;
pub mod service;
pub mod store;

pub use catalog::{InMemoryTemplateCatalog, TemplateCatalog, TemplateField, TemplateSet, YamlTemplateCatalog};
pub use config::{io_timeout_from_env_value, resolve_template_dir, CoreConfig};
pub use consultation::ConsultationId;
pub use error::{ReportError, ReportResult};
pub use report::{
    CustomField, FieldEntry, FieldState, PrintField, PrintSnapshot, Report, ResetOutcome,
};
pub use resolution::{Notice, Resolution, ResolutionEngine, ResolutionSource};
pub use service::ReportService;
pub use store::{FileReportStore, InMemoryReportStore, PersistenceStore};

pub use report_types::{ExamType, FieldKey, NonEmptyText, SubType};
pub use report_wire::{CustomFieldData, ReportData};
