//! Persisted report wire/boundary support.
//!
//! This crate translates between the JSON documents stored for a report and the
//! [`ReportData`] carrier used by `report-core`. It knows about storage shapes only; which
//! fields exist and how they are edited is decided in the core.
//!
//! Two generations of documents are understood:
//! - **Envelope** documents (`{"version": 2, "exam_type", "saved_at", "payload"}`), written by
//!   [`ReportDocument::render`] and decoded strictly.
//! - **Legacy** documents (no `version` key, or an explicit version 1 envelope), decoded by a
//!   tolerant adapter that accepts every historical content shape.
//!
//! Exam-specific shapes:
//! - Thyroid and ECG fields are plain arrays of strings keyed by field key.
//! - Echography lines are tagged records (`desc`, `conc`, `cat`) chosen by field key.
//! - Doppler fields are nested in a single `doppler` envelope field. Legacy Doppler records key
//!   that envelope by label, which is mapped back to field keys through a [`LabelIndex`].

mod content;
mod data;
mod doppler;
mod echography;
mod envelope;
mod legacy;

pub use content::{collapse_for_storage, is_blank_lines, normalize_lines};
pub use data::{CustomFieldData, Decoded, LabelIndex, LabelLookup, ReportData, WireWarning};
pub use echography::LineRole;
pub use envelope::{ReportDocument, CURRENT_VERSION};

use report_types::ExamType;

/// Errors returned by the `report-wire` boundary crate.
#[derive(Debug, thiserror::Error)]
pub enum WireError {
    #[error("invalid JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),

    #[error("persisted report must be a JSON object")]
    NotAnObject,

    #[error("unsupported envelope version: {0}")]
    UnsupportedVersion(u64),

    #[error("exam type mismatch: expected '{expected}', found '{found}'")]
    ExamTypeMismatch { expected: ExamType, found: ExamType },

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("translation error: {0}")]
    Translation(String),
}

/// Type alias for Results that can fail with a [`WireError`].
pub type WireResult<T> = Result<T, WireError>;
