use report_types::{TextError, VocabularyError};
use std::time::Duration;

#[derive(Debug, thiserror::Error)]
pub enum ReportError {
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("invalid input: {0}")]
    Vocabulary(#[from] VocabularyError),
    #[error("invalid input: {0}")]
    Text(#[from] TextError),

    #[error("unknown field: {0}")]
    UnknownField(String),
    #[error("line {index} is out of bounds for field {key} ({len} lines)")]
    LineOutOfBounds {
        key: String,
        index: usize,
        len: usize,
    },
    #[error("field {0} has no template default (custom field)")]
    NotTemplateField(String),
    #[error("field {0} is not a custom field")]
    NotCustomField(String),
    #[error("could not allocate a unique custom field key after {0} attempts")]
    CustomKeyExhausted(usize),

    #[error("failed to fetch templates: {0}")]
    TemplateFetch(String),
    #[error("failed to load report: {0}")]
    ReportLoad(String),
    #[error("failed to save report: {0}")]
    ReportSave(String),
    #[error("{operation} timed out after {} ms", .after.as_millis())]
    Timeout {
        operation: &'static str,
        after: Duration,
    },

    #[error("report document error: {0}")]
    Wire(#[from] report_wire::WireError),
    #[error("template catalog error: {0}")]
    Catalog(String),

    #[error("failed to create storage directory: {0}")]
    StorageDirCreation(std::io::Error),
    #[error("failed to read report file: {0}")]
    FileRead(std::io::Error),
    #[error("failed to write report file: {0}")]
    FileWrite(std::io::Error),
}

impl ReportError {
    /// Returns true if the error was caused by the caller's input rather than the environment.
    pub fn is_input_error(&self) -> bool {
        matches!(
            self,
            ReportError::InvalidInput(_)
                | ReportError::Vocabulary(_)
                | ReportError::Text(_)
                | ReportError::UnknownField(_)
                | ReportError::LineOutOfBounds { .. }
                | ReportError::NotTemplateField(_)
                | ReportError::NotCustomField(_)
        )
    }
}

pub type ReportResult<T> = std::result::Result<T, ReportError>;
