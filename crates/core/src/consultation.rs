//! Consultation identifiers.

use crate::constants::MAX_CONSULTATION_ID_LEN;
use crate::{ReportError, ReportResult};
use std::{fmt, str::FromStr};

/// Identifier of the consultation a report belongs to.
///
/// Identifiers are issued by the surrounding clinic system. They are embedded in storage paths,
/// so only ASCII letters, digits, `-` and `_` are accepted, up to 64 characters.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConsultationId(String);

impl ConsultationId {
    /// Validates and wraps an externally supplied identifier.
    ///
    /// # Errors
    ///
    /// Returns [`ReportError::InvalidInput`] if `input` is empty, too long, or contains
    /// characters outside `[A-Za-z0-9_-]`.
    pub fn parse(input: &str) -> ReportResult<Self> {
        let input = input.trim();
        if input.is_empty() {
            return Err(ReportError::InvalidInput(
                "consultation id cannot be empty".into(),
            ));
        }
        if input.len() > MAX_CONSULTATION_ID_LEN {
            return Err(ReportError::InvalidInput(format!(
                "consultation id exceeds {MAX_CONSULTATION_ID_LEN} characters"
            )));
        }
        if !input
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_')
        {
            return Err(ReportError::InvalidInput(format!(
                "consultation id may only contain letters, digits, '-' and '_', got: '{input}'"
            )));
        }
        Ok(Self(input.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ConsultationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for ConsultationId {
    type Err = ReportError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ConsultationId::parse(s)
    }
}
