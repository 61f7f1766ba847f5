//! Shared vocabulary for the exam report engine.
//!
//! These types are used by every other crate in the workspace and carry no I/O:
//! - [`NonEmptyText`] for validated free text such as custom field labels
//! - [`FieldKey`] for stable field identifiers
//! - [`ExamType`] and [`SubType`] for the closed set of exam editors and their variants

mod exam;
mod field;

pub use exam::{ExamType, SubType, VocabularyError};
pub use field::{is_conclusion_family, is_conduct_family, FieldKey};

use serde::Serialize;
use std::fmt;

/// Rejection of blank free text.
#[derive(Debug, thiserror::Error)]
pub enum TextError {
    #[error("text is empty or whitespace only")]
    Empty,
}

/// Free text with at least one non-whitespace character, stored trimmed.
///
/// Used for labels shown to clinicians, where a blank value would render as an untitled field.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NonEmptyText(String);

impl NonEmptyText {
    /// Trims `input` and wraps it.
    ///
    /// # Errors
    ///
    /// Returns [`TextError::Empty`] if nothing is left after trimming.
    pub fn new(input: impl AsRef<str>) -> Result<Self, TextError> {
        match input.as_ref().trim() {
            "" => Err(TextError::Empty),
            text => Ok(Self(text.to_string())),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for NonEmptyText {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for NonEmptyText {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl serde::Serialize for NonEmptyText {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.0.serialize(serializer)
    }
}

impl<'de> serde::Deserialize<'de> for NonEmptyText {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = <std::borrow::Cow<'de, str>>::deserialize(deserializer)?;
        Self::new(raw.as_ref()).map_err(serde::de::Error::custom)
    }
}
