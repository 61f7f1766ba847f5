//! Exam types and their subtypes.
//!
//! The set of exam editors is closed, and so is the set of subtypes each one offers. Both are
//! parsed from their wire names (lowercase ASCII) and rejected when unknown.

use std::fmt;
use std::str::FromStr;

/// Errors returned when parsing exam vocabulary.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum VocabularyError {
    #[error("unknown exam type: '{0}'")]
    UnknownExamType(String),

    #[error("unknown subtype '{sub_type}' for exam type '{exam_type}'")]
    UnknownSubType {
        exam_type: ExamType,
        sub_type: String,
    },
}

/// The four clinical report categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[derive(serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExamType {
    /// Abdominal echography.
    Echography,
    /// Vascular Doppler.
    Doppler,
    /// Thyroid echography.
    Thyroid,
    /// Electrocardiogram.
    Ecg,
}

impl ExamType {
    /// Every exam type, in editor order.
    pub const ALL: [ExamType; 4] = [
        ExamType::Echography,
        ExamType::Doppler,
        ExamType::Thyroid,
        ExamType::Ecg,
    ];

    /// Returns the wire name of this exam type.
    pub fn as_str(&self) -> &'static str {
        match self {
            ExamType::Echography => "echography",
            ExamType::Doppler => "doppler",
            ExamType::Thyroid => "thyroid",
            ExamType::Ecg => "ecg",
        }
    }

    /// Returns the subtype codes offered by this exam type.
    pub fn sub_types(&self) -> &'static [&'static str] {
        match self {
            ExamType::Echography => &["abdominale", "abdomino_pelvienne", "renale", "pelvienne"],
            ExamType::Doppler => &["arteriel_mi", "veineux_mi", "tsa"],
            ExamType::Thyroid => &["avec_schema", "sans_schema", "thyroidectomie", "thyroidite"],
            ExamType::Ecg => &["repos", "effort"],
        }
    }

    /// Returns the subtype used when an editor opens without an explicit choice.
    pub fn default_sub_type(&self) -> SubType {
        SubType {
            exam_type: *self,
            code: self.sub_types()[0],
        }
    }
}

impl fmt::Display for ExamType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ExamType {
    type Err = VocabularyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ExamType::ALL
            .into_iter()
            .find(|exam| exam.as_str() == s)
            .ok_or_else(|| VocabularyError::UnknownExamType(s.to_string()))
    }
}

/// A variant of an [`ExamType`] with its own field set and template defaults.
///
/// A `SubType` can only be obtained through [`SubType::parse`] (or
/// [`ExamType::default_sub_type`]), so its code is always one of its exam type's codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubType {
    exam_type: ExamType,
    code: &'static str,
}

impl SubType {
    /// Parses a subtype code for the given exam type.
    ///
    /// # Errors
    ///
    /// Returns [`VocabularyError::UnknownSubType`] if `input` is not offered by `exam_type`.
    pub fn parse(exam_type: ExamType, input: &str) -> Result<Self, VocabularyError> {
        exam_type
            .sub_types()
            .iter()
            .find(|code| **code == input)
            .map(|code| SubType { exam_type, code })
            .ok_or_else(|| VocabularyError::UnknownSubType {
                exam_type,
                sub_type: input.to_string(),
            })
    }

    pub fn exam_type(&self) -> ExamType {
        self.exam_type
    }

    pub fn as_str(&self) -> &'static str {
        self.code
    }
}

impl fmt::Display for SubType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code)
    }
}

impl serde::Serialize for SubType {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(self.code)
    }
}
