//! Field identifiers and the key families that carry presentation rules.

use crate::TextError;
use std::borrow::Borrow;
use std::fmt;

/// Stable identifier for a field within a report.
///
/// Default keys come from the template catalog; custom keys are generated at runtime. Keys are
/// trimmed and never empty. Ordering is lexical so keys can index `BTreeMap`s.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FieldKey(String);

impl FieldKey {
    pub fn new(input: impl AsRef<str>) -> Result<Self, TextError> {
        let trimmed = input.as_ref().trim();
        if trimmed.is_empty() {
            return Err(TextError::Empty);
        }
        Ok(Self(trimmed.to_owned()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns true if this key belongs to the "conclusion" family.
    pub fn is_conclusion(&self) -> bool {
        is_conclusion_family(&self.0)
    }
}

impl fmt::Display for FieldKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for FieldKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for FieldKey {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl serde::Serialize for FieldKey {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> serde::Deserialize<'de> for FieldKey {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        FieldKey::new(&s).map_err(serde::de::Error::custom)
    }
}

/// Returns true if `key` names a conclusion field (case-insensitive match on `conclusion`).
///
/// Conclusion fields are bold by default when a report is created, and are tagged `conc` in
/// echography records.
pub fn is_conclusion_family(key: &str) -> bool {
    key.to_ascii_lowercase().contains("conclusion")
}

/// Returns true if `key` names a "conduct to hold" field (`conduite...`, `cat`, `cat_...`).
pub fn is_conduct_family(key: &str) -> bool {
    let lower = key.to_ascii_lowercase();
    lower.starts_with("conduite") || lower == "cat" || lower.starts_with("cat_")
}
