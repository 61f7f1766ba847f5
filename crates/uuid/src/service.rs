//! Implementation of the custom field identifier.

use crate::{UuidError, UuidResult};
use report_types::FieldKey;
use std::{fmt, str::FromStr};

/// Re-exported for convenience.
pub use ::uuid::Uuid;

/// Prefix reserved for generated custom field keys.
pub const CUSTOM_KEY_PREFIX: &str = "custom_";

/// Canonical identifier of a custom field (`custom_` + 32 lowercase hex characters).
///
/// Once constructed, the contained UUID is guaranteed to render in canonical form, so the
/// derived [`FieldKey`] is stable across save and reload.
///
/// # Construction
/// - [`CustomFieldId::new`] generates a fresh identifier.
/// - [`CustomFieldId::parse`] validates an externally supplied key.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct CustomFieldId(Uuid);

impl Default for CustomFieldId {
    fn default() -> Self {
        Self::new()
    }
}

impl CustomFieldId {
    /// Generates a new random identifier (RFC 4122 version 4).
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Validates and parses a key that must already be in canonical form.
    ///
    /// # Errors
    ///
    /// Returns [`UuidError::InvalidInput`] if `input` is not `custom_` followed by exactly 32
    /// lowercase hex characters.
    pub fn parse(input: &str) -> UuidResult<Self> {
        if let Some(hex) = input.strip_prefix(CUSTOM_KEY_PREFIX) {
            if Self::is_canonical_hex(hex) {
                if let Ok(uuid) = Uuid::parse_str(hex) {
                    return Ok(Self(uuid));
                }
            }
        }
        Err(UuidError::InvalidInput(format!(
            "custom field key must be '{CUSTOM_KEY_PREFIX}' followed by 32 lowercase hex characters, got: '{input}'"
        )))
    }

    /// Returns true if `input` is a canonical custom field key.
    pub fn is_canonical(input: &str) -> bool {
        input
            .strip_prefix(CUSTOM_KEY_PREFIX)
            .is_some_and(Self::is_canonical_hex)
    }

    /// Returns true if `key` uses the reserved custom prefix, canonical or not.
    pub fn is_reserved(key: &str) -> bool {
        key.starts_with(CUSTOM_KEY_PREFIX)
    }

    fn is_canonical_hex(hex: &str) -> bool {
        hex.len() == 32 && hex.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'))
    }

    pub fn uuid(&self) -> Uuid {
        self.0
    }

    /// Returns the field key for this identifier.
    pub fn field_key(&self) -> FieldKey {
        FieldKey::new(self.to_string()).expect("canonical custom key is never empty")
    }
}

impl fmt::Display for CustomFieldId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", CUSTOM_KEY_PREFIX, self.0.simple())
    }
}

impl FromStr for CustomFieldId {
    type Err = UuidError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        CustomFieldId::parse(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_generates_canonical_key() {
        let id = CustomFieldId::new();
        let key = id.to_string();

        assert_eq!(key.len(), CUSTOM_KEY_PREFIX.len() + 32);
        assert!(CustomFieldId::is_canonical(&key));
    }

    #[test]
    fn test_parse_valid_key() {
        let key = "custom_550e8400e29b41d4a716446655440000";
        let id = CustomFieldId::parse(key).expect("canonical key");
        assert_eq!(id.to_string(), key);
        assert_eq!(id.field_key().as_str(), key);
    }

    #[test]
    fn test_parse_rejects_missing_prefix() {
        let result = CustomFieldId::parse("550e8400e29b41d4a716446655440000");
        match result {
            Err(UuidError::InvalidInput(msg)) => assert!(msg.contains("custom_")),
            _ => panic!("Expected InvalidInput error"),
        }
    }

    #[test]
    fn test_parse_rejects_non_canonical_hex() {
        assert!(CustomFieldId::parse("custom_550E8400E29B41D4A716446655440000").is_err());
        assert!(CustomFieldId::parse("custom_550e8400-e29b-41d4-a716-446655440000").is_err());
        assert!(CustomFieldId::parse("custom_550e8400e29b41d4a71644665544000").is_err());
        assert!(CustomFieldId::parse("custom_").is_err());
    }

    #[test]
    fn test_is_reserved_matches_any_prefixed_key() {
        assert!(CustomFieldId::is_reserved("custom_anything"));
        assert!(!CustomFieldId::is_reserved("Conclusion"));
    }

    #[test]
    fn test_generated_keys_differ() {
        let a = CustomFieldId::new();
        let b = CustomFieldId::new();
        assert_ne!(a, b);
    }
}
