//! Custom field key generation.
//!
//! Fields added by a user at runtime need identifiers that can never collide with template
//! field keys nor with each other. They are derived from a random UUID in a *canonical*
//! representation:
//!
//! `custom_<32 lowercase hex characters>`
//!
//! Example: `custom_550e8400e29b41d4a716446655440000`
//!
//! Notes:
//! - The hex part is what `Uuid::new_v4().simple().to_string()` produces.
//! - The `custom_` prefix is reserved: template catalogs reject default keys that use it, so
//!   the two key namespaces stay disjoint.
//! - Canonical form is *required* for externally supplied identifiers (for example, a key sent
//!   back by an API client). Use [`CustomFieldId::parse`] to validate an input string.

mod service;

pub use service::{CustomFieldId, Uuid, CUSTOM_KEY_PREFIX};

/// Error type for custom key operations.
#[derive(Debug, thiserror::Error)]
pub enum UuidError {
    /// Invalid input provided
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

/// Result type for custom key operations.
pub type UuidResult<T> = Result<T, UuidError>;
