//! Custom field registry.
//!
//! Custom fields get a generated `custom_<hex>` key that never collides with a template key, an
//! active key, or a key removed earlier in the session.

use super::{CustomField, FieldEntry, FieldState, Report};
use crate::constants::CUSTOM_KEY_ATTEMPTS;
use crate::{ReportError, ReportResult};
use report_types::{FieldKey, NonEmptyText};
use report_uuid::CustomFieldId;

impl Report {
    /// Adds a custom field labelled `label` with one line of `content` (blank if `None`).
    ///
    /// The new field is not bold and not hidden. Returns the generated key.
    pub fn add_custom_field(
        &mut self,
        label: &str,
        content: Option<&str>,
    ) -> ReportResult<FieldKey> {
        self.add_custom_field_with(label, content, CustomFieldId::new)
    }

    /// Same as [`Report::add_custom_field`], drawing candidate keys from `id_source`.
    ///
    /// # Errors
    ///
    /// Returns [`ReportError::InvalidInput`] for a blank label and
    /// [`ReportError::CustomKeyExhausted`] if 5 candidates in a row were already taken.
    pub fn add_custom_field_with(
        &mut self,
        label: &str,
        content: Option<&str>,
        mut id_source: impl FnMut() -> CustomFieldId,
    ) -> ReportResult<FieldKey> {
        let label = NonEmptyText::new(label).map_err(|_| {
            ReportError::InvalidInput("custom field label cannot be empty".into())
        })?;

        for _attempt in 0..CUSTOM_KEY_ATTEMPTS {
            let key = id_source().field_key();
            if self.fields.contains_key(&key)
                || self.retired_keys.contains(&key)
                || self.templates.get(key.as_str()).is_some()
            {
                continue;
            }

            let lines = vec![content.unwrap_or_default().to_string()];
            self.fields
                .insert(key.clone(), FieldEntry::new(lines, FieldState::UserEdited));
            self.bold_fields.insert(key.clone(), false);
            self.hidden_fields.insert(key.clone(), false);
            self.order.push(key.clone());
            self.custom_fields.push(CustomField {
                key: key.clone(),
                label,
            });
            tracing::debug!("added custom field {key} to {}", self.consultation_id);
            return Ok(key);
        }

        Err(ReportError::CustomKeyExhausted(CUSTOM_KEY_ATTEMPTS))
    }

    /// Deletes a custom field and its flags. Its key is never reissued.
    ///
    /// # Errors
    ///
    /// Returns [`ReportError::NotCustomField`] for template fields and
    /// [`ReportError::UnknownField`] for inactive keys.
    pub fn remove_custom_field(&mut self, key: &str) -> ReportResult<()> {
        let Some(position) = self
            .custom_fields
            .iter()
            .position(|custom| custom.key.as_str() == key)
        else {
            if self.fields.contains_key(key) {
                return Err(ReportError::NotCustomField(key.to_string()));
            }
            return Err(ReportError::UnknownField(key.to_string()));
        };

        let custom = self.custom_fields.remove(position);
        self.fields.remove(&custom.key);
        self.bold_fields.remove(&custom.key);
        self.hidden_fields.remove(&custom.key);
        self.order.retain(|existing| existing != &custom.key);
        self.retired_keys.insert(custom.key);
        Ok(())
    }
}
