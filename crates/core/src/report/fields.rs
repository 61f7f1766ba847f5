//! Line-level edits.
//!
//! Every successful edit moves the field to [`FieldState::UserEdited`], except a reset which
//! returns it to [`FieldState::TemplateDefault`]. A field never ends up with zero lines.

use super::{FieldState, Report, ResetOutcome};
use crate::{ReportError, ReportResult};

impl Report {
    /// Replaces line `index` of `key` with `text`.
    pub fn set_line(
        &mut self,
        key: &str,
        index: usize,
        text: impl Into<String>,
    ) -> ReportResult<()> {
        let entry = self.entry_mut(key)?;
        let len = entry.lines.len();
        let line = entry
            .lines
            .get_mut(index)
            .ok_or_else(|| ReportError::LineOutOfBounds {
                key: key.to_string(),
                index,
                len,
            })?;
        *line = text.into();
        entry.state = FieldState::UserEdited;
        Ok(())
    }

    /// Appends a blank line to `key`.
    pub fn append_line(&mut self, key: &str) -> ReportResult<()> {
        let entry = self.entry_mut(key)?;
        entry.lines.push(String::new());
        entry.state = FieldState::UserEdited;
        Ok(())
    }

    /// Inserts a blank line after line `index` of `key`.
    pub fn insert_line_after(&mut self, key: &str, index: usize) -> ReportResult<()> {
        let entry = self.entry_mut(key)?;
        let len = entry.lines.len();
        if index >= len {
            return Err(ReportError::LineOutOfBounds {
                key: key.to_string(),
                index,
                len,
            });
        }
        entry.lines.insert(index + 1, String::new());
        entry.state = FieldState::UserEdited;
        Ok(())
    }

    /// Removes line `index` of `key`. Removing the last line leaves `[""]`.
    pub fn remove_line(&mut self, key: &str, index: usize) -> ReportResult<()> {
        let entry = self.entry_mut(key)?;
        let len = entry.lines.len();
        if index >= len {
            return Err(ReportError::LineOutOfBounds {
                key: key.to_string(),
                index,
                len,
            });
        }
        entry.lines.remove(index);
        if entry.lines.is_empty() {
            entry.lines.push(String::new());
        }
        entry.state = FieldState::UserEdited;
        Ok(())
    }

    /// Restores the template default content of `key`.
    ///
    /// Returns [`ResetOutcome::NoTemplateContent`] without touching the field if the template
    /// has no non-blank content for it. Resetting twice has the same effect as resetting once.
    ///
    /// # Errors
    ///
    /// Returns [`ReportError::UnknownField`] for inactive keys and
    /// [`ReportError::NotTemplateField`] for custom fields.
    pub fn reset_field_to_template(&mut self, key: &str) -> ReportResult<ResetOutcome> {
        if !self.fields.contains_key(key) {
            return Err(ReportError::UnknownField(key.to_string()));
        }
        if self.is_custom(key) {
            return Err(ReportError::NotTemplateField(key.to_string()));
        }

        let Some(lines) = self
            .templates
            .get(key)
            .filter(|template| template.has_content())
            .map(|template| template.lines.clone())
        else {
            tracing::warn!(
                "no template content for field {key} ({}/{}); left unchanged",
                self.exam_type(),
                self.sub_type
            );
            return Ok(ResetOutcome::NoTemplateContent);
        };

        let entry = self.entry_mut(key)?;
        entry.lines = lines;
        entry.state = FieldState::TemplateDefault;
        Ok(ResetOutcome::Reset)
    }
}
