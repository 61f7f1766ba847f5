//! Bold and hidden flags.
//!
//! Flags never change field content or field state.

use super::Report;
use crate::ReportResult;
use report_types::FieldKey;

impl Report {
    /// Flips the bold flag of `key` and returns the new value.
    pub fn toggle_bold(&mut self, key: &str) -> ReportResult<bool> {
        let key = self.known_key(key)?;
        let bold = self.bold_fields.entry(key).or_insert(false);
        *bold = !*bold;
        Ok(*bold)
    }

    pub fn is_bold(&self, key: &str) -> bool {
        self.bold_fields.get(key).copied().unwrap_or(false)
    }

    /// Hides `key` from save and print. Content is kept in memory.
    pub fn hide_field(&mut self, key: &str) -> ReportResult<()> {
        let key = self.known_key(key)?;
        self.hidden_fields.insert(key, true);
        Ok(())
    }

    /// Makes a single hidden field visible again.
    pub fn show_field(&mut self, key: &str) -> ReportResult<()> {
        let key = self.known_key(key)?;
        self.hidden_fields.remove(&key);
        Ok(())
    }

    /// Makes every hidden field visible again.
    pub fn restore_all_hidden(&mut self) {
        self.hidden_fields.clear();
    }

    pub fn is_hidden(&self, key: &str) -> bool {
        self.hidden_fields.get(key).copied().unwrap_or(false)
    }

    /// Currently hidden keys, in key order.
    pub fn hidden_keys(&self) -> impl Iterator<Item = &FieldKey> {
        self.hidden_fields
            .iter()
            .filter(|(_, hidden)| **hidden)
            .map(|(key, _)| key)
    }
}
