//! Template catalog.
//!
//! A template is the ordered list of default fields for one exam type and subtype. Each field
//! has a key, a human-readable label and default lines. The catalog is read-only: reports copy
//! what they need and never mutate a shared template.
//!
//! Two implementations are provided:
//! - [`YamlTemplateCatalog`] reads `<root>/<exam>/<subtype>.yaml`
//! - [`InMemoryTemplateCatalog`] serves fixed sets, used by tests and embedders
//!
//! Template files look like:
//!
//! ```yaml
//! fields:
//!   - key: Technique
//!     label: Technique
//!     lines: []
//!   - key: Conclusion
//!     label: Conclusion
//!     lines:
//!       - Conclusion normale
//! ```

use crate::constants::TEMPLATE_FILE_EXTENSION;
use crate::{ReportError, ReportResult};
use report_types::{FieldKey, NonEmptyText, SubType};
use report_uuid::CustomFieldId;
use report_wire::{is_blank_lines, LabelIndex};
use serde::Deserialize;
use std::collections::{BTreeSet, HashMap};
use std::future::Future;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// One default field of a template.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TemplateField {
    pub key: FieldKey,
    pub label: NonEmptyText,
    pub lines: Vec<String>,
}

impl TemplateField {
    /// Creates a template field.
    ///
    /// # Errors
    ///
    /// Returns [`ReportError::Text`] if the key or label is blank.
    pub fn new(key: &str, label: &str, lines: Vec<String>) -> ReportResult<Self> {
        Ok(Self {
            key: FieldKey::new(key)?,
            label: NonEmptyText::new(label)?,
            lines,
        })
    }

    /// Returns true if at least one default line is non-blank.
    pub fn has_content(&self) -> bool {
        !is_blank_lines(&self.lines)
    }
}

/// Ordered default fields for one (exam type, subtype).
///
/// Keys are unique and never use the reserved custom field prefix.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TemplateSet {
    fields: Vec<TemplateField>,
}

impl TemplateSet {
    /// Builds a template set, validating its keys.
    ///
    /// # Errors
    ///
    /// Returns [`ReportError::Catalog`] if a key is duplicated or uses the custom field prefix.
    pub fn new(fields: Vec<TemplateField>) -> ReportResult<Self> {
        let mut seen = BTreeSet::new();
        for field in &fields {
            if CustomFieldId::is_reserved(field.key.as_str()) {
                return Err(ReportError::Catalog(format!(
                    "template key '{}' uses the reserved custom field prefix",
                    field.key
                )));
            }
            if !seen.insert(field.key.as_str()) {
                return Err(ReportError::Catalog(format!(
                    "duplicate template key '{}'",
                    field.key
                )));
            }
        }
        Ok(Self { fields })
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn fields(&self) -> &[TemplateField] {
        &self.fields
    }

    pub fn get(&self, key: &str) -> Option<&TemplateField> {
        self.fields.iter().find(|field| field.key.as_str() == key)
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Returns true if any field has non-blank default content.
    pub fn has_content(&self) -> bool {
        self.fields.iter().any(TemplateField::has_content)
    }

    /// Label index used to decode label-keyed Doppler records.
    pub fn label_index(&self) -> LabelIndex {
        LabelIndex::new(
            self.fields
                .iter()
                .map(|field| (field.key.to_string(), field.label.as_str())),
        )
    }
}

/// Read-only provider of default field content.
pub trait TemplateCatalog: Send + Sync {
    /// Returns the template for `sub_type` (which also identifies the exam type).
    ///
    /// A subtype without a template yields an empty set, not an error.
    fn get_templates(
        &self,
        sub_type: SubType,
    ) -> impl Future<Output = ReportResult<TemplateSet>> + Send;
}

// ============================================================================
// YAML directory catalog
// ============================================================================

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct TemplateFileWire {
    fields: Vec<TemplateFieldWire>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct TemplateFieldWire {
    key: String,
    label: String,
    #[serde(default)]
    lines: Vec<String>,
}

/// Catalog backed by a directory of YAML files, one per (exam type, subtype).
#[derive(Clone, Debug)]
pub struct YamlTemplateCatalog {
    root: PathBuf,
}

impl YamlTemplateCatalog {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path of the template file for `sub_type`.
    pub fn template_path(&self, sub_type: SubType) -> PathBuf {
        self.root
            .join(sub_type.exam_type().as_str())
            .join(format!("{}.{TEMPLATE_FILE_EXTENSION}", sub_type.as_str()))
    }

    /// Parses the contents of a template file.
    ///
    /// # Errors
    ///
    /// Returns [`ReportError::Catalog`] if the YAML does not match the template schema (with the
    /// path of the offending member) or if the keys are invalid.
    pub fn parse(text: &str) -> ReportResult<TemplateSet> {
        let deserializer = serde_yaml::Deserializer::from_str(text);
        let wire: TemplateFileWire =
            serde_path_to_error::deserialize(deserializer).map_err(|err| {
                let path = err.path().to_string();
                let source = err.into_inner();
                ReportError::Catalog(format!("template schema mismatch at {path}: {source}"))
            })?;

        let fields = wire
            .fields
            .into_iter()
            .map(|field| TemplateField::new(&field.key, &field.label, field.lines))
            .collect::<ReportResult<Vec<_>>>()
            .map_err(|err| ReportError::Catalog(err.to_string()))?;

        TemplateSet::new(fields)
    }
}

impl TemplateCatalog for YamlTemplateCatalog {
    async fn get_templates(&self, sub_type: SubType) -> ReportResult<TemplateSet> {
        let path = self.template_path(sub_type);
        let text = match tokio::fs::read_to_string(&path).await {
            Ok(text) => text,
            Err(err) if err.kind() == ErrorKind::NotFound => {
                tracing::debug!("no template file at {}", path.display());
                return Ok(TemplateSet::empty());
            }
            Err(err) => {
                return Err(ReportError::TemplateFetch(format!(
                    "{}: {err}",
                    path.display()
                )))
            }
        };

        Self::parse(&text).map_err(|err| {
            ReportError::TemplateFetch(format!("{}: {err}", path.display()))
        })
    }
}

// ============================================================================
// In-memory catalog
// ============================================================================

/// Catalog serving fixed template sets.
///
/// Subtypes can also be configured to fail, which is how fetch failures are exercised.
#[derive(Clone, Debug, Default)]
pub struct InMemoryTemplateCatalog {
    sets: HashMap<SubType, TemplateSet>,
    failures: HashMap<SubType, String>,
}

impl InMemoryTemplateCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_templates(mut self, sub_type: SubType, templates: TemplateSet) -> Self {
        self.sets.insert(sub_type, templates);
        self
    }

    /// Makes every fetch for `sub_type` fail with `message`.
    pub fn with_failure(mut self, sub_type: SubType, message: impl Into<String>) -> Self {
        self.failures.insert(sub_type, message.into());
        self
    }
}

impl TemplateCatalog for InMemoryTemplateCatalog {
    async fn get_templates(&self, sub_type: SubType) -> ReportResult<TemplateSet> {
        if let Some(message) = self.failures.get(&sub_type) {
            return Err(ReportError::TemplateFetch(message.clone()));
        }
        Ok(self.sets.get(&sub_type).cloned().unwrap_or_default())
    }
}
