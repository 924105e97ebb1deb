//! Field schemas derived from template placeholders and metadata.

use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{TemplateError, TemplateResult};
use crate::extractor::{PlaceholderCache, PlaceholderSet};
use crate::format::DocumentFormat;
use crate::metadata::TemplateMetadata;
use crate::store::TemplateStore;

/// Declared type of a form field.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    #[default]
    String,
    Date,
    Int,
    Float,
    Bool,
}

impl FieldType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Date => "date",
            Self::Int => "int",
            Self::Float => "float",
            Self::Bool => "bool",
        }
    }

    pub fn all() -> [Self; 5] {
        [Self::String, Self::Date, Self::Int, Self::Float, Self::Bool]
    }
}

impl FromStr for FieldType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::all()
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| format!("unknown field type: {}", s))
    }
}

impl std::fmt::Display for FieldType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One form field of a template.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FieldDefinition {
    pub name: String,
    pub label: String,
    #[serde(rename = "type")]
    pub field_type: FieldType,
    pub choices: Vec<String>,
}

impl FieldDefinition {
    /// Field with every default applied.
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            label: name.clone(),
            name,
            field_type: FieldType::default(),
            choices: Vec::new(),
        }
    }
}

/// Merge placeholders with metadata.
///
/// The result holds one field per placeholder in ascending name order.
/// Metadata for names that are not placeholders is ignored.
pub fn build_fields(
    placeholders: &PlaceholderSet,
    metadata: &TemplateMetadata,
) -> Vec<FieldDefinition> {
    placeholders
        .iter()
        .map(|name| {
            let mut field = FieldDefinition::new(name.as_str());
            if let Some(meta) = metadata.get(name) {
                if let Some(label) = &meta.label {
                    field.label = label.clone();
                }
                if let Some(field_type) = meta.field_type {
                    field.field_type = field_type;
                }
                field.choices = meta.choices.clone();
            }
            field
        })
        .collect()
}

/// Builds field schemas for templates in a store.
pub struct SchemaBuilder {
    store: Arc<dyn TemplateStore>,
    cache: PlaceholderCache,
}

impl SchemaBuilder {
    pub fn new(store: Arc<dyn TemplateStore>) -> Self {
        Self::with_cache(store, PlaceholderCache::new())
    }

    pub fn with_cache(store: Arc<dyn TemplateStore>, cache: PlaceholderCache) -> Self {
        Self { store, cache }
    }

    pub fn store(&self) -> &Arc<dyn TemplateStore> {
        &self.store
    }

    pub fn cache(&self) -> &PlaceholderCache {
        &self.cache
    }

    /// Placeholder set of a template, through the cache.
    pub fn placeholders(&self, template: &str) -> TemplateResult<Arc<PlaceholderSet>> {
        let bytes = self.store.read_template(template)?;
        self.placeholders_of(template, &bytes)
    }

    fn placeholders_of(&self, template: &str, bytes: &[u8]) -> TemplateResult<Arc<PlaceholderSet>> {
        let format = DocumentFormat::from_file_name(template)
            .ok_or_else(|| TemplateError::NotFound(template.to_string()))?;
        self.cache.get_or_extract(template, format, bytes)
    }

    /// Load and validate a template's sidecar metadata.
    pub fn metadata(&self, template: &str) -> TemplateResult<TemplateMetadata> {
        match self.store.read_metadata(template)? {
            Some(text) => TemplateMetadata::parse(&text),
            None => {
                debug!("No metadata for {}, using defaults", template);
                Ok(TemplateMetadata::empty())
            }
        }
    }

    /// Build the field schema of a stored template.
    pub fn build(&self, template: &str) -> TemplateResult<Vec<FieldDefinition>> {
        let bytes = self.store.read_template(template)?;
        self.build_with_bytes(template, &bytes)
    }

    /// Build the field schema from template bytes the caller already holds.
    pub fn build_with_bytes(
        &self,
        template: &str,
        bytes: &[u8],
    ) -> TemplateResult<Vec<FieldDefinition>> {
        let placeholders = self.placeholders_of(template, bytes)?;
        let metadata = self.metadata(template)?;
        let fields = build_fields(&placeholders, &metadata);
        info!("Built schema for {} with {} field(s)", template, fields.len());
        Ok(fields)
    }
}
