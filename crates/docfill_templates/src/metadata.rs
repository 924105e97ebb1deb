//! Sidecar metadata for templates.
//!
//! A template `invoice.docx` may ship with `invoice.yaml` describing its
//! fields:
//!
//! ```yaml
//! amount:
//!   label: Amount due
//!   type: float
//! currency:
//!   type: string
//!   choices: [EUR, USD]
//! ```
//!
//! Every key is optional. Unknown `type` values are rejected when the file
//! is loaded.

use std::collections::HashMap;

use serde::Deserialize;
use serde_yaml::Value;

use crate::error::{TemplateError, TemplateResult};
use crate::schema::FieldType;

/// Field entry as written in the sidecar file.
#[derive(Debug, Default, Deserialize)]
struct RawFieldMeta {
    #[serde(default)]
    label: Option<String>,
    #[serde(default, rename = "type")]
    field_type: Option<String>,
    #[serde(default)]
    choices: Option<Vec<Value>>,
}

/// Validated metadata for one field.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldMeta {
    pub label: Option<String>,
    pub field_type: Option<FieldType>,
    pub choices: Vec<String>,
}

/// Validated metadata for a template.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TemplateMetadata {
    fields: HashMap<String, FieldMeta>,
}

impl TemplateMetadata {
    /// Metadata with no overrides.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Parse and validate sidecar YAML.
    pub fn parse(text: &str) -> TemplateResult<Self> {
        if text.trim().is_empty() {
            return Ok(Self::empty());
        }

        let document: Value = serde_yaml::from_str(text).map_err(|e| invalid("<document>", e))?;
        let mapping = match document {
            Value::Null => return Ok(Self::empty()),
            Value::Mapping(mapping) => mapping,
            _ => return Err(invalid("<document>", "expected a mapping of field names")),
        };

        let mut fields = HashMap::with_capacity(mapping.len());
        for (key, value) in mapping {
            let name = scalar_to_string(&key)
                .ok_or_else(|| invalid("<document>", "field names must be scalars"))?;
            let meta = Self::parse_field(&name, value)?;
            fields.insert(name, meta);
        }

        Ok(Self { fields })
    }

    fn parse_field(name: &str, value: Value) -> TemplateResult<FieldMeta> {
        let raw = match value {
            Value::Null => RawFieldMeta::default(),
            Value::Mapping(_) => {
                serde_yaml::from_value::<RawFieldMeta>(value).map_err(|e| invalid(name, e))?
            }
            _ => return Err(invalid(name, "expected a mapping")),
        };

        let field_type = raw
            .field_type
            .map(|t| {
                t.parse::<FieldType>()
                    .map_err(|_| invalid(name, format!("unknown type '{}'", t)))
            })
            .transpose()?;

        let choices = raw
            .choices
            .unwrap_or_default()
            .iter()
            .map(|choice| {
                scalar_to_string(choice)
                    .ok_or_else(|| invalid(name, "choices must be scalar values"))
            })
            .collect::<TemplateResult<Vec<_>>>()?;

        Ok(FieldMeta {
            label: raw.label,
            field_type,
            choices,
        })
    }

    pub fn get(&self, name: &str) -> Option<&FieldMeta> {
        self.fields.get(name)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn invalid(field: &str, reason: impl ToString) -> TemplateError {
    TemplateError::MetadataInvalid {
        field: field.to_string(),
        reason: reason.to_string(),
    }
}
