//! Error types for templates.

use thiserror::Error;

/// Result type alias for template operations.
pub type TemplateResult<T> = Result<T, TemplateError>;

/// Errors that can occur during template operations.
#[derive(Error, Debug)]
pub enum TemplateError {
    #[error("Template not found: {0}")]
    NotFound(String),

    #[error("Template {template} is corrupt: {reason}")]
    TemplateCorrupt { template: String, reason: String },

    #[error("Invalid metadata for field '{field}': {reason}")]
    MetadataInvalid { field: String, reason: String },

    #[error("Invalid value for field '{field}': expected {expected}")]
    FieldInvalid { field: String, expected: String },

    #[error("Render context is missing variable: {0}")]
    RenderIncomplete(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl TemplateError {
    pub(crate) fn corrupt(template: impl Into<String>, reason: impl ToString) -> Self {
        Self::TemplateCorrupt {
            template: template.into(),
            reason: reason.to_string(),
        }
    }

    /// Whether the error was caused by user input rather than the template.
    pub fn is_user_error(&self) -> bool {
        matches!(self, Self::FieldInvalid { .. } | Self::NotFound(_))
    }
}
