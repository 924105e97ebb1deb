//! Error types for the generation pipeline.

use docfill_convert::ConvertError;
use docfill_templates::TemplateError;
use thiserror::Error;

/// Result type alias for core operations.
pub type CoreResult<T> = Result<T, CoreError>;

/// Errors that can occur while generating a document.
#[derive(Error, Debug)]
pub enum CoreError {
    #[error("No template selected")]
    MissingTemplate,

    #[error(transparent)]
    Template(#[from] TemplateError),

    #[error(transparent)]
    Convert(#[from] ConvertError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Background task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

impl CoreError {
    /// Whether the error was caused by the request rather than the server.
    pub fn is_user_error(&self) -> bool {
        match self {
            Self::MissingTemplate => true,
            Self::Template(e) => e.is_user_error(),
            Self::Convert(ConvertError::UnsupportedFormat(_)) => true,
            _ => false,
        }
    }
}
