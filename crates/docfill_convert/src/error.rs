//! Error types for output conversion.

use thiserror::Error;

/// Result type alias for conversion operations.
pub type ConvertResult<T> = Result<T, ConvertError>;

/// Errors that can occur while producing an output document.
#[derive(Error, Debug)]
pub enum ConvertError {
    #[error("No PDF converter available: {0}")]
    ConverterNotFound(String),

    #[error("PDF conversion with {backend} failed: {diagnostics}")]
    ConversionFailed { backend: String, diagnostics: String },

    #[error("Unsupported output format: {0}")]
    UnsupportedFormat(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
