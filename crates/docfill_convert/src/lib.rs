//! # docfill_convert
//!
//! Output production for docfill: rendered documents are either passed
//! through in their native format or converted to PDF by a chain of
//! backends.
//!
//! # Features
//!
//! - **Backend chain**: backends are tried in order; unsupported or missing
//!   backends are skipped, a backend that runs and fails ends the chain
//! - **Library-level backend**: `docx2pdf` on Windows and macOS
//! - **Office suite backend**: headless `soffice`/`libreoffice`, with a
//!   `SOFFICE_PATH` override
//! - **Mock backend**: for testing without converters installed
//!
//! # Example
//!
//! ```rust,no_run
//! use docfill_convert::{ConverterConfig, FormatConverter, OutputFormat, RenderedDocument};
//! use docfill_templates::DocumentFormat;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let converter = FormatConverter::from_config(&ConverterConfig::default());
//!     let work_dir = tempfile::tempdir()?;
//!
//!     let document = RenderedDocument::new("invoice", DocumentFormat::Docx, std::fs::read("invoice.docx")?);
//!     let artifact = converter.produce(document, OutputFormat::Pdf, work_dir.path()).await?;
//!     println!("{} ({} bytes)", artifact.file_name, artifact.bytes.len());
//!
//!     Ok(())
//! }
//! ```

pub mod backend;
pub mod config;
pub mod converter;
pub mod docx2pdf;
pub mod error;
pub mod mock;
pub mod office;

pub use backend::{BackendError, PdfBackend};
pub use config::{ConverterConfig, SOFFICE_PATH_ENV};
pub use converter::{Artifact, FormatConverter, OutputFormat, RenderedDocument, PDF_MEDIA_TYPE};
pub use docx2pdf::Docx2PdfBackend;
pub use error::{ConvertError, ConvertResult};
pub use mock::{CapturedCall, MockBackend, MockOutcome};
pub use office::OfficeBackend;
