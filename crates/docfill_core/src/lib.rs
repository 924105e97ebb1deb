//! # docfill_core
//!
//! The generation pipeline for docfill.
//!
//! [`DocumentService`] ties the template crate and the converter together:
//!
//! 1. read the template from its store
//! 2. build the field schema (placeholders merged with sidecar metadata)
//! 3. coerce submitted values into a render context
//! 4. render the native document
//! 5. pass it through or convert it to PDF inside a temporary directory
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use docfill_convert::{ConverterConfig, FormatConverter};
//! use docfill_core::{DocumentService, GenerateRequest};
//! use docfill_templates::FsTemplateStore;
//!
//! # async fn run() -> docfill_core::CoreResult<()> {
//! let service = DocumentService::new(
//!     Arc::new(FsTemplateStore::new("docx_templates")),
//!     FormatConverter::from_config(&ConverterConfig::default()),
//! );
//!
//! let request = GenerateRequest::new("invoice.docx").format("pdf").value("client", "ACME");
//! let artifact = service.generate(&request).await?;
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod request;
pub mod service;

pub use error::{CoreError, CoreResult};
pub use request::{GenerateRequest, FORMAT_KEY, TEMPLATE_KEY};
pub use service::{DocumentService, TemplateCheck};
