//! # docfill_templates
//!
//! Template introspection and rendering for docfill.
//!
//! A template is an office document (DOCX or ODT) whose text contains
//! `{{ variable }}` placeholders and `{% if %}`/`{% for %}` blocks in the
//! Jinja-like syntax of [`tera`]. This crate
//! covers everything between the raw template bytes and the rendered
//! native document:
//!
//! - Template discovery through a [`TemplateStore`]
//! - Placeholder extraction with a regex fallback and a per-template cache
//! - Field schemas merged from optional YAML sidecar metadata
//! - Coercion of raw form strings into typed values
//! - Deterministic rendering back into the native archive format
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::collections::HashMap;
//! use std::sync::Arc;
//! use docfill_templates::{coerce, DocumentRenderer, FsTemplateStore, SchemaBuilder, TemplateStore};
//!
//! let store = Arc::new(FsTemplateStore::new("docx_templates"));
//! let schema = SchemaBuilder::new(store.clone());
//!
//! let fields = schema.build("invoice.docx").unwrap();
//! let mut form = HashMap::new();
//! form.insert("client".to_string(), "ACME".to_string());
//! let context = coerce(&fields, &form).unwrap();
//!
//! let bytes = store.read_template("invoice.docx").unwrap();
//! let rendered = DocumentRenderer::new().render("invoice.docx", &bytes, &context).unwrap();
//! ```

pub mod archive;
pub mod coerce;
pub mod engine;
pub mod error;
pub mod extractor;
pub mod format;
pub mod markup;
pub mod metadata;
pub mod renderer;
pub mod schema;
pub mod store;

pub use archive::TemplateArchive;
pub use coerce::{coerce, coerce_all, coerce_value, RenderContext, TypedValue};
pub use error::{TemplateError, TemplateResult};
pub use extractor::{
    ExtractionOutcome, PlaceholderCache, PlaceholderExtractor, PlaceholderSet, TemplateIdentity,
};
pub use format::DocumentFormat;
pub use metadata::{FieldMeta, TemplateMetadata};
pub use renderer::DocumentRenderer;
pub use schema::{build_fields, FieldDefinition, FieldType, SchemaBuilder};
pub use store::{FsTemplateStore, TemplateStore};
