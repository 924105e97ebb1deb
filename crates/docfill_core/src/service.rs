//! The document generation pipeline.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use docfill_convert::{Artifact, FormatConverter, OutputFormat, RenderedDocument};
use docfill_templates::{
    coerce, DocumentRenderer, FieldDefinition, FieldType, RenderContext, SchemaBuilder,
    TemplateStore,
};
use serde::Serialize;
use tempfile::TempDir;
use tokio::task;
use tracing::{debug, info, warn};

use crate::error::CoreResult;
use crate::request::GenerateRequest;

/// Result of checking a single template.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct TemplateCheck {
    pub template: String,
    /// Number of fields when the check passed
    pub fields: Option<usize>,
    pub error: Option<String>,
}

impl TemplateCheck {
    pub fn passed(&self) -> bool {
        self.error.is_none()
    }
}

/// Schema, coercion, rendering and conversion behind one facade.
///
/// Template reads, archive parsing and rendering are blocking work; the
/// async methods run them on tokio's blocking pool.
pub struct DocumentService {
    store: Arc<dyn TemplateStore>,
    schema: Arc<SchemaBuilder>,
    renderer: DocumentRenderer,
    converter: FormatConverter,
}

impl DocumentService {
    pub fn new(store: Arc<dyn TemplateStore>, converter: FormatConverter) -> Self {
        Self {
            schema: Arc::new(SchemaBuilder::new(store.clone())),
            store,
            renderer: DocumentRenderer::new(),
            converter,
        }
    }

    pub fn store(&self) -> &Arc<dyn TemplateStore> {
        &self.store
    }

    pub fn schema(&self) -> &SchemaBuilder {
        &self.schema
    }

    pub fn converter(&self) -> &FormatConverter {
        &self.converter
    }

    /// Available template names, sorted.
    pub fn list_templates(&self) -> CoreResult<Vec<String>> {
        Ok(self.store.list()?)
    }

    /// Form fields of a template.
    pub fn field_schema(&self, template: &str) -> CoreResult<Vec<FieldDefinition>> {
        Ok(self.schema.build(template)?)
    }

    /// [`Self::list_templates`] off the async runtime.
    pub async fn load_templates(&self) -> CoreResult<Vec<String>> {
        let store = self.store.clone();
        Ok(task::spawn_blocking(move || store.list()).await??)
    }

    /// [`Self::field_schema`] off the async runtime.
    pub async fn load_field_schema(&self, template: &str) -> CoreResult<Vec<FieldDefinition>> {
        let schema = self.schema.clone();
        let template = template.to_string();
        Ok(task::spawn_blocking(move || schema.build(&template)).await??)
    }

    /// Coerce submitted values against a template's schema.
    pub fn build_context(
        &self,
        template: &str,
        values: &HashMap<String, String>,
    ) -> CoreResult<RenderContext> {
        let fields = self.schema.build(template)?;
        Ok(coerce(&fields, values)?)
    }

    /// Generate a document.
    ///
    /// Intermediate files live in a temporary directory that is removed when
    /// this returns, whether or not generation succeeded.
    pub async fn generate(&self, request: &GenerateRequest) -> CoreResult<Artifact> {
        let template = request.template.as_str();
        let job = request.clone();
        let store = self.store.clone();
        let schema = self.schema.clone();
        let renderer = self.renderer.clone();

        let (native, output, rendered) = task::spawn_blocking(move || -> CoreResult<_> {
            let template = job.template.as_str();
            let bytes = store.read_template(template)?;
            let native = store.native_format(template)?;
            let output = OutputFormat::parse(job.format.as_deref(), native)?;

            let fields = schema.build_with_bytes(template, &bytes)?;
            let context = coerce(&fields, &job.values)?;
            let rendered = renderer.render(template, &bytes, &context)?;
            Ok((native, output, rendered))
        })
        .await??;

        let work_dir = TempDir::new()?;
        debug!("Generating {} in {:?}", template, work_dir.path());
        let document = RenderedDocument::new(stem_of(template), native, rendered);
        let artifact = self
            .converter
            .produce(document, output, work_dir.path())
            .await?;

        info!(
            "Generated {} from {} ({} bytes)",
            artifact.file_name,
            template,
            artifact.bytes.len()
        );
        Ok(artifact)
    }

    /// Run every template through schema building and a sample render.
    pub fn check_templates(&self) -> CoreResult<Vec<TemplateCheck>> {
        let checks = self
            .store
            .list()?
            .into_iter()
            .map(|template| {
                let result = self.check_template(&template);
                if let Err(e) = &result {
                    warn!("Template {} failed its check: {}", template, e);
                }
                TemplateCheck {
                    fields: result.as_ref().ok().copied(),
                    error: result.err().map(|e| e.to_string()),
                    template,
                }
            })
            .collect();
        Ok(checks)
    }

    fn check_template(&self, template: &str) -> CoreResult<usize> {
        let bytes = self.store.read_template(template)?;
        let fields = self.schema.build_with_bytes(template, &bytes)?;
        let samples = fields
            .iter()
            .map(|f| (f.name.clone(), sample_value(f).to_string()))
            .collect();
        let context = coerce(&fields, &samples)?;
        self.renderer.render(template, &bytes, &context)?;
        Ok(fields.len())
    }
}

fn stem_of(template: &str) -> String {
    Path::new(template)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("document")
        .to_string()
}

/// Raw input every field of the given type accepts.
fn sample_value(field: &FieldDefinition) -> &str {
    if let Some(choice) = field.choices.first() {
        if field.field_type == FieldType::String {
            return choice;
        }
    }
    match field.field_type {
        FieldType::String => "sample",
        FieldType::Date => "2000-01-01",
        FieldType::Int => "1",
        FieldType::Float => "1.5",
        FieldType::Bool => "yes",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stem_of() {
        assert_eq!(stem_of("invoice.docx"), "invoice");
        assert_eq!(stem_of("letter.v2.odt"), "letter.v2");
    }

    #[test]
    fn test_sample_values_coerce() {
        for field_type in FieldType::all() {
            let mut field = FieldDefinition::new("x");
            field.field_type = field_type;
            let raw = sample_value(&field);
            assert!(
                docfill_templates::coerce_value(&field, raw).is_ok(),
                "{field_type}"
            );
        }
    }

    #[test]
    fn test_sample_prefers_first_choice() {
        let mut field = FieldDefinition::new("currency");
        field.choices = vec!["EUR".into(), "USD".into()];
        assert_eq!(sample_value(&field), "EUR");
    }
}
