//! Rendering templates into native documents.

use std::collections::HashMap;

use tracing::{debug, info};

use crate::archive::{check_well_formed, TemplateArchive};
use crate::coerce::RenderContext;
use crate::engine::{ParseError, RenderError, Template};
use crate::error::{TemplateError, TemplateResult};
use crate::format::DocumentFormat;
use crate::markup;

/// Renders template archives against a render context.
#[derive(Debug, Clone, Default)]
pub struct DocumentRenderer;

impl DocumentRenderer {
    pub fn new() -> Self {
        Self
    }

    /// Render a template into a document of the same format.
    ///
    /// When every markup part parses, all of them are evaluated by the
    /// engine. If any part uses an unsupported construct, only the simple
    /// placeholders of the main part are substituted. A variable missing
    /// from the context fails the whole render; no partial output is
    /// produced.
    pub fn render(
        &self,
        template: &str,
        bytes: &[u8],
        context: &RenderContext,
    ) -> TemplateResult<Vec<u8>> {
        let format = DocumentFormat::from_file_name(template)
            .ok_or_else(|| TemplateError::NotFound(template.to_string()))?;
        let archive = TemplateArchive::open(template, format, bytes)?;
        let parts = archive.markup_parts()?;

        let mut compiled = Vec::with_capacity(parts.len());
        let mut unsupported = None;
        for part in &parts {
            match Template::parse(&markup::prepare(&part.xml)) {
                Ok(parsed) => compiled.push((part.name.as_str(), parsed)),
                Err(ParseError::Unsupported(what)) => {
                    unsupported = Some(format!("{}: {}", part.name, what));
                    break;
                }
                Err(ParseError::Syntax(what)) => {
                    return Err(TemplateError::corrupt(
                        template,
                        format!("{}: {}", part.name, what),
                    ))
                }
            }
        }

        let mut replacements = HashMap::new();
        match unsupported {
            None => {
                for (name, parsed) in compiled {
                    let xml = parsed.render(context).map_err(|e| match e {
                        RenderError::Missing(variable) => TemplateError::RenderIncomplete(variable),
                        RenderError::Failed(reason) => {
                            TemplateError::corrupt(template, format!("{}: {}", name, reason))
                        }
                    })?;
                    replacements.insert(name.to_string(), xml);
                }
            }
            Some(reason) => {
                debug!("Substituting main part only for {}: {}", template, reason);
                let main = parts
                    .first()
                    .ok_or_else(|| TemplateError::corrupt(template, "no markup parts"))?;
                let xml = markup::substitute(&main.xml, context)
                    .map_err(TemplateError::RenderIncomplete)?;
                replacements.insert(main.name.clone(), xml);
            }
        }

        // Blocks that open and close in different XML elements break the part.
        for (name, xml) in &replacements {
            check_well_formed(xml).map_err(|reason| {
                TemplateError::corrupt(template, format!("{} after rendering: {}", name, reason))
            })?;
        }

        let rendered = archive.write(&replacements)?;
        info!("Rendered {} ({} bytes)", template, rendered.len());
        Ok(rendered)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coerce::TypedValue;
    use std::io::{Cursor, Read, Write};
    use zip::write::SimpleFileOptions;
    use zip::{ZipArchive, ZipWriter};

    fn docx(document: &str) -> Vec<u8> {
        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
        writer
            .start_file("word/document.xml", SimpleFileOptions::default())
            .unwrap();
        writer.write_all(document.as_bytes()).unwrap();
        writer.finish().unwrap().into_inner()
    }

    fn main_xml(bytes: &[u8]) -> String {
        let mut zip = ZipArchive::new(Cursor::new(bytes)).unwrap();
        let mut xml = String::new();
        zip.by_name("word/document.xml")
            .unwrap()
            .read_to_string(&mut xml)
            .unwrap();
        xml
    }

    fn context(pairs: &[(&str, TypedValue)]) -> RenderContext {
        let mut ctx = RenderContext::new();
        for (k, v) in pairs {
            ctx.insert(*k, v.clone());
        }
        ctx
    }

    #[test]
    fn test_engine_mode() {
        let bytes = docx("<d><t>{{ name | upper }}</t>{% if vip %}<t>VIP</t>{% endif %}</d>");
        let ctx = context(&[
            ("name", TypedValue::Text("a&b".into())),
            ("vip", TypedValue::Bool(false)),
        ]);
        let out = DocumentRenderer::new().render("t.docx", &bytes, &ctx).unwrap();
        assert_eq!(main_xml(&out), "<d><t>A&amp;B</t></d>");
    }

    #[test]
    fn test_substitution_mode_for_unsupported() {
        let bytes = docx("<d><t>{{ name }}</t><t>{{ note | default('none') }}</t></d>");
        let ctx = context(&[("name", TypedValue::Int(7))]);
        let out = DocumentRenderer::new().render("t.docx", &bytes, &ctx).unwrap();
        assert_eq!(main_xml(&out), "<d><t>7</t><t>{{ note | default('none') }}</t></d>");
    }

    #[test]
    fn test_engine_mode_loops_over_lines() {
        let bytes = docx("<d>{% for item in items %}<t>{{ loop.index }}. {{ item }}</t>{% endfor %}</d>");
        let ctx = context(&[("items", TypedValue::Text("pens\npaper".into()))]);
        let out = DocumentRenderer::new().render("t.docx", &bytes, &ctx).unwrap();
        assert_eq!(main_xml(&out), "<d><t>1. pens</t><t>2. paper</t></d>");
    }

    #[test]
    fn test_member_access_is_incomplete() {
        let bytes = docx("<d>{{ client.name }}</d>");
        let ctx = context(&[("client", TypedValue::Text("ACME".into()))]);
        let err = DocumentRenderer::new().render("t.docx", &bytes, &ctx).unwrap_err();
        assert!(matches!(err, TemplateError::RenderIncomplete(ref v) if v == "client.name"));
    }

    #[test]
    fn test_missing_variable() {
        let bytes = docx("<d>{{ name }}</d>");
        let err = DocumentRenderer::new()
            .render("t.docx", &bytes, &RenderContext::new())
            .unwrap_err();
        assert!(matches!(err, TemplateError::RenderIncomplete(ref v) if v == "name"));
    }

    #[test]
    fn test_block_across_elements_is_corrupt() {
        let bytes = docx("<d><p>{% if a %}</p><q>{% endif %}</q></d>");
        let ctx = context(&[("a", TypedValue::Bool(false))]);
        let err = DocumentRenderer::new().render("t.docx", &bytes, &ctx).unwrap_err();
        assert!(matches!(err, TemplateError::TemplateCorrupt { .. }));
    }

    #[test]
    fn test_unknown_extension() {
        let err = DocumentRenderer::new()
            .render("t.pdf", b"", &RenderContext::new())
            .unwrap_err();
        assert!(matches!(err, TemplateError::NotFound(_)));
    }
}
