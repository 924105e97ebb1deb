//! Output format selection and the PDF backend chain.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use docfill_templates::DocumentFormat;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info};
use uuid::Uuid;

use crate::backend::{BackendError, PdfBackend};
use crate::config::ConverterConfig;
use crate::docx2pdf::Docx2PdfBackend;
use crate::error::{ConvertError, ConvertResult};
use crate::office::OfficeBackend;

pub const PDF_MEDIA_TYPE: &str = "application/pdf";

/// Requested output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// The template's own format
    Native,
    Pdf,
}

impl OutputFormat {
    /// Parse a user-supplied format selector (case-insensitive).
    ///
    /// Absent, empty, `native` or the template's own extension select the
    /// native format.
    pub fn parse(selector: Option<&str>, native: DocumentFormat) -> ConvertResult<Self> {
        let raw = selector.unwrap_or("").trim();
        let value = raw.to_ascii_lowercase();
        match value.as_str() {
            "pdf" => Ok(Self::Pdf),
            "" | "native" => Ok(Self::Native),
            ext if ext == native.extension() => Ok(Self::Native),
            _ => Err(ConvertError::UnsupportedFormat(raw.to_string())),
        }
    }
}

/// A rendered document in its native format.
#[derive(Debug, Clone)]
pub struct RenderedDocument {
    /// Template file stem, used to name outputs
    pub stem: String,
    pub format: DocumentFormat,
    pub bytes: Vec<u8>,
}

impl RenderedDocument {
    pub fn new(stem: impl Into<String>, format: DocumentFormat, bytes: Vec<u8>) -> Self {
        Self {
            stem: stem.into(),
            format,
            bytes,
        }
    }

    pub fn file_name(&self) -> String {
        format!("{}.{}", self.stem, self.format.extension())
    }
}

/// A generated document ready to hand to the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    pub bytes: Vec<u8>,
    pub media_type: String,
    pub file_name: String,
}

impl Artifact {
    /// Artifact named `<stem>-<random hex>.<extension>`.
    pub fn new(stem: &str, extension: &str, media_type: &str, bytes: Vec<u8>) -> Self {
        Self {
            bytes,
            media_type: media_type.to_string(),
            file_name: format!("{}-{}.{}", stem, Uuid::new_v4().simple(), extension),
        }
    }
}

/// Produces native or PDF artifacts.
pub struct FormatConverter {
    backends: Vec<Arc<dyn PdfBackend>>,
}

impl FormatConverter {
    /// Converter with an explicit backend chain, tried in order.
    pub fn new(backends: Vec<Arc<dyn PdfBackend>>) -> Self {
        Self { backends }
    }

    /// The default chain: library-level backend, then the office suite.
    pub fn from_config(config: &ConverterConfig) -> Self {
        let mut backends: Vec<Arc<dyn PdfBackend>> = Vec::new();
        if config.use_docx2pdf {
            backends.push(Arc::new(Docx2PdfBackend::new(
                config.docx2pdf_program.clone(),
            )));
        }
        backends.push(Arc::new(match &config.soffice_path {
            Some(path) => OfficeBackend::with_program(path.clone()),
            None => OfficeBackend::new(),
        }));
        Self::new(backends)
    }

    pub fn backend_names(&self) -> Vec<&str> {
        self.backends.iter().map(|b| b.name()).collect()
    }

    /// Run the backend chain on a document already on disk.
    ///
    /// Backends that are unsupported or missing are skipped. The first
    /// backend that runs and fails ends the chain; nothing is retried.
    pub async fn to_pdf(&self, source: &Path, out_dir: &Path) -> ConvertResult<PathBuf> {
        let mut skipped = Vec::new();

        for backend in &self.backends {
            match backend.try_convert(source, out_dir).await {
                Ok(path) => {
                    info!("Converted {:?} with {}", source, backend.name());
                    return Ok(path);
                }
                Err(BackendError::Failed { diagnostics }) => {
                    error!("PDF backend {} failed: {}", backend.name(), diagnostics);
                    return Err(ConvertError::ConversionFailed {
                        backend: backend.name().to_string(),
                        diagnostics,
                    });
                }
                Err(skip) => {
                    debug!("Skipping PDF backend {}: {}", backend.name(), skip);
                    skipped.push(format!("{} {}", backend.name(), skip));
                }
            }
        }

        if skipped.is_empty() {
            skipped.push("no backends configured".to_string());
        }
        Err(ConvertError::ConverterNotFound(skipped.join("; ")))
    }

    /// Turn a rendered document into the requested artifact.
    ///
    /// PDF conversion writes its input and output under `work_dir`, which the
    /// caller owns and cleans up.
    pub async fn produce(
        &self,
        document: RenderedDocument,
        format: OutputFormat,
        work_dir: &Path,
    ) -> ConvertResult<Artifact> {
        match format {
            OutputFormat::Native => Ok(Artifact::new(
                &document.stem,
                document.format.extension(),
                document.format.media_type(),
                document.bytes,
            )),
            OutputFormat::Pdf => {
                let source = work_dir.join(document.file_name());
                tokio::fs::write(&source, &document.bytes).await?;
                let pdf = self.to_pdf(&source, work_dir).await?;
                let bytes = tokio::fs::read(&pdf).await?;
                Ok(Artifact::new(&document.stem, "pdf", PDF_MEDIA_TYPE, bytes))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::{MockBackend, MOCK_PDF};

    fn chain(backends: &[&MockBackend]) -> FormatConverter {
        FormatConverter::new(
            backends
                .iter()
                .map(|b| Arc::new((*b).clone()) as Arc<dyn PdfBackend>)
                .collect(),
        )
    }

    #[test]
    fn test_parse_format() {
        let docx = DocumentFormat::Docx;
        assert_eq!(OutputFormat::parse(Some("PDF"), docx).unwrap(), OutputFormat::Pdf);
        assert_eq!(OutputFormat::parse(None, docx).unwrap(), OutputFormat::Native);
        assert_eq!(OutputFormat::parse(Some(""), docx).unwrap(), OutputFormat::Native);
        assert_eq!(OutputFormat::parse(Some("Docx"), docx).unwrap(), OutputFormat::Native);
        assert_eq!(
            OutputFormat::parse(Some("native"), DocumentFormat::Odt).unwrap(),
            OutputFormat::Native
        );
        assert!(matches!(
            OutputFormat::parse(Some("html"), docx),
            Err(ConvertError::UnsupportedFormat(f)) if f == "html"
        ));
        assert!(OutputFormat::parse(Some("odt"), docx).is_err());
    }

    #[test]
    fn test_artifact_name() {
        let artifact = Artifact::new("invoice", "pdf", PDF_MEDIA_TYPE, Vec::new());
        let rest = artifact.file_name.strip_prefix("invoice-").unwrap();
        let (hex, ext) = rest.split_once('.').unwrap();
        assert_eq!(ext, "pdf");
        assert_eq!(hex.len(), 32);
        assert!(hex.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_default_chain() {
        let config = ConverterConfig::new().search_soffice();
        let converter = FormatConverter::from_config(&config);
        assert_eq!(converter.backend_names(), vec!["docx2pdf", "office"]);

        let converter = FormatConverter::from_config(&config.without_docx2pdf());
        assert_eq!(converter.backend_names(), vec!["office"]);
    }

    #[tokio::test]
    async fn test_falls_through_to_second_backend() {
        let dir = tempfile::tempdir().unwrap();
        let first = MockBackend::unsupported("a", "host");
        let second = MockBackend::new("b");
        let converter = chain(&[&first, &second]);

        let document = RenderedDocument::new("invoice", DocumentFormat::Docx, b"docx".to_vec());
        let artifact = converter
            .produce(document, OutputFormat::Pdf, dir.path())
            .await
            .unwrap();

        assert_eq!(artifact.bytes, MOCK_PDF);
        assert_eq!(artifact.media_type, PDF_MEDIA_TYPE);
        assert!(artifact.file_name.ends_with(".pdf"));
        assert_eq!(first.call_count(), 1);
        assert_eq!(second.call_count(), 1);
        assert_eq!(second.get_calls()[0].source, dir.path().join("invoice.docx"));
    }

    #[tokio::test]
    async fn test_failure_stops_chain() {
        let dir = tempfile::tempdir().unwrap();
        let failing = MockBackend::failing("a", "bad input");
        let never = MockBackend::new("b");
        let converter = chain(&[&failing, &never]);

        let err = converter
            .to_pdf(&dir.path().join("x.docx"), dir.path())
            .await
            .unwrap_err();
        match err {
            ConvertError::ConversionFailed { backend, diagnostics } => {
                assert_eq!(backend, "a");
                assert_eq!(diagnostics, "bad input");
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(never.call_count(), 0);
    }

    #[tokio::test]
    async fn test_all_skipped_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let converter = chain(&[
            &MockBackend::unsupported("a", "host"),
            &MockBackend::not_found("b", "no soffice"),
        ]);

        let document = RenderedDocument::new("x", DocumentFormat::Docx, Vec::new());
        let err = converter
            .produce(document, OutputFormat::Pdf, dir.path())
            .await
            .unwrap_err();
        match err {
            ConvertError::ConverterNotFound(reasons) => {
                assert!(reasons.contains("no soffice"));
                assert!(reasons.contains("host"));
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(!dir.path().join("x.pdf").exists());
    }

    #[tokio::test]
    async fn test_native_passthrough() {
        let dir = tempfile::tempdir().unwrap();
        let backend = MockBackend::new("a");
        let converter = chain(&[&backend]);

        let document = RenderedDocument::new("letter", DocumentFormat::Odt, b"odt".to_vec());
        let artifact = converter
            .produce(document, OutputFormat::Native, dir.path())
            .await
            .unwrap();
        assert_eq!(artifact.bytes, b"odt");
        assert_eq!(artifact.media_type, "application/vnd.oasis.opendocument.text");
        assert!(artifact.file_name.starts_with("letter-"));
        assert!(artifact.file_name.ends_with(".odt"));
        assert_eq!(backend.call_count(), 0);
    }
}
