//! Library-level PDF backend.
//!
//! `docx2pdf` drives Microsoft Word through its automation interface, so it
//! only works on Windows and macOS and only for DOCX input.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use docfill_templates::DocumentFormat;
use tracing::debug;

use crate::backend::{expected_output, run_program, BackendError, PdfBackend};
use crate::config::DEFAULT_DOCX2PDF_PROGRAM;

/// Backend running the `docx2pdf` converter.
#[derive(Debug, Clone)]
pub struct Docx2PdfBackend {
    program: String,
    host_supported: bool,
}

impl Default for Docx2PdfBackend {
    fn default() -> Self {
        Self::new(DEFAULT_DOCX2PDF_PROGRAM)
    }
}

impl Docx2PdfBackend {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            host_supported: cfg!(any(target_os = "windows", target_os = "macos")),
        }
    }

    /// Override host detection.
    pub fn host_supported(mut self, supported: bool) -> Self {
        self.host_supported = supported;
        self
    }

    fn resolve_program(&self) -> Result<PathBuf, BackendError> {
        which::which(&self.program)
            .map_err(|e| BackendError::NotFound(format!("{}: {}", self.program, e)))
    }
}

#[async_trait]
impl PdfBackend for Docx2PdfBackend {
    fn name(&self) -> &str {
        "docx2pdf"
    }

    async fn try_convert(&self, source: &Path, out_dir: &Path) -> Result<PathBuf, BackendError> {
        if !self.host_supported {
            return Err(BackendError::Unsupported(format!(
                "{} requires Windows or macOS",
                self.name()
            )));
        }

        let file_name = source.to_string_lossy();
        if DocumentFormat::from_file_name(&file_name) != Some(DocumentFormat::Docx) {
            return Err(BackendError::Unsupported(format!(
                "{} only converts DOCX input",
                self.name()
            )));
        }

        let program = self.resolve_program()?;
        let output = expected_output(source, out_dir);
        debug!("Converting {:?} with {:?}", source, program);
        run_program(&program, &[source.as_os_str(), output.as_os_str()]).await?;
        Ok(output)
    }
}
