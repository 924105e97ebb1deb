//! Office suite PDF backend (LibreOffice / soffice).

use std::ffi::OsStr;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tracing::{debug, info};

use crate::backend::{expected_output, require_output, run_program, BackendError, PdfBackend};

/// Binaries searched on PATH, in order.
pub const OFFICE_PROGRAMS: [&str; 2] = ["soffice", "libreoffice"];

/// Backend running a headless office suite.
#[derive(Debug, Clone, Default)]
pub struct OfficeBackend {
    program: Option<PathBuf>,
}

impl OfficeBackend {
    /// Backend that searches PATH for the office suite.
    pub fn new() -> Self {
        Self::default()
    }

    /// Backend using a specific binary.
    pub fn with_program(program: impl Into<PathBuf>) -> Self {
        let program = program.into();
        Self {
            program: (!program.as_os_str().is_empty()).then_some(program),
        }
    }

    /// The binary to run, if one can be found.
    pub fn resolve_program(&self) -> Result<PathBuf, BackendError> {
        if let Some(program) = &self.program {
            return Ok(program.clone());
        }

        OFFICE_PROGRAMS
            .iter()
            .find_map(|name| which::which(name).ok())
            .ok_or_else(|| {
                BackendError::NotFound(format!(
                    "none of {} found on PATH",
                    OFFICE_PROGRAMS.join(", ")
                ))
            })
    }
}

#[async_trait]
impl PdfBackend for OfficeBackend {
    fn name(&self) -> &str {
        "office"
    }

    async fn try_convert(&self, source: &Path, out_dir: &Path) -> Result<PathBuf, BackendError> {
        let program = self.resolve_program()?;
        debug!("Converting {:?} with {:?}", source, program);

        let args: [&OsStr; 6] = [
            OsStr::new("--headless"),
            OsStr::new("--convert-to"),
            OsStr::new("pdf"),
            OsStr::new("--outdir"),
            out_dir.as_os_str(),
            source.as_os_str(),
        ];
        run_program(&program, &args).await?;

        let output = require_output(expected_output(source, out_dir))?;
        info!("Converted {:?} to PDF with {:?}", source, program);
        Ok(output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_explicit_program_wins() {
        let backend = OfficeBackend::with_program("/opt/office/program/soffice");
        assert_eq!(
            backend.resolve_program().unwrap(),
            PathBuf::from("/opt/office/program/soffice")
        );
    }

    #[test]
    fn test_empty_program_means_search() {
        assert_eq!(OfficeBackend::with_program("").program, None);
    }

    #[tokio::test]
    async fn test_missing_explicit_program() {
        let dir = tempfile::tempdir().unwrap();
        let backend = OfficeBackend::with_program(dir.path().join("no-soffice"));
        let result = backend
            .try_convert(&dir.path().join("a.docx"), dir.path())
            .await;
        assert!(matches!(result, Err(BackendError::NotFound(_))));
    }
}
