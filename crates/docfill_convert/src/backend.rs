//! PDF backend trait and shared process helpers.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use thiserror::Error;
use tokio::process::Command;
use tracing::debug;

/// Why a single backend did not produce a PDF.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BackendError {
    /// The backend cannot handle this host or input at all
    #[error("unsupported: {0}")]
    Unsupported(String),

    /// The backend's program is not installed
    #[error("not found: {0}")]
    NotFound(String),

    /// The backend ran and failed
    #[error("failed: {diagnostics}")]
    Failed { diagnostics: String },
}

impl BackendError {
    pub fn failed(diagnostics: impl Into<String>) -> Self {
        Self::Failed {
            diagnostics: diagnostics.into(),
        }
    }

    /// Whether the chain should move on to the next backend.
    pub fn is_skippable(&self) -> bool {
        matches!(self, Self::Unsupported(_) | Self::NotFound(_))
    }
}

/// A way of turning a native document into PDF.
#[async_trait]
pub trait PdfBackend: Send + Sync {
    /// Short name used in logs and errors.
    fn name(&self) -> &str;

    /// Convert `source` into a PDF inside `out_dir` and return its path.
    async fn try_convert(&self, source: &Path, out_dir: &Path) -> Result<PathBuf, BackendError>;
}

/// Where converters put the PDF for `source`: same stem, `.pdf`, in `out_dir`.
pub fn expected_output(source: &Path, out_dir: &Path) -> PathBuf {
    let stem = source
        .file_stem()
        .map(|s| s.to_os_string())
        .unwrap_or_else(|| "document".into());
    out_dir.join(stem).with_extension("pdf")
}

/// Run a converter program to completion.
///
/// A program that cannot be spawned because it does not exist maps to
/// `NotFound`; a non-zero exit maps to `Failed` carrying stderr, or stdout
/// when stderr is empty.
pub async fn run_program(program: &Path, args: &[&std::ffi::OsStr]) -> Result<(), BackendError> {
    debug!("Executing: {} {:?}", program.display(), args);

    let output = Command::new(program)
        .args(args)
        .kill_on_drop(true)
        .output()
        .await
        .map_err(|e| match e.kind() {
            ErrorKind::NotFound => BackendError::NotFound(format!("{}: {}", program.display(), e)),
            _ => BackendError::failed(format!("failed to start {}: {}", program.display(), e)),
        })?;

    if output.status.success() {
        return Ok(());
    }

    let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
    let diagnostics = if stderr.is_empty() {
        String::from_utf8_lossy(&output.stdout).trim().to_string()
    } else {
        stderr
    };
    let diagnostics = if diagnostics.is_empty() {
        format!("{} exited with {}", program.display(), output.status)
    } else {
        diagnostics
    };
    Err(BackendError::failed(diagnostics))
}

/// Check that a converter that reported success left its output behind.
pub fn require_output(path: PathBuf) -> Result<PathBuf, BackendError> {
    if path.is_file() {
        Ok(path)
    } else {
        Err(BackendError::failed(format!(
            "converter reported success but {} was not created",
            path.display()
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expected_output() {
        assert_eq!(
            expected_output(Path::new("/work/in/invoice.docx"), Path::new("/work/out")),
            PathBuf::from("/work/out/invoice.pdf")
        );
    }

    #[test]
    fn test_skippable() {
        assert!(BackendError::Unsupported("host".into()).is_skippable());
        assert!(BackendError::NotFound("soffice".into()).is_skippable());
        assert!(!BackendError::failed("boom").is_skippable());
    }

    #[test]
    fn test_require_output() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("x.pdf");
        assert!(matches!(require_output(missing.clone()), Err(BackendError::Failed { .. })));
        std::fs::write(&missing, b"%PDF").unwrap();
        assert_eq!(require_output(missing.clone()).unwrap(), missing);
    }

    #[tokio::test]
    async fn test_missing_program_is_not_found() {
        let result = run_program(Path::new("/nonexistent/docfill-converter"), &[]).await;
        assert!(matches!(result, Err(BackendError::NotFound(_))));
    }
}
