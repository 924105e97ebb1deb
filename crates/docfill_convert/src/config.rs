//! Converter configuration.

use std::path::PathBuf;

/// Environment variable pointing at the office suite binary.
pub const SOFFICE_PATH_ENV: &str = "SOFFICE_PATH";

/// Program run by the library-level backend.
pub const DEFAULT_DOCX2PDF_PROGRAM: &str = "docx2pdf";

/// Settings for the PDF backend chain.
#[derive(Debug, Clone)]
pub struct ConverterConfig {
    /// Explicit office suite binary (skips PATH lookup)
    pub soffice_path: Option<PathBuf>,
    /// Whether the library-level backend takes part in the chain
    pub use_docx2pdf: bool,
    /// Program name for the library-level backend
    pub docx2pdf_program: String,
}

impl Default for ConverterConfig {
    fn default() -> Self {
        Self {
            soffice_path: std::env::var_os(SOFFICE_PATH_ENV)
                .filter(|v| !v.is_empty())
                .map(PathBuf::from),
            use_docx2pdf: true,
            docx2pdf_program: DEFAULT_DOCX2PDF_PROGRAM.to_string(),
        }
    }
}

impl ConverterConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a specific office suite binary. Empty paths are ignored.
    pub fn soffice(mut self, path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        if !path.as_os_str().is_empty() {
            self.soffice_path = Some(path);
        }
        self
    }

    /// Forget any configured office suite binary and search PATH instead.
    pub fn search_soffice(mut self) -> Self {
        self.soffice_path = None;
        self
    }

    pub fn without_docx2pdf(mut self) -> Self {
        self.use_docx2pdf = false;
        self
    }

    pub fn docx2pdf_program(mut self, program: impl Into<String>) -> Self {
        self.docx2pdf_program = program.into();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder() {
        let config = ConverterConfig::new()
            .search_soffice()
            .soffice("/opt/office/soffice")
            .without_docx2pdf();

        assert_eq!(config.soffice_path, Some(PathBuf::from("/opt/office/soffice")));
        assert!(!config.use_docx2pdf);
        assert_eq!(config.docx2pdf_program, "docx2pdf");
    }

    #[test]
    fn test_empty_soffice_ignored() {
        let config = ConverterConfig::new().search_soffice().soffice("");
        assert_eq!(config.soffice_path, None);
    }
}
