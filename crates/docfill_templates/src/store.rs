//! Template discovery and loading.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::error::{TemplateError, TemplateResult};
use crate::format::DocumentFormat;

/// Sidecar extensions, in lookup order.
const METADATA_EXTENSIONS: [&str; 2] = ["yaml", "yml"];

/// Source of templates and their sidecar metadata.
pub trait TemplateStore: Send + Sync {
    /// Template file names, sorted ascending.
    fn list(&self) -> TemplateResult<Vec<String>>;

    /// Raw template bytes.
    fn read_template(&self, name: &str) -> TemplateResult<Vec<u8>>;

    /// Raw sidecar metadata text, if the template has any.
    fn read_metadata(&self, name: &str) -> TemplateResult<Option<String>>;

    /// Native format of a template, by extension.
    fn native_format(&self, name: &str) -> TemplateResult<DocumentFormat> {
        DocumentFormat::from_file_name(name)
            .ok_or_else(|| TemplateError::NotFound(name.to_string()))
    }
}

/// Templates stored as files in a single directory.
#[derive(Debug, Clone)]
pub struct FsTemplateStore {
    root: PathBuf,
}

impl FsTemplateStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path of a template, rejecting anything that could leave the root.
    fn template_path(&self, name: &str) -> TemplateResult<PathBuf> {
        let valid = !name.is_empty()
            && !name.contains(['/', '\\'])
            && !name.contains("..")
            && DocumentFormat::from_file_name(name).is_some();
        if !valid {
            return Err(TemplateError::NotFound(name.to_string()));
        }
        Ok(self.root.join(name))
    }
}

impl TemplateStore for FsTemplateStore {
    fn list(&self) -> TemplateResult<Vec<String>> {
        if !self.root.exists() {
            warn!("Templates directory does not exist: {:?}", self.root);
            return Ok(Vec::new());
        }

        let mut names: Vec<String> = WalkDir::new(&self.root)
            .min_depth(1)
            .max_depth(1)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
            .filter_map(|e| e.file_name().to_str().map(str::to_string))
            .filter(|name| DocumentFormat::from_file_name(name).is_some())
            .collect();
        names.sort();

        debug!("Found {} template(s) in {:?}", names.len(), self.root);
        Ok(names)
    }

    fn read_template(&self, name: &str) -> TemplateResult<Vec<u8>> {
        let path = self.template_path(name)?;
        if !path.is_file() {
            return Err(TemplateError::NotFound(name.to_string()));
        }
        debug!("Reading template {:?}", path);
        Ok(fs::read(path)?)
    }

    fn read_metadata(&self, name: &str) -> TemplateResult<Option<String>> {
        let path = self.template_path(name)?;
        for extension in METADATA_EXTENSIONS {
            let candidate = path.with_extension(extension);
            if candidate.is_file() {
                debug!("Loading metadata from {:?}", candidate);
                return Ok(Some(fs::read_to_string(candidate)?));
            }
        }
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn store_with(files: &[(&str, &str)]) -> (TempDir, FsTemplateStore) {
        let dir = TempDir::new().unwrap();
        for (name, body) in files {
            fs::write(dir.path().join(name), body).unwrap();
        }
        let store = FsTemplateStore::new(dir.path());
        (dir, store)
    }

    #[test]
    fn test_list_sorted_templates_only() {
        let (dir, store) = store_with(&[
            ("b.docx", ""),
            ("a.odt", ""),
            ("a.yaml", ""),
            ("notes.txt", ""),
        ]);
        fs::create_dir(dir.path().join("nested.docx")).unwrap();
        assert_eq!(store.list().unwrap(), vec!["a.odt", "b.docx"]);
    }

    #[test]
    fn test_missing_directory_lists_nothing() {
        let store = FsTemplateStore::new("/nonexistent/docfill/templates");
        assert!(store.list().unwrap().is_empty());
    }

    #[test]
    fn test_read_rejects_traversal() {
        let (_dir, store) = store_with(&[("a.docx", "x")]);
        for name in ["../a.docx", "sub/a.docx", "..\\a.docx", "a.txt", ""] {
            assert!(matches!(
                store.read_template(name),
                Err(TemplateError::NotFound(_))
            ));
        }
        assert_eq!(store.read_template("a.docx").unwrap(), b"x");
    }

    #[test]
    fn test_metadata_lookup_order() {
        let (_dir, store) = store_with(&[
            ("a.docx", ""),
            ("a.yml", "from-yml"),
            ("b.docx", ""),
            ("b.yaml", "from-yaml"),
            ("b.yml", "ignored"),
        ]);
        assert_eq!(store.read_metadata("a.docx").unwrap().as_deref(), Some("from-yml"));
        assert_eq!(store.read_metadata("b.docx").unwrap().as_deref(), Some("from-yaml"));
        assert_eq!(store.read_metadata("c.docx").unwrap(), None);
    }

    #[test]
    fn test_native_format() {
        let store = FsTemplateStore::new(".");
        assert_eq!(store.native_format("x.ODT").unwrap(), DocumentFormat::Odt);
        assert!(store.native_format("x.pdf").is_err());
    }
}
