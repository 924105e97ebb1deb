//! Native document formats.

use std::path::Path;

use serde::{Deserialize, Serialize};

/// Office document format a template is stored in.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum DocumentFormat {
    /// Office Open XML word processing document
    Docx,
    /// OpenDocument text
    Odt,
}

impl DocumentFormat {
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "docx" => Some(Self::Docx),
            "odt" => Some(Self::Odt),
            _ => None,
        }
    }

    /// Derive the format from a template file name.
    pub fn from_file_name(name: &str) -> Option<Self> {
        Path::new(name)
            .extension()
            .and_then(|e| e.to_str())
            .and_then(Self::from_extension)
    }

    pub fn extension(&self) -> &'static str {
        match self {
            Self::Docx => "docx",
            Self::Odt => "odt",
        }
    }

    pub fn media_type(&self) -> &'static str {
        match self {
            Self::Docx => {
                "application/vnd.openxmlformats-officedocument.wordprocessingml.document"
            }
            Self::Odt => "application/vnd.oasis.opendocument.text",
        }
    }

    /// Archive entry holding the document body.
    pub fn main_part(&self) -> &'static str {
        match self {
            Self::Docx => "word/document.xml",
            Self::Odt => "content.xml",
        }
    }

    /// Whether an archive entry carries template markup.
    ///
    /// DOCX keeps headers and footers in separate parts next to the body,
    /// ODT keeps them in `styles.xml`.
    pub fn is_markup_part(&self, entry: &str) -> bool {
        if entry == self.main_part() {
            return true;
        }
        match self {
            Self::Docx => entry
                .strip_prefix("word/")
                .filter(|rest| !rest.contains('/'))
                .map(|rest| {
                    (rest.starts_with("header") || rest.starts_with("footer"))
                        && rest.ends_with(".xml")
                })
                .unwrap_or(false),
            Self::Odt => entry == "styles.xml",
        }
    }
}

impl std::fmt::Display for DocumentFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.extension())
    }
}
