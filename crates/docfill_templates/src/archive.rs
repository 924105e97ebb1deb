//! Office document archives.
//!
//! DOCX and ODT files are zip archives of XML parts. Templates are read fully
//! into memory; rendering rewrites the markup parts and copies everything else.

use std::collections::HashMap;
use std::io::{Cursor, Read, Write};

use quick_xml::events::Event;
use quick_xml::Reader;
use tracing::debug;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, DateTime, ZipArchive, ZipWriter};

use crate::error::{TemplateError, TemplateResult};
use crate::format::DocumentFormat;

/// ODT requires this entry first and uncompressed.
const ODT_MIMETYPE_ENTRY: &str = "mimetype";

#[derive(Debug, Clone)]
struct ArchiveEntry {
    name: String,
    data: Vec<u8>,
    is_dir: bool,
}

/// A markup-carrying XML part of a template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarkupPart {
    /// Entry name inside the archive
    pub name: String,
    /// Decoded XML text
    pub xml: String,
}

/// In-memory view of a template archive.
#[derive(Debug, Clone)]
pub struct TemplateArchive {
    template: String,
    format: DocumentFormat,
    entries: Vec<ArchiveEntry>,
}

impl TemplateArchive {
    /// Open a template archive.
    ///
    /// Fails with `TemplateCorrupt` when the bytes are not a readable zip
    /// archive or the format's main part is missing.
    pub fn open(template: &str, format: DocumentFormat, bytes: &[u8]) -> TemplateResult<Self> {
        let mut zip = ZipArchive::new(Cursor::new(bytes))
            .map_err(|e| TemplateError::corrupt(template, e))?;

        let mut entries = Vec::with_capacity(zip.len());
        for index in 0..zip.len() {
            let mut file = zip
                .by_index(index)
                .map_err(|e| TemplateError::corrupt(template, e))?;
            let name = file.name().to_string();
            let is_dir = file.is_dir();
            let mut data = Vec::new();
            file.read_to_end(&mut data)
                .map_err(|e| TemplateError::corrupt(template, e))?;
            entries.push(ArchiveEntry { name, data, is_dir });
        }

        if !entries.iter().any(|e| e.name == format.main_part()) {
            return Err(TemplateError::corrupt(
                template,
                format!("missing {}", format.main_part()),
            ));
        }

        debug!("Opened {} with {} entries", template, entries.len());
        Ok(Self {
            template: template.to_string(),
            format,
            entries,
        })
    }

    pub fn template(&self) -> &str {
        &self.template
    }

    pub fn format(&self) -> DocumentFormat {
        self.format
    }

    /// Entry names in archive order.
    pub fn entry_names(&self) -> Vec<&str> {
        self.entries.iter().map(|e| e.name.as_str()).collect()
    }

    /// Decode and validate every markup part, main part first.
    pub fn markup_parts(&self) -> TemplateResult<Vec<MarkupPart>> {
        let main = self.format.main_part();
        let mut parts = Vec::new();

        for entry in self.entries.iter().filter(|e| !e.is_dir) {
            if !self.format.is_markup_part(&entry.name) {
                continue;
            }
            let xml = String::from_utf8(entry.data.clone()).map_err(|e| {
                TemplateError::corrupt(&self.template, format!("{}: {}", entry.name, e))
            })?;
            check_well_formed(&xml).map_err(|reason| {
                TemplateError::corrupt(&self.template, format!("{}: {}", entry.name, reason))
            })?;
            parts.push(MarkupPart {
                name: entry.name.clone(),
                xml,
            });
        }

        parts.sort_by_key(|p| p.name != main);
        Ok(parts)
    }

    /// Write the archive back out, replacing the listed parts.
    ///
    /// Every entry gets the same fixed timestamp so identical input yields
    /// identical bytes.
    pub fn write(&self, replacements: &HashMap<String, String>) -> TemplateResult<Vec<u8>> {
        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));

        for entry in self.ordered_entries() {
            let options = file_options(&entry.name);
            if entry.is_dir {
                writer
                    .add_directory(entry.name.as_str(), options)
                    .map_err(write_error)?;
                continue;
            }

            writer
                .start_file(entry.name.as_str(), options)
                .map_err(write_error)?;
            match replacements.get(&entry.name) {
                Some(xml) => writer.write_all(xml.as_bytes())?,
                None => writer.write_all(&entry.data)?,
            }
        }

        let cursor = writer.finish().map_err(write_error)?;
        Ok(cursor.into_inner())
    }

    fn ordered_entries(&self) -> Vec<&ArchiveEntry> {
        let mut entries: Vec<&ArchiveEntry> = self.entries.iter().collect();
        if self.format == DocumentFormat::Odt {
            entries.sort_by_key(|e| e.name != ODT_MIMETYPE_ENTRY);
        }
        entries
    }
}

fn file_options(name: &str) -> SimpleFileOptions {
    let method = if name == ODT_MIMETYPE_ENTRY {
        CompressionMethod::Stored
    } else {
        CompressionMethod::Deflated
    };
    SimpleFileOptions::default()
        .compression_method(method)
        .last_modified_time(DateTime::default())
}

fn write_error(e: zip::result::ZipError) -> TemplateError {
    TemplateError::Io(std::io::Error::new(std::io::ErrorKind::Other, e))
}

/// Check that a part is well-formed XML.
pub fn check_well_formed(xml: &str) -> Result<(), String> {
    let mut reader = Reader::from_str(xml);
    let mut depth: usize = 0;

    loop {
        match reader.read_event() {
            Ok(Event::Start(_)) => depth += 1,
            Ok(Event::End(_)) => depth = depth.saturating_sub(1),
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(e) => return Err(e.to_string()),
        }
    }

    if depth != 0 {
        return Err(format!("{} unclosed element(s)", depth));
    }
    Ok(())
}
