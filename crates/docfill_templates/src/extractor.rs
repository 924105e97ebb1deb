//! Placeholder extraction and caching.

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use parking_lot::RwLock;
use sha2::{Digest, Sha256};
use tracing::{debug, info, warn};

use crate::archive::{MarkupPart, TemplateArchive};
use crate::engine::{ParseError, Template};
use crate::error::{TemplateError, TemplateResult};
use crate::format::DocumentFormat;
use crate::markup;

/// Distinct variable names referenced by a template, sorted.
pub type PlaceholderSet = BTreeSet<String>;

/// Result of the engine-based extraction strategy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExtractionOutcome {
    /// Every part parsed; the set is complete
    Found(PlaceholderSet),
    /// A part uses constructs the engine does not implement; use the fallback
    Unsupported(String),
    /// The markup is broken; do not fall back
    Corrupt(String),
}

/// Placeholder extraction strategies.
pub struct PlaceholderExtractor;

impl PlaceholderExtractor {
    /// Engine-based extraction over all markup parts.
    pub fn primary(parts: &[MarkupPart]) -> ExtractionOutcome {
        let mut variables = PlaceholderSet::new();

        for part in parts {
            match Template::parse(&markup::prepare(&part.xml)) {
                Ok(template) => variables.extend(template.variables()),
                Err(ParseError::Unsupported(what)) => {
                    return ExtractionOutcome::Unsupported(format!("{}: {}", part.name, what))
                }
                Err(ParseError::Syntax(what)) => {
                    return ExtractionOutcome::Corrupt(format!("{}: {}", part.name, what))
                }
            }
        }

        ExtractionOutcome::Found(variables)
    }

    /// Regex scan of the raw main part.
    pub fn fallback(main: &MarkupPart) -> PlaceholderSet {
        markup::scan_placeholders(&main.xml)
    }

    /// Extract the placeholder set of a template.
    pub fn extract(
        template: &str,
        format: DocumentFormat,
        bytes: &[u8],
    ) -> TemplateResult<PlaceholderSet> {
        let archive = TemplateArchive::open(template, format, bytes)?;
        let parts = archive.markup_parts()?;

        match Self::primary(&parts) {
            ExtractionOutcome::Found(variables) => Ok(variables),
            ExtractionOutcome::Unsupported(reason) => {
                warn!("Falling back to placeholder scan for {}: {}", template, reason);
                let main = parts
                    .first()
                    .ok_or_else(|| TemplateError::corrupt(template, "no markup parts"))?;
                Ok(Self::fallback(main))
            }
            ExtractionOutcome::Corrupt(reason) => Err(TemplateError::corrupt(template, reason)),
        }
    }
}

/// Identity of template content: its name plus a SHA-256 fingerprint.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TemplateIdentity {
    pub name: String,
    pub fingerprint: String,
}

impl TemplateIdentity {
    pub fn new(name: &str, bytes: &[u8]) -> Self {
        let fingerprint = Sha256::digest(bytes)
            .iter()
            .map(|b| format!("{:02x}", b))
            .collect();
        Self {
            name: name.to_string(),
            fingerprint,
        }
    }
}

/// Memoized placeholder sets keyed by template identity.
///
/// Concurrent misses for the same template may extract twice; the first
/// stored set wins and every caller gets that same `Arc`.
#[derive(Debug, Default)]
pub struct PlaceholderCache {
    entries: RwLock<HashMap<TemplateIdentity, Arc<PlaceholderSet>>>,
}

impl PlaceholderCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, identity: &TemplateIdentity) -> Option<Arc<PlaceholderSet>> {
        self.entries.read().get(identity).cloned()
    }

    /// Return the cached set or extract and store it.
    pub fn get_or_extract(
        &self,
        template: &str,
        format: DocumentFormat,
        bytes: &[u8],
    ) -> TemplateResult<Arc<PlaceholderSet>> {
        let identity = TemplateIdentity::new(template, bytes);
        if let Some(hit) = self.get(&identity) {
            debug!("Placeholder cache hit for {}", template);
            return Ok(hit);
        }

        let computed = Arc::new(PlaceholderExtractor::extract(template, format, bytes)?);
        info!("Extracted {} placeholder(s) from {}", computed.len(), template);

        let mut entries = self.entries.write();
        // Older content of the same template can never be hit again.
        entries.retain(|key, _| key.name != identity.name || key.fingerprint == identity.fingerprint);
        Ok(entries.entry(identity).or_insert(computed).clone())
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    pub fn clear(&self) {
        self.entries.write().clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn part(name: &str, xml: &str) -> MarkupPart {
        MarkupPart {
            name: name.to_string(),
            xml: xml.to_string(),
        }
    }

    #[test]
    fn test_primary_sees_conditions_and_split_runs() {
        let parts = vec![
            part("word/document.xml", "<w:t>{{ na</w:t><w:t>me }}</w:t>{% if vip %}x{% endif %}"),
            part("word/header1.xml", "<w:t>{{ company }}</w:t>"),
        ];
        let expected: PlaceholderSet = ["company", "name", "vip"].iter().map(|s| s.to_string()).collect();
        assert_eq!(PlaceholderExtractor::primary(&parts), ExtractionOutcome::Found(expected));
    }

    #[test]
    fn test_primary_reports_unsupported() {
        let parts = vec![part("word/document.xml", "{{ x | default('none') }}")];
        assert!(matches!(
            PlaceholderExtractor::primary(&parts),
            ExtractionOutcome::Unsupported(_)
        ));
    }

    #[test]
    fn test_primary_skips_loop_locals() {
        let parts = vec![part(
            "word/document.xml",
            "{% for i in items %}{{ i }}{% endfor %}{{ client | upper }}",
        )];
        let expected: PlaceholderSet = ["client", "items"].iter().map(|s| s.to_string()).collect();
        assert_eq!(PlaceholderExtractor::primary(&parts), ExtractionOutcome::Found(expected));
    }

    #[test]
    fn test_primary_reports_corrupt() {
        let parts = vec![part("word/document.xml", "{% if x %}never closed")];
        assert!(matches!(
            PlaceholderExtractor::primary(&parts),
            ExtractionOutcome::Corrupt(_)
        ));
    }

    #[test]
    fn test_fallback_misses_conditions() {
        let main = part("word/document.xml", "{{ a }}{% if b %}{{c}}{% endif %}{% for d in e %}");
        let found: Vec<_> = PlaceholderExtractor::fallback(&main).into_iter().collect();
        assert_eq!(found, vec!["a", "c"]);
    }

    fn docx(document: &str) -> Vec<u8> {
        use std::io::{Cursor, Write};
        use zip::write::SimpleFileOptions;

        let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
        writer
            .start_file("word/document.xml", SimpleFileOptions::default())
            .unwrap();
        writer.write_all(document.as_bytes()).unwrap();
        writer.finish().unwrap().into_inner()
    }

    #[test]
    fn test_concurrent_misses_share_one_entry() {
        let cache = Arc::new(PlaceholderCache::new());
        let bytes = Arc::new(docx("<d>{{ name }}{% if vip %}x{% endif %}</d>"));
        let barrier = Arc::new(std::sync::Barrier::new(2));

        let handles: Vec<_> = (0..2)
            .map(|_| {
                let (cache, bytes, barrier) = (cache.clone(), bytes.clone(), barrier.clone());
                std::thread::spawn(move || {
                    barrier.wait();
                    cache
                        .get_or_extract("t.docx", DocumentFormat::Docx, &bytes)
                        .unwrap()
                })
            })
            .collect();
        let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();

        assert!(Arc::ptr_eq(&results[0], &results[1]));
        assert_eq!(cache.len(), 1);
        assert_eq!(results[0].len(), 2);
    }

    #[test]
    fn test_identity_fingerprint() {
        let a = TemplateIdentity::new("t.docx", b"one");
        let b = TemplateIdentity::new("t.docx", b"two");
        assert_ne!(a, b);
        assert_eq!(a, TemplateIdentity::new("t.docx", b"one"));
        assert_eq!(a.fingerprint.len(), 64);
    }
}
