//! Locale selection and translation tables.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use tracing::{debug, info};

use crate::error::{ServerError, ServerResult};

pub const DEFAULT_LANG: &str = "en";

/// Cookie holding the chosen language.
pub const LANG_COOKIE: &str = "lang";

/// Key to display string.
pub type Table = BTreeMap<String, String>;

const EN: &[(&str, &str)] = &[
    ("title", "Document generator"),
    ("choose_template", "Choose a template"),
    ("no_templates", "No templates available"),
    ("fill_form", "Fill in the form"),
    ("format", "Output format"),
    ("native", "Original format"),
    ("pdf", "PDF"),
    ("generate", "Generate"),
    ("back", "Back"),
    ("language", "Language"),
];

const RU: &[(&str, &str)] = &[
    ("title", "Генератор документов"),
    ("choose_template", "Выберите шаблон"),
    ("no_templates", "Нет доступных шаблонов"),
    ("fill_form", "Заполните форму"),
    ("format", "Формат"),
    ("native", "Исходный формат"),
    ("pdf", "PDF"),
    ("generate", "Сформировать"),
    ("back", "Назад"),
    ("language", "Язык"),
];

/// Translation tables by language code.
#[derive(Debug, Clone)]
pub struct Translations {
    tables: BTreeMap<String, Table>,
    default_lang: String,
}

impl Translations {
    /// The built-in English and Russian tables.
    pub fn builtin() -> Self {
        let table = |pairs: &[(&str, &str)]| -> Table {
            pairs
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect()
        };

        let mut tables = BTreeMap::new();
        tables.insert("en".to_string(), table(EN));
        tables.insert("ru".to_string(), table(RU));
        Self {
            tables,
            default_lang: DEFAULT_LANG.to_string(),
        }
    }

    /// Parse a JSON object of `lang -> { key -> string }`.
    pub fn from_json(text: &str) -> ServerResult<Self> {
        let tables: BTreeMap<String, Table> =
            serde_json::from_str(text).map_err(|e| ServerError::Translations(e.to_string()))?;

        let default_lang = if tables.contains_key(DEFAULT_LANG) {
            DEFAULT_LANG.to_string()
        } else {
            tables
                .keys()
                .next()
                .cloned()
                .ok_or_else(|| ServerError::Translations("no languages defined".to_string()))?
        };

        Ok(Self {
            tables,
            default_lang,
        })
    }

    /// Load tables from a JSON file.
    pub fn load(path: &Path) -> ServerResult<Self> {
        debug!("Loading translations from {:?}", path);
        let translations = Self::from_json(&fs::read_to_string(path)?)?;
        info!(
            "Loaded translations for {}",
            translations.languages().join(", ")
        );
        Ok(translations)
    }

    pub fn languages(&self) -> Vec<&str> {
        self.tables.keys().map(String::as_str).collect()
    }

    pub fn default_lang(&self) -> &str {
        &self.default_lang
    }

    pub fn is_available(&self, lang: &str) -> bool {
        self.tables.contains_key(lang)
    }

    /// Table for a language, falling back to the default language.
    pub fn table(&self, lang: &str) -> Table {
        self.tables
            .get(lang)
            .or_else(|| self.tables.get(&self.default_lang))
            .cloned()
            .unwrap_or_default()
    }

    /// Pick the language for a request.
    ///
    /// A cookie naming an available language wins. Otherwise the first
    /// `Accept-Language` entry is matched by prefix against the available
    /// languages. Otherwise the default language is used.
    pub fn resolve(&self, cookie: Option<&str>, accept_language: Option<&str>) -> String {
        if let Some(lang) = cookie.filter(|l| self.is_available(l)) {
            return lang.to_string();
        }

        if let Some(header) = accept_language {
            let first = header
                .split(',')
                .next()
                .unwrap_or("")
                .trim()
                .to_lowercase();
            if let Some(lang) = self.tables.keys().find(|lang| first.starts_with(lang.as_str())) {
                return lang.clone();
            }
        }

        self.default_lang.clone()
    }
}

impl Default for Translations {
    fn default() -> Self {
        Self::builtin()
    }
}
