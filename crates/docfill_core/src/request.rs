//! Generation requests.

use std::collections::HashMap;

use crate::error::{CoreError, CoreResult};

/// Form key naming the template.
pub const TEMPLATE_KEY: &str = "tpl";
/// Form key naming the output format.
pub const FORMAT_KEY: &str = "fmt";

/// A request to generate one document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GenerateRequest {
    pub template: String,
    /// Raw format selector as submitted
    pub format: Option<String>,
    /// Submitted field values
    pub values: HashMap<String, String>,
}

impl GenerateRequest {
    pub fn new(template: impl Into<String>) -> Self {
        Self {
            template: template.into(),
            ..Default::default()
        }
    }

    /// Split a submitted form into template, format and field values.
    pub fn from_form(mut form: HashMap<String, String>) -> CoreResult<Self> {
        let template = form
            .remove(TEMPLATE_KEY)
            .filter(|t| !t.trim().is_empty())
            .ok_or(CoreError::MissingTemplate)?;
        let format = form.remove(FORMAT_KEY);

        Ok(Self {
            template,
            format,
            values: form,
        })
    }

    pub fn format(mut self, format: impl Into<String>) -> Self {
        self.format = Some(format.into());
        self
    }

    pub fn value(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.values.insert(name.into(), value.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_form() {
        let form = HashMap::from([
            ("tpl".to_string(), "invoice.docx".to_string()),
            ("fmt".to_string(), "pdf".to_string()),
            ("amount".to_string(), "1,5".to_string()),
        ]);
        let request = GenerateRequest::from_form(form).unwrap();
        assert_eq!(
            request,
            GenerateRequest::new("invoice.docx").format("pdf").value("amount", "1,5")
        );
    }

    #[test]
    fn test_missing_template() {
        assert!(matches!(
            GenerateRequest::from_form(HashMap::new()),
            Err(CoreError::MissingTemplate)
        ));
        let blank = HashMap::from([("tpl".to_string(), "  ".to_string())]);
        assert!(matches!(
            GenerateRequest::from_form(blank),
            Err(CoreError::MissingTemplate)
        ));
    }
}
