//! Value coercion from raw form input to typed render values.

use std::collections::{BTreeMap, HashMap};

use chrono::NaiveDate;
use serde::Serialize;
use tracing::debug;

use crate::error::{TemplateError, TemplateResult};
use crate::schema::{FieldDefinition, FieldType};

/// Strings accepted as `true` for boolean fields (case-insensitive).
pub const TRUE_VALUES: [&str; 3] = ["yes", "true", "1"];

const INPUT_DATE_FORMAT: &str = "%Y-%m-%d";
const OUTPUT_DATE_FORMAT: &str = "%d.%m.%Y";

/// A typed value ready for rendering.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum TypedValue {
    Text(String),
    /// Already formatted as `DD.MM.YYYY`
    Date(String),
    Int(i64),
    Float(f64),
    Bool(bool),
}

impl std::fmt::Display for TypedValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Text(s) | Self::Date(s) => write!(f, "{}", s),
            Self::Int(i) => write!(f, "{}", i),
            Self::Float(v) => write!(f, "{}", v),
            Self::Bool(b) => write!(f, "{}", b),
        }
    }
}

/// Field name to typed value for one generation request.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct RenderContext {
    values: BTreeMap<String, TypedValue>,
}

impl RenderContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, value: TypedValue) {
        self.values.insert(name.into(), value);
    }

    pub fn get(&self, name: &str) -> Option<&TypedValue> {
        self.values.get(name)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &TypedValue)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }
}

/// Coerce a single raw value according to the field's type.
pub fn coerce_value(field: &FieldDefinition, raw: &str) -> TemplateResult<TypedValue> {
    let invalid = || TemplateError::FieldInvalid {
        field: field.name.clone(),
        expected: field.field_type.to_string(),
    };

    let value = match field.field_type {
        FieldType::String => TypedValue::Text(raw.to_string()),
        FieldType::Date => {
            let date = NaiveDate::parse_from_str(raw.trim(), INPUT_DATE_FORMAT)
                .map_err(|_| invalid())?;
            TypedValue::Date(date.format(OUTPUT_DATE_FORMAT).to_string())
        }
        FieldType::Int => TypedValue::Int(raw.trim().parse::<i64>().map_err(|_| invalid())?),
        FieldType::Float => TypedValue::Float(
            raw.trim()
                .replace(',', ".")
                .parse::<f64>()
                .map_err(|_| invalid())?,
        ),
        FieldType::Bool => {
            let lowered = raw.to_lowercase();
            TypedValue::Bool(TRUE_VALUES.contains(&lowered.as_str()))
        }
    };

    Ok(value)
}

/// Build a render context from submitted form values.
///
/// Submitted keys that are not fields are ignored and missing fields count
/// as empty input. Stops at the first invalid field in schema order.
pub fn coerce(
    fields: &[FieldDefinition],
    submitted: &HashMap<String, String>,
) -> TemplateResult<RenderContext> {
    let mut context = RenderContext::new();
    for field in fields {
        let raw = submitted.get(&field.name).map(String::as_str).unwrap_or("");
        context.insert(field.name.clone(), coerce_value(field, raw)?);
    }
    debug!("Coerced {} field(s)", context.len());
    Ok(context)
}

/// Like [`coerce`], but reports every invalid field.
pub fn coerce_all(
    fields: &[FieldDefinition],
    submitted: &HashMap<String, String>,
) -> Result<RenderContext, Vec<TemplateError>> {
    let mut context = RenderContext::new();
    let mut errors = Vec::new();

    for field in fields {
        let raw = submitted.get(&field.name).map(String::as_str).unwrap_or("");
        match coerce_value(field, raw) {
            Ok(value) => context.insert(field.name.clone(), value),
            Err(e) => errors.push(e),
        }
    }

    if errors.is_empty() {
        Ok(context)
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn field(name: &str, field_type: FieldType) -> FieldDefinition {
        FieldDefinition {
            name: name.to_string(),
            label: name.to_string(),
            field_type,
            choices: Vec::new(),
        }
    }

    fn expected_of(err: TemplateError) -> (String, String) {
        match err {
            TemplateError::FieldInvalid { field, expected } => (field, expected),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_date() {
        let f = field("due", FieldType::Date);
        assert_eq!(coerce_value(&f, "2024-03-09").unwrap(), TypedValue::Date("09.03.2024".into()));
        for bad in ["", "09.03.2024", "2024-13-01", "2024-02-30", "tomorrow"] {
            let (name, expected) = expected_of(coerce_value(&f, bad).unwrap_err());
            assert_eq!(name, "due");
            assert_eq!(expected, "date");
        }
    }

    #[test]
    fn test_int() {
        let f = field("qty", FieldType::Int);
        assert_eq!(coerce_value(&f, "42").unwrap(), TypedValue::Int(42));
        assert_eq!(coerce_value(&f, "-7").unwrap(), TypedValue::Int(-7));
        assert_eq!(coerce_value(&f, "+7").unwrap(), TypedValue::Int(7));
        assert_eq!(coerce_value(&f, " 5 ").unwrap(), TypedValue::Int(5));
        for bad in ["", "1.5", "abc", "0x10"] {
            assert_eq!(expected_of(coerce_value(&f, bad).unwrap_err()).1, "int");
        }
    }

    #[test]
    fn test_float_accepts_comma() {
        let f = field("amount", FieldType::Float);
        assert_eq!(coerce_value(&f, "3,14").unwrap(), coerce_value(&f, "3.14").unwrap());
        assert_eq!(coerce_value(&f, "1,5").unwrap(), TypedValue::Float(1.5));
        assert_eq!(expected_of(coerce_value(&f, "abc").unwrap_err()).1, "float");
        assert!(coerce_value(&f, "").is_err());
    }

    #[test]
    fn test_bool() {
        let f = field("agree", FieldType::Bool);
        for truthy in ["yes", "YES", "True", "true", "1"] {
            assert_eq!(coerce_value(&f, truthy).unwrap(), TypedValue::Bool(true), "{truthy}");
        }
        for falsy in ["", "no", "0", "on", "y", "false", " yes"] {
            assert_eq!(coerce_value(&f, falsy).unwrap(), TypedValue::Bool(false), "{falsy}");
        }
    }

    #[test]
    fn test_string_passthrough() {
        let f = field("note", FieldType::String);
        assert_eq!(coerce_value(&f, "  as is ").unwrap(), TypedValue::Text("  as is ".into()));
    }

    #[test]
    fn test_coerce_strips_extra_keys() {
        let fields = vec![field("amount", FieldType::Float), field("name", FieldType::String)];
        let mut form = HashMap::new();
        form.insert("amount".to_string(), "1,5".to_string());
        form.insert("tpl".to_string(), "invoice.docx".to_string());
        form.insert("fmt".to_string(), "pdf".to_string());

        let context = coerce(&fields, &form).unwrap();
        let keys: Vec<_> = context.keys().collect();
        assert_eq!(keys, vec!["amount", "name"]);
        assert_eq!(context.get("amount"), Some(&TypedValue::Float(1.5)));
        assert_eq!(context.get("name"), Some(&TypedValue::Text(String::new())));
    }

    #[test]
    fn test_coerce_reports_first_invalid_field() {
        let fields = vec![field("a", FieldType::Int), field("b", FieldType::Date)];
        let form = HashMap::from([("a".to_string(), "x".to_string())]);
        let (name, expected) = expected_of(coerce(&fields, &form).unwrap_err());
        assert_eq!((name.as_str(), expected.as_str()), ("a", "int"));
    }

    #[test]
    fn test_coerce_all_collects_errors() {
        let fields = vec![
            field("a", FieldType::Int),
            field("b", FieldType::Date),
            field("c", FieldType::String),
        ];
        let errors = coerce_all(&fields, &HashMap::new()).unwrap_err();
        assert_eq!(errors.len(), 2);
    }

    #[test]
    fn test_display() {
        assert_eq!(TypedValue::Float(1.5).to_string(), "1.5");
        assert_eq!(TypedValue::Float(3.0).to_string(), "3");
        assert_eq!(TypedValue::Float(1e16).to_string(), "10000000000000000");
        assert_eq!(TypedValue::Int(-2).to_string(), "-2");
        assert_eq!(TypedValue::Bool(true).to_string(), "true");
        assert_eq!(TypedValue::Bool(false).to_string(), "false");
    }
}
