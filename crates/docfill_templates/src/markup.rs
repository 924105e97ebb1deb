//! Raw markup helpers shared by extraction and rendering.
//!
//! Word processors freely split text into runs, so a placeholder typed as
//! `{{ client }}` can end up as `{{ cli</w:t></w:r><w:r><w:t>ent }}` in the
//! XML. [`normalize`] removes such interleaved tags from inside template
//! delimiters before the engine parses a part.
//!
//! DOCX templates may also carry element tags such as `{%tr for row in rows %}`
//! or `{%p if vip %}`, which stand for their whole enclosing table row or
//! paragraph. [`prepare`] rewrites those into plain statements.

use std::borrow::Cow;
use std::collections::BTreeSet;

use once_cell::sync::Lazy;
use regex::{Captures, Regex};

use crate::coerce::RenderContext;

/// `{` followed by tags and then the second delimiter character.
static SPLIT_OPEN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\{(?:<[^>]*>)+([{%#])").expect("valid regex"));

/// Delimiter character followed by tags and then the closing `}`.
static SPLIT_CLOSE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"([}%#])(?:<[^>]*>)+\}").expect("valid regex"));

static DELIMITED: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)\{([{%#])(.*?)([}%#])\}").expect("valid regex"));

static XML_TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]*>").expect("valid regex"));

/// `{%p if x %}`, `{{r name }}` and friends.
static ELEMENT_TAG: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\{([{%])(tr|tc|p|r)\s+([^}%]*?)\s*[}%]\}").expect("valid regex")
});

/// Simple `{{ name }}` placeholder.
static PLACEHOLDER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\{\{\s*([a-zA-Z0-9_]+)\s*\}\}").expect("valid regex"));

/// Strip XML tags and entities from inside template delimiters.
pub fn normalize(xml: &str) -> String {
    let joined = SPLIT_OPEN.replace_all(xml, "{$1");
    let joined = SPLIT_CLOSE.replace_all(&joined, "$1}");

    DELIMITED
        .replace_all(&joined, |caps: &Captures| {
            let inner = XML_TAG.replace_all(&caps[2], "");
            format!("{{{}{}{}}}", &caps[1], unescape(&inner), &caps[3])
        })
        .into_owned()
}

fn unescape(text: &str) -> String {
    quick_xml::escape::unescape(text)
        .map(Cow::into_owned)
        .unwrap_or_else(|_| text.to_string())
        .replace(['\u{201C}', '\u{201D}'], "\"")
        .replace(['\u{2018}', '\u{2019}'], "'")
}

/// Escape text for insertion into XML character data.
pub fn escape(text: &str) -> String {
    quick_xml::escape::escape(text).into_owned()
}

/// Normalized markup with element tags promoted, ready for the engine.
pub fn prepare(xml: &str) -> String {
    promote_element_tags(&normalize(xml))
}

/// Replace the `<w:KIND>` element around each element tag with the bare tag.
///
/// A tag with no enclosing element of its kind is left untouched.
pub fn promote_element_tags(xml: &str) -> String {
    let mut out = xml.to_string();
    let mut from = 0;

    while let Some(caps) = ELEMENT_TAG.captures_at(&out, from) {
        let Some(tag) = caps.get(0) else {
            break;
        };
        let (tag_start, tag_end) = (tag.start(), tag.end());
        let element = format!("w:{}", &caps[2]);
        let statement = if &caps[1] == "%" {
            format!("{{% {} %}}", &caps[3])
        } else {
            format!("{{{{ {} }}}}", &caps[3])
        };

        match (
            element_start(&out[..tag_start], &element),
            element_end(&out[tag_end..], &element),
        ) {
            (Some(start), Some(len)) => {
                out.replace_range(start..tag_end + len, &statement);
                from = start + statement.len();
            }
            _ => from = tag_end,
        }
    }

    out
}

/// Offset of the last `<{element}>` or `<{element} ...>` opening tag.
fn element_start(before: &str, element: &str) -> Option<usize> {
    let open = format!("<{}", element);
    let mut search = before;
    while let Some(pos) = search.rfind(&open) {
        match before[pos + open.len()..].chars().next() {
            Some('>') | Some(' ') => return Some(pos),
            _ => search = &before[..pos],
        }
    }
    None
}

/// Length up to and including the next `</{element}>`.
fn element_end(after: &str, element: &str) -> Option<usize> {
    let close = format!("</{}>", element);
    after.find(&close).map(|pos| pos + close.len())
}

/// Collect every simple `{{ name }}` placeholder in raw markup.
///
/// Placeholders inside `{% %}` conditions and placeholders broken up by
/// formatting runs are not seen.
pub fn scan_placeholders(xml: &str) -> BTreeSet<String> {
    PLACEHOLDER
        .captures_iter(xml)
        .map(|caps| caps[1].to_string())
        .collect()
}

/// Replace simple placeholders with context values.
///
/// Returns the first variable the context does not provide as the error.
pub fn substitute(xml: &str, context: &RenderContext) -> Result<String, String> {
    if let Some(missing) = scan_placeholders(xml)
        .into_iter()
        .find(|name| context.get(name).is_none())
    {
        return Err(missing);
    }

    Ok(PLACEHOLDER
        .replace_all(xml, |caps: &Captures| {
            context
                .get(&caps[1])
                .map(|value| escape(&value.to_string()))
                .unwrap_or_default()
        })
        .into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coerce::TypedValue;

    #[test]
    fn test_normalize_joins_split_runs() {
        let xml = "<w:t>{{ cli</w:t></w:r><w:r><w:t>ent }}</w:t>";
        assert_eq!(normalize(xml), "<w:t>{{ client }}</w:t>");
    }

    #[test]
    fn test_normalize_split_delimiters() {
        let xml = "<w:t>{</w:t><w:t>{ name }</w:t><w:t>}</w:t>";
        assert_eq!(normalize(xml), "<w:t>{{ name }}</w:t>");
    }

    #[test]
    fn test_normalize_unescapes_inside_tags_only() {
        let xml = "a &amp; b {% if &quot;x&quot; %}";
        assert_eq!(normalize(xml), "a &amp; b {% if \"x\" %}");
    }

    #[test]
    fn test_scan_placeholders() {
        let xml = "<p>{{name}} and {{ amount }} and {{ name }} {% if flag %}</p>";
        let vars: Vec<_> = scan_placeholders(xml).into_iter().collect();
        assert_eq!(vars, vec!["amount", "name"]);
    }

    #[test]
    fn test_scan_misses_split_placeholders() {
        let xml = "<w:t>{{ cli</w:t><w:t>ent }}</w:t>";
        assert!(scan_placeholders(xml).is_empty());
    }

    #[test]
    fn test_substitute() {
        let mut ctx = RenderContext::new();
        ctx.insert("name", TypedValue::Text("A & B".to_string()));
        assert_eq!(substitute("<t>{{ name }}</t>", &ctx).unwrap(), "<t>A &amp; B</t>");
        assert_eq!(substitute("<t>{{ other }}</t>", &ctx).unwrap_err(), "other");
    }

    #[test]
    fn test_normalize_maps_smart_quotes() {
        let xml = "{% if kind == \u{201C}a\u{201D} or kind == \u{2018}b\u{2019} %}";
        assert_eq!(normalize(xml), "{% if kind == \"a\" or kind == 'b' %}");
    }

    #[test]
    fn test_promote_paragraph_tag() {
        let xml = "<w:body><w:p w:rsidR=\"1\"><w:r><w:t>{%p if vip %}</w:t></w:r></w:p>\
                   <w:p><w:r><w:t>VIP</w:t></w:r></w:p>\
                   <w:p><w:r><w:t>{%p endif %}</w:t></w:r></w:p></w:body>";
        assert_eq!(
            promote_element_tags(xml),
            "<w:body>{% if vip %}<w:p><w:r><w:t>VIP</w:t></w:r></w:p>{% endif %}</w:body>"
        );
    }

    #[test]
    fn test_promote_row_tag_skips_similar_elements() {
        let xml = "<w:tbl><w:tr><w:trPr/><w:tc><w:p><w:r><w:t>{%tr for row in rows %}</w:t></w:r></w:p></w:tc></w:tr></w:tbl>";
        assert_eq!(promote_element_tags(xml), "<w:tbl>{% for row in rows %}</w:tbl>");
    }

    #[test]
    fn test_promote_without_element_is_untouched() {
        let xml = "<text:p>{%p if vip %}</text:p>";
        assert_eq!(promote_element_tags(xml), xml);
        assert_eq!(prepare("<w:t>{{ a }}</w:t>"), "<w:t>{{ a }}</w:t>");
    }

    #[test]
    fn test_escape() {
        assert_eq!(escape("<a href=\"x\">'&'</a>"), "&lt;a href=&quot;x&quot;&gt;&apos;&amp;&apos;&lt;/a&gt;");
    }
}
