use std::mem;

use mongodb::bson::{Bson, Document};
use quick_xml::escape::unescape;

use crate::{
    config::DEFAULT_TEXT_KEY,
    core::item::{ItemProcessor, ItemProcessorResult},
    error::BatchError,
};

use super::element::Element;

/// Converts record elements into documents ready to be inserted.
///
/// The record is wrapped under its own tag name and its content is mapped
/// recursively:
///
/// - attributes become keys holding their string value (no prefix),
/// - child elements become keys holding their converted value,
/// - trimmed, non-empty text goes under the text key, after attributes and children,
/// - an element without attributes, children or text becomes `null`,
/// - a key seen several times collects its values into an array, in document order.
///
/// ```
/// use mongodb::bson::doc;
/// use xml2mongo::item::xml::{DocumentConverter, XmlDocument};
///
/// let xml = r#"<article pmid="42"><title>Hello</title><tag>a</tag><tag>b</tag></article>"#;
/// let document = XmlDocument::parse(xml).unwrap();
///
/// let record = DocumentConverter::new().convert(document.root()).unwrap();
///
/// assert_eq!(
///     record,
///     doc! {
///         "article": {
///             "pmid": "42",
///             "title": { "text": "Hello" },
///             "tag": [{ "text": "a" }, { "text": "b" }],
///         }
///     }
/// );
/// ```
#[derive(Debug, Clone)]
pub struct DocumentConverter {
    text_key: String,
}

impl Default for DocumentConverter {
    fn default() -> Self {
        Self {
            text_key: DEFAULT_TEXT_KEY.to_string(),
        }
    }
}

impl DocumentConverter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Uses `text_key` instead of `text` for text content.
    pub fn with_text_key<S: Into<String>>(text_key: S) -> Self {
        Self {
            text_key: text_key.into(),
        }
    }

    /// Converts one record element into `{ <tag>: <content> }`.
    pub fn convert(&self, element: &Element) -> Result<Document, BatchError> {
        let mut document = Document::new();
        document.insert(element.name(), self.element_value(element)?);
        Ok(document)
    }

    /// Converts the content of an element, without the wrapping tag name.
    pub fn element_value(&self, element: &Element) -> Result<Bson, BatchError> {
        let text = unescape_text(element.name(), element.raw_text())?;
        let text = text.trim();

        if element.attributes().is_empty() && element.children().is_empty() && text.is_empty() {
            return Ok(Bson::Null);
        }

        let mut content = Document::new();

        for (key, raw_value) in element.attributes() {
            let value = unescape_text(element.name(), raw_value)?;
            push_value(&mut content, key, Bson::String(value));
        }

        for child in element.children() {
            let value = self.element_value(child)?;
            push_value(&mut content, child.name(), value);
        }

        if !text.is_empty() {
            push_value(&mut content, &self.text_key, Bson::String(text.to_string()));
        }

        Ok(Bson::Document(content))
    }
}

impl ItemProcessor<&Element, Document> for DocumentConverter {
    fn process(&self, item: &&Element) -> ItemProcessorResult<Document> {
        self.convert(item)
    }
}

fn push_value(content: &mut Document, key: &str, value: Bson) {
    match content.get_mut(key) {
        Some(Bson::Array(values)) => values.push(value),
        Some(existing) => {
            let first = mem::replace(existing, Bson::Null);
            *existing = Bson::Array(vec![first, value]);
        }
        None => {
            content.insert(key, value);
        }
    }
}

fn unescape_text(element: &str, raw: &str) -> Result<String, BatchError> {
    unescape(raw)
        .map(|value| value.into_owned())
        .map_err(|e| BatchError::Conversion(format!("in <{}>: {}", element, e)))
}
