use std::{fs, path::Path, str};

use encoding_rs::Encoding;
use log::debug;
use quick_xml::{
    escape::escape,
    events::{BytesStart, Event},
    reader::Reader as XmlReader,
};

use crate::error::BatchError;

/// One element of a parsed XML document.
///
/// Attribute values and text are kept exactly as they appear in the source
/// (entity references unresolved). They are unescaped when the element is
/// converted, so a bad entity only fails the record that contains it.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Element {
    name: String,
    attributes: Vec<(String, String)>,
    text: String,
    children: Vec<Element>,
}

impl Element {
    pub fn new<S: Into<String>>(name: S) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Qualified tag name, prefix included (`dc:title`).
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Attributes in document order, values still escaped.
    pub fn attributes(&self) -> &[(String, String)] {
        &self.attributes
    }

    /// Direct text content of the element, still escaped.
    pub fn raw_text(&self) -> &str {
        &self.text
    }

    pub fn children(&self) -> &[Element] {
        &self.children
    }

    /// Every descendant named `tag`, in document order.
    ///
    /// The element itself is never part of the result. A match nested inside
    /// another match is returned as well.
    pub fn descendants_named<'a>(&'a self, tag: &str) -> Vec<&'a Element> {
        let mut matches = Vec::new();
        for child in &self.children {
            child.collect_named(tag, &mut matches);
        }
        matches
    }

    fn collect_named<'a>(&'a self, tag: &str, matches: &mut Vec<&'a Element>) {
        if self.name == tag {
            matches.push(self);
        }
        for child in &self.children {
            child.collect_named(tag, matches);
        }
    }

    fn from_start(start: &BytesStart) -> Result<Self, BatchError> {
        let name = utf8(start.name().as_ref())?.to_string();

        let mut attributes = Vec::new();
        for attribute in start.attributes() {
            let attribute = attribute.map_err(|e| {
                BatchError::FileParse(format!("invalid attribute in <{}>: {}", name, e))
            })?;
            let key = utf8(attribute.key.as_ref())?;
            let value = utf8(&attribute.value)?;
            attributes.push((key.to_string(), value.to_string()));
        }

        Ok(Self {
            name,
            attributes,
            ..Default::default()
        })
    }
}

/// A fully parsed, well-formed XML document.
#[derive(Debug, Clone, PartialEq)]
pub struct XmlDocument {
    root: Element,
}

impl XmlDocument {
    /// Reads a whole file and parses it with the given source encoding.
    pub fn from_path<P: AsRef<Path>>(
        path: P,
        encoding: &'static Encoding,
    ) -> Result<Self, BatchError> {
        let path = path.as_ref();
        let bytes = fs::read(path).map_err(|e| {
            BatchError::FileParse(format!("cannot read {}: {}", path.display(), e))
        })?;
        Self::from_bytes(&bytes, encoding)
    }

    /// Decodes `bytes` and parses the result.
    ///
    /// A byte order mark overrides `encoding`. Bytes that are not valid in the
    /// encoding fail the whole document.
    pub fn from_bytes(bytes: &[u8], encoding: &'static Encoding) -> Result<Self, BatchError> {
        let (content, actual, had_errors) = encoding.decode(bytes);
        if had_errors {
            return Err(BatchError::FileParse(format!(
                "invalid {} byte sequence",
                actual.name()
            )));
        }
        Self::parse(&content)
    }

    /// Parses a document held in memory.
    pub fn parse(xml: &str) -> Result<Self, BatchError> {
        let mut reader = XmlReader::from_str(xml);
        let mut open: Vec<Element> = Vec::new();
        let mut root: Option<Element> = None;

        loop {
            let event = reader.read_event().map_err(|e| {
                BatchError::FileParse(format!(
                    "XML parsing error at position {}: {}",
                    reader.error_position(),
                    e
                ))
            })?;

            match event {
                Event::Start(ref start) => open.push(Element::from_start(start)?),
                Event::Empty(ref start) => {
                    let element = Element::from_start(start)?;
                    attach(&mut open, &mut root, element)?;
                }
                Event::End(ref end) => {
                    let element = open.pop().ok_or_else(|| {
                        BatchError::FileParse(format!(
                            "unexpected closing tag </{}>",
                            String::from_utf8_lossy(end.name().as_ref())
                        ))
                    })?;
                    attach(&mut open, &mut root, element)?;
                }
                Event::Text(ref text) => push_text(&mut open, utf8(text)?)?,
                Event::GeneralRef(ref reference) => {
                    let entity = format!("&{};", utf8(reference)?);
                    push_text(&mut open, &entity)?;
                }
                Event::CData(ref cdata) => {
                    // Stored escaped so that unescaping restores it verbatim
                    let content = escape(utf8(cdata)?);
                    push_text(&mut open, &content)?;
                }
                Event::Eof => break,
                _ => { /* Declaration, comments, processing instructions, doctype */ }
            }
        }

        if let Some(element) = open.last() {
            return Err(BatchError::FileParse(format!(
                "unexpected end of file: <{}> is not closed",
                element.name
            )));
        }

        let root = root.ok_or_else(|| {
            BatchError::FileParse("document has no root element".to_string())
        })?;
        debug!("Parsed document with root <{}>", root.name);

        Ok(Self { root })
    }

    pub fn root(&self) -> &Element {
        &self.root
    }
}

fn attach(
    open: &mut [Element],
    root: &mut Option<Element>,
    element: Element,
) -> Result<(), BatchError> {
    if let Some(parent) = open.last_mut() {
        parent.children.push(element);
        Ok(())
    } else if root.is_some() {
        Err(BatchError::FileParse(format!(
            "multiple root elements: <{}> follows the root",
            element.name
        )))
    } else {
        *root = Some(element);
        Ok(())
    }
}

fn push_text(open: &mut [Element], text: &str) -> Result<(), BatchError> {
    match open.last_mut() {
        Some(element) => {
            element.text.push_str(text);
            Ok(())
        }
        None if text.trim().is_empty() => Ok(()),
        None => Err(BatchError::FileParse(format!(
            "text outside of the root element: {}",
            text.trim()
        ))),
    }
}

fn utf8(bytes: &[u8]) -> Result<&str, BatchError> {
    str::from_utf8(bytes).map_err(|e| BatchError::FileParse(format!("invalid UTF-8: {}", e)))
}
