use std::cell::Cell;

use indicatif::{ProgressBar, ProgressStyle};
use log::debug;

use crate::{
    config::DEFAULT_RECORD_TAG,
    core::item::{ItemReader, ItemReaderResult},
};

use super::element::{Element, XmlDocument};

/// A builder for [`XmlRecordReader`].
///
/// # Examples
///
/// ```
/// use xml2mongo::core::item::ItemReader;
/// use xml2mongo::item::xml::{XmlDocument, XmlRecordReaderBuilder};
///
/// let xml = r#"
/// <PubmedArticleSet>
///   <PubmedArticle><PMID>1</PMID></PubmedArticle>
///   <DeleteCitation/>
///   <PubmedArticle><PMID>2</PMID></PubmedArticle>
/// </PubmedArticleSet>
/// "#;
/// let document = XmlDocument::parse(xml).unwrap();
///
/// let reader = XmlRecordReaderBuilder::new()
///     .tag("PubmedArticle")
///     .from_document(&document);
///
/// assert_eq!(reader.len(), 2);
/// assert_eq!(reader.read().unwrap().unwrap().name(), "PubmedArticle");
/// assert!(reader.read().unwrap().is_some());
/// assert!(reader.read().unwrap().is_none());
/// ```
pub struct XmlRecordReaderBuilder {
    tag_name: String,
    label: Option<String>,
    show_progress: bool,
}

impl Default for XmlRecordReaderBuilder {
    fn default() -> Self {
        Self {
            tag_name: DEFAULT_RECORD_TAG.to_string(),
            label: None,
            show_progress: false,
        }
    }
}

impl XmlRecordReaderBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the tag name of the record elements.
    pub fn tag<S: AsRef<str>>(mut self, tag_name: S) -> Self {
        self.tag_name = tag_name.as_ref().to_string();
        self
    }

    /// Text shown next to the progress bar, usually the file name.
    pub fn label<S: AsRef<str>>(mut self, label: S) -> Self {
        self.label = Some(label.as_ref().to_string());
        self
    }

    /// Draws a progress bar ticking once per record read.
    pub fn show_progress(mut self, show_progress: bool) -> Self {
        self.show_progress = show_progress;
        self
    }

    pub fn from_document(self, document: &XmlDocument) -> XmlRecordReader<'_> {
        let records = document.root().descendants_named(&self.tag_name);
        debug!(
            "Found {} <{}> records under <{}>",
            records.len(),
            self.tag_name,
            document.root().name()
        );

        let progress = if self.show_progress {
            let progress = ProgressBar::new(records.len() as u64);
            progress.set_style(
                ProgressStyle::default_bar()
                    .template("[{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")
                    .unwrap_or_else(|_| ProgressStyle::default_bar())
                    .progress_chars("#>-"),
            );
            if let Some(label) = self.label {
                progress.set_message(label);
            }
            progress
        } else {
            ProgressBar::hidden()
        };

        XmlRecordReader {
            records,
            offset: Cell::new(0),
            progress,
        }
    }
}

/// Reads the record elements of a parsed document, in document order.
pub struct XmlRecordReader<'a> {
    records: Vec<&'a Element>,
    offset: Cell<usize>,
    progress: ProgressBar,
}

impl XmlRecordReader<'_> {
    /// Number of records in the document.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl<'a> ItemReader<&'a Element> for XmlRecordReader<'a> {
    fn read(&self) -> ItemReaderResult<&'a Element> {
        let offset = self.offset.get();

        match self.records.get(offset) {
            Some(record) => {
                self.offset.set(offset + 1);
                self.progress.inc(1);
                Ok(Some(*record))
            }
            None => {
                self.progress.finish();
                Ok(None)
            }
        }
    }
}
