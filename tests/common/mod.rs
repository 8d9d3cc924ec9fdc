#![allow(dead_code)]

pub mod mocks;

use std::{
    cell::{Cell, RefCell},
    fs,
    path::Path,
};

use mongodb::bson::Document;
use xml2mongo::{core::store::DocumentStore, BatchError};

/// Document store keeping everything in memory.
#[derive(Default)]
pub struct InMemoryStore {
    documents: RefCell<Vec<Document>>,
    clear_count: Cell<usize>,
    close_count: Cell<usize>,
}

impl InMemoryStore {
    /// Store already holding `documents`, as left by an earlier run.
    pub fn with_documents(documents: Vec<Document>) -> Self {
        Self {
            documents: RefCell::new(documents),
            ..Default::default()
        }
    }

    pub fn documents(&self) -> Vec<Document> {
        self.documents.borrow().clone()
    }

    pub fn len(&self) -> usize {
        self.documents.borrow().len()
    }

    pub fn clear_count(&self) -> usize {
        self.clear_count.get()
    }

    pub fn close_count(&self) -> usize {
        self.close_count.get()
    }
}

impl DocumentStore for InMemoryStore {
    fn insert_one(&self, document: &Document) -> Result<(), BatchError> {
        self.documents.borrow_mut().push(document.clone());
        Ok(())
    }

    fn insert_many(&self, documents: &[Document]) -> Result<usize, BatchError> {
        self.documents.borrow_mut().extend_from_slice(documents);
        Ok(documents.len())
    }

    fn clear(&self) -> Result<(), BatchError> {
        self.clear_count.set(self.clear_count.get() + 1);
        self.documents.borrow_mut().clear();
        Ok(())
    }

    fn close(&self) -> Result<(), BatchError> {
        self.close_count.set(self.close_count.get() + 1);
        Ok(())
    }
}

/// Writes `content` to `dir/name`, creating parent directories.
pub fn write_file(dir: &Path, name: &str, content: &str) {
    let path = dir.join(name);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, content).unwrap();
}
