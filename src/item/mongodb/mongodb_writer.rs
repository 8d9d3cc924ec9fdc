use mongodb::bson::Document;

use crate::{
    core::{
        item::{ItemWriter, ItemWriterResult},
        store::DocumentStore,
    },
    BatchError,
};

/// Writes converted records to a [`DocumentStore`].
///
/// In bulk mode a whole chunk goes through one [`DocumentStore::insert_many`];
/// otherwise every record is inserted on its own.
pub struct DocumentWriter<'a> {
    store: &'a dyn DocumentStore,
    bulk: bool,
}

impl ItemWriter<Document> for DocumentWriter<'_> {
    fn write(&self, items: &[Document]) -> ItemWriterResult {
        if items.is_empty() {
            return Ok(());
        }

        if self.bulk {
            return self.store.insert_many(items).map(|_| ());
        }

        let mut failed = 0;
        let mut reason = String::new();

        for item in items {
            if let Err(error) = self.store.insert_one(item) {
                failed += 1;
                reason = error.to_string();
            }
        }

        match failed {
            0 => Ok(()),
            failed if failed == items.len() => Err(BatchError::ItemWriter(reason)),
            failed => Err(BatchError::PartialWrite {
                inserted: items.len() - failed,
                failed,
                reason,
            }),
        }
    }
}

#[derive(Default)]
pub struct DocumentWriterBuilder<'a> {
    store: Option<&'a dyn DocumentStore>,
    bulk: bool,
}

impl<'a> DocumentWriterBuilder<'a> {
    pub fn new() -> Self {
        Self {
            store: None,
            bulk: false,
        }
    }

    pub fn store(mut self, store: &'a dyn DocumentStore) -> DocumentWriterBuilder<'a> {
        self.store = Some(store);
        self
    }

    /// Inserts each chunk with a single bulk write.
    pub fn bulk(mut self, bulk: bool) -> DocumentWriterBuilder<'a> {
        self.bulk = bulk;
        self
    }

    pub fn build(&self) -> Result<DocumentWriter<'a>, BatchError> {
        let store = self
            .store
            .ok_or_else(|| BatchError::Configuration("document writer has no store".to_string()))?;

        Ok(DocumentWriter {
            store,
            bulk: self.bulk,
        })
    }
}
