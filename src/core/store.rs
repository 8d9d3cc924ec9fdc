use mongodb::bson::Document;

use crate::error::BatchError;

/// A document database collection that records are imported into.
///
/// The store owns its connection for the lifetime of a run. Implementations
/// enforce no uniqueness or schema constraint: inserting the same document
/// twice stores it twice.
pub trait DocumentStore {
    /// Inserts one document as a new record.
    fn insert_one(&self, document: &Document) -> Result<(), BatchError>;

    /// Inserts a batch of documents and returns how many were stored.
    ///
    /// When only part of the batch is stored the error is
    /// [`BatchError::PartialWrite`] with the split counts.
    fn insert_many(&self, documents: &[Document]) -> Result<usize, BatchError>;

    /// Removes every document of the collection.
    fn clear(&self) -> Result<(), BatchError>;

    /// Releases the connection. Calling it more than once is a no-op.
    fn close(&self) -> Result<(), BatchError>;
}
