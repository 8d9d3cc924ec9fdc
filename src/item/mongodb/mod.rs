/// This module contains the MongoDB implementation of the document store.
pub mod mongodb_store;

/// This module contains the writer storing converted records into a document store.
pub mod mongodb_writer;

pub use mongodb_store::MongoDocumentStore;
pub use mongodb_writer::{DocumentWriter, DocumentWriterBuilder};
