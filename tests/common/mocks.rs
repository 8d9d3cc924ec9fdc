//! Mock version of DocumentStore;
use mockall::mock;

use mongodb::bson::Document;
use xml2mongo::{core::store::DocumentStore, BatchError};

mock! {
    pub Store {}
    impl DocumentStore for Store {
        fn insert_one(&self, document: &Document) -> Result<(), BatchError>;
        fn insert_many(&self, documents: &[Document]) -> Result<usize, BatchError>;
        fn clear(&self) -> Result<(), BatchError>;
        fn close(&self) -> Result<(), BatchError>;
    }
}
