use thiserror::Error;

#[derive(Error, Debug)]
/// Import error
///
/// Errors are split by scope: a fatal error aborts the whole run, a file error
/// skips one file, and a record error skips one record.
pub enum BatchError {
    /// The database could not be reached, or the target collection could not be prepared.
    #[error("Connection error: {0}")]
    Connection(String),

    /// A source file could not be read, decoded or parsed as XML.
    #[error("File parse error: {0}")]
    FileParse(String),

    /// A record element could not be mapped to a document.
    #[error("Conversion error: {0}")]
    Conversion(String),

    #[error("ItemWriter from: {0}")]
    ItemWriter(String),

    /// A batched write stored only part of a chunk.
    #[error("Partial write: {inserted} inserted, {failed} failed: {reason}")]
    PartialWrite {
        inserted: usize,
        failed: usize,
        reason: String,
    },

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Illegal state: {0}")]
    IllegalState(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl BatchError {
    /// Returns `true` when the error must terminate the run.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            BatchError::Connection(_)
                | BatchError::Configuration(_)
                | BatchError::IllegalState(_)
                | BatchError::Io(_)
        )
    }
}
