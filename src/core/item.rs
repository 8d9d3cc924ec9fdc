use crate::error::BatchError;

/// Result of a read: `Ok(Some(item))`, `Ok(None)` once the source is drained, or an error.
pub type ItemReaderResult<R> = Result<Option<R>, BatchError>;

/// Result of processing a single item.
pub type ItemProcessorResult<W> = Result<W, BatchError>;

/// Result of writing a chunk of items.
pub type ItemWriterResult = Result<(), BatchError>;

/// Retrieves the input of a step, one item at a time.
pub trait ItemReader<R> {
    fn read(&self) -> ItemReaderResult<R>;
}

/// Turns a read item into the item handed to the writer.
pub trait ItemProcessor<R, W> {
    fn process(&self, item: &R) -> ItemProcessorResult<W>;
}

/// Stores the output of a step, one chunk at a time.
pub trait ItemWriter<W> {
    fn write(&self, items: &[W]) -> ItemWriterResult;

    fn flush(&self) -> ItemWriterResult {
        Ok(())
    }

    fn open(&self) -> ItemWriterResult {
        Ok(())
    }

    fn close(&self) -> ItemWriterResult {
        Ok(())
    }
}
