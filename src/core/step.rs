use std::{
    cell::Cell,
    time::{Duration, Instant},
};

use log::{debug, error};

use crate::BatchError;

use super::item::{ItemProcessor, ItemReader, ItemWriter};

/// Outcome of a finished step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepStatus {
    /// Every item read was processed and written.
    Success,
    /// The step went through all items but skipped some of them.
    CompletedWithErrors,
}

#[derive(Debug)]
pub struct StepResult {
    pub start: Instant,
    pub end: Instant,
    pub duration: Duration,
    pub status: StepStatus,
    pub read_count: usize,
    pub read_error_count: usize,
    pub process_error_count: usize,
    pub write_count: usize,
    pub write_error_count: usize,
}

impl StepResult {
    /// Items that were read but did not reach the destination.
    pub fn skip_count(&self) -> usize {
        self.process_error_count + self.write_error_count
    }
}

/// Drains a reader through a processor into a writer, chunk by chunk.
///
/// A failing item never stops the step: read and process errors skip the
/// item, write errors skip the chunk (or the failed part of it), and the
/// counters of the [`StepResult`] tell what happened.
pub struct Step<'a, R, W> {
    name: String,
    reader: &'a dyn ItemReader<R>,
    processor: &'a dyn ItemProcessor<R, W>,
    writer: &'a dyn ItemWriter<W>,
    chunk_size: usize,
    read_count: Cell<usize>,
    read_error_count: Cell<usize>,
    process_error_count: Cell<usize>,
    write_count: Cell<usize>,
    write_error_count: Cell<usize>,
}

impl<R, W> Step<'_, R, W> {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn execute(&self) -> Result<StepResult, BatchError> {
        let start = Instant::now();

        debug!("Start of step: {}", self.name);

        self.writer.open()?;

        let mut read_items: Vec<(usize, R)> = Vec::with_capacity(self.chunk_size);

        loop {
            let finished = self.read_chunk(&mut read_items);

            let processed_items = self.process_chunk(&read_items);

            self.write_chunk(&processed_items);

            if finished {
                break;
            }
        }

        self.writer.close()?;

        debug!("End of step: {}", self.name);

        let status = if self.read_error_count.get()
            + self.process_error_count.get()
            + self.write_error_count.get()
            == 0
        {
            StepStatus::Success
        } else {
            StepStatus::CompletedWithErrors
        };

        Ok(StepResult {
            start,
            end: Instant::now(),
            duration: start.elapsed(),
            status,
            read_count: self.read_count.get(),
            read_error_count: self.read_error_count.get(),
            process_error_count: self.process_error_count.get(),
            write_count: self.write_count.get(),
            write_error_count: self.write_error_count.get(),
        })
    }

    /// Fills `read_items` with up to `chunk_size` items, each tagged with its
    /// 1-based position. Returns `true` once the reader is drained.
    fn read_chunk(&self, read_items: &mut Vec<(usize, R)>) -> bool {
        read_items.clear();

        while read_items.len() < self.chunk_size {
            match self.reader.read() {
                Ok(Some(item)) => {
                    Self::inc(&self.read_count, 1);
                    read_items.push((self.read_count.get() + self.read_error_count.get(), item));
                }
                Ok(None) => {
                    debug!("End reading chunk: FINISHED");
                    return true;
                }
                Err(err) => {
                    Self::inc(&self.read_error_count, 1);
                    error!("{}: error occurred during read item: {}", self.name, err);
                }
            }
        }

        debug!("End reading chunk: FULL");
        false
    }

    fn process_chunk(&self, read_items: &[(usize, R)]) -> Vec<W> {
        let mut processed_items = Vec::with_capacity(read_items.len());

        for (position, item) in read_items {
            match self.processor.process(item) {
                Ok(processed) => processed_items.push(processed),
                Err(err) => {
                    Self::inc(&self.process_error_count, 1);
                    error!("{}: record {} skipped: {}", self.name, position, err);
                }
            }
        }

        processed_items
    }

    fn write_chunk(&self, processed_items: &[W]) {
        if processed_items.is_empty() {
            return;
        }

        let result = self.writer.write(processed_items).and_then(|()| self.writer.flush());

        match result {
            Ok(()) => Self::inc(&self.write_count, processed_items.len()),
            Err(BatchError::PartialWrite {
                inserted,
                failed,
                reason,
            }) => {
                Self::inc(&self.write_count, inserted);
                Self::inc(&self.write_error_count, failed);
                error!(
                    "{}: {} of {} records not written: {}",
                    self.name,
                    failed,
                    processed_items.len(),
                    reason
                );
            }
            Err(err) => {
                Self::inc(&self.write_error_count, processed_items.len());
                error!("{}: ItemWriter error: {}", self.name, err);
            }
        }
    }

    fn inc(counter: &Cell<usize>, count: usize) {
        counter.set(counter.get() + count);
    }
}

pub struct StepBuilder<'a, R, W> {
    name: String,
    reader: Option<&'a dyn ItemReader<R>>,
    processor: Option<&'a dyn ItemProcessor<R, W>>,
    writer: Option<&'a dyn ItemWriter<W>>,
    chunk_size: usize,
}

impl<'a, R, W> StepBuilder<'a, R, W> {
    pub fn new<S: Into<String>>(name: S) -> StepBuilder<'a, R, W> {
        Self {
            name: name.into(),
            reader: None,
            processor: None,
            writer: None,
            chunk_size: 1,
        }
    }

    pub fn reader(mut self, reader: &'a impl ItemReader<R>) -> StepBuilder<'a, R, W> {
        self.reader = Some(reader);
        self
    }

    pub fn processor(mut self, processor: &'a impl ItemProcessor<R, W>) -> StepBuilder<'a, R, W> {
        self.processor = Some(processor);
        self
    }

    pub fn writer(mut self, writer: &'a impl ItemWriter<W>) -> StepBuilder<'a, R, W> {
        self.writer = Some(writer);
        self
    }

    /// Number of items written together.
    pub fn chunk(mut self, chunk_size: usize) -> StepBuilder<'a, R, W> {
        self.chunk_size = chunk_size;
        self
    }

    pub fn build(self) -> Result<Step<'a, R, W>, BatchError> {
        let missing = |part: &str| BatchError::Configuration(format!("step {} has no {}", self.name, part));

        let reader = self.reader.ok_or_else(|| missing("reader"))?;
        let processor = self.processor.ok_or_else(|| missing("processor"))?;
        let writer = self.writer.ok_or_else(|| missing("writer"))?;

        if self.chunk_size == 0 {
            return Err(BatchError::Configuration(format!(
                "step {} has a chunk size of 0",
                self.name
            )));
        }

        Ok(Step {
            name: self.name,
            reader,
            processor,
            writer,
            chunk_size: self.chunk_size,
            read_count: Cell::new(0),
            read_error_count: Cell::new(0),
            process_error_count: Cell::new(0),
            write_count: Cell::new(0),
            write_error_count: Cell::new(0),
        })
    }
}
