use std::{
    cell::RefCell,
    collections::HashSet,
    fs::{File, OpenOptions},
    io::{LineWriter, Write},
    path::{Path, PathBuf},
};

use log::debug;

use crate::BatchError;

/// Plain-text list of the files that were not fully imported.
///
/// Each file is appended once, one path per line. Without a log path every
/// call is a no-op.
pub struct FailureLog {
    writer: Option<RefCell<LineWriter<File>>>,
    logged: RefCell<HashSet<PathBuf>>,
}

impl FailureLog {
    /// Opens `path` for appending, creating it if needed.
    pub fn open(path: Option<&Path>) -> Result<Self, BatchError> {
        let writer = match path {
            Some(path) => {
                let file = OpenOptions::new()
                    .create(true)
                    .append(true)
                    .open(path)
                    .map_err(|e| {
                        BatchError::Configuration(format!(
                            "cannot open log file {}: {}",
                            path.display(),
                            e
                        ))
                    })?;
                debug!("Logging failed files to {}", path.display());
                Some(RefCell::new(LineWriter::new(file)))
            }
            None => None,
        };

        Ok(Self {
            writer,
            logged: RefCell::new(HashSet::new()),
        })
    }

    pub fn record(&self, file: &Path) -> Result<(), BatchError> {
        let Some(writer) = &self.writer else {
            return Ok(());
        };

        if self.logged.borrow().contains(file) {
            return Ok(());
        }

        writeln!(writer.borrow_mut(), "{}", file.display())?;
        self.logged.borrow_mut().insert(file.to_path_buf());
        Ok(())
    }
}
