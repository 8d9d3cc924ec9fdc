use std::{
    fs,
    path::{Path, PathBuf},
};

use log::{debug, warn};
use regex::Regex;
use walkdir::WalkDir;

use crate::{config::ImportConfiguration, BatchError};

/// Lists the candidate files of a source directory.
///
/// Only regular files are returned, sorted by name within each directory.
/// Subdirectories are visited in recursive mode only; entries that cannot be
/// read are logged and skipped. An excluded file (the failure log when it
/// lives under the root) is never listed.
pub struct DirectoryScanner<'a> {
    root: &'a Path,
    filter: Option<&'a Regex>,
    recursive: bool,
    exclude: Option<&'a Path>,
}

impl<'a> DirectoryScanner<'a> {
    pub fn new(root: &'a Path) -> Self {
        Self {
            root,
            filter: None,
            recursive: false,
            exclude: None,
        }
    }

    pub fn from_config(config: &'a ImportConfiguration) -> Self {
        Self {
            root: config.source_dir(),
            filter: config.file_filter(),
            recursive: config.recursive(),
            exclude: config.log_file(),
        }
    }

    /// Keeps only files whose name matches `filter`.
    pub fn filter(mut self, filter: &'a Regex) -> Self {
        self.filter = Some(filter);
        self
    }

    pub fn recursive(mut self, recursive: bool) -> Self {
        self.recursive = recursive;
        self
    }

    /// Leaves `path` out of the listing, whatever its name.
    pub fn exclude(mut self, path: &'a Path) -> Self {
        self.exclude = Some(path);
        self
    }

    pub fn scan(&self) -> Result<Vec<PathBuf>, BatchError> {
        if !self.root.is_dir() {
            return Err(BatchError::Configuration(format!(
                "source directory {} does not exist or is not a directory",
                self.root.display()
            )));
        }
        // Surfaces a permission problem on the root itself
        fs::read_dir(self.root)?;

        // Missing until the first failure is logged
        let excluded = self.exclude.and_then(|path| fs::canonicalize(path).ok());

        let max_depth = if self.recursive { usize::MAX } else { 1 };
        let mut files = Vec::new();

        for entry in WalkDir::new(self.root)
            .min_depth(1)
            .max_depth(max_depth)
            .sort_by_file_name()
        {
            let entry = match entry {
                Ok(entry) => entry,
                Err(err) => {
                    warn!("Skipping unreadable entry: {}", err);
                    continue;
                }
            };

            if !entry.path().is_file() {
                continue;
            }

            if let Some(excluded) = &excluded {
                if fs::canonicalize(entry.path()).is_ok_and(|path| &path == excluded) {
                    debug!("Excluded {}", entry.path().display());
                    continue;
                }
            }

            if let Some(filter) = self.filter {
                let file_name = entry.file_name().to_string_lossy();
                if !filter.is_match(&file_name) {
                    debug!("Filtered out {}", entry.path().display());
                    continue;
                }
            }

            files.push(entry.into_path());
        }

        Ok(files)
    }
}
