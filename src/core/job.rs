use std::{
    cell::Cell,
    fmt,
    path::Path,
    time::{Duration, Instant},
};

use chrono::{DateTime, Local};
use log::{error, info, warn};
use serde::Serialize;
use uuid::Uuid;

use crate::{
    config::ImportConfiguration,
    item::{
        directory::DirectoryScanner,
        failure_log::FailureLog,
        mongodb::{DocumentWriterBuilder, MongoDocumentStore},
        xml::{DocumentConverter, XmlDocument, XmlRecordReaderBuilder},
    },
    BatchError,
};

use super::{
    step::{StepBuilder, StepResult},
    store::DocumentStore,
};

/// Lifecycle of an [`ImportJob`].
///
/// A job moves from `Idle` to `Running` when [`ImportJob::run`] is called and
/// ends in `Succeeded` or `Aborted`. A completed job cannot run again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum JobStatus {
    /// The job has not been started.
    Idle,
    /// Files are being imported.
    Running,
    /// Every file was visited. Some files or records may have been skipped.
    Succeeded,
    /// A fatal error stopped the run.
    Aborted,
}

impl JobStatus {
    pub fn is_completed(&self) -> bool {
        matches!(self, JobStatus::Succeeded | JobStatus::Aborted)
    }
}

/// Outcome of a completed import.
#[derive(Debug, Clone, Serialize)]
pub struct ImportSummary {
    /// Identifier of the job run
    pub id: Uuid,
    pub status: JobStatus,
    /// Candidate files found in the source directory
    pub files_seen: usize,
    /// Files parsed successfully, whatever happened to their records
    pub files_processed: usize,
    /// Files that could not be read or parsed
    pub files_failed: usize,
    /// Record elements found in the parsed files
    pub records_read: usize,
    pub records_inserted: usize,
    /// Records that could not be mapped to a document
    pub conversion_failures: usize,
    /// Records rejected by the database
    pub write_failures: usize,
    pub started_at: DateTime<Local>,
    pub ended_at: DateTime<Local>,
    pub duration: Duration,
}

impl ImportSummary {
    /// Records that were found but not inserted.
    pub fn record_failures(&self) -> usize {
        self.conversion_failures + self.write_failures
    }
}

impl fmt::Display for ImportSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Import {} ({:?})", self.id, self.status)?;
        writeln!(
            f,
            "  Files:   {} seen, {} processed, {} failed",
            self.files_seen, self.files_processed, self.files_failed
        )?;
        writeln!(
            f,
            "  Records: {} read, {} inserted, {} failed to convert, {} failed to write",
            self.records_read, self.records_inserted, self.conversion_failures, self.write_failures
        )?;
        writeln!(
            f,
            "  Started: {}",
            self.started_at.format("%Y-%m-%d %H:%M:%S")
        )?;
        writeln!(f, "  Ended:   {}", self.ended_at.format("%Y-%m-%d %H:%M:%S"))?;
        write!(f, "  Time:    {:.2}s", self.duration.as_secs_f64())
    }
}

/// Running totals of a job.
#[derive(Default)]
struct ImportCounters {
    files_processed: usize,
    files_failed: usize,
    records_read: usize,
    records_inserted: usize,
    conversion_failures: usize,
    write_failures: usize,
}

impl ImportCounters {
    fn add_step(&mut self, result: &StepResult) {
        self.files_processed += 1;
        self.records_read += result.read_count;
        self.records_inserted += result.write_count;
        self.conversion_failures += result.process_error_count;
        self.write_failures += result.write_error_count;
    }
}

/// Imports a directory of XML files into a document store.
///
/// Each candidate file is parsed in full, then its record elements are
/// converted and written one chunk at a time through a [`super::step::Step`].
/// Failures are confined to the smallest unit they concern:
///
/// - a file that cannot be read or parsed is skipped and counted in `files_failed`,
/// - a record that cannot be converted or written is skipped and counted,
/// - only a fatal error (unreadable source directory, unopenable log file,
///   failed clear) stops the run, leaving the job `Aborted`.
///
/// The store is cleared at most once, before the first insert, and closed
/// when the run ends, whatever the outcome.
///
/// # Example
///
/// ```no_run
/// use xml2mongo::config::ImportConfigurationBuilder;
/// use xml2mongo::core::job::ImportJobBuilder;
/// use xml2mongo::item::mongodb::MongoDocumentStore;
///
/// # fn example() -> Result<(), xml2mongo::BatchError> {
/// let config = ImportConfigurationBuilder::new()
///     .source_dir("/data/pubmed")
///     .database("bibliography")
///     .collection("articles")
///     .build()?;
///
/// let store = MongoDocumentStore::connect(config.connection(), "bibliography", "articles")?;
///
/// let job = ImportJobBuilder::new().config(&config).store(&store).build()?;
/// let summary = job.run()?;
/// println!("{}", summary);
/// # Ok(())
/// # }
/// ```
pub struct ImportJob<'a> {
    /// Unique identifier for this run
    id: Uuid,
    /// Human-readable name used in logs
    name: String,
    config: &'a ImportConfiguration,
    store: &'a dyn DocumentStore,
    converter: DocumentConverter,
    status: Cell<JobStatus>,
}

impl ImportJob<'_> {
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn status(&self) -> JobStatus {
        self.status.get()
    }

    /// Runs the import.
    ///
    /// # Returns
    /// - `Ok(ImportSummary)` once every candidate file has been visited
    /// - `Err(BatchError)` on a fatal error, or when the job already ran
    pub fn run(&self) -> Result<ImportSummary, BatchError> {
        if self.status.get() != JobStatus::Idle {
            return Err(BatchError::IllegalState(format!(
                "job {} is {:?} and cannot run again",
                self.name,
                self.status.get()
            )));
        }
        self.status.set(JobStatus::Running);

        info!("Start of job: {}, id: {}", self.name, self.id);

        let result = self.import_all();

        if let Err(err) = self.store.close() {
            warn!("Failed to close store: {}", err);
        }

        match result {
            Ok(summary) => {
                self.status.set(JobStatus::Succeeded);
                info!("End of job: {}, id: {}", self.name, self.id);
                Ok(summary)
            }
            Err(err) => {
                self.status.set(JobStatus::Aborted);
                error!("Job {} aborted: {}", self.name, err);
                Err(err)
            }
        }
    }

    fn import_all(&self) -> Result<ImportSummary, BatchError> {
        let started_at = Local::now();
        let start = Instant::now();

        let files = DirectoryScanner::from_config(self.config).scan()?;
        let failure_log = FailureLog::open(self.config.log_file())?;

        info!("--Export start time {}--", started_at.format("%H:%M"));
        info!("Total files for export: {}", files.len());

        if self.config.clear() {
            self.store.clear()?;
        }

        let mut counters = ImportCounters::default();

        for path in &files {
            let file_name = self.display_name(path);

            match self.import_file(path, &file_name) {
                Ok(result) => {
                    counters.add_step(&result);
                    if result.skip_count() > 0 {
                        warn!(
                            "Name File: {} - {} of {} records not imported",
                            file_name,
                            result.skip_count(),
                            result.read_count
                        );
                        self.log_failure(&failure_log, path);
                    }
                }
                Err(err) => {
                    counters.files_failed += 1;
                    error!("Name File: {}\nFILE CONVERSION ERROR - {}", file_name, err);
                    self.log_failure(&failure_log, path);
                }
            }
        }

        let ended_at = Local::now();
        info!("--Export end time {}--", ended_at.format("%H:%M"));

        Ok(ImportSummary {
            id: self.id,
            status: JobStatus::Succeeded,
            files_seen: files.len(),
            files_processed: counters.files_processed,
            files_failed: counters.files_failed,
            records_read: counters.records_read,
            records_inserted: counters.records_inserted,
            conversion_failures: counters.conversion_failures,
            write_failures: counters.write_failures,
            started_at,
            ended_at,
            duration: start.elapsed(),
        })
    }

    /// Parses one file and pushes its records through a step.
    fn import_file(&self, path: &Path, file_name: &str) -> Result<StepResult, BatchError> {
        let document = XmlDocument::from_path(path, self.config.encoding())?;

        info!("Name File: {}", file_name);

        let reader = XmlRecordReaderBuilder::new()
            .tag(self.config.record_tag())
            .label(file_name)
            .show_progress(self.config.show_progress())
            .from_document(&document);

        let writer = DocumentWriterBuilder::new()
            .store(self.store)
            .bulk(self.config.bulk_write())
            .build()?;

        let step = StepBuilder::new(file_name)
            .reader(&reader)
            .processor(&self.converter)
            .writer(&writer)
            .chunk(self.config.write_chunk_size())
            .build()?;

        step.execute()
    }

    fn display_name(&self, path: &Path) -> String {
        path.strip_prefix(self.config.source_dir())
            .unwrap_or(path)
            .display()
            .to_string()
    }

    fn log_failure(&self, failure_log: &FailureLog, path: &Path) {
        if let Err(err) = failure_log.record(path) {
            warn!("Cannot write {} to the log file: {}", path.display(), err);
        }
    }
}

/// Builder for [`ImportJob`].
#[derive(Default)]
pub struct ImportJobBuilder<'a> {
    /// Optional name for the job (`<database>.<collection>` if not specified)
    name: Option<String>,
    config: Option<&'a ImportConfiguration>,
    store: Option<&'a dyn DocumentStore>,
}

impl<'a> ImportJobBuilder<'a> {
    pub fn new() -> Self {
        Self {
            name: None,
            config: None,
            store: None,
        }
    }

    pub fn name<S: Into<String>>(mut self, name: S) -> ImportJobBuilder<'a> {
        self.name = Some(name.into());
        self
    }

    pub fn config(mut self, config: &'a ImportConfiguration) -> ImportJobBuilder<'a> {
        self.config = Some(config);
        self
    }

    /// Sets the store records are written to. The job closes it when the run ends.
    pub fn store(mut self, store: &'a dyn DocumentStore) -> ImportJobBuilder<'a> {
        self.store = Some(store);
        self
    }

    pub fn build(self) -> Result<ImportJob<'a>, BatchError> {
        let config = self
            .config
            .ok_or_else(|| BatchError::Configuration("import job has no configuration".to_string()))?;
        let store = self
            .store
            .ok_or_else(|| BatchError::Configuration("import job has no store".to_string()))?;

        Ok(ImportJob {
            id: Uuid::new_v4(),
            name: self
                .name
                .unwrap_or_else(|| format!("{}.{}", config.database(), config.collection())),
            config,
            store,
            converter: DocumentConverter::with_text_key(config.text_key()),
            status: Cell::new(JobStatus::Idle),
        })
    }
}

/// Connects to MongoDB with the run's connection settings and imports
/// `config.source_dir()` into the configured collection.
///
/// # Returns
/// - `Ok(ImportSummary)` when the run completed
/// - `Err(BatchError::Connection)` when the server cannot be reached; nothing is imported
/// - `Err(BatchError)` for any other fatal error
pub fn run(config: &ImportConfiguration) -> Result<ImportSummary, BatchError> {
    let store =
        MongoDocumentStore::connect(config.connection(), config.database(), config.collection())?;

    ImportJobBuilder::new()
        .config(config)
        .store(&store)
        .build()?
        .run()
}
