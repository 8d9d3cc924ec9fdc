//! Run parameters of an import.
//!
//! An [`ImportConfiguration`] is built once, validated, and then only read:
//! the job borrows it for the whole run.
//!
//! ```
//! use xml2mongo::config::ImportConfigurationBuilder;
//!
//! let config = ImportConfigurationBuilder::new()
//!     .source_dir("/data/pubmed")
//!     .database("bibliography")
//!     .collection("articles")
//!     .file_filter(r"\.xml$")
//!     .clear(true)
//!     .build()
//!     .unwrap();
//!
//! assert_eq!(config.record_tag(), "PubmedArticle");
//! assert_eq!(config.connection().port, 27017);
//! assert!(config.clear());
//! ```

use std::{
    fmt,
    path::{Path, PathBuf},
    time::Duration,
};

use encoding_rs::Encoding;
use regex::Regex;

use crate::BatchError;

pub const DEFAULT_RECORD_TAG: &str = "PubmedArticle";
pub const DEFAULT_HOST: &str = "localhost";
pub const DEFAULT_PORT: u16 = 27017;
pub const DEFAULT_ENCODING: &str = "utf-8";
pub const DEFAULT_TEXT_KEY: &str = "text";
pub const DEFAULT_CHUNK_SIZE: usize = 1000;

/// Where and as whom to connect to the database server.
#[derive(Clone, PartialEq)]
pub struct ConnectionSettings {
    pub host: String,
    pub port: u16,
    pub username: Option<String>,
    pub password: Option<String>,
    /// How long to wait for a reachable server, the driver's default when `None`
    pub server_selection_timeout: Option<Duration>,
}

impl ConnectionSettings {
    /// Credentials are only sent when a username or a password was given.
    pub fn has_credentials(&self) -> bool {
        self.username.is_some() || self.password.is_some()
    }
}

impl Default for ConnectionSettings {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            username: None,
            password: None,
            server_selection_timeout: None,
        }
    }
}

impl fmt::Display for ConnectionSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.has_credentials() {
            write!(
                f,
                "mongodb://{}:***@{}:{}",
                self.username.as_deref().unwrap_or_default(),
                self.host,
                self.port
            )
        } else {
            write!(f, "mongodb://{}:{}", self.host, self.port)
        }
    }
}

// The password never reaches logs, even through `{:?}`.
impl fmt::Debug for ConnectionSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionSettings")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "***"))
            .field("server_selection_timeout", &self.server_selection_timeout)
            .finish()
    }
}

/// Validated parameters of one import run.
#[derive(Debug, Clone)]
pub struct ImportConfiguration {
    source_dir: PathBuf,
    database: String,
    collection: String,
    connection: ConnectionSettings,
    record_tag: String,
    file_filter: Option<Regex>,
    encoding: &'static Encoding,
    log_file: Option<PathBuf>,
    recursive: bool,
    clear: bool,
    bulk_write: bool,
    chunk_size: usize,
    text_key: String,
    show_progress: bool,
}

impl ImportConfiguration {
    pub fn source_dir(&self) -> &Path {
        &self.source_dir
    }

    pub fn database(&self) -> &str {
        &self.database
    }

    pub fn collection(&self) -> &str {
        &self.collection
    }

    pub fn connection(&self) -> &ConnectionSettings {
        &self.connection
    }

    /// Tag name of the repeated elements turned into records.
    pub fn record_tag(&self) -> &str {
        &self.record_tag
    }

    /// Pattern a file name must match to be imported, if any.
    pub fn file_filter(&self) -> Option<&Regex> {
        self.file_filter.as_ref()
    }

    /// Text encoding of the source files.
    pub fn encoding(&self) -> &'static Encoding {
        self.encoding
    }

    pub fn log_file(&self) -> Option<&Path> {
        self.log_file.as_deref()
    }

    pub fn recursive(&self) -> bool {
        self.recursive
    }

    pub fn clear(&self) -> bool {
        self.clear
    }

    pub fn bulk_write(&self) -> bool {
        self.bulk_write
    }

    /// Records per write: `chunk_size` in bulk mode, one otherwise.
    pub fn write_chunk_size(&self) -> usize {
        if self.bulk_write { self.chunk_size } else { 1 }
    }

    /// Key under which element text content is stored.
    pub fn text_key(&self) -> &str {
        &self.text_key
    }

    pub fn show_progress(&self) -> bool {
        self.show_progress
    }
}

/// Builder for [`ImportConfiguration`].
///
/// `source_dir`, `database` and `collection` are required; every other
/// parameter has a default.
pub struct ImportConfigurationBuilder {
    source_dir: Option<PathBuf>,
    database: Option<String>,
    collection: Option<String>,
    connection: ConnectionSettings,
    record_tag: String,
    file_filter: Option<String>,
    encoding: String,
    log_file: Option<PathBuf>,
    recursive: bool,
    clear: bool,
    bulk_write: bool,
    chunk_size: usize,
    text_key: String,
    show_progress: bool,
}

impl Default for ImportConfigurationBuilder {
    fn default() -> Self {
        Self {
            source_dir: None,
            database: None,
            collection: None,
            connection: ConnectionSettings::default(),
            record_tag: DEFAULT_RECORD_TAG.to_string(),
            file_filter: None,
            encoding: DEFAULT_ENCODING.to_string(),
            log_file: None,
            recursive: false,
            clear: false,
            bulk_write: false,
            chunk_size: DEFAULT_CHUNK_SIZE,
            text_key: DEFAULT_TEXT_KEY.to_string(),
            show_progress: true,
        }
    }
}

impl ImportConfigurationBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn source_dir<P: AsRef<Path>>(mut self, source_dir: P) -> Self {
        self.source_dir = Some(source_dir.as_ref().to_path_buf());
        self
    }

    pub fn database<S: Into<String>>(mut self, database: S) -> Self {
        self.database = Some(database.into());
        self
    }

    pub fn collection<S: Into<String>>(mut self, collection: S) -> Self {
        self.collection = Some(collection.into());
        self
    }

    pub fn record_tag<S: Into<String>>(mut self, record_tag: S) -> Self {
        self.record_tag = record_tag.into();
        self
    }

    pub fn host<S: Into<String>>(mut self, host: S) -> Self {
        self.connection.host = host.into();
        self
    }

    pub fn port(mut self, port: u16) -> Self {
        self.connection.port = port;
        self
    }

    pub fn username<S: Into<String>>(mut self, username: S) -> Self {
        self.connection.username = Some(username.into());
        self
    }

    pub fn password<S: Into<String>>(mut self, password: S) -> Self {
        self.connection.password = Some(password.into());
        self
    }

    /// Gives up on an unreachable server after `timeout`.
    pub fn server_selection_timeout(mut self, timeout: Duration) -> Self {
        self.connection.server_selection_timeout = Some(timeout);
        self
    }

    /// Regular expression matched against each file name.
    pub fn file_filter<S: Into<String>>(mut self, pattern: S) -> Self {
        self.file_filter = Some(pattern.into());
        self
    }

    /// Encoding label such as `utf-8`, `latin1` or `windows-1252`.
    pub fn encoding<S: Into<String>>(mut self, label: S) -> Self {
        self.encoding = label.into();
        self
    }

    pub fn log_file<P: AsRef<Path>>(mut self, log_file: P) -> Self {
        self.log_file = Some(log_file.as_ref().to_path_buf());
        self
    }

    pub fn recursive(mut self, recursive: bool) -> Self {
        self.recursive = recursive;
        self
    }

    pub fn clear(mut self, clear: bool) -> Self {
        self.clear = clear;
        self
    }

    pub fn bulk_write(mut self, bulk_write: bool) -> Self {
        self.bulk_write = bulk_write;
        self
    }

    pub fn chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size;
        self
    }

    pub fn text_key<S: Into<String>>(mut self, text_key: S) -> Self {
        self.text_key = text_key.into();
        self
    }

    pub fn show_progress(mut self, show_progress: bool) -> Self {
        self.show_progress = show_progress;
        self
    }

    /// Validates the parameters and freezes them into an [`ImportConfiguration`].
    pub fn build(self) -> Result<ImportConfiguration, BatchError> {
        let source_dir = self
            .source_dir
            .ok_or_else(|| BatchError::Configuration("source directory is required".to_string()))?;
        let database = required(self.database, "database")?;
        let collection = required(self.collection, "collection")?;
        let record_tag = required(Some(self.record_tag), "record tag")?;
        let text_key = required(Some(self.text_key), "text key")?;

        let encoding = Encoding::for_label(self.encoding.trim().as_bytes()).ok_or_else(|| {
            BatchError::Configuration(format!("unknown encoding: {}", self.encoding))
        })?;

        let file_filter = match self.file_filter {
            Some(pattern) => Some(Regex::new(&pattern).map_err(|e| {
                BatchError::Configuration(format!("invalid file filter {}: {}", pattern, e))
            })?),
            None => None,
        };

        if self.chunk_size == 0 {
            return Err(BatchError::Configuration(
                "chunk size must be greater than 0".to_string(),
            ));
        }

        Ok(ImportConfiguration {
            source_dir,
            database,
            collection,
            connection: self.connection,
            record_tag,
            file_filter,
            encoding,
            log_file: self.log_file,
            recursive: self.recursive,
            clear: self.clear,
            bulk_write: self.bulk_write,
            chunk_size: self.chunk_size,
            text_key,
            show_progress: self.show_progress,
        })
    }
}

fn required(value: Option<String>, name: &str) -> Result<String, BatchError> {
    match value {
        Some(value) if !value.trim().is_empty() => Ok(value),
        _ => Err(BatchError::Configuration(format!("{} is required", name))),
    }
}
