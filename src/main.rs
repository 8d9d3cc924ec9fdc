//! xml2mongo: import the records of a directory of XML files into MongoDB.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use env_logger::Env;
use log::info;
use xml2mongo::{
    config::{
        ImportConfigurationBuilder, DEFAULT_CHUNK_SIZE, DEFAULT_ENCODING, DEFAULT_HOST,
        DEFAULT_PORT, DEFAULT_RECORD_TAG,
    },
    core::job,
};

#[derive(Parser)]
#[command(name = "xml2mongo")]
#[command(about = "Import the repeated elements of XML files into a MongoDB collection")]
#[command(version)]
struct Cli {
    /// Directory containing the XML files
    #[arg(long, alias = "xmlDir")]
    xml_dir: PathBuf,

    /// Target database
    #[arg(long)]
    database: String,

    /// Target collection
    #[arg(long)]
    collection: String,

    /// Element name of the records to import
    #[arg(long, alias = "tagMain", default_value = DEFAULT_RECORD_TAG)]
    tag_main: String,

    /// MongoDB host
    #[arg(long, default_value = DEFAULT_HOST)]
    host: String,

    /// MongoDB port
    #[arg(long, default_value_t = DEFAULT_PORT)]
    port: u16,

    /// MongoDB user
    #[arg(long)]
    user: Option<String>,

    /// MongoDB password
    #[arg(long)]
    password: Option<String>,

    /// Regular expression a file name must match to be imported
    #[arg(long, alias = "xmlFilter")]
    xml_filter: Option<String>,

    /// Character encoding of the XML files
    #[arg(long, alias = "xmlFileEncod", default_value = DEFAULT_ENCODING)]
    encoding: String,

    /// File receiving the names of the files that failed to import
    #[arg(long, alias = "logFile")]
    log_file: Option<PathBuf>,

    /// Also import the files of subdirectories
    #[arg(long)]
    recursive: bool,

    /// Drop the collection before importing
    #[arg(long)]
    clear: bool,

    /// Insert records in batches instead of one by one
    #[arg(long, alias = "bulkWrite")]
    bulk_write: bool,

    /// Records per batch with --bulk-write
    #[arg(long, default_value_t = DEFAULT_CHUNK_SIZE)]
    chunk_size: usize,

    /// Hide the progress bars
    #[arg(short, long)]
    quiet: bool,

    /// Print the summary as JSON
    #[arg(long)]
    json: bool,

    /// Log debug messages
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(Env::default().default_filter_or(level)).init();

    let mut builder = ImportConfigurationBuilder::new()
        .source_dir(&cli.xml_dir)
        .database(cli.database)
        .collection(cli.collection)
        .record_tag(cli.tag_main)
        .host(cli.host)
        .port(cli.port)
        .encoding(cli.encoding)
        .recursive(cli.recursive)
        .clear(cli.clear)
        .bulk_write(cli.bulk_write)
        .chunk_size(cli.chunk_size)
        .show_progress(!cli.quiet);

    if let Some(user) = cli.user {
        builder = builder.username(user);
    }
    if let Some(password) = cli.password {
        builder = builder.password(password);
    }
    if let Some(filter) = cli.xml_filter {
        builder = builder.file_filter(filter);
    }
    if let Some(log_file) = cli.log_file {
        builder = builder.log_file(log_file);
    }

    let config = builder.build().context("Invalid import configuration")?;

    info!("Importing {} into {}", cli.xml_dir.display(), config.connection());

    let summary = job::run(&config)
        .with_context(|| format!("Import of {} failed", cli.xml_dir.display()))?;

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        println!("{}", summary);
    }

    Ok(())
}
