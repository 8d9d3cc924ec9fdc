/// This module lists the source files of an import.
pub mod directory;

/// This module records the files that failed to import.
pub mod failure_log;

/// This module provides the MongoDB document store and record writer.
pub mod mongodb;

/// This module parses XML files and converts record elements into documents.
pub mod xml;
