#![cfg_attr(docsrs, feature(doc_cfg))]
//#![warn(missing_docs)]

/*!
 # xml2mongo

 Bulk import of XML files into a MongoDB collection.

 Every element carrying the record tag (`PubmedArticle` by default) in every
 file of a source directory becomes one document of the target collection.
 The import is built like a small batch job: a [`core::job::ImportJob`] runs
 one [`core::step::Step`] per file, which reads record elements, converts them
 and writes them in chunks.

 ## Core Concepts

- **ImportJob:** the whole run. It lists the source files, optionally clears the collection, imports every file and reports an [`core::job::ImportSummary`].
- **Step:** the import of one file. A `Step` reads records, processes them and writes them out, skipping the items that fail.
- **ItemReader:** yields the record elements of a parsed file, one at a time.
- **ItemProcessor:** maps a record element to a document.
- **ItemWriter:** sends a chunk of documents to a [`core::store::DocumentStore`].
- **DocumentStore:** the destination collection. [`item::mongodb::MongoDocumentStore`] is the MongoDB implementation.

 ## Record mapping

 A record element is wrapped under its own tag. Attributes become string
 fields, child elements become nested values, trimmed text is stored under
 `text`, and repeated names are collected into an array:

```xml
<PubmedArticle status="MEDLINE">
  <PMID>123</PMID>
  <Author>Ada</Author>
  <Author>Grace</Author>
</PubmedArticle>
```

```json
{ "PubmedArticle": {
    "status": "MEDLINE",
    "PMID": { "text": "123" },
    "Author": [ { "text": "Ada" }, { "text": "Grace" } ] } }
```

 ## Fault tolerance

 A file that cannot be parsed is logged and skipped; a record that cannot be
 converted or inserted is skipped without affecting its siblings. Skipped
 files can be listed in a log file. Only configuration and connection errors
 abort the run.

 ## Getting Started

```no_run
use xml2mongo::{config::ImportConfigurationBuilder, core::job, BatchError};

fn main() -> Result<(), BatchError> {
    let config = ImportConfigurationBuilder::new()
        .source_dir("/data/pubmed")
        .database("bibliography")
        .collection("articles")
        .file_filter(r"\.xml$")
        .log_file("/tmp/failed-files.log")
        .clear(true)
        .bulk_write(true)
        .build()?;

    let summary = job::run(&config)?;
    println!("{}", summary);

    Ok(())
}
```

 ## License
 Licensed under either of

 -   Apache License, Version 2.0
     ([LICENSE-APACHE](LICENSE-APACHE) or <http://www.apache.org/licenses/LICENSE-2.0>)
 -   MIT license
     ([LICENSE-MIT](LICENSE-MIT) or <http://opensource.org/licenses/MIT>)

 at your option.
 */

/// Settings of an import run
pub mod config;

/// Core module for batch operations
pub mod core;

/// Error types for batch operations
pub mod error;

#[doc(inline)]
pub use error::*;

/// Readers, writers and helpers of an import (directory scan, XML, MongoDB)
pub mod item;
