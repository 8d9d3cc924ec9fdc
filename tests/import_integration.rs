pub mod common;

use std::fs;

use mongodb::bson::{doc, Bson, Document};
use tempfile::tempdir;
use xml2mongo::{
    config::ImportConfigurationBuilder,
    core::job::{ImportJobBuilder, JobStatus},
    error::BatchError,
};

use common::{mocks::MockStore, write_file, InMemoryStore};

fn builder(dir: &std::path::Path) -> ImportConfigurationBuilder {
    ImportConfigurationBuilder::new()
        .source_dir(dir)
        .database("library")
        .collection("books")
        .record_tag("book")
        .show_progress(false)
}

fn book_id(document: &Document) -> Option<&str> {
    document
        .get_document("book")
        .ok()
        .and_then(|book| book.get_str("id").ok())
}

#[test]
fn records_of_every_file_are_imported() {
    let dir = tempdir().unwrap();
    write_file(
        dir.path(),
        "a.xml",
        r#"<library>
             <book id="1"><title>Dune</title></book>
             <book id="2"><title>Hyperion</title></book>
           </library>"#,
    );
    write_file(
        dir.path(),
        "b.xml",
        r#"<library><book id="3"><title>Solaris</title></book></library>"#,
    );
    let config = builder(dir.path()).build().unwrap();
    let store = InMemoryStore::default();

    let job = ImportJobBuilder::new()
        .config(&config)
        .store(&store)
        .build()
        .unwrap();
    let summary = job.run().unwrap();

    assert_eq!(summary.status, JobStatus::Succeeded);
    assert_eq!(summary.files_seen, 2);
    assert_eq!(summary.files_processed, 2);
    assert_eq!(summary.records_read, 3);
    assert_eq!(summary.records_inserted, 3);
    assert_eq!(summary.record_failures(), 0);
    assert_eq!(
        store.documents(),
        vec![
            doc! { "book": { "id": "1", "title": { "text": "Dune" } } },
            doc! { "book": { "id": "2", "title": { "text": "Hyperion" } } },
            doc! { "book": { "id": "3", "title": { "text": "Solaris" } } },
        ]
    );
    assert_eq!(store.close_count(), 1);
}

#[test]
fn malformed_file_does_not_affect_the_others() {
    let dir = tempdir().unwrap();
    let log_path = dir.path().join("failed.log");
    let xml_dir = dir.path().join("xml");
    write_file(&xml_dir, "a.xml", r#"<library><book id="1"/></library>"#);
    write_file(&xml_dir, "b.xml", r#"<library><book id="2"></library>"#);
    write_file(&xml_dir, "c.xml", r#"<library><book id="3"/></library>"#);
    let config = builder(&xml_dir).log_file(&log_path).build().unwrap();
    let store = InMemoryStore::default();

    let summary = ImportJobBuilder::new()
        .config(&config)
        .store(&store)
        .build()
        .unwrap()
        .run()
        .unwrap();

    assert_eq!(summary.files_seen, 3);
    assert_eq!(summary.files_processed, 2);
    assert_eq!(summary.files_failed, 1);
    assert_eq!(summary.records_inserted, 2);
    let ids: Vec<_> = store
        .documents()
        .iter()
        .filter_map(|d| book_id(d).map(str::to_string))
        .collect();
    assert_eq!(ids, vec!["1", "3"]);

    let logged = fs::read_to_string(&log_path).unwrap();
    assert_eq!(logged, format!("{}\n", xml_dir.join("b.xml").display()));
}

#[test]
fn log_file_inside_the_source_directory_is_not_imported() {
    let dir = tempdir().unwrap();
    let log_path = dir.path().join("failed.log");
    write_file(dir.path(), "a.xml", r#"<library><book id="1"/></library>"#);
    write_file(dir.path(), "b.xml", r#"<library><book id="2"></library>"#);
    let config = builder(dir.path()).log_file(&log_path).build().unwrap();

    let mut seen = Vec::new();
    for _ in 0..2 {
        let store = InMemoryStore::default();
        let summary = ImportJobBuilder::new()
            .config(&config)
            .store(&store)
            .build()
            .unwrap()
            .run()
            .unwrap();
        seen.push((summary.files_seen, summary.files_failed));
    }

    assert_eq!(seen, vec![(2, 1), (2, 1)]);
    let failed = format!("{}\n", dir.path().join("b.xml").display());
    assert_eq!(fs::read_to_string(&log_path).unwrap(), failed.repeat(2));
}

#[test]
fn clear_removes_previous_documents() {
    let dir = tempdir().unwrap();
    write_file(dir.path(), "a.xml", r#"<library><book id="new"/></library>"#);
    let config = builder(dir.path()).clear(true).build().unwrap();
    let store = InMemoryStore::with_documents(vec![doc! { "book": { "id": "old" } }]);

    ImportJobBuilder::new()
        .config(&config)
        .store(&store)
        .build()
        .unwrap()
        .run()
        .unwrap();

    assert_eq!(store.clear_count(), 1);
    assert_eq!(store.documents(), vec![doc! { "book": { "id": "new" } }]);
}

#[test]
fn previous_documents_are_kept_without_clear() {
    let dir = tempdir().unwrap();
    write_file(dir.path(), "a.xml", r#"<library><book id="new"/></library>"#);
    let config = builder(dir.path()).build().unwrap();
    let store = InMemoryStore::with_documents(vec![doc! { "book": { "id": "old" } }]);

    ImportJobBuilder::new()
        .config(&config)
        .store(&store)
        .build()
        .unwrap()
        .run()
        .unwrap();

    assert_eq!(store.clear_count(), 0);
    assert_eq!(
        store.documents(),
        vec![
            doc! { "book": { "id": "old" } },
            doc! { "book": { "id": "new" } },
        ]
    );
}

#[test]
fn only_the_record_tag_is_imported() {
    let dir = tempdir().unwrap();
    write_file(
        dir.path(),
        "a.xml",
        r#"<library>
             <magazine id="m1"/>
             <shelf><book id="1"/></shelf>
             <book id="2"><book id="3"/></book>
           </library>"#,
    );
    let config = builder(dir.path()).build().unwrap();
    let store = InMemoryStore::default();

    let summary = ImportJobBuilder::new()
        .config(&config)
        .store(&store)
        .build()
        .unwrap()
        .run()
        .unwrap();

    assert_eq!(summary.records_read, 3);
    assert_eq!(
        store.documents(),
        vec![
            doc! { "book": { "id": "1" } },
            doc! { "book": { "id": "2", "book": { "id": "3" } } },
            doc! { "book": { "id": "3" } },
        ]
    );
}

#[test]
fn root_element_is_never_a_record() {
    let dir = tempdir().unwrap();
    write_file(dir.path(), "a.xml", r#"<book id="root"><book id="1"/></book>"#);
    let config = builder(dir.path()).build().unwrap();
    let store = InMemoryStore::default();

    ImportJobBuilder::new()
        .config(&config)
        .store(&store)
        .build()
        .unwrap()
        .run()
        .unwrap();

    assert_eq!(store.documents(), vec![doc! { "book": { "id": "1" } }]);
}

#[test]
fn empty_directory_imports_nothing() {
    let dir = tempdir().unwrap();
    let config = builder(dir.path()).build().unwrap();
    let store = InMemoryStore::with_documents(vec![doc! { "book": Bson::Null }]);

    let summary = ImportJobBuilder::new()
        .config(&config)
        .store(&store)
        .build()
        .unwrap()
        .run()
        .unwrap();

    assert_eq!(summary.status, JobStatus::Succeeded);
    assert_eq!(summary.files_seen, 0);
    assert_eq!(summary.records_read, 0);
    assert_eq!(store.len(), 1);
}

#[test]
fn unconvertible_record_is_skipped() {
    let dir = tempdir().unwrap();
    let log_path = dir.path().join("failed.log");
    let xml_dir = dir.path().join("xml");
    write_file(
        &xml_dir,
        "a.xml",
        r#"<library>
             <book id="1"><title>Fish &amp; Chips</title></book>
             <book id="2"><title>&bogus;</title></book>
             <book id="3"/>
           </library>"#,
    );
    let config = builder(&xml_dir).log_file(&log_path).build().unwrap();
    let store = InMemoryStore::default();

    let summary = ImportJobBuilder::new()
        .config(&config)
        .store(&store)
        .build()
        .unwrap()
        .run()
        .unwrap();

    assert_eq!(summary.files_processed, 1);
    assert_eq!(summary.records_read, 3);
    assert_eq!(summary.records_inserted, 2);
    assert_eq!(summary.conversion_failures, 1);
    assert_eq!(
        store.documents()[0],
        doc! { "book": { "id": "1", "title": { "text": "Fish & Chips" } } }
    );
    assert!(fs::read_to_string(&log_path).unwrap().contains("a.xml"));
}

#[test]
fn rejected_record_does_not_affect_its_siblings() {
    let dir = tempdir().unwrap();
    write_file(
        dir.path(),
        "a.xml",
        r#"<library><book id="1"/><book id="2"/><book id="3"/></library>"#,
    );
    let config = builder(dir.path()).build().unwrap();

    let mut store = MockStore::new();
    store
        .expect_insert_one()
        .times(3)
        .returning(|document| match book_id(document) {
            Some("2") => Err(BatchError::ItemWriter("duplicate key".to_string())),
            _ => Ok(()),
        });
    store.expect_insert_many().never();
    store.expect_clear().never();
    store.expect_close().times(1).returning(|| Ok(()));

    let summary = ImportJobBuilder::new()
        .config(&config)
        .store(&store)
        .build()
        .unwrap()
        .run()
        .unwrap();

    assert_eq!(summary.records_inserted, 2);
    assert_eq!(summary.write_failures, 1);
    assert_eq!(summary.files_failed, 0);
}

#[test]
fn bulk_write_sends_chunks() {
    let dir = tempdir().unwrap();
    write_file(
        dir.path(),
        "a.xml",
        r#"<library><book id="1"/><book id="2"/><book id="3"/><book id="4"/><book id="5"/></library>"#,
    );
    let config = builder(dir.path())
        .bulk_write(true)
        .chunk_size(2)
        .build()
        .unwrap();

    let mut store = MockStore::new();
    store
        .expect_insert_many()
        .times(3)
        .returning(|documents| Ok(documents.len()));
    store.expect_insert_one().never();
    store.expect_close().times(1).returning(|| Ok(()));

    let summary = ImportJobBuilder::new()
        .config(&config)
        .store(&store)
        .build()
        .unwrap()
        .run()
        .unwrap();

    assert_eq!(summary.records_inserted, 5);
}

#[test]
fn partial_bulk_write_is_counted_per_record() {
    let dir = tempdir().unwrap();
    write_file(
        dir.path(),
        "a.xml",
        r#"<library><book id="1"/><book id="2"/><book id="3"/></library>"#,
    );
    let config = builder(dir.path()).bulk_write(true).build().unwrap();

    let mut store = MockStore::new();
    store.expect_insert_many().times(1).returning(|documents| {
        Err(BatchError::PartialWrite {
            inserted: documents.len() - 1,
            failed: 1,
            reason: "E11000 duplicate key error".to_string(),
        })
    });
    store.expect_close().times(1).returning(|| Ok(()));

    let summary = ImportJobBuilder::new()
        .config(&config)
        .store(&store)
        .build()
        .unwrap()
        .run()
        .unwrap();

    assert_eq!(summary.records_inserted, 2);
    assert_eq!(summary.write_failures, 1);
}

#[test]
fn filter_and_recursive_select_files() {
    let dir = tempdir().unwrap();
    write_file(dir.path(), "a.xml", r#"<library><book id="a"/></library>"#);
    write_file(dir.path(), "notes.txt", r#"<library><book id="txt"/></library>"#);
    write_file(dir.path(), "2024/b.xml", r#"<library><book id="b"/></library>"#);

    let flat = builder(dir.path()).file_filter(r"\.xml$").build().unwrap();
    let store = InMemoryStore::default();
    let summary = ImportJobBuilder::new()
        .config(&flat)
        .store(&store)
        .build()
        .unwrap()
        .run()
        .unwrap();
    assert_eq!(summary.files_seen, 1);
    assert_eq!(store.documents(), vec![doc! { "book": { "id": "a" } }]);

    let recursive = builder(dir.path())
        .file_filter(r"\.xml$")
        .recursive(true)
        .build()
        .unwrap();
    let store = InMemoryStore::default();
    let summary = ImportJobBuilder::new()
        .config(&recursive)
        .store(&store)
        .build()
        .unwrap()
        .run()
        .unwrap();
    assert_eq!(summary.files_seen, 2);
    assert_eq!(store.len(), 2);
}

#[test]
fn files_are_decoded_with_the_configured_encoding() {
    let dir = tempdir().unwrap();
    fs::write(
        dir.path().join("latin1.xml"),
        b"<library><book><title>Caf\xe9</title></book></library>",
    )
    .unwrap();
    let config = builder(dir.path()).encoding("iso-8859-1").build().unwrap();
    let store = InMemoryStore::default();

    ImportJobBuilder::new()
        .config(&config)
        .store(&store)
        .build()
        .unwrap()
        .run()
        .unwrap();

    assert_eq!(
        store.documents(),
        vec![doc! { "book": { "title": { "text": "Café" } } }]
    );
}

#[test]
fn undecodable_file_is_skipped() {
    let dir = tempdir().unwrap();
    fs::write(
        dir.path().join("latin1.xml"),
        b"<library><book><title>Caf\xe9</title></book></library>",
    )
    .unwrap();
    write_file(dir.path(), "utf8.xml", r#"<library><book id="ok"/></library>"#);
    let config = builder(dir.path()).build().unwrap();
    let store = InMemoryStore::default();

    let summary = ImportJobBuilder::new()
        .config(&config)
        .store(&store)
        .build()
        .unwrap()
        .run()
        .unwrap();

    assert_eq!(summary.files_failed, 1);
    assert_eq!(store.documents(), vec![doc! { "book": { "id": "ok" } }]);
}

#[test]
fn missing_source_directory_is_fatal() {
    let dir = tempdir().unwrap();
    let config = builder(&dir.path().join("missing"))
        .clear(true)
        .build()
        .unwrap();

    let mut store = MockStore::new();
    store.expect_clear().never();
    store.expect_insert_one().never();
    store.expect_close().times(1).returning(|| Ok(()));

    let job = ImportJobBuilder::new()
        .config(&config)
        .store(&store)
        .build()
        .unwrap();
    let result = job.run();

    assert!(matches!(result, Err(BatchError::Configuration(_))));
    assert_eq!(job.status(), JobStatus::Aborted);
}

#[test]
fn failing_clear_aborts_before_any_insert() {
    let dir = tempdir().unwrap();
    write_file(dir.path(), "a.xml", r#"<library><book id="1"/></library>"#);
    let config = builder(dir.path()).clear(true).build().unwrap();

    let mut store = MockStore::new();
    store
        .expect_clear()
        .times(1)
        .returning(|| Err(BatchError::Connection("not authorized".to_string())));
    store.expect_insert_one().never();
    store.expect_close().times(1).returning(|| Ok(()));

    let job = ImportJobBuilder::new()
        .config(&config)
        .store(&store)
        .build()
        .unwrap();
    let result = job.run();

    assert!(matches!(result, Err(BatchError::Connection(_))));
    assert!(result.unwrap_err().is_fatal());
    assert_eq!(job.status(), JobStatus::Aborted);
}

#[test]
fn job_cannot_run_twice() {
    let dir = tempdir().unwrap();
    write_file(dir.path(), "a.xml", r#"<library><book id="1"/></library>"#);
    let config = builder(dir.path()).build().unwrap();
    let store = InMemoryStore::default();

    let job = ImportJobBuilder::new()
        .config(&config)
        .store(&store)
        .build()
        .unwrap();

    assert!(job.run().is_ok());
    assert!(matches!(job.run(), Err(BatchError::IllegalState(_))));
    assert_eq!(store.len(), 1);
}

#[test]
fn summary_serializes_to_json() {
    let dir = tempdir().unwrap();
    write_file(dir.path(), "a.xml", r#"<library><book id="1"/></library>"#);
    let config = builder(dir.path()).build().unwrap();
    let store = InMemoryStore::default();

    let summary = ImportJobBuilder::new()
        .config(&config)
        .store(&store)
        .build()
        .unwrap()
        .run()
        .unwrap();
    let json = serde_json::to_value(&summary).unwrap();

    assert_eq!(json["status"], "Succeeded");
    assert_eq!(json["records_inserted"], 1);
    assert_eq!(json["files_seen"], 1);
}
