use std::cell::RefCell;

use log::{debug, info};
use mongodb::{
    bson::{doc, Document},
    error::{Error, ErrorKind},
    options::{ClientOptions, Credential, InsertManyOptions, ServerAddress},
    sync::{Client, Collection},
};

use crate::{config::ConnectionSettings, core::store::DocumentStore, BatchError};

struct Connection {
    client: Client,
    collection: Collection<Document>,
}

/// A [`DocumentStore`] backed by a MongoDB collection.
///
/// One client is opened by [`MongoDocumentStore::connect`] and reused for
/// every insert until [`DocumentStore::close`].
///
/// ```no_run
/// use mongodb::bson::doc;
/// use xml2mongo::config::ConnectionSettings;
/// use xml2mongo::core::store::DocumentStore;
/// use xml2mongo::item::mongodb::MongoDocumentStore;
///
/// # fn example() -> Result<(), xml2mongo::BatchError> {
/// let store = MongoDocumentStore::connect(&ConnectionSettings::default(), "test", "books")?;
/// store.insert_one(&doc! { "book": { "title": { "text": "Shining" } } })?;
/// store.close()?;
/// # Ok(())
/// # }
/// ```
pub struct MongoDocumentStore {
    namespace: String,
    connection: RefCell<Option<Connection>>,
}

impl MongoDocumentStore {
    /// Connects to the server and resolves `database.collection`.
    ///
    /// The server is pinged before returning so that an unreachable server or
    /// rejected credentials fail here rather than on the first insert. The
    /// collection itself is created by the server on first write.
    pub fn connect(
        settings: &ConnectionSettings,
        database: &str,
        collection: &str,
    ) -> Result<Self, BatchError> {
        let client = Client::with_options(client_options(settings))
            .map_err(|e| BatchError::Connection(format!("cannot connect to {}: {}", settings, e)))?;

        let database_handle = client.database(database);
        database_handle
            .run_command(doc! { "ping": 1 })
            .run()
            .map_err(|e| BatchError::Connection(format!("cannot reach {}: {}", settings, e)))?;

        let namespace = format!("{}.{}", database, collection);
        info!("Connected to {} ({})", settings, namespace);

        Ok(Self {
            namespace,
            connection: RefCell::new(Some(Connection {
                collection: database_handle.collection::<Document>(collection),
                client,
            })),
        })
    }

    /// `database.collection` this store writes to.
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    fn with_collection<T>(
        &self,
        action: impl FnOnce(&Collection<Document>) -> Result<T, BatchError>,
    ) -> Result<T, BatchError> {
        let connection = self.connection.borrow();
        match connection.as_ref() {
            Some(connection) => action(&connection.collection),
            None => Err(BatchError::ItemWriter(format!(
                "store for {} is closed",
                self.namespace
            ))),
        }
    }
}

impl DocumentStore for MongoDocumentStore {
    fn insert_one(&self, document: &Document) -> Result<(), BatchError> {
        self.with_collection(|collection| {
            collection
                .insert_one(document)
                .run()
                .map(|_| ())
                .map_err(|error| BatchError::ItemWriter(error.to_string()))
        })
    }

    fn insert_many(&self, documents: &[Document]) -> Result<usize, BatchError> {
        if documents.is_empty() {
            return Ok(0);
        }

        self.with_collection(|collection| {
            let opts = InsertManyOptions::builder().ordered(false).build();

            let result = collection.insert_many(documents).with_options(opts).run();

            match result {
                Ok(inserted) => Ok(inserted.inserted_ids.len()),
                Err(error) => Err(insert_many_error(error, documents.len())),
            }
        })
    }

    fn clear(&self) -> Result<(), BatchError> {
        self.with_collection(|collection| {
            info!("Dropping collection {}", self.namespace);
            collection
                .drop()
                .run()
                .map_err(|e| BatchError::Connection(format!("cannot drop {}: {}", self.namespace, e)))
        })
    }

    fn close(&self) -> Result<(), BatchError> {
        if let Some(connection) = self.connection.borrow_mut().take() {
            debug!("Closing connection to {}", self.namespace);
            drop(connection.collection);
            drop(connection.client);
        }
        Ok(())
    }
}

fn client_options(settings: &ConnectionSettings) -> ClientOptions {
    let mut options = ClientOptions::default();
    options.app_name = Some(env!("CARGO_PKG_NAME").to_string());
    options.hosts = vec![ServerAddress::Tcp {
        host: settings.host.clone(),
        port: Some(settings.port),
    }];
    options.server_selection_timeout = settings.server_selection_timeout;

    if settings.has_credentials() {
        let mut credential = Credential::default();
        credential.username = settings.username.clone();
        credential.password = settings.password.clone();
        options.credential = Some(credential);
    }

    options
}

/// An unordered insert keeps going after a rejected document: the driver
/// reports which ones failed, everything else was stored.
fn insert_many_error(error: Error, batch_size: usize) -> BatchError {
    if let ErrorKind::InsertMany(failure) = error.kind.as_ref() {
        let failed = failure.write_errors.as_ref().map_or(0, Vec::len);
        if failed > 0 {
            return BatchError::PartialWrite {
                inserted: batch_size.saturating_sub(failed),
                failed,
                reason: error.to_string(),
            };
        }
    }
    BatchError::ItemWriter(error.to_string())
}
