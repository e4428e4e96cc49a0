use crate::document::Document;
use crate::errors::WarehouseResult;
use crate::filter::Filter;
use crate::store::{CollectionLink, CollectionOptions, Page, PartitionKey};
use async_trait::async_trait;
use std::ops::Deref;
use std::sync::Arc;

/// Low-level interface of a document database.
///
/// # Purpose
/// Defines the operations the [`Warehouse`](crate::warehouse::Warehouse) façade needs
/// from a backing store: database and collection lifecycle, point operations on
/// documents and paginated queries. Every method is a single round trip; stores do
/// not retry.
///
/// # Error contract
/// - a missing database, collection (on lifecycle calls) or document is reported as
///   [`ErrorKind::NotFound`](crate::errors::ErrorKind::NotFound)
/// - a document or query call against a collection that does not exist is reported as
///   [`ErrorKind::CollectionNotFound`](crate::errors::ErrorKind::CollectionNotFound)
/// - creating something that already exists is reported as
///   [`ErrorKind::Conflict`](crate::errors::ErrorKind::Conflict)
///
/// # Implementations
/// - `InMemoryStore`: process local store for tests and embedded use
/// - `CosmosStore` (`warehouse_cosmos_adapter`): REST client for the managed service
///
/// # Thread Safety
/// Implementers must be `Send + Sync`; one store is shared by every clone of a façade.
#[async_trait]
pub trait DocumentStoreProvider: Send + Sync {
    /// Short name of the store used in log messages.
    fn name(&self) -> &str;

    /// Creates a database. Fails with `Conflict` if it exists.
    async fn create_database(&self, database: &str) -> WarehouseResult<()>;

    /// Reads a database. Fails with `NotFound` if it does not exist.
    async fn read_database(&self, database: &str) -> WarehouseResult<()>;

    /// Deletes a database and everything in it.
    async fn delete_database(&self, database: &str) -> WarehouseResult<()>;

    /// Creates a collection in `database`. Fails with `Conflict` if it exists and
    /// with `NotFound` if the database does not.
    async fn create_collection(
        &self,
        database: &str,
        options: &CollectionOptions,
    ) -> WarehouseResult<()>;

    /// Reads a collection definition.
    async fn read_collection(&self, link: &CollectionLink) -> WarehouseResult<CollectionOptions>;

    /// Deletes a collection and all of its documents.
    async fn delete_collection(&self, link: &CollectionLink) -> WarehouseResult<()>;

    /// Creates a document. Fails with `Conflict` if the id is taken.
    async fn create_document(
        &self,
        link: &CollectionLink,
        document: Document,
        partition_key: Option<&PartitionKey>,
    ) -> WarehouseResult<Document>;

    /// Reads a document by id.
    async fn read_document(
        &self,
        link: &CollectionLink,
        id: &str,
        partition_key: Option<&PartitionKey>,
    ) -> WarehouseResult<Document>;

    /// Replaces the document with the given id.
    async fn replace_document(
        &self,
        link: &CollectionLink,
        id: &str,
        document: Document,
        partition_key: Option<&PartitionKey>,
    ) -> WarehouseResult<Document>;

    /// Deletes the document with the given id.
    async fn delete_document(
        &self,
        link: &CollectionLink,
        id: &str,
        partition_key: Option<&PartitionKey>,
    ) -> WarehouseResult<()>;

    /// Fetches one page of documents matching `filter`, starting at `continuation`
    /// (or at the beginning when `None`).
    async fn query_documents(
        &self,
        link: &CollectionLink,
        filter: &Filter,
        continuation: Option<&str>,
        max_item_count: u32,
    ) -> WarehouseResult<Page>;

    /// Creates the database unless it exists.
    ///
    /// Uses the create call itself as the existence check, so two processes racing to
    /// provision the same database both succeed.
    ///
    /// # Returns
    /// * `Ok(true)` if the database was created
    /// * `Ok(false)` if it already existed
    async fn ensure_database(&self, database: &str) -> WarehouseResult<bool> {
        match self.create_database(database).await {
            Ok(()) => Ok(true),
            Err(err) if err.is_conflict() => {
                log::debug!("Database {} already exists in {}", database, self.name());
                Ok(false)
            }
            Err(err) => Err(err),
        }
    }

    /// Creates the collection unless it exists. Same contract as [`Self::ensure_database`].
    async fn ensure_collection(
        &self,
        database: &str,
        options: &CollectionOptions,
    ) -> WarehouseResult<bool> {
        match self.create_collection(database, options).await {
            Ok(()) => Ok(true),
            Err(err) if err.is_conflict() => {
                log::debug!(
                    "Collection {} already exists in database {} of {}",
                    options.id,
                    database,
                    self.name()
                );
                Ok(false)
            }
            Err(err) => Err(err),
        }
    }
}

/// Shared handle to a document store.
///
/// Wraps a [`DocumentStoreProvider`] in an `Arc`, so cloning is cheap and all clones
/// talk to the same store. Dereferences to the provider.
///
/// ```rust
/// use warehouse::store::memory::{InMemoryStore, InMemoryStoreConfig};
/// use warehouse::store::DocumentStore;
///
/// let store = DocumentStore::new(InMemoryStore::new(InMemoryStoreConfig::new()));
/// assert_eq!(store.name(), "in-memory");
/// ```
#[derive(Clone)]
pub struct DocumentStore {
    inner: Arc<dyn DocumentStoreProvider>,
}

impl DocumentStore {
    pub fn new<T: DocumentStoreProvider + 'static>(inner: T) -> Self {
        DocumentStore { inner: Arc::new(inner) }
    }
}

impl Deref for DocumentStore {
    type Target = Arc<dyn DocumentStoreProvider>;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}
