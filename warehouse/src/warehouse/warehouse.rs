use crate::errors::WarehouseResult;
use crate::filter::Filter;
use crate::store::{CollectionLink, DocumentStore, PartitionKey};
use crate::warehouse::{DefaultWarehouse, StoreOutcome};
use crate::warehouse_builder::WarehouseBuilder;
use crate::warehouse_config::WarehouseConfig;
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::ops::Deref;
use std::sync::Arc;

/// The collection a warehouse has been initialized against.
#[derive(Clone, Debug, PartialEq)]
pub struct CollectionCoordinates {
    link: CollectionLink,
    partition_key_path: Option<String>,
}

impl CollectionCoordinates {
    pub fn new(link: CollectionLink, partition_key_path: Option<String>) -> Self {
        CollectionCoordinates {
            link,
            partition_key_path,
        }
    }

    pub fn link(&self) -> &CollectionLink {
        &self.link
    }

    pub fn partition_key_path(&self) -> Option<&str> {
        self.partition_key_path.as_deref()
    }
}

/// A trait for implementing typed document operations on a single collection.
///
/// # Purpose
///
/// `WarehouseProvider` defines the interface application code uses to persist and load
/// values of type `T` without touching the document store API. A value is turned into a
/// JSON document through its own `serde` implementation, stored under a caller chosen
/// id, and read back the same way.
///
/// # Characteristics
///
/// - **Generic Over Value Type**: Works with any `T: Serialize + DeserializeOwned + Send + Sync`
/// - **Explicit Absence**: A missing document is `Ok(None)` from [`get`](Self::get), never an error
/// - **No Retries**: Every call is a single round trip, failures surface immediately
/// - **Stateless**: Nothing but the collection coordinates is kept between calls
///
/// # Relationship to Related Types
///
/// - [`Warehouse<T>`]: The facade wrapper that implements `Deref` to this trait
/// - `DefaultWarehouse<T>`: The default implementation over a [`DocumentStore`]
#[async_trait]
pub trait WarehouseProvider<T>: Send + Sync
where
    T: Serialize + DeserializeOwned + Send + Sync + 'static,
{
    /// Provisions the database and collection and records them as the target of every
    /// following call.
    ///
    /// # Arguments
    ///
    /// * `database` - Name of the database, created if absent
    /// * `collection` - Name of the collection, created if absent
    /// * `partition_key_path` - Partition key path such as `/tenant`, used only when the
    ///   collection is created
    ///
    /// # Behavior
    ///
    /// - Idempotent: calling it again, or concurrently from another process, succeeds
    /// - Uses the store's create call and treats "already exists" as success
    /// - When the collection already existed, its actual partition key path is adopted
    async fn initialize(
        &self,
        database: &str,
        collection: &str,
        partition_key_path: Option<&str>,
    ) -> WarehouseResult<()>;

    /// Loads the value stored under `id`.
    ///
    /// # Returns
    ///
    /// `Ok(Some(value))` if the document exists, `Ok(None)` if it does not. Any other
    /// failure is returned unchanged.
    async fn get(&self, id: &str) -> WarehouseResult<Option<T>>;

    /// Same as [`get`](Self::get) for a collection partitioned on something other than
    /// the id.
    async fn get_in_partition(
        &self,
        id: &str,
        partition_key: &PartitionKey,
    ) -> WarehouseResult<Option<T>>;

    /// Loads every value in the collection.
    async fn get_all(&self) -> WarehouseResult<Vec<T>>;

    /// Loads every value whose document matches `filter`.
    ///
    /// # Behavior
    ///
    /// - The filter is evaluated by the store
    /// - Pages are fetched until the store stops returning a continuation token and are
    ///   concatenated in the order they arrive
    /// - A collection that no longer exists yields an empty result
    async fn get_all_matching(&self, filter: &Filter) -> WarehouseResult<Vec<T>>;

    /// Inserts `object` under `id` unless a document with that id exists.
    ///
    /// # Returns
    ///
    /// [`StoreOutcome::Created`] when the document was written, [`StoreOutcome::Existing`]
    /// when one was already there. An existing document is never modified.
    async fn store(&self, object: &T, id: &str) -> WarehouseResult<StoreOutcome>;

    /// Replaces the document stored under `id` with `object`.
    ///
    /// # Errors
    ///
    /// Fails with [`ErrorKind::NotFound`](crate::errors::ErrorKind::NotFound) if there is
    /// no such document.
    async fn update(&self, object: &T, id: &str) -> WarehouseResult<()>;

    /// Deletes the document stored under `id`.
    ///
    /// # Errors
    ///
    /// Fails with [`ErrorKind::NotFound`](crate::errors::ErrorKind::NotFound) if there is
    /// no such document.
    async fn delete(&self, id: &str) -> WarehouseResult<()>;

    /// Same as [`delete`](Self::delete) for a collection partitioned on something other
    /// than the id.
    async fn delete_in_partition(&self, id: &str, partition_key: &PartitionKey)
        -> WarehouseResult<()>;

    /// Whether a document is stored under `id`.
    async fn exists(&self, id: &str) -> WarehouseResult<bool>;

    /// Deletes the whole collection.
    ///
    /// Afterwards every document operation fails with
    /// [`ErrorKind::NotInitialized`](crate::errors::ErrorKind::NotInitialized) until
    /// [`initialize`](Self::initialize) is called again.
    async fn clean_collection(&self) -> WarehouseResult<()>;

    /// The collection this warehouse targets, if it has been initialized.
    fn coordinates(&self) -> Option<CollectionCoordinates>;

    fn is_initialized(&self) -> bool {
        self.coordinates().is_some()
    }
}

/// A typed data-access facade over one collection of a document store.
///
/// `Warehouse<T>` wraps a [`WarehouseProvider<T>`] in an `Arc`; clones are cheap and
/// share the same coordinates. All operations are reached through `Deref`.
///
/// # Examples
///
/// ```rust
/// use serde::{Deserialize, Serialize};
/// use warehouse::store::memory::{InMemoryStore, InMemoryStoreConfig};
/// use warehouse::store::DocumentStore;
/// use warehouse::warehouse::{StoreOutcome, Warehouse};
///
/// #[derive(Serialize, Deserialize, Debug, PartialEq)]
/// struct Order {
///     item: String,
///     quantity: u32,
/// }
///
/// # let rt = tokio::runtime::Builder::new_current_thread().build().unwrap();
/// # rt.block_on(async {
/// let warehouse: Warehouse<Order> = Warehouse::builder()
///     .store(DocumentStore::new(InMemoryStore::new(InMemoryStoreConfig::new())))
///     .open("shop", "orders")
///     .await
///     .unwrap();
///
/// let order = Order { item: "pen".into(), quantity: 2 };
/// let outcome = warehouse.store(&order, "o1").await.unwrap();
/// assert_eq!(outcome, StoreOutcome::Created("o1".into()));
/// assert_eq!(warehouse.get("o1").await.unwrap(), Some(order));
/// assert_eq!(warehouse.get("o2").await.unwrap(), None);
/// # });
/// ```
pub struct Warehouse<T>
where
    T: Serialize + DeserializeOwned + Send + Sync + 'static,
{
    inner: Arc<dyn WarehouseProvider<T>>,
}

impl<T> Warehouse<T>
where
    T: Serialize + DeserializeOwned + Send + Sync + 'static,
{
    /// Creates a new facade wrapping a provider implementation.
    pub fn new<I: WarehouseProvider<T> + 'static>(inner: I) -> Self {
        Warehouse {
            inner: Arc::new(inner),
        }
    }

    /// Creates an uninitialized warehouse from a configuration that has a document store.
    ///
    /// The configuration is frozen from this point on.
    pub fn with_config(config: WarehouseConfig) -> WarehouseResult<Self> {
        let store: DocumentStore = config.document_store()?;
        config.mark_configured();
        Ok(Warehouse::new(DefaultWarehouse::new(store, config)))
    }

    pub fn builder() -> WarehouseBuilder<T> {
        WarehouseBuilder::new()
    }
}

impl<T> Clone for Warehouse<T>
where
    T: Serialize + DeserializeOwned + Send + Sync + 'static,
{
    fn clone(&self) -> Self {
        Warehouse {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T> Deref for Warehouse<T>
where
    T: Serialize + DeserializeOwned + Send + Sync + 'static,
{
    type Target = Arc<dyn WarehouseProvider<T>>;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}
