use crate::errors::{WarehouseError, WarehouseResult};
use crate::store::{validate_partition_key_path, DocumentStore};
use crate::warehouse::Warehouse;
use crate::warehouse_config::WarehouseConfig;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::marker::PhantomData;

/// Fluent builder for a [`Warehouse`].
///
/// Every setter validates its argument; the first failure is kept and returned from
/// [`build`](Self::build) or [`open`](Self::open), later setters become no-ops.
///
/// ```rust,ignore
/// let orders: Warehouse<Order> = Warehouse::builder()
///     .store(store)
///     .max_item_count(50)
///     .partition_key_path("/customer")
///     .open("shop", "orders")
///     .await?;
/// ```
pub struct WarehouseBuilder<T> {
    error: Option<WarehouseError>,
    config: WarehouseConfig,
    partition_key_path: Option<String>,
    _phantom: PhantomData<fn() -> T>,
}

impl<T> Default for WarehouseBuilder<T>
where
    T: Serialize + DeserializeOwned + Send + Sync + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<T> WarehouseBuilder<T>
where
    T: Serialize + DeserializeOwned + Send + Sync + 'static,
{
    pub fn new() -> Self {
        WarehouseBuilder {
            error: None,
            config: WarehouseConfig::new(),
            partition_key_path: None,
            _phantom: PhantomData,
        }
    }

    pub fn store(mut self, store: DocumentStore) -> Self {
        if self.error.is_none() {
            if let Err(e) = self.config.set_document_store(store) {
                self.error = Some(e);
            }
        }
        self
    }

    pub fn max_item_count(mut self, max_item_count: u32) -> Self {
        if self.error.is_none() {
            if let Err(e) = self.config.set_max_item_count(max_item_count) {
                self.error = Some(e);
            }
        }
        self
    }

    pub fn offer_throughput(mut self, offer_throughput: u32) -> Self {
        if self.error.is_none() {
            if let Err(e) = self.config.set_offer_throughput(offer_throughput) {
                self.error = Some(e);
            }
        }
        self
    }

    pub fn string_index_precision(mut self, precision: i32) -> Self {
        if self.error.is_none() {
            if let Err(e) = self.config.set_string_index_precision(precision) {
                self.error = Some(e);
            }
        }
        self
    }

    /// Partition key path used when [`open`](Self::open) creates the collection.
    pub fn partition_key_path(mut self, path: &str) -> Self {
        if self.error.is_none() {
            match validate_partition_key_path(path) {
                Ok(()) => self.partition_key_path = Some(path.to_string()),
                Err(e) => self.error = Some(e),
            }
        }
        self
    }

    /// Builds a warehouse that still has to be initialized.
    pub fn build(self) -> WarehouseResult<Warehouse<T>> {
        if let Some(error) = self.error {
            return Err(error);
        }
        Warehouse::with_config(self.config)
    }

    /// Builds the warehouse and initializes it against `database` and `collection`.
    pub async fn open(self, database: &str, collection: &str) -> WarehouseResult<Warehouse<T>> {
        let partition_key_path = self.partition_key_path.clone();
        let warehouse = self.build()?;
        warehouse
            .initialize(database, collection, partition_key_path.as_deref())
            .await?;
        Ok(warehouse)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ErrorKind;
    use crate::store::memory::{InMemoryStore, InMemoryStoreConfig};
    use serde::Deserialize;

    #[derive(Serialize, Deserialize, Debug, PartialEq)]
    struct Note {
        text: String,
    }

    fn memory_store() -> DocumentStore {
        DocumentStore::new(InMemoryStore::new(InMemoryStoreConfig::new()))
    }

    #[test]
    fn test_build_without_store() {
        let result = WarehouseBuilder::<Note>::new().build();
        assert_eq!(result.err().unwrap().kind(), &ErrorKind::ConfigurationError);
    }

    #[test]
    fn test_first_error_is_kept() {
        let result = WarehouseBuilder::<Note>::new()
            .max_item_count(0)
            .offer_throughput(1)
            .store(memory_store())
            .build();
        let err = result.err().unwrap();
        assert_eq!(err.kind(), &ErrorKind::ConfigurationError);
        assert!(err.message().contains("Page size"));
    }

    #[test]
    fn test_invalid_partition_key_path() {
        let result = WarehouseBuilder::<Note>::new()
            .store(memory_store())
            .partition_key_path("tenant")
            .build();
        assert_eq!(result.err().unwrap().kind(), &ErrorKind::ConfigurationError);
    }

    #[test]
    fn test_build_is_uninitialized() {
        let warehouse = WarehouseBuilder::<Note>::new()
            .store(memory_store())
            .build()
            .unwrap_or_else(|e| panic!("{}", e));
        assert!(!warehouse.is_initialized());
    }

    #[tokio::test]
    async fn test_open_initializes() {
        let warehouse = WarehouseBuilder::<Note>::new()
            .store(memory_store())
            .max_item_count(10)
            .partition_key_path("/id")
            .open("db", "notes")
            .await
            .unwrap_or_else(|e| panic!("{}", e));
        let coordinates = warehouse.coordinates().unwrap();
        assert_eq!(coordinates.link().to_string(), "dbs/db/colls/notes");
        assert_eq!(coordinates.partition_key_path(), Some("/id"));

        let note = Note { text: "hi".to_string() };
        assert!(warehouse.store(&note, "n1").await.unwrap().is_created());
        assert_eq!(warehouse.get("n1").await.unwrap(), Some(note));
    }
}
