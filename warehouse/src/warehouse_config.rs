//! Configuration management for a warehouse.

use crate::common::{
    DEFAULT_MAX_ITEM_COUNT, DEFAULT_OFFER_THROUGHPUT, DEFAULT_STRING_INDEX_PRECISION,
    MIN_OFFER_THROUGHPUT,
};
use crate::errors::{ErrorKind, WarehouseError, WarehouseResult};
use crate::store::{CollectionOptions, DocumentStore, IndexingPolicy};
use std::sync::atomic::{AtomicBool, AtomicI32, AtomicU32, Ordering};
use std::sync::{Arc, OnceLock};

/// Public interface for warehouse configuration.
///
/// Holds the document store a warehouse talks to and the settings used when it
/// provisions and scans a collection. Settings are frozen once a warehouse has been
/// built from the configuration.
///
/// # Examples
///
/// ```rust
/// use warehouse::store::memory::{InMemoryStore, InMemoryStoreConfig};
/// use warehouse::store::DocumentStore;
/// use warehouse::warehouse_config::WarehouseConfig;
///
/// let config = WarehouseConfig::new();
/// config
///     .set_document_store(DocumentStore::new(InMemoryStore::new(InMemoryStoreConfig::new())))
///     .unwrap();
/// config.set_max_item_count(50).unwrap();
/// assert_eq!(config.max_item_count(), 50);
/// ```
#[derive(Clone)]
pub struct WarehouseConfig {
    /// The pointer to implementation. Uses Arc for cheap cloning and thread safety.
    inner: Arc<WarehouseConfigInner>,
}

impl Default for WarehouseConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl WarehouseConfig {
    /// Creates a new configuration instance with default values.
    pub fn new() -> Self {
        WarehouseConfig {
            inner: Arc::new(WarehouseConfigInner::new()),
        }
    }

    /// Sets the document store (can only be set once).
    pub fn set_document_store(&self, store: DocumentStore) -> WarehouseResult<()> {
        self.inner.set_document_store(store)
    }

    /// Gets the configured document store.
    ///
    /// # Errors
    ///
    /// Returns error if no store is configured.
    pub fn document_store(&self) -> WarehouseResult<DocumentStore> {
        self.inner.document_store()
    }

    /// Returns the page size requested from the store when scanning a collection.
    pub fn max_item_count(&self) -> u32 {
        self.inner.max_item_count.load(Ordering::Relaxed)
    }

    /// Sets the page size requested from the store when scanning a collection.
    ///
    /// # Errors
    ///
    /// Returns error if already configured or if the count is zero.
    pub fn set_max_item_count(&self, max_item_count: u32) -> WarehouseResult<()> {
        self.inner.ensure_not_configured("Page size")?;
        if max_item_count == 0 {
            log::error!("Page size must be at least 1");
            return Err(WarehouseError::new(
                "Page size must be at least 1",
                ErrorKind::ConfigurationError,
            ));
        }
        self.inner
            .max_item_count
            .store(max_item_count, Ordering::Relaxed);
        Ok(())
    }

    /// Returns the throughput a newly created collection is provisioned with.
    pub fn offer_throughput(&self) -> u32 {
        self.inner.offer_throughput.load(Ordering::Relaxed)
    }

    /// Sets the throughput a newly created collection is provisioned with.
    ///
    /// # Errors
    ///
    /// Returns error if already configured, or if the throughput is below 400 or not a
    /// multiple of 100.
    pub fn set_offer_throughput(&self, offer_throughput: u32) -> WarehouseResult<()> {
        self.inner.ensure_not_configured("Offer throughput")?;
        if offer_throughput < MIN_OFFER_THROUGHPUT || offer_throughput % 100 != 0 {
            log::error!("Invalid offer throughput {}", offer_throughput);
            return Err(WarehouseError::new(
                &format!(
                    "Offer throughput must be a multiple of 100 and at least {}, got {}",
                    MIN_OFFER_THROUGHPUT, offer_throughput
                ),
                ErrorKind::ConfigurationError,
            ));
        }
        self.inner
            .offer_throughput
            .store(offer_throughput, Ordering::Relaxed);
        Ok(())
    }

    pub fn string_index_precision(&self) -> i32 {
        self.inner.string_index_precision.load(Ordering::Relaxed)
    }

    /// Sets the precision of the string range index. `-1` selects maximum precision,
    /// other accepted values are 1 to 100.
    pub fn set_string_index_precision(&self, precision: i32) -> WarehouseResult<()> {
        self.inner.ensure_not_configured("String index precision")?;
        if precision != -1 && !(1..=100).contains(&precision) {
            log::error!("Invalid string index precision {}", precision);
            return Err(WarehouseError::new(
                &format!(
                    "String index precision must be -1 or between 1 and 100, got {}",
                    precision
                ),
                ErrorKind::ConfigurationError,
            ));
        }
        self.inner
            .string_index_precision
            .store(precision, Ordering::Relaxed);
        Ok(())
    }

    /// Builds the definition a collection is created with.
    pub fn collection_options(
        &self,
        collection: &str,
        partition_key_path: Option<&str>,
    ) -> WarehouseResult<CollectionOptions> {
        let mut options = CollectionOptions::new(collection)
            .with_indexing_policy(IndexingPolicy::string_range(self.string_index_precision()))
            .with_offer_throughput(self.offer_throughput());
        if let Some(path) = partition_key_path {
            options = options.with_partition_key(path)?;
        }
        Ok(options)
    }

    pub fn is_configured(&self) -> bool {
        self.inner.configured.load(Ordering::Relaxed)
    }

    /// Freezes the configuration once a warehouse has been built from it.
    pub(crate) fn mark_configured(&self) {
        self.inner.configured.store(true, Ordering::Relaxed);
    }
}

/// Private implementation of warehouse configuration.
struct WarehouseConfigInner {
    /// Set once a warehouse has been built from this configuration
    configured: AtomicBool,
    document_store: OnceLock<DocumentStore>,
    max_item_count: AtomicU32,
    offer_throughput: AtomicU32,
    string_index_precision: AtomicI32,
}

impl WarehouseConfigInner {
    fn new() -> Self {
        WarehouseConfigInner {
            configured: AtomicBool::from(false),
            document_store: OnceLock::new(),
            max_item_count: AtomicU32::from(DEFAULT_MAX_ITEM_COUNT),
            offer_throughput: AtomicU32::from(DEFAULT_OFFER_THROUGHPUT),
            string_index_precision: AtomicI32::from(DEFAULT_STRING_INDEX_PRECISION),
        }
    }

    fn ensure_not_configured(&self, setting: &str) -> WarehouseResult<()> {
        if self.configured.load(Ordering::Relaxed) {
            log::error!("{} cannot be changed after initialization", setting);
            return Err(WarehouseError::new(
                &format!("{} cannot be changed after initialization", setting),
                ErrorKind::InvalidOperation,
            ));
        }
        Ok(())
    }

    fn set_document_store(&self, store: DocumentStore) -> WarehouseResult<()> {
        self.ensure_not_configured("Document store")?;
        self.document_store.set(store).map_err(|_| {
            log::error!("Document store is already configured");
            WarehouseError::new(
                "Document store is already configured",
                ErrorKind::InvalidOperation,
            )
        })
    }

    fn document_store(&self) -> WarehouseResult<DocumentStore> {
        self.document_store.get().cloned().ok_or_else(|| {
            log::error!("No document store is configured");
            WarehouseError::new(
                "No document store is configured",
                ErrorKind::ConfigurationError,
            )
        })
    }
}
