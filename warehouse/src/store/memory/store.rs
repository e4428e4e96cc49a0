use super::InMemoryStoreConfig;
use crate::common::{validate_id, validate_resource_name, values_equal, DOC_ETAG, DOC_TIMESTAMP};
use crate::document::Document;
use crate::errors::{ErrorKind, WarehouseError, WarehouseResult};
use crate::filter::Filter;
use crate::store::{
    CollectionLink, CollectionOptions, DocumentStoreProvider, Page, PartitionKey,
};
use async_trait::async_trait;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use indexmap::map::Entry as SlotEntry;
use indexmap::IndexMap;
use parking_lot::RwLock;
use serde_json::Value;
use std::sync::Arc;

/// Documents are keyed by their partition slot (see `slot_key`, empty for an
/// unpartitioned collection) and their id.
type DocumentKey = (String, String);

/// In-memory implementation of a document store.
///
/// # Purpose
/// `InMemoryStore` keeps databases, collections and documents in process and answers
/// every [`DocumentStoreProvider`] call the way the remote service would: the same
/// not-found, conflict and partition key errors, and paginated queries with
/// continuation tokens. It backs unit tests and embedded use where no service is
/// available.
///
/// # Characteristics
/// - **Thread-Safe**: Fully concurrent, databases and collections live in `DashMap`s
/// - **Ordered**: Queries return documents in insertion order
/// - **No Persistence**: All data is lost when the last clone is dropped
///
/// # Usage
/// ```text
/// let store = DocumentStore::new(InMemoryStore::new(InMemoryStoreConfig::new()));
/// store.ensure_database("shop").await?;
/// ```
#[derive(Clone)]
pub struct InMemoryStore {
    inner: Arc<InMemoryStoreInner>,
}

impl InMemoryStore {
    /// Creates a new, empty in-memory store with the specified configuration.
    pub fn new(store_config: InMemoryStoreConfig) -> InMemoryStore {
        InMemoryStore {
            inner: Arc::new(InMemoryStoreInner::new(store_config)),
        }
    }

    pub fn store_config(&self) -> InMemoryStoreConfig {
        self.inner.store_config.clone()
    }

    /// Number of documents currently held by a collection, if it exists.
    pub fn document_count(&self, link: &CollectionLink) -> Option<usize> {
        self.inner
            .collection(link)
            .ok()
            .map(|collection| collection.documents.read().len())
    }
}

#[async_trait]
impl DocumentStoreProvider for InMemoryStore {
    fn name(&self) -> &str {
        "in-memory"
    }

    async fn create_database(&self, database: &str) -> WarehouseResult<()> {
        self.inner.create_database(database)
    }

    async fn read_database(&self, database: &str) -> WarehouseResult<()> {
        self.inner.read_database(database)
    }

    async fn delete_database(&self, database: &str) -> WarehouseResult<()> {
        self.inner.delete_database(database)
    }

    async fn create_collection(
        &self,
        database: &str,
        options: &CollectionOptions,
    ) -> WarehouseResult<()> {
        self.inner.create_collection(database, options)
    }

    async fn read_collection(&self, link: &CollectionLink) -> WarehouseResult<CollectionOptions> {
        self.inner.read_collection(link)
    }

    async fn delete_collection(&self, link: &CollectionLink) -> WarehouseResult<()> {
        self.inner.delete_collection(link)
    }

    async fn create_document(
        &self,
        link: &CollectionLink,
        document: Document,
        partition_key: Option<&PartitionKey>,
    ) -> WarehouseResult<Document> {
        self.inner.create_document(link, document, partition_key)
    }

    async fn read_document(
        &self,
        link: &CollectionLink,
        id: &str,
        partition_key: Option<&PartitionKey>,
    ) -> WarehouseResult<Document> {
        self.inner.read_document(link, id, partition_key)
    }

    async fn replace_document(
        &self,
        link: &CollectionLink,
        id: &str,
        document: Document,
        partition_key: Option<&PartitionKey>,
    ) -> WarehouseResult<Document> {
        self.inner.replace_document(link, id, document, partition_key)
    }

    async fn delete_document(
        &self,
        link: &CollectionLink,
        id: &str,
        partition_key: Option<&PartitionKey>,
    ) -> WarehouseResult<()> {
        self.inner.delete_document(link, id, partition_key)
    }

    async fn query_documents(
        &self,
        link: &CollectionLink,
        filter: &Filter,
        continuation: Option<&str>,
        max_item_count: u32,
    ) -> WarehouseResult<Page> {
        self.inner
            .query_documents(link, filter, continuation, max_item_count)
    }
}

struct MemoryCollection {
    options: CollectionOptions,
    documents: RwLock<IndexMap<DocumentKey, Document>>,
}

impl MemoryCollection {
    fn new(options: CollectionOptions) -> Self {
        MemoryCollection {
            options,
            documents: RwLock::new(IndexMap::new()),
        }
    }

    /// Resolves the partition slot a point operation addresses.
    fn partition_slot(&self, partition_key: Option<&PartitionKey>) -> WarehouseResult<String> {
        match (self.options.partition_key_path(), partition_key) {
            (Some(_), Some(key)) => Ok(slot_key(key.value())),
            (None, None) => Ok(String::new()),
            (Some(path), None) => {
                log::error!(
                    "Partition key missing for collection {} partitioned on {}",
                    self.options.id,
                    path
                );
                Err(WarehouseError::new(
                    &format!(
                        "Collection {} is partitioned on {}, a partition key is required",
                        self.options.id, path
                    ),
                    ErrorKind::InvalidOperation,
                ))
            }
            (None, Some(key)) => {
                log::error!(
                    "Partition key {} supplied for unpartitioned collection {}",
                    key,
                    self.options.id
                );
                Err(WarehouseError::new(
                    &format!(
                        "Collection {} is not partitioned, partition key {} is not allowed",
                        self.options.id, key
                    ),
                    ErrorKind::InvalidOperation,
                ))
            }
        }
    }

    /// Checks that the partition value inside `document` is the one the request targets.
    fn check_document_partition(
        &self,
        document: &Document,
        partition_key: Option<&PartitionKey>,
    ) -> WarehouseResult<()> {
        if let (Some(path), Some(key)) = (self.options.partition_key_path(), partition_key) {
            let matches = document
                .partition_value(path)
                .map(|value| values_equal(value, key.value()))
                .unwrap_or(false);
            if !matches {
                log::error!(
                    "Partition key {} does not match the value at {} in the document",
                    key,
                    path
                );
                return Err(WarehouseError::new(
                    &format!(
                        "Partition key {} does not match the value at {} in the document",
                        key, path
                    ),
                    ErrorKind::InvalidOperation,
                ));
            }
        }
        Ok(())
    }
}

/// Renders a partition value as a slot key. Numbers that compare equal, such as `1`
/// and `1.0`, share a slot.
fn slot_key(value: &Value) -> String {
    match value {
        Value::Number(number) => match (number.as_i64(), number.as_f64()) {
            (Some(integral), _) => integral.to_string(),
            (None, Some(float)) if float.fract() == 0.0 && float.abs() < i64::MAX as f64 => {
                (float as i64).to_string()
            }
            _ => number.to_string(),
        },
        other => other.to_string(),
    }
}

struct InMemoryStoreInner {
    store_config: InMemoryStoreConfig,
    databases: DashMap<String, DashMap<String, Arc<MemoryCollection>>>,
}

impl InMemoryStoreInner {
    fn new(store_config: InMemoryStoreConfig) -> InMemoryStoreInner {
        InMemoryStoreInner {
            store_config,
            databases: DashMap::new(),
        }
    }

    fn create_database(&self, database: &str) -> WarehouseResult<()> {
        validate_resource_name("database", database)?;
        match self.databases.entry(database.to_string()) {
            Entry::Occupied(_) => Err(WarehouseError::new(
                &format!("Database {} already exists", database),
                ErrorKind::Conflict,
            )),
            Entry::Vacant(entry) => {
                entry.insert(DashMap::new());
                log::debug!("Created database {}", database);
                Ok(())
            }
        }
    }

    fn read_database(&self, database: &str) -> WarehouseResult<()> {
        if self.databases.contains_key(database) {
            Ok(())
        } else {
            Err(database_not_found(database))
        }
    }

    fn delete_database(&self, database: &str) -> WarehouseResult<()> {
        match self.databases.remove(database) {
            Some(_) => {
                log::debug!("Deleted database {}", database);
                Ok(())
            }
            None => Err(database_not_found(database)),
        }
    }

    fn create_collection(&self, database: &str, options: &CollectionOptions) -> WarehouseResult<()> {
        validate_resource_name("collection", &options.id)?;
        let collections = self
            .databases
            .get(database)
            .ok_or_else(|| database_not_found(database))?;

        let result = match collections.entry(options.id.clone()) {
            Entry::Occupied(_) => Err(WarehouseError::new(
                &format!("Collection {} already exists in database {}", options.id, database),
                ErrorKind::Conflict,
            )),
            Entry::Vacant(entry) => {
                entry.insert(Arc::new(MemoryCollection::new(options.clone())));
                log::debug!("Created collection {} in database {}", options.id, database);
                Ok(())
            }
        };
        result
    }

    fn read_collection(&self, link: &CollectionLink) -> WarehouseResult<CollectionOptions> {
        let collections = self
            .databases
            .get(link.database())
            .ok_or_else(|| database_not_found(link.database()))?;
        let collection = collections.get(link.collection()).ok_or_else(|| {
            WarehouseError::new(
                &format!("Collection {} not found", link),
                ErrorKind::NotFound,
            )
        })?;
        Ok(collection.options.clone())
    }

    fn delete_collection(&self, link: &CollectionLink) -> WarehouseResult<()> {
        let collections = self
            .databases
            .get(link.database())
            .ok_or_else(|| database_not_found(link.database()))?;
        match collections.remove(link.collection()) {
            Some(_) => {
                log::debug!("Deleted collection {}", link);
                Ok(())
            }
            None => Err(WarehouseError::new(
                &format!("Collection {} not found", link),
                ErrorKind::NotFound,
            )),
        }
    }

    /// Looks up the collection a document operation targets.
    fn collection(&self, link: &CollectionLink) -> WarehouseResult<Arc<MemoryCollection>> {
        let collection = match self.databases.get(link.database()) {
            Some(collections) => collections
                .get(link.collection())
                .map(|entry| Arc::clone(entry.value())),
            None => None,
        };
        collection.ok_or_else(|| {
            WarehouseError::new(
                &format!("Owner resource {} does not exist", link),
                ErrorKind::CollectionNotFound,
            )
        })
    }

    fn create_document(
        &self,
        link: &CollectionLink,
        mut document: Document,
        partition_key: Option<&PartitionKey>,
    ) -> WarehouseResult<Document> {
        let id = match document.id() {
            Some(id) => id.to_string(),
            None => {
                log::error!("Cannot create a document without an id in {}", link);
                return Err(WarehouseError::new(
                    "Document must carry a string id",
                    ErrorKind::InvalidId,
                ));
            }
        };
        validate_id(&id)?;

        let collection = self.collection(link)?;
        let slot = collection.partition_slot(partition_key)?;
        collection.check_document_partition(&document, partition_key)?;
        self.stamp(&mut document)?;

        let mut documents = collection.documents.write();
        match documents.entry((slot, id.clone())) {
            SlotEntry::Occupied(_) => Err(WarehouseError::new(
                &format!("Document {} already exists in {}", id, link),
                ErrorKind::Conflict,
            )),
            SlotEntry::Vacant(entry) => {
                entry.insert(document.clone());
                Ok(document)
            }
        }
    }

    fn read_document(
        &self,
        link: &CollectionLink,
        id: &str,
        partition_key: Option<&PartitionKey>,
    ) -> WarehouseResult<Document> {
        let collection = self.collection(link)?;
        let slot = collection.partition_slot(partition_key)?;
        let documents = collection.documents.read();
        documents
            .get(&(slot, id.to_string()))
            .cloned()
            .ok_or_else(|| document_not_found(link, id))
    }

    fn replace_document(
        &self,
        link: &CollectionLink,
        id: &str,
        mut document: Document,
        partition_key: Option<&PartitionKey>,
    ) -> WarehouseResult<Document> {
        document.set_id(id)?;
        let collection = self.collection(link)?;
        let slot = collection.partition_slot(partition_key)?;
        collection.check_document_partition(&document, partition_key)?;
        self.stamp(&mut document)?;

        let mut documents = collection.documents.write();
        match documents.get_mut(&(slot, id.to_string())) {
            Some(existing) => {
                *existing = document.clone();
                Ok(document)
            }
            None => Err(document_not_found(link, id)),
        }
    }

    fn delete_document(
        &self,
        link: &CollectionLink,
        id: &str,
        partition_key: Option<&PartitionKey>,
    ) -> WarehouseResult<()> {
        let collection = self.collection(link)?;
        let slot = collection.partition_slot(partition_key)?;
        let mut documents = collection.documents.write();
        documents
            .shift_remove(&(slot, id.to_string()))
            .map(|_| ())
            .ok_or_else(|| document_not_found(link, id))
    }

    /// Scans the collection in insertion order across all partitions.
    ///
    /// The continuation token is the scan position to resume from.
    fn query_documents(
        &self,
        link: &CollectionLink,
        filter: &Filter,
        continuation: Option<&str>,
        max_item_count: u32,
    ) -> WarehouseResult<Page> {
        let collection = self.collection(link)?;
        let start = match continuation {
            Some(token) => token.parse::<usize>().map_err(|_| {
                log::error!("Invalid continuation token {} for {}", token, link);
                WarehouseError::new(
                    &format!("Invalid continuation token '{}'", token),
                    ErrorKind::InvalidOperation,
                )
            })?,
            None => 0,
        };
        let page_size = max_item_count.clamp(1, self.store_config.max_page_size()) as usize;

        let documents = collection.documents.read();
        let mut results = Vec::with_capacity(page_size.min(documents.len()));
        let mut position = start;
        while position < documents.len() && results.len() < page_size {
            if let Some((_, document)) = documents.get_index(position) {
                if filter.apply(document)? {
                    results.push(document.clone());
                }
            }
            position += 1;
        }

        let continuation = if position < documents.len() {
            Some(position.to_string())
        } else {
            None
        };
        log::debug!(
            "Query on {} returned {} documents, continuation {:?}",
            link,
            results.len(),
            continuation
        );
        Ok(Page::new(results, continuation))
    }

    fn stamp(&self, document: &mut Document) -> WarehouseResult<()> {
        if self.store_config.system_properties() {
            document.put(DOC_ETAG, Value::String(uuid::Uuid::new_v4().to_string()))?;
            document.put(DOC_TIMESTAMP, chrono::Utc::now().timestamp())?;
        }
        Ok(())
    }
}

fn database_not_found(database: &str) -> WarehouseError {
    WarehouseError::new(
        &format!("Database {} not found", database),
        ErrorKind::NotFound,
    )
}

fn document_not_found(link: &CollectionLink, id: &str) -> WarehouseError {
    WarehouseError::new(
        &format!("Document {} not found", link.document_link(id)),
        ErrorKind::NotFound,
    )
}
