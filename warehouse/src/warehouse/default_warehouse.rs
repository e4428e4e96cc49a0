use crate::common::{validate_id, validate_resource_name, DOC_ID};
use crate::document::Document;
use crate::errors::{ErrorKind, WarehouseError, WarehouseResult};
use crate::filter::{all, Filter};
use crate::store::{CollectionLink, DocumentStore, PartitionKey};
use crate::warehouse::{CollectionCoordinates, StoreOutcome, WarehouseProvider};
use crate::warehouse_config::WarehouseConfig;
use async_trait::async_trait;
use parking_lot::RwLock;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::marker::PhantomData;

pub(crate) struct DefaultWarehouse<T> {
    document_store: DocumentStore,
    config: WarehouseConfig,
    coordinates: RwLock<Option<CollectionCoordinates>>,
    _phantom: PhantomData<fn() -> T>,
}

impl<T> DefaultWarehouse<T> {
    pub(crate) fn new(document_store: DocumentStore, config: WarehouseConfig) -> DefaultWarehouse<T> {
        DefaultWarehouse {
            document_store,
            config,
            coordinates: RwLock::new(None),
            _phantom: PhantomData,
        }
    }

    /// Copies the coordinates out so no lock is held across a store call.
    fn current_coordinates(&self) -> WarehouseResult<CollectionCoordinates> {
        self.coordinates.read().clone().ok_or_else(|| {
            log::error!("Warehouse is not initialized");
            WarehouseError::new(
                "Warehouse is not initialized, call initialize first",
                ErrorKind::NotInitialized,
            )
        })
    }

    /// Partition key for a point operation that only knows the id.
    fn key_for_id(
        coordinates: &CollectionCoordinates,
        id: &str,
    ) -> WarehouseResult<Option<PartitionKey>> {
        match coordinates.partition_key_path() {
            None => Ok(None),
            Some(path) if path.trim_start_matches('/') == DOC_ID => Ok(Some(PartitionKey::from(id))),
            Some(path) => {
                log::error!(
                    "Collection {} is partitioned on {}, a partition key is required",
                    coordinates.link(),
                    path
                );
                Err(WarehouseError::new(
                    &format!(
                        "Collection {} is partitioned on {}, use the partition aware variant",
                        coordinates.link(),
                        path
                    ),
                    ErrorKind::InvalidOperation,
                ))
            }
        }
    }

    /// Partition key for a write, read from the document itself.
    fn key_for_document(
        coordinates: &CollectionCoordinates,
        document: &Document,
    ) -> WarehouseResult<Option<PartitionKey>> {
        match coordinates.partition_key_path() {
            None => Ok(None),
            Some(path) => match document.partition_value(path) {
                Some(value) => Ok(Some(PartitionKey::from(value.clone()))),
                None => {
                    log::error!("Document has no value at partition key path {}", path);
                    Err(WarehouseError::new(
                        &format!("Document has no value at partition key path {}", path),
                        ErrorKind::InvalidOperation,
                    ))
                }
            },
        }
    }

    fn to_document(object: &T, id: &str) -> WarehouseResult<Document>
    where
        T: Serialize,
    {
        let mut document = Document::from_object(object)?;
        document.set_id(id)?;
        Ok(document)
    }

    async fn read(
        &self,
        coordinates: &CollectionCoordinates,
        id: &str,
        partition_key: Option<&PartitionKey>,
    ) -> WarehouseResult<Option<Document>> {
        match self
            .document_store
            .read_document(coordinates.link(), id, partition_key)
            .await
        {
            Ok(document) => Ok(Some(document)),
            Err(err) if err.is_not_found() => Ok(None),
            Err(err) => Err(err),
        }
    }
}

#[async_trait]
impl<T> WarehouseProvider<T> for DefaultWarehouse<T>
where
    T: Serialize + DeserializeOwned + Send + Sync + 'static,
{
    async fn initialize(
        &self,
        database: &str,
        collection: &str,
        partition_key_path: Option<&str>,
    ) -> WarehouseResult<()> {
        validate_resource_name("database", database)?;
        validate_resource_name("collection", collection)?;
        let options = self.config.collection_options(collection, partition_key_path)?;

        if self.document_store.ensure_database(database).await? {
            log::info!("Created database {} in {}", database, self.document_store.name());
        }

        let link = CollectionLink::new(database, collection);
        let created = self.document_store.ensure_collection(database, &options).await?;
        let effective_path = if created {
            log::info!("Created collection {} in {}", link, self.document_store.name());
            options.partition_key_path().map(String::from)
        } else {
            let existing = self.document_store.read_collection(&link).await?;
            let existing_path = existing.partition_key_path().map(String::from);
            if existing_path.as_deref() != options.partition_key_path() {
                log::warn!(
                    "Collection {} is partitioned on {:?}, not on {:?} as requested",
                    link,
                    existing_path,
                    options.partition_key_path()
                );
            }
            existing_path
        };

        *self.coordinates.write() = Some(CollectionCoordinates::new(link, effective_path));
        Ok(())
    }

    async fn get(&self, id: &str) -> WarehouseResult<Option<T>> {
        validate_id(id)?;
        let coordinates = self.current_coordinates()?;
        let partition_key = Self::key_for_id(&coordinates, id)?;
        match self.read(&coordinates, id, partition_key.as_ref()).await? {
            Some(document) => Ok(Some(document.into_object()?)),
            None => Ok(None),
        }
    }

    async fn get_in_partition(
        &self,
        id: &str,
        partition_key: &PartitionKey,
    ) -> WarehouseResult<Option<T>> {
        validate_id(id)?;
        let coordinates = self.current_coordinates()?;
        match self.read(&coordinates, id, Some(partition_key)).await? {
            Some(document) => Ok(Some(document.into_object()?)),
            None => Ok(None),
        }
    }

    async fn get_all(&self) -> WarehouseResult<Vec<T>> {
        self.get_all_matching(&all()).await
    }

    async fn get_all_matching(&self, filter: &Filter) -> WarehouseResult<Vec<T>> {
        let coordinates = self.current_coordinates()?;
        let max_item_count = self.config.max_item_count();
        let mut results = Vec::new();
        let mut continuation: Option<String> = None;
        let mut pages = 0usize;

        loop {
            let page = match self
                .document_store
                .query_documents(
                    coordinates.link(),
                    filter,
                    continuation.as_deref(),
                    max_item_count,
                )
                .await
            {
                Ok(page) => page,
                Err(err) if pages == 0 && err.kind() == &ErrorKind::CollectionNotFound => {
                    log::warn!("Collection {} does not exist, nothing to load", coordinates.link());
                    return Ok(Vec::new());
                }
                Err(err) => return Err(err),
            };
            pages += 1;

            let (documents, next) = page.into_parts();
            results.reserve(documents.len());
            for document in documents {
                results.push(document.into_object()?);
            }

            match next {
                Some(token) => continuation = Some(token),
                None => break,
            }
        }

        log::debug!(
            "Loaded {} documents from {} in {} pages",
            results.len(),
            coordinates.link(),
            pages
        );
        Ok(results)
    }

    async fn store(&self, object: &T, id: &str) -> WarehouseResult<StoreOutcome> {
        validate_id(id)?;
        let coordinates = self.current_coordinates()?;
        let document = Self::to_document(object, id)?;
        let partition_key = Self::key_for_document(&coordinates, &document)?;

        if self
            .read(&coordinates, id, partition_key.as_ref())
            .await?
            .is_some()
        {
            log::debug!("Document {} already exists in {}", id, coordinates.link());
            return Ok(StoreOutcome::Existing(id.to_string()));
        }

        match self
            .document_store
            .create_document(coordinates.link(), document, partition_key.as_ref())
            .await
        {
            Ok(_) => Ok(StoreOutcome::Created(id.to_string())),
            Err(err) if err.is_conflict() => {
                log::debug!("Document {} was created concurrently in {}", id, coordinates.link());
                Ok(StoreOutcome::Existing(id.to_string()))
            }
            Err(err) => Err(err),
        }
    }

    async fn update(&self, object: &T, id: &str) -> WarehouseResult<()> {
        validate_id(id)?;
        let coordinates = self.current_coordinates()?;
        let document = Self::to_document(object, id)?;
        let partition_key = Self::key_for_document(&coordinates, &document)?;
        self.document_store
            .replace_document(coordinates.link(), id, document, partition_key.as_ref())
            .await?;
        Ok(())
    }

    async fn delete(&self, id: &str) -> WarehouseResult<()> {
        validate_id(id)?;
        let coordinates = self.current_coordinates()?;
        let partition_key = Self::key_for_id(&coordinates, id)?;
        self.document_store
            .delete_document(coordinates.link(), id, partition_key.as_ref())
            .await
    }

    async fn delete_in_partition(
        &self,
        id: &str,
        partition_key: &PartitionKey,
    ) -> WarehouseResult<()> {
        validate_id(id)?;
        let coordinates = self.current_coordinates()?;
        self.document_store
            .delete_document(coordinates.link(), id, Some(partition_key))
            .await
    }

    async fn exists(&self, id: &str) -> WarehouseResult<bool> {
        validate_id(id)?;
        let coordinates = self.current_coordinates()?;
        let partition_key = Self::key_for_id(&coordinates, id)?;
        Ok(self
            .read(&coordinates, id, partition_key.as_ref())
            .await?
            .is_some())
    }

    async fn clean_collection(&self) -> WarehouseResult<()> {
        let coordinates = self.current_coordinates()?;
        self.document_store.delete_collection(coordinates.link()).await?;
        log::info!("Deleted collection {}", coordinates.link());

        let mut current = self.coordinates.write();
        if current.as_ref() == Some(&coordinates) {
            *current = None;
        }
        Ok(())
    }

    fn coordinates(&self) -> Option<CollectionCoordinates> {
        self.coordinates.read().clone()
    }
}
