use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::future::Future;
use warehouse::errors::WarehouseResult;
use warehouse::store::memory::{InMemoryStore, InMemoryStoreConfig};
use warehouse::store::{CollectionLink, DocumentStore};
use warehouse::warehouse::Warehouse;

/// Runs an async test against a fresh context and drops the context's database
/// afterwards, whether the test passed or not.
pub async fn run_test<F, Fut>(max_item_count: u32, test: F)
where
    F: FnOnce(TestContext) -> Fut,
    Fut: Future<Output = WarehouseResult<()>>,
{
    let ctx = create_test_context(max_item_count);
    let test_result = test(ctx.clone()).await;
    let after_result = cleanup(ctx).await;

    if let Err(e) = test_result {
        panic!("Test failed: {}", e);
    }
    if let Err(e) = after_result {
        panic!("After run failed: {}", e);
    }
}

#[derive(Clone)]
pub struct TestContext {
    database: String,
    max_item_count: u32,
    memory_store: InMemoryStore,
}

impl TestContext {
    pub fn new(database: String, max_item_count: u32, memory_store: InMemoryStore) -> Self {
        Self {
            database,
            max_item_count,
            memory_store,
        }
    }

    pub fn database(&self) -> &str {
        &self.database
    }

    pub fn memory_store(&self) -> InMemoryStore {
        self.memory_store.clone()
    }

    pub fn document_store(&self) -> DocumentStore {
        DocumentStore::new(self.memory_store.clone())
    }

    pub fn link(&self, collection: &str) -> CollectionLink {
        CollectionLink::new(&self.database, collection)
    }

    /// Documents held by `collection`, `None` if it does not exist.
    pub fn document_count(&self, collection: &str) -> Option<usize> {
        self.memory_store.document_count(&self.link(collection))
    }

    /// Opens a warehouse on `collection` of this context's database.
    pub async fn warehouse<T>(&self, collection: &str) -> WarehouseResult<Warehouse<T>>
    where
        T: Serialize + DeserializeOwned + Send + Sync + 'static,
    {
        Warehouse::builder()
            .store(self.document_store())
            .max_item_count(self.max_item_count)
            .open(&self.database, collection)
            .await
    }

    /// Opens a warehouse on `collection`, creating it partitioned on `path`.
    pub async fn partitioned_warehouse<T>(
        &self,
        collection: &str,
        path: &str,
    ) -> WarehouseResult<Warehouse<T>>
    where
        T: Serialize + DeserializeOwned + Send + Sync + 'static,
    {
        Warehouse::builder()
            .store(self.document_store())
            .max_item_count(self.max_item_count)
            .partition_key_path(path)
            .open(&self.database, collection)
            .await
    }
}

pub fn random_database() -> String {
    format!("db-{}", uuid::Uuid::new_v4())
}

/// Creates a context over a new in-memory store with its own database name.
/// Warehouses opened from it fetch `max_item_count` documents per page.
pub fn create_test_context(max_item_count: u32) -> TestContext {
    let memory_store = InMemoryStore::new(InMemoryStoreConfig::new());
    TestContext::new(random_database(), max_item_count, memory_store)
}

pub async fn cleanup(ctx: TestContext) -> WarehouseResult<()> {
    match ctx.document_store().delete_database(ctx.database()).await {
        Ok(()) => Ok(()),
        Err(e) if e.is_not_found() => Ok(()),
        Err(e) => Err(e),
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Product {
    pub name: String,
    pub category: String,
    pub price: f64,
    #[serde(default)]
    pub tags: Vec<String>,
}

impl Product {
    pub fn new(name: &str, category: &str, price: f64) -> Self {
        Product {
            name: name.to_string(),
            category: category.to_string(),
            price,
            tags: Vec::new(),
        }
    }

    pub fn with_tags(mut self, tags: &[&str]) -> Self {
        self.tags = tags.iter().map(|t| t.to_string()).collect();
        self
    }
}

/// `count` products with ids `p-0`, `p-1`, ... spread over three categories.
pub fn generate_products(count: usize) -> Vec<(String, Product)> {
    const CATEGORIES: [&str; 3] = ["tools", "garden", "kitchen"];
    (0..count)
        .map(|i| {
            let product = Product::new(
                &format!("product-{}", i),
                CATEGORIES[i % CATEGORIES.len()],
                (i as f64) * 1.5,
            );
            (format!("p-{}", i), product)
        })
        .collect()
}
