use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use warehouse::document::Document;
use warehouse::errors::WarehouseResult;
use warehouse::filter::{field, Filter};
use warehouse::store::memory::{InMemoryStore, InMemoryStoreConfig};
use warehouse::store::{
    CollectionLink, CollectionOptions, DocumentStore, DocumentStoreProvider, Page, PartitionKey,
};
use warehouse::warehouse::Warehouse;
use warehouse_int_test::test_util::{generate_products, run_test, Product};

#[ctor::ctor]
fn init() {
    colog::init();
}

/// Counts the query round trips made against an in-memory store.
struct CountingStore {
    inner: InMemoryStore,
    queries: Arc<AtomicUsize>,
}

#[async_trait]
impl DocumentStoreProvider for CountingStore {
    fn name(&self) -> &str {
        "counting"
    }

    async fn create_database(&self, database: &str) -> WarehouseResult<()> {
        self.inner.create_database(database).await
    }

    async fn read_database(&self, database: &str) -> WarehouseResult<()> {
        self.inner.read_database(database).await
    }

    async fn delete_database(&self, database: &str) -> WarehouseResult<()> {
        self.inner.delete_database(database).await
    }

    async fn create_collection(
        &self,
        database: &str,
        options: &CollectionOptions,
    ) -> WarehouseResult<()> {
        self.inner.create_collection(database, options).await
    }

    async fn read_collection(&self, link: &CollectionLink) -> WarehouseResult<CollectionOptions> {
        self.inner.read_collection(link).await
    }

    async fn delete_collection(&self, link: &CollectionLink) -> WarehouseResult<()> {
        self.inner.delete_collection(link).await
    }

    async fn create_document(
        &self,
        link: &CollectionLink,
        document: Document,
        partition_key: Option<&PartitionKey>,
    ) -> WarehouseResult<Document> {
        self.inner.create_document(link, document, partition_key).await
    }

    async fn read_document(
        &self,
        link: &CollectionLink,
        id: &str,
        partition_key: Option<&PartitionKey>,
    ) -> WarehouseResult<Document> {
        self.inner.read_document(link, id, partition_key).await
    }

    async fn replace_document(
        &self,
        link: &CollectionLink,
        id: &str,
        document: Document,
        partition_key: Option<&PartitionKey>,
    ) -> WarehouseResult<Document> {
        self.inner
            .replace_document(link, id, document, partition_key)
            .await
    }

    async fn delete_document(
        &self,
        link: &CollectionLink,
        id: &str,
        partition_key: Option<&PartitionKey>,
    ) -> WarehouseResult<()> {
        self.inner.delete_document(link, id, partition_key).await
    }

    async fn query_documents(
        &self,
        link: &CollectionLink,
        filter: &Filter,
        continuation: Option<&str>,
        max_item_count: u32,
    ) -> WarehouseResult<Page> {
        self.queries.fetch_add(1, Ordering::SeqCst);
        self.inner
            .query_documents(link, filter, continuation, max_item_count)
            .await
    }
}

async fn counting_warehouse(max_item_count: u32) -> (Warehouse<Product>, Arc<AtomicUsize>) {
    let queries = Arc::new(AtomicUsize::new(0));
    let store = CountingStore {
        inner: InMemoryStore::new(InMemoryStoreConfig::new()),
        queries: queries.clone(),
    };
    let warehouse = Warehouse::builder()
        .store(DocumentStore::new(store))
        .max_item_count(max_item_count)
        .open("catalog", "products")
        .await
        .unwrap_or_else(|e| panic!("{}", e));
    (warehouse, queries)
}

#[tokio::test]
async fn test_get_all_collects_every_page() {
    let (products, queries) = counting_warehouse(3).await;
    for (id, product) in generate_products(10) {
        products.store(&product, &id).await.unwrap();
    }

    let all = products.get_all().await.unwrap();
    assert_eq!(all.len(), 10);
    // ten documents, three per page
    assert_eq!(queries.load(Ordering::SeqCst), 4);

    let names: HashSet<String> = all.into_iter().map(|p| p.name).collect();
    assert_eq!(names.len(), 10);
    for i in 0..10 {
        assert!(names.contains(&format!("product-{}", i)));
    }
}

#[tokio::test]
async fn test_get_all_exact_page_multiple() {
    let (products, queries) = counting_warehouse(5).await;
    for (id, product) in generate_products(10) {
        products.store(&product, &id).await.unwrap();
    }
    assert_eq!(products.get_all().await.unwrap().len(), 10);
    assert_eq!(queries.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_get_all_on_empty_collection() {
    let (products, queries) = counting_warehouse(5).await;
    assert!(products.get_all().await.unwrap().is_empty());
    assert_eq!(queries.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_get_all_matching() {
    run_test(2, |ctx| async move {
        let products: Warehouse<Product> = ctx.warehouse("products").await?;
        for (id, product) in generate_products(9) {
            products.store(&product, &id).await?;
        }

        let tools = products
            .get_all_matching(&field("category").eq("tools"))
            .await?;
        assert_eq!(tools.len(), 3);
        assert!(tools.iter().all(|p| p.category == "tools"));

        let cheap_garden = products
            .get_all_matching(&field("category").eq("garden").and(field("price").lte(6.0)))
            .await?;
        let names: Vec<&str> = cheap_garden.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["product-1", "product-4"]);

        let none = products
            .get_all_matching(&field("category").eq("toys"))
            .await?;
        assert!(none.is_empty());
        Ok(())
    })
    .await;
}

#[tokio::test]
async fn test_get_all_matching_tags() {
    run_test(10, |ctx| async move {
        let products: Warehouse<Product> = ctx.warehouse("products").await?;
        products
            .store(&Product::new("pan", "kitchen", 25.0).with_tags(&["steel"]), "k-1")
            .await?;
        products
            .store(&Product::new("board", "kitchen", 10.0).with_tags(&["wood"]), "k-2")
            .await?;

        let steel = products
            .get_all_matching(&field("tags").array_contains("steel"))
            .await?;
        assert_eq!(steel.len(), 1);
        assert_eq!(steel[0].name, "pan");

        let not_steel = products
            .get_all_matching(&field("tags").array_contains("steel").not())
            .await?;
        assert_eq!(not_steel.len(), 1);
        assert_eq!(not_steel[0].name, "board");
        Ok(())
    })
    .await;
}
