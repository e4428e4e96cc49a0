use mockito::{Matcher, Server, ServerGuard};
use serde_json::json;
use warehouse::doc;
use warehouse::errors::ErrorKind;
use warehouse::filter::{all, field};
use warehouse::store::{CollectionLink, CollectionOptions, DocumentStoreProvider, PartitionKey};
use warehouse_cosmos_adapter::{CosmosConfig, CosmosStore};

const KEY: &str = "d2FyZWhvdXNlLXRlc3QtbWFzdGVyLWtleS0wMTIzNDU2Nzg5";
const AUTH_PATTERN: &str = r"^type%3Dmaster%26ver%3D1\.0%26sig%3D[A-Za-z0-9%]+$";

#[ctor::ctor]
fn init() {
    colog::init();
}

fn cosmos_store(server: &ServerGuard) -> CosmosStore {
    let config = CosmosConfig::new(&server.url(), KEY).unwrap();
    CosmosStore::new(config).unwrap()
}

fn orders() -> CollectionLink {
    CollectionLink::new("shop", "orders")
}

#[tokio::test]
async fn test_create_database_sends_signed_request() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", "/dbs")
        .match_header("authorization", Matcher::Regex(AUTH_PATTERN.to_string()))
        .match_header("x-ms-version", "2018-12-31")
        .match_header("x-ms-date", Matcher::Regex(r" GMT$".to_string()))
        .match_body(Matcher::Json(json!({ "id": "shop" })))
        .with_status(201)
        .with_header("content-type", "application/json")
        .with_body(r#"{"id":"shop","_rid":"abc"}"#)
        .expect(1)
        .create_async()
        .await;

    let store = cosmos_store(&server);
    store.create_database("shop").await.unwrap();
    mock.assert_async().await;
}

#[tokio::test]
async fn test_ensure_database_tolerates_conflict() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", "/dbs")
        .with_status(409)
        .with_header("content-type", "application/json")
        .with_body(r#"{"code":"Conflict","message":"Resource with specified id already exists."}"#)
        .expect(2)
        .create_async()
        .await;

    let store = cosmos_store(&server);
    let err = store.create_database("shop").await.err().unwrap();
    assert_eq!(err.kind(), &ErrorKind::Conflict);
    assert_eq!(err.status_code(), Some(409));
    assert!(err.message().contains("already exists"));

    assert!(!store.ensure_database("shop").await.unwrap());
    mock.assert_async().await;
}

#[tokio::test]
async fn test_create_collection_with_throughput() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", "/dbs/shop/colls")
        .match_header("x-ms-offer-throughput", "400")
        .match_body(Matcher::PartialJson(json!({
            "id": "orders",
            "partitionKey": { "paths": ["/id"], "kind": "Hash" }
        })))
        .with_status(201)
        .with_body(r#"{"id":"orders"}"#)
        .expect(1)
        .create_async()
        .await;

    let store = cosmos_store(&server);
    let options = CollectionOptions::new("orders")
        .with_partition_key("/id")
        .unwrap()
        .with_offer_throughput(400);
    assert!(store.ensure_collection("shop", &options).await.unwrap());
    mock.assert_async().await;
}

#[tokio::test]
async fn test_read_collection_partition_key() {
    let mut server = Server::new_async().await;
    server
        .mock("GET", "/dbs/shop/colls/orders")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            json!({
                "id": "orders",
                "indexingPolicy": { "indexingMode": "consistent", "includedPaths": [
                    { "path": "/*", "indexes": [{ "kind": "Spatial", "dataType": "Point" }] }
                ]},
                "partitionKey": { "paths": ["/category"], "kind": "Hash", "version": 2 },
                "_rid": "x1",
                "_etag": "\"0000\""
            })
            .to_string(),
        )
        .create_async()
        .await;

    let store = cosmos_store(&server);
    let options = store.read_collection(&orders()).await.unwrap();
    assert_eq!(options.id, "orders");
    assert_eq!(options.partition_key_path(), Some("/category"));
}

#[tokio::test]
async fn test_missing_document_is_not_found() {
    let mut server = Server::new_async().await;
    server
        .mock("GET", "/dbs/shop/colls/orders/docs/o1")
        .match_header("x-ms-documentdb-partitionkey", r#"["o1"]"#)
        .with_status(404)
        .with_body(r#"{"code":"NotFound","message":"Entity with the specified id does not exist in the system."}"#)
        .create_async()
        .await;

    let store = cosmos_store(&server);
    let err = store
        .read_document(&orders(), "o1", Some(&PartitionKey::from("o1")))
        .await
        .err()
        .unwrap();
    assert_eq!(err.kind(), &ErrorKind::NotFound);
    assert!(err.is_not_found());
}

#[tokio::test]
async fn test_missing_collection_on_document_call() {
    let mut server = Server::new_async().await;
    server
        .mock("GET", "/dbs/shop/colls/orders/docs/o1")
        .with_status(404)
        .with_header("x-ms-substatus", "1003")
        .with_body(r#"{"code":"NotFound","message":"Owner resource does not exist"}"#)
        .create_async()
        .await;

    let store = cosmos_store(&server);
    let err = store
        .read_document(&orders(), "o1", None)
        .await
        .err()
        .unwrap();
    assert_eq!(err.kind(), &ErrorKind::CollectionNotFound);
    assert_eq!(err.status_code(), Some(404));
}

#[tokio::test]
async fn test_create_and_replace_document() {
    let mut server = Server::new_async().await;
    let create = server
        .mock("POST", "/dbs/shop/colls/orders/docs")
        .match_header("x-ms-documentdb-partitionkey", Matcher::Missing)
        .match_body(Matcher::Json(json!({ "id": "o1", "item": "pen" })))
        .with_status(201)
        .with_body(r#"{"id":"o1","item":"pen","_etag":"\"1\"","_ts":1700000000}"#)
        .expect(1)
        .create_async()
        .await;
    let replace = server
        .mock("PUT", "/dbs/shop/colls/orders/docs/o1")
        .match_body(Matcher::Json(json!({ "id": "o1", "item": "ink" })))
        .with_status(200)
        .with_body(r#"{"id":"o1","item":"ink","_etag":"\"2\""}"#)
        .expect(1)
        .create_async()
        .await;

    let store = cosmos_store(&server);
    let created = store
        .create_document(&orders(), doc!({ "id": "o1", "item": "pen" }), None)
        .await
        .unwrap();
    assert_eq!(created.id(), Some("o1"));
    assert_eq!(created.get("_ts"), Some(&json!(1700000000)));

    let replaced = store
        .replace_document(&orders(), "o1", doc!({ "item": "ink" }), None)
        .await
        .unwrap();
    assert_eq!(replaced.get("item"), Some(&json!("ink")));

    create.assert_async().await;
    replace.assert_async().await;
}

#[tokio::test]
async fn test_query_follows_continuation() {
    let mut server = Server::new_async().await;
    let first = server
        .mock("POST", "/dbs/shop/colls/orders/docs")
        .match_header("x-ms-documentdb-isquery", "True")
        .match_header("content-type", "application/query+json")
        .match_header("x-ms-max-item-count", "2")
        .match_header("x-ms-continuation", Matcher::Missing)
        .match_body(Matcher::Json(json!({
            "query": "SELECT * FROM root r WHERE r[\"item\"] = @p0",
            "parameters": [{ "name": "@p0", "value": "pen" }]
        })))
        .with_status(200)
        .with_header("x-ms-continuation", "page-2")
        .with_body(r#"{"_rid":"x","Documents":[{"id":"a","item":"pen"},{"id":"b","item":"pen"}],"_count":2}"#)
        .expect(1)
        .create_async()
        .await;
    let second = server
        .mock("POST", "/dbs/shop/colls/orders/docs")
        .match_header("x-ms-continuation", "page-2")
        .with_status(200)
        .with_body(r#"{"_rid":"x","Documents":[{"id":"c","item":"pen"}],"_count":1}"#)
        .expect(1)
        .create_async()
        .await;

    let store = cosmos_store(&server);
    let filter = field("item").eq("pen");
    let page = store
        .query_documents(&orders(), &filter, None, 2)
        .await
        .unwrap();
    assert_eq!(page.documents().len(), 2);
    assert_eq!(page.continuation(), Some("page-2"));

    let page = store
        .query_documents(&orders(), &filter, Some("page-2"), 2)
        .await
        .unwrap();
    assert_eq!(page.documents().len(), 1);
    assert!(!page.has_more_results());

    first.assert_async().await;
    second.assert_async().await;
}

#[tokio::test]
async fn test_query_on_missing_collection() {
    let mut server = Server::new_async().await;
    server
        .mock("POST", "/dbs/shop/colls/orders/docs")
        .with_status(404)
        .with_body(r#"{"code":"NotFound","message":"Resource Not Found"}"#)
        .create_async()
        .await;

    let store = cosmos_store(&server);
    let err = store
        .query_documents(&orders(), &all(), None, 10)
        .await
        .err()
        .unwrap();
    assert_eq!(err.kind(), &ErrorKind::CollectionNotFound);
}

#[tokio::test]
async fn test_status_mapping() {
    let mut server = Server::new_async().await;
    server
        .mock("DELETE", "/dbs/shop/colls/orders/docs/throttled")
        .with_status(429)
        .with_body(r#"{"code":"TooManyRequests","message":"Request rate is large"}"#)
        .create_async()
        .await;
    server
        .mock("DELETE", "/dbs/shop/colls/orders/docs/forbidden")
        .with_status(401)
        .with_body("")
        .create_async()
        .await;
    server
        .mock("DELETE", "/dbs/shop/colls/orders/docs/broken")
        .with_status(503)
        .with_body("not json")
        .create_async()
        .await;

    let store = cosmos_store(&server);
    let kind = |id: &'static str| {
        let store = store.clone();
        async move {
            store
                .delete_document(&orders(), id, None)
                .await
                .err()
                .unwrap()
        }
    };

    let err = kind("throttled").await;
    assert_eq!(err.kind(), &ErrorKind::RequestRateTooLarge);
    assert_eq!(err.status_code(), Some(429));

    let err = kind("forbidden").await;
    assert_eq!(err.kind(), &ErrorKind::SecurityError);
    assert!(err.message().contains("Unauthorized"));

    let err = kind("broken").await;
    assert_eq!(err.kind(), &ErrorKind::BackendError);
    assert!(err.message().contains("not json"));
}

#[tokio::test]
async fn test_invalid_response_body() {
    let mut server = Server::new_async().await;
    server
        .mock("GET", "/dbs/shop/colls/orders/docs/o1")
        .with_status(200)
        .with_body("<html>")
        .create_async()
        .await;

    let store = cosmos_store(&server);
    let err = store
        .read_document(&orders(), "o1", None)
        .await
        .err()
        .unwrap();
    assert_eq!(err.kind(), &ErrorKind::BackendError);
}

#[tokio::test]
async fn test_unreachable_endpoint() {
    let config = CosmosConfig::new("http://127.0.0.1:9", KEY).unwrap();
    let store = CosmosStore::new(config).unwrap();
    let err = store.read_database("shop").await.err().unwrap();
    assert_eq!(err.kind(), &ErrorKind::NetworkError);
    assert_eq!(err.status_code(), None);
}
