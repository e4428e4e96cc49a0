use crate::auth::{rfc1123_date, MasterKeyCredential, ResourceType};
use crate::config::CosmosConfig;
use crate::error::CosmosError;
use async_trait::async_trait;
use chrono::Utc;
use reqwest::header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Client, Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use url::Url;
use warehouse::document::Document;
use warehouse::errors::{ErrorKind, WarehouseError, WarehouseResult};
use warehouse::filter::Filter;
use warehouse::store::{
    CollectionLink, CollectionOptions, DocumentStoreProvider, Page, PartitionKey,
    PartitionKeyDefinition,
};

pub(crate) const HEADER_DATE: &str = "x-ms-date";
pub(crate) const HEADER_VERSION: &str = "x-ms-version";
pub(crate) const HEADER_PARTITION_KEY: &str = "x-ms-documentdb-partitionkey";
pub(crate) const HEADER_OFFER_THROUGHPUT: &str = "x-ms-offer-throughput";
pub(crate) const HEADER_IS_QUERY: &str = "x-ms-documentdb-isquery";
pub(crate) const HEADER_MAX_ITEM_COUNT: &str = "x-ms-max-item-count";
pub(crate) const HEADER_CONTINUATION: &str = "x-ms-continuation";
pub(crate) const HEADER_CROSS_PARTITION: &str = "x-ms-documentdb-query-enablecrosspartition";
pub(crate) const HEADER_SUB_STATUS: &str = "x-ms-substatus";
pub(crate) const QUERY_CONTENT_TYPE: &str = "application/query+json";

/// One REST call: where it goes and what it signs.
struct Call<'a> {
    method: Method,
    path: Vec<&'a str>,
    resource_type: ResourceType,
    resource_link: String,
    query: bool,
}

impl<'a> Call<'a> {
    fn new(
        method: Method,
        path: Vec<&'a str>,
        resource_type: ResourceType,
        resource_link: String,
    ) -> Self {
        Call {
            method,
            path,
            resource_type,
            resource_link,
            query: false,
        }
    }

    fn databases() -> Self {
        Call::new(Method::POST, vec!["dbs"], ResourceType::Database, String::new())
    }

    fn database(method: Method, database: &'a str) -> Self {
        Call::new(
            method,
            vec!["dbs", database],
            ResourceType::Database,
            format!("dbs/{}", database),
        )
    }

    fn collections(database: &'a str) -> Self {
        Call::new(
            Method::POST,
            vec!["dbs", database, "colls"],
            ResourceType::Collection,
            format!("dbs/{}", database),
        )
    }

    fn collection(method: Method, link: &'a CollectionLink) -> Self {
        Call::new(
            method,
            vec!["dbs", link.database(), "colls", link.collection()],
            ResourceType::Collection,
            link.to_string(),
        )
    }

    fn documents(link: &'a CollectionLink) -> Self {
        Call::new(
            Method::POST,
            vec!["dbs", link.database(), "colls", link.collection(), "docs"],
            ResourceType::Document,
            link.to_string(),
        )
    }

    fn document(method: Method, link: &'a CollectionLink, id: &'a str) -> Self {
        Call::new(
            method,
            vec!["dbs", link.database(), "colls", link.collection(), "docs", id],
            ResourceType::Document,
            link.document_link(id),
        )
    }

    fn as_query(mut self) -> Self {
        self.query = true;
        self
    }
}

#[derive(Deserialize)]
struct ErrorBody {
    #[serde(default)]
    code: String,
    #[serde(default)]
    message: String,
}

#[derive(Deserialize)]
struct QueryResponse {
    #[serde(rename = "Documents", default)]
    documents: Vec<Document>,
}

/// Only the parts of a collection resource the façade reads back.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CollectionResource {
    id: String,
    #[serde(default)]
    partition_key: Option<PartitionKeyDefinition>,
}

/// [`DocumentStoreProvider`] talking to the document database REST API.
///
/// Every call is signed with the account master key and sent exactly once. Error
/// responses are turned into [`WarehouseError`]s carrying the HTTP status code:
///
/// | status | kind |
/// |---|---|
/// | 404 | `NotFound` (`CollectionNotFound` for a document call whose collection is gone) |
/// | 409 | `Conflict` |
/// | 412 | `PreconditionFailed` |
/// | 400 | `InvalidOperation` |
/// | 401, 403 | `SecurityError` |
/// | 429 | `RequestRateTooLarge` |
/// | other | `BackendError` |
///
/// Failures below HTTP are `NetworkError`.
#[derive(Clone)]
pub struct CosmosStore {
    inner: Arc<CosmosStoreInner>,
}

impl CosmosStore {
    /// Creates a store with an HTTP client built from the configuration.
    pub fn new(config: CosmosConfig) -> WarehouseResult<CosmosStore> {
        let client = Client::builder()
            .timeout(config.request_timeout())
            .user_agent(config.user_agent())
            .build()
            .map_err(|e| {
                log::error!("Failed to build HTTP client: {}", e);
                WarehouseError::new(
                    &format!("Failed to build HTTP client: {}", e),
                    ErrorKind::ConfigurationError,
                )
            })?;
        Ok(CosmosStore::with_client(config, client))
    }

    /// Creates a store that sends its requests through `client`.
    pub fn with_client(config: CosmosConfig, client: Client) -> CosmosStore {
        let credential = MasterKeyCredential::new(config.master_key());
        CosmosStore {
            inner: Arc::new(CosmosStoreInner {
                config,
                client,
                credential,
            }),
        }
    }

    pub fn config(&self) -> &CosmosConfig {
        &self.inner.config
    }
}

struct CosmosStoreInner {
    config: CosmosConfig,
    client: Client,
    credential: MasterKeyCredential,
}

impl CosmosStoreInner {
    fn url(&self, path: &[&str]) -> WarehouseResult<Url> {
        let mut url = self.config.endpoint().clone();
        {
            let mut segments = url.path_segments_mut().map_err(|_| {
                WarehouseError::new(
                    &format!("Endpoint {} cannot hold a path", self.config.endpoint()),
                    ErrorKind::ConfigurationError,
                )
            })?;
            segments.pop_if_empty().extend(path);
        }
        Ok(url)
    }

    /// Builds a signed request for `call`.
    fn prepare(&self, call: &Call<'_>) -> WarehouseResult<RequestBuilder> {
        let url = self.url(&call.path)?;
        let date = rfc1123_date(Utc::now());
        let token = self.credential.authorization_token(
            call.method.as_str(),
            call.resource_type,
            &call.resource_link,
            &date,
        )?;

        Ok(self
            .client
            .request(call.method.clone(), url)
            .header(AUTHORIZATION, token)
            .header(HEADER_DATE, date)
            .header(HEADER_VERSION, self.config.api_version())
            .header(ACCEPT, "application/json"))
    }

    /// Sends the request and turns any non-success status into an error.
    async fn send(&self, call: &Call<'_>, request: RequestBuilder) -> WarehouseResult<Response> {
        log::debug!("{} {}", call.method, call.resource_link);
        let response = request.send().await.map_err(|e| {
            log::error!(
                "{} {} failed to complete: {}",
                call.method,
                call.resource_link,
                e
            );
            CosmosError::from(e)
        })?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let sub_status = response
            .headers()
            .get(HEADER_SUB_STATUS)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.trim().parse::<u32>().ok());
        let text = response.text().await.unwrap_or_default();
        let message = match serde_json::from_str::<ErrorBody>(&text) {
            Ok(body) if !body.message.is_empty() && !body.code.is_empty() => {
                format!("{}: {}", body.code, body.message)
            }
            Ok(body) if !body.message.is_empty() => body.message,
            Ok(body) if !body.code.is_empty() => body.code,
            Err(_) if !text.trim().is_empty() => text.trim().to_string(),
            _ => status
                .canonical_reason()
                .unwrap_or("unknown error")
                .to_string(),
        };

        log::debug!(
            "{} {} returned {} (sub-status {:?})",
            call.method,
            call.resource_link,
            status,
            sub_status
        );
        Err(CosmosError::Service {
            status: status.as_u16(),
            sub_status,
            message,
            resource_type: call.resource_type,
            query: call.query,
        }
        .into())
    }

    async fn execute(&self, call: Call<'_>) -> WarehouseResult<Response> {
        let request = self.prepare(&call)?;
        self.send(&call, request).await
    }

    async fn execute_json<T: DeserializeOwned>(
        &self,
        call: Call<'_>,
        configure: impl FnOnce(RequestBuilder) -> RequestBuilder,
    ) -> WarehouseResult<T> {
        let request = configure(self.prepare(&call)?);
        let response = self.send(&call, request).await?;
        let value = response.json::<T>().await.map_err(CosmosError::from)?;
        Ok(value)
    }
}

fn with_partition_key(
    request: RequestBuilder,
    partition_key: Option<&PartitionKey>,
) -> RequestBuilder {
    match partition_key {
        Some(key) => request.header(HEADER_PARTITION_KEY, key.to_json_array()),
        None => request,
    }
}

#[async_trait]
impl DocumentStoreProvider for CosmosStore {
    fn name(&self) -> &str {
        "cosmos"
    }

    async fn create_database(&self, database: &str) -> WarehouseResult<()> {
        let call = Call::databases();
        let request = self.inner.prepare(&call)?.json(&json!({ "id": database }));
        self.inner.send(&call, request).await?;
        log::info!("Created database {}", database);
        Ok(())
    }

    async fn read_database(&self, database: &str) -> WarehouseResult<()> {
        self.inner
            .execute(Call::database(Method::GET, database))
            .await?;
        Ok(())
    }

    async fn delete_database(&self, database: &str) -> WarehouseResult<()> {
        self.inner
            .execute(Call::database(Method::DELETE, database))
            .await?;
        log::info!("Deleted database {}", database);
        Ok(())
    }

    async fn create_collection(
        &self,
        database: &str,
        options: &CollectionOptions,
    ) -> WarehouseResult<()> {
        let call = Call::collections(database);
        let mut request = self.inner.prepare(&call)?.json(options);
        if let Some(throughput) = options.offer_throughput {
            request = request.header(HEADER_OFFER_THROUGHPUT, throughput);
        }
        self.inner.send(&call, request).await?;
        log::info!("Created collection {} in database {}", options.id, database);
        Ok(())
    }

    async fn read_collection(&self, link: &CollectionLink) -> WarehouseResult<CollectionOptions> {
        let resource: CollectionResource = self
            .inner
            .execute_json(Call::collection(Method::GET, link), |request| request)
            .await?;
        let mut options = CollectionOptions::new(&resource.id);
        options.partition_key = resource.partition_key;
        Ok(options)
    }

    async fn delete_collection(&self, link: &CollectionLink) -> WarehouseResult<()> {
        self.inner
            .execute(Call::collection(Method::DELETE, link))
            .await?;
        log::info!("Deleted collection {}", link);
        Ok(())
    }

    async fn create_document(
        &self,
        link: &CollectionLink,
        document: Document,
        partition_key: Option<&PartitionKey>,
    ) -> WarehouseResult<Document> {
        self.inner
            .execute_json(Call::documents(link), |request| {
                with_partition_key(request, partition_key).json(&document)
            })
            .await
    }

    async fn read_document(
        &self,
        link: &CollectionLink,
        id: &str,
        partition_key: Option<&PartitionKey>,
    ) -> WarehouseResult<Document> {
        self.inner
            .execute_json(Call::document(Method::GET, link, id), |request| {
                with_partition_key(request, partition_key)
            })
            .await
    }

    async fn replace_document(
        &self,
        link: &CollectionLink,
        id: &str,
        mut document: Document,
        partition_key: Option<&PartitionKey>,
    ) -> WarehouseResult<Document> {
        document.set_id(id)?;
        self.inner
            .execute_json(Call::document(Method::PUT, link, id), |request| {
                with_partition_key(request, partition_key).json(&document)
            })
            .await
    }

    async fn delete_document(
        &self,
        link: &CollectionLink,
        id: &str,
        partition_key: Option<&PartitionKey>,
    ) -> WarehouseResult<()> {
        let call = Call::document(Method::DELETE, link, id);
        let request = with_partition_key(self.inner.prepare(&call)?, partition_key);
        self.inner.send(&call, request).await?;
        Ok(())
    }

    async fn query_documents(
        &self,
        link: &CollectionLink,
        filter: &Filter,
        continuation: Option<&str>,
        max_item_count: u32,
    ) -> WarehouseResult<Page> {
        let query = filter.to_query()?;
        let body = serde_json::to_vec(&query).map_err(|e| {
            WarehouseError::new(
                &format!("Failed to serialize query: {}", e),
                ErrorKind::FilterError,
            )
        })?;

        let call = Call::documents(link).as_query();
        let mut request = self
            .inner
            .prepare(&call)?
            .header(HEADER_IS_QUERY, "True")
            .header(CONTENT_TYPE, QUERY_CONTENT_TYPE)
            .header(HEADER_MAX_ITEM_COUNT, max_item_count)
            .body(body);
        if self.inner.config.cross_partition_queries() {
            request = request.header(HEADER_CROSS_PARTITION, "True");
        }
        if let Some(token) = continuation {
            request = request.header(HEADER_CONTINUATION, token);
        }

        let response = self.inner.send(&call, request).await?;
        let next = response
            .headers()
            .get(HEADER_CONTINUATION)
            .and_then(|value| value.to_str().ok())
            .filter(|value| !value.is_empty())
            .map(str::to_string);
        let page: QueryResponse = response.json().await.map_err(CosmosError::from)?;
        log::debug!(
            "Query on {} returned {} documents, more: {}",
            link,
            page.documents.len(),
            next.is_some()
        );
        Ok(Page::new(page.documents, next))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const KEY: &str = "d2FyZWhvdXNlLXRlc3QtbWFzdGVyLWtleS0wMTIzNDU2Nzg5";

    fn store(endpoint: &str) -> CosmosStore {
        CosmosStore::new(CosmosConfig::new(endpoint, KEY).unwrap()).unwrap()
    }

    #[test]
    fn test_url_segments_are_encoded() {
        let store = store("https://acct.documents.azure.com:443/");
        let link = CollectionLink::new("shop", "orders");
        let call = Call::document(Method::GET, &link, "a b/c");
        let url = store.inner.url(&call.path).unwrap();
        assert_eq!(
            url.as_str(),
            "https://acct.documents.azure.com/dbs/shop/colls/orders/docs/a%20b%2Fc"
        );
        assert_eq!(call.resource_link, "dbs/shop/colls/orders/docs/a b/c");
    }

    #[test]
    fn test_url_keeps_endpoint_path() {
        let store = store("http://localhost:8081/proxy/");
        let url = store.inner.url(&Call::databases().path).unwrap();
        assert_eq!(url.as_str(), "http://localhost:8081/proxy/dbs");
    }

    #[test]
    fn test_resource_links() {
        let link = CollectionLink::new("shop", "orders");
        assert_eq!(Call::databases().resource_link, "");
        assert_eq!(Call::database(Method::GET, "shop").resource_link, "dbs/shop");
        assert_eq!(Call::collections("shop").resource_link, "dbs/shop");
        assert_eq!(
            Call::collections("shop").resource_type,
            ResourceType::Collection
        );
        assert_eq!(
            Call::collection(Method::GET, &link).resource_link,
            "dbs/shop/colls/orders"
        );
        let query = Call::documents(&link).as_query();
        assert_eq!(query.resource_link, "dbs/shop/colls/orders");
        assert_eq!(query.resource_type, ResourceType::Document);
        assert!(query.query);
    }

    #[test]
    fn test_store_name() {
        assert_eq!(store("https://acct.example.com").name(), "cosmos");
    }
}
