use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use parking_lot::RwLock;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use url::Url;
use warehouse::errors::{ErrorKind, WarehouseError, WarehouseResult};

/// REST API version sent with every request.
pub const DEFAULT_API_VERSION: &str = "2018-12-31";
/// Request timeout applied by the HTTP client.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

const ACCOUNT_ENDPOINT: &str = "accountendpoint";
const ACCOUNT_KEY: &str = "accountkey";

#[derive(Clone)]
/// Connection settings for a document database account.
///
/// A cloneable, thread-safe configuration holder using the PIMPL pattern with
/// `Arc<CosmosConfigInner>`. The endpoint and master key are fixed at construction;
/// the remaining settings can be tuned before the config is handed to
/// [`CosmosStore::new`](crate::CosmosStore::new).
///
/// Usage:
/// ```text
/// let config = CosmosConfig::from_connection_string(
///     "AccountEndpoint=https://acct.documents.azure.com:443/;AccountKey=c2VjcmV0;",
/// )?;
/// config.set_request_timeout(Duration::from_secs(10));
/// ```
pub struct CosmosConfig {
    inner: Arc<CosmosConfigInner>,
}

impl CosmosConfig {
    /// Creates a configuration from an account endpoint and a base64 master key.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigurationError` if the endpoint is not an http(s) URL or the key
    /// is not valid base64.
    pub fn new(endpoint: &str, master_key: &str) -> WarehouseResult<CosmosConfig> {
        let endpoint = parse_endpoint(endpoint)?;
        let master_key = decode_master_key(master_key)?;
        Ok(CosmosConfig {
            inner: Arc::new(CosmosConfigInner::new(endpoint, master_key)),
        })
    }

    /// Creates a configuration from a connection string of the form
    /// `AccountEndpoint=<url>;AccountKey=<base64 key>;`.
    ///
    /// Keys are matched case-insensitively, unknown keys are ignored.
    pub fn from_connection_string(connection_string: &str) -> WarehouseResult<CosmosConfig> {
        let mut endpoint = None;
        let mut key = None;

        for part in connection_string.split(';').map(str::trim) {
            if part.is_empty() {
                continue;
            }
            let (name, value) = part.split_once('=').ok_or_else(|| {
                log::error!("Malformed connection string segment");
                WarehouseError::new(
                    "Malformed connection string, expected name=value pairs",
                    ErrorKind::ConfigurationError,
                )
            })?;
            match name.trim().to_ascii_lowercase().as_str() {
                ACCOUNT_ENDPOINT => endpoint = Some(value.trim()),
                ACCOUNT_KEY => key = Some(value.trim()),
                other => log::debug!("Ignoring connection string setting {}", other),
            }
        }

        match (endpoint, key) {
            (Some(endpoint), Some(key)) => CosmosConfig::new(endpoint, key),
            (None, _) => Err(WarehouseError::new(
                "Connection string has no AccountEndpoint",
                ErrorKind::ConfigurationError,
            )),
            (_, None) => Err(WarehouseError::new(
                "Connection string has no AccountKey",
                ErrorKind::ConfigurationError,
            )),
        }
    }

    pub fn endpoint(&self) -> &Url {
        &self.inner.endpoint
    }

    pub(crate) fn master_key(&self) -> &[u8] {
        &self.inner.master_key
    }

    pub fn api_version(&self) -> String {
        self.inner.api_version.read().clone()
    }

    pub fn set_api_version(&self, api_version: &str) {
        *self.inner.api_version.write() = api_version.to_string();
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.inner.request_timeout_ms.load(Ordering::Relaxed))
    }

    pub fn set_request_timeout(&self, timeout: Duration) {
        self.inner
            .request_timeout_ms
            .store(timeout.as_millis() as u64, Ordering::Relaxed);
    }

    pub fn user_agent(&self) -> String {
        self.inner.user_agent.read().clone()
    }

    pub fn set_user_agent(&self, user_agent: &str) {
        *self.inner.user_agent.write() = user_agent.to_string();
    }

    /// Whether queries may fan out over all partitions of a collection.
    pub fn cross_partition_queries(&self) -> bool {
        self.inner.cross_partition_queries.load(Ordering::Relaxed)
    }

    pub fn set_cross_partition_queries(&self, enabled: bool) {
        self.inner
            .cross_partition_queries
            .store(enabled, Ordering::Relaxed);
    }
}

struct CosmosConfigInner {
    endpoint: Url,
    master_key: Vec<u8>,
    api_version: RwLock<String>,
    user_agent: RwLock<String>,
    request_timeout_ms: AtomicU64,
    cross_partition_queries: AtomicBool,
}

impl CosmosConfigInner {
    fn new(endpoint: Url, master_key: Vec<u8>) -> Self {
        CosmosConfigInner {
            endpoint,
            master_key,
            api_version: RwLock::new(DEFAULT_API_VERSION.to_string()),
            user_agent: RwLock::new(format!("warehouse/{}", env!("CARGO_PKG_VERSION"))),
            request_timeout_ms: AtomicU64::new(DEFAULT_REQUEST_TIMEOUT.as_millis() as u64),
            cross_partition_queries: AtomicBool::new(true),
        }
    }
}

fn parse_endpoint(endpoint: &str) -> WarehouseResult<Url> {
    let url = Url::parse(endpoint).map_err(|e| {
        log::error!("Invalid account endpoint {}: {}", endpoint, e);
        WarehouseError::new(
            &format!("Invalid account endpoint '{}': {}", endpoint, e),
            ErrorKind::ConfigurationError,
        )
    })?;
    if url.scheme() != "https" && url.scheme() != "http" {
        log::error!("Unsupported endpoint scheme {}", url.scheme());
        return Err(WarehouseError::new(
            &format!("Account endpoint must be http or https, got {}", url.scheme()),
            ErrorKind::ConfigurationError,
        ));
    }
    if url.cannot_be_a_base() {
        return Err(WarehouseError::new(
            &format!("Account endpoint '{}' cannot be used as a base URL", endpoint),
            ErrorKind::ConfigurationError,
        ));
    }
    Ok(url)
}

fn decode_master_key(master_key: &str) -> WarehouseResult<Vec<u8>> {
    let key = STANDARD.decode(master_key.trim()).map_err(|e| {
        log::error!("Master key is not valid base64: {}", e);
        WarehouseError::new(
            "Master key is not valid base64",
            ErrorKind::ConfigurationError,
        )
    })?;
    if key.is_empty() {
        return Err(WarehouseError::new(
            "Master key cannot be empty",
            ErrorKind::ConfigurationError,
        ));
    }
    Ok(key)
}
