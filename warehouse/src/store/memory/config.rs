use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Arc;

/// Largest page an in-memory query returns, whatever the caller asks for.
pub const DEFAULT_MAX_PAGE_SIZE: u32 = 1000;

/// Configuration for an in-memory store.
///
/// # Purpose
/// `InMemoryStoreConfig` tunes how closely the in-memory store imitates a remote
/// service: the largest page size it hands out and whether it stamps system
/// properties (`_etag`, `_ts`) on written documents.
///
/// # Characteristics
/// - **Thread-Safe**: Can be safely cloned and shared across threads
/// - **Lightweight Cloning**: Uses Arc internally for efficient sharing
///
/// # Usage
/// ```text
/// let config = InMemoryStoreConfig::new();
/// config.set_max_page_size(10);
/// let store = InMemoryStore::new(config);
/// ```
#[derive(Clone)]
pub struct InMemoryStoreConfig {
    inner: Arc<InMemoryStoreConfigInner>,
}

impl InMemoryStoreConfig {
    /// Creates a new `InMemoryStoreConfig` with default settings.
    pub fn new() -> InMemoryStoreConfig {
        InMemoryStoreConfig {
            inner: Arc::new(InMemoryStoreConfigInner::new()),
        }
    }

    /// Caps the number of documents in a single query page. Zero is treated as one.
    pub fn set_max_page_size(&self, max_page_size: u32) {
        self.inner
            .max_page_size
            .store(max_page_size.max(1), Ordering::Relaxed);
    }

    pub fn max_page_size(&self) -> u32 {
        self.inner.max_page_size.load(Ordering::Relaxed)
    }

    /// Enables or disables stamping `_etag` and `_ts` on written documents.
    pub fn set_system_properties(&self, enabled: bool) {
        self.inner.system_properties.store(enabled, Ordering::Relaxed);
    }

    pub fn system_properties(&self) -> bool {
        self.inner.system_properties.load(Ordering::Relaxed)
    }
}

impl Default for InMemoryStoreConfig {
    fn default() -> Self {
        InMemoryStoreConfig::new()
    }
}

struct InMemoryStoreConfigInner {
    max_page_size: AtomicU32,
    system_properties: AtomicBool,
}

impl InMemoryStoreConfigInner {
    fn new() -> InMemoryStoreConfigInner {
        InMemoryStoreConfigInner {
            max_page_size: AtomicU32::new(DEFAULT_MAX_PAGE_SIZE),
            system_properties: AtomicBool::new(true),
        }
    }
}
