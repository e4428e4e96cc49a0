//! REST backend for `warehouse`.
//!
//! [`CosmosStore`] implements [`DocumentStoreProvider`](warehouse::store::DocumentStoreProvider)
//! against the document database REST API, signing each request with the account
//! master key.
//!
//! ```rust,ignore
//! use warehouse::store::DocumentStore;
//! use warehouse::warehouse::Warehouse;
//! use warehouse_cosmos_adapter::{CosmosConfig, CosmosStore};
//!
//! let config = CosmosConfig::from_connection_string(&connection_string)?;
//! let store = DocumentStore::new(CosmosStore::new(config)?);
//! let orders: Warehouse<Order> = Warehouse::builder()
//!     .store(store)
//!     .open("shop", "orders")
//!     .await?;
//! ```

mod auth;
mod config;
mod error;
mod store;

pub use auth::ResourceType;
pub use config::*;
pub use error::*;
pub use store::CosmosStore;

#[cfg(test)]
mod tests {
    #[ctor::ctor]
    fn init() {
        colog::init();
    }
}
