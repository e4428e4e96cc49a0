//! # Warehouse - Typed Access to Document Databases
//!
//! Warehouse is a thin, typed data-access layer over managed document databases. It
//! binds a serializable value type to one collection and exposes the handful of
//! operations application code needs, so the database client API never leaks into
//! business logic.
//!
//! ## Key Features
//!
//! - **Idempotent Provisioning**: Databases and collections are created on demand, racing
//!   provisioners do not fail each other
//! - **Explicit Absence**: Lookups of missing documents return `None` instead of an error
//! - **Insert If Absent**: [`store`](warehouse::WarehouseProvider::store) never overwrites
//! - **Paginated Scans**: Full and filtered scans drain every page the store returns
//! - **Server Side Filters**: A fluent filter API rendered as parameterised SQL
//! - **Pluggable Stores**: An in-memory store ships with the crate, the remote service
//!   adapter lives in `warehouse_cosmos_adapter`
//! - **Clean API**: PIMPL pattern provides stable, encapsulated interface
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use warehouse::filter::field;
//! use warehouse::store::memory::{InMemoryStore, InMemoryStoreConfig};
//! use warehouse::store::DocumentStore;
//! use warehouse::warehouse::Warehouse;
//!
//! let users: Warehouse<User> = Warehouse::builder()
//!     .store(DocumentStore::new(InMemoryStore::new(InMemoryStoreConfig::new())))
//!     .open("app", "users")
//!     .await?;
//!
//! users.store(&user, "u1").await?;
//! let adults = users.get_all_matching(&field("age").gte(18)).await?;
//! users.clean_collection().await?;
//! ```
//!
//! ## Module Organization
//!
//! - [`common`] - Constants and shared helpers
//! - [`document`] - The JSON document type and the `doc!` macro
//! - [`errors`] - Error types and result definitions
//! - [`filter`] - Query filters and their SQL rendering
//! - [`store`] - Storage backend abstractions and the in-memory store
//! - [`warehouse`] - The typed facade
//! - [`warehouse_builder`] - Builder for initialization
//! - [`warehouse_config`] - Warehouse configuration

pub mod common;
pub mod document;
pub mod errors;
pub mod filter;
pub mod store;
pub mod warehouse;
pub mod warehouse_builder;
pub mod warehouse_config;

#[doc(hidden)]
pub use serde_json;

#[cfg(test)]
mod tests {
    // Setup only one time throughout the project.
    // It will take effect during test, project wide
    #[ctor::ctor]
    fn init() {
        colog::init();
    }
}
