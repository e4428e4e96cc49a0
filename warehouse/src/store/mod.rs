//! Storage backends and abstractions.
//!
//! This module provides the storage layer the [`Warehouse`](crate::warehouse::Warehouse)
//! façade talks to. The storage system is pluggable, allowing different implementations
//! (in-memory, remote REST service, etc.).
//!
//! # Storage Providers
//!
//! Storage providers implement [`DocumentStoreProvider`] and are shared through a
//! [`DocumentStore`] handle. Warehouse includes:
//! - **In-Memory Store**: [`memory::InMemoryStore`] for testing and temporary data
//! - **Cosmos Store**: `warehouse_cosmos_adapter` for the managed document service
//!
//! # Resources
//!
//! A store holds databases, a database holds collections and a collection holds JSON
//! documents addressed by id (and by partition key when the collection is
//! partitioned). Collections are addressed with a [`CollectionLink`] and created from
//! [`CollectionOptions`].
//!
//! # Queries
//!
//! Queries are paginated: each call returns a [`Page`] and, while more results remain,
//! a continuation token to pass to the next call.

mod document_store;
pub mod memory;
mod options;
mod page;

pub use document_store::*;
pub use options::*;
pub use page::*;
