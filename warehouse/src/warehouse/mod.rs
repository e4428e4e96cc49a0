//! The typed data-access facade.
//!
//! [`Warehouse<T>`] binds a value type `T` to one collection of a document store and
//! offers insert-if-absent, replace, delete, point lookup and paginated scans over it.
//! A missing document is reported as an explicit absent value rather than an error.

mod default_warehouse;
mod store_outcome;
#[allow(clippy::module_inception)]
mod warehouse;

pub(crate) use default_warehouse::*;
pub use store_outcome::*;
pub use warehouse::*;
