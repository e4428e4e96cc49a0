//! Query filters for selecting documents from a collection.
//!
//! Filters are built with the fluent API and evaluated by the document store, either
//! in process ([`FilterProvider::apply`]) or server side after being rendered as a
//! parameterised SQL query ([`Filter::to_query`]).
//!
//! # Examples
//!
//! ```rust
//! use warehouse::filter::{all, by_id, field};
//!
//! let adults = field("age").gte(18);
//! let local_adults = adults.and(field("address.city").eq("Oslo"));
//! let everything = all();
//! let one = by_id("order-1");
//! # let _ = (local_adults, everything, one);
//! ```
//!
//! # Supported Operators
//!
//! - **Equality**: `eq`, `ne`
//! - **Comparison**: `gt`, `gte`, `lt`, `lte`
//! - **Membership**: `in_array`, `array_contains`, `exists`
//! - **String**: `starts_with`, `contains`
//! - **Logical**: `and`, `or`, `not`
//! - **Special**: `all`, `by_id`

mod filter;
mod fluent;

mod basic_filters;
mod logical_filters;
mod pattern_filters;
mod range_filters;

pub(crate) use basic_filters::*;
pub use filter::*;
pub use fluent::*;
pub(crate) use logical_filters::*;
pub(crate) use pattern_filters::*;
pub use range_filters::ComparisonMode;
pub(crate) use range_filters::{ComparisonFilter, InFilter};
