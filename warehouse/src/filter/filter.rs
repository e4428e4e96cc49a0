use crate::common::{field_segments, DOC_ID, QUERY_PARAMETER_PREFIX, QUERY_ROOT_ALIAS};
use crate::document::Document;
use crate::errors::WarehouseResult;
use serde::Serialize;
use serde_json::Value;
use std::fmt::Display;
use std::ops::Deref;
use std::sync::Arc;

use super::AllFilter;
use super::AndFilter;
use super::EqualsFilter;
use super::NotFilter;
use super::OrFilter;

/// Trait for implementing filters.
///
/// A filter has two faces. [`FilterProvider::apply`] evaluates it against a single
/// document, which is what an in-process store does. [`FilterProvider::to_sql`]
/// renders it as a condition of the remote store's SQL dialect so the predicate runs
/// server side. Both must agree on which documents match.
pub trait FilterProvider: Send + Sync + Display {
    /// Applies the filter to a document and returns whether it matches.
    fn apply(&self, entry: &Document) -> WarehouseResult<bool>;

    /// Renders the filter as a SQL condition, binding literal values as parameters.
    fn to_sql(&self, builder: &mut QueryBuilder) -> WarehouseResult<String>;

    /// Whether the filter matches every document, letting the query skip its `WHERE` clause.
    #[inline]
    fn is_match_all(&self) -> bool {
        false
    }
}

/// A query filter for selecting documents from a collection.
///
/// Filters are built through the fluent API (see [`field`](super::field)) and can be
/// composed with [`Filter::and`], [`Filter::or`] and [`Filter::not`]:
///
/// ```rust
/// use warehouse::filter::field;
///
/// let filter = field("age").gt(30).and(field("status").eq("active"));
/// let query = filter.to_query().unwrap();
/// assert_eq!(
///     query.query(),
///     r#"SELECT * FROM root r WHERE (r["age"] > @p0 AND r["status"] = @p1)"#
/// );
/// ```
#[derive(Clone)]
pub struct Filter {
    inner: Arc<dyn FilterProvider>,
}

impl Filter {
    /// Creates a new filter from a filter provider implementation.
    pub fn new<T: FilterProvider + 'static>(inner: T) -> Self {
        Filter { inner: Arc::new(inner) }
    }

    /// Combines this filter with another using logical AND.
    pub fn and(&self, filter: Filter) -> Self {
        Filter::new(AndFilter::new(vec![self.clone(), filter]))
    }

    /// Combines this filter with another using logical OR.
    pub fn or(&self, filter: Filter) -> Self {
        Filter::new(OrFilter::new(vec![self.clone(), filter]))
    }

    /// Negates this filter using logical NOT.
    pub fn not(&self) -> Self {
        Filter::new(NotFilter::new(self.clone()))
    }

    /// Renders the complete query for this filter.
    pub fn to_query(&self) -> WarehouseResult<SqlQuery> {
        let mut builder = QueryBuilder::new();
        let query = if self.inner.is_match_all() {
            format!("SELECT * FROM root {}", QUERY_ROOT_ALIAS)
        } else {
            let condition = self.inner.to_sql(&mut builder)?;
            format!("SELECT * FROM root {} WHERE {}", QUERY_ROOT_ALIAS, condition)
        };
        Ok(SqlQuery {
            query,
            parameters: builder.parameters,
        })
    }
}

impl Display for Filter {
    #[inline]
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.inner)
    }
}

impl Deref for Filter {
    type Target = Arc<dyn FilterProvider>;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

/// Creates a filter that matches all documents.
pub fn all() -> Filter {
    Filter::new(AllFilter)
}

/// Creates a filter that matches the document with the given id.
pub fn by_id(id: &str) -> Filter {
    Filter::new(EqualsFilter::new(DOC_ID.to_string(), Value::String(id.to_string())))
}

/// Collects the parameters of a query while its condition is being rendered.
#[derive(Default)]
pub struct QueryBuilder {
    parameters: Vec<QueryParameter>,
}

impl QueryBuilder {
    pub fn new() -> Self {
        QueryBuilder { parameters: Vec::new() }
    }

    /// Binds a literal value and returns the parameter name that refers to it.
    pub fn bind(&mut self, value: Value) -> String {
        let name = format!("{}{}", QUERY_PARAMETER_PREFIX, self.parameters.len());
        self.parameters.push(QueryParameter {
            name: name.clone(),
            value,
        });
        name
    }

    /// Renders a dotted field path as a property reference, `a.b` becoming `r["a"]["b"]`.
    pub fn field_ref(&self, field_name: &str) -> WarehouseResult<String> {
        let segments = field_segments(field_name)?;
        let mut reference = String::from(QUERY_ROOT_ALIAS);
        for segment in segments {
            reference.push_str("[\"");
            reference.push_str(segment);
            reference.push_str("\"]");
        }
        Ok(reference)
    }

    pub fn parameters(&self) -> &[QueryParameter] {
        &self.parameters
    }
}

/// A named query parameter.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct QueryParameter {
    pub name: String,
    pub value: Value,
}

/// A parameterised SQL query, serialized in the shape the query endpoint expects.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SqlQuery {
    query: String,
    parameters: Vec<QueryParameter>,
}

impl SqlQuery {
    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn parameters(&self) -> &[QueryParameter] {
        &self.parameters
    }
}
