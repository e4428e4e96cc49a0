use std::fmt::Display;

use crate::{document::Document, errors::WarehouseResult};

use super::{Filter, FilterProvider, QueryBuilder};

/// A filter that applies logical AND operation on multiple filters.
///
/// Evaluation short-circuits at the first filter that fails.
pub(crate) struct AndFilter {
    filters: Vec<Filter>,
}

impl AndFilter {
    pub(crate) fn new(filters: Vec<Filter>) -> Self {
        AndFilter { filters }
    }
}

impl Display for AndFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let filters: Vec<String> = self.filters.iter().map(|it| it.to_string()).collect();
        write!(f, "({})", filters.join(" && "))
    }
}

impl FilterProvider for AndFilter {
    #[inline]
    fn apply(&self, entry: &Document) -> WarehouseResult<bool> {
        for filter in &self.filters {
            if !filter.apply(entry)? {
                return Ok(false);
            }
        }
        Ok(true)
    }

    fn to_sql(&self, builder: &mut QueryBuilder) -> WarehouseResult<String> {
        let mut conditions = Vec::with_capacity(self.filters.len());
        for filter in &self.filters {
            conditions.push(filter.to_sql(builder)?);
        }
        Ok(format!("({})", conditions.join(" AND ")))
    }

    fn is_match_all(&self) -> bool {
        self.filters.iter().all(|f| f.is_match_all())
    }
}

/// A filter that applies logical OR operation on multiple filters.
///
/// Evaluation short-circuits at the first filter that succeeds.
pub(crate) struct OrFilter {
    filters: Vec<Filter>,
}

impl OrFilter {
    pub(crate) fn new(filters: Vec<Filter>) -> Self {
        OrFilter { filters }
    }
}

impl Display for OrFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let filters: Vec<String> = self.filters.iter().map(|it| it.to_string()).collect();
        write!(f, "({})", filters.join(" || "))
    }
}

impl FilterProvider for OrFilter {
    #[inline]
    fn apply(&self, entry: &Document) -> WarehouseResult<bool> {
        for filter in &self.filters {
            if filter.apply(entry)? {
                return Ok(true);
            }
        }
        Ok(false)
    }

    fn to_sql(&self, builder: &mut QueryBuilder) -> WarehouseResult<String> {
        let mut conditions = Vec::with_capacity(self.filters.len());
        for filter in &self.filters {
            conditions.push(filter.to_sql(builder)?);
        }
        Ok(format!("({})", conditions.join(" OR ")))
    }

    fn is_match_all(&self) -> bool {
        self.filters.iter().any(|f| f.is_match_all())
    }
}

/// A filter that negates another filter.
///
/// A document the inner filter cannot evaluate, because the field is missing or
/// holds another type, counts as not matching it, so the negation matches.
pub(crate) struct NotFilter {
    filter: Filter,
}

impl NotFilter {
    pub(crate) fn new(filter: Filter) -> Self {
        NotFilter { filter }
    }
}

impl Display for NotFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "!({})", self.filter)
    }
}

impl FilterProvider for NotFilter {
    #[inline]
    fn apply(&self, entry: &Document) -> WarehouseResult<bool> {
        Ok(!self.filter.apply(entry)?)
    }

    fn to_sql(&self, builder: &mut QueryBuilder) -> WarehouseResult<String> {
        // an undefined condition would drop the document, coalesce it to false first
        Ok(format!("(NOT (({}) ?? false))", self.filter.to_sql(builder)?))
    }
}

#[cfg(test)]
mod tests {
    use crate::doc;
    use crate::filter::{all, field};

    #[test]
    fn test_and_filter() {
        let filter = field("a").eq(1).and(field("b").eq(2));
        assert!(filter.apply(&doc!({ "a": 1, "b": 2 })).unwrap());
        assert!(!filter.apply(&doc!({ "a": 1, "b": 3 })).unwrap());
    }

    #[test]
    fn test_or_filter() {
        let filter = field("a").eq(1).or(field("b").eq(2));
        assert!(filter.apply(&doc!({ "a": 0, "b": 2 })).unwrap());
        assert!(!filter.apply(&doc!({ "a": 0, "b": 0 })).unwrap());
    }

    #[test]
    fn test_not_filter() {
        let filter = field("a").gt(5).not();
        assert!(filter.apply(&doc!({ "a": 1 })).unwrap());
        assert!(!filter.apply(&doc!({ "a": 6 })).unwrap());
        assert_eq!(
            filter.to_query().unwrap().query(),
            r#"SELECT * FROM root r WHERE (NOT ((r["a"] > @p0) ?? false))"#
        );
    }

    #[test]
    fn test_not_filter_matches_missing_and_mistyped_fields() {
        let filter = field("a").gt(5).not();
        assert!(filter.apply(&doc!({ "b": 10 })).unwrap());
        assert!(filter.apply(&doc!({ "a": "ten" })).unwrap());
        assert!(filter.apply(&doc!({ "a": null })).unwrap());

        // the rendered condition must not be undefined for those documents either
        let query = filter.to_query().unwrap();
        assert!(query.query().contains("?? false"));
        assert_eq!(query.parameters().len(), 1);
    }

    #[test]
    fn test_double_negation() {
        let filter = field("a").eq(1).not().not();
        assert!(filter.apply(&doc!({ "a": 1 })).unwrap());
        assert!(!filter.apply(&doc!({ "b": 1 })).unwrap());
        assert_eq!(
            filter.to_query().unwrap().query(),
            r#"SELECT * FROM root r WHERE (NOT (((NOT ((r["a"] = @p0) ?? false))) ?? false))"#
        );
    }

    #[test]
    fn test_and_with_all_is_not_match_all() {
        let filter = all().and(field("a").eq(1));
        assert!(!filter.is_match_all());
        assert_eq!(
            filter.to_query().unwrap().query(),
            r#"SELECT * FROM root r WHERE (true AND r["a"] = @p0)"#
        );
    }

    #[test]
    fn test_or_with_all_matches_everything() {
        let filter = all().or(field("a").eq(1));
        assert!(filter.is_match_all());
        assert_eq!(filter.to_query().unwrap().query(), "SELECT * FROM root r");
    }
}
