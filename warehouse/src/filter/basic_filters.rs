use std::fmt::Display;

use serde_json::Value;

use crate::{common::values_equal, document::Document, errors::WarehouseResult};

use super::{FilterProvider, QueryBuilder};

/// A filter that matches all documents.
pub(crate) struct AllFilter;

impl FilterProvider for AllFilter {
    fn apply(&self, _entry: &Document) -> WarehouseResult<bool> {
        Ok(true)
    }

    fn to_sql(&self, _builder: &mut QueryBuilder) -> WarehouseResult<String> {
        Ok("true".to_string())
    }

    fn is_match_all(&self) -> bool {
        true
    }
}

impl Display for AllFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "AllFilter")
    }
}

/// A filter that matches documents where a field equals a specific value.
///
/// Numbers are compared by value, so `1` matches `1.0`. A document without the
/// field never matches.
pub(crate) struct EqualsFilter {
    field_name: String,
    field_value: Value,
}

impl EqualsFilter {
    #[inline]
    pub(crate) fn new(field_name: String, field_value: Value) -> Self {
        EqualsFilter {
            field_name,
            field_value,
        }
    }
}

impl Display for EqualsFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({} == {})", self.field_name, self.field_value)
    }
}

impl FilterProvider for EqualsFilter {
    #[inline]
    fn apply(&self, entry: &Document) -> WarehouseResult<bool> {
        Ok(entry
            .get_field(&self.field_name)?
            .map(|value| values_equal(value, &self.field_value))
            .unwrap_or(false))
    }

    fn to_sql(&self, builder: &mut QueryBuilder) -> WarehouseResult<String> {
        let field = builder.field_ref(&self.field_name)?;
        let param = builder.bind(self.field_value.clone());
        Ok(format!("{} = {}", field, param))
    }
}

/// A filter that matches documents where a field does not equal a specific value.
///
/// Documents that lack the field match.
pub(crate) struct NotEqualsFilter {
    field_name: String,
    field_value: Value,
}

impl NotEqualsFilter {
    #[inline]
    pub(crate) fn new(field_name: String, field_value: Value) -> Self {
        NotEqualsFilter {
            field_name,
            field_value,
        }
    }
}

impl Display for NotEqualsFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({} != {})", self.field_name, self.field_value)
    }
}

impl FilterProvider for NotEqualsFilter {
    #[inline]
    fn apply(&self, entry: &Document) -> WarehouseResult<bool> {
        Ok(entry
            .get_field(&self.field_name)?
            .map(|value| !values_equal(value, &self.field_value))
            .unwrap_or(true))
    }

    fn to_sql(&self, builder: &mut QueryBuilder) -> WarehouseResult<String> {
        let field = builder.field_ref(&self.field_name)?;
        let param = builder.bind(self.field_value.clone());
        // a missing or differently typed property compares as undefined, which would
        // drop the document
        Ok(format!("(NOT (({} = {}) ?? false))", field, param))
    }
}

/// A filter that matches documents in which a field is present (possibly `null`).
pub(crate) struct ExistsFilter {
    field_name: String,
}

impl ExistsFilter {
    #[inline]
    pub(crate) fn new(field_name: String) -> Self {
        ExistsFilter { field_name }
    }
}

impl Display for ExistsFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "exists({})", self.field_name)
    }
}

impl FilterProvider for ExistsFilter {
    fn apply(&self, entry: &Document) -> WarehouseResult<bool> {
        Ok(entry.get_field(&self.field_name)?.is_some())
    }

    fn to_sql(&self, builder: &mut QueryBuilder) -> WarehouseResult<String> {
        let field = builder.field_ref(&self.field_name)?;
        Ok(format!("IS_DEFINED({})", field))
    }
}

#[cfg(test)]
mod tests {
    use crate::doc;
    use crate::errors::ErrorKind;
    use crate::filter::field;

    #[test]
    fn test_equals_filter() {
        let filter = field("qty").eq(3);
        assert!(filter.apply(&doc!({ "qty": 3 })).unwrap());
        assert!(filter.apply(&doc!({ "qty": 3.0 })).unwrap());
        assert!(!filter.apply(&doc!({ "qty": 4 })).unwrap());
        assert!(!filter.apply(&doc!({ "qty": "3" })).unwrap());
        assert!(!filter.apply(&doc!({ "other": 3 })).unwrap());
    }

    #[test]
    fn test_equals_filter_nested_field() {
        let filter = field("address.city").eq("Oslo");
        assert!(filter.apply(&doc!({ "address": { "city": "Oslo" } })).unwrap());
        assert!(!filter.apply(&doc!({ "address": "Oslo" })).unwrap());
    }

    #[test]
    fn test_not_equals_filter() {
        let filter = field("status").ne("closed");
        assert!(filter.apply(&doc!({ "status": "open" })).unwrap());
        assert!(!filter.apply(&doc!({ "status": "closed" })).unwrap());
        assert!(filter.apply(&doc!({ "id": "no-status" })).unwrap());
        assert!(filter.apply(&doc!({ "status": 3 })).unwrap());

        let query = filter.to_query().unwrap();
        assert_eq!(
            query.query(),
            r#"SELECT * FROM root r WHERE (NOT ((r["status"] = @p0) ?? false))"#
        );
    }

    #[test]
    fn test_exists_filter() {
        let filter = field("email").exists();
        assert!(filter.apply(&doc!({ "email": null })).unwrap());
        assert!(!filter.apply(&doc!({ "name": "x" })).unwrap());
        assert_eq!(
            filter.to_query().unwrap().query(),
            r#"SELECT * FROM root r WHERE IS_DEFINED(r["email"])"#
        );
    }

    #[test]
    fn test_invalid_field_name_fails_rendering() {
        let filter = field("bad\"name").eq(1);
        assert!(filter.to_query().is_err());
    }

    #[test]
    fn test_invalid_field_name_fails_evaluation() {
        let document = doc!({ "a": { "b": 1 } });
        for filter in [
            field("a..b").ne(1),
            field("a..b").eq(1),
            field(".a").exists(),
            field("bad\"name").ne(1).not(),
        ] {
            let err = filter.apply(&document).unwrap_err();
            assert_eq!(err.kind(), &ErrorKind::FilterError);
            assert!(filter.to_query().is_err());
        }
    }
}
