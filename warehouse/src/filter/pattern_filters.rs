use std::fmt::Display;

use serde_json::Value;

use crate::{common::values_equal, document::Document, errors::WarehouseResult};

use super::{FilterProvider, QueryBuilder};

/// A filter that matches string fields starting with a prefix.
pub(crate) struct StartsWithFilter {
    field_name: String,
    prefix: String,
}

impl StartsWithFilter {
    pub(crate) fn new(field_name: String, prefix: String) -> Self {
        StartsWithFilter { field_name, prefix }
    }
}

impl Display for StartsWithFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({} starts_with {:?})", self.field_name, self.prefix)
    }
}

impl FilterProvider for StartsWithFilter {
    fn apply(&self, entry: &Document) -> WarehouseResult<bool> {
        Ok(entry
            .get_field(&self.field_name)?
            .and_then(Value::as_str)
            .map(|s| s.starts_with(&self.prefix))
            .unwrap_or(false))
    }

    fn to_sql(&self, builder: &mut QueryBuilder) -> WarehouseResult<String> {
        let field = builder.field_ref(&self.field_name)?;
        let param = builder.bind(Value::String(self.prefix.clone()));
        Ok(format!("STARTSWITH({}, {})", field, param))
    }
}

/// A filter that matches string fields containing a substring.
pub(crate) struct ContainsFilter {
    field_name: String,
    text: String,
}

impl ContainsFilter {
    pub(crate) fn new(field_name: String, text: String) -> Self {
        ContainsFilter { field_name, text }
    }
}

impl Display for ContainsFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({} contains {:?})", self.field_name, self.text)
    }
}

impl FilterProvider for ContainsFilter {
    fn apply(&self, entry: &Document) -> WarehouseResult<bool> {
        Ok(entry
            .get_field(&self.field_name)?
            .and_then(Value::as_str)
            .map(|s| s.contains(&self.text))
            .unwrap_or(false))
    }

    fn to_sql(&self, builder: &mut QueryBuilder) -> WarehouseResult<String> {
        let field = builder.field_ref(&self.field_name)?;
        let param = builder.bind(Value::String(self.text.clone()));
        Ok(format!("CONTAINS({}, {})", field, param))
    }
}

/// A filter that matches array fields holding a given element.
pub(crate) struct ArrayContainsFilter {
    field_name: String,
    element: Value,
}

impl ArrayContainsFilter {
    pub(crate) fn new(field_name: String, element: Value) -> Self {
        ArrayContainsFilter { field_name, element }
    }
}

impl Display for ArrayContainsFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({} has {})", self.field_name, self.element)
    }
}

impl FilterProvider for ArrayContainsFilter {
    fn apply(&self, entry: &Document) -> WarehouseResult<bool> {
        Ok(entry
            .get_field(&self.field_name)?
            .and_then(Value::as_array)
            .map(|items| items.iter().any(|item| values_equal(item, &self.element)))
            .unwrap_or(false))
    }

    fn to_sql(&self, builder: &mut QueryBuilder) -> WarehouseResult<String> {
        let field = builder.field_ref(&self.field_name)?;
        let param = builder.bind(self.element.clone());
        Ok(format!("ARRAY_CONTAINS({}, {})", field, param))
    }
}
