use std::cmp::Ordering;
use std::fmt::Display;

use serde_json::Value;

use crate::{
    common::{compare_values, values_equal},
    document::Document,
    errors::{ErrorKind, WarehouseError, WarehouseResult},
};

use super::{FilterProvider, QueryBuilder};

/// Relational operator of a [`ComparisonFilter`].
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ComparisonMode {
    Greater,
    GreaterEqual,
    Lesser,
    LesserEqual,
}

impl ComparisonMode {
    fn operator(&self) -> &'static str {
        match self {
            ComparisonMode::Greater => ">",
            ComparisonMode::GreaterEqual => ">=",
            ComparisonMode::Lesser => "<",
            ComparisonMode::LesserEqual => "<=",
        }
    }

    fn accepts(&self, ordering: Ordering) -> bool {
        match self {
            ComparisonMode::Greater => ordering == Ordering::Greater,
            ComparisonMode::GreaterEqual => ordering != Ordering::Less,
            ComparisonMode::Lesser => ordering == Ordering::Less,
            ComparisonMode::LesserEqual => ordering != Ordering::Greater,
        }
    }
}

/// A filter comparing a field against a value with `>`, `>=`, `<` or `<=`.
///
/// Only numbers, strings and booleans are comparable, and only with a value of the
/// same type. Anything else never matches, as in the server side query engine.
pub(crate) struct ComparisonFilter {
    field_name: String,
    field_value: Value,
    mode: ComparisonMode,
}

impl ComparisonFilter {
    pub(crate) fn new(field_name: String, field_value: Value, mode: ComparisonMode) -> Self {
        ComparisonFilter {
            field_name,
            field_value,
            mode,
        }
    }

    fn validate(&self) -> WarehouseResult<()> {
        match self.field_value {
            Value::Number(_) | Value::String(_) | Value::Bool(_) => Ok(()),
            _ => {
                log::error!("Cannot compare {} using non comparable value {}", self.field_name, self.field_value);
                Err(WarehouseError::new(
                    &format!("Cannot compare {} using non comparable value {}", self.field_name, self.field_value),
                    ErrorKind::FilterError,
                ))
            }
        }
    }
}

impl Display for ComparisonFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({} {} {})", self.field_name, self.mode.operator(), self.field_value)
    }
}

impl FilterProvider for ComparisonFilter {
    fn apply(&self, entry: &Document) -> WarehouseResult<bool> {
        self.validate()?;
        Ok(entry
            .get_field(&self.field_name)?
            .and_then(|value| compare_values(value, &self.field_value))
            .map(|ordering| self.mode.accepts(ordering))
            .unwrap_or(false))
    }

    fn to_sql(&self, builder: &mut QueryBuilder) -> WarehouseResult<String> {
        self.validate()?;
        let field = builder.field_ref(&self.field_name)?;
        let param = builder.bind(self.field_value.clone());
        Ok(format!("{} {} {}", field, self.mode.operator(), param))
    }
}

/// A filter that matches documents whose field equals one of a list of values.
pub(crate) struct InFilter {
    field_name: String,
    values: Vec<Value>,
}

impl InFilter {
    pub(crate) fn new(field_name: String, values: Vec<Value>) -> Self {
        InFilter { field_name, values }
    }
}

impl Display for InFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({} in {})", self.field_name, Value::Array(self.values.clone()))
    }
}

impl FilterProvider for InFilter {
    fn apply(&self, entry: &Document) -> WarehouseResult<bool> {
        Ok(entry
            .get_field(&self.field_name)?
            .map(|value| self.values.iter().any(|v| values_equal(value, v)))
            .unwrap_or(false))
    }

    fn to_sql(&self, builder: &mut QueryBuilder) -> WarehouseResult<String> {
        let field = builder.field_ref(&self.field_name)?;
        if self.values.is_empty() {
            return Ok("false".to_string());
        }

        let params: Vec<String> = self
            .values
            .iter()
            .map(|value| builder.bind(value.clone()))
            .collect();
        Ok(format!("{} IN ({})", field, params.join(", ")))
    }
}
