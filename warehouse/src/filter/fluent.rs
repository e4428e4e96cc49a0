use serde_json::Value;

use super::{
    ArrayContainsFilter, ComparisonFilter, ComparisonMode, ContainsFilter, EqualsFilter,
    ExistsFilter, Filter, InFilter, NotEqualsFilter, StartsWithFilter,
};

/// Creates a fluent filter builder for the specified field name.
///
/// The name may be a dotted path into nested objects, e.g. `address.city`.
pub fn field(field_name: &str) -> FluentFilter {
    FluentFilter {
        field_name: field_name.to_string(),
    }
}

/// A fluent builder for constructing filters on a specific field.
///
/// Each method consumes the builder and returns a [`Filter`] that can be passed to
/// [`Warehouse::get_all_matching`](crate::warehouse::Warehouse::get_all_matching) or
/// combined with other filters.
pub struct FluentFilter {
    field_name: String,
}

impl FluentFilter {
    /// Matches documents where the field equals the value.
    #[inline]
    pub fn eq<T: Into<Value>>(self, value: T) -> Filter {
        Filter::new(EqualsFilter::new(self.field_name, value.into()))
    }

    /// Matches documents where the field differs from the value or is missing.
    #[inline]
    pub fn ne<T: Into<Value>>(self, value: T) -> Filter {
        Filter::new(NotEqualsFilter::new(self.field_name, value.into()))
    }

    /// Matches documents where the field is greater than the value.
    #[inline]
    pub fn gt<T: Into<Value>>(self, value: T) -> Filter {
        Filter::new(ComparisonFilter::new(
            self.field_name,
            value.into(),
            ComparisonMode::Greater,
        ))
    }

    /// Matches documents where the field is greater than or equal to the value.
    #[inline]
    pub fn gte<T: Into<Value>>(self, value: T) -> Filter {
        Filter::new(ComparisonFilter::new(
            self.field_name,
            value.into(),
            ComparisonMode::GreaterEqual,
        ))
    }

    /// Matches documents where the field is less than the value.
    #[inline]
    pub fn lt<T: Into<Value>>(self, value: T) -> Filter {
        Filter::new(ComparisonFilter::new(
            self.field_name,
            value.into(),
            ComparisonMode::Lesser,
        ))
    }

    /// Matches documents where the field is less than or equal to the value.
    #[inline]
    pub fn lte<T: Into<Value>>(self, value: T) -> Filter {
        Filter::new(ComparisonFilter::new(
            self.field_name,
            value.into(),
            ComparisonMode::LesserEqual,
        ))
    }

    /// Matches documents where the field equals any of the values.
    pub fn in_array<T: Into<Value>>(self, values: Vec<T>) -> Filter {
        let values = values.into_iter().map(Into::into).collect();
        Filter::new(InFilter::new(self.field_name, values))
    }

    /// Matches documents where the field is present.
    pub fn exists(self) -> Filter {
        Filter::new(ExistsFilter::new(self.field_name))
    }

    /// Matches string fields that start with `prefix`.
    pub fn starts_with(self, prefix: &str) -> Filter {
        Filter::new(StartsWithFilter::new(self.field_name, prefix.to_string()))
    }

    /// Matches string fields that contain `text`.
    pub fn contains(self, text: &str) -> Filter {
        Filter::new(ContainsFilter::new(self.field_name, text.to_string()))
    }

    /// Matches array fields holding `element`.
    pub fn array_contains<T: Into<Value>>(self, element: T) -> Filter {
        Filter::new(ArrayContainsFilter::new(self.field_name, element.into()))
    }
}
