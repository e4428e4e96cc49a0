use crate::common::{FIELD_SEPARATOR, FORBIDDEN_ID_CHARACTERS, MAX_ID_LENGTH};
use crate::errors::{ErrorKind, WarehouseError, WarehouseResult};
use serde_json::Value;
use std::cmp::Ordering;

/// Validates a document id.
///
/// Ids must be non-empty, at most 255 characters long and free of the characters the
/// remote store reserves for resource links (`/`, `\`, `?`, `#`).
pub fn validate_id(id: &str) -> WarehouseResult<()> {
    if id.trim().is_empty() {
        log::error!("Document id cannot be empty");
        return Err(WarehouseError::new(
            "Document id cannot be empty",
            ErrorKind::InvalidId,
        ));
    }

    if id.chars().count() > MAX_ID_LENGTH {
        log::error!("Document id {} exceeds {} characters", id, MAX_ID_LENGTH);
        return Err(WarehouseError::new(
            &format!("Document id exceeds {} characters", MAX_ID_LENGTH),
            ErrorKind::InvalidId,
        ));
    }

    if let Some(c) = id.chars().find(|c| FORBIDDEN_ID_CHARACTERS.contains(c)) {
        log::error!("Document id {} contains forbidden character {:?}", id, c);
        return Err(WarehouseError::new(
            &format!("Document id contains forbidden character {:?}", c),
            ErrorKind::InvalidId,
        ));
    }
    Ok(())
}

/// Validates a database or collection name. Same rules as document ids, reported as
/// configuration errors.
pub fn validate_resource_name(kind: &str, name: &str) -> WarehouseResult<()> {
    validate_id(name).map_err(|e| {
        WarehouseError::new(
            &format!("Invalid {} name '{}': {}", kind, name, e.message()),
            ErrorKind::ConfigurationError,
        )
    })
}

/// Splits a dotted field path into its segments.
///
/// Every segment must be non-empty and must not contain quotes or brackets, which keeps
/// the path safe to embed in a query.
pub fn field_segments(field_name: &str) -> WarehouseResult<Vec<&str>> {
    let segments: Vec<&str> = field_name.split(FIELD_SEPARATOR).collect();
    for segment in &segments {
        if segment.is_empty() {
            log::error!("Invalid field name {}", field_name);
            return Err(WarehouseError::new(
                &format!("Invalid field name '{}': empty segment", field_name),
                ErrorKind::FilterError,
            ));
        }
        if segment.contains(['"', '\'', '[', ']', '\\']) {
            log::error!("Invalid field name {}", field_name);
            return Err(WarehouseError::new(
                &format!("Invalid field name '{}': illegal character", field_name),
                ErrorKind::FilterError,
            ));
        }
    }
    Ok(segments)
}

/// Compares two JSON values the way the query engine orders them.
///
/// Returns `None` for values of different types, for `null`s, and for arrays and
/// objects, none of which take part in range comparisons.
pub fn compare_values(left: &Value, right: &Value) -> Option<Ordering> {
    match (left, right) {
        (Value::Number(l), Value::Number(r)) => {
            if let (Some(l), Some(r)) = (l.as_i64(), r.as_i64()) {
                return Some(l.cmp(&r));
            }
            if let (Some(l), Some(r)) = (l.as_u64(), r.as_u64()) {
                return Some(l.cmp(&r));
            }
            l.as_f64()?.partial_cmp(&r.as_f64()?)
        }
        (Value::String(l), Value::String(r)) => Some(l.cmp(r)),
        (Value::Bool(l), Value::Bool(r)) => Some(l.cmp(r)),
        _ => None,
    }
}

/// Equality with numeric normalisation, so `1` equals `1.0`.
pub fn values_equal(left: &Value, right: &Value) -> bool {
    match (left, right) {
        (Value::Number(_), Value::Number(_)) => compare_values(left, right) == Some(Ordering::Equal),
        _ => left == right,
    }
}
