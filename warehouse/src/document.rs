use crate::common::{field_segments, DOC_ID, PARTITION_PATH_SEPARATOR};
use crate::errors::{ErrorKind, WarehouseError, WarehouseResult};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt::Display;

/// A JSON document as exchanged with a document store.
///
/// A `Document` is always a JSON object. Its `id` attribute identifies it within a
/// collection; every other field belongs to the caller, except system properties
/// (names starting with `_`) which the store maintains.
///
/// Application types convert to and from documents through their own `serde`
/// implementations:
///
/// ```rust
/// use serde::{Deserialize, Serialize};
/// use warehouse::document::Document;
///
/// #[derive(Serialize, Deserialize, PartialEq, Debug)]
/// struct Book { id: String, title: String }
///
/// let book = Book { id: "b1".into(), title: "Dune".into() };
/// let doc = Document::from_object(&book).unwrap();
/// assert_eq!(doc.id(), Some("b1"));
/// assert_eq!(doc.to_object::<Book>().unwrap(), book);
/// ```
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Document {
    fields: Map<String, Value>,
}

impl Document {
    pub fn new() -> Self {
        Document { fields: Map::new() }
    }

    /// Serializes `object` into a document. Fails if it does not serialize to a JSON object.
    pub fn from_object<T: Serialize + ?Sized>(object: &T) -> WarehouseResult<Self> {
        match serde_json::to_value(object)? {
            Value::Object(fields) => Ok(Document { fields }),
            other => {
                log::error!("Cannot store a non-object value as document: {}", other);
                Err(WarehouseError::new(
                    "Document must serialize to a JSON object",
                    ErrorKind::ObjectMappingError,
                ))
            }
        }
    }

    /// Deserializes the document into `T`. System properties are visible to `T` and
    /// ignored unless it declares them.
    pub fn to_object<T: DeserializeOwned>(&self) -> WarehouseResult<T> {
        Ok(serde_json::from_value(Value::Object(self.fields.clone()))?)
    }

    /// Consuming variant of [`Document::to_object`].
    pub fn into_object<T: DeserializeOwned>(self) -> WarehouseResult<T> {
        Ok(serde_json::from_value(Value::Object(self.fields))?)
    }

    /// Returns the document's `id`, if it has a string id.
    pub fn id(&self) -> Option<&str> {
        self.fields.get(DOC_ID).and_then(Value::as_str)
    }

    /// Writes `id` into the document.
    ///
    /// A document that already carries a different id is rejected: the id used to
    /// address a document must be the id stored inside it.
    pub fn set_id(&mut self, id: &str) -> WarehouseResult<()> {
        match self.fields.get(DOC_ID) {
            None | Some(Value::Null) => {
                self.fields.insert(DOC_ID.to_string(), Value::String(id.to_string()));
                Ok(())
            }
            Some(Value::String(existing)) if existing == id => Ok(()),
            Some(existing) => {
                log::error!("Document id {} does not match requested id {}", existing, id);
                Err(WarehouseError::new(
                    &format!("Document id {} does not match requested id {}", existing, id),
                    ErrorKind::InvalidId,
                ))
            }
        }
    }

    /// Gets a field by dotted path, e.g. `address.city`.
    pub fn get(&self, field_name: &str) -> Option<&Value> {
        let mut segments = field_name.split(crate::common::FIELD_SEPARATOR);
        let mut current = self.fields.get(segments.next()?)?;
        for segment in segments {
            current = current.as_object()?.get(segment)?;
        }
        Some(current)
    }

    /// Like [`Document::get`], but fails with `FilterError` on a malformed path such
    /// as `a..b` instead of reporting the field as missing.
    pub fn get_field(&self, field_name: &str) -> WarehouseResult<Option<&Value>> {
        let segments = field_segments(field_name)?;
        let mut current = match self.fields.get(segments[0]) {
            Some(value) => value,
            None => return Ok(None),
        };
        for segment in &segments[1..] {
            match current.as_object().and_then(|object| object.get(*segment)) {
                Some(value) => current = value,
                None => return Ok(None),
            }
        }
        Ok(Some(current))
    }

    /// Sets a top level field, replacing any previous value.
    pub fn put<V: Into<Value>>(&mut self, field_name: &str, value: V) -> WarehouseResult<()> {
        if field_segments(field_name)?.len() != 1 {
            return Err(WarehouseError::new(
                &format!("Cannot put nested field '{}'", field_name),
                ErrorKind::InvalidOperation,
            ));
        }
        self.fields.insert(field_name.to_string(), value.into());
        Ok(())
    }

    pub fn remove(&mut self, field_name: &str) -> Option<Value> {
        self.fields.remove(field_name)
    }

    pub fn contains_key(&self, field_name: &str) -> bool {
        self.get(field_name).is_some()
    }

    /// Resolves a partition key path such as `/address/city` against this document.
    pub fn partition_value(&self, partition_key_path: &str) -> Option<&Value> {
        let path = partition_key_path.trim_start_matches(PARTITION_PATH_SEPARATOR);
        let mut segments = path.split(PARTITION_PATH_SEPARATOR);
        let mut current = self.fields.get(segments.next()?)?;
        for segment in segments {
            current = current.as_object()?.get(segment)?;
        }
        Some(current)
    }

    pub fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl From<Map<String, Value>> for Document {
    fn from(fields: Map<String, Value>) -> Self {
        Document { fields }
    }
}

impl From<Document> for Value {
    fn from(document: Document) -> Self {
        Value::Object(document.fields)
    }
}

impl TryFrom<Value> for Document {
    type Error = WarehouseError;

    fn try_from(value: Value) -> WarehouseResult<Self> {
        match value {
            Value::Object(fields) => Ok(Document { fields }),
            other => Err(WarehouseError::new(
                &format!("Expected a JSON object, found {}", other),
                ErrorKind::ObjectMappingError,
            )),
        }
    }
}

impl Display for Document {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", Value::Object(self.fields.clone()))
    }
}

/// Creates a [`Document`] from a JSON object literal.
///
/// ```rust
/// use warehouse::doc;
///
/// let doc = doc!({ "id": "a", "qty": 3 });
/// assert_eq!(doc.id(), Some("a"));
/// ```
#[macro_export]
macro_rules! doc {
    ($($json:tt)+) => {
        $crate::document::Document::try_from($crate::serde_json::json!($($json)+))
            .expect("doc! requires a JSON object literal")
    };
}
