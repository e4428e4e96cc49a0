use crate::common::{DEFAULT_STRING_INDEX_PRECISION, PARTITION_PATH_SEPARATOR};
use crate::errors::{ErrorKind, WarehouseError, WarehouseResult};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt::Display;

/// Address of a collection inside a database.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct CollectionLink {
    database: String,
    collection: String,
}

impl CollectionLink {
    pub fn new(database: &str, collection: &str) -> Self {
        CollectionLink {
            database: database.to_string(),
            collection: collection.to_string(),
        }
    }

    pub fn database(&self) -> &str {
        &self.database
    }

    pub fn collection(&self) -> &str {
        &self.collection
    }

    /// Resource link of a document in this collection.
    pub fn document_link(&self, id: &str) -> String {
        format!("{}/docs/{}", self, id)
    }
}

impl Display for CollectionLink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "dbs/{}/colls/{}", self.database, self.collection)
    }
}

/// Value of a document's partition key, sent along with point operations on a
/// partitioned collection.
#[derive(Clone, Debug, PartialEq)]
pub struct PartitionKey(Value);

impl PartitionKey {
    pub fn new<V: Into<Value>>(value: V) -> Self {
        PartitionKey(value.into())
    }

    pub fn value(&self) -> &Value {
        &self.0
    }

    /// Renders the key as the single element JSON array used on the wire.
    pub fn to_json_array(&self) -> String {
        Value::Array(vec![self.0.clone()]).to_string()
    }
}

impl From<&str> for PartitionKey {
    fn from(value: &str) -> Self {
        PartitionKey(Value::String(value.to_string()))
    }
}

impl From<String> for PartitionKey {
    fn from(value: String) -> Self {
        PartitionKey(Value::String(value))
    }
}

impl From<i64> for PartitionKey {
    fn from(value: i64) -> Self {
        PartitionKey(Value::from(value))
    }
}

impl From<Value> for PartitionKey {
    fn from(value: Value) -> Self {
        PartitionKey(value)
    }
}

impl Display for PartitionKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Partition key definition of a collection.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PartitionKeyDefinition {
    pub paths: Vec<String>,
    #[serde(default = "hash_kind")]
    pub kind: String,
}

fn hash_kind() -> String {
    "Hash".to_string()
}

impl PartitionKeyDefinition {
    /// Creates a hash partition definition for a path such as `/tenant/region`.
    pub fn new(path: &str) -> WarehouseResult<Self> {
        validate_partition_key_path(path)?;
        Ok(PartitionKeyDefinition {
            paths: vec![path.to_string()],
            kind: hash_kind(),
        })
    }

    pub fn path(&self) -> Option<&str> {
        self.paths.first().map(String::as_str)
    }
}

/// Checks that a partition key path is of the form `/segment[/segment...]`.
pub fn validate_partition_key_path(path: &str) -> WarehouseResult<()> {
    let valid = path.starts_with(PARTITION_PATH_SEPARATOR)
        && path[1..]
            .split(PARTITION_PATH_SEPARATOR)
            .all(|segment| !segment.is_empty() && !segment.contains(['"', '\'', '*']));
    if valid {
        Ok(())
    } else {
        log::error!("Invalid partition key path {}", path);
        Err(WarehouseError::new(
            &format!("Invalid partition key path '{}', expected '/field[/field...]'", path),
            ErrorKind::ConfigurationError,
        ))
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum IndexKind {
    Range,
    Hash,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum DataType {
    String,
    Number,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Index {
    pub kind: IndexKind,
    pub data_type: DataType,
    #[serde(default)]
    pub precision: i32,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct IncludedPath {
    pub path: String,
    #[serde(default)]
    pub indexes: Vec<Index>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ExcludedPath {
    pub path: String,
}

/// Indexing policy a collection is created with.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct IndexingPolicy {
    pub indexing_mode: String,
    pub automatic: bool,
    pub included_paths: Vec<IncludedPath>,
    pub excluded_paths: Vec<ExcludedPath>,
}

impl IndexingPolicy {
    /// A consistent policy indexing every path with a string range index of the given
    /// precision (`-1` means maximum precision).
    pub fn string_range(precision: i32) -> Self {
        IndexingPolicy {
            indexing_mode: "consistent".to_string(),
            automatic: true,
            included_paths: vec![IncludedPath {
                path: "/*".to_string(),
                indexes: vec![Index {
                    kind: IndexKind::Range,
                    data_type: DataType::String,
                    precision,
                }],
            }],
            excluded_paths: Vec::new(),
        }
    }
}

impl Default for IndexingPolicy {
    fn default() -> Self {
        IndexingPolicy::string_range(DEFAULT_STRING_INDEX_PRECISION)
    }
}

/// Definition of a collection, used to create it and returned when reading it.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CollectionOptions {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub partition_key: Option<PartitionKeyDefinition>,
    #[serde(default)]
    pub indexing_policy: IndexingPolicy,
    /// Provisioned throughput, sent as a request option rather than in the body.
    #[serde(skip)]
    pub offer_throughput: Option<u32>,
}

impl CollectionOptions {
    pub fn new(id: &str) -> Self {
        CollectionOptions {
            id: id.to_string(),
            partition_key: None,
            indexing_policy: IndexingPolicy::default(),
            offer_throughput: None,
        }
    }

    pub fn with_partition_key(mut self, path: &str) -> WarehouseResult<Self> {
        self.partition_key = Some(PartitionKeyDefinition::new(path)?);
        Ok(self)
    }

    pub fn with_indexing_policy(mut self, indexing_policy: IndexingPolicy) -> Self {
        self.indexing_policy = indexing_policy;
        self
    }

    pub fn with_offer_throughput(mut self, offer_throughput: u32) -> Self {
        self.offer_throughput = Some(offer_throughput);
        self
    }

    pub fn partition_key_path(&self) -> Option<&str> {
        self.partition_key.as_ref().and_then(|pk| pk.path())
    }
}
