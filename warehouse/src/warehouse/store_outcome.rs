use std::fmt::Display;

/// Result of an insert-if-absent [`store`](super::WarehouseProvider::store) call.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StoreOutcome {
    /// The document did not exist and was created under this id.
    Created(String),
    /// A document with this id already existed and was left untouched.
    Existing(String),
}

impl StoreOutcome {
    /// The id of the document, whichever way the call went.
    pub fn id(&self) -> &str {
        match self {
            StoreOutcome::Created(id) | StoreOutcome::Existing(id) => id,
        }
    }

    #[inline]
    pub fn is_created(&self) -> bool {
        matches!(self, StoreOutcome::Created(_))
    }
}

impl Display for StoreOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StoreOutcome::Created(id) => write!(f, "created({})", id),
            StoreOutcome::Existing(id) => write!(f, "existing({})", id),
        }
    }
}
