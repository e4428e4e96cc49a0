use backtrace::Backtrace;
use serde::{de, ser};
use std::error::Error;
use std::fmt::{Debug, Display, Formatter};
use std::result::Result;
use std::sync::Arc;

/// Error kinds for Warehouse operations
///
/// Every failure coming out of a document store is classified into one of these
/// kinds. Only [`ErrorKind::NotFound`] receives special treatment from the
/// [`Warehouse`](crate::warehouse::Warehouse) façade; all other kinds are handed
/// back to the caller exactly as the store produced them.
///
/// # Examples
///
/// ```rust
/// use warehouse::errors::{ErrorKind, WarehouseError, WarehouseResult};
///
/// fn example() -> WarehouseResult<()> {
///     Err(WarehouseError::new("Document not found", ErrorKind::NotFound))
/// }
///
/// assert!(example().unwrap_err().is_not_found());
/// ```
#[derive(Debug, PartialEq, Eq, Clone)]
pub enum ErrorKind {
    // Resource lookup errors
    /// The requested document (or database) does not exist
    NotFound,
    /// The collection that owns the requested resource does not exist
    CollectionNotFound,

    // Write conflicts
    /// A resource with the same id already exists
    Conflict,
    /// An optimistic concurrency check failed
    PreconditionFailed,

    // Throughput
    /// The store rejected the request because the provisioned throughput was exceeded
    RequestRateTooLarge,

    // Caller errors
    /// The provided id is empty or does not match the document
    InvalidId,
    /// The operation is not valid in the current context
    InvalidOperation,
    /// The façade has not been initialized, or its collection was removed
    NotInitialized,
    /// Error during filter construction or evaluation
    FilterError,
    /// Error mapping an object to or from a document
    ObjectMappingError,
    /// Invalid or incomplete configuration
    ConfigurationError,

    // Remote errors
    /// Authentication or authorization failure
    SecurityError,
    /// Transport level failure talking to the store
    NetworkError,
    /// Any other failure reported by the store
    BackendError,
}

impl Display for ErrorKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorKind::NotFound => write!(f, "Not found"),
            ErrorKind::CollectionNotFound => write!(f, "Collection not found"),
            ErrorKind::Conflict => write!(f, "Conflict"),
            ErrorKind::PreconditionFailed => write!(f, "Precondition failed"),
            ErrorKind::RequestRateTooLarge => write!(f, "Request rate too large"),
            ErrorKind::InvalidId => write!(f, "Invalid ID"),
            ErrorKind::InvalidOperation => write!(f, "Invalid operation"),
            ErrorKind::NotInitialized => write!(f, "Not initialized"),
            ErrorKind::FilterError => write!(f, "Filter error"),
            ErrorKind::ObjectMappingError => write!(f, "Object mapping error"),
            ErrorKind::ConfigurationError => write!(f, "Configuration error"),
            ErrorKind::SecurityError => write!(f, "Security error"),
            ErrorKind::NetworkError => write!(f, "Network error"),
            ErrorKind::BackendError => write!(f, "Backend error"),
        }
    }
}

/// Custom Warehouse error type.
///
/// `WarehouseError` carries a message, an [`ErrorKind`], an optional cause and the
/// backtrace captured when it was created. Stores may also attach the HTTP status
/// code they received, which is kept for diagnostics only.
///
/// # Examples
///
/// ```rust
/// use warehouse::errors::{ErrorKind, WarehouseError};
///
/// let cause = WarehouseError::new("connection reset", ErrorKind::NetworkError);
/// let err = WarehouseError::new_with_cause("query failed", ErrorKind::BackendError, cause);
/// assert_eq!(err.kind(), &ErrorKind::BackendError);
/// assert!(err.cause().is_some());
/// ```
#[derive(Clone)]
pub struct WarehouseError {
    message: String,
    error_kind: ErrorKind,
    status_code: Option<u16>,
    cause: Option<Box<WarehouseError>>,
    backtrace: Arc<Backtrace>,
}

impl WarehouseError {
    /// Creates a new `WarehouseError` with the specified message and error kind.
    pub fn new(message: &str, error_kind: ErrorKind) -> Self {
        WarehouseError {
            message: message.to_string(),
            error_kind,
            status_code: None,
            cause: None,
            backtrace: Arc::new(Backtrace::new()),
        }
    }

    /// Creates a new `WarehouseError` with a cause error.
    ///
    /// The cause is preserved and exposed through [`Error::source`].
    pub fn new_with_cause(message: &str, error_kind: ErrorKind, cause: WarehouseError) -> Self {
        WarehouseError {
            message: message.to_string(),
            error_kind,
            status_code: None,
            cause: Some(Box::new(cause)),
            backtrace: Arc::new(Backtrace::new()),
        }
    }

    /// Attaches the status code reported by a remote store.
    pub fn with_status_code(mut self, status_code: u16) -> Self {
        self.status_code = Some(status_code);
        self
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn kind(&self) -> &ErrorKind {
        &self.error_kind
    }

    pub fn status_code(&self) -> Option<u16> {
        self.status_code
    }

    pub fn cause(&self) -> Option<&WarehouseError> {
        self.cause.as_deref()
    }

    /// Returns `true` if the error reports a missing document or database.
    #[inline]
    pub fn is_not_found(&self) -> bool {
        self.error_kind == ErrorKind::NotFound
    }

    /// Returns `true` if the error reports an already existing resource.
    #[inline]
    pub fn is_conflict(&self) -> bool {
        self.error_kind == ErrorKind::Conflict
    }
}

impl Display for WarehouseError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl Debug for WarehouseError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        // print error message with stack trace followed by cause
        match &self.cause {
            Some(cause) => write!(f, "{} ({})\nCaused by: {:?}", self.message, self.error_kind, cause),
            None => write!(f, "{} ({})\n{:?}", self.message, self.error_kind, self.backtrace),
        }
    }
}

impl Error for WarehouseError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match &self.cause {
            Some(cause) => Some(cause.as_ref()),
            None => None,
        }
    }
}

/// A result type alias for Warehouse operations.
pub type WarehouseResult<T> = Result<T, WarehouseError>;

impl de::Error for WarehouseError {
    fn custom<T: Display>(msg: T) -> Self {
        WarehouseError::new(&msg.to_string(), ErrorKind::ObjectMappingError)
    }
}

impl ser::Error for WarehouseError {
    fn custom<T: Display>(msg: T) -> Self {
        WarehouseError::new(&msg.to_string(), ErrorKind::ObjectMappingError)
    }
}

impl From<serde_json::Error> for WarehouseError {
    fn from(err: serde_json::Error) -> Self {
        WarehouseError::new(
            &format!("JSON mapping error: {}", err),
            ErrorKind::ObjectMappingError,
        )
    }
}
