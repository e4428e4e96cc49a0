use crate::auth::ResourceType;
use thiserror::Error;
use warehouse::errors::{ErrorKind, WarehouseError};

/// Sub-status the service attaches to a 404 when the owner of the addressed
/// resource (the collection of a document) does not exist.
pub const OWNER_RESOURCE_NOT_FOUND: u32 = 1003;

/// Failure of a single REST call.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CosmosError {
    /// The request never produced a response.
    #[error("Request failed: {0}")]
    Transport(String),
    /// The response could not be decoded.
    #[error("Invalid response: {0}")]
    InvalidResponse(String),
    /// The service answered with an error status.
    #[error("Service returned {status}: {message}")]
    Service {
        status: u16,
        sub_status: Option<u32>,
        message: String,
        resource_type: ResourceType,
        query: bool,
    },
}

impl From<reqwest::Error> for CosmosError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            CosmosError::InvalidResponse(err.to_string())
        } else {
            CosmosError::Transport(err.to_string())
        }
    }
}

impl From<serde_json::Error> for CosmosError {
    fn from(err: serde_json::Error) -> Self {
        CosmosError::InvalidResponse(err.to_string())
    }
}

impl From<CosmosError> for WarehouseError {
    fn from(err: CosmosError) -> Self {
        let message = err.to_string();
        match err {
            CosmosError::Transport(_) => WarehouseError::new(&message, ErrorKind::NetworkError),
            CosmosError::InvalidResponse(_) => {
                WarehouseError::new(&message, ErrorKind::BackendError)
            }
            CosmosError::Service {
                status,
                sub_status,
                resource_type,
                query,
                ..
            } => WarehouseError::new(&message, status_kind(status, sub_status, resource_type, query))
                .with_status_code(status),
        }
    }
}

/// Maps an error status to the kind the façade reacts to.
///
/// A 404 on a document call means the document is missing unless the service says
/// its collection is gone, either through the sub-status or because the call was a
/// query, which only has a collection to miss.
pub fn status_kind(
    status: u16,
    sub_status: Option<u32>,
    resource_type: ResourceType,
    query: bool,
) -> ErrorKind {
    match status {
        404 if resource_type == ResourceType::Document
            && (query || sub_status == Some(OWNER_RESOURCE_NOT_FOUND)) =>
        {
            ErrorKind::CollectionNotFound
        }
        404 => ErrorKind::NotFound,
        409 => ErrorKind::Conflict,
        412 => ErrorKind::PreconditionFailed,
        400 => ErrorKind::InvalidOperation,
        401 | 403 => ErrorKind::SecurityError,
        429 => ErrorKind::RequestRateTooLarge,
        _ => ErrorKind::BackendError,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service(status: u16, sub_status: Option<u32>, resource_type: ResourceType) -> CosmosError {
        CosmosError::Service {
            status,
            sub_status,
            message: "boom".to_string(),
            resource_type,
            query: false,
        }
    }

    #[test]
    fn test_not_found_mapping() {
        assert_eq!(
            status_kind(404, None, ResourceType::Document, false),
            ErrorKind::NotFound
        );
        assert_eq!(
            status_kind(404, Some(1003), ResourceType::Document, false),
            ErrorKind::CollectionNotFound
        );
        assert_eq!(
            status_kind(404, None, ResourceType::Document, true),
            ErrorKind::CollectionNotFound
        );
        assert_eq!(
            status_kind(404, Some(1003), ResourceType::Collection, false),
            ErrorKind::NotFound
        );
    }

    #[test]
    fn test_other_statuses() {
        let kind = |status| status_kind(status, None, ResourceType::Document, false);
        assert_eq!(kind(409), ErrorKind::Conflict);
        assert_eq!(kind(412), ErrorKind::PreconditionFailed);
        assert_eq!(kind(400), ErrorKind::InvalidOperation);
        assert_eq!(kind(401), ErrorKind::SecurityError);
        assert_eq!(kind(403), ErrorKind::SecurityError);
        assert_eq!(kind(429), ErrorKind::RequestRateTooLarge);
        assert_eq!(kind(500), ErrorKind::BackendError);
        assert_eq!(kind(503), ErrorKind::BackendError);
    }

    #[test]
    fn test_into_warehouse_error() {
        let err: WarehouseError = service(409, None, ResourceType::Database).into();
        assert_eq!(err.kind(), &ErrorKind::Conflict);
        assert_eq!(err.status_code(), Some(409));
        assert!(err.message().contains("boom"));

        let err: WarehouseError = CosmosError::Transport("refused".into()).into();
        assert_eq!(err.kind(), &ErrorKind::NetworkError);
        assert_eq!(err.status_code(), None);

        let err: WarehouseError = CosmosError::InvalidResponse("eof".into()).into();
        assert_eq!(err.kind(), &ErrorKind::BackendError);
    }

    #[test]
    fn test_serde_error_is_invalid_response() {
        let err = serde_json::from_str::<serde_json::Value>("{").err().unwrap();
        assert!(matches!(
            CosmosError::from(err),
            CosmosError::InvalidResponse(_)
        ));
    }
}
