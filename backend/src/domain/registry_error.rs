//! Failure taxonomy of the registry and search use-cases.

use serde_json::json;
use tracing::error;

use super::ports::{PublishError, RecordStoreError};
use super::{Collection, Error, RecordId, RecordIdValidationError, ValidationErrors};

/// Why a registry or search operation failed.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RegistryError {
    /// The identifier is not a positive integer.
    #[error("invalid {collection} id: {reason}")]
    InvalidId {
        collection: Collection,
        reason: RecordIdValidationError,
    },
    /// The payload (or search input) violates the schema.
    #[error("{subject} failed validation: {errors}")]
    ValidationFailed {
        subject: &'static str,
        errors: ValidationErrors,
    },
    /// No record under the identifier.
    #[error("{collection} {id} not found")]
    NotFound { collection: Collection, id: RecordId },
    /// A record already exists under the identifier.
    #[error("{collection} {id} already exists")]
    Conflict { collection: Collection, id: RecordId },
    /// The record store failed.
    #[error(transparent)]
    StoreUnavailable(#[from] RecordStoreError),
    /// The site was stored but its notification was not accepted. The record
    /// is not rolled back.
    #[error("cantiere {id} was stored but its notification failed: {source}")]
    PublishFailed { id: RecordId, source: PublishError },
}

impl From<RegistryError> for Error {
    fn from(value: RegistryError) -> Self {
        let message = value.to_string();
        match value {
            RegistryError::InvalidId { reason, .. } => Error::invalid_request(message)
                .with_details(json!({
                    "field": "id",
                    "code": "invalid_id",
                    "reason": reason.to_string(),
                })),
            RegistryError::ValidationFailed { errors, .. } => Error::invalid_request(message)
                .with_details(json!({
                    "code": "validation_failed",
                    "errors": errors,
                })),
            RegistryError::NotFound { .. } => Error::not_found(message),
            RegistryError::Conflict { .. } => Error::conflict(message),
            RegistryError::StoreUnavailable(source) => {
                error!(error = %source, "record store call failed");
                Error::service_unavailable("record store unavailable")
            }
            RegistryError::PublishFailed { id, source } => {
                error!(%id, error = %source, "site notification was not published");
                Error::bad_gateway(format!(
                    "cantiere {id} was stored but its notification was not published"
                ))
            }
        }
    }
}
