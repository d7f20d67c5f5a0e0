//! Domain error kinds. Every fallible operation in the service layer
//! returns one of these; the API layer maps them onto HTTP statuses.

use crate::storage::StoreError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    /// A required field is missing or malformed
    #[error("{0}")]
    Validation(String),

    /// A unique constraint was violated
    #[error("{field} already exists")]
    Conflict { field: &'static str },

    /// The actor is not allowed to perform the operation
    #[error("{0}")]
    Forbidden(String),

    /// The referenced resource does not exist
    #[error("{0} not found")]
    NotFound(&'static str),

    /// Missing or invalid credential
    #[error("{0}")]
    Auth(String),

    /// The persistence layer failed
    #[error(transparent)]
    Store(StoreError),
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Constraint { field } => AppError::Conflict { field },
            other => AppError::Store(other),
        }
    }
}
