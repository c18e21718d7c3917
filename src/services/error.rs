//! Errors raised by the service layer.

use thiserror::Error;

use crate::embedding::{EncoderError, IndexError};
use crate::storage::StorageError;

/// Errors that can occur while building caches, extracting relations or searching.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("encoder error: {0}")]
    Encoder(#[from] EncoderError),

    #[error("index error: {0}")]
    Index(#[from] IndexError),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error("query must not be empty")]
    EmptyQuery,
}

/// Result type for service operations.
pub type ServiceResult<T> = Result<T, ServiceError>;
