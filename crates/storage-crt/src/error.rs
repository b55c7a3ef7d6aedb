//! Error types for CRT storage operations.

use rusty_transfer_storage::StorageError;
use thiserror::Error;

/// Errors specific to the CRT storage client.
#[derive(Error, Debug)]
pub enum CrtError {
    /// AWS SDK error.
    #[error("AWS SDK error: {message}")]
    SdkError { message: String, retryable: bool },

    /// A request could not be assembled (missing required builder field).
    #[error("Request build error: {0}")]
    BuildError(String),

    /// A multipart copy response was missing a field S3 always returns.
    #[error("Incomplete response from {operation}: missing {field}")]
    IncompleteResponse {
        operation: &'static str,
        field: &'static str,
    },
}

impl From<CrtError> for StorageError {
    fn from(err: CrtError) -> Self {
        match err {
            CrtError::SdkError { message, retryable } => {
                StorageError::NetworkError { message, retryable }
            }
            CrtError::BuildError(message) => StorageError::InvalidConfig { message },
            err @ CrtError::IncompleteResponse { .. } => StorageError::Other {
                message: err.to_string(),
            },
        }
    }
}

impl From<aws_sdk_s3::error::BuildError> for CrtError {
    fn from(err: aws_sdk_s3::error::BuildError) -> Self {
        CrtError::BuildError(err.to_string())
    }
}
