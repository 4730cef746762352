//! Shared error taxonomy
//!
//! Every operation failure that crosses a crate boundary maps onto one of
//! these variants; HTTP handlers translate them via `status_code()`.

use thiserror::Error;

/// Core error type for TaskDesk operations.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Record store rejected {op} on {table}: {message}")]
    StoreWrite {
        table: &'static str,
        op: &'static str,
        message: String,
    },

    #[error("Blob upload failed: {0}")]
    BlobUpload(String),

    #[error("Blob delete failed: {0}")]
    BlobDelete(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl CoreError {
    pub fn status_code(&self) -> u16 {
        match self {
            CoreError::NotFound { .. } => 404,
            CoreError::Validation(_) => 422,
            CoreError::StoreWrite { .. } => 400,
            CoreError::BlobUpload(_) | CoreError::BlobDelete(_) => 400,
            CoreError::Config(_) | CoreError::Internal(_) => 500,
        }
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            CoreError::NotFound { .. } => "not_found",
            CoreError::Validation(_) => "validation_failed",
            CoreError::StoreWrite { .. } => "store_write_failed",
            CoreError::BlobUpload(_) => "blob_upload_failed",
            CoreError::BlobDelete(_) => "blob_delete_failed",
            CoreError::Config(_) => "configuration_error",
            CoreError::Internal(_) => "internal_error",
        }
    }
}
