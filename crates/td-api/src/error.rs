//! HTTP error mapping
//!
//! Wraps the shared error taxonomy and renders it as a JSON body with a
//! stable machine-readable code.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use td_attachments::CoordinatorError;
use td_core::CoreError;
use td_store::StoreError;

#[derive(Debug)]
pub struct ApiError(pub CoreError);

pub type ApiResult<T> = Result<T, ApiError>;

impl ApiError {
    pub fn not_found(entity: &'static str, id: impl std::fmt::Display) -> Self {
        Self(CoreError::NotFound {
            entity,
            id: id.to_string(),
        })
    }

    pub fn validation(message: impl std::fmt::Display) -> Self {
        Self(CoreError::Validation(message.to_string()))
    }

    pub fn internal(message: impl std::fmt::Display) -> Self {
        Self(CoreError::Internal(message.to_string()))
    }
}

#[derive(Serialize)]
struct ErrorBody {
    error: &'static str,
    message: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.0.status_code())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        let body = ErrorBody {
            error: self.0.error_code(),
            message: self.0.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        Self(err)
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        let core = match err {
            StoreError::RowNotFound { table, id } => CoreError::NotFound {
                entity: table.as_str(),
                id: id.to_string(),
            },
            StoreError::Write { table, op, message } => CoreError::StoreWrite {
                table: table.as_str(),
                op: op.as_str(),
                message,
            },
            StoreError::MalformedRow { table, message } => {
                CoreError::Internal(format!("malformed {table} row: {message}"))
            }
            StoreError::Backend(message) => CoreError::Internal(message),
        };
        Self(core)
    }
}

impl From<CoordinatorError> for ApiError {
    fn from(err: CoordinatorError) -> Self {
        match err {
            CoordinatorError::ParentNotFound { kind, id } => {
                Self::not_found(kind.as_str(), id)
            }
            CoordinatorError::FileNotFound(id) => Self::not_found("file", id),
            CoordinatorError::Upload(message) => Self(CoreError::BlobUpload(message)),
            CoordinatorError::Malformed { table, message } => {
                Self(CoreError::Internal(format!("malformed {table} row: {message}")))
            }
            CoordinatorError::Store(err) => err.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use td_core::RecordId;
    use td_models::ParentKind;

    #[test]
    fn test_coordinator_error_mapping() {
        let err: ApiError = CoordinatorError::ParentNotFound {
            kind: ParentKind::Task,
            id: RecordId::new(),
        }
        .into();
        assert_eq!(err.0.status_code(), 404);

        let err: ApiError = CoordinatorError::Store(StoreError::Write {
            table: td_store::Table::Files,
            op: td_store::StoreOp::Insert,
            message: "rejected".into(),
        })
        .into();
        assert_eq!(err.0.status_code(), 400);
        assert_eq!(err.0.error_code(), "store_write_failed");
    }
}
