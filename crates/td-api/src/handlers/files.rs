//! File handlers
//!
//! Uploads land here as multipart. A bare upload becomes an unattached
//! file; one carrying `parent_kind`/`parent_id` form fields goes through
//! the coordinator's replace path so the parent's current attachment is
//! swapped out safely.

use axum::{
    extract::{Multipart, Path, Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use serde_json::{json, Value};
use td_attachments::{FileMetadata, UploadContent};
use td_core::RecordId;
use td_models::{ParentKind, ParentRef};
use td_store::{Filter, Table};
use tracing::info;

use crate::error::{ApiError, ApiResult};
use crate::extractors::{upload_from_field, AppState};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list).post(create))
        .route("/:id", get(fetch).delete(remove))
}

#[derive(Debug, Deserialize)]
pub struct ListParams {
    pub project_id: Option<RecordId>,
}

/// GET /files
pub async fn list(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> ApiResult<Json<Vec<FileMetadata>>> {
    let filter = match params.project_id {
        Some(id) => Filter::Eq("parent_id", json!(id.to_string())),
        None => Filter::All,
    };

    let rows = state.records.select(Table::Files, filter).await?;
    let mut items = Vec::with_capacity(rows.len());
    for row in rows {
        let metadata: FileMetadata =
            serde_json::from_value(row).map_err(ApiError::internal)?;
        if params.project_id.is_some() && metadata.parent_kind != Some(ParentKind::Project) {
            continue;
        }
        items.push(metadata);
    }
    Ok(Json(items))
}

/// GET /files/{id}
pub async fn fetch(
    State(state): State<AppState>,
    Path(id): Path<RecordId>,
) -> ApiResult<Json<FileMetadata>> {
    let row = state
        .records
        .find_by_id(Table::Files, id)
        .await?
        .ok_or_else(|| ApiError::not_found("file", id))?;
    Ok(Json(serde_json::from_value(row).map_err(ApiError::internal)?))
}

/// POST /files — multipart `file` part, optional `parent_kind`/`parent_id`.
pub async fn create(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> ApiResult<(StatusCode, Json<Value>)> {
    let mut upload: Option<UploadContent> = None;
    let mut parent_kind: Option<String> = None;
    let mut parent_id: Option<String> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::validation(e.to_string()))?
    {
        match field.name() {
            Some("file") => upload = upload_from_field(field).await?,
            Some("parent_kind") => {
                parent_kind = Some(
                    field
                        .text()
                        .await
                        .map_err(|e| ApiError::validation(e.to_string()))?,
                )
            }
            Some("parent_id") => {
                parent_id = Some(
                    field
                        .text()
                        .await
                        .map_err(|e| ApiError::validation(e.to_string()))?,
                )
            }
            _ => {}
        }
    }

    let content =
        upload.ok_or_else(|| ApiError::validation("multipart body is missing a `file` part"))?;

    let body = match (parent_kind, parent_id) {
        (None, None) => {
            let metadata = state.coordinator.store_unattached(content).await?;
            info!(file = %metadata.id, name = %metadata.name, "unattached upload accepted");
            serde_json::to_value(&metadata).map_err(ApiError::internal)?
        }
        (Some(kind), Some(id)) => {
            let kind = ParentKind::from_str(&kind)
                .ok_or_else(|| ApiError::validation(format!("unknown parent kind `{kind}`")))?;
            let id: RecordId = id
                .parse()
                .map_err(|_| ApiError::validation("parent_id is not a valid ID"))?;

            let outcome = state
                .coordinator
                .replace_attachment(ParentRef::new(kind, id), content)
                .await?;
            serde_json::to_value(&outcome).map_err(ApiError::internal)?
        }
        _ => {
            return Err(ApiError::validation(
                "parent_kind and parent_id must be given together",
            ))
        }
    };

    Ok((StatusCode::CREATED, Json(body)))
}

/// DELETE /files/{id}
pub async fn remove(
    State(state): State<AppState>,
    Path(id): Path<RecordId>,
) -> ApiResult<Json<Value>> {
    let outcome = state.coordinator.delete_file(id).await?;
    let mut body = json!({ "message": "File deleted successfully" });
    if !outcome.warnings.is_empty() {
        body["warnings"] = serde_json::to_value(&outcome.warnings).map_err(ApiError::internal)?;
    }
    Ok(Json(body))
}
