//! Generic handlers for attachment-capable entities
//!
//! One handler set serves all five parent kinds; `ParentModel` supplies
//! the kind, the write model, and the per-kind route toggles.

use axum::{
    extract::{Multipart, Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, patch, put},
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;
use td_attachments::{AttachOutcome, DetachOutcome};
use td_core::{time, RecordId};
use td_models::{ParentModel, ParentRef, Status};
use td_store::Filter;
use validator::Validate;

use crate::error::{ApiError, ApiResult};
use crate::extractors::{upload_from_field, AppState, CreateBody};

pub fn router<M: ParentModel>() -> Router<AppState> {
    let mut router = Router::new()
        .route("/", get(list::<M>).post(create::<M>))
        .route("/:id", get(fetch::<M>).put(update::<M>).delete(remove::<M>))
        .route("/:id/attachment", put(replace_attachment::<M>));
    if M::HAS_STATUS {
        router = router.route("/:id/status", patch(set_status::<M>));
    }
    router
}

#[derive(Debug, Deserialize)]
pub struct ListParams {
    pub project_id: Option<RecordId>,
}

/// GET /{entity}
pub async fn list<M: ParentModel>(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> ApiResult<Json<Vec<M>>> {
    let filter = match params.project_id {
        Some(id) if M::PROJECT_SCOPED => Filter::Eq("project_id", json!(id.to_string())),
        _ => Filter::All,
    };

    let rows = state.records.select(M::KIND.into(), filter).await?;
    let mut items = Vec::with_capacity(rows.len());
    for row in rows {
        items.push(serde_json::from_value(row).map_err(ApiError::internal)?);
    }
    Ok(Json(items))
}

/// GET /{entity}/{id}
pub async fn fetch<M: ParentModel>(
    State(state): State<AppState>,
    Path(id): Path<RecordId>,
) -> ApiResult<Json<M>> {
    let row = state
        .records
        .find_by_id(M::KIND.into(), id)
        .await?
        .ok_or_else(|| ApiError::not_found(M::KIND.as_str(), id))?;
    Ok(Json(serde_json::from_value(row).map_err(ApiError::internal)?))
}

/// POST /{entity} — JSON draft, or multipart draft plus file.
pub async fn create<M: ParentModel>(
    State(state): State<AppState>,
    body: CreateBody<M::Draft>,
) -> ApiResult<impl IntoResponse> {
    body.draft.validate().map_err(ApiError::validation)?;
    let payload = serde_json::to_value(&body.draft).map_err(ApiError::internal)?;

    let outcome = state
        .coordinator
        .attach(M::KIND, payload, body.upload)
        .await?;
    Ok((StatusCode::CREATED, Json(outcome)))
}

/// PUT /{entity}/{id} — full update; the attachment field is untouched.
pub async fn update<M: ParentModel>(
    State(state): State<AppState>,
    Path(id): Path<RecordId>,
    Json(draft): Json<M::Draft>,
) -> ApiResult<Json<M>> {
    draft.validate().map_err(ApiError::validation)?;

    let mut changes = serde_json::to_value(&draft).map_err(ApiError::internal)?;
    if let Some(obj) = changes.as_object_mut() {
        obj.insert("updated_at".into(), json!(time::now()));
    }

    let row = state.records.update(M::KIND.into(), id, changes).await?;
    Ok(Json(serde_json::from_value(row).map_err(ApiError::internal)?))
}

/// DELETE /{entity}/{id} — parent plus attachment cleanup.
pub async fn remove<M: ParentModel>(
    State(state): State<AppState>,
    Path(id): Path<RecordId>,
) -> ApiResult<Json<DetachOutcome>> {
    let outcome = state
        .coordinator
        .detach_and_delete(ParentRef::new(M::KIND, id))
        .await?;
    Ok(Json(outcome))
}

/// PUT /{entity}/{id}/attachment — multipart, replaces the attachment.
pub async fn replace_attachment<M: ParentModel>(
    State(state): State<AppState>,
    Path(id): Path<RecordId>,
    mut multipart: Multipart,
) -> ApiResult<Json<AttachOutcome>> {
    let mut upload = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::validation(e.to_string()))?
    {
        if field.name() == Some("file") {
            upload = upload_from_field(field).await?;
        }
    }
    let content =
        upload.ok_or_else(|| ApiError::validation("multipart body is missing a `file` part"))?;

    let outcome = state
        .coordinator
        .replace_attachment(ParentRef::new(M::KIND, id), content)
        .await?;
    Ok(Json(outcome))
}

#[derive(Debug, Deserialize)]
pub struct StatusBody {
    pub status: Status,
}

/// PATCH /{entity}/{id}/status — status-only update.
pub async fn set_status<M: ParentModel>(
    State(state): State<AppState>,
    Path(id): Path<RecordId>,
    Json(body): Json<StatusBody>,
) -> ApiResult<Json<M>> {
    let changes = json!({ "status": body.status, "updated_at": time::now() });
    let row = state.records.update(M::KIND.into(), id, changes).await?;
    Ok(Json(serde_json::from_value(row).map_err(ApiError::internal)?))
}
