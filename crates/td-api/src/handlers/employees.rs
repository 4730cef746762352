//! Employee handlers — plain CRUD, no attachment routes.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use serde_json::json;
use td_core::{time, RecordId};
use td_models::{Employee, EmployeeDraft};
use td_store::{Filter, Table};
use validator::Validate;

use crate::error::{ApiError, ApiResult};
use crate::extractors::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list).post(create))
        .route("/:id", get(fetch).put(update).delete(remove))
}

/// GET /employees
pub async fn list(State(state): State<AppState>) -> ApiResult<Json<Vec<Employee>>> {
    let rows = state.records.select(Table::Employees, Filter::All).await?;
    let mut items = Vec::with_capacity(rows.len());
    for row in rows {
        items.push(serde_json::from_value(row).map_err(ApiError::internal)?);
    }
    Ok(Json(items))
}

/// GET /employees/{id}
pub async fn fetch(
    State(state): State<AppState>,
    Path(id): Path<RecordId>,
) -> ApiResult<Json<Employee>> {
    let row = state
        .records
        .find_by_id(Table::Employees, id)
        .await?
        .ok_or_else(|| ApiError::not_found("employee", id))?;
    Ok(Json(serde_json::from_value(row).map_err(ApiError::internal)?))
}

/// POST /employees
pub async fn create(
    State(state): State<AppState>,
    Json(draft): Json<EmployeeDraft>,
) -> ApiResult<impl IntoResponse> {
    draft.validate().map_err(ApiError::validation)?;

    let mut row = serde_json::to_value(&draft).map_err(ApiError::internal)?;
    if let Some(obj) = row.as_object_mut() {
        let now = time::now();
        obj.insert("id".into(), json!(RecordId::new().to_string()));
        obj.insert("created_at".into(), json!(now));
        obj.insert("updated_at".into(), json!(now));
    }

    let stored = state.records.insert(Table::Employees, row).await?;
    let employee: Employee = serde_json::from_value(stored).map_err(ApiError::internal)?;
    Ok((StatusCode::CREATED, Json(employee)))
}

/// PUT /employees/{id}
pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<RecordId>,
    Json(draft): Json<EmployeeDraft>,
) -> ApiResult<Json<Employee>> {
    draft.validate().map_err(ApiError::validation)?;

    let mut changes = serde_json::to_value(&draft).map_err(ApiError::internal)?;
    if let Some(obj) = changes.as_object_mut() {
        obj.insert("updated_at".into(), json!(time::now()));
    }

    let row = state.records.update(Table::Employees, id, changes).await?;
    Ok(Json(serde_json::from_value(row).map_err(ApiError::internal)?))
}

/// DELETE /employees/{id}
pub async fn remove(
    State(state): State<AppState>,
    Path(id): Path<RecordId>,
) -> ApiResult<StatusCode> {
    state.records.delete(Table::Employees, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
