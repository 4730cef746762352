//! Application state and request extractors

use std::sync::Arc;

use axum::{
    async_trait,
    extract::{
        multipart::{Field, Multipart},
        FromRequest, Request,
    },
    http::header::CONTENT_TYPE,
    Json,
};
use serde::de::DeserializeOwned;
use td_attachments::{AttachmentCoordinator, UploadContent};
use td_store::RecordStore;

use crate::error::ApiError;

/// Shared handler state.
#[derive(Clone)]
pub struct AppState {
    pub records: Arc<dyn RecordStore>,
    pub coordinator: Arc<AttachmentCoordinator>,
}

impl AppState {
    pub fn new(records: Arc<dyn RecordStore>, coordinator: Arc<AttachmentCoordinator>) -> Self {
        Self {
            records,
            coordinator,
        }
    }
}

/// Create-request body: plain JSON, or multipart with a `payload` JSON part
/// and an optional `file` part. The shape is picked by Content-Type.
pub struct CreateBody<D> {
    pub draft: D,
    pub upload: Option<UploadContent>,
}

#[async_trait]
impl<S, D> FromRequest<S> for CreateBody<D>
where
    S: Send + Sync,
    D: DeserializeOwned + Send,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let is_multipart = req
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|ct| ct.starts_with("multipart/form-data"));

        if !is_multipart {
            let Json(draft) = Json::<D>::from_request(req, state)
                .await
                .map_err(|e| ApiError::validation(e.body_text()))?;
            return Ok(Self {
                draft,
                upload: None,
            });
        }

        let mut multipart = Multipart::from_request(req, state)
            .await
            .map_err(|e| ApiError::validation(e.to_string()))?;

        let mut draft = None;
        let mut upload = None;
        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| ApiError::validation(e.to_string()))?
        {
            match field.name() {
                Some("payload") => {
                    let text = field
                        .text()
                        .await
                        .map_err(|e| ApiError::validation(e.to_string()))?;
                    draft = Some(
                        serde_json::from_str(&text).map_err(|e| ApiError::validation(e))?,
                    );
                }
                Some("file") => {
                    upload = upload_from_field(field).await?;
                }
                _ => {}
            }
        }

        let draft =
            draft.ok_or_else(|| ApiError::validation("multipart body is missing a `payload` part"))?;
        Ok(Self { draft, upload })
    }
}

/// Read one multipart file field into upload content. An empty unnamed
/// field counts as no upload.
pub(crate) async fn upload_from_field(
    field: Field<'_>,
) -> Result<Option<UploadContent>, ApiError> {
    let filename = field.file_name().map(str::to_owned);
    let content_type = field.content_type().map(str::to_owned);
    let data = field
        .bytes()
        .await
        .map_err(|e| ApiError::validation(e.to_string()))?;

    if filename.is_none() && data.is_empty() {
        return Ok(None);
    }

    let mut content = UploadContent::new(filename.unwrap_or_else(|| "upload".into()), data);
    if let Some(ct) = content_type {
        content = content.with_content_type(ct);
    }
    Ok(Some(content))
}
