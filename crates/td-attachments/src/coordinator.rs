//! Attachment coordinator
//!
//! The record store and the blob store fail independently and share no
//! transaction. Every operation here commits in a fixed order, compensates
//! each step that can fail after the commit point, and reports best-effort
//! cleanup failures as structured warnings instead of swallowing them.
//!
//! Ordering rules:
//! - The parent row is the commit point: it is inserted before any blob
//!   store call, and an attachment failure never rolls it back.
//! - Uploads resolve before any metadata write.
//! - Replacement creates the new attachment completely before touching the
//!   old one.
//! - Cleanup always deletes the metadata row before its blob, and leaves
//!   the blob alive if the row delete fails. An orphaned blob is a warning;
//!   a metadata row pointing at a deleted blob never happens.
//! - Operations on one parent are serialized through a per-parent lock.

use std::sync::Arc;

use dashmap::DashMap;
use serde::Serialize;
use serde_json::{json, Value};
use td_core::{time, RecordId};
use td_models::{ParentKind, ParentRef};
use td_store::{Filter, RecordStore, StoreError, Table};
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{info, instrument, warn};

use crate::blob::BlobStore;
use crate::model::{FileMetadata, UploadContent};

/// Coordinator errors — the fatal outcomes only. Partial failures of an
/// otherwise-committed operation travel on the outcome structs instead.
#[derive(Debug, Error)]
pub enum CoordinatorError {
    #[error("{kind} not found: {id}")]
    ParentNotFound { kind: ParentKind, id: RecordId },

    #[error("file not found: {0}")]
    FileNotFound(RecordId),

    #[error("blob upload failed: {0}")]
    Upload(String),

    #[error("malformed {table} row: {message}")]
    Malformed { table: Table, message: String },

    #[error(transparent)]
    Store(#[from] StoreError),
}

pub type CoordinatorResult<T> = Result<T, CoordinatorError>;

/// Step at which an attachment failed after the parent row committed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AttachStage {
    Upload,
    MetadataInsert,
    ParentPatch,
}

/// Attachment failure on an otherwise-successful operation. The parent row
/// stands; the attachment can be retried independently.
#[derive(Debug, Clone, Serialize)]
pub struct AttachmentFailure {
    pub stage: AttachStage,
    pub message: String,
}

/// Best-effort cleanup step that could not be completed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CleanupAction {
    BlobDelete,
    MetadataDelete,
    MetadataLookup,
    AttachmentClear,
}

#[derive(Debug, Clone, Serialize)]
pub struct CleanupWarning {
    pub action: CleanupAction,
    pub target: String,
    pub message: String,
}

impl CleanupWarning {
    fn new(action: CleanupAction, target: impl Into<String>, message: impl ToString) -> Self {
        Self {
            action,
            target: target.into(),
            message: message.to_string(),
        }
    }
}

/// Result of `attach` / `replace_attachment`.
#[derive(Debug, Serialize)]
pub struct AttachOutcome {
    pub parent: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<FileMetadata>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attachment_failure: Option<AttachmentFailure>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<CleanupWarning>,
}

impl AttachOutcome {
    fn bare(parent: Value) -> Self {
        Self {
            parent,
            metadata: None,
            attachment_failure: None,
            warnings: Vec::new(),
        }
    }
}

/// Result of `detach_and_delete` / `delete_file`.
#[derive(Debug, Serialize)]
pub struct DetachOutcome {
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<CleanupWarning>,
}

enum Registered {
    Committed { parent: Value, metadata: FileMetadata },
    Failed(AttachmentFailure),
}

/// Coordinates parent rows, file metadata rows, and blobs across the two
/// external stores.
pub struct AttachmentCoordinator {
    records: Arc<dyn RecordStore>,
    blobs: Arc<dyn BlobStore>,
    locks: DashMap<ParentRef, Arc<Mutex<()>>>,
}

impl AttachmentCoordinator {
    pub fn new(records: Arc<dyn RecordStore>, blobs: Arc<dyn BlobStore>) -> Self {
        Self {
            records,
            blobs,
            locks: DashMap::new(),
        }
    }

    fn lock_for(&self, parent: ParentRef) -> Arc<Mutex<()>> {
        self.locks.entry(parent).or_default().clone()
    }

    /// Create a parent row and, if content is given, its attachment.
    ///
    /// The parent insert is the commit point: once it succeeds the
    /// operation succeeds, and any attachment trouble is reported on the
    /// outcome rather than raised.
    #[instrument(skip(self, payload, content), fields(kind = %kind))]
    pub async fn attach(
        &self,
        kind: ParentKind,
        payload: Value,
        content: Option<UploadContent>,
    ) -> CoordinatorResult<AttachOutcome> {
        let table = Table::from(kind);
        let mut row = match payload {
            Value::Object(map) => map,
            _ => {
                return Err(CoordinatorError::Malformed {
                    table,
                    message: "payload is not a JSON object".into(),
                })
            }
        };

        let id = row
            .get("id")
            .and_then(Value::as_str)
            .and_then(|s| s.parse::<RecordId>().ok())
            .unwrap_or_else(RecordId::new);
        row.insert("id".into(), json!(id.to_string()));

        let now = time::now();
        row.insert("created_at".into(), json!(now));
        row.insert("updated_at".into(), json!(now));
        row.entry("attachment").or_insert(Value::Null);

        let parent_ref = ParentRef::new(kind, id);
        let lock = self.lock_for(parent_ref);
        let _guard = lock.lock().await;

        let parent = self.records.insert(table, Value::Object(row)).await?;
        info!(parent = %parent_ref, "parent row created");

        let Some(content) = content else {
            return Ok(AttachOutcome::bare(parent));
        };

        let mut warnings = Vec::new();
        match self
            .upload_and_register(parent_ref, &content, &mut warnings)
            .await
        {
            Registered::Committed { parent, metadata } => Ok(AttachOutcome {
                parent,
                metadata: Some(metadata),
                attachment_failure: None,
                warnings,
            }),
            Registered::Failed(failure) => Ok(AttachOutcome {
                parent,
                metadata: None,
                attachment_failure: Some(failure),
                warnings,
            }),
        }
    }

    /// Replace (or set) the attachment of an existing parent.
    ///
    /// The new attachment is fully committed before the old one is touched;
    /// old-attachment cleanup is best-effort and reported as warnings.
    #[instrument(skip(self, content), fields(parent = %parent_ref))]
    pub async fn replace_attachment(
        &self,
        parent_ref: ParentRef,
        content: UploadContent,
    ) -> CoordinatorResult<AttachOutcome> {
        let table = Table::from(parent_ref.kind);
        let lock = self.lock_for(parent_ref);
        let _guard = lock.lock().await;

        let parent = self
            .records
            .find_by_id(table, parent_ref.id)
            .await?
            .ok_or(CoordinatorError::ParentNotFound {
                kind: parent_ref.kind,
                id: parent_ref.id,
            })?;

        let old_locator = parent
            .get("attachment")
            .and_then(Value::as_str)
            .map(str::to_owned);

        let mut warnings = Vec::new();
        let (parent, metadata, failure) = match self
            .upload_and_register(parent_ref, &content, &mut warnings)
            .await
        {
            Registered::Committed { parent, metadata } => (parent, Some(metadata), None),
            Registered::Failed(failure) => (parent, None, Some(failure)),
        };

        // Old attachment cleanup only once the new one is in place.
        if failure.is_none() {
            if let Some(locator) = old_locator {
                self.cleanup_by_locator(&locator, &mut warnings).await;
            }
        }

        Ok(AttachOutcome {
            parent,
            metadata,
            attachment_failure: failure,
            warnings,
        })
    }

    /// Delete a parent row together with its attachment.
    ///
    /// Blob and metadata cleanup are best-effort; the parent row delete is
    /// last and is the only fatal step. A second call on a deleted parent
    /// yields `ParentNotFound` with no side effects.
    #[instrument(skip(self), fields(parent = %parent_ref))]
    pub async fn detach_and_delete(
        &self,
        parent_ref: ParentRef,
    ) -> CoordinatorResult<DetachOutcome> {
        let table = Table::from(parent_ref.kind);
        let lock = self.lock_for(parent_ref);

        {
            let _guard = lock.lock().await;

            let parent = self
                .records
                .find_by_id(table, parent_ref.id)
                .await?
                .ok_or(CoordinatorError::ParentNotFound {
                    kind: parent_ref.kind,
                    id: parent_ref.id,
                })?;

            let mut warnings = Vec::new();
            if let Some(locator) = parent.get("attachment").and_then(Value::as_str) {
                self.cleanup_by_locator(locator, &mut warnings).await;
            }

            self.records.delete(table, parent_ref.id).await?;
            info!(parent = %parent_ref, warnings = warnings.len(), "parent deleted");

            self.locks.remove(&parent_ref);
            return Ok(DetachOutcome { warnings });
        }
    }

    /// Store a file with no owning parent.
    ///
    /// Upload failure is fatal here (there is no committed parent to win);
    /// a metadata insert failure compensates with a blob delete.
    #[instrument(skip(self, content), fields(filename = %content.filename))]
    pub async fn store_unattached(
        &self,
        content: UploadContent,
    ) -> CoordinatorResult<FileMetadata> {
        let blob = self
            .blobs
            .upload(
                content.data.clone(),
                &content.resolved_content_type(),
                &content.filename,
            )
            .await
            .map_err(|e| CoordinatorError::Upload(e.to_string()))?;

        let metadata = FileMetadata::for_upload(&content, &blob, None);
        let row = match serde_json::to_value(&metadata) {
            Ok(row) => row,
            Err(e) => {
                self.delete_blob_logged(&metadata).await;
                return Err(CoordinatorError::Malformed {
                    table: Table::Files,
                    message: e.to_string(),
                });
            }
        };

        if let Err(e) = self.records.insert(Table::Files, row).await {
            self.delete_blob_logged(&metadata).await;
            return Err(e.into());
        }

        info!(file = %metadata.id, "unattached file stored");
        Ok(metadata)
    }

    /// Delete a file row, its blob, and its parent's reference to it.
    ///
    /// The row delete is fatal; the blob delete and the parent attachment
    /// clear are best-effort warnings.
    #[instrument(skip(self), fields(file = %file_id))]
    pub async fn delete_file(&self, file_id: RecordId) -> CoordinatorResult<DetachOutcome> {
        let row = self
            .records
            .find_by_id(Table::Files, file_id)
            .await?
            .ok_or(CoordinatorError::FileNotFound(file_id))?;

        let metadata: FileMetadata =
            serde_json::from_value(row).map_err(|e| CoordinatorError::Malformed {
                table: Table::Files,
                message: e.to_string(),
            })?;

        let parent_ref = metadata.parent_ref();
        let guard = match parent_ref {
            Some(parent) => Some(self.lock_for(parent)),
            None => None,
        };
        let _guard = match &guard {
            Some(lock) => Some(lock.lock().await),
            None => None,
        };

        let mut warnings = Vec::new();

        // Row first: a failed row delete must leave the blob alive.
        self.records.delete(Table::Files, file_id).await?;

        if let Err(e) = self.blobs.delete(&metadata.handle).await {
            warn!(handle = %metadata.handle, error = %e, "orphaned blob left behind");
            warnings.push(CleanupWarning::new(
                CleanupAction::BlobDelete,
                metadata.handle.to_string(),
                e,
            ));
        }

        if let Some(parent) = parent_ref {
            self.clear_parent_attachment(parent, &metadata.locator, &mut warnings)
                .await;
        }

        info!(file = %file_id, warnings = warnings.len(), "file deleted");
        Ok(DetachOutcome { warnings })
    }

    /// Upload content and wire it to an already-committed parent row.
    ///
    /// All failures past the upload compensate so that no metadata row ever
    /// outlives its blob.
    async fn upload_and_register(
        &self,
        parent_ref: ParentRef,
        content: &UploadContent,
        warnings: &mut Vec<CleanupWarning>,
    ) -> Registered {
        let blob = match self
            .blobs
            .upload(
                content.data.clone(),
                &content.resolved_content_type(),
                &content.filename,
            )
            .await
        {
            Ok(blob) => blob,
            Err(e) => {
                warn!(parent = %parent_ref, error = %e, "attachment upload failed");
                return Registered::Failed(AttachmentFailure {
                    stage: AttachStage::Upload,
                    message: e.to_string(),
                });
            }
        };

        let metadata = FileMetadata::for_upload(content, &blob, Some(parent_ref));
        let row = match serde_json::to_value(&metadata) {
            Ok(row) => row,
            Err(e) => {
                self.delete_blob_best_effort(&metadata, warnings).await;
                return Registered::Failed(AttachmentFailure {
                    stage: AttachStage::MetadataInsert,
                    message: e.to_string(),
                });
            }
        };

        if let Err(e) = self.records.insert(Table::Files, row).await {
            warn!(parent = %parent_ref, error = %e, "metadata insert failed, compensating");
            self.delete_blob_best_effort(&metadata, warnings).await;
            return Registered::Failed(AttachmentFailure {
                stage: AttachStage::MetadataInsert,
                message: e.to_string(),
            });
        }

        let patch = json!({ "attachment": metadata.locator, "updated_at": time::now() });
        match self
            .records
            .update(Table::from(parent_ref.kind), parent_ref.id, patch)
            .await
        {
            Ok(parent) => Registered::Committed { parent, metadata },
            Err(e) => {
                warn!(parent = %parent_ref, error = %e, "parent patch failed, compensating");
                self.remove_file_pair(&metadata, warnings).await;
                Registered::Failed(AttachmentFailure {
                    stage: AttachStage::ParentPatch,
                    message: e.to_string(),
                })
            }
        }
    }

    /// Resolve the metadata row behind a locator and remove the row/blob
    /// pair. Best-effort throughout.
    async fn cleanup_by_locator(&self, locator: &str, warnings: &mut Vec<CleanupWarning>) {
        let rows = match self
            .records
            .select(Table::Files, Filter::Eq("locator", json!(locator)))
            .await
        {
            Ok(rows) => rows,
            Err(e) => {
                warn!(locator, error = %e, "metadata lookup failed");
                warnings.push(CleanupWarning::new(
                    CleanupAction::MetadataLookup,
                    locator,
                    e,
                ));
                return;
            }
        };

        let Some(row) = rows.into_iter().next() else {
            // Pre-existing drift: the parent named a locator with no row.
            warn!(locator, "no metadata row behind locator");
            return;
        };

        match serde_json::from_value::<FileMetadata>(row) {
            Ok(metadata) => self.remove_file_pair(&metadata, warnings).await,
            Err(e) => {
                warn!(locator, error = %e, "unreadable metadata row");
                warnings.push(CleanupWarning::new(
                    CleanupAction::MetadataLookup,
                    locator,
                    e,
                ));
            }
        }
    }

    /// Remove a metadata row and its blob, row first. If the row delete
    /// fails the blob stays alive, so the row never references a deleted
    /// blob.
    async fn remove_file_pair(&self, metadata: &FileMetadata, warnings: &mut Vec<CleanupWarning>) {
        match self.records.delete(Table::Files, metadata.id).await {
            Ok(()) | Err(StoreError::RowNotFound { .. }) => {
                self.delete_blob_best_effort(metadata, warnings).await;
            }
            Err(e) => {
                warn!(file = %metadata.id, error = %e, "metadata delete failed, keeping blob");
                warnings.push(CleanupWarning::new(
                    CleanupAction::MetadataDelete,
                    metadata.id.to_string(),
                    e,
                ));
            }
        }
    }

    async fn delete_blob_best_effort(
        &self,
        metadata: &FileMetadata,
        warnings: &mut Vec<CleanupWarning>,
    ) {
        if let Err(e) = self.blobs.delete(&metadata.handle).await {
            warn!(handle = %metadata.handle, error = %e, "orphaned blob left behind");
            warnings.push(CleanupWarning::new(
                CleanupAction::BlobDelete,
                metadata.handle.to_string(),
                e,
            ));
        }
    }

    async fn delete_blob_logged(&self, metadata: &FileMetadata) {
        if let Err(e) = self.blobs.delete(&metadata.handle).await {
            warn!(handle = %metadata.handle, error = %e, "orphaned blob left behind");
        }
    }

    /// Null out the parent's attachment field if it still points at the
    /// given locator.
    async fn clear_parent_attachment(
        &self,
        parent_ref: ParentRef,
        locator: &str,
        warnings: &mut Vec<CleanupWarning>,
    ) {
        let table = Table::from(parent_ref.kind);

        let parent = match self.records.find_by_id(table, parent_ref.id).await {
            Ok(parent) => parent,
            Err(e) => {
                warn!(parent = %parent_ref, error = %e, "parent lookup failed");
                warnings.push(CleanupWarning::new(
                    CleanupAction::AttachmentClear,
                    parent_ref.to_string(),
                    e,
                ));
                return;
            }
        };

        let still_points_here = parent
            .as_ref()
            .and_then(|p| p.get("attachment"))
            .and_then(Value::as_str)
            .is_some_and(|current| current == locator);
        if !still_points_here {
            return;
        }

        let patch = json!({ "attachment": Value::Null, "updated_at": time::now() });
        if let Err(e) = self.records.update(table, parent_ref.id, patch).await {
            warn!(parent = %parent_ref, error = %e, "attachment clear failed");
            warnings.push(CleanupWarning::new(
                CleanupAction::AttachmentClear,
                parent_ref.to_string(),
                e,
            ));
        }
    }
}
