//! File metadata model

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use td_core::{time, RecordId};
use td_models::{ParentKind, ParentRef};

use crate::blob::{BlobHandle, StoredBlob};

/// One row of the `files` table.
///
/// The blob handle is stored explicitly next to the locator; nothing ever
/// parses a handle back out of a locator string. `parent_kind` and
/// `parent_id` are both null (unattached file) or both set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileMetadata {
    pub id: RecordId,
    /// Display name, as uploaded.
    pub name: String,
    pub content_type: String,
    pub size: u64,
    /// URL the bytes can be retrieved from.
    pub locator: String,
    /// Opaque blob store handle backing the locator.
    pub handle: BlobHandle,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_kind: Option<ParentKind>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<RecordId>,
    #[serde(with = "time::flexible")]
    pub uploaded_at: chrono::DateTime<chrono::Utc>,
}

impl FileMetadata {
    /// Build a fresh row for an upload that just landed in the blob store.
    pub fn for_upload(content: &UploadContent, blob: &StoredBlob, parent: Option<ParentRef>) -> Self {
        Self {
            id: RecordId::new(),
            name: content.filename.clone(),
            content_type: content.resolved_content_type(),
            size: content.data.len() as u64,
            locator: blob.locator.clone(),
            handle: blob.handle.clone(),
            parent_kind: parent.map(|p| p.kind),
            parent_id: parent.map(|p| p.id),
            uploaded_at: time::now(),
        }
    }

    pub fn parent_ref(&self) -> Option<ParentRef> {
        match (self.parent_kind, self.parent_id) {
            (Some(kind), Some(id)) => Some(ParentRef::new(kind, id)),
            _ => None,
        }
    }
}

/// Binary content accepted by upload operations.
#[derive(Debug, Clone)]
pub struct UploadContent {
    pub filename: String,
    pub content_type: Option<String>,
    pub data: Bytes,
}

impl UploadContent {
    pub fn new(filename: impl Into<String>, data: Bytes) -> Self {
        Self {
            filename: filename.into(),
            content_type: None,
            data,
        }
    }

    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    /// Declared content type, or a guess from the filename.
    pub fn resolved_content_type(&self) -> String {
        self.content_type.clone().unwrap_or_else(|| {
            mime_guess::from_path(&self.filename)
                .first_or_octet_stream()
                .to_string()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn blob() -> StoredBlob {
        StoredBlob {
            handle: BlobHandle::new("abc.pdf"),
            locator: "/blobs/abc.pdf".into(),
            digest: "d41d8cd9".into(),
        }
    }

    #[test]
    fn test_content_type_fallback() {
        let content = UploadContent::new("report.pdf", Bytes::from("x"));
        assert_eq!(content.resolved_content_type(), "application/pdf");

        let declared = content.with_content_type("application/x-custom");
        assert_eq!(declared.resolved_content_type(), "application/x-custom");

        let unknown = UploadContent::new("mystery", Bytes::from("x"));
        assert_eq!(unknown.resolved_content_type(), "application/octet-stream");
    }

    #[test]
    fn test_parent_ref_requires_both_fields() {
        let content = UploadContent::new("a.txt", Bytes::from("x"));
        let unattached = FileMetadata::for_upload(&content, &blob(), None);
        assert!(unattached.parent_ref().is_none());

        let parent = ParentRef::new(ParentKind::Project, RecordId::new());
        let attached = FileMetadata::for_upload(&content, &blob(), Some(parent));
        assert_eq!(attached.parent_ref(), Some(parent));
    }

    #[test]
    fn test_row_roundtrip() {
        let content = UploadContent::new("a.txt", Bytes::from("hello"));
        let parent = ParentRef::new(ParentKind::Task, RecordId::new());
        let meta = FileMetadata::for_upload(&content, &blob(), Some(parent));

        let row = serde_json::to_value(&meta).unwrap();
        assert_eq!(row["parent_kind"], "task");
        assert_eq!(row["handle"], "abc.pdf");
        assert_eq!(row["size"], 5);

        let back: FileMetadata = serde_json::from_value(row).unwrap();
        assert_eq!(back.id, meta.id);
        assert_eq!(back.parent_ref(), Some(parent));
    }
}
