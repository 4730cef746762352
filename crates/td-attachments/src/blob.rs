//! Blob store contract and backends
//!
//! Opaque byte storage: `upload` returns a handle plus a retrievable
//! locator, `delete` takes the handle back. Handles are never reused —
//! every upload, including replacements, gets a fresh one.

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use async_trait::async_trait;
use bytes::Bytes;
use sha2::{Digest, Sha256};
use thiserror::Error;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{debug, instrument};
use uuid::Uuid;

/// Blob store errors
#[derive(Debug, Error)]
pub enum BlobError {
    #[error("blob not found: {0}")]
    NotFound(String),
    #[error("upload rejected: {0}")]
    UploadFailed(String),
    #[error("delete rejected: {0}")]
    DeleteFailed(String),
    #[error("invalid blob key: {0}")]
    InvalidKey(String),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

pub type BlobResult<T> = Result<T, BlobError>;

/// Opaque handle to one stored blob.
#[derive(Debug, Clone, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct BlobHandle(String);

impl BlobHandle {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for BlobHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Result of a successful upload.
#[derive(Debug, Clone)]
pub struct StoredBlob {
    pub handle: BlobHandle,
    /// URL the uploaded bytes can be retrieved from.
    pub locator: String,
    /// SHA256 of the uploaded bytes.
    pub digest: String,
}

/// Blob store contract.
///
/// Uploads and deletes commit independently of the record store; the
/// coordinator reconciles the two.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Store bytes under a fresh handle.
    async fn upload(&self, data: Bytes, content_type: &str, filename: &str)
        -> BlobResult<StoredBlob>;

    /// Delete the blob behind the handle. Deleting an absent blob is not an
    /// error.
    async fn delete(&self, handle: &BlobHandle) -> BlobResult<()>;

    /// Whether a blob exists for the handle.
    async fn exists(&self, handle: &BlobHandle) -> BlobResult<bool>;

    /// Backend name for logging.
    fn name(&self) -> &str;
}

fn sha256_hex(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hex::encode(hasher.finalize())
}

/// Generate a unique blob key, keeping the original extension.
pub fn generate_blob_key(filename: &str) -> String {
    let uuid = Uuid::new_v4();
    let ext = Path::new(filename)
        .extension()
        .and_then(|s| s.to_str())
        .unwrap_or("");

    if ext.is_empty() {
        uuid.to_string()
    } else {
        format!("{uuid}.{ext}")
    }
}

/// In-memory blob store for development and tests.
pub struct MemoryBlobStore {
    blobs: tokio::sync::RwLock<std::collections::HashMap<String, Bytes>>,
}

impl Default for MemoryBlobStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryBlobStore {
    pub fn new() -> Self {
        Self {
            blobs: tokio::sync::RwLock::new(std::collections::HashMap::new()),
        }
    }

    /// Number of live blobs, for invariant checks in tests.
    pub async fn len(&self) -> usize {
        self.blobs.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.blobs.read().await.is_empty()
    }
}

#[async_trait]
impl BlobStore for MemoryBlobStore {
    async fn upload(
        &self,
        data: Bytes,
        _content_type: &str,
        filename: &str,
    ) -> BlobResult<StoredBlob> {
        let key = generate_blob_key(filename);
        let digest = sha256_hex(&data);

        let mut blobs = self.blobs.write().await;
        blobs.insert(key.clone(), data);

        Ok(StoredBlob {
            locator: format!("/blobs/{key}"),
            handle: BlobHandle::new(key),
            digest,
        })
    }

    async fn delete(&self, handle: &BlobHandle) -> BlobResult<()> {
        let mut blobs = self.blobs.write().await;
        blobs.remove(handle.as_str());
        Ok(())
    }

    async fn exists(&self, handle: &BlobHandle) -> BlobResult<bool> {
        let blobs = self.blobs.read().await;
        Ok(blobs.contains_key(handle.as_str()))
    }

    fn name(&self) -> &str {
        "memory"
    }
}

/// Local filesystem blob store.
pub struct LocalBlobStore {
    root: PathBuf,
    base_url: String,
}

impl LocalBlobStore {
    pub fn new(root: impl AsRef<Path>, base_url: impl Into<String>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
            base_url: base_url.into(),
        }
    }

    /// Store under a temp directory.
    pub fn temp() -> std::io::Result<Self> {
        let dir = std::env::temp_dir().join("taskdesk-blobs");
        std::fs::create_dir_all(&dir)?;
        Ok(Self::new(dir, "/blobs"))
    }

    fn resolve_path(&self, key: &str) -> BlobResult<PathBuf> {
        // Prevent directory traversal
        if key.contains("..") || key.starts_with('/') || key.starts_with('\\') {
            return Err(BlobError::InvalidKey(key.to_string()));
        }
        Ok(self.root.join(key))
    }
}

#[async_trait]
impl BlobStore for LocalBlobStore {
    #[instrument(skip(self, data), fields(backend = "local"))]
    async fn upload(
        &self,
        data: Bytes,
        _content_type: &str,
        filename: &str,
    ) -> BlobResult<StoredBlob> {
        let key = generate_blob_key(filename);
        let path = self.resolve_path(&key)?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }

        let digest = sha256_hex(&data);

        let mut file = fs::File::create(&path).await?;
        file.write_all(&data).await?;
        file.sync_all().await?;

        debug!(path = ?path, size = data.len(), "blob stored");

        Ok(StoredBlob {
            locator: format!("{}/{key}", self.base_url),
            handle: BlobHandle::new(key),
            digest,
        })
    }

    #[instrument(skip(self), fields(backend = "local"))]
    async fn delete(&self, handle: &BlobHandle) -> BlobResult<()> {
        let path = self.resolve_path(handle.as_str())?;

        if path.exists() {
            fs::remove_file(&path).await?;
            debug!(path = ?path, "blob deleted");
        }

        Ok(())
    }

    async fn exists(&self, handle: &BlobHandle) -> BlobResult<bool> {
        let path = self.resolve_path(handle.as_str())?;
        Ok(path.exists())
    }

    fn name(&self) -> &str {
        "local"
    }
}

/// Fault-injecting blob store wrapper for failure-path tests.
pub struct FlakyBlobStore<B> {
    inner: B,
    fail_upload: Mutex<bool>,
    fail_delete: Mutex<bool>,
}

impl<B: BlobStore> FlakyBlobStore<B> {
    pub fn new(inner: B) -> Self {
        Self {
            inner,
            fail_upload: Mutex::new(false),
            fail_delete: Mutex::new(false),
        }
    }

    pub fn inner(&self) -> &B {
        &self.inner
    }

    pub fn fail_uploads(&self, fail: bool) {
        *self.fail_upload.lock().expect("flag poisoned") = fail;
    }

    pub fn fail_deletes(&self, fail: bool) {
        *self.fail_delete.lock().expect("flag poisoned") = fail;
    }
}

#[async_trait]
impl<B: BlobStore> BlobStore for FlakyBlobStore<B> {
    async fn upload(
        &self,
        data: Bytes,
        content_type: &str,
        filename: &str,
    ) -> BlobResult<StoredBlob> {
        if *self.fail_upload.lock().expect("flag poisoned") {
            return Err(BlobError::UploadFailed("injected fault".into()));
        }
        self.inner.upload(data, content_type, filename).await
    }

    async fn delete(&self, handle: &BlobHandle) -> BlobResult<()> {
        if *self.fail_delete.lock().expect("flag poisoned") {
            return Err(BlobError::DeleteFailed("injected fault".into()));
        }
        self.inner.delete(handle).await
    }

    async fn exists(&self, handle: &BlobHandle) -> BlobResult<bool> {
        self.inner.exists(handle).await
    }

    fn name(&self) -> &str {
        self.inner.name()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_memory_upload_and_delete() {
        let store = MemoryBlobStore::new();
        let blob = store
            .upload(Bytes::from("hello"), "text/plain", "hello.txt")
            .await
            .unwrap();

        assert!(blob.handle.as_str().ends_with(".txt"));
        assert!(blob.locator.contains(blob.handle.as_str()));
        assert!(store.exists(&blob.handle).await.unwrap());

        store.delete(&blob.handle).await.unwrap();
        assert!(!store.exists(&blob.handle).await.unwrap());
    }

    #[tokio::test]
    async fn test_delete_absent_blob_is_ok() {
        let store = MemoryBlobStore::new();
        store
            .delete(&BlobHandle::new("never-uploaded.bin"))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_fresh_handle_per_upload() {
        let store = MemoryBlobStore::new();
        let a = store
            .upload(Bytes::from("same"), "text/plain", "same.txt")
            .await
            .unwrap();
        let b = store
            .upload(Bytes::from("same"), "text/plain", "same.txt")
            .await
            .unwrap();

        assert_ne!(a.handle, b.handle);
        assert_eq!(a.digest, b.digest);
        assert_eq!(store.len().await, 2);
    }

    #[tokio::test]
    async fn test_local_path_traversal_rejected() {
        let store = LocalBlobStore::temp().unwrap();
        let err = store
            .delete(&BlobHandle::new("../../etc/passwd"))
            .await
            .unwrap_err();
        assert!(matches!(err, BlobError::InvalidKey(_)));
    }

    #[tokio::test]
    async fn test_local_roundtrip() {
        let store = LocalBlobStore::temp().unwrap();
        let blob = store
            .upload(Bytes::from("on disk"), "text/plain", "disk.txt")
            .await
            .unwrap();

        assert!(store.exists(&blob.handle).await.unwrap());
        store.delete(&blob.handle).await.unwrap();
        assert!(!store.exists(&blob.handle).await.unwrap());
    }

    #[tokio::test]
    async fn test_flaky_wrapper() {
        let store = FlakyBlobStore::new(MemoryBlobStore::new());

        store.fail_uploads(true);
        let err = store
            .upload(Bytes::from("x"), "text/plain", "x.txt")
            .await
            .unwrap_err();
        assert!(matches!(err, BlobError::UploadFailed(_)));

        store.fail_uploads(false);
        let blob = store
            .upload(Bytes::from("x"), "text/plain", "x.txt")
            .await
            .unwrap();

        store.fail_deletes(true);
        assert!(store.delete(&blob.handle).await.is_err());
        assert!(store.exists(&blob.handle).await.unwrap());
    }

    #[test]
    fn test_generate_blob_key() {
        let key = generate_blob_key("report.xlsx");
        assert!(key.ends_with(".xlsx"));

        let no_ext = generate_blob_key("noext");
        assert!(!no_ext.contains('.'));
    }
}
