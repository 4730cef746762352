//! # td-attachments
//!
//! Blob store backends, file metadata, and the attachment coordinator.
//!
//! The coordinator is the one place that writes to both external systems —
//! the record store and the blob store. Neither system offers transactions
//! spanning the other, so every multi-step operation here has an explicit
//! commit point, a compensation path for each step after it, and a
//! structured report of any cleanup that could not be completed.

pub mod blob;
pub mod coordinator;
pub mod model;

pub use blob::{
    generate_blob_key, BlobError, BlobHandle, BlobResult, BlobStore, FlakyBlobStore,
    LocalBlobStore, MemoryBlobStore, StoredBlob,
};
pub use coordinator::{
    AttachOutcome, AttachmentCoordinator, AttachmentFailure, CleanupWarning, CoordinatorError,
    CoordinatorResult, DetachOutcome,
};
pub use model::{FileMetadata, UploadContent};
