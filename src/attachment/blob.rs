//! Blob backend seam
//!
//! File content lives in a content store that issues short-lived write
//! targets and resolves opaque references into fetchable URLs at read
//! time. The in-memory implementation backs the default single-process
//! deployment and tests; an object-store implementation slots into the
//! same trait.

use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Mutex;
use tracing::debug;
use uuid::Uuid;

use crate::shared::AppError;

/// How long an issued upload target stays writable
const DEFAULT_UPLOAD_WINDOW_SECS: i64 = 120;

/// Short-lived write target issued by the blob backend
#[derive(Debug, Clone, Serialize)]
pub struct UploadTarget {
    /// Opaque reference the client commits after writing
    pub upload_ref: String,
    /// Where to PUT the content
    pub url: String,
    pub expires_at: DateTime<Utc>,
}

#[async_trait]
pub trait BlobBackend: Send + Sync {
    /// Issues a short-lived write target. No room validation happens at
    /// this stage; the client has not yet chosen where the file lives.
    async fn issue_upload_target(&self) -> Result<UploadTarget, AppError>;

    /// Writes content against an issued target.
    ///
    /// Fails with `UploadFailed` when the reference is unknown or its
    /// window has expired; callers surface that for manual retry rather
    /// than retrying silently.
    async fn store(&self, upload_ref: &str, data: Bytes) -> Result<(), AppError>;

    /// Fetches blob content for the download route
    async fn open(&self, storage_ref: &str) -> Result<Option<Bytes>, AppError>;

    /// True when content exists under the reference
    async fn contains(&self, storage_ref: &str) -> Result<bool, AppError>;

    /// Resolves a fetchable URL for the reference at read time
    async fn resolve_url(&self, storage_ref: &str) -> Result<Option<String>, AppError>;

    /// Removes the content blob. Removing an already-absent blob succeeds;
    /// `StorageDeleteFailed` is reserved for backend failures.
    async fn delete(&self, storage_ref: &str) -> Result<(), AppError>;
}

/// In-memory blob store
pub struct MemoryBlobStore {
    /// Issued upload targets awaiting content, with their deadlines
    pending: Mutex<HashMap<String, DateTime<Utc>>>,
    blobs: Mutex<HashMap<String, Bytes>>,
    upload_window: Duration,
}

impl Default for MemoryBlobStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryBlobStore {
    pub fn new() -> Self {
        Self::with_upload_window(Duration::seconds(DEFAULT_UPLOAD_WINDOW_SECS))
    }

    /// Overrides the upload validity window (tests use a negative window
    /// to produce already-expired targets)
    pub fn with_upload_window(upload_window: Duration) -> Self {
        Self {
            pending: Mutex::new(HashMap::new()),
            blobs: Mutex::new(HashMap::new()),
            upload_window,
        }
    }
}

#[async_trait]
impl BlobBackend for MemoryBlobStore {
    async fn issue_upload_target(&self) -> Result<UploadTarget, AppError> {
        let upload_ref = Uuid::new_v4().to_string();
        let expires_at = Utc::now() + self.upload_window;

        self.pending
            .lock()
            .unwrap()
            .insert(upload_ref.clone(), expires_at);

        debug!(upload_ref = %upload_ref, %expires_at, "Issued upload target");
        Ok(UploadTarget {
            url: format!("/api/blobs/{}", upload_ref),
            upload_ref,
            expires_at,
        })
    }

    async fn store(&self, upload_ref: &str, data: Bytes) -> Result<(), AppError> {
        let expires_at = self.pending.lock().unwrap().remove(upload_ref);
        match expires_at {
            Some(deadline) if Utc::now() <= deadline => {
                self.blobs
                    .lock()
                    .unwrap()
                    .insert(upload_ref.to_string(), data);
                debug!(upload_ref = %upload_ref, "Blob stored");
                Ok(())
            }
            Some(_) => Err(AppError::UploadFailed(
                "upload target expired".to_string(),
            )),
            None => Err(AppError::UploadFailed(
                "unknown upload target".to_string(),
            )),
        }
    }

    async fn open(&self, storage_ref: &str) -> Result<Option<Bytes>, AppError> {
        Ok(self.blobs.lock().unwrap().get(storage_ref).cloned())
    }

    async fn contains(&self, storage_ref: &str) -> Result<bool, AppError> {
        Ok(self.blobs.lock().unwrap().contains_key(storage_ref))
    }

    async fn resolve_url(&self, storage_ref: &str) -> Result<Option<String>, AppError> {
        let blobs = self.blobs.lock().unwrap();
        Ok(blobs
            .contains_key(storage_ref)
            .then(|| format!("/api/blobs/{}", storage_ref)))
    }

    async fn delete(&self, storage_ref: &str) -> Result<(), AppError> {
        self.blobs.lock().unwrap().remove(storage_ref);
        debug!(storage_ref = %storage_ref, "Blob deleted");
        Ok(())
    }
}
