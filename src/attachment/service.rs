use serde::Deserialize;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use super::{
    blob::{BlobBackend, UploadTarget},
    models::{AttachmentDownload, AttachmentModel},
    repository::AttachmentRepository,
};
use crate::room::{code, RoomService};
use crate::shared::AppError;
use bytes::Bytes;

/// Size ceiling for a single attachment
pub const MAX_ATTACHMENT_BYTES: u64 = 10 * 1024 * 1024;

/// Commit request for an uploaded blob's metadata
#[derive(Debug, Clone, Deserialize)]
pub struct CommitAttachmentRequest {
    pub storage_ref: String,
    pub name: String,
    pub mime_type: String,
    pub room_code: String,
    pub size_bytes: u64,
}

/// Service for the attachment metadata lifecycle
pub struct AttachmentService {
    repository: Arc<dyn AttachmentRepository>,
    blobs: Arc<dyn BlobBackend>,
    rooms: Arc<RoomService>,
}

impl AttachmentService {
    pub fn new(
        repository: Arc<dyn AttachmentRepository>,
        blobs: Arc<dyn BlobBackend>,
        rooms: Arc<RoomService>,
    ) -> Self {
        Self {
            repository,
            blobs,
            rooms,
        }
    }

    /// Asks the blob backend for a short-lived write target
    ///
    /// No room validation happens here; the client has not yet chosen
    /// where the file lives.
    #[instrument(skip(self))]
    pub async fn issue_upload_target(&self) -> Result<UploadTarget, AppError> {
        self.blobs.issue_upload_target().await
    }

    /// Writes content against an issued upload target
    pub async fn store_blob(&self, upload_ref: &str, data: Bytes) -> Result<(), AppError> {
        if data.len() as u64 > MAX_ATTACHMENT_BYTES {
            return Err(AppError::FileTooLarge(data.len() as u64));
        }
        self.blobs.store(upload_ref, data).await
    }

    /// Fetches blob content for the download route
    pub async fn open_blob(&self, storage_ref: &str) -> Result<Option<Bytes>, AppError> {
        self.blobs.open(storage_ref).await
    }

    /// Persists metadata for an uploaded blob
    ///
    /// Checks run in a fixed order: size ceiling first (before any backend
    /// interaction), then the referenced room must exist and be active,
    /// then the blob must actually be present under the reference.
    #[instrument(skip(self, request), fields(room_code = %request.room_code, name = %request.name))]
    pub async fn commit(
        &self,
        request: CommitAttachmentRequest,
    ) -> Result<AttachmentModel, AppError> {
        if request.size_bytes > MAX_ATTACHMENT_BYTES {
            debug!(size_bytes = request.size_bytes, "Attachment exceeds size ceiling");
            return Err(AppError::FileTooLarge(request.size_bytes));
        }

        if !code::is_valid_code(&request.room_code) {
            return Err(AppError::InvalidCode(request.room_code));
        }

        let room = self
            .rooms
            .get_room(&request.room_code)
            .await?
            .ok_or_else(|| AppError::RoomNotFound(request.room_code.clone()))?;
        if !room.is_active() {
            return Err(AppError::RoomClosed(request.room_code.clone()));
        }

        if !self.blobs.contains(&request.storage_ref).await? {
            return Err(AppError::UploadFailed(
                "no content under upload reference".to_string(),
            ));
        }

        let attachment = AttachmentModel::new(
            request.room_code,
            request.storage_ref,
            request.name,
            request.mime_type,
            request.size_bytes,
        );
        self.repository.insert(&attachment).await?;

        info!(id = %attachment.id, room_code = %attachment.room_code, "Attachment committed");
        Ok(attachment)
    }

    /// Lists a room's attachments with download URLs resolved at read time
    #[instrument(skip(self))]
    pub async fn list(&self, room_code: &str) -> Result<Vec<AttachmentDownload>, AppError> {
        let records = self.repository.list_by_room(room_code).await?;

        let mut downloads = Vec::with_capacity(records.len());
        for record in records {
            match self.blobs.resolve_url(&record.storage_ref).await? {
                Some(download_url) => downloads.push(AttachmentDownload {
                    id: record.id,
                    name: record.name,
                    mime_type: record.mime_type,
                    size_bytes: record.size_bytes,
                    download_url,
                }),
                // The deletion protocol keeps metadata from outliving its
                // blob; an unresolvable reference is never listed.
                None => warn!(
                    id = %record.id,
                    storage_ref = %record.storage_ref,
                    "Attachment record without resolvable blob"
                ),
            }
        }

        Ok(downloads)
    }

    /// Deletes an attachment: blob first, then the metadata record
    ///
    /// A failed blob delete aborts before metadata is touched, so a
    /// listing never shows an attachment whose content is gone.
    #[instrument(skip(self))]
    pub async fn delete(&self, id: Uuid, storage_ref: &str) -> Result<(), AppError> {
        self.blobs.delete(storage_ref).await?;

        let removed = self.repository.delete(id).await?;
        if !removed {
            warn!(id = %id, "Delete for unknown attachment record");
        }

        info!(id = %id, "Attachment deleted");
        Ok(())
    }
}
