use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Metadata record binding an uploaded blob to a room
///
/// The room code is a non-owning reference: it is validated when the
/// attachment is committed, and the attachment is deleted independently of
/// room closure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttachmentModel {
    pub id: Uuid,
    /// Owning room's pairing code
    pub room_code: String,
    /// Opaque reference into the blob backend
    pub storage_ref: String,
    /// Original upload filename
    pub name: String,
    /// MIME content type
    pub mime_type: String,
    pub size_bytes: u64,
    pub created_at: DateTime<Utc>,
}

impl AttachmentModel {
    /// Creates a new metadata record with a generated id
    pub fn new(
        room_code: String,
        storage_ref: String,
        name: String,
        mime_type: String,
        size_bytes: u64,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            room_code,
            storage_ref,
            name,
            mime_type,
            size_bytes,
            created_at: Utc::now(),
        }
    }
}

/// List-entry view of an attachment with its download URL resolved at
/// read time. URLs are never persisted, only the opaque storage reference.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttachmentDownload {
    pub id: Uuid,
    pub name: String,
    pub mime_type: String,
    pub size_bytes: u64,
    pub download_url: String,
}
