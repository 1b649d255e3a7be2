use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;
use tracing::debug;
use uuid::Uuid;

use super::models::AttachmentModel;
use crate::shared::AppError;

/// Trait for attachment metadata storage
#[async_trait]
pub trait AttachmentRepository: Send + Sync {
    async fn insert(&self, attachment: &AttachmentModel) -> Result<(), AppError>;
    async fn get(&self, id: Uuid) -> Result<Option<AttachmentModel>, AppError>;
    async fn list_by_room(&self, room_code: &str) -> Result<Vec<AttachmentModel>, AppError>;
    /// Removes the record; returns false when no record existed
    async fn delete(&self, id: Uuid) -> Result<bool, AppError>;
}

/// In-memory implementation of AttachmentRepository
pub struct InMemoryAttachmentRepository {
    attachments: Mutex<HashMap<Uuid, AttachmentModel>>,
}

impl Default for InMemoryAttachmentRepository {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryAttachmentRepository {
    pub fn new() -> Self {
        Self {
            attachments: Mutex::new(HashMap::new()),
        }
    }
}

#[async_trait]
impl AttachmentRepository for InMemoryAttachmentRepository {
    async fn insert(&self, attachment: &AttachmentModel) -> Result<(), AppError> {
        let mut attachments = self.attachments.lock().unwrap();
        attachments.insert(attachment.id, attachment.clone());
        debug!(id = %attachment.id, room_code = %attachment.room_code, "Attachment record stored");
        Ok(())
    }

    async fn get(&self, id: Uuid) -> Result<Option<AttachmentModel>, AppError> {
        Ok(self.attachments.lock().unwrap().get(&id).cloned())
    }

    async fn list_by_room(&self, room_code: &str) -> Result<Vec<AttachmentModel>, AppError> {
        let attachments = self.attachments.lock().unwrap();
        let mut records: Vec<AttachmentModel> = attachments
            .values()
            .filter(|a| a.room_code == room_code)
            .cloned()
            .collect();
        // HashMap iteration order is arbitrary; present oldest first
        records.sort_by_key(|a| a.created_at);
        Ok(records)
    }

    async fn delete(&self, id: Uuid) -> Result<bool, AppError> {
        let removed = self.attachments.lock().unwrap().remove(&id).is_some();
        debug!(id = %id, removed, "Attachment record delete");
        Ok(removed)
    }
}
