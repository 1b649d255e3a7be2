use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;
use tracing::{debug, info, instrument};

use super::history::HistorySnapshot;
use super::models::RoomModel;
use crate::shared::AppError;

/// Result of attempting to insert a newly created room
#[derive(Debug, Clone, PartialEq)]
pub enum InsertRoomResult {
    /// The room was stored under its code
    Inserted,
    /// An active room already holds this code
    CodeTaken,
}

/// Result of appending a clip to a room's history
#[derive(Debug, Clone, PartialEq)]
pub enum AppendClipResult {
    /// The clip was appended; carries the updated history snapshot
    Appended(HistorySnapshot),
    /// The clip equals the current head entry and was skipped
    Suppressed,
    /// The room is closed and accepts no mutation
    RoomClosed,
    /// No room exists under this code
    RoomNotFound,
}

/// Result of clearing a room's history
#[derive(Debug, Clone, PartialEq)]
pub enum ClearHistoryResult {
    /// History emptied; carries the (empty) snapshot to fan out
    Cleared(HistorySnapshot),
    RoomClosed,
    RoomNotFound,
}

/// Result of closing a room
#[derive(Debug, Clone, PartialEq)]
pub enum CloseRoomResult {
    Closed,
    /// The room was already closed; closing is idempotent
    AlreadyClosed,
    RoomNotFound,
}

/// Trait for the code-keyed room registry
///
/// All mutating operations are atomic with respect to each other: two
/// concurrent appends on the same room cannot interleave inside the
/// cap/dedup logic.
#[async_trait]
pub trait RoomRegistry {
    async fn insert_room(&self, room: &RoomModel) -> Result<InsertRoomResult, AppError>;
    async fn get_room(&self, code: &str) -> Result<Option<RoomModel>, AppError>;
    async fn append_clip(&self, code: &str, text: &str) -> Result<AppendClipResult, AppError>;
    async fn clear_history(&self, code: &str) -> Result<ClearHistoryResult, AppError>;
    async fn close_room(&self, code: &str) -> Result<CloseRoomResult, AppError>;
}

/// In-memory implementation of RoomRegistry
///
/// One mutex over the whole map is the serialization point for every
/// mutation; readers clone a consistent snapshot. Closed rooms stay in the
/// map until process exit, so lookups after closure remain well-defined.
pub struct InMemoryRoomRegistry {
    rooms: Mutex<HashMap<String, RoomModel>>,
}

impl Default for InMemoryRoomRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryRoomRegistry {
    /// Creates a new empty in-memory registry
    pub fn new() -> Self {
        Self {
            rooms: Mutex::new(HashMap::new()),
        }
    }
}

#[async_trait]
impl RoomRegistry for InMemoryRoomRegistry {
    #[instrument(skip(self, room))]
    async fn insert_room(&self, room: &RoomModel) -> Result<InsertRoomResult, AppError> {
        let mut rooms = self.rooms.lock().unwrap();

        // Uniqueness binds active rooms only: a closed room's code may be
        // reused, superseding its retained record.
        if rooms.get(&room.code).is_some_and(|r| r.is_active()) {
            debug!(code = %room.code, "Pairing code already in use by an active room");
            return Ok(InsertRoomResult::CodeTaken);
        }
        rooms.insert(room.code.clone(), room.clone());

        debug!(code = %room.code, "Room stored");
        Ok(InsertRoomResult::Inserted)
    }

    #[instrument(skip(self))]
    async fn get_room(&self, code: &str) -> Result<Option<RoomModel>, AppError> {
        let rooms = self.rooms.lock().unwrap();
        Ok(rooms.get(code).cloned())
    }

    #[instrument(skip(self, text))]
    async fn append_clip(&self, code: &str, text: &str) -> Result<AppendClipResult, AppError> {
        let mut rooms = self.rooms.lock().unwrap();

        let room = match rooms.get_mut(code) {
            Some(room) => room,
            None => {
                debug!(code = %code, "Room not found");
                return Ok(AppendClipResult::RoomNotFound);
            }
        };

        if !room.is_active() {
            debug!(code = %code, "Append rejected, room is closed");
            return Ok(AppendClipResult::RoomClosed);
        }

        if !room.history.push(text.to_string()) {
            debug!(code = %code, "Duplicate head entry suppressed");
            return Ok(AppendClipResult::Suppressed);
        }

        debug!(code = %code, entries = room.history.len(), "Clip appended");
        Ok(AppendClipResult::Appended(room.history.snapshot()))
    }

    #[instrument(skip(self))]
    async fn clear_history(&self, code: &str) -> Result<ClearHistoryResult, AppError> {
        let mut rooms = self.rooms.lock().unwrap();

        let room = match rooms.get_mut(code) {
            Some(room) => room,
            None => return Ok(ClearHistoryResult::RoomNotFound),
        };

        if !room.is_active() {
            return Ok(ClearHistoryResult::RoomClosed);
        }

        room.history.clear();
        info!(code = %code, "History cleared");
        Ok(ClearHistoryResult::Cleared(room.history.snapshot()))
    }

    #[instrument(skip(self))]
    async fn close_room(&self, code: &str) -> Result<CloseRoomResult, AppError> {
        let mut rooms = self.rooms.lock().unwrap();

        let room = match rooms.get_mut(code) {
            Some(room) => room,
            None => return Ok(CloseRoomResult::RoomNotFound),
        };

        if !room.is_active() {
            return Ok(CloseRoomResult::AlreadyClosed);
        }

        room.status = super::models::RoomStatus::Closed;
        info!(code = %code, "Room closed");
        Ok(CloseRoomResult::Closed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::room::history::HISTORY_LIMIT;
    use crate::room::models::RoomStatus;

    #[tokio::test]
    async fn test_insert_and_get_room() {
        let registry = InMemoryRoomRegistry::new();
        let room = RoomModel::with_code("482913".to_string());

        let result = registry.insert_room(&room).await.unwrap();
        assert_eq!(result, InsertRoomResult::Inserted);

        let stored = registry.get_room("482913").await.unwrap().unwrap();
        assert_eq!(stored.code, "482913");
        assert_eq!(stored.status, RoomStatus::Active);
        assert!(stored.history.is_empty());
    }

    #[tokio::test]
    async fn test_get_nonexistent_room() {
        let registry = InMemoryRoomRegistry::new();
        assert!(registry.get_room("000000").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_insert_rejects_active_code_collision() {
        let registry = InMemoryRoomRegistry::new();
        let room = RoomModel::with_code("482913".to_string());
        registry.insert_room(&room).await.unwrap();

        let clash = RoomModel::with_code("482913".to_string());
        let result = registry.insert_room(&clash).await.unwrap();
        assert_eq!(result, InsertRoomResult::CodeTaken);
    }

    #[tokio::test]
    async fn test_closed_room_code_may_be_reused() {
        let registry = InMemoryRoomRegistry::new();
        let room = RoomModel::with_code("482913".to_string());
        registry.insert_room(&room).await.unwrap();
        registry.close_room("482913").await.unwrap();

        let reuse = RoomModel::with_code("482913".to_string());
        let result = registry.insert_room(&reuse).await.unwrap();
        assert_eq!(result, InsertRoomResult::Inserted);

        // The retained closed record was superseded by the new active room
        let stored = registry.get_room("482913").await.unwrap().unwrap();
        assert_eq!(stored.status, RoomStatus::Active);
    }

    #[tokio::test]
    async fn test_append_clip_returns_snapshot() {
        let registry = InMemoryRoomRegistry::new();
        registry
            .insert_room(&RoomModel::with_code("482913".to_string()))
            .await
            .unwrap();

        let result = registry.append_clip("482913", "hello").await.unwrap();
        match result {
            AppendClipResult::Appended(snapshot) => {
                assert_eq!(snapshot.entries, ["hello"]);
                assert_eq!(snapshot.revision, 1);
            }
            other => panic!("expected Appended, got {:?}", other),
        }

        let result = registry.append_clip("482913", "world").await.unwrap();
        match result {
            AppendClipResult::Appended(snapshot) => {
                assert_eq!(snapshot.entries, ["world", "hello"]);
                assert_eq!(snapshot.revision, 2);
            }
            other => panic!("expected Appended, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_append_duplicate_head_is_suppressed() {
        let registry = InMemoryRoomRegistry::new();
        registry
            .insert_room(&RoomModel::with_code("482913".to_string()))
            .await
            .unwrap();

        registry.append_clip("482913", "hello").await.unwrap();
        let result = registry.append_clip("482913", "hello").await.unwrap();
        assert_eq!(result, AppendClipResult::Suppressed);

        let stored = registry.get_room("482913").await.unwrap().unwrap();
        assert_eq!(stored.history.entries(), ["hello"]);
    }

    #[tokio::test]
    async fn test_append_caps_history_length() {
        let registry = InMemoryRoomRegistry::new();
        registry
            .insert_room(&RoomModel::with_code("482913".to_string()))
            .await
            .unwrap();

        for i in 0..HISTORY_LIMIT + 5 {
            registry
                .append_clip("482913", &format!("clip-{}", i))
                .await
                .unwrap();
        }

        let stored = registry.get_room("482913").await.unwrap().unwrap();
        assert_eq!(stored.history.len(), HISTORY_LIMIT);
    }

    #[tokio::test]
    async fn test_append_to_closed_room() {
        let registry = InMemoryRoomRegistry::new();
        registry
            .insert_room(&RoomModel::with_code("482913".to_string()))
            .await
            .unwrap();
        registry.close_room("482913").await.unwrap();

        let result = registry.append_clip("482913", "hello").await.unwrap();
        assert_eq!(result, AppendClipResult::RoomClosed);
    }

    #[tokio::test]
    async fn test_append_to_unknown_room() {
        let registry = InMemoryRoomRegistry::new();
        let result = registry.append_clip("000000", "hello").await.unwrap();
        assert_eq!(result, AppendClipResult::RoomNotFound);
    }

    #[tokio::test]
    async fn test_clear_history() {
        let registry = InMemoryRoomRegistry::new();
        registry
            .insert_room(&RoomModel::with_code("482913".to_string()))
            .await
            .unwrap();
        registry.append_clip("482913", "hello").await.unwrap();

        let result = registry.clear_history("482913").await.unwrap();
        match result {
            ClearHistoryResult::Cleared(snapshot) => assert!(snapshot.entries.is_empty()),
            other => panic!("expected Cleared, got {:?}", other),
        }

        let stored = registry.get_room("482913").await.unwrap().unwrap();
        assert!(stored.history.is_empty());
    }

    #[tokio::test]
    async fn test_clear_closed_room() {
        let registry = InMemoryRoomRegistry::new();
        registry
            .insert_room(&RoomModel::with_code("482913".to_string()))
            .await
            .unwrap();
        registry.close_room("482913").await.unwrap();

        let result = registry.clear_history("482913").await.unwrap();
        assert_eq!(result, ClearHistoryResult::RoomClosed);
    }

    #[tokio::test]
    async fn test_close_room_is_idempotent() {
        let registry = InMemoryRoomRegistry::new();
        registry
            .insert_room(&RoomModel::with_code("482913".to_string()))
            .await
            .unwrap();

        assert_eq!(
            registry.close_room("482913").await.unwrap(),
            CloseRoomResult::Closed
        );
        assert_eq!(
            registry.close_room("482913").await.unwrap(),
            CloseRoomResult::AlreadyClosed
        );
    }

    #[tokio::test]
    async fn test_close_unknown_room() {
        let registry = InMemoryRoomRegistry::new();
        assert_eq!(
            registry.close_room("000000").await.unwrap(),
            CloseRoomResult::RoomNotFound
        );
    }

    #[tokio::test]
    async fn test_get_room_after_close_returns_record() {
        let registry = InMemoryRoomRegistry::new();
        registry
            .insert_room(&RoomModel::with_code("482913".to_string()))
            .await
            .unwrap();
        registry.append_clip("482913", "hello").await.unwrap();
        registry.close_room("482913").await.unwrap();

        let stored = registry.get_room("482913").await.unwrap().unwrap();
        assert_eq!(stored.status, RoomStatus::Closed);
        assert_eq!(stored.history.entries(), ["hello"]);
    }
}
