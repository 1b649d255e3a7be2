use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::code;
use super::history::HistoryLog;

/// Lifecycle state of a room
///
/// `Closed` is terminal: a closed room accepts no further history or
/// attachment mutation, and never becomes active again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RoomStatus {
    Active,
    Closed,
}

/// A pairing session: code-keyed shared clip history
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoomModel {
    /// 6-digit pairing code, unique among active rooms
    pub code: String,
    pub history: HistoryLog,
    pub status: RoomStatus,
    pub created_at: DateTime<Utc>,
}

impl RoomModel {
    /// Creates a new active room with a freshly generated pairing code
    pub fn new() -> Self {
        Self::with_code(code::generate_code())
    }

    /// Creates a new active room with the given code
    pub fn with_code(code: String) -> Self {
        Self {
            code,
            history: HistoryLog::new(),
            status: RoomStatus::Active,
            created_at: Utc::now(),
        }
    }

    pub fn is_active(&self) -> bool {
        self.status == RoomStatus::Active
    }
}

impl Default for RoomModel {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_room_is_active_with_empty_history() {
        let room = RoomModel::new();
        assert_eq!(room.status, RoomStatus::Active);
        assert!(room.is_active());
        assert!(room.history.is_empty());
        assert!(code::is_valid_code(&room.code));
    }

    #[test]
    fn test_with_code_uses_given_code() {
        let room = RoomModel::with_code("482913".to_string());
        assert_eq!(room.code, "482913");
    }

    #[test]
    fn test_status_serializes_screaming_snake_case() {
        let active = serde_json::to_string(&RoomStatus::Active).unwrap();
        let closed = serde_json::to_string(&RoomStatus::Closed).unwrap();
        assert_eq!(active, "\"ACTIVE\"");
        assert_eq!(closed, "\"CLOSED\"");
    }
}
