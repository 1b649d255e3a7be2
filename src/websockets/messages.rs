use serde::{Deserialize, Serialize};

/// Message types for WebSocket communication
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MessageType {
    // Client -> Server
    CreateSession,
    JoinSession,
    SendText,
    ClearText,
    CloseRoom,

    // Server -> Client
    SessionCreated,
    JoinResult,
    HistoryUpdate,
    SessionClosed,
    Error,
}

/// Base structure for WebSocket messages
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebSocketMessage {
    #[serde(rename = "type")]
    pub message_type: MessageType,
    pub payload: serde_json::Value,
}

/// Client-to-Server message payloads
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JoinSessionPayload {
    pub code: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SendTextPayload {
    pub code: String,
    pub text: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClearTextPayload {
    pub code: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CloseRoomPayload {
    pub code: String,
}

/// Server-to-Client message payloads
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionCreatedPayload {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JoinResultPayload {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryUpdatePayload {
    /// Entries newest first, exactly as committed at the registry
    pub history: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionClosedPayload {
    pub code: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorPayload {
    pub message: String,
}

/// Helper functions for creating messages
impl WebSocketMessage {
    pub fn new(message_type: MessageType, payload: serde_json::Value) -> Self {
        Self {
            message_type,
            payload,
        }
    }

    /// Create a SESSION_CREATED ack for a successfully created room
    pub fn session_created(code: String) -> Self {
        let payload = SessionCreatedPayload {
            success: true,
            code: Some(code),
        };
        Self::new(
            MessageType::SessionCreated,
            serde_json::to_value(payload).unwrap(),
        )
    }

    /// Create a SESSION_CREATED ack for a failed creation
    pub fn session_create_failed() -> Self {
        let payload = SessionCreatedPayload {
            success: false,
            code: None,
        };
        Self::new(
            MessageType::SessionCreated,
            serde_json::to_value(payload).unwrap(),
        )
    }

    /// Create a JOIN_RESULT ack
    pub fn join_result(success: bool, message: Option<String>) -> Self {
        let payload = JoinResultPayload { success, message };
        Self::new(
            MessageType::JoinResult,
            serde_json::to_value(payload).unwrap(),
        )
    }

    /// Create a HISTORY_UPDATE push
    pub fn history_update(history: Vec<String>) -> Self {
        let payload = HistoryUpdatePayload { history };
        Self::new(
            MessageType::HistoryUpdate,
            serde_json::to_value(payload).unwrap(),
        )
    }

    /// Create a SESSION_CLOSED push
    pub fn session_closed(code: String) -> Self {
        let payload = SessionClosedPayload { code };
        Self::new(
            MessageType::SessionClosed,
            serde_json::to_value(payload).unwrap(),
        )
    }

    /// Create an ERROR message
    pub fn error(message: String) -> Self {
        let payload = ErrorPayload { message };
        Self::new(MessageType::Error, serde_json::to_value(payload).unwrap())
    }
}
