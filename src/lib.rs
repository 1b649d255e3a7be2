// Library crate for the clipshare session server
// This file exposes the public API for integration tests

pub mod attachment;
pub mod files;
pub mod room;
pub mod shared;
pub mod websockets;

// Re-export commonly used types for easier access in tests
pub use attachment::{AttachmentDownload, AttachmentModel, AttachmentService};
pub use room::{AppendOutcome, HistorySnapshot, RoomModel, RoomService, RoomStatus};
pub use shared::AppError;
pub use websockets::{
    ConnectionManager, MessageHandler, MessageType, RoomBroadcaster, SessionGateway,
    WebSocketMessage,
};
