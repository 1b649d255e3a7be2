// Public API - what other modules can use
pub use history::{HistoryLog, HistorySnapshot, HISTORY_LIMIT};
pub use models::{RoomModel, RoomStatus};
pub use service::{AppendOutcome, RoomService};

// Internal modules
pub mod code;
pub mod history;
pub mod models;
pub mod registry;
pub mod service;
