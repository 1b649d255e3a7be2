use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

use super::{
    history::HistorySnapshot,
    models::RoomModel,
    registry::{
        AppendClipResult, ClearHistoryResult, CloseRoomResult, InsertRoomResult, RoomRegistry,
    },
};
use crate::shared::AppError;

/// Maximum generate/insert attempts before giving up on a pairing code.
/// Collisions are astronomically unlikely below a few hundred thousand
/// active rooms; the bound turns the pathological case into a defined
/// error instead of a spin.
pub const MAX_CODE_ATTEMPTS: usize = 16;

/// Non-error outcome of appending a clip
#[derive(Debug, Clone, PartialEq)]
pub enum AppendOutcome {
    /// The clip was committed; carries the updated history snapshot
    Appended(HistorySnapshot),
    /// The clip equals the current head and was skipped; no fanout occurs
    Suppressed,
}

/// Service for room lifecycle and history business logic
pub struct RoomService {
    registry: Arc<dyn RoomRegistry + Send + Sync>,
}

impl RoomService {
    pub fn new(registry: Arc<dyn RoomRegistry + Send + Sync>) -> Self {
        Self { registry }
    }

    /// Creates a new active room under a freshly generated pairing code
    ///
    /// Retries generation on collision with an active room, up to
    /// [`MAX_CODE_ATTEMPTS`] times.
    #[instrument(skip(self))]
    pub async fn create_room(&self) -> Result<RoomModel, AppError> {
        for attempt in 1..=MAX_CODE_ATTEMPTS {
            let room = RoomModel::new();
            match self.registry.insert_room(&room).await? {
                InsertRoomResult::Inserted => {
                    info!(code = %room.code, "Room created");
                    return Ok(room);
                }
                InsertRoomResult::CodeTaken => {
                    debug!(code = %room.code, attempt, "Pairing code collision, retrying");
                }
            }
        }

        warn!(
            attempts = MAX_CODE_ATTEMPTS,
            "Exhausted pairing code attempts"
        );
        Err(AppError::CodeSpaceExhausted)
    }

    /// Looks up a room by code; closed rooms are returned with their
    /// terminal status
    #[instrument(skip(self))]
    pub async fn get_room(&self, code: &str) -> Result<Option<RoomModel>, AppError> {
        self.registry.get_room(code).await
    }

    /// Appends a clip to the room's history
    ///
    /// Duplicate-of-head appends resolve to [`AppendOutcome::Suppressed`];
    /// callers must not fan out a suppressed append.
    #[instrument(skip(self, text))]
    pub async fn append_clip(&self, code: &str, text: &str) -> Result<AppendOutcome, AppError> {
        match self.registry.append_clip(code, text).await? {
            AppendClipResult::Appended(history) => Ok(AppendOutcome::Appended(history)),
            AppendClipResult::Suppressed => Ok(AppendOutcome::Suppressed),
            AppendClipResult::RoomClosed => Err(AppError::RoomClosed(code.to_string())),
            AppendClipResult::RoomNotFound => Err(AppError::RoomNotFound(code.to_string())),
        }
    }

    /// Empties the room's history, returning the (empty) snapshot to fan out
    #[instrument(skip(self))]
    pub async fn clear_history(&self, code: &str) -> Result<HistorySnapshot, AppError> {
        match self.registry.clear_history(code).await? {
            ClearHistoryResult::Cleared(snapshot) => Ok(snapshot),
            ClearHistoryResult::RoomClosed => Err(AppError::RoomClosed(code.to_string())),
            ClearHistoryResult::RoomNotFound => Err(AppError::RoomNotFound(code.to_string())),
        }
    }

    /// Transitions the room to its terminal closed state
    ///
    /// Closing an already-closed room is a no-op; closing a code that never
    /// existed is an error.
    #[instrument(skip(self))]
    pub async fn close_room(&self, code: &str) -> Result<(), AppError> {
        match self.registry.close_room(code).await? {
            CloseRoomResult::Closed | CloseRoomResult::AlreadyClosed => Ok(()),
            CloseRoomResult::RoomNotFound => Err(AppError::RoomNotFound(code.to_string())),
        }
    }
}
