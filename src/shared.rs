use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use std::sync::Arc;
use thiserror::Error;

use crate::attachment::service::AttachmentService;
use crate::files::store::DiskFileStore;
use crate::room::service::RoomService;
use crate::websockets::broadcaster::RoomBroadcaster;
use crate::websockets::connection_manager::ConnectionManager;

/// Shared application state containing all dependencies
#[derive(Clone)]
pub struct AppState {
    pub rooms: Arc<RoomService>,
    pub attachments: Arc<AttachmentService>,
    pub connections: Arc<dyn ConnectionManager>,
    pub broadcaster: Arc<RoomBroadcaster>,
    pub files: Arc<DiskFileStore>,
}

impl AppState {
    pub fn new(
        rooms: Arc<RoomService>,
        attachments: Arc<AttachmentService>,
        connections: Arc<dyn ConnectionManager>,
        broadcaster: Arc<RoomBroadcaster>,
        files: Arc<DiskFileStore>,
    ) -> Self {
        Self {
            rooms,
            attachments,
            connections,
            broadcaster,
            files,
        }
    }
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error("invalid session code: {0}")]
    InvalidCode(String),

    #[error("room not found: {0}")]
    RoomNotFound(String),

    #[error("room is closed: {0}")]
    RoomClosed(String),

    #[error("could not allocate a session code")]
    CodeSpaceExhausted,

    #[error("file exceeds size limit ({0} bytes)")]
    FileTooLarge(u64),

    #[error("upload failed: {0}")]
    UploadFailed(String),

    #[error("storage delete failed: {0}")]
    StorageDeleteFailed(String),

    #[error("path escapes upload root")]
    PathTraversalRejected,

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Internal server error")]
    Internal,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            AppError::InvalidCode(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::RoomNotFound(code) => {
                (StatusCode::NOT_FOUND, format!("room not found: {}", code))
            }
            AppError::RoomClosed(code) => (StatusCode::GONE, format!("room is closed: {}", code)),
            AppError::CodeSpaceExhausted => (
                StatusCode::SERVICE_UNAVAILABLE,
                "could not allocate a session code".to_string(),
            ),
            AppError::FileTooLarge(size) => (
                StatusCode::PAYLOAD_TOO_LARGE,
                format!("file exceeds size limit ({} bytes)", size),
            ),
            AppError::UploadFailed(msg) => {
                (StatusCode::BAD_GATEWAY, format!("upload failed: {}", msg))
            }
            AppError::StorageDeleteFailed(msg) => (
                StatusCode::BAD_GATEWAY,
                format!("storage delete failed: {}", msg),
            ),
            AppError::PathTraversalRejected => (
                StatusCode::BAD_REQUEST,
                "path escapes upload root".to_string(),
            ),
            AppError::Json(e) => (StatusCode::BAD_REQUEST, e.to_string()),
            // Internal detail stays in the logs, not in the response
            AppError::Io(_) | AppError::Internal => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error".to_string(),
            ),
        };

        let body = Json(json!({
            "error": error_message
        }));

        (status, body).into_response()
    }
}
