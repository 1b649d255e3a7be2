use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;
use serde_json::json;
use tracing::{info, instrument};
use uuid::Uuid;

use super::blob::UploadTarget;
use super::models::{AttachmentDownload, AttachmentModel};
use super::service::CommitAttachmentRequest;
use crate::shared::{AppError, AppState};

/// HTTP handler for issuing a short-lived upload target
///
/// POST /api/attachments/upload-target
#[instrument(name = "issue_upload_target", skip(state))]
pub async fn issue_upload_target(
    State(state): State<AppState>,
) -> Result<Json<UploadTarget>, AppError> {
    let target = state.attachments.issue_upload_target().await?;
    Ok(Json(target))
}

/// HTTP handler for writing blob content against an issued target
///
/// PUT /api/blobs/{upload_ref}
#[instrument(name = "put_blob", skip(state, body))]
pub async fn put_blob(
    State(state): State<AppState>,
    Path(upload_ref): Path<String>,
    body: Bytes,
) -> Result<Json<serde_json::Value>, AppError> {
    state.attachments.store_blob(&upload_ref, body).await?;
    Ok(Json(json!({ "success": true })))
}

/// HTTP handler for fetching blob content
///
/// GET /api/blobs/{storage_ref}
#[instrument(name = "get_blob", skip(state))]
pub async fn get_blob(
    State(state): State<AppState>,
    Path(storage_ref): Path<String>,
) -> Result<Response, AppError> {
    match state.attachments.open_blob(&storage_ref).await? {
        Some(data) => Ok((
            [(header::CONTENT_TYPE, "application/octet-stream")],
            data,
        )
            .into_response()),
        None => Ok((
            StatusCode::NOT_FOUND,
            Json(json!({ "error": "no blob under reference" })),
        )
            .into_response()),
    }
}

/// HTTP handler for committing uploaded-file metadata
///
/// POST /api/attachments
#[instrument(name = "commit_attachment", skip(state, request))]
pub async fn commit_attachment(
    State(state): State<AppState>,
    Json(request): Json<CommitAttachmentRequest>,
) -> Result<Json<AttachmentModel>, AppError> {
    let attachment = state.attachments.commit(request).await?;

    info!(
        id = %attachment.id,
        room_code = %attachment.room_code,
        "Attachment committed"
    );
    Ok(Json(attachment))
}

/// HTTP handler for listing a room's attachments
///
/// GET /api/rooms/{code}/attachments
#[instrument(name = "list_attachments", skip(state))]
pub async fn list_attachments(
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> Result<Json<Vec<AttachmentDownload>>, AppError> {
    let attachments = state.attachments.list(&code).await?;
    Ok(Json(attachments))
}

#[derive(Debug, Deserialize)]
pub struct DeleteAttachmentQuery {
    pub storage_ref: String,
}

/// HTTP handler for deleting an attachment (blob first, then metadata)
///
/// DELETE /api/attachments/{id}?storage_ref=...
#[instrument(name = "delete_attachment", skip(state))]
pub async fn delete_attachment(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(query): Query<DeleteAttachmentQuery>,
) -> Result<Json<serde_json::Value>, AppError> {
    state.attachments.delete(id, &query.storage_ref).await?;
    Ok(Json(json!({ "success": true })))
}
