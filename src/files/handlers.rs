use axum::{
    extract::{Multipart, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;
use serde_json::json;
use tracing::{info, instrument, warn};

use crate::attachment::MAX_ATTACHMENT_BYTES;
use crate::shared::{AppError, AppState};

/// HTTP handler for listing uploaded files
///
/// GET /api/files
#[instrument(name = "list_files", skip(state))]
pub async fn list_files(State(state): State<AppState>) -> Result<Json<serde_json::Value>, AppError> {
    let files = state.files.list().await?;
    Ok(Json(json!({ "files": files })))
}

/// HTTP handler for uploading a file via multipart form data
///
/// POST /api/files — the file keeps its original name; an existing file of
/// the same name is overwritten.
#[instrument(name = "upload_file", skip(state, multipart))]
pub async fn upload_file(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Response, AppError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::UploadFailed(e.to_string()))?
    {
        if field.name() != Some("file") {
            continue;
        }

        let name = match field.file_name() {
            Some(name) => name.to_string(),
            None => {
                return Ok(bad_request("file field has no filename"));
            }
        };
        let data = field
            .bytes()
            .await
            .map_err(|e| AppError::UploadFailed(e.to_string()))?;

        if data.len() as u64 > MAX_ATTACHMENT_BYTES {
            return Err(AppError::FileTooLarge(data.len() as u64));
        }

        let path = state.files.save(&name, &data).await?;
        info!(name = %name, "File uploaded");
        return Ok(Json(json!({
            "success": true,
            "path": path.display().to_string(),
        }))
        .into_response());
    }

    warn!("Upload request without a file field");
    Ok(bad_request("no file uploaded"))
}

fn bad_request(message: &str) -> Response {
    (StatusCode::BAD_REQUEST, Json(json!({ "error": message }))).into_response()
}

#[derive(Debug, Deserialize)]
pub struct DeleteFileQuery {
    pub filename: Option<String>,
}

/// HTTP handler for deleting files
///
/// DELETE /api/files?filename=x removes one file;
/// DELETE /api/files removes everything under the upload root.
#[instrument(name = "delete_files", skip(state))]
pub async fn delete_files(
    State(state): State<AppState>,
    Query(query): Query<DeleteFileQuery>,
) -> Result<Json<serde_json::Value>, AppError> {
    match query.filename {
        Some(name) => state.files.delete(&name).await?,
        None => state.files.delete_all().await?,
    }
    Ok(Json(json!({ "success": true })))
}
