use axum::extract::{DefaultBodyLimit, Multipart, State};
use axum::routing::post;
use axum::{Json, Router};
use serde_json::{json, Value};

use crate::error::{AppError, AppResult};
use crate::extractors::CurrentUser;
use crate::state::AppState;

pub fn router(max_upload_bytes: usize) -> Router<AppState> {
    Router::new()
        .route("/api/upload", post(upload))
        .layer(DefaultBodyLimit::max(max_upload_bytes))
}

/// Store the multipart `file` field and hand back its public URL.
async fn upload(
    State(state): State<AppState>,
    user: CurrentUser,
    mut multipart: Multipart,
) -> AppResult<Json<Value>> {
    let mut file: Option<(String, Vec<u8>)> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(format!("Invalid multipart body: {}", e)))?
    {
        if field.name() != Some("file") {
            continue;
        }
        let file_name = field.file_name().unwrap_or("upload").to_string();
        let bytes = field
            .bytes()
            .await
            .map_err(|e| AppError::BadRequest(format!("Failed to read file: {}", e)))?;
        file = Some((file_name, bytes.to_vec()));
        break;
    }

    let (file_name, bytes) = file.ok_or_else(|| AppError::BadRequest("No file provided".into()))?;
    if bytes.is_empty() {
        return Err(AppError::BadRequest("No file provided".into()));
    }

    let size = bytes.len();
    let blob_url = state
        .blobs
        .put(&file_name, bytes)
        .await
        .map_err(|e| AppError::Internal(format!("Failed to store upload: {}", e)))?;
    tracing::info!(user_id = user.id(), size, blob_url = %blob_url, "Upload stored");

    Ok(Json(json!({ "blobUrl": blob_url })))
}
