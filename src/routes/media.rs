use crate::{
    error::{AppError, Result},
    state::AppState,
    utils::middleware::OptionalAuth,
};
use axum::{
    extract::{Multipart, State},
    response::Json,
    routing::{delete, post},
    Router,
};
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/upload", post(upload))
        .route("/", delete(delete_upload))
}

#[derive(Debug, Deserialize)]
struct DeleteUploadRequest {
    url: String,
}

/// Accepts a single multipart `file` field, images only. Returns the public
/// URL callers then attach to a post or profile.
async fn upload(
    State(state): State<Arc<AppState>>,
    OptionalAuth(user): OptionalAuth,
    mut multipart: Multipart,
) -> Result<Json<Value>> {
    let _user = user.ok_or_else(|| AppError::unauthorized("Authentication required"))?;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(format!("Invalid multipart request: {}", e)))?
    {
        if field.name() != Some("file") {
            continue;
        }

        let content_type = field.content_type().unwrap_or("").to_string();
        if !content_type.starts_with("image/") {
            return Err(AppError::bad_request("Only image uploads are allowed"));
        }

        let filename = field.file_name().unwrap_or("upload.bin").to_string();
        let bytes = field
            .bytes()
            .await
            .map_err(|e| AppError::BadRequest(format!("Failed to read upload: {}", e)))?;

        if bytes.is_empty() {
            return Err(AppError::bad_request("Uploaded file is empty"));
        }
        if bytes.len() > state.config.max_upload_size {
            return Err(AppError::bad_request("Uploaded file is too large"));
        }

        let url = state.storage_service.store(&filename, &bytes).await?;

        return Ok(Json(json!({
            "success": true,
            "data": { "url": url }
        })));
    }

    Err(AppError::bad_request("Missing 'file' field in upload"))
}

async fn delete_upload(
    State(state): State<Arc<AppState>>,
    OptionalAuth(user): OptionalAuth,
    Json(request): Json<DeleteUploadRequest>,
) -> Result<Json<Value>> {
    let _user = user.ok_or_else(|| AppError::unauthorized("Authentication required"))?;

    state.storage_service.delete_by_url(&request.url).await?;

    Ok(Json(json!({
        "success": true
    })))
}
