use crate::{
    error::{AppError, Result},
    models::user::UpdateAvatarRequest,
    state::AppState,
    utils::middleware::OptionalAuth,
};
use axum::{
    extract::{Path, State},
    response::Json,
    routing::{delete, get, put},
    Router,
};
use serde_json::{json, Value};
use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/:id", get(get_profile))
        .route("/me/avatar", put(update_avatar))
        .route("/me/avatar", delete(delete_avatar))
}

async fn get_profile(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<Uuid>,
) -> Result<Json<Value>> {
    let profile = state.user_service.get_profile(user_id).await?;

    Ok(Json(json!({
        "success": true,
        "data": profile
    })))
}

async fn update_avatar(
    State(state): State<Arc<AppState>>,
    OptionalAuth(user): OptionalAuth,
    Json(request): Json<UpdateAvatarRequest>,
) -> Result<Json<Value>> {
    let user = user.ok_or_else(|| AppError::unauthorized("Authentication required"))?;
    request.validate().map_err(AppError::ValidatorError)?;

    let profile = state
        .user_service
        .update_avatar(user.id, request.image_url)
        .await?;

    Ok(Json(json!({
        "success": true,
        "data": profile
    })))
}

async fn delete_avatar(
    State(state): State<Arc<AppState>>,
    OptionalAuth(user): OptionalAuth,
) -> Result<Json<Value>> {
    let user = user.ok_or_else(|| AppError::unauthorized("Authentication required"))?;

    let profile = state.user_service.delete_avatar(user.id).await?;

    Ok(Json(json!({
        "success": true,
        "data": profile
    })))
}
