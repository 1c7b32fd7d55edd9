use crate::{
    error::{AppError, Result},
    models::notification::NotificationQuery,
    state::AppState,
    utils::middleware::OptionalAuth,
};
use axum::{
    extract::{Path, Query, State},
    response::Json,
    routing::{get, post},
    Router,
};
use serde_json::{json, Value};
use std::sync::Arc;
use uuid::Uuid;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(list_notifications))
        .route("/unread-count", get(unread_count))
        .route("/read-all", post(mark_all_read))
        .route("/:id/read", post(mark_read))
}

async fn list_notifications(
    State(state): State<Arc<AppState>>,
    OptionalAuth(user): OptionalAuth,
    Query(query): Query<NotificationQuery>,
) -> Result<Json<Value>> {
    let user = user.ok_or_else(|| AppError::unauthorized("Authentication required"))?;

    let limit = query
        .limit
        .unwrap_or(state.config.default_notifications_limit);
    let list = state
        .notification_service
        .list_for_user(user.id, limit)
        .await?;

    Ok(Json(json!({
        "success": true,
        "data": list
    })))
}

async fn unread_count(
    State(state): State<Arc<AppState>>,
    OptionalAuth(user): OptionalAuth,
) -> Result<Json<Value>> {
    let user = user.ok_or_else(|| AppError::unauthorized("Authentication required"))?;

    let count = state.notification_service.unread_count(user.id).await?;

    Ok(Json(json!({
        "success": true,
        "data": { "unread_count": count }
    })))
}

async fn mark_read(
    State(state): State<Arc<AppState>>,
    OptionalAuth(user): OptionalAuth,
    Path(notification_id): Path<Uuid>,
) -> Result<Json<Value>> {
    let user = user.ok_or_else(|| AppError::unauthorized("Authentication required"))?;

    state
        .notification_service
        .mark_read(notification_id, user.id)
        .await?;

    Ok(Json(json!({
        "success": true
    })))
}

async fn mark_all_read(
    State(state): State<Arc<AppState>>,
    OptionalAuth(user): OptionalAuth,
) -> Result<Json<Value>> {
    let user = user.ok_or_else(|| AppError::unauthorized("Authentication required"))?;

    state.notification_service.mark_all_read(user.id).await?;

    Ok(Json(json!({
        "success": true
    })))
}
