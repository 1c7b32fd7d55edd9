use crate::{
    error::{AppError, Result},
    models::post::*,
    state::AppState,
    utils::{middleware::OptionalAuth, slug},
};
use axum::{
    extract::{Path, Query, State},
    response::Json,
    routing::{delete, get, post, put},
    Router,
};
use serde_json::{json, Value};
use std::sync::Arc;
use uuid::Uuid;

pub fn router() -> Router<Arc<AppState>> {
    // The path parameter is a slug for reads and a post id for mutations;
    // one name keeps the router happy, extraction is positional either way
    Router::new()
        .route("/", get(list_posts))
        .route("/", post(create_post))
        .route("/:key", get(get_post))
        .route("/:key", put(update_post))
        .route("/:key", delete(delete_post))
        .route("/:key/reaction", post(toggle_reaction))
}

async fn list_posts(
    State(state): State<Arc<AppState>>,
    Query(query): Query<PostQuery>,
) -> Result<Json<Value>> {
    let posts = state
        .post_service
        .list_posts(query, state.config.default_posts_per_page)
        .await?;

    Ok(Json(json!({
        "success": true,
        "data": posts
    })))
}

async fn create_post(
    State(state): State<Arc<AppState>>,
    OptionalAuth(user): OptionalAuth,
    Json(request): Json<CreatePostRequest>,
) -> Result<Json<Value>> {
    let user = user.ok_or_else(|| AppError::unauthorized("Authentication required"))?;

    let created = state.post_service.create_post(user.id, request).await?;

    Ok(Json(json!({
        "success": true,
        "data": created
    })))
}

async fn get_post(
    State(state): State<Arc<AppState>>,
    OptionalAuth(user): OptionalAuth,
    Path(post_slug): Path<String>,
) -> Result<Json<Value>> {
    if !slug::is_valid_slug(&post_slug) {
        return Err(AppError::not_found("Post"));
    }

    let viewer_id = user.map(|u| u.id);
    let post = state
        .post_service
        .get_post_by_slug(&post_slug, viewer_id)
        .await?
        .ok_or_else(|| AppError::not_found("Post"))?;

    Ok(Json(json!({
        "success": true,
        "data": post
    })))
}

async fn update_post(
    State(state): State<Arc<AppState>>,
    OptionalAuth(user): OptionalAuth,
    Path(post_id): Path<Uuid>,
    Json(request): Json<UpdatePostRequest>,
) -> Result<Json<Value>> {
    let user = user.ok_or_else(|| AppError::unauthorized("Authentication required"))?;

    let updated = state
        .post_service
        .update_post(post_id, user.id, request)
        .await?;

    Ok(Json(json!({
        "success": true,
        "data": updated
    })))
}

async fn delete_post(
    State(state): State<Arc<AppState>>,
    OptionalAuth(user): OptionalAuth,
    Path(post_id): Path<Uuid>,
) -> Result<Json<Value>> {
    let user = user.ok_or_else(|| AppError::unauthorized("Authentication required"))?;

    state.post_service.delete_post(post_id, user.id).await?;

    Ok(Json(json!({
        "success": true,
        "message": "Post deleted"
    })))
}

async fn toggle_reaction(
    State(state): State<Arc<AppState>>,
    OptionalAuth(user): OptionalAuth,
    Path(post_id): Path<Uuid>,
) -> Result<Json<Value>> {
    let user = user.ok_or_else(|| AppError::unauthorized("Authentication required"))?;

    let reaction_state = state.reaction_service.toggle(post_id, user.id).await?;

    Ok(Json(json!({
        "success": true,
        "data": reaction_state
    })))
}
