use crate::{
    error::{AppError, Result},
    models::user::{ForgotPasswordRequest, LoginRequest, ResetPasswordRequest, SignupRequest},
    state::AppState,
    utils::middleware::OptionalAuth,
};
use axum::{
    extract::State,
    response::Json,
    routing::{get, post},
    Router,
};
use serde_json::{json, Value};
use std::sync::Arc;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/signup", post(signup))
        .route("/login", post(login))
        .route("/forgot-password", post(forgot_password))
        .route("/reset-password", post(reset_password))
        .route("/me", get(me))
}

async fn signup(
    State(state): State<Arc<AppState>>,
    Json(request): Json<SignupRequest>,
) -> Result<Json<Value>> {
    let user = state.auth_service.signup(request).await?;

    Ok(Json(json!({
        "success": true,
        "message": "Account created successfully!",
        "data": user
    })))
}

async fn login(
    State(state): State<Arc<AppState>>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<Value>> {
    let response = state.auth_service.login(request).await?;

    Ok(Json(json!({
        "success": true,
        "data": response
    })))
}

/// The reply is identical whether or not the email is registered, so the
/// endpoint cannot be used to probe which accounts exist.
async fn forgot_password(
    State(state): State<Arc<AppState>>,
    Json(request): Json<ForgotPasswordRequest>,
) -> Result<Json<Value>> {
    state.auth_service.request_password_reset(&request.email).await?;

    Ok(Json(json!({
        "success": true,
        "message": "If an account exists, a reset link has been sent."
    })))
}

async fn reset_password(
    State(state): State<Arc<AppState>>,
    Json(request): Json<ResetPasswordRequest>,
) -> Result<Json<Value>> {
    state.auth_service.reset_password(request).await?;

    Ok(Json(json!({
        "success": true,
        "message": "Password updated successfully!"
    })))
}

async fn me(OptionalAuth(user): OptionalAuth) -> Result<Json<Value>> {
    let user = user.ok_or_else(|| AppError::unauthorized("Authentication required"))?;

    Ok(Json(json!({
        "success": true,
        "data": user
    })))
}
