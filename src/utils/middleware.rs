use crate::{error::AppError, services::auth::CurrentUser, state::AppState};
use axum::{
    body::Body,
    extract::State,
    http::Request,
    middleware::Next,
    response::Response,
};
use std::sync::Arc;
use tracing::debug;

/// Resolves the current session's user for every request. A valid Bearer
/// token puts a `CurrentUser` into the request extensions; anything else
/// leaves the request unauthenticated rather than rejecting it, so public
/// reads keep working and mutation handlers decide for themselves.
pub async fn auth_middleware(
    State(state): State<Arc<AppState>>,
    mut request: Request<Body>,
    next: Next<Body>,
) -> Result<Response, AppError> {
    let token = request
        .headers()
        .get("authorization")
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .map(str::to_owned);

    if let Some(token) = token {
        match state.auth_service.verify_jwt(&token) {
            Ok(claims) => match state.auth_service.resolve_user(&claims.sub).await {
                Ok(Some(user)) => {
                    debug!("Authenticated user: {} ({})", user.id, user.email);
                    request.extensions_mut().insert(user);
                }
                Ok(None) => {
                    debug!("Token subject no longer exists: {}", claims.sub);
                }
                Err(e) => {
                    debug!("Failed to resolve user from token: {}", e);
                }
            },
            Err(e) => {
                debug!("JWT verification failed: {}", e);
            }
        }
    }

    Ok(next.run(request).await)
}

/// Optional authentication extractor
pub struct OptionalAuth(pub Option<CurrentUser>);

#[async_trait::async_trait]
impl<S> axum::extract::FromRequestParts<S> for OptionalAuth
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut axum::http::request::Parts,
        _state: &S,
    ) -> Result<Self, Self::Rejection> {
        let user = parts.extensions.get::<CurrentUser>().cloned();
        Ok(OptionalAuth(user))
    }
}
