/**
 * Authentication Middleware
 *
 * Verifies the bearer token, loads the caller's user record and attaches a
 * `Caller` to the request extensions. Handlers read it through `AuthUser`.
 *
 * Browsers cannot set headers on an `EventSource`, so the live connection
 * endpoint also accepts the token as `?token=`.
 */

use axum::{
    extract::{FromRequestParts, Request, State},
    http::{header::AUTHORIZATION, request::Parts},
    middleware::Next,
    response::Response,
};

use crate::backend::auth::sessions::verify_token;
use crate::backend::error::{BackendError, BackendResult};
use crate::backend::server::state::AppState;
use crate::shared::user::Caller;

fn bearer_token(parts: &Parts) -> Option<String> {
    if let Some(token) = parts
        .headers
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
    {
        return Some(token.trim().to_string());
    }
    parts.uri.query().and_then(|query| {
        query
            .split('&')
            .filter_map(|pair| pair.split_once('='))
            .find(|(k, _)| *k == "token")
            .map(|(_, v)| v.to_string())
    })
}

/// Resolve the caller for a request
pub async fn authenticate(state: &AppState, parts: &Parts) -> BackendResult<Caller> {
    let token = bearer_token(parts).ok_or_else(|| {
        tracing::warn!("[Auth] Missing Authorization header");
        BackendError::unauthorized("Please log in")
    })?;

    let claims = verify_token(&state.config.jwt_secret, &token)?;
    let user_id = claims.user_id()?;

    let user = state.store.get_user(user_id).await?.ok_or_else(|| {
        tracing::warn!("[Auth] Token for unknown user {}", user_id);
        BackendError::unauthorized("User no longer exists")
    })?;

    Ok(Caller::from(&user))
}

/// Authentication middleware
///
/// Returns 401 with the standard error body if the token is missing, invalid
/// or names a user that does not exist.
pub async fn auth_middleware(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, BackendError> {
    let (mut parts, body) = request.into_parts();
    let caller = authenticate(&state, &parts).await?;
    parts.extensions.insert(caller);
    Ok(next.run(Request::from_parts(parts, body)).await)
}

/// Axum extractor for the authenticated caller
#[derive(Clone, Debug)]
pub struct AuthUser(pub Caller);

impl<S: Send + Sync> FromRequestParts<S> for AuthUser {
    type Rejection = BackendError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let caller = parts.extensions.get::<Caller>().cloned().ok_or_else(|| {
            tracing::warn!("[Auth] Caller not found in request extensions");
            BackendError::unauthorized("Please log in")
        })?;
        Ok(AuthUser(caller))
    }
}
