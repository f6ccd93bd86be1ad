use crate::{AppError, AppState};
use axum::{
    extract::{Request, State},
    http::HeaderMap,
    middleware::Next,
    response::Response,
};

#[cfg(test)]
#[path = "auth_mw_tests.rs"]
mod auth_mw_tests;

/// Extension type carrying the authenticated user's id.
#[derive(Clone, Copy, Debug)]
pub struct CurrentUser(pub i64);

/// Extension type carrying the raw bearer token, for logout and refresh.
#[derive(Clone, Debug)]
pub struct BearerToken(pub String);

/// Session authentication middleware for protected routes.
///
/// Extracts the bearer token, resolves it through the session store, and
/// stashes [`CurrentUser`] and [`BearerToken`] in request extensions. Missing,
/// unknown, and expired tokens all fail the same way.
pub async fn auth_middleware(
    State(state): State<AppState>,
    headers: HeaderMap,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = extract_bearer_token(&headers)?;

    match state.sessions.verify(&token).await? {
        Some(user_id) => {
            request.extensions_mut().insert(CurrentUser(user_id));
            request.extensions_mut().insert(BearerToken(token));
            Ok(next.run(request).await)
        }
        None => {
            tracing::warn!("Rejected session token: {}", mask_token(&token));
            Err(AppError::Unauthorized("Invalid or expired token"))
        }
    }
}

/// Pull the token out of `Authorization: Bearer <token>`.
pub(crate) fn extract_bearer_token(headers: &HeaderMap) -> Result<String, AppError> {
    if let Some(auth) = headers.get("Authorization") {
        if let Ok(auth_str) = auth.to_str() {
            if let Some(token) = auth_str.strip_prefix("Bearer ") {
                if !token.is_empty() {
                    return Ok(token.to_string());
                }
            }
        }
    }

    Err(AppError::Unauthorized("Authentication required"))
}

/// Mask a token for logging (first 4 and last 4 characters only).
pub(crate) fn mask_token(token: &str) -> String {
    if token.len() <= 8 {
        return "****".to_string();
    }
    format!("{}...{}", &token[..4], &token[token.len() - 4..])
}
