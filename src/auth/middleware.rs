use std::sync::Arc;

use axum::{
    Json,
    extract::FromRequestParts,
    http::{StatusCode, header::AUTHORIZATION, request::Parts},
    response::{IntoResponse, Response},
};
use serde_json::json;

use super::session::{SessionContext, authenticate};
use crate::error::Error;
use crate::server::AppState;

/// Extractor that requires a live session of any role
pub struct RequireSession(pub SessionContext);

/// Extractor that requires a live admin session
pub struct RequireAdmin(pub SessionContext);

#[derive(Debug)]
pub enum AuthError {
    MissingAuth,
    InvalidScheme,
    InvalidToken,
    SessionExpired,
    NotAdmin,
    InternalError,
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AuthError::MissingAuth => (StatusCode::UNAUTHORIZED, "Authentication required"),
            AuthError::InvalidScheme => (StatusCode::UNAUTHORIZED, "Invalid authorization scheme"),
            AuthError::InvalidToken => (StatusCode::UNAUTHORIZED, "Invalid session token"),
            AuthError::SessionExpired => (StatusCode::UNAUTHORIZED, "Session expired"),
            AuthError::NotAdmin => (StatusCode::FORBIDDEN, "Admin role required"),
            AuthError::InternalError => {
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
            }
        };

        let body = json!({ "data": null, "error": message });

        let mut response = (status, Json(body)).into_response();

        if status == StatusCode::UNAUTHORIZED {
            response.headers_mut().insert(
                "WWW-Authenticate",
                axum::http::HeaderValue::from_static("Bearer realm=\"shopdesk\""),
            );
        }

        response
    }
}

impl FromRequestParts<Arc<AppState>> for RequireSession {
    type Rejection = AuthError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let ctx = extract_session(parts, state)?;
        Ok(RequireSession(ctx))
    }
}

impl FromRequestParts<Arc<AppState>> for RequireAdmin {
    type Rejection = AuthError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let ctx = extract_session(parts, state)?;

        if !ctx.role().is_admin() {
            return Err(AuthError::NotAdmin);
        }

        Ok(RequireAdmin(ctx))
    }
}

/// Pulls the bearer token out of the Authorization header.
/// Returns Ok(None) when no header is present.
pub fn extract_bearer_token(auth_header: Option<&str>) -> Result<Option<&str>, AuthError> {
    match auth_header {
        Some(header) => header
            .strip_prefix("Bearer ")
            .map(|token| Some(token.trim()))
            .ok_or(AuthError::InvalidScheme),
        None => Ok(None),
    }
}

fn extract_session(parts: &Parts, state: &Arc<AppState>) -> Result<SessionContext, AuthError> {
    let auth_header = parts
        .headers
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok());

    let raw_token = extract_bearer_token(auth_header)?.ok_or(AuthError::MissingAuth)?;

    authenticate(state.store.as_ref(), &state.tokens, raw_token).map_err(|e| match e {
        Error::Unauthorized | Error::InvalidTokenFormat => AuthError::InvalidToken,
        Error::SessionExpired => AuthError::SessionExpired,
        other => {
            tracing::error!("Session lookup failed: {other}");
            AuthError::InternalError
        }
    })
}
