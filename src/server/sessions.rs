use std::sync::Arc;

use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use chrono::Duration;

use crate::auth::{self, RequireSession};
use crate::error::Error;
use crate::server::AppState;
use crate::server::dto::{LoginRequest, LoginResponse};
use crate::server::response::{ApiError, ApiResponse};

pub async fn login(
    State(state): State<Arc<AppState>>,
    Json(req): Json<LoginRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let ttl = Duration::hours(state.config.session_ttl_hours);
    let (ctx, token) = auth::login(
        state.store.as_ref(),
        &state.tokens,
        req.username.trim(),
        &req.password,
        ttl,
    )
    .map_err(|e| match e {
        Error::Unauthorized => ApiError::unauthorized("Invalid username or password"),
        other => ApiError::from(other),
    })?;

    tracing::info!(username = ctx.username(), "Session opened");

    Ok(Json(ApiResponse::success(LoginResponse {
        token,
        expires_at: ctx.session.expires_at,
        account: ctx.account,
    })))
}

pub async fn logout(
    RequireSession(ctx): RequireSession,
    State(state): State<Arc<AppState>>,
) -> Result<StatusCode, ApiError> {
    auth::logout(state.store.as_ref(), &ctx)?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn me(RequireSession(ctx): RequireSession) -> impl IntoResponse {
    Json(ApiResponse::success(ctx.account))
}
