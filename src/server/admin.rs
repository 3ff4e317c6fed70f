use std::sync::Arc;

use axum::{Json, extract::State, response::IntoResponse};

use crate::auth::RequireAdmin;
use crate::server::AppState;
use crate::server::dto::RepairResponse;
use crate::server::response::{ApiError, ApiResponse};

const LOG_PAGE_SIZE: i64 = 100;

pub async fn list_logs(
    _admin: RequireAdmin,
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, ApiError> {
    let entries = state.store.list_logs(LOG_PAGE_SIZE)?;
    Ok(Json(ApiResponse::success(entries)))
}

/// Re-runs schema initialization, restoring missing tables, columns and
/// indexes. Lots sharing a JAN code are collapsed to the cheapest one first,
/// so this may delete rows.
pub async fn repair(
    RequireAdmin(ctx): RequireAdmin,
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, ApiError> {
    state.store.initialize()?;
    state
        .store
        .append_log(ctx.username(), "Repaired database schema")?;
    tracing::info!(username = ctx.username(), "Database schema repaired");

    Ok(Json(ApiResponse::success(RepairResponse { repaired: true })))
}
