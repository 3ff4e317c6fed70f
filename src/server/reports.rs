use std::sync::Arc;

use axum::{
    Json,
    extract::{Query, State},
    response::IntoResponse,
};

use crate::auth::RequireSession;
use crate::reports;
use crate::server::AppState;
use crate::server::dto::CatalogParams;
use crate::server::response::{ApiError, ApiResponse};

pub async fn dashboard(
    _session: RequireSession,
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, ApiError> {
    let lots = state.store.list_stock()?;
    Ok(Json(ApiResponse::success(reports::dashboard(&lots))))
}

pub async fn catalog(
    _session: RequireSession,
    State(state): State<Arc<AppState>>,
    Query(params): Query<CatalogParams>,
) -> Result<impl IntoResponse, ApiError> {
    let lots = state.store.list_stock()?;
    let entries = reports::catalog(&lots, params.q.as_deref());
    Ok(Json(ApiResponse::success(entries)))
}
