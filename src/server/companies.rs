use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};

use crate::auth::RequireSession;
use crate::server::AppState;
use crate::server::dto::CreateCompanyRequest;
use crate::server::response::{ApiError, ApiResponse};
use crate::server::validation::{optional, validate_company_name};

pub async fn list_companies(
    _session: RequireSession,
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, ApiError> {
    let companies = state.store.list_companies()?;
    Ok(Json(ApiResponse::success(companies)))
}

pub async fn create_company(
    RequireSession(ctx): RequireSession,
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateCompanyRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let name = validate_company_name(&req.name)?;
    let reg_num = optional(req.reg_num.as_deref());

    let company = state.store.create_company(&name, reg_num.as_deref())?;
    state.store.append_log(
        ctx.username(),
        &format!("Added company {} ({})", company.name, company.id),
    )?;

    Ok((StatusCode::CREATED, Json(ApiResponse::success(company))))
}

/// Lots that referenced the company stay in place and show as unknown.
pub async fn delete_company(
    RequireSession(ctx): RequireSession,
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    if !state.store.delete_company(id)? {
        return Err(ApiError::not_found("Company not found"));
    }
    state
        .store
        .append_log(ctx.username(), &format!("Deleted company {id}"))?;

    Ok(StatusCode::NO_CONTENT)
}
