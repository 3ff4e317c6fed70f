use std::collections::BTreeSet;
use std::sync::Arc;

use axum::{Json, extract::State, http::header, response::IntoResponse};
use chrono::Local;

use crate::auth::RequireSession;
use crate::invoice::{Invoice, render_pdf};
use crate::server::AppState;
use crate::server::dto::CreateInvoiceRequest;
use crate::server::response::{ApiError, StoreOptionExt};

/// Renders an invoice or quotation for the selected lots as a PDF download.
pub async fn create_invoice(
    RequireSession(ctx): RequireSession,
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateInvoiceRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let ids: Vec<i64> = req
        .lot_ids
        .iter()
        .copied()
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();
    if ids.is_empty() {
        return Err(ApiError::bad_request("Select at least one lot"));
    }

    let company = state
        .store
        .get_company(req.company_id)?
        .or_not_found("Company not found")?;

    let lots = state.store.list_stock_by_ids(&ids)?;
    if lots.len() != ids.len() {
        let missing: Vec<String> = ids
            .iter()
            .filter(|id| !lots.iter().any(|l| l.id == **id))
            .map(i64::to_string)
            .collect();
        return Err(ApiError::bad_request(format!(
            "Unknown lot id(s): {}",
            missing.join(", ")
        )));
    }

    let settings = state.config.invoice_settings();
    let invoice = Invoice::build(
        req.kind,
        &settings.issuer_name,
        &company,
        &lots,
        settings.tax_rate_percent,
        Local::now().date_naive(),
    );
    let pdf = render_pdf(&invoice, &settings)?;

    state.store.append_log(
        ctx.username(),
        &format!(
            "Issued {} for {} ({} lots, total {})",
            req.kind.title().to_lowercase(),
            company.name,
            invoice.lines.len(),
            invoice.total
        ),
    )?;

    let filename = format!(
        "{}-{}-{}.pdf",
        req.kind.title().to_lowercase(),
        company.id,
        invoice.issued_on.format("%Y%m%d")
    );
    Ok((
        [
            (header::CONTENT_TYPE, "application/pdf".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{filename}\""),
            ),
        ],
        pdf,
    ))
}
