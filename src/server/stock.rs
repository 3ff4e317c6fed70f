use std::sync::Arc;

use axum::{
    Json,
    body::Bytes,
    extract::{Path, State},
    http::{StatusCode, header},
    response::IntoResponse,
};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;

use crate::auth::RequireSession;
use crate::error::Error;
use crate::inventory::{Outcome, decode_batch, import_batch};
use crate::server::AppState;
use crate::server::dto::{CompanyRef, ImportResponse, SubmitLotRequest, SubmitLotResponse};
use crate::server::response::{ApiError, ApiResponse, StoreOptionExt};
use crate::server::validation::{validate_amount, validate_item_name, validate_jan};
use crate::types::NewLot;

pub async fn list_stock(
    _session: RequireSession,
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, ApiError> {
    let lots = state.store.list_stock()?;
    Ok(Json(ApiResponse::success(lots)))
}

fn describe_submission(lot: &NewLot, outcome: Outcome) -> String {
    let label = match &lot.jan {
        Some(jan) => format!("{} (JAN {jan})", lot.item),
        None => lot.item.clone(),
    };
    match outcome {
        Outcome::Inserted => format!("Added {label} at {}", lot.price),
        Outcome::Replaced => format!("Updated cheapest price of {label} to {}", lot.price),
        Outcome::Skipped => format!(
            "Skipped {label} at {}: stored price is cheaper or equal",
            lot.price
        ),
    }
}

/// Single-item form. Runs the same reconciliation as the bulk importer.
pub async fn submit_lot(
    RequireSession(ctx): RequireSession,
    State(state): State<Arc<AppState>>,
    Json(req): Json<SubmitLotRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let jan = validate_jan(req.jan.as_deref())?;
    let item = validate_item_name(&req.item)?;
    let qty = validate_amount(req.qty, "Quantity")?;
    let price = validate_amount(req.price, "Price")?;

    let company = match &req.company {
        CompanyRef::Id(id) => state
            .store
            .get_company(*id)?
            .ok_or_else(|| Error::UnresolvedSupplier(format!("company #{id}")))?,
        CompanyRef::Name(name) => state
            .store
            .find_company_by_name(name.trim())?
            .ok_or_else(|| Error::UnresolvedSupplier(name.trim().to_string()))?,
    };

    let image = req
        .image
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| STANDARD.decode(s))
        .transpose()
        .map_err(|_| ApiError::bad_request("Image is not valid base64"))?;

    let lot = NewLot {
        jan,
        item,
        qty,
        price,
        company_id: company.id,
        image,
    };

    let outcome = state
        .store
        .reconcile_lot_logged(&lot, ctx.username(), &|outcome| {
            describe_submission(&lot, outcome)
        })?;
    let message = describe_submission(&lot, outcome);

    let status = if outcome.is_write() {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };
    Ok((
        status,
        Json(ApiResponse::success(SubmitLotResponse { outcome, message })),
    ))
}

/// Bulk import. The body is the raw CSV file in UTF-8 or Shift_JIS.
pub async fn import_stock(
    RequireSession(ctx): RequireSession,
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<impl IntoResponse, ApiError> {
    let (rows, encoding) = decode_batch(&body)?;
    let report = import_batch(state.store.as_ref(), rows, ctx.username())?;

    Ok(Json(ApiResponse::success(ImportResponse { encoding, report })))
}

fn sniff_image_type(bytes: &[u8]) -> &'static str {
    if bytes.starts_with(b"\x89PNG\r\n\x1a\n") {
        "image/png"
    } else if bytes.starts_with(b"\xFF\xD8\xFF") {
        "image/jpeg"
    } else if bytes.starts_with(b"GIF8") {
        "image/gif"
    } else if bytes.len() > 12 && &bytes[..4] == b"RIFF" && &bytes[8..12] == b"WEBP" {
        "image/webp"
    } else {
        "application/octet-stream"
    }
}

pub async fn get_image(
    _session: RequireSession,
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let lot = state.store.get_lot(id)?.or_not_found("Lot not found")?;
    let image = lot.image.or_not_found("Lot has no image")?;

    Ok(([(header::CONTENT_TYPE, sniff_image_type(&image))], image))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sniff_image_type() {
        assert_eq!(sniff_image_type(b"\x89PNG\r\n\x1a\n...."), "image/png");
        assert_eq!(sniff_image_type(b"\xFF\xD8\xFF\xE0"), "image/jpeg");
        assert_eq!(sniff_image_type(b"hello"), "application/octet-stream");
    }

    #[test]
    fn test_describe_submission() {
        let lot = NewLot {
            jan: Some("4901".to_string()),
            item: "Pen".to_string(),
            qty: 1,
            price: 90,
            company_id: 1,
            image: None,
        };
        assert_eq!(
            describe_submission(&lot, Outcome::Replaced),
            "Updated cheapest price of Pen (JAN 4901) to 90"
        );
        let no_jan = NewLot { jan: None, ..lot };
        assert_eq!(describe_submission(&no_jan, Outcome::Inserted), "Added Pen at 90");
    }
}
