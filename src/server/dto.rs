use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::inventory::{BatchEncoding, ImportReport, Outcome};
use crate::invoice::InvoiceKind;
use crate::types::Account;

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub expires_at: DateTime<Utc>,
    pub account: Account,
}

#[derive(Debug, Deserialize)]
pub struct CreateCompanyRequest {
    pub name: String,
    #[serde(default)]
    pub reg_num: Option<String>,
}

/// Company given either by id or by exact name.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum CompanyRef {
    Id(i64),
    Name(String),
}

#[derive(Debug, Deserialize)]
pub struct SubmitLotRequest {
    #[serde(default)]
    pub jan: Option<String>,
    pub item: String,
    pub qty: i64,
    pub price: i64,
    pub company: CompanyRef,
    /// Base64 encoded image payload.
    #[serde(default)]
    pub image: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SubmitLotResponse {
    pub outcome: Outcome,
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct ImportResponse {
    pub encoding: BatchEncoding,
    #[serde(flatten)]
    pub report: ImportReport,
}

#[derive(Debug, Default, Deserialize)]
pub struct CatalogParams {
    #[serde(default)]
    pub q: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CreateInvoiceRequest {
    pub company_id: i64,
    pub lot_ids: Vec<i64>,
    #[serde(default)]
    pub kind: InvoiceKind,
}

#[derive(Debug, Serialize)]
pub struct RepairResponse {
    pub repaired: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_company_ref_accepts_id_or_name() {
        let by_id: SubmitLotRequest = serde_json::from_str(
            r#"{"item":"Pen","qty":1,"price":100,"company":3}"#,
        )
        .unwrap();
        assert!(matches!(by_id.company, CompanyRef::Id(3)));
        assert_eq!(by_id.jan, None);

        let by_name: SubmitLotRequest = serde_json::from_str(
            r#"{"jan":"123","item":"Pen","qty":1,"price":100,"company":"Acme"}"#,
        )
        .unwrap();
        assert!(matches!(by_name.company, CompanyRef::Name(ref n) if n == "Acme"));
    }

    #[test]
    fn test_invoice_kind_defaults_to_invoice() {
        let req: CreateInvoiceRequest =
            serde_json::from_str(r#"{"company_id":1,"lot_ids":[1,2]}"#).unwrap();
        assert_eq!(req.kind, InvoiceKind::Invoice);
        let req: CreateInvoiceRequest =
            serde_json::from_str(r#"{"company_id":1,"lot_ids":[],"kind":"quote"}"#).unwrap();
        assert_eq!(req.kind, InvoiceKind::Quote);
    }
}
