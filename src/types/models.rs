use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::Role;

/// Label used wherever a lot references a company that no longer exists.
pub const UNKNOWN_COMPANY: &str = "unknown company";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Company {
    pub id: i64,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reg_num: Option<String>,
}

/// A stored inventory lot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockLot {
    pub id: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub jan: Option<String>,
    pub item: String,
    pub qty: i64,
    pub price: i64,
    pub company_id: i64,
    #[serde(skip)]
    pub image: Option<Vec<u8>>,
}

/// A lot that has not been stored yet: the candidate handed to reconciliation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewLot {
    pub jan: Option<String>,
    pub item: String,
    pub qty: i64,
    pub price: i64,
    pub company_id: i64,
    pub image: Option<Vec<u8>>,
}

impl NewLot {
    /// Materializes the candidate as a stored lot with the given row id.
    #[must_use]
    pub fn into_lot(self, id: i64) -> StockLot {
        StockLot {
            id,
            jan: self.jan,
            item: self.item,
            qty: self.qty,
            price: self.price,
            company_id: self.company_id,
            image: self.image,
        }
    }
}

/// A lot joined with its company, as shown in listings and reports.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockView {
    pub id: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub jan: Option<String>,
    pub item: String,
    pub qty: i64,
    pub price: i64,
    pub company_id: i64,
    /// `None` when the referenced company has been deleted.
    pub company_name: Option<String>,
    pub has_image: bool,
}

impl StockView {
    /// Saturates instead of wrapping; stored rows may predate the amount bounds.
    #[must_use]
    pub fn total_value(&self) -> i64 {
        self.qty.saturating_mul(self.price)
    }

    #[must_use]
    pub fn company_label(&self) -> &str {
        self.company_name.as_deref().unwrap_or(UNKNOWN_COMPANY)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEntry {
    pub id: i64,
    pub timestamp: String,
    pub user: String,
    pub action: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Account {
    pub id: i64,
    pub username: String,
    #[serde(skip)]
    pub password_hash: String,
    pub role: Role,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub id: String,
    pub account_id: i64,
    #[serde(skip)]
    pub token_lookup: String,
    #[serde(skip)]
    pub token_hash: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}
