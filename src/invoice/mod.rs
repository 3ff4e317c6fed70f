//! Invoices and quotations for a set of selected lots.

mod pdf;

pub use pdf::render_pdf;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::types::{Company, StockView};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InvoiceKind {
    #[default]
    Invoice,
    Quote,
}

impl InvoiceKind {
    #[must_use]
    pub const fn title(self) -> &'static str {
        match self {
            InvoiceKind::Invoice => "INVOICE",
            InvoiceKind::Quote => "QUOTATION",
        }
    }

    /// Only invoices carry the recipient's registration number.
    #[must_use]
    pub const fn shows_reg_num(self) -> bool {
        matches!(self, InvoiceKind::Invoice)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InvoiceLine {
    pub item: String,
    pub qty: i64,
    pub unit_price: i64,
    pub line_total: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Invoice {
    pub kind: InvoiceKind,
    pub issuer_name: String,
    pub recipient: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reg_num: Option<String>,
    pub issued_on: NaiveDate,
    pub lines: Vec<InvoiceLine>,
    pub subtotal: i64,
    pub tax_rate_percent: i64,
    pub tax: i64,
    pub total: i64,
}

impl Invoice {
    /// Tax is rounded down to the whole yen.
    pub fn build(
        kind: InvoiceKind,
        issuer_name: &str,
        recipient: &Company,
        lots: &[StockView],
        tax_rate_percent: i64,
        issued_on: NaiveDate,
    ) -> Self {
        let lines: Vec<InvoiceLine> = lots
            .iter()
            .map(|lot| InvoiceLine {
                item: lot.item.clone(),
                qty: lot.qty,
                unit_price: lot.price,
                line_total: lot.total_value(),
            })
            .collect();

        let subtotal = lines
            .iter()
            .fold(0i64, |acc, l| acc.saturating_add(l.line_total));
        let tax = (i128::from(subtotal) * i128::from(tax_rate_percent)).div_euclid(100);
        let tax = i64::try_from(tax).unwrap_or(i64::MAX);

        Self {
            kind,
            issuer_name: issuer_name.to_string(),
            recipient: recipient.name.clone(),
            reg_num: recipient.reg_num.clone().filter(|_| kind.shows_reg_num()),
            issued_on,
            lines,
            subtotal,
            tax_rate_percent,
            tax,
            total: subtotal.saturating_add(tax),
        }
    }
}

/// Formats an amount as yen with thousands separators, e.g. `¥12,345`.
#[must_use]
pub fn format_yen(amount: i64) -> String {
    let digits = amount.unsigned_abs().to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }
    let sign = if amount < 0 { "-" } else { "" };
    format!("{sign}¥{grouped}")
}
