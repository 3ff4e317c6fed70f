//! Inventory ingestion: the cheapest-lot-wins reconciliation rule and the
//! CSV bulk importer built on top of it.

mod import;
mod reconcile;

pub use import::{
    BatchEncoding, ImportReport, RawRow, RowRejection, ValidRow, decode_batch, import_batch,
    parse_batch, reduce_batch,
};
pub use reconcile::{LotRepository, Outcome, reconcile};

/// Largest accepted quantity or unit price. Keeps `qty * price` of any single
/// lot inside `i64`.
pub const MAX_AMOUNT: i64 = 1_000_000_000;

pub const MAX_JAN_LEN: usize = 32;

/// JAN codes are ASCII letters and digits.
pub fn check_jan(jan: &str) -> Result<(), String> {
    if jan.len() > MAX_JAN_LEN {
        return Err(format!("JAN code cannot exceed {MAX_JAN_LEN} characters"));
    }
    if !jan.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err("JAN code can only contain letters and digits".to_string());
    }
    Ok(())
}

/// Rejects negative amounts and amounts above [`MAX_AMOUNT`].
pub fn check_amount(value: i64, field: &str) -> Result<i64, String> {
    if value < 0 {
        return Err(format!("{field} cannot be negative"));
    }
    if value > MAX_AMOUNT {
        return Err(format!("{field} cannot exceed {MAX_AMOUNT}"));
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_jan() {
        assert!(check_jan("4901234567890").is_ok());
        assert!(check_jan("ABC123").is_ok());
        assert!(check_jan("49-01").is_err());
        assert!(check_jan("４９０１").is_err());
        assert!(check_jan(&"1".repeat(33)).is_err());
    }

    #[test]
    fn test_check_amount_bounds() {
        assert_eq!(check_amount(0, "Price"), Ok(0));
        assert_eq!(check_amount(MAX_AMOUNT, "Price"), Ok(MAX_AMOUNT));
        assert!(check_amount(-1, "Price").unwrap_err().contains("negative"));
        assert!(check_amount(MAX_AMOUNT + 1, "Quantity").unwrap_err().contains("exceed"));
    }
}
