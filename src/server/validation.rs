use crate::inventory::{check_amount, check_jan};
use crate::server::response::ApiError;

const MAX_COMPANY_NAME_LEN: usize = 200;
const MAX_ITEM_NAME_LEN: usize = 200;
const MAX_USERNAME_LEN: usize = 32;

fn required(value: &str, field: &str, max_len: usize) -> Result<String, ApiError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(ApiError::bad_request(format!("{field} cannot be empty")));
    }
    if value.chars().count() > max_len {
        return Err(ApiError::bad_request(format!(
            "{field} cannot exceed {max_len} characters"
        )));
    }
    Ok(value.to_string())
}

/// Trims the value and maps blank input to `None`.
#[must_use]
pub fn optional(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// Usernames are ASCII letters, digits, hyphens, underscores and periods.
pub fn validate_username(name: &str) -> Result<(), String> {
    if name.is_empty() {
        return Err("Username cannot be empty".to_string());
    }
    if name.len() > MAX_USERNAME_LEN {
        return Err(format!(
            "Username cannot exceed {MAX_USERNAME_LEN} characters"
        ));
    }
    if !name
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
    {
        return Err(
            "Username can only contain alphanumeric characters, hyphens, underscores, and periods"
                .to_string(),
        );
    }
    Ok(())
}

pub fn validate_company_name(name: &str) -> Result<String, ApiError> {
    required(name, "Company name", MAX_COMPANY_NAME_LEN)
}

pub fn validate_item_name(name: &str) -> Result<String, ApiError> {
    required(name, "Item name", MAX_ITEM_NAME_LEN)
}

/// Blank codes mean the lot has no JAN.
pub fn validate_jan(jan: Option<&str>) -> Result<Option<String>, ApiError> {
    let jan = optional(jan);
    if let Some(jan) = &jan {
        check_jan(jan).map_err(ApiError::bad_request)?;
    }
    Ok(jan)
}

pub fn validate_amount(value: i64, field: &str) -> Result<i64, ApiError> {
    check_amount(value, field).map_err(ApiError::bad_request)
}
