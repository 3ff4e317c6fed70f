use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use serde_json::json;

use crate::error::Error;

/// Standard API response wrapper
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub data: Option<T>,
    pub error: Option<String>,
}

impl<T: Serialize> ApiResponse<T> {
    #[must_use]
    pub fn success(data: T) -> Self {
        Self {
            data: Some(data),
            error: None,
        }
    }
}

/// API error that converts to a proper HTTP response
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

impl ApiError {
    #[must_use]
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }

    #[must_use]
    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::UNAUTHORIZED,
            message: message.into(),
        }
    }

    #[must_use]
    pub fn not_found(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            message: message.into(),
        }
    }

    #[must_use]
    pub fn conflict(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::CONFLICT,
            message: message.into(),
        }
    }

    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: message.into(),
        }
    }

    #[must_use]
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::SERVICE_UNAVAILABLE,
            message: message.into(),
        }
    }
}

impl From<Error> for ApiError {
    fn from(e: Error) -> Self {
        match e {
            Error::AlreadyExists => ApiError::conflict("Already exists"),
            Error::Validation(msg) => ApiError::bad_request(msg),
            e @ (Error::UnresolvedSupplier(_) | Error::Encoding { .. } | Error::Csv(_)) => {
                ApiError::bad_request(e.to_string())
            }
            Error::Unauthorized | Error::InvalidTokenFormat | Error::SessionExpired => {
                ApiError::unauthorized("Authentication required")
            }
            e @ Error::FontsUnavailable(_) => {
                tracing::warn!("{e}");
                ApiError::unavailable(e.to_string())
            }
            // Storage failures keep their cause so an operator can decide to repair.
            e => {
                tracing::error!("Request failed: {e}");
                ApiError::internal(e.to_string())
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = json!({ "data": null, "error": self.message });
        (self.status, Json(body)).into_response()
    }
}

/// Extension for Option types from store lookups.
pub trait StoreOptionExt<T> {
    fn or_not_found(self, message: &'static str) -> Result<T, ApiError>;
}

impl<T> StoreOptionExt<T> for Option<T> {
    fn or_not_found(self, message: &'static str) -> Result<T, ApiError> {
        self.ok_or_else(|| ApiError::not_found(message))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_mapping() {
        assert_eq!(
            ApiError::from(Error::AlreadyExists).status,
            StatusCode::CONFLICT
        );
        assert_eq!(
            ApiError::from(Error::Validation("bad".into())).message,
            "bad"
        );
        let unresolved = ApiError::from(Error::UnresolvedSupplier("Nobody".into()));
        assert_eq!(unresolved.status, StatusCode::BAD_REQUEST);
        assert!(unresolved.message.contains("Nobody"));
        assert_eq!(
            ApiError::from(Error::FontsUnavailable("x".into())).status,
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            ApiError::from(Error::Config("x".into())).status,
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
