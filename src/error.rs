use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("already exists")]
    AlreadyExists,

    #[error("session lookup collision")]
    SessionLookupCollision,

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    #[error("could not decode batch as {primary} or {fallback}")]
    Encoding {
        primary: &'static str,
        fallback: &'static str,
    },

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("unauthorized")]
    Unauthorized,

    #[error("invalid token format")]
    InvalidTokenFormat,

    #[error("session expired")]
    SessionExpired,

    #[error("validation error: {0}")]
    Validation(String),

    #[error("unresolved supplier: {0}")]
    UnresolvedSupplier(String),

    #[error("pdf error: {0}")]
    Pdf(String),

    #[error("invoice fonts unavailable: {0}")]
    FontsUnavailable(String),
}

pub type Result<T> = std::result::Result<T, Error>;
