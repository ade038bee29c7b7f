//! Application-wide error types.

use thiserror::Error;

use crate::credentials::TokenError;

/// Application-wide result type.
pub type Result<T> = std::result::Result<T, Error>;

/// Application-wide error type.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Credentials already exist for user {0}")]
    AlreadyExists(String),

    #[error("No credentials found for user {0}")]
    NotFound(String),

    #[error("Invalid credential details: {0}")]
    InvalidDetails(String),

    #[error("Database error: {0}")]
    DatabaseSqlx(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Other(String),
}

impl Error {
    pub fn already_exists(user: impl Into<String>) -> Self {
        Self::AlreadyExists(user.into())
    }

    pub fn not_found(user: impl Into<String>) -> Self {
        Self::NotFound(user.into())
    }

    pub fn invalid_details(msg: impl Into<String>) -> Self {
        Self::InvalidDetails(msg.into())
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    /// Whether this error was caused by the caller's input rather than a system fault.
    pub fn is_caller_error(&self) -> bool {
        matches!(
            self,
            Self::AlreadyExists(_) | Self::NotFound(_) | Self::InvalidDetails(_)
        )
    }
}

impl From<TokenError> for Error {
    fn from(err: TokenError) -> Self {
        Self::InvalidDetails(err.to_string())
    }
}
