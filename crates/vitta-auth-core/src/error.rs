//! Auth errors

use thiserror::Error;

/// Authentication errors
#[derive(Error, Debug)]
pub enum AuthError {
    /// Bad password, bad signature, expired/rotated/revoked token.
    ///
    /// All of these surface identically so callers cannot probe which
    /// check failed.
    #[error("invalid credentials")]
    InvalidCredentials,

    /// Valid token, but the account is disabled
    #[error("account disabled")]
    AccountDisabled,

    /// Registration attempted with an email that is already registered
    #[error("email already registered")]
    EmailTaken,

    /// Malformed request input (e.g. missing password)
    #[error("validation error: {0}")]
    Validation(String),

    /// Rate limit exceeded
    #[error("rate limit exceeded")]
    RateLimited,

    /// Backing store unavailable; surfaced, never retried here
    #[error("storage error: {0}")]
    Storage(String),

    /// Internal error
    #[error("internal error: {0}")]
    Internal(String),
}

impl AuthError {
    /// Get HTTP status code for this error
    pub fn status_code(&self) -> u16 {
        match self {
            Self::InvalidCredentials => 401,
            Self::AccountDisabled => 400,
            Self::EmailTaken | Self::Validation(_) => 400,
            Self::RateLimited => 429,
            Self::Storage(_) | Self::Internal(_) => 500,
        }
    }

    /// Get error code for API responses
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidCredentials => "INVALID_CREDENTIALS",
            Self::AccountDisabled => "ACCOUNT_DISABLED",
            Self::EmailTaken => "EMAIL_TAKEN",
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::RateLimited => "RATE_LIMIT_EXCEEDED",
            Self::Storage(_) => "STORAGE_ERROR",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }
}

impl From<vitta_db::DbError> for AuthError {
    fn from(err: vitta_db::DbError) -> Self {
        match err {
            vitta_db::DbError::UniqueViolation(_) => Self::EmailTaken,
            other => {
                tracing::error!("database error: {}", other);
                Self::Storage(other.to_string())
            }
        }
    }
}
