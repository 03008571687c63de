//! Client error types

use shared::{AppError, ErrorCode};
use thiserror::Error;

/// Client error type
#[derive(Debug, Error)]
pub enum ClientError {
    /// Transport failure: connection refused, timeout, broken stream
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Server answered with a failure envelope
    #[error("API error {code}: {message}")]
    Api {
        code: ErrorCode,
        message: String,
        details: Option<serde_json::Value>,
    },

    /// Missing, expired or rejected token
    #[error("Authentication required: {0}")]
    Unauthorized(String),

    #[error("Permission denied: {0}")]
    Forbidden(String),

    #[error("Not found: {0}")]
    NotFound(String),

    /// Rejected locally before any request was made
    #[error("Validation error: {0}")]
    Validation(String),

    /// Invalid response format
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Session persistence failed
    #[error("Storage error: {0}")]
    Storage(String),

    /// Position unavailable or permission denied
    #[error("Geolocation error: {0}")]
    Geolocation(String),
}

impl ClientError {
    /// Server-side error code, when the failure came from an envelope
    pub fn code(&self) -> Option<ErrorCode> {
        match self {
            ClientError::Api { code, .. } => Some(*code),
            _ => None,
        }
    }

    /// The request never got a usable answer
    pub fn is_network(&self) -> bool {
        matches!(self, ClientError::Http(_))
    }

    pub fn is_unauthorized(&self) -> bool {
        match self {
            ClientError::Unauthorized(_) => true,
            ClientError::Api { code, .. } => code.category() == shared::error::ErrorCategory::Auth,
            _ => false,
        }
    }
}

impl From<AppError> for ClientError {
    fn from(err: AppError) -> Self {
        ClientError::Api {
            code: err.code,
            message: err.message,
            details: err
                .details
                .map(|d| serde_json::Value::Object(d.into_iter().collect())),
        }
    }
}

/// Result type for client operations
pub type ClientResult<T> = Result<T, ClientError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_app_error_keeps_code() {
        let err: ClientError = AppError::new(ErrorCode::PasswordMismatch).into();
        assert_eq!(err.code(), Some(ErrorCode::PasswordMismatch));
        assert!(err.to_string().contains("Passwords do not match"));
        assert!(!err.is_network());
    }

    #[test]
    fn test_auth_codes_count_as_unauthorized() {
        let err: ClientError = AppError::token_expired().into();
        assert!(err.is_unauthorized());
        assert!(ClientError::Unauthorized("expired".into()).is_unauthorized());
        assert!(!ClientError::NotFound("x".into()).is_unauthorized());
    }
}
