//! Unified error codes
//!
//! Codes are grouped by range:
//! - 0xxx: General
//! - 1xxx: Authentication
//! - 2xxx: Permission
//! - 3xxx: Issue
//! - 4xxx: Location
//! - 9xxx: System

use serde::{Deserialize, Serialize};
use std::fmt;

/// Error code shared by the server and the client
///
/// Serialized as a plain number so both sides agree on the wire format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "u16", try_from = "u16")]
#[repr(u16)]
pub enum ErrorCode {
    // ==================== 0xxx: General ====================
    /// Operation succeeded
    Success = 0,
    /// Unknown error
    Unknown = 1,
    /// Validation failed
    ValidationFailed = 2,
    /// Resource not found
    NotFound = 3,
    /// Resource already exists
    AlreadyExists = 4,
    /// Invalid request
    InvalidRequest = 5,
    /// Invalid format
    InvalidFormat = 6,
    /// Required field missing
    RequiredField = 7,
    /// Value out of range
    ValueOutOfRange = 8,

    // ==================== 1xxx: Auth ====================
    /// Not authenticated
    NotAuthenticated = 1001,
    /// Invalid email or password
    InvalidCredentials = 1002,
    /// Token expired
    TokenExpired = 1003,
    /// Token invalid
    TokenInvalid = 1004,
    /// Session expired
    SessionExpired = 1005,
    /// Account disabled
    AccountDisabled = 1007,
    /// Email already registered
    EmailAlreadyRegistered = 1008,
    /// Password too short
    PasswordTooShort = 1009,
    /// Password and confirmation differ
    PasswordMismatch = 1010,
    /// Too many attempts from this address
    TooManyRequests = 1011,

    // ==================== 2xxx: Permission ====================
    /// Permission denied
    PermissionDenied = 2001,
    /// Officer role required
    OfficerRequired = 2002,
    /// Admin role required
    AdminRequired = 2003,

    // ==================== 3xxx: Issue ====================
    /// Issue not found
    IssueNotFound = 3001,
    /// Status can only move forward
    InvalidStatusTransition = 3002,
    /// User already upvoted this issue
    AlreadyUpvoted = 3003,
    /// Comment text is empty
    CommentEmpty = 3004,
    /// Issue description is empty
    IssueTextEmpty = 3005,

    // ==================== 4xxx: Location ====================
    /// Coordinates out of range
    InvalidCoordinates = 4001,
    /// Location is required
    LocationRequired = 4002,
    /// Device position unavailable
    GeolocationUnavailable = 4003,

    // ==================== 9xxx: System ====================
    /// Internal server error
    InternalError = 9001,
    /// Database error
    DatabaseError = 9002,
    /// Configuration error
    ConfigError = 9003,
    /// Network error
    NetworkError = 9004,
    /// Operation timed out
    TimeoutError = 9005,
}

impl ErrorCode {
    /// Numeric value of this code
    #[inline]
    pub const fn code(&self) -> u16 {
        *self as u16
    }

    #[inline]
    pub const fn is_success(&self) -> bool {
        matches!(self, ErrorCode::Success)
    }

    /// Default human-readable message
    pub const fn message(&self) -> &'static str {
        match self {
            ErrorCode::Success => "Success",
            ErrorCode::Unknown => "Unknown error",
            ErrorCode::ValidationFailed => "Validation failed",
            ErrorCode::NotFound => "Resource not found",
            ErrorCode::AlreadyExists => "Resource already exists",
            ErrorCode::InvalidRequest => "Invalid request",
            ErrorCode::InvalidFormat => "Invalid format",
            ErrorCode::RequiredField => "Required field missing",
            ErrorCode::ValueOutOfRange => "Value out of range",

            ErrorCode::NotAuthenticated => "Not authenticated",
            ErrorCode::InvalidCredentials => "Invalid email or password",
            ErrorCode::TokenExpired => "Token expired",
            ErrorCode::TokenInvalid => "Invalid token",
            ErrorCode::SessionExpired => "Session expired",
            ErrorCode::AccountDisabled => "Account disabled",
            ErrorCode::EmailAlreadyRegistered => "Email already registered",
            ErrorCode::PasswordTooShort => "Password must be at least 6 characters",
            ErrorCode::PasswordMismatch => "Passwords do not match",
            ErrorCode::TooManyRequests => "Too many requests, try again later",

            ErrorCode::PermissionDenied => "Permission denied",
            ErrorCode::OfficerRequired => "Officer role required",
            ErrorCode::AdminRequired => "Admin role required",

            ErrorCode::IssueNotFound => "Issue not found",
            ErrorCode::InvalidStatusTransition => "Issue status can only move forward",
            ErrorCode::AlreadyUpvoted => "Issue already upvoted",
            ErrorCode::CommentEmpty => "Comment text is required",
            ErrorCode::IssueTextEmpty => "Issue description is required",

            ErrorCode::InvalidCoordinates => "Invalid coordinates",
            ErrorCode::LocationRequired => "Location is required",
            ErrorCode::GeolocationUnavailable => "Geolocation unavailable",

            ErrorCode::InternalError => "Internal server error",
            ErrorCode::DatabaseError => "Database error",
            ErrorCode::ConfigError => "Configuration error",
            ErrorCode::NetworkError => "Network error",
            ErrorCode::TimeoutError => "Operation timed out",
        }
    }
}

impl From<ErrorCode> for u16 {
    #[inline]
    fn from(code: ErrorCode) -> Self {
        code.code()
    }
}

/// Returned when a number does not map to any [`ErrorCode`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvalidErrorCode(pub u16);

impl fmt::Display for InvalidErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid error code: {}", self.0)
    }
}

impl std::error::Error for InvalidErrorCode {}

impl TryFrom<u16> for ErrorCode {
    type Error = InvalidErrorCode;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        match value {
            // General
            0 => Ok(ErrorCode::Success),
            1 => Ok(ErrorCode::Unknown),
            2 => Ok(ErrorCode::ValidationFailed),
            3 => Ok(ErrorCode::NotFound),
            4 => Ok(ErrorCode::AlreadyExists),
            5 => Ok(ErrorCode::InvalidRequest),
            6 => Ok(ErrorCode::InvalidFormat),
            7 => Ok(ErrorCode::RequiredField),
            8 => Ok(ErrorCode::ValueOutOfRange),

            // Auth
            1001 => Ok(ErrorCode::NotAuthenticated),
            1002 => Ok(ErrorCode::InvalidCredentials),
            1003 => Ok(ErrorCode::TokenExpired),
            1004 => Ok(ErrorCode::TokenInvalid),
            1005 => Ok(ErrorCode::SessionExpired),
            1007 => Ok(ErrorCode::AccountDisabled),
            1008 => Ok(ErrorCode::EmailAlreadyRegistered),
            1009 => Ok(ErrorCode::PasswordTooShort),
            1010 => Ok(ErrorCode::PasswordMismatch),
            1011 => Ok(ErrorCode::TooManyRequests),

            // Permission
            2001 => Ok(ErrorCode::PermissionDenied),
            2002 => Ok(ErrorCode::OfficerRequired),
            2003 => Ok(ErrorCode::AdminRequired),

            // Issue
            3001 => Ok(ErrorCode::IssueNotFound),
            3002 => Ok(ErrorCode::InvalidStatusTransition),
            3003 => Ok(ErrorCode::AlreadyUpvoted),
            3004 => Ok(ErrorCode::CommentEmpty),
            3005 => Ok(ErrorCode::IssueTextEmpty),

            // Location
            4001 => Ok(ErrorCode::InvalidCoordinates),
            4002 => Ok(ErrorCode::LocationRequired),
            4003 => Ok(ErrorCode::GeolocationUnavailable),

            // System
            9001 => Ok(ErrorCode::InternalError),
            9002 => Ok(ErrorCode::DatabaseError),
            9003 => Ok(ErrorCode::ConfigError),
            9004 => Ok(ErrorCode::NetworkError),
            9005 => Ok(ErrorCode::TimeoutError),

            _ => Err(InvalidErrorCode(value)),
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code_values() {
        assert_eq!(ErrorCode::Success.code(), 0);
        assert_eq!(ErrorCode::ValidationFailed.code(), 2);
        assert_eq!(ErrorCode::NotAuthenticated.code(), 1001);
        assert_eq!(ErrorCode::PasswordMismatch.code(), 1010);
        assert_eq!(ErrorCode::OfficerRequired.code(), 2002);
        assert_eq!(ErrorCode::IssueNotFound.code(), 3001);
        assert_eq!(ErrorCode::InvalidStatusTransition.code(), 3002);
        assert_eq!(ErrorCode::InvalidCoordinates.code(), 4001);
        assert_eq!(ErrorCode::InternalError.code(), 9001);
    }

    #[test]
    fn test_is_success() {
        assert!(ErrorCode::Success.is_success());
        assert!(!ErrorCode::IssueNotFound.is_success());
    }

    #[test]
    fn test_try_from_valid() {
        assert_eq!(ErrorCode::try_from(0), Ok(ErrorCode::Success));
        assert_eq!(ErrorCode::try_from(3003), Ok(ErrorCode::AlreadyUpvoted));
        assert_eq!(ErrorCode::try_from(9005), Ok(ErrorCode::TimeoutError));
    }

    #[test]
    fn test_try_from_invalid() {
        assert_eq!(ErrorCode::try_from(1006), Err(InvalidErrorCode(1006)));
        assert_eq!(ErrorCode::try_from(65535), Err(InvalidErrorCode(65535)));
    }

    #[test]
    fn test_serialize() {
        let json = serde_json::to_string(&ErrorCode::IssueNotFound).unwrap();
        assert_eq!(json, "3001");
    }

    #[test]
    fn test_deserialize() {
        let code: ErrorCode = serde_json::from_str("1002").unwrap();
        assert_eq!(code, ErrorCode::InvalidCredentials);
    }

    #[test]
    fn test_deserialize_invalid() {
        let result: Result<ErrorCode, _> = serde_json::from_str("7777");
        assert!(result.is_err());
    }

    #[test]
    fn test_message() {
        assert_eq!(ErrorCode::PasswordMismatch.message(), "Passwords do not match");
        assert_eq!(
            ErrorCode::InvalidStatusTransition.message(),
            "Issue status can only move forward"
        );
    }

    #[test]
    fn test_display() {
        assert_eq!(format!("{}", ErrorCode::AlreadyUpvoted), "3003");
        assert_eq!(format!("{}", InvalidErrorCode(42)), "invalid error code: 42");
    }
}
