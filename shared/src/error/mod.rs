//! Unified error system
//!
//! - [`ErrorCode`]: standardized numeric codes shared by server and client
//! - [`ErrorCategory`]: classification by code range
//! - [`AppError`]: error type carrying a code, message and details
//!
//! # Error Code Ranges
//!
//! - 0xxx: General errors
//! - 1xxx: Authentication errors
//! - 2xxx: Permission errors
//! - 3xxx: Issue errors
//! - 4xxx: Location errors
//! - 9xxx: System errors

mod category;
mod codes;
mod http;
mod types;

pub use category::ErrorCategory;
pub use codes::{ErrorCode, InvalidErrorCode};
pub use types::{AppError, AppResult};
