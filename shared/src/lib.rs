//! Shared types for the civic issue tracker
//!
//! Domain models, error codes, the response envelope and the push channel
//! envelope used by both civic-server and civic-client.

pub mod client;
pub mod error;
pub mod event;
pub mod geo;
pub mod models;
pub mod response;
pub mod util;

// Re-exports
pub use serde::{Deserialize, Serialize};

pub use error::{AppError, AppResult, ErrorCode};
pub use event::{IssueEventType, IssueUpdate};
pub use response::{ApiResponse, AuthPayload, Pagination};
