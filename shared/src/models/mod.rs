//! Data models
//!
//! Shared between civic-server and civic-client (via API).
//! Identifiers are strings and serialize as `_id`.

pub mod comment;
pub mod issue;
pub mod location;
pub mod user;

// Re-exports
pub use comment::*;
pub use issue::*;
pub use location::*;
pub use user::*;
