//! Civic issue tracker server
//!
//! Citizens report location-tagged issues, officers triage them, and every
//! change is fanned out to connected dashboards over server-sent events.
//!
//! ```text
//! civic-server/src/
//! ├── core/     # configuration, state, server bootstrap
//! ├── auth/     # JWT, argon2, middleware, rate limiting
//! ├── db/       # SQLite pool and repositories
//! ├── api/      # HTTP routes and handlers
//! ├── live/     # broadcast hub behind the SSE stream
//! └── utils/    # logging
//! ```

pub mod api;
pub mod auth;
pub mod core;
pub mod db;
pub mod error;
pub mod live;
pub mod utils;

pub use auth::{CurrentUser, JwtService};
pub use core::{Config, Server, ServerState};
pub use error::{ServiceError, ServiceResult};
pub use live::IssueEventHub;
pub use shared::error::{AppError, AppResult, ErrorCode};

pub use utils::logger::{init_logger, init_logger_with_file};

// Security logging macro - supports tracing format specifiers
#[macro_export]
macro_rules! security_log {
    ($level:expr, $event:expr, $($key:ident = $value:expr),*) => {
        tracing::info!(
            target: "security",
            level = $level,
            event = $event,
            $($key = $value),*
        );
    };
}
