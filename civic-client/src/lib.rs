//! Civic Client - client core for the civic issue tracker
//!
//! HTTP access to civic-server, the auth session, the query cache and the
//! push listener that keeps it fresh.

pub mod auth;
pub mod cache;
pub mod config;
pub mod dashboard;
pub mod error;
pub mod http;
pub mod issues;
pub mod nearby;
pub mod notification;
pub mod routing;
pub mod session;
pub mod tracker;

pub use auth::{AuthApi, AuthBackend};
pub use cache::{QueryCache, QueryKey};
pub use config::ClientConfig;
pub use error::{ClientError, ClientResult};
pub use http::{HttpClient, NetworkHttpClient};
pub use issues::{IssueApi, IssuePage, NearbySearch};
pub use nearby::{DuplicateCheck, DuplicateReport};
pub use notification::Notification;
pub use routing::dashboard_path;
pub use session::{AuthSession, FileSessionStore, MemorySessionStore, SessionStore};
pub use tracker::{ConnectionState, IssueTracker, ReconnectPolicy};

// Re-export shared types for convenience
pub use shared::{ApiResponse, AuthPayload, IssueUpdate, Pagination};
