//! Push channel
//!
//! `GET /api/sse/stream` opens a `text/event-stream`; every issue change is
//! sent as one unnamed event whose `data:` line is the JSON [`IssueUpdate`].
//!
//! [`IssueUpdate`]: shared::event::IssueUpdate

mod handler;

use axum::{Router, routing::get};

use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().route("/api/sse/stream", get(handler::stream))
}
