//! Issue API module
//!
//! Reads are public so the map and the issue page work without an account;
//! writes need a token, triage needs the officer role.

mod handler;

use axum::{
    Router,
    routing::{get, patch, post},
};

use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/issues", routes())
}

fn routes() -> Router<ServerState> {
    Router::new()
        .route("/", get(handler::list))
        .route("/create", post(handler::create))
        .route("/nearby", get(handler::nearby))
        .route("/my", get(handler::my_issues))
        .route("/officer/dashboard", get(handler::officer_dashboard))
        .route("/{id}", get(handler::get_by_id))
        .route("/{id}/status", patch(handler::update_status))
        .route("/{id}/upvote", post(handler::upvote))
        .route("/{id}/comment", post(handler::comment))
}
