//! Authentication Routes
//!
//! - `POST /api/auth/signup`: public, rate limited
//! - `POST /api/auth/login`: public, rate limited
//! - `GET /api/auth/me`: bearer token

mod handler;

use axum::{Router, middleware, routing::get, routing::post};

use crate::auth::rate_limit::{login_rate_limit, signup_rate_limit};
use crate::core::ServerState;

pub fn router(state: &ServerState) -> Router<ServerState> {
    Router::new()
        .route(
            "/api/auth/signup",
            post(handler::signup).layer(middleware::from_fn_with_state(
                state.clone(),
                signup_rate_limit,
            )),
        )
        .route(
            "/api/auth/login",
            post(handler::login).layer(middleware::from_fn_with_state(
                state.clone(),
                login_rate_limit,
            )),
        )
        .route("/api/auth/me", get(handler::me))
}
