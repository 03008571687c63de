//! Authentication middleware

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use http::Method;

use crate::AppError;
use crate::auth::{CurrentUser, JwtError, JwtService};
use crate::core::ServerState;
use crate::security_log;

/// Routes reachable without a token
///
/// Listing, proximity search and single-issue reads are public so the report
/// form can warn about duplicates before sign-in completes.
pub fn is_public_route(method: &Method, path: &str) -> bool {
    if matches!(
        path,
        "/api/health" | "/api/auth/login" | "/api/auth/signup" | "/api/sse/stream"
    ) {
        return true;
    }

    if method != Method::GET {
        return false;
    }

    match path.strip_prefix("/api/issues") {
        Some("") | Some("/") => true,
        Some(rest) => match rest.strip_prefix('/') {
            Some("nearby") => true,
            // `/api/issues/{id}`, but not the per-user views
            Some(id) => !id.is_empty() && !id.contains('/') && id != "my",
            None => false,
        },
        None => false,
    }
}

/// Require a valid bearer token on every non-public `/api/` route
///
/// On success the [`CurrentUser`] is inserted into request extensions.
///
/// | Failure | Status |
/// |---------|--------|
/// | no Authorization header | 401 NotAuthenticated |
/// | expired token | 401 TokenExpired |
/// | malformed or forged token | 401 TokenInvalid |
pub async fn require_auth(
    State(state): State<ServerState>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    if req.method() == Method::OPTIONS {
        return Ok(next.run(req).await);
    }

    let path = req.uri().path();
    if !path.starts_with("/api/") || is_public_route(req.method(), path) {
        return Ok(next.run(req).await);
    }

    let auth_header = req
        .headers()
        .get(http::header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok());

    let token = match auth_header {
        Some(header) => JwtService::extract_from_header(header)
            .ok_or_else(|| AppError::invalid_token("Invalid authorization header"))?,
        None => {
            security_log!("WARN", "auth_missing", uri = format!("{:?}", req.uri()));
            return Err(AppError::unauthorized());
        }
    };

    match state.jwt_service().validate_token(token) {
        Ok(claims) => {
            let user = CurrentUser::from(claims);
            req.extensions_mut().insert(user);
            Ok(next.run(req).await)
        }
        Err(e) => {
            security_log!(
                "WARN",
                "auth_failed",
                error = format!("{}", e),
                uri = format!("{:?}", req.uri())
            );

            match e {
                JwtError::ExpiredToken => Err(AppError::token_expired()),
                _ => Err(AppError::invalid_token("Invalid token")),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_public_routes() {
        assert!(is_public_route(&Method::POST, "/api/auth/login"));
        assert!(is_public_route(&Method::POST, "/api/auth/signup"));
        assert!(is_public_route(&Method::GET, "/api/sse/stream"));
        assert!(is_public_route(&Method::GET, "/api/health"));
        assert!(is_public_route(&Method::GET, "/api/issues"));
        assert!(is_public_route(&Method::GET, "/api/issues/nearby"));
        assert!(is_public_route(&Method::GET, "/api/issues/abc-123"));
    }

    #[test]
    fn test_protected_routes() {
        assert!(!is_public_route(&Method::GET, "/api/auth/me"));
        assert!(!is_public_route(&Method::GET, "/api/issues/my"));
        assert!(!is_public_route(&Method::GET, "/api/issues/officer/dashboard"));
        assert!(!is_public_route(&Method::POST, "/api/issues/create"));
        assert!(!is_public_route(&Method::PATCH, "/api/issues/abc/status"));
        assert!(!is_public_route(&Method::POST, "/api/issues/abc/upvote"));
        assert!(!is_public_route(&Method::POST, "/api/issues/abc/comment"));
        assert!(!is_public_route(&Method::GET, "/api/issuesx"));
    }
}
