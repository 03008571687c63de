//! Auth API: signup, login, current user

use async_trait::async_trait;
use shared::AuthPayload;
use shared::client::{LoginRequest, SignupRequest};

use crate::http::HttpClient;
use crate::{ClientError, ClientResult};

/// Account operations the session provider depends on
#[async_trait]
pub trait AuthBackend: Send + Sync {
    async fn signup(&self, request: &SignupRequest) -> ClientResult<AuthPayload>;
    async fn login(&self, request: &LoginRequest) -> ClientResult<AuthPayload>;
    /// User behind the current token
    async fn me(&self) -> ClientResult<AuthPayload>;
    fn set_token(&self, token: Option<String>);
}

/// REST implementation of [`AuthBackend`]
#[derive(Debug, Clone)]
pub struct AuthApi<H> {
    http: H,
}

impl<H: HttpClient> AuthApi<H> {
    pub fn new(http: H) -> Self {
        Self { http }
    }

    pub fn http(&self) -> &H {
        &self.http
    }
}

fn payload(data: Option<AuthPayload>, what: &str) -> ClientResult<AuthPayload> {
    data.ok_or_else(|| ClientError::InvalidResponse(format!("Missing {what} data")))
}

#[async_trait]
impl<H: HttpClient> AuthBackend for AuthApi<H> {
    async fn signup(&self, request: &SignupRequest) -> ClientResult<AuthPayload> {
        let resp = self.http.post("/api/auth/signup", request).await?;
        payload(resp.data, "signup")
    }

    async fn login(&self, request: &LoginRequest) -> ClientResult<AuthPayload> {
        let resp = self.http.post("/api/auth/login", request).await?;
        payload(resp.data, "login")
    }

    async fn me(&self) -> ClientResult<AuthPayload> {
        let resp = self.http.get("/api/auth/me").await?;
        payload(resp.data, "user")
    }

    fn set_token(&self, token: Option<String>) {
        self.http.set_token(token);
    }
}
