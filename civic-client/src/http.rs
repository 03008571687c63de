//! HTTP client for network-based API calls

use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::RwLock;
use reqwest::{Client, StatusCode, Url};
use serde::Serialize;
use serde::de::DeserializeOwned;
use shared::ApiResponse;

use crate::{ClientConfig, ClientError, ClientResult};

/// Transport seam for the REST services
///
/// Every call returns the decoded envelope of a successful answer; failure
/// envelopes come back as [`ClientError`].
#[async_trait]
pub trait HttpClient: Send + Sync {
    async fn get<T: DeserializeOwned>(&self, path: &str) -> ClientResult<ApiResponse<T>>;

    /// GET with URL-encoded query pairs
    async fn get_query<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> ClientResult<ApiResponse<T>>;

    async fn post<T: DeserializeOwned, B: Serialize + Sync>(
        &self,
        path: &str,
        body: &B,
    ) -> ClientResult<ApiResponse<T>>;

    async fn patch<T: DeserializeOwned, B: Serialize + Sync>(
        &self,
        path: &str,
        body: &B,
    ) -> ClientResult<ApiResponse<T>>;

    /// Replace the bearer token used by later requests
    fn set_token(&self, token: Option<String>);

    fn token(&self) -> Option<String>;
}

/// reqwest-backed client
///
/// Clones share the connection pool and the bearer token, so the auth and
/// issue services see a login performed through either of them.
#[derive(Debug, Clone)]
pub struct NetworkHttpClient {
    client: Client,
    config: ClientConfig,
    token: Arc<RwLock<Option<String>>>,
}

impl NetworkHttpClient {
    pub fn new(config: &ClientConfig) -> ClientResult<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .user_agent(config.user_agent.clone())
            .build()?;
        Ok(Self {
            client,
            config: config.clone(),
            token: Arc::new(RwLock::new(None)),
        })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    fn auth_header(&self) -> Option<String> {
        self.token.read().as_ref().map(|t| format!("Bearer {}", t))
    }

    fn authorized(&self, mut req: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        if let Some(auth) = self.auth_header() {
            req = req.header(reqwest::header::AUTHORIZATION, auth);
        }
        req
    }

    async fn handle_response<T: DeserializeOwned>(
        response: reqwest::Response,
    ) -> ClientResult<ApiResponse<T>> {
        let status = response.status();
        let text = response.text().await?;

        if status.is_success() {
            let envelope: ApiResponse<T> = serde_json::from_str(&text)
                .map_err(|e| ClientError::InvalidResponse(format!("{e}: {text}")))?;
            if !envelope.success {
                return Err(envelope_error(envelope));
            }
            return Ok(envelope);
        }

        // failure envelopes carry no `data`, so decode them untyped
        let parsed = serde_json::from_str::<ApiResponse<serde_json::Value>>(&text).ok();
        match (status, parsed) {
            (StatusCode::UNAUTHORIZED, parsed) => Err(ClientError::Unauthorized(
                parsed
                    .and_then(|p| p.message)
                    .unwrap_or_else(|| "Unauthorized".into()),
            )),
            (_, Some(envelope)) => Err(envelope_error(envelope)),
            (StatusCode::FORBIDDEN, None) => Err(ClientError::Forbidden(text)),
            (StatusCode::NOT_FOUND, None) => Err(ClientError::NotFound(text)),
            (StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY, None) => {
                Err(ClientError::Validation(text))
            }
            (_, None) => Err(ClientError::InvalidResponse(format!("{status}: {text}"))),
        }
    }
}

fn envelope_error<T>(envelope: ApiResponse<T>) -> ClientError {
    match envelope.into_result() {
        Err(app_err) => app_err.into(),
        // unreachable for failed envelopes
        Ok(_) => ClientError::InvalidResponse("Unexpected success envelope".into()),
    }
}

#[async_trait]
impl HttpClient for NetworkHttpClient {
    async fn get<T: DeserializeOwned>(&self, path: &str) -> ClientResult<ApiResponse<T>> {
        let req = self.authorized(self.client.get(self.config.url(path)));
        let response = req.send().await?;
        Self::handle_response(response).await
    }

    async fn get_query<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> ClientResult<ApiResponse<T>> {
        let mut url = Url::parse(&self.config.url(path))
            .map_err(|e| ClientError::Validation(format!("Invalid URL: {e}")))?;
        if !query.is_empty() {
            let mut pairs = url.query_pairs_mut();
            for (key, value) in query {
                pairs.append_pair(key, value);
            }
        }
        let req = self.authorized(self.client.get(url));
        let response = req.send().await?;
        Self::handle_response(response).await
    }

    async fn post<T: DeserializeOwned, B: Serialize + Sync>(
        &self,
        path: &str,
        body: &B,
    ) -> ClientResult<ApiResponse<T>> {
        let req = self.authorized(self.client.post(self.config.url(path)).json(body));
        let response = req.send().await?;
        Self::handle_response(response).await
    }

    async fn patch<T: DeserializeOwned, B: Serialize + Sync>(
        &self,
        path: &str,
        body: &B,
    ) -> ClientResult<ApiResponse<T>> {
        let req = self.authorized(self.client.patch(self.config.url(path)).json(body));
        let response = req.send().await?;
        Self::handle_response(response).await
    }

    fn set_token(&self, token: Option<String>) {
        *self.token.write() = token;
    }

    fn token(&self) -> Option<String> {
        self.token.read().clone()
    }
}
