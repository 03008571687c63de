use std::sync::Arc;

use sqlx::SqlitePool;
use tokio_util::sync::CancellationToken;

use crate::auth::{JwtService, RateLimiter};
use crate::core::Config;
use crate::db::DbService;
use crate::live::IssueEventHub;
use shared::AppError;

/// Shared handles for every request
///
/// Cloning is cheap: services are `Arc`ed or internally reference-counted.
///
/// | Field | Purpose |
/// |-------|---------|
/// | config | immutable settings |
/// | db | SQLite pool |
/// | jwt_service | token issue / validation |
/// | live | push channel fan-out |
/// | rate_limiter | login and signup throttling |
/// | shutdown | cancelled when the server stops |
#[derive(Clone)]
pub struct ServerState {
    pub config: Arc<Config>,
    pub db: DbService,
    jwt_service: Arc<JwtService>,
    pub live: IssueEventHub,
    pub rate_limiter: RateLimiter,
    shutdown: CancellationToken,
}

impl ServerState {
    /// Open the database and build every service
    pub async fn initialize(config: &Config) -> Result<Self, AppError> {
        let db = DbService::new(&config.database_url).await?;
        Ok(Self {
            jwt_service: Arc::new(JwtService::with_config(config.jwt.clone())),
            config: Arc::new(config.clone()),
            db,
            live: IssueEventHub::new(),
            rate_limiter: RateLimiter::new(),
            shutdown: CancellationToken::new(),
        })
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.db.pool
    }

    pub fn jwt_service(&self) -> &JwtService {
        &self.jwt_service
    }

    /// Token cancelled on shutdown; long-lived tasks and streams listen on it
    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    /// Periodic housekeeping (rate limiter cleanup every five minutes)
    pub fn start_background_tasks(&self) {
        let limiter = self.rate_limiter.clone();
        let shutdown = self.shutdown_token();
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(std::time::Duration::from_secs(300));
            interval.tick().await;
            loop {
                tokio::select! {
                    _ = shutdown.cancelled() => break,
                    _ = interval.tick() => limiter.cleanup().await,
                }
            }
            tracing::debug!("Housekeeping task stopped");
        });
    }
}
