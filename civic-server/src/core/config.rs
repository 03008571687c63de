use crate::auth::JwtConfig;

/// Server configuration
///
/// # Environment variables
///
/// | Variable | Default | Description |
/// |----------|---------|-------------|
/// | HTTP_PORT | 5000 | HTTP listen port |
/// | DATABASE_URL | sqlite://civic.db | SQLite database |
/// | ENVIRONMENT | development | development / staging / production |
/// | NEARBY_DEFAULT_RADIUS_M | 1000 | nearby search radius when `maxDistance` is absent |
/// | OFFICER_RADIUS_M | 10000 | officer dashboard radius |
/// | LOGIN_RATE_LIMIT | 5 | login attempts per IP per minute |
/// | SIGNUP_RATE_LIMIT | 3 | signups per IP per minute |
/// | SSE_KEEPALIVE_SECS | 15 | keep-alive comment interval on the push stream |
/// | LOG_LEVEL | info | default log level when RUST_LOG is unset |
/// | LOG_DIR | (unset) | daily rolling log directory |
/// | CORS_ALLOW_ORIGIN | * | allowed origin, `*` for any |
///
/// JWT settings come from [`JwtConfig`] (`JWT_SECRET`, `JWT_EXPIRATION_MINUTES`,
/// `JWT_ISSUER`, `JWT_AUDIENCE`).
///
/// ```ignore
/// HTTP_PORT=8080 DATABASE_URL=sqlite:///var/lib/civic/civic.db cargo run
/// ```
#[derive(Debug, Clone)]
pub struct Config {
    pub http_port: u16,
    pub database_url: String,
    pub environment: String,
    pub jwt: JwtConfig,
    /// Meters
    pub nearby_default_radius_m: f64,
    /// Meters
    pub officer_radius_m: f64,
    pub login_rate_limit: u32,
    pub signup_rate_limit: u32,
    pub sse_keepalive_secs: u64,
    pub log_level: String,
    pub log_dir: Option<String>,
    pub cors_allow_origin: String,
}

fn env_or<T: std::str::FromStr>(name: &str, default: T) -> T {
    std::env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

impl Config {
    /// Load configuration from the environment, falling back to defaults
    pub fn from_env() -> Self {
        Self {
            http_port: env_or("HTTP_PORT", 5000),
            database_url: std::env::var("DATABASE_URL")
                .unwrap_or_else(|_| "sqlite://civic.db".into()),
            environment: std::env::var("ENVIRONMENT").unwrap_or_else(|_| "development".into()),
            jwt: JwtConfig::default(),
            nearby_default_radius_m: env_or("NEARBY_DEFAULT_RADIUS_M", 1_000.0),
            officer_radius_m: env_or("OFFICER_RADIUS_M", 10_000.0),
            login_rate_limit: env_or("LOGIN_RATE_LIMIT", 5),
            signup_rate_limit: env_or("SIGNUP_RATE_LIMIT", 3),
            sse_keepalive_secs: env_or("SSE_KEEPALIVE_SECS", 15),
            log_level: std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".into()),
            log_dir: std::env::var("LOG_DIR").ok().filter(|d| !d.is_empty()),
            cors_allow_origin: std::env::var("CORS_ALLOW_ORIGIN").unwrap_or_else(|_| "*".into()),
        }
    }

    /// In-memory database, fixed secret, relaxed rate limits
    pub fn for_tests() -> Self {
        Self {
            http_port: 0,
            database_url: "sqlite::memory:".into(),
            environment: "test".into(),
            jwt: JwtConfig {
                secret: "test-secret-key-that-is-at-least-32-characters".into(),
                expiration_minutes: 60,
                issuer: "civic-server".into(),
                audience: "civic-clients".into(),
            },
            nearby_default_radius_m: 1_000.0,
            officer_radius_m: 10_000.0,
            login_rate_limit: 1_000,
            signup_rate_limit: 1_000,
            sse_keepalive_secs: 15,
            log_level: "debug".into(),
            log_dir: None,
            cors_allow_origin: "*".into(),
        }
    }

    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_for_tests_uses_memory_db() {
        let config = Config::for_tests();
        assert_eq!(config.database_url, "sqlite::memory:");
        assert!(config.jwt.secret.len() >= 32);
        assert!(!config.is_production());
    }

    #[test]
    fn test_env_or_falls_back_on_garbage() {
        assert_eq!(env_or("CIVIC_SERVER_SURELY_UNSET_VARIABLE", 7u32), 7);
    }
}
