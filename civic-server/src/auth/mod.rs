//! Authentication
//!
//! - [`jwt`]: token issuing and validation
//! - [`password`]: argon2 hashing
//! - [`middleware`]: bearer-token gate for `/api/` routes
//! - [`extractor`]: `CurrentUser` / `OfficerUser` extractors
//! - [`rate_limit`]: per-IP login and signup limits

pub mod extractor;
pub mod jwt;
pub mod middleware;
pub mod password;
pub mod rate_limit;

pub use extractor::OfficerUser;
pub use jwt::{Claims, CurrentUser, JwtConfig, JwtError, JwtService};
pub use middleware::require_auth;
pub use password::{MIN_PASSWORD_LEN, hash_password, verify_password};
pub use rate_limit::RateLimiter;
