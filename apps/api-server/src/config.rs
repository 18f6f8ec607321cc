//! Application configuration loaded from environment variables.

use std::env;
use std::net::IpAddr;
use std::path::PathBuf;

#[cfg(feature = "postgres")]
use shopfront_infra::DatabaseConfig;
#[cfg(feature = "redis")]
use shopfront_infra::RedisConfig;
use shopfront_infra::{JwtConfig, RateLimitConfig};

/// Administrator account created at startup when none exists.
#[derive(Debug, Clone)]
pub struct AdminBootstrap {
    pub name: String,
    pub email: String,
    pub password: String,
}

/// Application configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    /// Enables `Secure` + `SameSite=None` cookies and strict error reporting.
    pub production: bool,
    /// Allowed CORS origin. `None` allows any origin (development only).
    pub origin: Option<String>,
    /// Peers whose `X-Forwarded-For`/`Forwarded` headers are believed when
    /// keying the auth rate limit. Everyone else is keyed by socket address.
    pub trusted_proxies: Vec<IpAddr>,
    pub upload_dir: PathBuf,
    pub jwt: JwtConfig,
    pub auth_rate_limit: RateLimitConfig,
    pub admin: Option<AdminBootstrap>,
    #[cfg(feature = "postgres")]
    pub database: Option<DatabaseConfig>,
    #[cfg(feature = "redis")]
    pub redis: Option<RedisConfig>,
}

impl AppConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        let admin = match (env::var("ADMIN_EMAIL"), env::var("ADMIN_PASSWORD")) {
            (Ok(email), Ok(password)) if !email.is_empty() && !password.is_empty() => {
                Some(AdminBootstrap {
                    name: env::var("ADMIN_USERNAME").unwrap_or_else(|_| "Admin".to_string()),
                    email,
                    password,
                })
            }
            _ => None,
        };

        Self {
            host: env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string()),
            port: env::var("PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(5001),
            production: env::var("PRODUCTION")
                .map(|v| v == "true")
                .unwrap_or(false),
            origin: env::var("ORIGIN").ok().filter(|o| !o.is_empty()),
            trusted_proxies: env::var("TRUSTED_PROXIES")
                .map(|v| parse_proxies(&v))
                .unwrap_or_default(),
            upload_dir: env::var("UPLOAD_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("assets/uploads")),
            jwt: JwtConfig::from_env(),
            auth_rate_limit: RateLimitConfig::from_env(),
            admin,
            #[cfg(feature = "postgres")]
            database: DatabaseConfig::from_env(),
            #[cfg(feature = "redis")]
            redis: env::var("REDIS_URL").ok().map(|_| RedisConfig::from_env()),
        }
    }

    /// Settings suitable for tests: short-lived tokens, no external services.
    #[cfg(test)]
    pub fn for_tests() -> Self {
        use std::time::Duration;

        Self {
            host: "127.0.0.1".to_string(),
            port: 0,
            production: false,
            origin: None,
            trusted_proxies: Vec::new(),
            upload_dir: env::temp_dir().join(format!("shopfront-test-{}", uuid::Uuid::new_v4())),
            jwt: JwtConfig {
                access_secret: "test-access-secret".to_string(),
                refresh_secret: "test-refresh-secret".to_string(),
                access_ttl: Duration::from_secs(15 * 60),
                refresh_ttl: Duration::from_secs(7 * 86_400),
                issuer: "shopfront-test".to_string(),
            },
            auth_rate_limit: RateLimitConfig {
                max_requests: 1_000,
                window: Duration::from_secs(60),
            },
            admin: None,
            #[cfg(feature = "postgres")]
            database: None,
            #[cfg(feature = "redis")]
            redis: None,
        }
    }
}

/// Comma-separated IP list. Entries that do not parse are logged and skipped.
fn parse_proxies(raw: &str) -> Vec<IpAddr> {
    raw.split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .filter_map(|entry| match entry.parse() {
            Ok(ip) => Some(ip),
            Err(_) => {
                tracing::warn!(entry, "Ignoring invalid TRUSTED_PROXIES entry");
                None
            }
        })
        .collect()
}
