//! JWT token service implementation.

use std::time::Duration;

use chrono::Utc;
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use uuid::Uuid;

use shopfront_core::ports::{AccessClaims, AuthError, RefreshClaims, TokenService};

const DEFAULT_ACCESS_SECRET: &str = "change-me-access-secret";
const DEFAULT_REFRESH_SECRET: &str = "change-me-refresh-secret";

/// JWT token service configuration.
#[derive(Debug, Clone)]
pub struct JwtConfig {
    pub access_secret: String,
    pub refresh_secret: String,
    pub access_ttl: Duration,
    pub refresh_ttl: Duration,
    pub issuer: String,
}

impl Default for JwtConfig {
    fn default() -> Self {
        Self {
            access_secret: DEFAULT_ACCESS_SECRET.to_string(),
            refresh_secret: DEFAULT_REFRESH_SECRET.to_string(),
            access_ttl: Duration::from_secs(15 * 60),
            refresh_ttl: Duration::from_secs(7 * 86_400),
            issuer: "shopfront-api".to_string(),
        }
    }
}

impl JwtConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let access_secret = std::env::var("JWT_ACCESS_SECRET").unwrap_or(defaults.access_secret);
        let refresh_secret =
            std::env::var("JWT_REFRESH_SECRET").unwrap_or(defaults.refresh_secret);

        if access_secret == DEFAULT_ACCESS_SECRET || refresh_secret == DEFAULT_REFRESH_SECRET {
            let is_production = std::env::var("PRODUCTION")
                .map(|v| v == "true")
                .unwrap_or(false);

            if is_production {
                tracing::error!(
                    "SECURITY: Using default JWT secrets in production! Set JWT_ACCESS_SECRET and JWT_REFRESH_SECRET."
                );
            } else {
                tracing::warn!("Using default JWT secrets. Set JWT_ACCESS_SECRET and JWT_REFRESH_SECRET for production use.");
            }
        }

        let access_minutes: u64 = std::env::var("ACCESS_TOKEN_EXP_MINUTES")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(15);
        let refresh_days: u64 = std::env::var("REFRESH_TOKEN_EXP_DAYS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(7);

        Self {
            access_secret,
            refresh_secret,
            access_ttl: Duration::from_secs(access_minutes * 60),
            refresh_ttl: Duration::from_secs(refresh_days * 86_400),
            issuer: std::env::var("JWT_ISSUER").unwrap_or(defaults.issuer),
        }
    }
}

/// Access token claims as they appear on the wire.
#[derive(Debug, Serialize, Deserialize)]
struct AccessTokenClaims {
    sub: String, // user_id
    sid: String, // session_id
    admin: bool,
    exp: i64,
    iat: i64,
    iss: String,
}

/// Refresh tokens carry no privilege information.
#[derive(Debug, Serialize, Deserialize)]
struct RefreshTokenClaims {
    sub: String,
    sid: String,
    exp: i64,
    iat: i64,
    iss: String,
}

struct KeyPair {
    encoding: EncodingKey,
    decoding: DecodingKey,
}

impl KeyPair {
    fn from_secret(secret: &str) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
        }
    }
}

/// HS256 token service with separate keys for access and refresh tokens.
pub struct JwtTokenService {
    access: KeyPair,
    refresh: KeyPair,
    config: JwtConfig,
}

impl JwtTokenService {
    pub fn new(config: JwtConfig) -> Self {
        Self {
            access: KeyPair::from_secret(&config.access_secret),
            refresh: KeyPair::from_secret(&config.refresh_secret),
            config,
        }
    }

    pub fn from_env() -> Self {
        Self::new(JwtConfig::from_env())
    }

    fn expiry(&self, ttl: Duration) -> (i64, i64) {
        let now = Utc::now().timestamp();
        let ttl = i64::try_from(ttl.as_secs()).unwrap_or(i64::MAX);
        (now, now.saturating_add(ttl))
    }

    fn sign<C: Serialize>(&self, claims: &C, keys: &KeyPair) -> Result<String, AuthError> {
        encode(&Header::default(), claims, &keys.encoding)
            .map_err(|e| AuthError::InvalidToken(e.to_string()))
    }

    fn verify<C: DeserializeOwned>(&self, token: &str, keys: &KeyPair) -> Result<C, AuthError> {
        let mut validation = Validation::default();
        validation.set_issuer(&[&self.config.issuer]);

        decode::<C>(token, &keys.decoding, &validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => AuthError::TokenExpired,
                _ => AuthError::InvalidToken(e.to_string()),
            })
    }
}

fn parse_subject(sub: &str) -> Result<Uuid, AuthError> {
    Uuid::parse_str(sub).map_err(|e| AuthError::InvalidToken(e.to_string()))
}

impl TokenService for JwtTokenService {
    fn issue_access_token(
        &self,
        user_id: Uuid,
        session_id: &str,
        is_admin: bool,
    ) -> Result<String, AuthError> {
        if session_id.is_empty() {
            return Err(AuthError::InvalidToken("session id is required".to_string()));
        }
        let (iat, exp) = self.expiry(self.config.access_ttl);

        let claims = AccessTokenClaims {
            sub: user_id.to_string(),
            sid: session_id.to_string(),
            admin: is_admin,
            exp,
            iat,
            iss: self.config.issuer.clone(),
        };

        self.sign(&claims, &self.access)
    }

    fn issue_refresh_token(&self, user_id: Uuid, session_id: &str) -> Result<String, AuthError> {
        if session_id.is_empty() {
            return Err(AuthError::InvalidToken("session id is required".to_string()));
        }
        let (iat, exp) = self.expiry(self.config.refresh_ttl);

        let claims = RefreshTokenClaims {
            sub: user_id.to_string(),
            sid: session_id.to_string(),
            exp,
            iat,
            iss: self.config.issuer.clone(),
        };

        self.sign(&claims, &self.refresh)
    }

    fn validate_access_token(&self, token: &str) -> Result<AccessClaims, AuthError> {
        let claims: AccessTokenClaims = self.verify(token, &self.access)?;

        Ok(AccessClaims {
            user_id: parse_subject(&claims.sub)?,
            session_id: claims.sid,
            is_admin: claims.admin,
            exp: claims.exp,
        })
    }

    fn validate_refresh_token(&self, token: &str) -> Result<RefreshClaims, AuthError> {
        let claims: RefreshTokenClaims = self.verify(token, &self.refresh)?;

        Ok(RefreshClaims {
            user_id: parse_subject(&claims.sub)?,
            session_id: claims.sid,
            exp: claims.exp,
        })
    }

    fn access_token_ttl(&self) -> Duration {
        self.config.access_ttl
    }

    fn refresh_token_ttl(&self) -> Duration {
        self.config.refresh_ttl
    }
}
