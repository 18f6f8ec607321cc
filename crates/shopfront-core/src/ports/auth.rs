//! Authentication and authorization ports.

use std::time::Duration;

use uuid::Uuid;

/// Claims carried by a short-lived access token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessClaims {
    pub user_id: Uuid,
    pub session_id: String,
    pub is_admin: bool,
    pub exp: i64,
}

/// Claims carried by a long-lived refresh token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefreshClaims {
    pub user_id: Uuid,
    pub session_id: String,
    pub exp: i64,
}

/// Token service trait for signed, expiring session tokens.
///
/// Access and refresh tokens are signed with different secrets, so one can
/// never be accepted in place of the other.
pub trait TokenService: Send + Sync {
    fn issue_access_token(
        &self,
        user_id: Uuid,
        session_id: &str,
        is_admin: bool,
    ) -> Result<String, AuthError>;

    fn issue_refresh_token(&self, user_id: Uuid, session_id: &str) -> Result<String, AuthError>;

    fn validate_access_token(&self, token: &str) -> Result<AccessClaims, AuthError>;

    fn validate_refresh_token(&self, token: &str) -> Result<RefreshClaims, AuthError>;

    /// Lifetime of newly issued access tokens.
    fn access_token_ttl(&self) -> Duration;

    /// Lifetime of newly issued refresh tokens, and of the session record.
    fn refresh_token_ttl(&self) -> Duration;
}

/// Password hashing service.
pub trait PasswordService: Send + Sync {
    /// Hash a plain text password.
    fn hash(&self, password: &str) -> Result<String, AuthError>;

    /// Verify a password against a hash.
    fn verify(&self, password: &str, hash: &str) -> Result<bool, AuthError>;
}

/// Authentication errors.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Token expired")]
    TokenExpired,

    #[error("Invalid token: {0}")]
    InvalidToken(String),

    #[error("Missing authorization")]
    MissingAuth,

    #[error("Session expired")]
    SessionExpired,

    #[error("Insufficient permissions")]
    InsufficientPermissions,

    #[error("Hashing error: {0}")]
    HashingError(String),

    #[error("Session backend error: {0}")]
    Backend(String),
}
