//! Session verification - extractors that authenticate a request.
//!
//! A request is authenticated when it carries a valid access token (the
//! `accessToken` cookie, or a `Bearer` token) whose session key is still
//! present in the session store. Deleting the key logs the session out
//! even though the token itself has not expired.

use actix_web::{FromRequest, HttpRequest, dev::Payload, http::header, web};
use futures::future::LocalBoxFuture;
use uuid::Uuid;

use shopfront_core::ports::{AccessClaims, AuthError};

use crate::middleware::error::AppError;
use crate::state::AppState;

pub const ACCESS_COOKIE: &str = "accessToken";
pub const REFRESH_COOKIE: &str = "refreshToken";

/// The authenticated caller.
///
/// ```ignore
/// async fn protected(user: AuthUser) -> impl Responder {
///     format!("Hello, user {}!", user.user_id)
/// }
/// ```
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: Uuid,
    pub session_id: String,
    pub is_admin: bool,
}

impl AuthUser {
    pub fn require_admin(&self) -> Result<(), AppError> {
        if self.is_admin {
            Ok(())
        } else {
            Err(AuthError::InsufficientPermissions.into())
        }
    }

    /// Allow access to `owner`'s resources: the owner themselves or an admin.
    pub fn require_self_or_admin(&self, owner: Uuid) -> Result<(), AppError> {
        if self.is_admin || self.user_id == owner {
            Ok(())
        } else {
            Err(AppError::Forbidden)
        }
    }
}

impl From<AccessClaims> for AuthUser {
    fn from(claims: AccessClaims) -> Self {
        Self {
            user_id: claims.user_id,
            session_id: claims.session_id,
            is_admin: claims.is_admin,
        }
    }
}

/// Access token from the cookie, else from the `Authorization` header.
pub fn access_token(req: &HttpRequest) -> Option<String> {
    if let Some(cookie) = req.cookie(ACCESS_COOKIE) {
        if !cookie.value().is_empty() {
            return Some(cookie.value().to_string());
        }
    }

    req.headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(|token| token.trim().to_string())
        .filter(|token| !token.is_empty())
}

/// Validate a token and check that its session is still live.
pub async fn authenticate(state: &AppState, token: Option<String>) -> Result<AuthUser, AppError> {
    let token = token.ok_or(AuthError::MissingAuth)?;
    let claims = state.tokens.validate_access_token(&token)?;

    match state.sessions.exists(claims.user_id, &claims.session_id).await {
        Ok(true) => Ok(claims.into()),
        Ok(false) => Err(AuthError::SessionExpired.into()),
        Err(e) => {
            tracing::error!(error = %e, user_id = %claims.user_id, "Session lookup failed");
            Err(AppError::Unauthorized("Authentication failed".to_string()))
        }
    }
}

fn app_state(req: &HttpRequest) -> Result<web::Data<AppState>, AppError> {
    req.app_data::<web::Data<AppState>>().cloned().ok_or_else(|| {
        tracing::error!("AppState not found in app data");
        AppError::Internal("Server configuration error".to_string())
    })
}

impl FromRequest for AuthUser {
    type Error = AppError;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let state = app_state(req);
        let token = access_token(req);

        Box::pin(async move {
            let state = state?;
            authenticate(&state, token).await
        })
    }
}

/// Authentication that never fails the request; carries the rejection instead.
pub struct MaybeAuthUser(pub Result<AuthUser, AppError>);

impl FromRequest for MaybeAuthUser {
    type Error = actix_web::Error;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, payload: &mut Payload) -> Self::Future {
        let fut = AuthUser::from_request(req, payload);
        Box::pin(async move { Ok(MaybeAuthUser(fut.await)) })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::cookie::Cookie;
    use actix_web::test::TestRequest;

    use crate::config::AppConfig;

    fn state() -> AppState {
        AppState::in_memory(AppConfig::for_tests()).unwrap()
    }

    async fn open_session(state: &AppState, user_id: Uuid, is_admin: bool) -> String {
        let sid = "s1";
        state
            .sessions
            .store(user_id, sid, "refresh", std::time::Duration::from_secs(60))
            .await
            .unwrap();
        state.tokens.issue_access_token(user_id, sid, is_admin).unwrap()
    }

    #[test]
    fn test_cookie_takes_precedence_over_header() {
        let req = TestRequest::default()
            .cookie(Cookie::new(ACCESS_COOKIE, "from-cookie"))
            .insert_header((header::AUTHORIZATION, "Bearer from-header"))
            .to_http_request();
        assert_eq!(access_token(&req).as_deref(), Some("from-cookie"));

        let req = TestRequest::default()
            .insert_header((header::AUTHORIZATION, "Bearer from-header"))
            .to_http_request();
        assert_eq!(access_token(&req).as_deref(), Some("from-header"));

        let req = TestRequest::default()
            .insert_header((header::AUTHORIZATION, "Basic abc"))
            .to_http_request();
        assert!(access_token(&req).is_none());
    }

    #[actix_web::test]
    async fn test_live_session_authenticates() {
        let state = state();
        let user_id = Uuid::new_v4();
        let token = open_session(&state, user_id, true).await;

        let user = authenticate(&state, Some(token)).await.unwrap();
        assert_eq!(user.user_id, user_id);
        assert!(user.require_admin().is_ok());
    }

    #[actix_web::test]
    async fn test_revoked_session_is_rejected() {
        let state = state();
        let user_id = Uuid::new_v4();
        let token = open_session(&state, user_id, false).await;
        state.sessions.revoke(user_id, "s1").await.unwrap();

        let err = authenticate(&state, Some(token)).await.unwrap_err();
        assert!(matches!(err, AppError::Unauthorized(msg) if msg == "Session expired"));
    }

    #[actix_web::test]
    async fn test_missing_and_garbage_tokens() {
        let state = state();

        let err = authenticate(&state, None).await.unwrap_err();
        assert!(matches!(err, AppError::Unauthorized(msg) if msg == "Authorization required"));

        let err = authenticate(&state, Some("garbage".into())).await.unwrap_err();
        assert!(matches!(err, AppError::Unauthorized(msg) if msg == "Invalid token"));
    }

    #[test]
    fn test_self_or_admin() {
        let owner = Uuid::new_v4();
        let user = AuthUser {
            user_id: owner,
            session_id: "s".into(),
            is_admin: false,
        };
        assert!(user.require_self_or_admin(owner).is_ok());
        assert!(matches!(
            user.require_self_or_admin(Uuid::new_v4()),
            Err(AppError::Forbidden)
        ));
        assert!(user.require_admin().is_err());
    }
}
