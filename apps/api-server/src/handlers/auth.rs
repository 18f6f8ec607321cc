//! Authentication handlers: signup, login, logout, session checks.

use actix_web::cookie::{Cookie, SameSite, time::Duration as CookieDuration};
use actix_web::{HttpRequest, HttpResponse, web};

use shopfront_core::domain::session::{MAX_SESSIONS_PER_USER, new_session_id};
use shopfront_core::domain::{User, is_plausible_email, mask_email, normalize_email};
use shopfront_core::ports::{AuthError, BaseRepository, enforce_session_cap};
use shopfront_shared::MessageResponse;
use shopfront_shared::dto::{CheckAuthResponse, LoginRequest, LoginResponse, SignupRequest};

use super::sanitize;
use crate::middleware::auth::{ACCESS_COOKIE, AuthUser, MaybeAuthUser, REFRESH_COOKIE};
use crate::middleware::error::{AppError, AppResult};
use crate::state::AppState;

const MIN_PASSWORD_LEN: usize = 8;

fn session_cookie(
    name: &'static str,
    value: String,
    max_age: std::time::Duration,
    production: bool,
) -> Cookie<'static> {
    let max_age = CookieDuration::seconds(i64::try_from(max_age.as_secs()).unwrap_or(i64::MAX));
    let builder = Cookie::build(name, value)
        .path("/")
        .http_only(true)
        .max_age(max_age);

    if production {
        builder.secure(true).same_site(SameSite::None).finish()
    } else {
        builder.same_site(SameSite::Lax).finish()
    }
}

fn removal_cookie(name: &'static str, production: bool) -> Cookie<'static> {
    let mut cookie = session_cookie(name, String::new(), std::time::Duration::ZERO, production);
    cookie.make_removal();
    cookie
}

/// Open a new session for `user`, evicting the oldest ones past the cap.
/// Returns the access and refresh cookies.
async fn open_session(
    state: &AppState,
    user: &User,
) -> AppResult<(Cookie<'static>, Cookie<'static>)> {
    let evicted =
        enforce_session_cap(state.sessions.as_ref(), user.id, MAX_SESSIONS_PER_USER).await?;
    if !evicted.is_empty() {
        tracing::info!(user_id = %user.id, evicted = evicted.len(), "Evicted oldest sessions");
    }

    let session_id = new_session_id();
    let access = state
        .tokens
        .issue_access_token(user.id, &session_id, user.is_admin)?;
    let refresh = state.tokens.issue_refresh_token(user.id, &session_id)?;

    state
        .sessions
        .store(user.id, &session_id, &refresh, state.tokens.refresh_token_ttl())
        .await?;

    let production = state.config.production;
    Ok((
        session_cookie(ACCESS_COOKIE, access, state.tokens.access_token_ttl(), production),
        session_cookie(REFRESH_COOKIE, refresh, state.tokens.refresh_token_ttl(), production),
    ))
}

/// POST /auth/signup
pub async fn signup(
    state: web::Data<AppState>,
    body: web::Json<SignupRequest>,
) -> AppResult<HttpResponse> {
    let req = body.into_inner();

    let email = req
        .email
        .filter(|e| is_plausible_email(e))
        .ok_or_else(|| AppError::BadRequest("Invalid email address".to_string()))?;
    let password = req
        .password
        .filter(|p| p.chars().count() >= MIN_PASSWORD_LEN)
        .ok_or_else(|| {
            AppError::BadRequest(format!(
                "Password must be at least {MIN_PASSWORD_LEN} characters"
            ))
        })?;

    let email = normalize_email(&email);
    if state.users.find_by_email(&email).await?.is_some() {
        return Err(AppError::Conflict("User already exists".to_string()));
    }

    let name = req
        .name
        .map(|n| n.trim().to_string())
        .filter(|n| !n.is_empty())
        .unwrap_or_else(|| email.split('@').next().unwrap_or_default().to_string());

    let password_hash = state.passwords.hash(&password)?;
    let user = state
        .users
        .insert(User::new(name, email, password_hash))
        .await?;
    tracing::info!(user_id = %user.id, email = %mask_email(&user.email), "User signed up");

    let (access, refresh) = open_session(&state, &user).await?;

    Ok(HttpResponse::Created()
        .cookie(access)
        .cookie(refresh)
        .json(sanitize(&user)))
}

/// POST /auth/login
pub async fn login(
    state: web::Data<AppState>,
    body: web::Json<LoginRequest>,
) -> AppResult<HttpResponse> {
    let req = body.into_inner();
    let (Some(email), Some(password)) = (req.email, req.password) else {
        return Err(AppError::BadRequest(
            "Email and password are required".to_string(),
        ));
    };

    let user = state
        .users
        .find_by_email(&normalize_email(&email))
        .await?
        .ok_or(AuthError::InvalidCredentials)?;

    if !state.passwords.verify(&password, &user.password_hash)? {
        tracing::warn!(email = %mask_email(&user.email), "Failed login attempt");
        return Err(AuthError::InvalidCredentials.into());
    }

    let (access, refresh) = open_session(&state, &user).await?;
    tracing::info!(user_id = %user.id, "User logged in");

    Ok(HttpResponse::Ok()
        .cookie(access)
        .cookie(refresh)
        .json(LoginResponse {
            is_admin: user.is_admin,
            user: sanitize(&user),
        }))
}

/// GET /auth/logout
pub async fn logout(state: web::Data<AppState>, user: AuthUser) -> AppResult<HttpResponse> {
    state.sessions.revoke(user.user_id, &user.session_id).await?;
    tracing::info!(user_id = %user.user_id, "User logged out");

    let production = state.config.production;
    Ok(HttpResponse::Ok()
        .cookie(removal_cookie(ACCESS_COOKIE, production))
        .cookie(removal_cookie(REFRESH_COOKIE, production))
        .json(MessageResponse::new("Logged out")))
}

/// GET /auth/check-auth
pub async fn check_auth(
    state: web::Data<AppState>,
    auth: MaybeAuthUser,
) -> AppResult<HttpResponse> {
    let caller = match auth.0 {
        Ok(caller) => caller,
        Err(AppError::Unauthorized(message)) => {
            return Ok(HttpResponse::Unauthorized().json(CheckAuthResponse::rejected(message)));
        }
        Err(e) => return Err(e),
    };

    match state.users.find_by_id(caller.user_id).await? {
        Some(user) => Ok(HttpResponse::Ok().json(CheckAuthResponse {
            is_authenticated: true,
            user_id: Some(user.id),
            email: Some(user.email),
            is_admin: Some(user.is_admin),
            message: None,
        })),
        None => Ok(HttpResponse::NotFound().json(CheckAuthResponse::rejected("User not found"))),
    }
}

/// POST /auth/refresh - trade the refresh cookie for a new access token.
pub async fn refresh(state: web::Data<AppState>, req: HttpRequest) -> AppResult<HttpResponse> {
    let token = req
        .cookie(REFRESH_COOKIE)
        .map(|c| c.value().to_string())
        .filter(|v| !v.is_empty())
        .ok_or_else(|| AppError::Unauthorized("Refresh token required".to_string()))?;

    let claims = state.tokens.validate_refresh_token(&token)?;

    // The stored value pins the session to the refresh token it was opened with
    let stored = state.sessions.get(claims.user_id, &claims.session_id).await?;
    if stored.as_deref() != Some(token.as_str()) {
        return Err(AuthError::SessionExpired.into());
    }

    let user = state
        .users
        .find_by_id(claims.user_id)
        .await?
        .ok_or(AuthError::SessionExpired)?;

    let access = state
        .tokens
        .issue_access_token(user.id, &claims.session_id, user.is_admin)?;

    Ok(HttpResponse::Ok()
        .cookie(session_cookie(
            ACCESS_COOKIE,
            access,
            state.tokens.access_token_ttl(),
            state.config.production,
        ))
        .json(MessageResponse::new("Token refreshed")))
}

#[cfg(test)]
mod tests {
    use actix_web::cookie::Cookie;
    use actix_web::http::StatusCode;
    use actix_web::test;
    use serde_json::{Value, json};

    use super::*;
    use crate::handlers::test_support::{self, PASSWORD, test_app};

    fn cookie_named<'a, B>(
        res: &'a actix_web::dev::ServiceResponse<B>,
        name: &str,
    ) -> Option<Cookie<'a>> {
        res.response().cookies().find(|c| c.name() == name)
    }

    #[actix_web::test]
    async fn test_signup_sets_cookies_and_hides_hash() {
        let state = test_support::state();
        let app = test_app!(state);

        let req = test::TestRequest::post()
            .uri("/auth/signup")
            .set_json(json!({"name": "Jane", "email": "Jane@Example.com", "password": PASSWORD}))
            .to_request();
        let res = test::call_service(&app, req).await;
        assert_eq!(res.status(), StatusCode::CREATED);

        let access = cookie_named(&res, ACCESS_COOKIE).unwrap();
        assert_eq!(access.http_only(), Some(true));
        assert_eq!(access.same_site(), Some(SameSite::Lax));
        assert!(cookie_named(&res, REFRESH_COOKIE).is_some());

        let body: Value = test::read_body_json(res).await;
        assert_eq!(body["email"], "jane@example.com");
        assert_eq!(body["isAdmin"], false);
        assert!(body.get("passwordHash").is_none());
    }

    #[actix_web::test]
    async fn test_signup_validation_and_duplicates() {
        let state = test_support::state();
        test_support::seed_user(&state, "taken@example.com", false).await;
        let app = test_app!(state);

        for body in [
            json!({"email": "nope", "password": PASSWORD}),
            json!({"email": "a@b.io", "password": "short"}),
            json!({"password": PASSWORD}),
        ] {
            let req = test::TestRequest::post()
                .uri("/auth/signup")
                .set_json(body)
                .to_request();
            let res = test::call_service(&app, req).await;
            assert_eq!(res.status(), StatusCode::BAD_REQUEST);
        }

        let req = test::TestRequest::post()
            .uri("/auth/signup")
            .set_json(json!({"email": "TAKEN@example.com", "password": PASSWORD}))
            .to_request();
        let res = test::call_service(&app, req).await;
        assert_eq!(res.status(), StatusCode::CONFLICT);
    }

    #[actix_web::test]
    async fn test_login_rejects_wrong_password() {
        let state = test_support::state();
        test_support::seed_user(&state, "jane@example.com", false).await;
        let app = test_app!(state);

        let req = test::TestRequest::post()
            .uri("/auth/login")
            .set_json(json!({"email": "jane@example.com", "password": "wrong-password"}))
            .to_request();
        let res = test::call_service(&app, req).await;
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

        let req = test::TestRequest::post()
            .uri("/auth/login")
            .set_json(json!({"email": "jane@example.com"}))
            .to_request();
        let res = test::call_service(&app, req).await;
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    }

    #[actix_web::test]
    async fn test_login_caps_sessions_per_user() {
        let state = test_support::state();
        let user = test_support::seed_user(&state, "busy@example.com", true).await;
        let app = test_app!(state);

        for _ in 0..MAX_SESSIONS_PER_USER + 2 {
            let req = test::TestRequest::post()
                .uri("/auth/login")
                .set_json(json!({"email": "busy@example.com", "password": PASSWORD}))
                .to_request();
            let res = test::call_service(&app, req).await;
            assert_eq!(res.status(), StatusCode::OK);

            let body: Value = test::read_body_json(res).await;
            assert_eq!(body["isAdmin"], true);
        }

        let live = state.sessions.list(user.id).await.unwrap();
        assert_eq!(live.len(), MAX_SESSIONS_PER_USER);
    }

    #[actix_web::test]
    async fn test_logout_revokes_session() {
        let state = test_support::state();
        let user = test_support::seed_user(&state, "jane@example.com", false).await;
        let cookie = test_support::session_cookie(&state, &user).await;
        let app = test_app!(state);

        let req = test::TestRequest::get()
            .uri("/auth/logout")
            .cookie(cookie.clone())
            .to_request();
        let res = test::call_service(&app, req).await;
        assert_eq!(res.status(), StatusCode::OK);
        let cleared = cookie_named(&res, ACCESS_COOKIE).unwrap();
        assert_eq!(cleared.value(), "");

        // Same token, session gone
        let req = test::TestRequest::get()
            .uri("/auth/check-auth")
            .cookie(cookie)
            .to_request();
        let res = test::call_service(&app, req).await;
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
        let body: Value = test::read_body_json(res).await;
        assert_eq!(body["isAuthenticated"], false);
        assert_eq!(body["message"], "Session expired");
    }

    #[actix_web::test]
    async fn test_check_auth_reports_identity() {
        let state = test_support::state();
        let user = test_support::seed_user(&state, "jane@example.com", false).await;
        let cookie = test_support::session_cookie(&state, &user).await;
        let app = test_app!(state);

        let req = test::TestRequest::get()
            .uri("/auth/check-auth")
            .cookie(cookie)
            .to_request();
        let res = test::call_service(&app, req).await;
        assert_eq!(res.status(), StatusCode::OK);

        let body: Value = test::read_body_json(res).await;
        assert_eq!(body["isAuthenticated"], true);
        assert_eq!(body["userId"], user.id.to_string());
        assert_eq!(body["email"], "jane@example.com");

        let req = test::TestRequest::get().uri("/auth/check-auth").to_request();
        let res = test::call_service(&app, req).await;
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    }

    #[actix_web::test]
    async fn test_refresh_issues_new_access_token() {
        let state = test_support::state();
        test_support::seed_user(&state, "jane@example.com", false).await;
        let app = test_app!(state);

        let req = test::TestRequest::post()
            .uri("/auth/login")
            .set_json(json!({"email": "jane@example.com", "password": PASSWORD}))
            .to_request();
        let res = test::call_service(&app, req).await;
        let refresh_cookie = cookie_named(&res, REFRESH_COOKIE).unwrap().into_owned();

        let req = test::TestRequest::post()
            .uri("/auth/refresh")
            .cookie(refresh_cookie)
            .to_request();
        let res = test::call_service(&app, req).await;
        assert_eq!(res.status(), StatusCode::OK);
        assert!(cookie_named(&res, ACCESS_COOKIE).is_some());

        let req = test::TestRequest::post().uri("/auth/refresh").to_request();
        let res = test::call_service(&app, req).await;
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    }
}
