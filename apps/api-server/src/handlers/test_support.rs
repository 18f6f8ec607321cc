//! Helpers shared by handler tests.

use actix_web::cookie::Cookie;

use shopfront_core::domain::User;
use shopfront_core::domain::session::new_session_id;
use shopfront_core::ports::BaseRepository;

use crate::config::AppConfig;
use crate::middleware::auth::ACCESS_COOKIE;
use crate::state::AppState;

pub const PASSWORD: &str = "correct-horse";

/// Build an initialized test service over `state` with the full route table.
macro_rules! test_app {
    ($state:expr) => {{
        let state: crate::state::AppState = $state.clone();
        actix_web::test::init_service(
            actix_web::App::new()
                .app_data(actix_web::web::Data::new(state.clone()))
                .configure(|cfg| crate::handlers::configure_routes(cfg, &state)),
        )
        .await
    }};
}
pub(crate) use test_app;

pub fn state() -> AppState {
    AppState::in_memory(AppConfig::for_tests()).expect("in-memory state")
}

/// Insert a user whose password is [`PASSWORD`].
pub async fn seed_user(state: &AppState, email: &str, is_admin: bool) -> User {
    let hash = state.passwords.hash(PASSWORD).expect("hash");
    let user = if is_admin {
        User::new_admin("Admin".into(), email.into(), hash)
    } else {
        User::new("Shopper".into(), email.into(), hash)
    };
    state.users.insert(user).await.expect("insert user")
}

/// An access-token cookie for a fresh live session of `user`.
pub async fn session_cookie(state: &AppState, user: &User) -> Cookie<'static> {
    let sid = new_session_id();
    let refresh = state
        .tokens
        .issue_refresh_token(user.id, &sid)
        .expect("refresh token");
    state
        .sessions
        .store(user.id, &sid, &refresh, state.tokens.refresh_token_ttl())
        .await
        .expect("store session");
    let access = state
        .tokens
        .issue_access_token(user.id, &sid, user.is_admin)
        .expect("access token");
    Cookie::new(ACCESS_COOKIE, access)
}
