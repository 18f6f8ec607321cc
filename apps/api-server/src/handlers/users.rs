//! User profile handlers.

use actix_web::{HttpResponse, web};

use shopfront_core::domain::{UserChanges, normalize_email};
use shopfront_core::ports::BaseRepository;
use shopfront_shared::dto::UpdateUserRequest;

use super::{parse_id, sanitize};
use crate::middleware::auth::AuthUser;
use crate::middleware::error::{AppError, AppResult};
use crate::state::AppState;

/// GET /users/{id}
pub async fn get_user(
    state: web::Data<AppState>,
    caller: AuthUser,
    path: web::Path<String>,
) -> AppResult<HttpResponse> {
    let id = parse_id(&path)?;
    caller.require_self_or_admin(id)?;

    let user = state
        .users
        .find_by_id(id)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

    Ok(HttpResponse::Ok().json(sanitize(&user)))
}

/// PATCH /users/{id}
pub async fn update_user(
    state: web::Data<AppState>,
    caller: AuthUser,
    path: web::Path<String>,
    body: web::Json<UpdateUserRequest>,
) -> AppResult<HttpResponse> {
    let id = parse_id(&path)?;
    caller.require_self_or_admin(id)?;

    let mut user = state
        .users
        .find_by_id(id)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

    let req = body.into_inner();
    if let Some(email) = &req.email {
        let email = normalize_email(email);
        if email != user.email && state.users.find_by_email(&email).await?.is_some() {
            return Err(AppError::Conflict("Email already in use".to_string()));
        }
    }

    user.apply(UserChanges {
        name: req.name,
        email: req.email,
    })?;
    let user = state.users.update(user).await?;
    tracing::debug!(user_id = %user.id, "User profile updated");

    Ok(HttpResponse::Ok().json(sanitize(&user)))
}
