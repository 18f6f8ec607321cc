//! First-run administrator provisioning.

use shopfront_core::domain::{User, is_plausible_email, mask_email, normalize_email};
use shopfront_core::ports::BaseRepository;

use crate::config::AdminBootstrap;
use crate::middleware::error::AppError;
use crate::state::AppState;

/// Create the configured administrator unless an admin already exists.
///
/// Never fails startup: problems are logged and the server carries on.
pub async fn ensure_admin(state: &AppState) {
    let Some(admin) = &state.config.admin else {
        return;
    };

    match create_admin(state, admin).await {
        Ok(Some(user)) => {
            tracing::info!(user_id = %user.id, email = %mask_email(&user.email), "Admin account created");
        }
        Ok(None) => tracing::debug!("Admin account already present"),
        Err(e) => tracing::error!(error = %e, "Admin bootstrap failed"),
    }
}

async fn create_admin(state: &AppState, admin: &AdminBootstrap) -> Result<Option<User>, AppError> {
    if state.users.any_admin().await? {
        return Ok(None);
    }
    if !is_plausible_email(&admin.email) {
        return Err(AppError::BadRequest("ADMIN_EMAIL is not a valid email".to_string()));
    }
    if state.users.find_by_email(&normalize_email(&admin.email)).await?.is_some() {
        return Err(AppError::Conflict(format!(
            "{} is already registered as a regular user",
            mask_email(&admin.email)
        )));
    }

    let hash = state.passwords.hash(&admin.password)?;
    let user = User::new_admin(admin.name.clone(), admin.email.clone(), hash);
    Ok(Some(state.users.insert(user).await?))
}
