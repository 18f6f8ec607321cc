//! Brand handlers.

use actix_web::{HttpResponse, web};

use shopfront_core::domain::Brand;
use shopfront_core::ports::BaseRepository;
use shopfront_shared::dto::CreateBrandRequest;

use crate::middleware::auth::AuthUser;
use crate::middleware::error::{AppError, AppResult};
use crate::state::AppState;

/// POST /brands
pub async fn create_brand(
    state: web::Data<AppState>,
    caller: AuthUser,
    body: web::Json<CreateBrandRequest>,
) -> AppResult<HttpResponse> {
    caller.require_admin()?;

    let name = body
        .into_inner()
        .name
        .filter(|n| !n.trim().is_empty())
        .ok_or_else(|| AppError::BadRequest("Brand name is required".to_string()))?;

    if state.brands.find_by_name(&name).await?.is_some() {
        return Err(AppError::Conflict(format!("Brand '{}' already exists", name.trim())));
    }

    let brand = state.brands.insert(Brand::new(&name)?).await?;
    tracing::info!(brand_id = %brand.id, name = %brand.name, "Brand created");

    Ok(HttpResponse::Created().json(brand))
}

/// GET /brands
pub async fn list_brands(state: web::Data<AppState>) -> AppResult<HttpResponse> {
    Ok(HttpResponse::Ok().json(state.brands.list_all().await?))
}
