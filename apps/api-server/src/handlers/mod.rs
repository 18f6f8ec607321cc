//! HTTP handlers and route configuration.

mod addresses;
mod auth;
mod brands;
mod cart;
mod health;
mod orders;
mod products;
pub(crate) mod upload;
mod users;

#[cfg(test)]
pub(crate) mod test_support;

use actix_web::web;
use uuid::Uuid;

use shopfront_core::domain::{PageRequest, User};
use shopfront_shared::dto::UserResponse;

use crate::middleware::error::{AppError, AppResult};
use crate::middleware::rate_limit::RateLimitMiddleware;
use crate::state::AppState;

pub(crate) const TOTAL_COUNT_HEADER: &str = "X-Total-Count";
pub(crate) const JSON_LIMIT: usize = 1024 * 1024;

/// JSON body settings; rejected bodies answer with a problem document.
fn json_config() -> web::JsonConfig {
    web::JsonConfig::default()
        .limit(JSON_LIMIT)
        .error_handler(|err, _req| AppError::BadRequest(err.to_string()).into())
}

/// Configure all application routes.
pub fn configure_routes(cfg: &mut web::ServiceConfig, state: &AppState) {
    let auth_limit = RateLimitMiddleware::new(state.auth_limiter.clone())
        .trust_proxies(&state.config.trusted_proxies);

    cfg.app_data(json_config())
        .route("/health", web::get().to(health::health_check))
        .service(
            web::scope("/auth")
                .wrap(auth_limit)
                .route("/signup", web::post().to(auth::signup))
                .route("/login", web::post().to(auth::login))
                .route("/logout", web::get().to(auth::logout))
                .route("/check-auth", web::get().to(auth::check_auth))
                .route("/refresh", web::post().to(auth::refresh)),
        )
        .service(
            web::scope("/users")
                .route("/{id}", web::get().to(users::get_user))
                .route("/{id}", web::patch().to(users::update_user)),
        )
        .service(
            web::scope("/brands")
                .route("", web::post().to(brands::create_brand))
                .route("", web::get().to(brands::list_brands)),
        )
        .service(
            web::scope("/products")
                .route("", web::post().to(products::create_product))
                .route("", web::get().to(products::list_products))
                .route("/{id}", web::get().to(products::get_product))
                .route("/{id}", web::patch().to(products::update_product))
                .route("/{id}", web::delete().to(products::delete_product)),
        )
        .service(
            web::scope("/address")
                .route("", web::post().to(addresses::create_address))
                .route("/user/{id}", web::get().to(addresses::list_user_addresses))
                .route("/{id}", web::delete().to(addresses::delete_address)),
        )
        .service(
            web::scope("/cart")
                .route("", web::post().to(cart::add_to_cart))
                .route("/user/{id}", web::get().to(cart::list_cart))
                .route("/user/{id}", web::delete().to(cart::clear_cart))
                .route("/{id}", web::patch().to(cart::update_cart_item))
                .route("/{id}", web::delete().to(cart::remove_cart_item)),
        )
        .service(
            web::scope("/orders")
                .route("", web::post().to(orders::create_order))
                .route("", web::get().to(orders::list_orders))
                .route("/user/{id}", web::get().to(orders::list_user_orders))
                .route("/{id}", web::patch().to(orders::update_order_status)),
        )
        .route("/upload", web::post().to(upload::upload_image));
}

/// Parse a path id, answering 400 rather than 404 on garbage.
pub(crate) fn parse_id(raw: &str) -> AppResult<Uuid> {
    Uuid::parse_str(raw).map_err(|_| AppError::BadRequest(format!("Invalid id '{raw}'")))
}

/// A user as exposed over the API, without the password hash.
pub(crate) fn sanitize(user: &User) -> UserResponse {
    UserResponse {
        id: user.id,
        name: user.name.clone(),
        email: user.email.clone(),
        is_admin: user.is_admin,
        created_at: user.created_at,
        updated_at: user.updated_at,
    }
}

/// Read `page` and `limit` from query pairs. Pagination applies only when
/// both are present.
pub(crate) fn parse_page(pairs: &[(String, String)]) -> AppResult<Option<PageRequest>> {
    let number = |name: &str| -> AppResult<Option<u64>> {
        match pairs.iter().find(|(key, _)| key == name) {
            Some((_, value)) => value
                .parse()
                .map(Some)
                .map_err(|_| AppError::BadRequest(format!("{name} must be a positive integer"))),
            None => Ok(None),
        }
    };

    match (number("page")?, number("limit")?) {
        (Some(page), Some(limit)) => Ok(Some(PageRequest::new(page, limit)?)),
        _ => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pairs(raw: &[(&str, &str)]) -> Vec<(String, String)> {
        raw.iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_parse_page_needs_both_values() {
        assert_eq!(parse_page(&pairs(&[("page", "2")])).unwrap(), None);

        let page = parse_page(&pairs(&[("page", "2"), ("limit", "10")]))
            .unwrap()
            .unwrap();
        assert_eq!(page.offset(), 10);

        assert!(parse_page(&pairs(&[("page", "0"), ("limit", "10")])).is_err());
        assert!(parse_page(&pairs(&[("page", "x"), ("limit", "10")])).is_err());
    }

    #[test]
    fn test_parse_id_rejects_garbage() {
        assert!(matches!(parse_id("not-a-uuid"), Err(AppError::BadRequest(_))));
        assert!(parse_id(&Uuid::new_v4().to_string()).is_ok());
    }
}
