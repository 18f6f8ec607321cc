//! Shopping cart handlers.

use actix_web::{HttpResponse, web};

use shopfront_core::domain::{CartItem, CartLine};
use shopfront_core::ports::BaseRepository;
use shopfront_shared::dto::{AddToCartRequest, UpdateCartItemRequest};

use super::parse_id;
use crate::middleware::auth::AuthUser;
use crate::middleware::error::{AppError, AppResult};
use crate::state::AppState;

async fn owned_item(state: &AppState, caller: &AuthUser, raw_id: &str) -> AppResult<CartItem> {
    let id = parse_id(raw_id)?;
    let item = state
        .cart
        .find_by_id(id)
        .await?
        .ok_or_else(|| AppError::NotFound("Cart item not found".to_string()))?;
    caller.require_self_or_admin(item.user_id)?;
    Ok(item)
}

async fn with_product(state: &AppState, item: CartItem) -> AppResult<CartLine> {
    let product = state.products.find_by_id(item.product_id).await?;
    Ok(CartLine { item, product })
}

/// POST /cart
pub async fn add_to_cart(
    state: web::Data<AppState>,
    caller: AuthUser,
    body: web::Json<AddToCartRequest>,
) -> AppResult<HttpResponse> {
    let req = body.into_inner();
    let quantity = req.quantity.unwrap_or(1);

    let product = state
        .products
        .find_by_id(req.product)
        .await?
        .filter(|p| !p.is_deleted)
        .ok_or_else(|| AppError::NotFound("Product not found".to_string()))?;

    let item = match state.cart.find_line(caller.user_id, product.id).await? {
        Some(mut existing) => {
            existing.add_quantity(quantity)?;
            state.cart.update(existing).await?
        }
        None => {
            state
                .cart
                .insert(CartItem::new(caller.user_id, product.id, quantity)?)
                .await?
        }
    };

    Ok(HttpResponse::Created().json(CartLine {
        item,
        product: Some(product),
    }))
}

/// GET /cart/user/{id}
pub async fn list_cart(
    state: web::Data<AppState>,
    caller: AuthUser,
    path: web::Path<String>,
) -> AppResult<HttpResponse> {
    let user_id = parse_id(&path)?;
    caller.require_self_or_admin(user_id)?;

    Ok(HttpResponse::Ok().json(state.cart.find_by_user_id(user_id).await?))
}

/// PATCH /cart/{id}
pub async fn update_cart_item(
    state: web::Data<AppState>,
    caller: AuthUser,
    path: web::Path<String>,
    body: web::Json<UpdateCartItemRequest>,
) -> AppResult<HttpResponse> {
    let mut item = owned_item(&state, &caller, &path).await?;
    item.set_quantity(body.quantity)?;
    let item = state.cart.update(item).await?;

    Ok(HttpResponse::Ok().json(with_product(&state, item).await?))
}

/// DELETE /cart/{id}
pub async fn remove_cart_item(
    state: web::Data<AppState>,
    caller: AuthUser,
    path: web::Path<String>,
) -> AppResult<HttpResponse> {
    let item = owned_item(&state, &caller, &path).await?;
    state.cart.delete(item.id).await?;

    Ok(HttpResponse::Ok().json(with_product(&state, item).await?))
}

/// DELETE /cart/user/{id}
pub async fn clear_cart(
    state: web::Data<AppState>,
    caller: AuthUser,
    path: web::Path<String>,
) -> AppResult<HttpResponse> {
    let user_id = parse_id(&path)?;
    caller.require_self_or_admin(user_id)?;

    let removed = state.cart.delete_by_user_id(user_id).await?;
    tracing::debug!(user_id = %user_id, removed, "Cart cleared");

    Ok(HttpResponse::NoContent().finish())
}

#[cfg(test)]
mod tests {
    use actix_web::http::StatusCode;
    use actix_web::test;
    use serde_json::{Value, json};
    use uuid::Uuid;

    use shopfront_core::domain::{Brand, NewProduct, Product, User};
    use shopfront_core::ports::BaseRepository;

    use crate::handlers::test_support::{self, test_app};
    use crate::state::AppState;

    async fn seed_product(state: &AppState) -> Product {
        let brand = state.brands.insert(Brand::new("Acme").unwrap()).await.unwrap();
        let product = Product::new(
            NewProduct {
                title: "Lamp".into(),
                description: "A lamp".into(),
                price: 12.5,
                discount_percentage: 0.0,
                stock_quantity: 10,
                image: "lamp.png".into(),
            },
            brand.id,
        )
        .unwrap();
        state.products.insert(product).await.unwrap()
    }

    async fn setup() -> (AppState, User, Product) {
        let state = test_support::state();
        let user = test_support::seed_user(&state, "jane@example.com", false).await;
        let product = seed_product(&state).await;
        (state, user, product)
    }

    #[actix_web::test]
    async fn test_adding_same_product_merges_lines() {
        let (state, user, product) = setup().await;
        let cookie = test_support::session_cookie(&state, &user).await;
        let app = test_app!(state);

        for quantity in [Some(2), None] {
            let req = test::TestRequest::post()
                .uri("/cart")
                .cookie(cookie.clone())
                .set_json(json!({"product": product.id, "quantity": quantity}))
                .to_request();
            let res = test::call_service(&app, req).await;
            assert_eq!(res.status(), StatusCode::CREATED);
        }

        let req = test::TestRequest::get()
            .uri(&format!("/cart/user/{}", user.id))
            .cookie(cookie)
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        let lines = body.as_array().unwrap();
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0]["quantity"], 3);
        assert_eq!(lines[0]["product"]["title"], "Lamp");
    }

    #[actix_web::test]
    async fn test_unknown_product_is_not_found() {
        let (state, user, _) = setup().await;
        let cookie = test_support::session_cookie(&state, &user).await;
        let app = test_app!(state);

        let req = test::TestRequest::post()
            .uri("/cart")
            .cookie(cookie)
            .set_json(json!({"product": Uuid::new_v4()}))
            .to_request();
        let res = test::call_service(&app, req).await;
        assert_eq!(res.status(), StatusCode::NOT_FOUND);
    }

    #[actix_web::test]
    async fn test_update_remove_and_clear() {
        let (state, user, product) = setup().await;
        let other = test_support::seed_user(&state, "john@example.com", false).await;
        let cookie = test_support::session_cookie(&state, &user).await;
        let other_cookie = test_support::session_cookie(&state, &other).await;
        let app = test_app!(state);

        let req = test::TestRequest::post()
            .uri("/cart")
            .cookie(cookie.clone())
            .set_json(json!({"product": product.id}))
            .to_request();
        let line: Value = test::call_and_read_body_json(&app, req).await;
        let line_uri = format!("/cart/{}", line["id"].as_str().unwrap());

        let req = test::TestRequest::patch()
            .uri(&line_uri)
            .cookie(cookie.clone())
            .set_json(json!({"quantity": 0}))
            .to_request();
        let res = test::call_service(&app, req).await;
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);

        let req = test::TestRequest::patch()
            .uri(&line_uri)
            .cookie(other_cookie)
            .set_json(json!({"quantity": 4}))
            .to_request();
        let res = test::call_service(&app, req).await;
        assert_eq!(res.status(), StatusCode::FORBIDDEN);

        let req = test::TestRequest::patch()
            .uri(&line_uri)
            .cookie(cookie.clone())
            .set_json(json!({"quantity": 4}))
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["quantity"], 4);

        let req = test::TestRequest::delete()
            .uri(&line_uri)
            .cookie(cookie.clone())
            .to_request();
        let res = test::call_service(&app, req).await;
        assert_eq!(res.status(), StatusCode::OK);

        let req = test::TestRequest::delete()
            .uri(&format!("/cart/user/{}", user.id))
            .cookie(cookie)
            .to_request();
        let res = test::call_service(&app, req).await;
        assert_eq!(res.status(), StatusCode::NO_CONTENT);
    }
}
