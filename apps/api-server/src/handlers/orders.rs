//! Order placement and fulfilment.

use actix_web::{HttpResponse, web};

use shopfront_core::domain::{Order, OrderItem, OrderStatus};
use shopfront_core::ports::BaseRepository;
use shopfront_shared::dto::{CreateOrderRequest, UpdateOrderRequest};

use super::addresses::address_fields;
use super::{TOTAL_COUNT_HEADER, parse_id, parse_page};
use crate::middleware::auth::AuthUser;
use crate::middleware::error::{AppError, AppResult};
use crate::state::AppState;

/// POST /orders
pub async fn create_order(
    state: web::Data<AppState>,
    caller: AuthUser,
    body: web::Json<CreateOrderRequest>,
) -> AppResult<HttpResponse> {
    let req = body.into_inner();
    if req.items.is_empty() {
        return Err(AppError::BadRequest("An order needs at least one item".to_string()));
    }

    let mut items = Vec::with_capacity(req.items.len());
    for line in &req.items {
        let product = state
            .products
            .find_by_id(line.product)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Product {} not found", line.product)))?;
        items.push(OrderItem::from_product(&product, line.quantity)?);
    }

    let order = Order::place(
        caller.user_id,
        items,
        address_fields(req.address),
        req.payment_mode,
    )?;
    let order = state.orders.insert(order).await?;
    tracing::info!(order_id = %order.id, user_id = %order.user_id, total = order.total, "Order placed");

    Ok(HttpResponse::Created().json(order))
}

/// GET /orders/user/{id}
pub async fn list_user_orders(
    state: web::Data<AppState>,
    caller: AuthUser,
    path: web::Path<String>,
) -> AppResult<HttpResponse> {
    let user_id = parse_id(&path)?;
    caller.require_self_or_admin(user_id)?;

    Ok(HttpResponse::Ok().json(state.orders.find_by_user_id(user_id).await?))
}

/// GET /orders
pub async fn list_orders(
    state: web::Data<AppState>,
    caller: AuthUser,
    query: web::Query<Vec<(String, String)>>,
) -> AppResult<HttpResponse> {
    caller.require_admin()?;
    let page = state.orders.list(parse_page(&query)?).await?;

    Ok(HttpResponse::Ok()
        .insert_header((TOTAL_COUNT_HEADER, page.total.to_string()))
        .json(page.items))
}

/// PATCH /orders/{id}
pub async fn update_order_status(
    state: web::Data<AppState>,
    caller: AuthUser,
    path: web::Path<String>,
    body: web::Json<UpdateOrderRequest>,
) -> AppResult<HttpResponse> {
    caller.require_admin()?;
    let id = parse_id(&path)?;
    let status: OrderStatus = body.status.parse()?;

    let mut order = state
        .orders
        .find_by_id(id)
        .await?
        .ok_or_else(|| AppError::NotFound("Order not found".to_string()))?;
    order.set_status(status);
    let order = state.orders.update(order).await?;
    tracing::info!(order_id = %order.id, status = %order.status, "Order status changed");

    Ok(HttpResponse::Ok().json(order))
}

#[cfg(test)]
mod tests {
    use actix_web::http::StatusCode;
    use actix_web::test;
    use serde_json::{Value, json};
    use uuid::Uuid;

    use shopfront_core::domain::{Brand, NewProduct, Product};
    use shopfront_core::ports::BaseRepository;

    use super::TOTAL_COUNT_HEADER;
    use crate::handlers::test_support::{self, test_app};
    use crate::state::AppState;

    async fn seed_product(state: &AppState, price: f64, discount: f64) -> Product {
        let brand = match state.brands.find_by_name("Acme").await.unwrap() {
            Some(brand) => brand,
            None => state.brands.insert(Brand::new("Acme").unwrap()).await.unwrap(),
        };
        let product = Product::new(
            NewProduct {
                title: format!("Item {price}"),
                description: "Thing".into(),
                price,
                discount_percentage: discount,
                stock_quantity: 5,
                image: "item.png".into(),
            },
            brand.id,
        )
        .unwrap();
        state.products.insert(product).await.unwrap()
    }

    fn order_body(lines: Value) -> Value {
        json!({
            "items": lines,
            "address": {
                "street": "1 Main St",
                "city": "Springfield",
                "state": "IL",
                "phoneNumber": "555-0100",
                "postalCode": "62701",
                "country": "US",
            },
            "paymentMode": "card",
        })
    }

    #[actix_web::test]
    async fn test_order_snapshots_discounted_prices() {
        let state = test_support::state();
        let user = test_support::seed_user(&state, "jane@example.com", false).await;
        let lamp = seed_product(&state, 10.0, 10.0).await;
        let bulb = seed_product(&state, 5.5, 0.0).await;
        let cookie = test_support::session_cookie(&state, &user).await;
        let app = test_app!(state);

        let req = test::TestRequest::post()
            .uri("/orders")
            .cookie(cookie.clone())
            .set_json(order_body(json!([
                {"product": lamp.id, "quantity": 2},
                {"product": bulb.id, "quantity": 1},
            ])))
            .to_request();
        let res = test::call_service(&app, req).await;
        assert_eq!(res.status(), StatusCode::CREATED);
        let order: Value = test::read_body_json(res).await;
        assert_eq!(order["total"], 23.5);
        assert_eq!(order["status"], "Pending");
        assert_eq!(order["items"][0]["unitPrice"], 9.0);

        let req = test::TestRequest::get()
            .uri(&format!("/orders/user/{}", user.id))
            .cookie(cookie)
            .to_request();
        let list: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(list[0]["id"], order["id"]);
    }

    #[actix_web::test]
    async fn test_order_validation() {
        let state = test_support::state();
        let user = test_support::seed_user(&state, "jane@example.com", false).await;
        let lamp = seed_product(&state, 10.0, 0.0).await;
        let cookie = test_support::session_cookie(&state, &user).await;
        let app = test_app!(state);

        let cases = [
            (order_body(json!([])), StatusCode::BAD_REQUEST),
            (
                order_body(json!([{"product": Uuid::new_v4(), "quantity": 1}])),
                StatusCode::NOT_FOUND,
            ),
            (
                order_body(json!([{"product": lamp.id, "quantity": 99}])),
                StatusCode::BAD_REQUEST,
            ),
        ];
        for (body, expected) in cases {
            let req = test::TestRequest::post()
                .uri("/orders")
                .cookie(cookie.clone())
                .set_json(body)
                .to_request();
            let res = test::call_service(&app, req).await;
            assert_eq!(res.status(), expected);
        }
    }

    #[actix_web::test]
    async fn test_admin_lists_and_updates_orders() {
        let state = test_support::state();
        let admin = test_support::seed_user(&state, "admin@example.com", true).await;
        let user = test_support::seed_user(&state, "jane@example.com", false).await;
        let lamp = seed_product(&state, 10.0, 0.0).await;
        let admin_cookie = test_support::session_cookie(&state, &admin).await;
        let user_cookie = test_support::session_cookie(&state, &user).await;
        let app = test_app!(state);

        let mut ids = Vec::new();
        for _ in 0..3 {
            let req = test::TestRequest::post()
                .uri("/orders")
                .cookie(user_cookie.clone())
                .set_json(order_body(json!([{"product": lamp.id, "quantity": 1}])))
                .to_request();
            let order: Value = test::call_and_read_body_json(&app, req).await;
            ids.push(order["id"].as_str().unwrap().to_string());
        }

        let req = test::TestRequest::get()
            .uri("/orders?page=1&limit=2")
            .cookie(user_cookie.clone())
            .to_request();
        let res = test::call_service(&app, req).await;
        assert_eq!(res.status(), StatusCode::FORBIDDEN);

        let req = test::TestRequest::get()
            .uri("/orders?page=1&limit=2")
            .cookie(admin_cookie.clone())
            .to_request();
        let res = test::call_service(&app, req).await;
        assert_eq!(res.headers().get(TOTAL_COUNT_HEADER).unwrap(), "3");
        let page: Value = test::read_body_json(res).await;
        assert_eq!(page.as_array().map(Vec::len), Some(2));

        let req = test::TestRequest::patch()
            .uri(&format!("/orders/{}", ids[0]))
            .cookie(admin_cookie.clone())
            .set_json(json!({"status": "Out for delivery"}))
            .to_request();
        let order: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(order["status"], "Out for delivery");

        let req = test::TestRequest::patch()
            .uri(&format!("/orders/{}", ids[0]))
            .cookie(admin_cookie.clone())
            .set_json(json!({"status": "Lost"}))
            .to_request();
        let res = test::call_service(&app, req).await;
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);

        let req = test::TestRequest::patch()
            .uri(&format!("/orders/{}", Uuid::new_v4()))
            .cookie(admin_cookie)
            .set_json(json!({"status": "Delivered"}))
            .to_request();
        let res = test::call_service(&app, req).await;
        assert_eq!(res.status(), StatusCode::NOT_FOUND);
    }
}
