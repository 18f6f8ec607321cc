//! Saved shipping addresses.

use actix_web::{HttpResponse, web};

use shopfront_core::domain::{Address, AddressFields};
use shopfront_core::ports::BaseRepository;
use shopfront_shared::dto::{AddressPayload, CreateAddressRequest};

use super::parse_id;
use crate::middleware::auth::AuthUser;
use crate::middleware::error::{AppError, AppResult};
use crate::state::AppState;

pub(super) fn address_fields(payload: AddressPayload) -> AddressFields {
    AddressFields {
        street: payload.street,
        city: payload.city,
        state: payload.state,
        phone_number: payload.phone_number,
        postal_code: payload.postal_code,
        country: payload.country,
        address_type: payload.address_type,
    }
}

/// POST /address
pub async fn create_address(
    state: web::Data<AppState>,
    caller: AuthUser,
    body: web::Json<CreateAddressRequest>,
) -> AppResult<HttpResponse> {
    let req = body.into_inner();

    // Only admins may file an address under someone else
    let owner = match req.user {
        Some(user_id) if caller.is_admin && user_id != caller.user_id => {
            if state.users.find_by_id(user_id).await?.is_none() {
                return Err(AppError::NotFound("User not found".to_string()));
            }
            user_id
        }
        _ => caller.user_id,
    };

    let address = Address::new(owner, address_fields(req.address))?;
    let address = state.addresses.insert(address).await?;
    tracing::debug!(address_id = %address.id, user_id = %owner, "Address saved");

    Ok(HttpResponse::Created().json(address))
}

/// GET /address/user/{id}
pub async fn list_user_addresses(
    state: web::Data<AppState>,
    caller: AuthUser,
    path: web::Path<String>,
) -> AppResult<HttpResponse> {
    let user_id = parse_id(&path)?;
    caller.require_self_or_admin(user_id)?;

    Ok(HttpResponse::Ok().json(state.addresses.find_by_user_id(user_id).await?))
}

/// DELETE /address/{id}
pub async fn delete_address(
    state: web::Data<AppState>,
    caller: AuthUser,
    path: web::Path<String>,
) -> AppResult<HttpResponse> {
    let id = parse_id(&path)?;
    let address = state
        .addresses
        .find_by_id(id)
        .await?
        .ok_or_else(|| AppError::NotFound("Address not found".to_string()))?;
    caller.require_self_or_admin(address.user_id)?;

    state.addresses.delete(id).await?;
    Ok(HttpResponse::Ok().json(address))
}

#[cfg(test)]
mod tests {
    use actix_web::http::StatusCode;
    use actix_web::test;
    use serde_json::{Value, json};
    use uuid::Uuid;

    use crate::handlers::test_support::{self, test_app};

    fn home(extra: Value) -> Value {
        let mut body = json!({
            "street": "1 Main St",
            "city": "Springfield",
            "state": "IL",
            "phoneNumber": "555-0100",
            "postalCode": "62701",
            "country": "US",
            "type": "Home",
        });
        if let (Some(body), Some(extra)) = (body.as_object_mut(), extra.as_object()) {
            body.extend(extra.clone());
        }
        body
    }

    #[actix_web::test]
    async fn test_address_lifecycle() {
        let state = test_support::state();
        let jane = test_support::seed_user(&state, "jane@example.com", false).await;
        let cookie = test_support::session_cookie(&state, &jane).await;
        let app = test_app!(state);

        // A shopper's `user` field is ignored
        let req = test::TestRequest::post()
            .uri("/address")
            .cookie(cookie.clone())
            .set_json(home(json!({"user": Uuid::new_v4()})))
            .to_request();
        let res = test::call_service(&app, req).await;
        assert_eq!(res.status(), StatusCode::CREATED);
        let created: Value = test::read_body_json(res).await;
        assert_eq!(created["userId"], jane.id.to_string());

        let req = test::TestRequest::get()
            .uri(&format!("/address/user/{}", jane.id))
            .cookie(cookie.clone())
            .to_request();
        let list: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(list.as_array().map(Vec::len), Some(1));

        let req = test::TestRequest::delete()
            .uri(&format!("/address/{}", created["id"].as_str().unwrap()))
            .cookie(cookie.clone())
            .to_request();
        let deleted: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(deleted["id"], created["id"]);

        let req = test::TestRequest::delete()
            .uri(&format!("/address/{}", created["id"].as_str().unwrap()))
            .cookie(cookie)
            .to_request();
        let res = test::call_service(&app, req).await;
        assert_eq!(res.status(), StatusCode::NOT_FOUND);
    }

    #[actix_web::test]
    async fn test_admin_files_address_for_user() {
        let state = test_support::state();
        let admin = test_support::seed_user(&state, "admin@example.com", true).await;
        let jane = test_support::seed_user(&state, "jane@example.com", false).await;
        let cookie = test_support::session_cookie(&state, &admin).await;
        let app = test_app!(state);

        let req = test::TestRequest::post()
            .uri("/address")
            .cookie(cookie.clone())
            .set_json(home(json!({"user": jane.id})))
            .to_request();
        let created: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(created["userId"], jane.id.to_string());

        let req = test::TestRequest::post()
            .uri("/address")
            .cookie(cookie.clone())
            .set_json(home(json!({"user": Uuid::new_v4()})))
            .to_request();
        let res = test::call_service(&app, req).await;
        assert_eq!(res.status(), StatusCode::NOT_FOUND);

        let req = test::TestRequest::post()
            .uri("/address")
            .cookie(cookie)
            .set_json(json!({"street": "1 Main St"}))
            .to_request();
        let res = test::call_service(&app, req).await;
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    }

    #[actix_web::test]
    async fn test_other_users_addresses_are_forbidden() {
        let state = test_support::state();
        let jane = test_support::seed_user(&state, "jane@example.com", false).await;
        let john = test_support::seed_user(&state, "john@example.com", false).await;
        let cookie = test_support::session_cookie(&state, &jane).await;
        let app = test_app!(state);

        let req = test::TestRequest::get()
            .uri(&format!("/address/user/{}", john.id))
            .cookie(cookie)
            .to_request();
        let res = test::call_service(&app, req).await;
        assert_eq!(res.status(), StatusCode::FORBIDDEN);
    }
}
