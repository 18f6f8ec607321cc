//! Data Transfer Objects - request/response types for the API.
//!
//! Field names are camelCase on the wire. Request fields that the handlers
//! validate themselves are `Option` so a missing field yields a precise 400
//! instead of a generic deserialization error.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ---------------------------------------------------------------------------
// Auth
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SignupRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoginRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

/// A user's public information. Never carries the password hash.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub is_admin: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub user: UserResponse,
    pub is_admin: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckAuthResponse {
    pub is_authenticated: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_admin: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl CheckAuthResponse {
    pub fn rejected(message: impl Into<String>) -> Self {
        Self {
            is_authenticated: false,
            message: Some(message.into()),
            ..Default::default()
        }
    }
}

// ---------------------------------------------------------------------------
// Users
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateUserRequest {
    pub name: Option<String>,
    pub email: Option<String>,
}

// ---------------------------------------------------------------------------
// Catalog
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CreateBrandRequest {
    pub name: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateProductRequest {
    pub title: String,
    pub description: String,
    pub price: f64,
    #[serde(default)]
    pub discount_percentage: f64,
    pub stock_quantity: i32,
    pub image: String,
    /// Brand *name*; created on the fly when unknown.
    pub brand: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProductRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub price: Option<f64>,
    pub discount_percentage: Option<f64>,
    pub stock_quantity: Option<i32>,
    pub image: Option<String>,
    pub is_deleted: Option<bool>,
    pub brand: Option<String>,
}

// ---------------------------------------------------------------------------
// Addresses
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddressPayload {
    #[serde(default)]
    pub street: String,
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub state: String,
    #[serde(default)]
    pub phone_number: String,
    #[serde(default)]
    pub postal_code: String,
    #[serde(default)]
    pub country: String,
    #[serde(default, rename = "type")]
    pub address_type: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CreateAddressRequest {
    /// Owner; only honoured for administrators.
    pub user: Option<Uuid>,
    #[serde(flatten)]
    pub address: AddressPayload,
}

// ---------------------------------------------------------------------------
// Cart & orders
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddToCartRequest {
    pub product: Uuid,
    pub quantity: Option<i32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateCartItemRequest {
    pub quantity: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderLineRequest {
    pub product: Uuid,
    pub quantity: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderRequest {
    pub items: Vec<OrderLineRequest>,
    pub address: AddressPayload,
    pub payment_mode: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateOrderRequest {
    pub status: String,
}

// ---------------------------------------------------------------------------
// Uploads
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadResponse {
    pub url: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_address_type_uses_wire_name() {
        let req: CreateAddressRequest = serde_json::from_value(serde_json::json!({
            "street": "1 Main St",
            "phoneNumber": "555",
            "type": "Work"
        }))
        .unwrap();
        assert_eq!(req.address.address_type, "Work");
        assert_eq!(req.address.phone_number, "555");
        assert!(req.user.is_none());
    }

    #[test]
    fn test_check_auth_rejection_omits_identity() {
        let body = serde_json::to_value(CheckAuthResponse::rejected("Session expired")).unwrap();
        assert_eq!(body["isAuthenticated"], false);
        assert!(body.get("userId").is_none());
    }
}
