use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::address::AddressFields;
use super::product::Product;
use crate::error::DomainError;

/// Fulfilment state of an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderStatus {
    Pending,
    Dispatched,
    #[serde(rename = "Out for delivery")]
    OutForDelivery,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "Pending",
            Self::Dispatched => "Dispatched",
            Self::OutForDelivery => "Out for delivery",
            Self::Delivered => "Delivered",
            Self::Cancelled => "Cancelled",
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Pending" => Ok(Self::Pending),
            "Dispatched" => Ok(Self::Dispatched),
            "Out for delivery" => Ok(Self::OutForDelivery),
            "Delivered" => Ok(Self::Delivered),
            "Cancelled" => Ok(Self::Cancelled),
            other => Err(DomainError::Validation(format!("unknown order status '{other}'"))),
        }
    }
}

/// Price snapshot of a product at the time the order was placed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
    pub product_id: Uuid,
    pub title: String,
    pub unit_price: f64,
    pub quantity: i32,
}

impl OrderItem {
    pub fn from_product(product: &Product, quantity: i32) -> Result<Self, DomainError> {
        if quantity < 1 {
            return Err(DomainError::Validation("quantity must be at least 1".to_string()));
        }
        if product.is_deleted {
            return Err(DomainError::Validation(format!(
                "'{}' is no longer available",
                product.title
            )));
        }
        if quantity > product.stock_quantity {
            return Err(DomainError::Validation(format!(
                "only {} of '{}' left in stock",
                product.stock_quantity, product.title
            )));
        }
        Ok(Self {
            product_id: product.id,
            title: product.title.clone(),
            unit_price: product.discounted_price(),
            quantity,
        })
    }

    pub fn line_total(&self) -> f64 {
        self.unit_price * f64::from(self.quantity)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: Uuid,
    pub user_id: Uuid,
    pub items: Vec<OrderItem>,
    pub address: AddressFields,
    pub payment_mode: String,
    pub total: f64,
    pub status: OrderStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Order {
    /// Place a new pending order; the total is derived from the item snapshots.
    pub fn place(
        user_id: Uuid,
        items: Vec<OrderItem>,
        address: AddressFields,
        payment_mode: String,
    ) -> Result<Self, DomainError> {
        if items.is_empty() {
            return Err(DomainError::Validation("an order needs at least one item".to_string()));
        }
        if payment_mode.trim().is_empty() {
            return Err(DomainError::Validation("paymentMode is required".to_string()));
        }
        address.validate()?;

        let total = items.iter().map(OrderItem::line_total).sum::<f64>();
        let now = Utc::now();
        Ok(Self {
            id: Uuid::new_v4(),
            user_id,
            items,
            address,
            payment_mode: payment_mode.trim().to_string(),
            total: (total * 100.0).round() / 100.0,
            status: OrderStatus::Pending,
            created_at: now,
            updated_at: now,
        })
    }

    pub fn set_status(&mut self, status: OrderStatus) {
        self.status = status;
        self.updated_at = Utc::now();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::product::NewProduct;

    fn address() -> AddressFields {
        AddressFields {
            street: "1 Main St".into(),
            city: "Springfield".into(),
            state: "IL".into(),
            phone_number: "555-0100".into(),
            postal_code: "62701".into(),
            country: "US".into(),
            address_type: "Home".into(),
        }
    }

    fn product(price: f64, discount: f64, stock: i32) -> Product {
        Product::new(
            NewProduct {
                title: "Lamp".into(),
                description: "A lamp".into(),
                price,
                discount_percentage: discount,
                stock_quantity: stock,
                image: "lamp.png".into(),
            },
            Uuid::new_v4(),
        )
        .unwrap()
    }

    #[test]
    fn test_place_computes_discounted_total() {
        let items = vec![
            OrderItem::from_product(&product(10.0, 10.0, 5), 2).unwrap(),
            OrderItem::from_product(&product(5.5, 0.0, 5), 1).unwrap(),
        ];
        let order = Order::place(Uuid::new_v4(), items, address(), "COD".into()).unwrap();
        assert_eq!(order.total, 23.5);
        assert_eq!(order.status, OrderStatus::Pending);
    }

    #[test]
    fn test_place_rejects_empty_items() {
        let result = Order::place(Uuid::new_v4(), vec![], address(), "COD".into());
        assert!(result.is_err());
    }

    #[test]
    fn test_item_rejects_overselling_and_deleted_products() {
        assert!(OrderItem::from_product(&product(1.0, 0.0, 1), 2).is_err());

        let mut gone = product(1.0, 0.0, 10);
        gone.is_deleted = true;
        assert!(OrderItem::from_product(&gone, 1).is_err());
    }

    #[test]
    fn test_status_round_trips_through_str() {
        for status in [
            OrderStatus::Pending,
            OrderStatus::Dispatched,
            OrderStatus::OutForDelivery,
            OrderStatus::Delivered,
            OrderStatus::Cancelled,
        ] {
            assert_eq!(status.as_str().parse::<OrderStatus>().unwrap(), status);
        }
        assert_eq!(
            serde_json::to_string(&OrderStatus::OutForDelivery).unwrap(),
            "\"Out for delivery\""
        );
    }
}
