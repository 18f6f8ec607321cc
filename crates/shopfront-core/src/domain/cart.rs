use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::product::Product;
use crate::error::DomainError;

/// One product line in a user's cart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartItem {
    pub id: Uuid,
    pub user_id: Uuid,
    pub product_id: Uuid,
    pub quantity: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl CartItem {
    pub fn new(user_id: Uuid, product_id: Uuid, quantity: i32) -> Result<Self, DomainError> {
        check_quantity(quantity)?;
        let now = Utc::now();
        Ok(Self {
            id: Uuid::new_v4(),
            user_id,
            product_id,
            quantity,
            created_at: now,
            updated_at: now,
        })
    }

    pub fn set_quantity(&mut self, quantity: i32) -> Result<(), DomainError> {
        check_quantity(quantity)?;
        self.quantity = quantity;
        self.updated_at = Utc::now();
        Ok(())
    }

    /// Merge another addition of the same product into this line.
    pub fn add_quantity(&mut self, extra: i32) -> Result<(), DomainError> {
        let total = self
            .quantity
            .checked_add(extra)
            .ok_or_else(|| DomainError::Validation("quantity is too large".to_string()))?;
        self.set_quantity(total)
    }
}

fn check_quantity(quantity: i32) -> Result<(), DomainError> {
    if quantity < 1 {
        return Err(DomainError::Validation("quantity must be at least 1".to_string()));
    }
    Ok(())
}

/// A cart line with its product populated.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartLine {
    #[serde(flatten)]
    pub item: CartItem,
    pub product: Option<Product>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quantity_must_be_positive() {
        assert!(CartItem::new(Uuid::new_v4(), Uuid::new_v4(), 0).is_err());

        let mut item = CartItem::new(Uuid::new_v4(), Uuid::new_v4(), 2).unwrap();
        assert!(item.set_quantity(-1).is_err());
        assert_eq!(item.quantity, 2);

        item.add_quantity(3).unwrap();
        assert_eq!(item.quantity, 5);
        assert!(item.add_quantity(i32::MAX).is_err());
    }
}
