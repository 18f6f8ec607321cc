use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::DomainError;

/// Postal fields shared by saved addresses and order snapshots.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddressFields {
    pub street: String,
    pub city: String,
    pub state: String,
    pub phone_number: String,
    pub postal_code: String,
    pub country: String,
    #[serde(default)]
    pub address_type: String,
}

impl AddressFields {
    pub fn validate(&self) -> Result<(), DomainError> {
        let required = [
            ("street", &self.street),
            ("city", &self.city),
            ("state", &self.state),
            ("phoneNumber", &self.phone_number),
            ("postalCode", &self.postal_code),
            ("country", &self.country),
        ];
        let missing: Vec<&str> = required
            .iter()
            .filter(|(_, value)| value.trim().is_empty())
            .map(|(name, _)| *name)
            .collect();

        if missing.is_empty() {
            Ok(())
        } else {
            Err(DomainError::Validation(format!(
                "missing address fields: {}",
                missing.join(", ")
            )))
        }
    }
}

/// A saved shipping address owned by a user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Address {
    pub id: Uuid,
    pub user_id: Uuid,
    #[serde(flatten)]
    pub fields: AddressFields,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Address {
    pub fn new(user_id: Uuid, fields: AddressFields) -> Result<Self, DomainError> {
        fields.validate()?;
        let now = Utc::now();
        Ok(Self {
            id: Uuid::new_v4(),
            user_id,
            fields,
            created_at: now,
            updated_at: now,
        })
    }
}
