//! Order entity for SeaORM.
//!
//! Line items and the shipping address are snapshots taken when the order
//! is placed, stored as JSONB so later catalog edits do not rewrite history.

use sea_orm::Set;
use sea_orm::entity::prelude::*;

use shopfront_core::domain::{Order, OrderItem};
use shopfront_core::error::RepoError;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "orders")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub user_id: Uuid,
    #[sea_orm(column_type = "JsonBinary")]
    pub items: Json,
    #[sea_orm(column_type = "JsonBinary")]
    pub address: Json,
    pub payment_mode: String,
    pub total: f64,
    pub status: String,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::UserId",
        to = "super::user::Column::Id",
        on_delete = "Cascade"
    )]
    User,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl TryFrom<Model> for Order {
    type Error = RepoError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        let corrupt = |what: &str, e: &dyn std::fmt::Display| {
            RepoError::Corrupt(format!("order {} {what}: {e}", model.id))
        };

        let items: Vec<OrderItem> =
            serde_json::from_value(model.items.clone()).map_err(|e| corrupt("items", &e))?;
        let address =
            serde_json::from_value(model.address.clone()).map_err(|e| corrupt("address", &e))?;
        let status = model.status.parse().map_err(|e| corrupt("status", &e))?;

        Ok(Self {
            id: model.id,
            user_id: model.user_id,
            items,
            address,
            payment_mode: model.payment_mode,
            total: model.total,
            status,
            created_at: model.created_at.into(),
            updated_at: model.updated_at.into(),
        })
    }
}

impl TryFrom<Order> for ActiveModel {
    type Error = RepoError;

    fn try_from(order: Order) -> Result<Self, Self::Error> {
        let items =
            serde_json::to_value(&order.items).map_err(|e| RepoError::Query(e.to_string()))?;
        let address =
            serde_json::to_value(&order.address).map_err(|e| RepoError::Query(e.to_string()))?;

        Ok(Self {
            id: Set(order.id),
            user_id: Set(order.user_id),
            items: Set(items),
            address: Set(address),
            payment_mode: Set(order.payment_mode),
            total: Set(order.total),
            status: Set(order.status.as_str().to_string()),
            created_at: Set(order.created_at.into()),
            updated_at: Set(order.updated_at.into()),
        })
    }
}
