//! Address entity for SeaORM.

use sea_orm::Set;
use sea_orm::entity::prelude::*;

use shopfront_core::domain::{Address, AddressFields};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "addresses")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub user_id: Uuid,
    pub street: String,
    pub city: String,
    pub state: String,
    pub phone_number: String,
    pub postal_code: String,
    pub country: String,
    pub address_type: String,
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

impl From<Model> for Address {
    fn from(model: Model) -> Self {
        Self {
            id: model.id,
            user_id: model.user_id,
            fields: AddressFields {
                street: model.street,
                city: model.city,
                state: model.state,
                phone_number: model.phone_number,
                postal_code: model.postal_code,
                country: model.country,
                address_type: model.address_type,
            },
            created_at: model.created_at.into(),
            updated_at: model.updated_at.into(),
        }
    }
}

impl From<Address> for ActiveModel {
    fn from(address: Address) -> Self {
        let fields = address.fields;
        Self {
            id: Set(address.id),
            user_id: Set(address.user_id),
            street: Set(fields.street),
            city: Set(fields.city),
            state: Set(fields.state),
            phone_number: Set(fields.phone_number),
            postal_code: Set(fields.postal_code),
            country: Set(fields.country),
            address_type: Set(fields.address_type),
            created_at: Set(address.created_at.into()),
            updated_at: Set(address.updated_at.into()),
        }
    }
}
