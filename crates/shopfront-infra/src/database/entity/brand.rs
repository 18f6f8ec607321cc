//! Brand entity for SeaORM.

use sea_orm::Set;
use sea_orm::entity::prelude::*;

use shopfront_core::domain::Brand;

/// Names are unique case-insensitively; the migration adds a `lower(name)` index.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "brands")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub name: String,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::product::Entity")]
    Product,
}

impl Related<super::product::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Product.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for Brand {
    fn from(model: Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
            created_at: model.created_at.into(),
            updated_at: model.updated_at.into(),
        }
    }
}

impl From<Brand> for ActiveModel {
    fn from(brand: Brand) -> Self {
        Self {
            id: Set(brand.id),
            name: Set(brand.name),
            created_at: Set(brand.created_at.into()),
            updated_at: Set(brand.updated_at.into()),
        }
    }
}
