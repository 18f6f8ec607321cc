//! Product entity for SeaORM.

use sea_orm::Set;
use sea_orm::entity::prelude::*;

use shopfront_core::domain::Product;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "products")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub title: String,
    #[sea_orm(column_type = "Text")]
    pub description: String,
    pub price: f64,
    pub discount_percentage: f64,
    pub brand_id: Uuid,
    pub stock_quantity: i32,
    pub image: String,
    pub is_deleted: bool,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::brand::Entity",
        from = "Column::BrandId",
        to = "super::brand::Column::Id"
    )]
    Brand,
    #[sea_orm(has_many = "super::cart_item::Entity")]
    CartItem,
}

impl Related<super::brand::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Brand.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for Product {
    fn from(model: Model) -> Self {
        Self {
            id: model.id,
            title: model.title,
            description: model.description,
            price: model.price,
            discount_percentage: model.discount_percentage,
            brand_id: model.brand_id,
            stock_quantity: model.stock_quantity,
            image: model.image,
            is_deleted: model.is_deleted,
            created_at: model.created_at.into(),
            updated_at: model.updated_at.into(),
        }
    }
}

impl From<Product> for ActiveModel {
    fn from(product: Product) -> Self {
        Self {
            id: Set(product.id),
            title: Set(product.title),
            description: Set(product.description),
            price: Set(product.price),
            discount_percentage: Set(product.discount_percentage),
            brand_id: Set(product.brand_id),
            stock_quantity: Set(product.stock_quantity),
            image: Set(product.image),
            is_deleted: Set(product.is_deleted),
            created_at: Set(product.created_at.into()),
            updated_at: Set(product.updated_at.into()),
        }
    }
}
