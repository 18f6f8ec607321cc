//! PostgreSQL repository implementations.

use async_trait::async_trait;
use sea_orm::sea_query::{Expr, Func};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DbConn, EntityTrait, Order as SqlOrder, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect,
};
use uuid::Uuid;

use shopfront_core::domain::{
    Address, Brand, CartItem, CartLine, Order, Page, PageRequest, ProductDetails, ProductQuery,
    ProductSortField, SortOrder, User, mask_email,
};
use shopfront_core::error::RepoError;
use shopfront_core::ports::{
    AddressRepository, BaseRepository, BrandRepository, CartRepository, OrderRepository,
    ProductRepository, UserRepository,
};

use super::entity::address::{self, Entity as AddressEntity};
use super::entity::brand::{self, Entity as BrandEntity};
use super::entity::cart_item::{self, Entity as CartItemEntity};
use super::entity::order::{self, Entity as OrderEntity};
use super::entity::product::{self, Entity as ProductEntity};
use super::entity::user::{self, Entity as UserEntity};
use super::postgres_base::{PostgresBaseRepository, query_error, write_error};

pub type PostgresUserRepository = PostgresBaseRepository<UserEntity>;
pub type PostgresBrandRepository = PostgresBaseRepository<BrandEntity>;
pub type PostgresProductRepository = PostgresBaseRepository<ProductEntity>;
pub type PostgresAddressRepository = PostgresBaseRepository<AddressEntity>;
pub type PostgresCartRepository = PostgresBaseRepository<CartItemEntity>;

#[async_trait]
impl UserRepository for PostgresUserRepository {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, RepoError> {
        tracing::debug!(user_email = %mask_email(email), "Finding user by email");

        let result = UserEntity::find()
            .filter(user::Column::Email.eq(email))
            .one(&self.db)
            .await
            .map_err(query_error)?;

        Ok(result.map(Into::into))
    }

    async fn any_admin(&self) -> Result<bool, RepoError> {
        let admins = UserEntity::find()
            .filter(user::Column::IsAdmin.eq(true))
            .count(&self.db)
            .await
            .map_err(query_error)?;

        Ok(admins > 0)
    }
}

#[async_trait]
impl BrandRepository for PostgresBrandRepository {
    async fn find_by_name(&self, name: &str) -> Result<Option<Brand>, RepoError> {
        let result = BrandEntity::find()
            .filter(
                Expr::expr(Func::lower(Expr::col(brand::Column::Name)))
                    .eq(name.trim().to_lowercase()),
            )
            .one(&self.db)
            .await
            .map_err(query_error)?;

        Ok(result.map(Into::into))
    }

    async fn list_all(&self) -> Result<Vec<Brand>, RepoError> {
        let result = BrandEntity::find()
            .order_by_asc(brand::Column::Name)
            .all(&self.db)
            .await
            .map_err(query_error)?;

        Ok(result.into_iter().map(Into::into).collect())
    }
}

fn sort_column(field: ProductSortField) -> product::Column {
    match field {
        ProductSortField::Price => product::Column::Price,
        ProductSortField::Title => product::Column::Title,
        ProductSortField::StockQuantity => product::Column::StockQuantity,
        ProductSortField::DiscountPercentage => product::Column::DiscountPercentage,
        ProductSortField::CreatedAt => product::Column::CreatedAt,
    }
}

fn sql_order(order: SortOrder) -> SqlOrder {
    match order {
        SortOrder::Asc => SqlOrder::Asc,
        SortOrder::Desc => SqlOrder::Desc,
    }
}

fn into_details((product, brand): (product::Model, Option<brand::Model>)) -> ProductDetails {
    ProductDetails {
        product: product.into(),
        brand: brand.map(Into::into),
    }
}

#[async_trait]
impl ProductRepository for PostgresProductRepository {
    async fn find_details(&self, id: Uuid) -> Result<Option<ProductDetails>, RepoError> {
        let result = ProductEntity::find_by_id(id)
            .find_also_related(BrandEntity)
            .one(&self.db)
            .await
            .map_err(query_error)?;

        Ok(result.map(into_details))
    }

    async fn list(&self, query: &ProductQuery) -> Result<Page<ProductDetails>, RepoError> {
        let mut select = ProductEntity::find();
        if query.exclude_deleted {
            select = select.filter(product::Column::IsDeleted.eq(false));
        }
        if !query.brand_ids.is_empty() {
            select = select.filter(product::Column::BrandId.is_in(query.brand_ids.clone()));
        }

        let total = select.clone().count(&self.db).await.map_err(query_error)?;

        if let Some(sort) = query.sort {
            select = select.order_by(sort_column(sort.field), sql_order(sort.order));
        }
        // Stable ordering so pages never overlap
        select = select
            .order_by_asc(product::Column::CreatedAt)
            .order_by_asc(product::Column::Id);

        let mut select = select.find_also_related(BrandEntity);
        if let Some(page) = query.page {
            select = select.offset(page.offset()).limit(page.limit);
        }

        let rows = select.all(&self.db).await.map_err(query_error)?;

        Ok(Page {
            items: rows.into_iter().map(into_details).collect(),
            total,
        })
    }
}

#[async_trait]
impl AddressRepository for PostgresAddressRepository {
    async fn find_by_user_id(&self, user_id: Uuid) -> Result<Vec<Address>, RepoError> {
        let result = AddressEntity::find()
            .filter(address::Column::UserId.eq(user_id))
            .order_by_asc(address::Column::CreatedAt)
            .all(&self.db)
            .await
            .map_err(query_error)?;

        Ok(result.into_iter().map(Into::into).collect())
    }
}

#[async_trait]
impl CartRepository for PostgresCartRepository {
    async fn find_by_user_id(&self, user_id: Uuid) -> Result<Vec<CartLine>, RepoError> {
        let rows = CartItemEntity::find()
            .filter(cart_item::Column::UserId.eq(user_id))
            .order_by_asc(cart_item::Column::CreatedAt)
            .find_also_related(ProductEntity)
            .all(&self.db)
            .await
            .map_err(query_error)?;

        Ok(rows
            .into_iter()
            .map(|(item, product)| CartLine {
                item: item.into(),
                product: product.map(Into::into),
            })
            .collect())
    }

    async fn find_line(
        &self,
        user_id: Uuid,
        product_id: Uuid,
    ) -> Result<Option<CartItem>, RepoError> {
        let result = CartItemEntity::find()
            .filter(cart_item::Column::UserId.eq(user_id))
            .filter(cart_item::Column::ProductId.eq(product_id))
            .one(&self.db)
            .await
            .map_err(query_error)?;

        Ok(result.map(Into::into))
    }

    async fn delete_by_user_id(&self, user_id: Uuid) -> Result<u64, RepoError> {
        let result = CartItemEntity::delete_many()
            .filter(cart_item::Column::UserId.eq(user_id))
            .exec(&self.db)
            .await
            .map_err(write_error)?;

        Ok(result.rows_affected)
    }
}

/// Orders store JSON snapshots, so conversions can fail and the generic
/// base repository does not apply.
pub struct PostgresOrderRepository {
    db: DbConn,
}

impl PostgresOrderRepository {
    pub fn new(db: DbConn) -> Self {
        Self { db }
    }
}

fn into_orders(models: Vec<order::Model>) -> Result<Vec<Order>, RepoError> {
    models.into_iter().map(Order::try_from).collect()
}

#[async_trait]
impl BaseRepository<Order, Uuid> for PostgresOrderRepository {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Order>, RepoError> {
        OrderEntity::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(query_error)?
            .map(Order::try_from)
            .transpose()
    }

    async fn insert(&self, entity: Order) -> Result<Order, RepoError> {
        let active_model = order::ActiveModel::try_from(entity)?;
        let model = active_model.insert(&self.db).await.map_err(write_error)?;
        Order::try_from(model)
    }

    async fn update(&self, entity: Order) -> Result<Order, RepoError> {
        let active_model = order::ActiveModel::try_from(entity)?;
        let model = active_model.update(&self.db).await.map_err(write_error)?;
        Order::try_from(model)
    }

    async fn delete(&self, id: Uuid) -> Result<(), RepoError> {
        let result = OrderEntity::delete_by_id(id)
            .exec(&self.db)
            .await
            .map_err(write_error)?;

        if result.rows_affected == 0 {
            return Err(RepoError::NotFound);
        }
        Ok(())
    }
}

#[async_trait]
impl OrderRepository for PostgresOrderRepository {
    async fn find_by_user_id(&self, user_id: Uuid) -> Result<Vec<Order>, RepoError> {
        let models = OrderEntity::find()
            .filter(order::Column::UserId.eq(user_id))
            .order_by_desc(order::Column::CreatedAt)
            .all(&self.db)
            .await
            .map_err(query_error)?;

        into_orders(models)
    }

    async fn list(&self, page: Option<PageRequest>) -> Result<Page<Order>, RepoError> {
        let total = OrderEntity::find()
            .count(&self.db)
            .await
            .map_err(query_error)?;

        let mut select = OrderEntity::find()
            .order_by_desc(order::Column::CreatedAt)
            .order_by_desc(order::Column::Id);
        if let Some(page) = page {
            select = select.offset(page.offset()).limit(page.limit);
        }
        let models = select.all(&self.db).await.map_err(query_error)?;

        Ok(Page {
            items: into_orders(models)?,
            total,
        })
    }
}
