use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::{
    Address, Brand, CartItem, CartLine, Order, Page, PageRequest, Product, ProductDetails,
    ProductQuery, User,
};
use crate::error::RepoError;

/// Generic repository trait defining standard CRUD operations.
#[async_trait]
pub trait BaseRepository<T, ID>: Send + Sync {
    /// Find an entity by its unique ID.
    async fn find_by_id(&self, id: ID) -> Result<Option<T>, RepoError>;

    /// Insert a new entity.
    async fn insert(&self, entity: T) -> Result<T, RepoError>;

    /// Overwrite an existing entity. `RepoError::NotFound` if it is gone.
    async fn update(&self, entity: T) -> Result<T, RepoError>;

    /// Delete an entity by its ID. `RepoError::NotFound` if nothing was deleted.
    async fn delete(&self, id: ID) -> Result<(), RepoError>;
}

/// User repository with domain-specific methods.
#[async_trait]
pub trait UserRepository: BaseRepository<User, Uuid> {
    /// Find a user by their (normalized) email address.
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, RepoError>;

    /// Whether at least one administrator exists.
    async fn any_admin(&self) -> Result<bool, RepoError>;
}

#[async_trait]
pub trait BrandRepository: BaseRepository<Brand, Uuid> {
    /// Case-insensitive lookup on the trimmed name.
    async fn find_by_name(&self, name: &str) -> Result<Option<Brand>, RepoError>;

    /// Every brand, ordered by name.
    async fn list_all(&self) -> Result<Vec<Brand>, RepoError>;
}

#[async_trait]
pub trait ProductRepository: BaseRepository<Product, Uuid> {
    /// A product with its brand populated.
    async fn find_details(&self, id: Uuid) -> Result<Option<ProductDetails>, RepoError>;

    /// Filtered, sorted and paginated listing. `total` ignores pagination.
    async fn list(&self, query: &ProductQuery) -> Result<Page<ProductDetails>, RepoError>;
}

#[async_trait]
pub trait AddressRepository: BaseRepository<Address, Uuid> {
    async fn find_by_user_id(&self, user_id: Uuid) -> Result<Vec<Address>, RepoError>;
}

#[async_trait]
pub trait CartRepository: BaseRepository<CartItem, Uuid> {
    /// The user's cart lines with products populated, oldest first.
    async fn find_by_user_id(&self, user_id: Uuid) -> Result<Vec<CartLine>, RepoError>;

    async fn find_line(
        &self,
        user_id: Uuid,
        product_id: Uuid,
    ) -> Result<Option<CartItem>, RepoError>;

    /// Empty the user's cart, returning how many lines were removed.
    async fn delete_by_user_id(&self, user_id: Uuid) -> Result<u64, RepoError>;
}

#[async_trait]
pub trait OrderRepository: BaseRepository<Order, Uuid> {
    /// A user's orders, newest first.
    async fn find_by_user_id(&self, user_id: Uuid) -> Result<Vec<Order>, RepoError>;

    /// All orders, newest first, optionally paginated.
    async fn list(&self, page: Option<PageRequest>) -> Result<Page<Order>, RepoError>;
}
