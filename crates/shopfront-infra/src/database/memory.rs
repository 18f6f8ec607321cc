//! In-memory repositories - used when no database is configured and in tests.
//!
//! Rows live in insertion order behind an async `RwLock`. Data is lost on
//! restart.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use shopfront_core::domain::{
    Address, Brand, CartItem, CartLine, Order, Page, PageRequest, Product, ProductDetails,
    ProductQuery, User,
};
use shopfront_core::error::RepoError;
use shopfront_core::ports::{
    AddressRepository, BaseRepository, BrandRepository, CartRepository, OrderRepository,
    ProductRepository, UserRepository,
};

/// A row the in-memory store can hold.
pub trait Record: Clone + Send + Sync + 'static {
    fn id(&self) -> Uuid;

    /// Whether two different rows would break a unique index.
    fn conflicts_with(&self, _other: &Self) -> bool {
        false
    }
}

impl Record for User {
    fn id(&self) -> Uuid {
        self.id
    }

    fn conflicts_with(&self, other: &Self) -> bool {
        self.email == other.email
    }
}

impl Record for Brand {
    fn id(&self) -> Uuid {
        self.id
    }

    fn conflicts_with(&self, other: &Self) -> bool {
        self.matches_name(&other.name)
    }
}

impl Record for Product {
    fn id(&self) -> Uuid {
        self.id
    }
}

impl Record for Address {
    fn id(&self) -> Uuid {
        self.id
    }
}

impl Record for CartItem {
    fn id(&self) -> Uuid {
        self.id
    }

    fn conflicts_with(&self, other: &Self) -> bool {
        self.user_id == other.user_id && self.product_id == other.product_id
    }
}

impl Record for Order {
    fn id(&self) -> Uuid {
        self.id
    }
}

/// Generic table of records keyed by id.
pub struct InMemoryStore<T> {
    rows: RwLock<Vec<T>>,
}

impl<T: Record> InMemoryStore<T> {
    pub fn new() -> Self {
        Self {
            rows: RwLock::new(Vec::new()),
        }
    }

    /// Every row matching `predicate`, in insertion order.
    pub async fn filter<F>(&self, predicate: F) -> Vec<T>
    where
        F: Fn(&T) -> bool,
    {
        let rows = self.rows.read().await;
        rows.iter().filter(|row| predicate(row)).cloned().collect()
    }

    pub async fn find<F>(&self, predicate: F) -> Option<T>
    where
        F: Fn(&T) -> bool,
    {
        let rows = self.rows.read().await;
        rows.iter().find(|row| predicate(row)).cloned()
    }

    /// Remove every row matching `predicate`, returning how many went.
    pub async fn remove_where<F>(&self, predicate: F) -> u64
    where
        F: Fn(&T) -> bool,
    {
        let mut rows = self.rows.write().await;
        let before = rows.len();
        rows.retain(|row| !predicate(row));
        (before - rows.len()) as u64
    }

    fn check_unique(rows: &[T], entity: &T) -> Result<(), RepoError> {
        let clash = rows
            .iter()
            .any(|row| row.id() != entity.id() && row.conflicts_with(entity));
        if clash {
            return Err(RepoError::Constraint("Entity already exists".to_string()));
        }
        Ok(())
    }
}

impl<T: Record> Default for InMemoryStore<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl<T: Record> BaseRepository<T, Uuid> for InMemoryStore<T> {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<T>, RepoError> {
        Ok(self.find(|row| row.id() == id).await)
    }

    async fn insert(&self, entity: T) -> Result<T, RepoError> {
        let mut rows = self.rows.write().await;
        if rows.iter().any(|row| row.id() == entity.id()) {
            return Err(RepoError::Constraint("Entity already exists".to_string()));
        }
        Self::check_unique(&rows, &entity)?;
        rows.push(entity.clone());
        Ok(entity)
    }

    async fn update(&self, entity: T) -> Result<T, RepoError> {
        let mut rows = self.rows.write().await;
        Self::check_unique(&rows, &entity)?;
        let slot = rows
            .iter_mut()
            .find(|row| row.id() == entity.id())
            .ok_or(RepoError::NotFound)?;
        *slot = entity.clone();
        Ok(entity)
    }

    async fn delete(&self, id: Uuid) -> Result<(), RepoError> {
        match self.remove_where(|row| row.id() == id).await {
            0 => Err(RepoError::NotFound),
            _ => Ok(()),
        }
    }
}

pub type InMemoryUserRepository = InMemoryStore<User>;
pub type InMemoryBrandRepository = InMemoryStore<Brand>;
pub type InMemoryAddressRepository = InMemoryStore<Address>;
pub type InMemoryOrderRepository = InMemoryStore<Order>;

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, RepoError> {
        Ok(self.find(|user| user.email == email).await)
    }

    async fn any_admin(&self) -> Result<bool, RepoError> {
        Ok(self.find(|user| user.is_admin).await.is_some())
    }
}

#[async_trait]
impl BrandRepository for InMemoryBrandRepository {
    async fn find_by_name(&self, name: &str) -> Result<Option<Brand>, RepoError> {
        Ok(self.find(|brand| brand.matches_name(name)).await)
    }

    async fn list_all(&self) -> Result<Vec<Brand>, RepoError> {
        let mut brands = self.filter(|_| true).await;
        brands.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(brands)
    }
}

#[async_trait]
impl AddressRepository for InMemoryAddressRepository {
    async fn find_by_user_id(&self, user_id: Uuid) -> Result<Vec<Address>, RepoError> {
        Ok(self.filter(|address| address.user_id == user_id).await)
    }
}

#[async_trait]
impl OrderRepository for InMemoryOrderRepository {
    async fn find_by_user_id(&self, user_id: Uuid) -> Result<Vec<Order>, RepoError> {
        let mut orders = self.filter(|order| order.user_id == user_id).await;
        orders.reverse();
        Ok(orders)
    }

    async fn list(&self, page: Option<PageRequest>) -> Result<Page<Order>, RepoError> {
        let mut orders = self.filter(|_| true).await;
        orders.reverse();
        let total = orders.len() as u64;
        let items = match page {
            Some(page) => page.slice(&orders),
            None => orders,
        };
        Ok(Page { items, total })
    }
}

/// Products, populated with their brand on read.
pub struct InMemoryProductRepository {
    store: InMemoryStore<Product>,
    brands: Arc<InMemoryBrandRepository>,
}

impl InMemoryProductRepository {
    pub fn new(brands: Arc<InMemoryBrandRepository>) -> Self {
        Self {
            store: InMemoryStore::new(),
            brands,
        }
    }

    async fn populate(&self, product: Product) -> Result<ProductDetails, RepoError> {
        let brand = self.brands.find_by_id(product.brand_id).await?;
        Ok(ProductDetails { product, brand })
    }
}

#[async_trait]
impl BaseRepository<Product, Uuid> for InMemoryProductRepository {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Product>, RepoError> {
        self.store.find_by_id(id).await
    }

    async fn insert(&self, entity: Product) -> Result<Product, RepoError> {
        self.store.insert(entity).await
    }

    async fn update(&self, entity: Product) -> Result<Product, RepoError> {
        self.store.update(entity).await
    }

    async fn delete(&self, id: Uuid) -> Result<(), RepoError> {
        self.store.delete(id).await
    }
}

#[async_trait]
impl ProductRepository for InMemoryProductRepository {
    async fn find_details(&self, id: Uuid) -> Result<Option<ProductDetails>, RepoError> {
        match self.store.find_by_id(id).await? {
            Some(product) => Ok(Some(self.populate(product).await?)),
            None => Ok(None),
        }
    }

    async fn list(&self, query: &ProductQuery) -> Result<Page<ProductDetails>, RepoError> {
        let mut products = self.store.filter(|product| query.matches(product)).await;
        if let Some(sort) = query.sort {
            // Stable sort keeps insertion order among equal keys
            products.sort_by(|a, b| sort.compare(a, b));
        }

        let total = products.len() as u64;
        let products = match query.page {
            Some(page) => page.slice(&products),
            None => products,
        };

        let mut items = Vec::with_capacity(products.len());
        for product in products {
            items.push(self.populate(product).await?);
        }
        Ok(Page { items, total })
    }
}

/// Cart lines, populated with their product on read.
pub struct InMemoryCartRepository {
    store: InMemoryStore<CartItem>,
    products: Arc<InMemoryProductRepository>,
}

impl InMemoryCartRepository {
    pub fn new(products: Arc<InMemoryProductRepository>) -> Self {
        Self {
            store: InMemoryStore::new(),
            products,
        }
    }
}

#[async_trait]
impl BaseRepository<CartItem, Uuid> for InMemoryCartRepository {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<CartItem>, RepoError> {
        self.store.find_by_id(id).await
    }

    async fn insert(&self, entity: CartItem) -> Result<CartItem, RepoError> {
        self.store.insert(entity).await
    }

    async fn update(&self, entity: CartItem) -> Result<CartItem, RepoError> {
        self.store.update(entity).await
    }

    async fn delete(&self, id: Uuid) -> Result<(), RepoError> {
        self.store.delete(id).await
    }
}

#[async_trait]
impl CartRepository for InMemoryCartRepository {
    async fn find_by_user_id(&self, user_id: Uuid) -> Result<Vec<CartLine>, RepoError> {
        let items = self.store.filter(|item| item.user_id == user_id).await;

        let mut lines = Vec::with_capacity(items.len());
        for item in items {
            let product = self.products.find_by_id(item.product_id).await?;
            lines.push(CartLine { item, product });
        }
        Ok(lines)
    }

    async fn find_line(
        &self,
        user_id: Uuid,
        product_id: Uuid,
    ) -> Result<Option<CartItem>, RepoError> {
        Ok(self
            .store
            .find(|item| item.user_id == user_id && item.product_id == product_id)
            .await)
    }

    async fn delete_by_user_id(&self, user_id: Uuid) -> Result<u64, RepoError> {
        Ok(self.store.remove_where(|item| item.user_id == user_id).await)
    }
}
