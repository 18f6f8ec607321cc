//! Application state - shared across all handlers.

use std::sync::Arc;

use shopfront_core::ports::{
    AddressRepository, BrandRepository, CartRepository, OrderRepository, PasswordService,
    ProductRepository, RateLimitError, RateLimiter, SessionError, SessionStore, TokenService,
    UserRepository,
};
use shopfront_infra::{
    Argon2PasswordService, InMemoryAddressRepository, InMemoryBrandRepository,
    InMemoryCartRepository, InMemoryOrderRepository, InMemoryProductRepository,
    InMemoryRateLimiter, InMemorySessionStore, InMemoryUserRepository, JwtTokenService,
};

#[cfg(feature = "postgres")]
use migration::{Migrator, MigratorTrait};
#[cfg(feature = "postgres")]
use shopfront_infra::DatabaseConnections;
#[cfg(feature = "postgres")]
use shopfront_infra::database::{
    PostgresAddressRepository, PostgresBrandRepository, PostgresCartRepository,
    PostgresOrderRepository, PostgresProductRepository, PostgresUserRepository,
};
#[cfg(feature = "redis")]
use shopfront_infra::{RedisRateLimitConfig, RedisRateLimiter, RedisSessionStore};

use crate::config::AppConfig;

/// Where login sessions are kept; reported by the health check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionBackend {
    Redis,
    Memory,
}

#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    #[error("rate limiter: {0}")]
    RateLimit(#[from] RateLimitError),

    #[error("session store: {0}")]
    Session(#[from] SessionError),

    #[error("database migration failed: {0}")]
    Migration(String),
}

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub users: Arc<dyn UserRepository>,
    pub brands: Arc<dyn BrandRepository>,
    pub products: Arc<dyn ProductRepository>,
    pub addresses: Arc<dyn AddressRepository>,
    pub cart: Arc<dyn CartRepository>,
    pub orders: Arc<dyn OrderRepository>,
    pub sessions: Arc<dyn SessionStore>,
    pub session_backend: SessionBackend,
    pub tokens: Arc<dyn TokenService>,
    pub passwords: Arc<dyn PasswordService>,
    pub auth_limiter: Arc<dyn RateLimiter>,
    #[cfg(feature = "postgres")]
    pub db: Option<Arc<DatabaseConnections>>,
    pub config: Arc<AppConfig>,
}

struct Repositories {
    users: Arc<dyn UserRepository>,
    brands: Arc<dyn BrandRepository>,
    products: Arc<dyn ProductRepository>,
    addresses: Arc<dyn AddressRepository>,
    cart: Arc<dyn CartRepository>,
    orders: Arc<dyn OrderRepository>,
}

impl Repositories {
    fn in_memory() -> Self {
        let brands = Arc::new(InMemoryBrandRepository::new());
        let products = Arc::new(InMemoryProductRepository::new(brands.clone()));
        let cart = Arc::new(InMemoryCartRepository::new(products.clone()));

        Self {
            users: Arc::new(InMemoryUserRepository::new()),
            brands,
            products,
            addresses: Arc::new(InMemoryAddressRepository::new()),
            cart,
            orders: Arc::new(InMemoryOrderRepository::new()),
        }
    }

    #[cfg(feature = "postgres")]
    fn postgres(db: &DatabaseConnections) -> Self {
        Self {
            users: Arc::new(PostgresUserRepository::new(db.main.clone())),
            brands: Arc::new(PostgresBrandRepository::new(db.main.clone())),
            products: Arc::new(PostgresProductRepository::new(db.main.clone())),
            addresses: Arc::new(PostgresAddressRepository::new(db.main.clone())),
            cart: Arc::new(PostgresCartRepository::new(db.main.clone())),
            orders: Arc::new(PostgresOrderRepository::new(db.main.clone())),
        }
    }
}

impl AppState {
    /// Build the application state, falling back to in-memory
    /// implementations for services that are not configured or unreachable.
    pub async fn new(config: AppConfig) -> Result<Self, StartupError> {
        let (sessions, session_backend) = Self::session_store(&config).await?;
        let auth_limiter = Self::auth_limiter(&config).await?;

        #[cfg(feature = "postgres")]
        let db = Self::connect_database(&config).await?;
        #[cfg(feature = "postgres")]
        let repos = match &db {
            Some(db) => Repositories::postgres(db),
            None => Repositories::in_memory(),
        };
        #[cfg(not(feature = "postgres"))]
        let repos = {
            tracing::info!("Running without postgres feature - using in-memory repositories");
            Repositories::in_memory()
        };

        tracing::info!("Application state initialized");

        #[allow(unused_mut)]
        let mut state = Self::assemble(config, repos, sessions, session_backend, auth_limiter);
        #[cfg(feature = "postgres")]
        {
            state.db = db.map(Arc::new);
        }
        Ok(state)
    }

    /// State backed entirely by in-memory stores.
    pub fn in_memory(config: AppConfig) -> Result<Self, StartupError> {
        let auth_limiter = Arc::new(InMemoryRateLimiter::new(config.auth_rate_limit.clone())?);

        Ok(Self::assemble(
            config,
            Repositories::in_memory(),
            Arc::new(InMemorySessionStore::new()),
            SessionBackend::Memory,
            auth_limiter,
        ))
    }

    fn assemble(
        config: AppConfig,
        repos: Repositories,
        sessions: Arc<dyn SessionStore>,
        session_backend: SessionBackend,
        auth_limiter: Arc<dyn RateLimiter>,
    ) -> Self {
        Self {
            users: repos.users,
            brands: repos.brands,
            products: repos.products,
            addresses: repos.addresses,
            cart: repos.cart,
            orders: repos.orders,
            sessions,
            session_backend,
            tokens: Arc::new(JwtTokenService::new(config.jwt.clone())),
            passwords: Arc::new(Argon2PasswordService::new()),
            auth_limiter,
            #[cfg(feature = "postgres")]
            db: None,
            config: Arc::new(config),
        }
    }

    #[cfg(feature = "redis")]
    async fn session_store(
        config: &AppConfig,
    ) -> Result<(Arc<dyn SessionStore>, SessionBackend), StartupError> {
        let Some(redis) = &config.redis else {
            tracing::warn!("REDIS_URL not set. Sessions are kept in memory.");
            return Ok((Arc::new(InMemorySessionStore::new()), SessionBackend::Memory));
        };

        match RedisSessionStore::connect(redis).await {
            Ok(store) => Ok((Arc::new(store), SessionBackend::Redis)),
            Err(e) if redis.fallback_to_memory => {
                tracing::error!(error = %e, "Redis unavailable. Falling back to in-memory sessions.");
                Ok((Arc::new(InMemorySessionStore::new()), SessionBackend::Memory))
            }
            Err(e) => Err(e.into()),
        }
    }

    #[cfg(not(feature = "redis"))]
    async fn session_store(
        _config: &AppConfig,
    ) -> Result<(Arc<dyn SessionStore>, SessionBackend), StartupError> {
        Ok((Arc::new(InMemorySessionStore::new()), SessionBackend::Memory))
    }

    #[cfg(feature = "redis")]
    async fn auth_limiter(config: &AppConfig) -> Result<Arc<dyn RateLimiter>, StartupError> {
        if let Some(redis) = &config.redis {
            let limiter_config = RedisRateLimitConfig {
                redis: redis.clone(),
                max_requests: config.auth_rate_limit.max_requests,
                window: config.auth_rate_limit.window,
                ..RedisRateLimitConfig::default()
            };
            match RedisRateLimiter::new(limiter_config).await {
                Ok(limiter) => return Ok(Arc::new(limiter)),
                Err(e) => {
                    tracing::warn!(error = %e, "Redis rate limiter unavailable, using in-memory limiter");
                }
            }
        }
        Ok(Arc::new(InMemoryRateLimiter::new(config.auth_rate_limit.clone())?))
    }

    #[cfg(not(feature = "redis"))]
    async fn auth_limiter(config: &AppConfig) -> Result<Arc<dyn RateLimiter>, StartupError> {
        Ok(Arc::new(InMemoryRateLimiter::new(config.auth_rate_limit.clone())?))
    }

    /// Connect and migrate. Connection failures fall back to memory;
    /// migration failures are fatal.
    #[cfg(feature = "postgres")]
    async fn connect_database(
        config: &AppConfig,
    ) -> Result<Option<DatabaseConnections>, StartupError> {
        let Some(db_config) = &config.database else {
            tracing::warn!("DATABASE_URL not set. Running without database (in-memory mode).");
            return Ok(None);
        };

        let db = match DatabaseConnections::init(db_config).await {
            Ok(db) => db,
            Err(e) => {
                tracing::error!(error = %e, "Failed to connect to database. Using in-memory fallback.");
                return Ok(None);
            }
        };

        Migrator::up(&db.main, None)
            .await
            .map_err(|e| StartupError::Migration(e.to_string()))?;
        tracing::info!("Database migrations applied");

        Ok(Some(db))
    }
}
