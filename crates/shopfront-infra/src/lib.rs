//! # Shopfront Infrastructure
//!
//! Concrete implementations of the ports defined in `shopfront-core`.
//! This crate contains database, session store, and security integrations.
//!
//! ## Feature Flags
//!
//! - `full` (default) - All features enabled
//! - `minimal` - No external dependencies, in-memory only
//! - `postgres` - PostgreSQL repositories via SeaORM
//! - `auth` - JWT + Argon2 authentication
//! - `rate-limit` - Rate limiting via governor
//! - `redis` - Redis-backed session store and rate limiter

pub mod database;
pub mod session;

#[cfg(feature = "auth")]
pub mod auth;

#[cfg(feature = "rate-limit")]
pub mod rate_limit;

// Re-exports - In-Memory
pub use database::memory::{
    InMemoryAddressRepository, InMemoryBrandRepository, InMemoryCartRepository,
    InMemoryOrderRepository, InMemoryProductRepository, InMemoryUserRepository,
};
pub use session::InMemorySessionStore;

#[cfg(feature = "postgres")]
pub use database::{DatabaseConfig, DatabaseConnections};

#[cfg(feature = "auth")]
pub use auth::{Argon2PasswordService, JwtConfig, JwtTokenService};

#[cfg(feature = "rate-limit")]
pub use rate_limit::{InMemoryRateLimiter, RateLimitConfig};

// Re-exports - Redis
#[cfg(feature = "redis")]
pub use session::{RedisConfig, RedisSessionStore};
#[cfg(all(feature = "redis", feature = "rate-limit"))]
pub use rate_limit::{RedisRateLimitConfig, RedisRateLimiter};
