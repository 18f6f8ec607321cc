//! Repositories: PostgreSQL via SeaORM, plus in-memory fallbacks.

pub mod memory;

#[cfg(feature = "postgres")]
mod connections;
#[cfg(feature = "postgres")]
pub mod entity;
#[cfg(feature = "postgres")]
mod postgres_base;
#[cfg(feature = "postgres")]
pub mod postgres_repo;

#[cfg(feature = "postgres")]
pub use connections::{DatabaseConfig, DatabaseConnections};

#[cfg(feature = "postgres")]
pub use postgres_repo::{
    PostgresAddressRepository, PostgresBrandRepository, PostgresCartRepository,
    PostgresOrderRepository, PostgresProductRepository, PostgresUserRepository,
};
