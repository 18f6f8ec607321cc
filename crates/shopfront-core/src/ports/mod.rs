//! Ports - trait definitions for external dependencies.
//! These are the "interfaces" that infrastructure must implement.

mod auth;
mod rate_limit;
mod repository;
mod session;

pub use auth::{AccessClaims, AuthError, PasswordService, RefreshClaims, TokenService};
pub use rate_limit::{RateLimitError, RateLimitResult, RateLimiter};
pub use repository::{
    AddressRepository, BaseRepository, BrandRepository, CartRepository, OrderRepository,
    ProductRepository, UserRepository,
};
pub use session::{SessionError, SessionStore, enforce_session_cap};
