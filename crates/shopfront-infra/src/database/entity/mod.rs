//! SeaORM entities, one module per table.

pub mod address;
pub mod brand;
pub mod cart_item;
pub mod order;
pub mod product;
pub mod user;
