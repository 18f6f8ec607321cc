//! Domain entities - the core business objects.

mod address;
mod brand;
mod cart;
mod order;
mod product;
mod user;

pub mod pagination;
pub mod session;

pub use address::{Address, AddressFields};
pub use brand::Brand;
pub use cart::{CartItem, CartLine};
pub use order::{Order, OrderItem, OrderStatus};
pub use pagination::{Page, PageRequest, SortOrder};
pub use product::{
    NewProduct, Product, ProductChanges, ProductDetails, ProductQuery, ProductSort,
    ProductSortField,
};
pub use user::{User, UserChanges, is_plausible_email, mask_email, normalize_email};
