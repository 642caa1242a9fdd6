//! Domain models for the shop.
//!
//! These types represent validated domain objects separate from database row
//! types (see `crate::db`) and from request bodies (see `crate::routes`).

pub mod address;
pub mod cart;
pub mod order;
pub mod product;
pub mod session;
pub mod user;

pub use address::{Address, AddressPatch, NewAddress};
pub use cart::{CartLine, CartLineView, ProductSnapshot};
pub use order::{NewOrder, Order, OrderItem, OrderSummary, ShippingAddress};
pub use product::{NewProduct, Product, ProductPatch, ProductView, TaxonomyEntry, TaxonomyKind};
pub use session::{CurrentUser, keys as session_keys};
pub use user::User;
