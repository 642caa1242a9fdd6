//! Business logic services.
//!
//! # Services
//!
//! - `auth` - Account registration and password login
//! - `catalog` - Products and taxonomy master data
//! - `cart` - Cart lines reconciled against product stock
//! - `checkout` - Orders placed from a client basket
//! - `addresses` - Shipping address book with one primary per user
//!
//! Services borrow the stores they need for the duration of one request and
//! never authenticate: callers pass an already-verified `UserId`.

pub mod addresses;
pub mod auth;
pub mod cart;
pub mod catalog;
pub mod checkout;
mod error;
mod locks;

use std::str::FromStr;

use serde::Deserialize;

pub use addresses::{AddressBook, AddressForm};
pub use auth::{AuthError, AuthService};
pub use cart::CartService;
pub use catalog::{CatalogService, ProductForm};
pub use checkout::{CheckoutRequest, CheckoutService};
pub use error::ShopError;
pub use locks::UserLocks;

/// An id field from a JSON body, accepted as a number or a string.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum RawId {
    Number(i64),
    Text(String),
}

impl RawId {
    /// Parse into a typed id; `None` if malformed or out of range.
    #[must_use]
    pub fn parse<T: FromStr>(&self) -> Option<T> {
        match self {
            Self::Number(n) => n.to_string().parse().ok(),
            Self::Text(s) => s.parse().ok(),
        }
    }
}
