//! Domain error kinds shared by the shop services.

use thiserror::Error;

use crate::db::RepositoryError;

/// Errors returned by the catalog, cart, checkout and address services.
#[derive(Debug, Error)]
pub enum ShopError {
    /// Resource absent or not owned by the caller.
    #[error("{0} not found")]
    NotFound(String),

    /// Malformed id or missing/invalid field.
    #[error("{0}")]
    InvalidInput(String),

    /// Quantity below one.
    #[error("quantity must be at least 1")]
    InvalidQuantity,

    /// Requested quantity exceeds what the product has in stock.
    #[error("insufficient stock: {available} available")]
    InsufficientStock {
        /// Current stock of the product.
        available: u32,
    },

    /// Checkout without any items.
    #[error("order has no items")]
    EmptyOrder,

    /// Shipping address missing name, phone or full address.
    #[error("address is incomplete: name, phone and full_address are required")]
    IncompleteAddress,

    /// A unique value is already taken.
    #[error("{0}")]
    Conflict(String),

    /// The backing store failed.
    #[error("storage unavailable: {0}")]
    StorageUnavailable(#[from] RepositoryError),
}

impl ShopError {
    /// Shorthand for [`ShopError::NotFound`].
    pub fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound(what.into())
    }

    /// Shorthand for [`ShopError::InvalidInput`].
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidInput(message.into())
    }
}
