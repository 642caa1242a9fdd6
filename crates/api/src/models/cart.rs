//! Cart domain types.

use chrono::{DateTime, Utc};
use serde::Serialize;

use toko_core::{CartLineId, Money, ProductId, UserId};

use super::Product;

/// One (user, product) pairing staged for a future order.
///
/// `product_id` is a lookup key only; the product may have been deleted since
/// the line was written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CartLine {
    pub id: CartLineId,
    pub user_id: UserId,
    pub product_id: ProductId,
    pub quantity: u32,
    pub selected: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Product fields copied into a cart listing at read time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProductSnapshot {
    pub name: String,
    pub price: Money,
    pub image: String,
    pub stock: u32,
}

impl From<&Product> for ProductSnapshot {
    fn from(product: &Product) -> Self {
        Self {
            name: product.name.clone(),
            price: product.price,
            image: product.image.clone(),
            stock: product.stock,
        }
    }
}

/// A cart line joined with its product, as returned by `GET /api/cart`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CartLineView {
    pub id: CartLineId,
    pub product_id: ProductId,
    pub quantity: u32,
    pub selected: bool,
    pub product_info: ProductSnapshot,
}

impl CartLineView {
    /// Join a line with the product it references.
    #[must_use]
    pub fn new(line: &CartLine, product: &Product) -> Self {
        Self {
            id: line.id,
            product_id: line.product_id,
            quantity: line.quantity,
            selected: line.selected,
            product_info: ProductSnapshot::from(product),
        }
    }
}
