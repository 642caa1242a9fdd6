//! Cart reconciliation against product stock.
//!
//! Every mutation runs under the caller's [`UserLocks`] entry, so the
//! stock check and the write it guards see the same cart state. Stock itself
//! is only read here, never decremented.

use std::collections::HashMap;

use toko_core::{CartLineId, ProductId, UserId};

use super::{ShopError, UserLocks};
use crate::db::{CartStore, CatalogStore};
use crate::models::{CartLine, CartLineView};

/// Cart operations for a single request.
pub struct CartService<'a> {
    catalog: &'a dyn CatalogStore,
    carts: &'a dyn CartStore,
    locks: &'a UserLocks,
}

impl<'a> CartService<'a> {
    #[must_use]
    pub const fn new(
        catalog: &'a dyn CatalogStore,
        carts: &'a dyn CartStore,
        locks: &'a UserLocks,
    ) -> Self {
        Self {
            catalog,
            carts,
            locks,
        }
    }

    /// Every line of the user joined with current product data.
    ///
    /// Lines whose product has been deleted are left out.
    ///
    /// # Errors
    ///
    /// Returns `ShopError::StorageUnavailable` if the store fails.
    #[tracing::instrument(skip(self))]
    pub async fn list_cart(&self, user_id: UserId) -> Result<Vec<CartLineView>, ShopError> {
        let lines = self.carts.list_lines(user_id).await?;
        let ids: Vec<ProductId> = lines.iter().map(|l| l.product_id).collect();
        let products: HashMap<_, _> = self
            .catalog
            .get_products(&ids)
            .await?
            .into_iter()
            .map(|p| (p.id, p))
            .collect();

        let views: Vec<CartLineView> = lines
            .iter()
            .filter_map(|line| {
                products
                    .get(&line.product_id)
                    .map(|product| CartLineView::new(line, product))
            })
            .collect();

        if views.len() < lines.len() {
            tracing::debug!(
                dangling = lines.len() - views.len(),
                "Skipped cart lines for deleted products"
            );
        }
        Ok(views)
    }

    /// Add `quantity` of a product, accumulating onto an existing line.
    ///
    /// # Errors
    ///
    /// Returns `ShopError::InvalidQuantity` if `quantity < 1`,
    /// `ShopError::NotFound` if the product does not exist, and
    /// `ShopError::InsufficientStock` if the resulting quantity exceeds stock.
    /// A failed add leaves the stored line untouched.
    #[tracing::instrument(skip(self))]
    pub async fn add_to_cart(
        &self,
        user_id: UserId,
        product_id: ProductId,
        quantity: i64,
    ) -> Result<CartLine, ShopError> {
        let quantity = parse_quantity(quantity)?;
        let _guard = self.locks.lock(user_id).await;

        let product = self
            .catalog
            .get_product(product_id)
            .await?
            .ok_or_else(|| ShopError::not_found("product"))?;

        let existing = self.carts.find_line(user_id, product_id).await?;
        let candidate = existing
            .as_ref()
            .map_or(quantity, |line| line.quantity.saturating_add(quantity));

        if candidate > product.stock {
            return Err(ShopError::InsufficientStock {
                available: product.stock,
            });
        }

        let line = match existing {
            Some(line) => self
                .carts
                .update_line(user_id, line.id, Some(candidate), None)
                .await?
                .ok_or_else(|| ShopError::not_found("cart item"))?,
            None => self.carts.insert_line(user_id, product_id, candidate).await?,
        };

        tracing::info!(line_id = %line.id, quantity = line.quantity, "Cart line saved");
        Ok(line)
    }

    /// Change a line's quantity and/or selection.
    ///
    /// # Errors
    ///
    /// Returns `ShopError::NotFound` if the line is absent or owned by someone
    /// else, `ShopError::InvalidQuantity` if `quantity < 1`, and
    /// `ShopError::InsufficientStock` if `quantity` exceeds the product's
    /// current stock.
    #[tracing::instrument(skip(self))]
    pub async fn update_line(
        &self,
        user_id: UserId,
        line_id: CartLineId,
        quantity: Option<i64>,
        selected: Option<bool>,
    ) -> Result<CartLine, ShopError> {
        let quantity = quantity.map(parse_quantity).transpose()?;
        let _guard = self.locks.lock(user_id).await;

        let line = self
            .carts
            .get_line(user_id, line_id)
            .await?
            .ok_or_else(|| ShopError::not_found("cart item"))?;

        if let Some(quantity) = quantity {
            // A line whose product was deleted has no stock to check against.
            if let Some(product) = self.catalog.get_product(line.product_id).await?
                && quantity > product.stock
            {
                return Err(ShopError::InsufficientStock {
                    available: product.stock,
                });
            }
        }

        self.carts
            .update_line(user_id, line_id, quantity, selected)
            .await?
            .ok_or_else(|| ShopError::not_found("cart item"))
    }

    /// Remove a line.
    ///
    /// # Errors
    ///
    /// Returns `ShopError::NotFound` if the line is absent or not owned.
    #[tracing::instrument(skip(self))]
    pub async fn remove_line(&self, user_id: UserId, line_id: CartLineId) -> Result<(), ShopError> {
        let _guard = self.locks.lock(user_id).await;
        if !self.carts.delete_line(user_id, line_id).await? {
            return Err(ShopError::not_found("cart item"));
        }
        Ok(())
    }
}

/// Validate a client quantity. Values beyond `u32` saturate and then fail the
/// stock check.
fn parse_quantity(quantity: i64) -> Result<u32, ShopError> {
    if quantity < 1 {
        return Err(ShopError::InvalidQuantity);
    }
    Ok(u32::try_from(quantity).unwrap_or(u32::MAX))
}
