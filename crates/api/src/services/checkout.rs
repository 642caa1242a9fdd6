//! Checkout: turn a client basket into an immutable order.
//!
//! Item names, prices and images are copied from the catalog, the subtotal and
//! grand total are recomputed, and payment is treated as settled on the spot.
//! After the order is stored, the user's selected cart lines are purged. The
//! two writes are not atomic: a failed purge is logged and the order stands.

use std::collections::HashMap;

use serde::Deserialize;

use toko_core::{Money, MoneyError, OrderId, OrderStatus, PaymentStatus, ProductId, UserId};

use super::{RawId, ShopError, UserLocks};
use crate::db::{CartStore, CatalogStore, OrderStore};
use crate::models::order::DEFAULT_SHIPPING_METHOD;
use crate::models::{NewOrder, Order, OrderItem, OrderSummary, ShippingAddress};

/// One basket line as sent by the client.
///
/// Only `product_id` and `quantity` are trusted; the rest is refreshed from
/// the catalog.
#[derive(Debug, Clone, Deserialize)]
pub struct CheckoutItem {
    pub product_id: RawId,
    pub quantity: i64,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub price: Option<i64>,
    #[serde(default)]
    pub image: Option<String>,
}

/// Recipient details as sent by the client.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ShippingAddressInput {
    pub name: Option<String>,
    pub phone: Option<String>,
    pub full_address: Option<String>,
}

impl ShippingAddressInput {
    /// The trimmed address, if every field is present and non-empty.
    fn complete(&self) -> Option<ShippingAddress> {
        let field = |v: &Option<String>| {
            v.as_deref()
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(ToOwned::to_owned)
        };
        Some(ShippingAddress {
            name: field(&self.name)?,
            phone: field(&self.phone)?,
            full_address: field(&self.full_address)?,
        })
    }
}

/// Order figures as sent by the client.
///
/// `subtotal` and `grand_total` are accepted but recomputed.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
#[serde(default)]
pub struct SummaryInput {
    pub subtotal: i64,
    pub shipping_cost: i64,
    pub service_fee: i64,
    pub discount: i64,
    pub grand_total: i64,
}

/// Body of `POST /api/orders`.
///
/// Client-supplied `payment_status` and `order_status` are ignored.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CheckoutRequest {
    #[serde(default)]
    pub items: Vec<CheckoutItem>,
    #[serde(default)]
    pub shipping_address: Option<ShippingAddressInput>,
    #[serde(default)]
    pub shipping_method: Option<String>,
    #[serde(default)]
    pub payment_method: Option<String>,
    #[serde(default)]
    pub summary: SummaryInput,
}

/// Checkout and order history.
pub struct CheckoutService<'a> {
    catalog: &'a dyn CatalogStore,
    carts: &'a dyn CartStore,
    orders: &'a dyn OrderStore,
    locks: &'a UserLocks,
}

impl<'a> CheckoutService<'a> {
    #[must_use]
    pub const fn new(
        catalog: &'a dyn CatalogStore,
        carts: &'a dyn CartStore,
        orders: &'a dyn OrderStore,
        locks: &'a UserLocks,
    ) -> Self {
        Self {
            catalog,
            carts,
            orders,
            locks,
        }
    }

    /// Place an order and purge the user's selected cart lines.
    ///
    /// # Errors
    ///
    /// Returns `ShopError::EmptyOrder` without items,
    /// `ShopError::IncompleteAddress` when the shipping address lacks a field,
    /// `ShopError::InvalidQuantity` for a quantity below one, and
    /// `ShopError::InvalidInput` for a missing payment method, unknown product
    /// or negative summary figure. No order is written on any of these.
    #[tracing::instrument(skip(self, request), fields(items = request.items.len()))]
    pub async fn checkout(
        &self,
        user_id: UserId,
        request: CheckoutRequest,
    ) -> Result<Order, ShopError> {
        if request.items.is_empty() {
            return Err(ShopError::EmptyOrder);
        }
        let shipping_address = request
            .shipping_address
            .as_ref()
            .and_then(ShippingAddressInput::complete)
            .ok_or(ShopError::IncompleteAddress)?;
        let payment_method = non_empty(request.payment_method)
            .ok_or_else(|| ShopError::invalid("payment_method is required"))?;
        let shipping_method = non_empty(request.shipping_method)
            .unwrap_or_else(|| DEFAULT_SHIPPING_METHOD.to_owned());

        let items = self.snapshot_items(&request.items).await?;
        let summary = compute_summary(&items, request.summary)?;

        let new_order = NewOrder {
            user_id,
            items,
            shipping_address,
            shipping_method,
            payment_method,
            payment_status: PaymentStatus::Paid,
            order_status: OrderStatus::Processing,
            summary,
        };

        let _guard = self.locks.lock(user_id).await;
        let order = self.orders.insert(&new_order).await?;
        tracing::info!(
            order_id = %order.id,
            grand_total = %order.summary.grand_total,
            "Order placed"
        );

        match self.carts.delete_selected(user_id).await {
            Ok(purged) => tracing::debug!(purged, "Purged selected cart lines"),
            Err(e) => tracing::warn!(
                order_id = %order.id,
                error = %e,
                "Order placed but selected cart lines were not purged"
            ),
        }

        Ok(order)
    }

    /// The user's orders, newest first.
    ///
    /// # Errors
    ///
    /// Returns `ShopError::StorageUnavailable` if the store fails.
    pub async fn list_orders(&self, user_id: UserId) -> Result<Vec<Order>, ShopError> {
        Ok(self.orders.list_for_user(user_id).await?)
    }

    /// One of the user's orders by its path id.
    ///
    /// # Errors
    ///
    /// Returns `ShopError::NotFound` for a malformed, unknown or foreign id.
    pub async fn get_order(&self, user_id: UserId, raw_id: &str) -> Result<Order, ShopError> {
        let id: OrderId = raw_id.parse().map_err(|_| ShopError::not_found("order"))?;
        self.orders
            .get(user_id, id)
            .await?
            .ok_or_else(|| ShopError::not_found("order"))
    }

    async fn snapshot_items(&self, items: &[CheckoutItem]) -> Result<Vec<OrderItem>, ShopError> {
        let mut wanted = Vec::with_capacity(items.len());
        for item in items {
            if item.quantity < 1 {
                return Err(ShopError::InvalidQuantity);
            }
            let quantity = u32::try_from(item.quantity)
                .map_err(|_| ShopError::invalid("quantity is too large"))?;
            let product_id: ProductId = item
                .product_id
                .parse()
                .ok_or_else(|| ShopError::invalid("invalid product id"))?;
            wanted.push((product_id, quantity));
        }

        let ids: Vec<ProductId> = wanted.iter().map(|(id, _)| *id).collect();
        let products: HashMap<_, _> = self
            .catalog
            .get_products(&ids)
            .await?
            .into_iter()
            .map(|p| (p.id, p))
            .collect();

        wanted
            .into_iter()
            .map(|(product_id, quantity)| {
                let product = products
                    .get(&product_id)
                    .ok_or_else(|| ShopError::invalid(format!("unknown product: {product_id}")))?;
                Ok(OrderItem {
                    product_id,
                    name: product.name.clone(),
                    price: product.price,
                    quantity,
                    image: product.image.clone(),
                })
            })
            .collect()
    }
}

/// Recompute subtotal and grand total; keep the client's fees and discount.
fn compute_summary(items: &[OrderItem], input: SummaryInput) -> Result<OrderSummary, ShopError> {
    let figure = |value: i64, name: &str| {
        Money::new(value).map_err(|_| ShopError::invalid(format!("{name} cannot be negative")))
    };
    let overflow = |_: MoneyError| ShopError::invalid("order total is too large");

    let shipping_cost = figure(input.shipping_cost, "shipping_cost")?;
    let service_fee = figure(input.service_fee, "service_fee")?;
    let discount = figure(input.discount, "discount")?;

    let mut subtotal = Money::ZERO;
    for item in items {
        subtotal = subtotal
            .checked_add(item.price.times(item.quantity).map_err(overflow)?)
            .map_err(overflow)?;
    }

    let grand_total = subtotal
        .checked_add(shipping_cost)
        .and_then(|t| t.checked_add(service_fee))
        .map_err(overflow)?
        .saturating_sub(discount);

    Ok(OrderSummary {
        subtotal,
        shipping_cost,
        service_fee,
        discount,
        grand_total,
    })
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_owned())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use async_trait::async_trait;

    use super::*;
    use crate::db::{MemoryStore, RepositoryError};
    use crate::models::{CartLine, NewProduct};
    use toko_core::CartLineId;

    const USER: UserId = UserId::new(1);

    async fn product(store: &MemoryStore, name: &str, price: i64) -> ProductId {
        store
            .create_product(&NewProduct {
                sku: None,
                name: name.to_owned(),
                description: String::new(),
                price: Money::new(price).unwrap(),
                stock: 10,
                buyable: true,
                category_id: None,
                type_id: None,
                material_id: None,
                seller_id: "01".to_owned(),
                seller_name: "Admin".to_owned(),
                image: format!("{name}.jpg"),
            })
            .await
            .unwrap()
            .id
    }

    fn item(product_id: ProductId, quantity: i64) -> CheckoutItem {
        CheckoutItem {
            product_id: RawId::Number(i64::from(product_id.as_i32())),
            quantity,
            name: None,
            price: None,
            image: None,
        }
    }

    fn address() -> ShippingAddressInput {
        ShippingAddressInput {
            name: Some("Hanifa".to_owned()),
            phone: Some("+62 873".to_owned()),
            full_address: Some("Jl. Mentari No. 7a".to_owned()),
        }
    }

    fn request(items: Vec<CheckoutItem>) -> CheckoutRequest {
        CheckoutRequest {
            items,
            shipping_address: Some(address()),
            shipping_method: None,
            payment_method: Some("E-Wallet".to_owned()),
            summary: SummaryInput::default(),
        }
    }

    #[tokio::test]
    async fn test_empty_order_creates_nothing() {
        let store = MemoryStore::new();
        let locks = UserLocks::new();
        let checkout = CheckoutService::new(&store, &store, &store, &locks);

        assert!(matches!(
            checkout.checkout(USER, request(vec![])).await,
            Err(ShopError::EmptyOrder)
        ));
        assert!(store.list_for_user(USER).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_incomplete_address_rejected() {
        let store = MemoryStore::new();
        let locks = UserLocks::new();
        let checkout = CheckoutService::new(&store, &store, &store, &locks);
        let mouse = product(&store, "mouse", 100).await;

        let mut missing_phone = request(vec![item(mouse, 1)]);
        missing_phone.shipping_address = Some(ShippingAddressInput {
            phone: Some("   ".to_owned()),
            ..address()
        });
        let mut no_address = request(vec![item(mouse, 1)]);
        no_address.shipping_address = None;

        for req in [missing_phone, no_address] {
            assert!(matches!(
                checkout.checkout(USER, req).await,
                Err(ShopError::IncompleteAddress)
            ));
        }
        assert!(store.list_for_user(USER).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_checkout_forces_paid_processing_and_purges_selected() {
        let store = MemoryStore::new();
        let locks = UserLocks::new();
        let checkout = CheckoutService::new(&store, &store, &store, &locks);
        let mouse = product(&store, "mouse", 250_000).await;
        let keyboard = product(&store, "keyboard", 850_000).await;

        store.insert_line(USER, mouse, 1).await.unwrap();
        let kept = store.insert_line(USER, keyboard, 1).await.unwrap();
        store
            .update_line(USER, kept.id, None, Some(false))
            .await
            .unwrap();
        let other_user = store.insert_line(UserId::new(2), mouse, 1).await.unwrap();

        let order = checkout
            .checkout(USER, request(vec![item(mouse, 1)]))
            .await
            .unwrap();
        assert_eq!(order.payment_status, PaymentStatus::Paid);
        assert_eq!(order.order_status, OrderStatus::Processing);
        assert_eq!(order.shipping_method, "Reguler");

        let remaining = store.list_lines(USER).await.unwrap();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].id, kept.id);
        assert!(
            store
                .get_line(UserId::new(2), other_user.id)
                .await
                .unwrap()
                .is_some()
        );
    }

    #[tokio::test]
    async fn test_items_snapshot_from_catalog() {
        let store = MemoryStore::new();
        let locks = UserLocks::new();
        let checkout = CheckoutService::new(&store, &store, &store, &locks);
        let mouse = product(&store, "mouse", 250_000).await;

        let mut forged = item(mouse, 2);
        forged.name = Some("Gratis".to_owned());
        forged.price = Some(1);
        let order = checkout
            .checkout(USER, request(vec![forged]))
            .await
            .unwrap();

        assert_eq!(order.items.len(), 1);
        assert_eq!(order.items[0].name, "mouse");
        assert_eq!(order.items[0].price.as_i64(), 250_000);
        assert_eq!(order.items[0].image, "mouse.jpg");

        // Later catalog edits do not reach the stored order.
        store
            .update_product(
                mouse,
                &crate::models::ProductPatch {
                    name: Some("Mouse Baru".to_owned()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        let stored = checkout
            .get_order(USER, &order.id.to_string())
            .await
            .unwrap();
        assert_eq!(stored.items[0].name, "mouse");
    }

    #[tokio::test]
    async fn test_summary_recomputed() {
        let store = MemoryStore::new();
        let locks = UserLocks::new();
        let checkout = CheckoutService::new(&store, &store, &store, &locks);
        let mouse = product(&store, "mouse", 250_000).await;
        let keyboard = product(&store, "keyboard", 850_000).await;

        let mut req = request(vec![item(mouse, 2), item(keyboard, 1)]);
        req.summary = SummaryInput {
            subtotal: 1,
            shipping_cost: 20_000,
            service_fee: 1_000,
            discount: 50_000,
            grand_total: 1,
        };
        let order = checkout.checkout(USER, req).await.unwrap();

        assert_eq!(order.summary.subtotal.as_i64(), 1_350_000);
        assert_eq!(order.summary.shipping_cost.as_i64(), 20_000);
        assert_eq!(order.summary.grand_total.as_i64(), 1_321_000);
    }

    #[test]
    fn test_discount_larger_than_total_clamps_to_zero() {
        let items = vec![OrderItem {
            product_id: ProductId::new(1),
            name: "x".to_owned(),
            price: Money::new(100).unwrap(),
            quantity: 1,
            image: String::new(),
        }];
        let summary = compute_summary(
            &items,
            SummaryInput {
                discount: 1_000,
                ..SummaryInput::default()
            },
        )
        .unwrap();
        assert_eq!(summary.grand_total, Money::ZERO);
    }

    #[tokio::test]
    async fn test_unknown_product_and_bad_quantity_rejected() {
        let store = MemoryStore::new();
        let locks = UserLocks::new();
        let checkout = CheckoutService::new(&store, &store, &store, &locks);
        let mouse = product(&store, "mouse", 100).await;

        assert!(matches!(
            checkout
                .checkout(USER, request(vec![item(ProductId::new(999), 1)]))
                .await,
            Err(ShopError::InvalidInput(_))
        ));
        assert!(matches!(
            checkout.checkout(USER, request(vec![item(mouse, 0)])).await,
            Err(ShopError::InvalidQuantity)
        ));
        let mut no_payment = request(vec![item(mouse, 1)]);
        no_payment.payment_method = Some(String::new());
        assert!(matches!(
            checkout.checkout(USER, no_payment).await,
            Err(ShopError::InvalidInput(_))
        ));
        assert!(store.list_for_user(USER).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_orders_listed_newest_first_and_scoped() {
        let store = MemoryStore::new();
        let locks = UserLocks::new();
        let checkout = CheckoutService::new(&store, &store, &store, &locks);
        let mouse = product(&store, "mouse", 100).await;

        let first = checkout
            .checkout(USER, request(vec![item(mouse, 1)]))
            .await
            .unwrap();
        let second = checkout
            .checkout(USER, request(vec![item(mouse, 2)]))
            .await
            .unwrap();

        let ids: Vec<_> = checkout
            .list_orders(USER)
            .await
            .unwrap()
            .into_iter()
            .map(|o| o.id)
            .collect();
        assert_eq!(ids, vec![second.id, first.id]);
        assert!(
            checkout
                .list_orders(UserId::new(2))
                .await
                .unwrap()
                .is_empty()
        );
        assert!(matches!(
            checkout
                .get_order(UserId::new(2), &first.id.to_string())
                .await,
            Err(ShopError::NotFound(_))
        ));
    }

    /// A cart store whose purge always fails.
    struct BrokenPurge(MemoryStore);

    #[async_trait]
    impl CartStore for BrokenPurge {
        async fn list_lines(&self, user_id: UserId) -> Result<Vec<CartLine>, RepositoryError> {
            self.0.list_lines(user_id).await
        }

        async fn find_line(
            &self,
            user_id: UserId,
            product_id: ProductId,
        ) -> Result<Option<CartLine>, RepositoryError> {
            self.0.find_line(user_id, product_id).await
        }

        async fn get_line(
            &self,
            user_id: UserId,
            id: CartLineId,
        ) -> Result<Option<CartLine>, RepositoryError> {
            self.0.get_line(user_id, id).await
        }

        async fn insert_line(
            &self,
            user_id: UserId,
            product_id: ProductId,
            quantity: u32,
        ) -> Result<CartLine, RepositoryError> {
            self.0.insert_line(user_id, product_id, quantity).await
        }

        async fn update_line(
            &self,
            user_id: UserId,
            id: CartLineId,
            quantity: Option<u32>,
            selected: Option<bool>,
        ) -> Result<Option<CartLine>, RepositoryError> {
            self.0.update_line(user_id, id, quantity, selected).await
        }

        async fn delete_line(
            &self,
            user_id: UserId,
            id: CartLineId,
        ) -> Result<bool, RepositoryError> {
            self.0.delete_line(user_id, id).await
        }

        async fn delete_selected(&self, _user_id: UserId) -> Result<u64, RepositoryError> {
            Err(RepositoryError::DataCorruption("purge refused".to_owned()))
        }
    }

    #[tokio::test]
    async fn test_failed_purge_keeps_order() {
        let store = MemoryStore::new();
        let carts = BrokenPurge(MemoryStore::new());
        let locks = UserLocks::new();
        let checkout = CheckoutService::new(&store, &carts, &store, &locks);
        let mouse = product(&store, "mouse", 100).await;
        carts.insert_line(USER, mouse, 1).await.unwrap();

        let order = checkout
            .checkout(USER, request(vec![item(mouse, 1)]))
            .await
            .unwrap();

        assert_eq!(store.list_for_user(USER).await.unwrap()[0].id, order.id);
        assert_eq!(carts.list_lines(USER).await.unwrap().len(), 1);
    }
}
