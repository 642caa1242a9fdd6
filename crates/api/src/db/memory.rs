//! In-process storage.
//!
//! [`MemoryStore`] implements every store trait over maps behind a single
//! `RwLock`. It mirrors the `PostgreSQL` constraints that services depend on:
//! unique (user, product) cart lines, at most one primary address per user,
//! unique usernames, SKUs and taxonomy names.

use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use toko_core::{AddressId, CartLineId, OrderId, ProductId, UserId, Username};

use super::{
    AddressStore, CartStore, CatalogStore, OrderStore, RepositoryError, UserStore,
};
use crate::models::{
    Address, AddressPatch, CartLine, NewAddress, NewOrder, NewProduct, Order, Product,
    ProductPatch, TaxonomyEntry, TaxonomyKind, User,
};

#[derive(Debug, Default)]
struct Tables {
    next_id: i32,
    users: BTreeMap<UserId, (User, String)>,
    products: BTreeMap<ProductId, Product>,
    taxonomy: HashMap<TaxonomyKind, BTreeMap<i32, String>>,
    cart_lines: BTreeMap<CartLineId, CartLine>,
    addresses: BTreeMap<AddressId, Address>,
    orders: BTreeMap<OrderId, Order>,
}

impl Tables {
    /// Hand out the next serial value. Shared across tables, which keeps ids
    /// unique per table as `SERIAL` does.
    const fn next_id(&mut self) -> i32 {
        self.next_id += 1;
        self.next_id
    }

    fn check_sku(&self, sku: Option<&str>, except: Option<ProductId>) -> Result<(), RepositoryError> {
        let Some(sku) = sku else { return Ok(()) };
        let taken = self
            .products
            .values()
            .any(|p| Some(p.id) != except && p.sku.as_deref() == Some(sku));
        if taken {
            return Err(RepositoryError::Conflict("product sku already exists".to_owned()));
        }
        Ok(())
    }

    fn check_single_primary(
        &self,
        user_id: UserId,
        candidate: AddressId,
    ) -> Result<(), RepositoryError> {
        let other_primary = self
            .addresses
            .values()
            .any(|a| a.user_id == user_id && a.is_primary && a.id != candidate);
        if other_primary {
            return Err(RepositoryError::Conflict(
                "user already has a primary address".to_owned(),
            ));
        }
        Ok(())
    }
}

/// In-memory implementation of every store trait.
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

// =============================================================================
// Catalog
// =============================================================================

#[async_trait]
impl CatalogStore for MemoryStore {
    async fn list_products(&self) -> Result<Vec<Product>, RepositoryError> {
        Ok(self.tables.read().await.products.values().cloned().collect())
    }

    async fn get_product(&self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
        Ok(self.tables.read().await.products.get(&id).cloned())
    }

    async fn get_products(&self, ids: &[ProductId]) -> Result<Vec<Product>, RepositoryError> {
        let tables = self.tables.read().await;
        Ok(tables
            .products
            .values()
            .filter(|p| ids.contains(&p.id))
            .cloned()
            .collect())
    }

    async fn count_products(&self) -> Result<i64, RepositoryError> {
        let count = self.tables.read().await.products.len();
        i64::try_from(count).map_err(|_| RepositoryError::DataCorruption("product count".into()))
    }

    async fn create_product(&self, input: &NewProduct) -> Result<Product, RepositoryError> {
        let mut tables = self.tables.write().await;
        tables.check_sku(input.sku.as_deref(), None)?;

        let now = Utc::now();
        let product = Product {
            id: ProductId::new(tables.next_id()),
            sku: input.sku.clone(),
            name: input.name.clone(),
            description: input.description.clone(),
            price: input.price,
            stock: input.stock,
            buyable: input.buyable,
            category_id: input.category_id,
            type_id: input.type_id,
            material_id: input.material_id,
            seller_id: input.seller_id.clone(),
            seller_name: input.seller_name.clone(),
            image: input.image.clone(),
            created_at: now,
            updated_at: now,
        };
        tables.products.insert(product.id, product.clone());
        Ok(product)
    }

    async fn update_product(
        &self,
        id: ProductId,
        patch: &ProductPatch,
    ) -> Result<Option<Product>, RepositoryError> {
        let mut tables = self.tables.write().await;
        let Some(product) = tables.products.get_mut(&id) else {
            return Ok(None);
        };
        patch.apply_to(product);
        product.updated_at = Utc::now();
        Ok(Some(product.clone()))
    }

    async fn delete_product(&self, id: ProductId) -> Result<bool, RepositoryError> {
        Ok(self.tables.write().await.products.remove(&id).is_some())
    }

    async fn list_taxonomy(
        &self,
        kind: TaxonomyKind,
    ) -> Result<Vec<TaxonomyEntry>, RepositoryError> {
        let tables = self.tables.read().await;
        let mut entries: Vec<TaxonomyEntry> = tables
            .taxonomy
            .get(&kind)
            .into_iter()
            .flatten()
            .map(|(id, name)| TaxonomyEntry {
                id: *id,
                name: name.clone(),
            })
            .collect();
        entries.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(entries)
    }

    async fn taxonomy_exists(&self, kind: TaxonomyKind, id: i32) -> Result<bool, RepositoryError> {
        let tables = self.tables.read().await;
        Ok(tables
            .taxonomy
            .get(&kind)
            .is_some_and(|entries| entries.contains_key(&id)))
    }

    async fn create_taxonomy(
        &self,
        kind: TaxonomyKind,
        name: &str,
    ) -> Result<TaxonomyEntry, RepositoryError> {
        let mut tables = self.tables.write().await;
        let taken = tables
            .taxonomy
            .get(&kind)
            .is_some_and(|entries| entries.values().any(|n| n == name));
        if taken {
            return Err(RepositoryError::Conflict(format!(
                "{} already exists",
                kind.label()
            )));
        }

        let id = tables.next_id();
        tables
            .taxonomy
            .entry(kind)
            .or_default()
            .insert(id, name.to_owned());
        Ok(TaxonomyEntry {
            id,
            name: name.to_owned(),
        })
    }
}

// =============================================================================
// Cart
// =============================================================================

#[async_trait]
impl CartStore for MemoryStore {
    async fn list_lines(&self, user_id: UserId) -> Result<Vec<CartLine>, RepositoryError> {
        let tables = self.tables.read().await;
        Ok(tables
            .cart_lines
            .values()
            .filter(|l| l.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn find_line(
        &self,
        user_id: UserId,
        product_id: ProductId,
    ) -> Result<Option<CartLine>, RepositoryError> {
        let tables = self.tables.read().await;
        Ok(tables
            .cart_lines
            .values()
            .find(|l| l.user_id == user_id && l.product_id == product_id)
            .cloned())
    }

    async fn get_line(
        &self,
        user_id: UserId,
        id: CartLineId,
    ) -> Result<Option<CartLine>, RepositoryError> {
        let tables = self.tables.read().await;
        Ok(tables
            .cart_lines
            .get(&id)
            .filter(|l| l.user_id == user_id)
            .cloned())
    }

    async fn insert_line(
        &self,
        user_id: UserId,
        product_id: ProductId,
        quantity: u32,
    ) -> Result<CartLine, RepositoryError> {
        let mut tables = self.tables.write().await;
        let exists = tables
            .cart_lines
            .values()
            .any(|l| l.user_id == user_id && l.product_id == product_id);
        if exists {
            return Err(RepositoryError::Conflict("cart line already exists".to_owned()));
        }

        let now = Utc::now();
        let line = CartLine {
            id: CartLineId::new(tables.next_id()),
            user_id,
            product_id,
            quantity,
            selected: true,
            created_at: now,
            updated_at: now,
        };
        tables.cart_lines.insert(line.id, line.clone());
        Ok(line)
    }

    async fn update_line(
        &self,
        user_id: UserId,
        id: CartLineId,
        quantity: Option<u32>,
        selected: Option<bool>,
    ) -> Result<Option<CartLine>, RepositoryError> {
        let mut tables = self.tables.write().await;
        let Some(line) = tables
            .cart_lines
            .get_mut(&id)
            .filter(|l| l.user_id == user_id)
        else {
            return Ok(None);
        };

        if let Some(quantity) = quantity {
            line.quantity = quantity;
        }
        if let Some(selected) = selected {
            line.selected = selected;
        }
        line.updated_at = Utc::now();
        Ok(Some(line.clone()))
    }

    async fn delete_line(&self, user_id: UserId, id: CartLineId) -> Result<bool, RepositoryError> {
        let mut tables = self.tables.write().await;
        let owned = tables
            .cart_lines
            .get(&id)
            .is_some_and(|l| l.user_id == user_id);
        if owned {
            tables.cart_lines.remove(&id);
        }
        Ok(owned)
    }

    async fn delete_selected(&self, user_id: UserId) -> Result<u64, RepositoryError> {
        let mut tables = self.tables.write().await;
        let before = tables.cart_lines.len();
        tables
            .cart_lines
            .retain(|_, l| !(l.user_id == user_id && l.selected));
        Ok((before - tables.cart_lines.len()) as u64)
    }
}

// =============================================================================
// Addresses
// =============================================================================

#[async_trait]
impl AddressStore for MemoryStore {
    async fn list(&self, user_id: UserId) -> Result<Vec<Address>, RepositoryError> {
        let tables = self.tables.read().await;
        let mut addresses: Vec<Address> = tables
            .addresses
            .values()
            .filter(|a| a.user_id == user_id)
            .cloned()
            .collect();
        addresses.sort_by(|a, b| {
            b.is_primary
                .cmp(&a.is_primary)
                .then(b.created_at.cmp(&a.created_at))
                .then(b.id.cmp(&a.id))
        });
        Ok(addresses)
    }

    async fn get(
        &self,
        user_id: UserId,
        id: AddressId,
    ) -> Result<Option<Address>, RepositoryError> {
        let tables = self.tables.read().await;
        Ok(tables
            .addresses
            .get(&id)
            .filter(|a| a.user_id == user_id)
            .cloned())
    }

    async fn count(&self, user_id: UserId) -> Result<i64, RepositoryError> {
        let tables = self.tables.read().await;
        let count = tables
            .addresses
            .values()
            .filter(|a| a.user_id == user_id)
            .count();
        i64::try_from(count).map_err(|_| RepositoryError::DataCorruption("address count".into()))
    }

    async fn insert(
        &self,
        user_id: UserId,
        input: &NewAddress,
    ) -> Result<Address, RepositoryError> {
        let mut tables = self.tables.write().await;
        let id = AddressId::new(tables.next_id());
        if input.is_primary {
            tables.check_single_primary(user_id, id)?;
        }

        let now = Utc::now();
        let address = Address {
            id,
            user_id,
            label: input.label.clone(),
            name: input.name.clone(),
            phone: input.phone.clone(),
            full_address: input.full_address.clone(),
            is_primary: input.is_primary,
            created_at: now,
            updated_at: now,
        };
        tables.addresses.insert(id, address.clone());
        Ok(address)
    }

    async fn update(
        &self,
        user_id: UserId,
        id: AddressId,
        patch: &AddressPatch,
    ) -> Result<Option<Address>, RepositoryError> {
        let mut tables = self.tables.write().await;
        if !tables
            .addresses
            .get(&id)
            .is_some_and(|a| a.user_id == user_id)
        {
            return Ok(None);
        }
        if patch.is_primary == Some(true) {
            tables.check_single_primary(user_id, id)?;
        }

        let Some(address) = tables.addresses.get_mut(&id) else {
            return Ok(None);
        };
        patch.apply_to(address);
        address.updated_at = Utc::now();
        Ok(Some(address.clone()))
    }

    async fn demote_all(
        &self,
        user_id: UserId,
        keep: Option<AddressId>,
    ) -> Result<u64, RepositoryError> {
        let mut tables = self.tables.write().await;
        let now = Utc::now();
        let mut demoted = 0;
        for address in tables.addresses.values_mut() {
            if address.user_id == user_id && address.is_primary && Some(address.id) != keep {
                address.is_primary = false;
                address.updated_at = now;
                demoted += 1;
            }
        }
        Ok(demoted)
    }

    async fn delete(&self, user_id: UserId, id: AddressId) -> Result<bool, RepositoryError> {
        let mut tables = self.tables.write().await;
        let owned = tables
            .addresses
            .get(&id)
            .is_some_and(|a| a.user_id == user_id);
        if owned {
            tables.addresses.remove(&id);
        }
        Ok(owned)
    }
}

// =============================================================================
// Orders
// =============================================================================

#[async_trait]
impl OrderStore for MemoryStore {
    async fn insert(&self, order: &NewOrder) -> Result<Order, RepositoryError> {
        let mut tables = self.tables.write().await;
        let order = Order {
            id: OrderId::new(tables.next_id()),
            user_id: order.user_id,
            items: order.items.clone(),
            shipping_address: order.shipping_address.clone(),
            shipping_method: order.shipping_method.clone(),
            payment_method: order.payment_method.clone(),
            payment_status: order.payment_status,
            order_status: order.order_status,
            summary: order.summary,
            created_at: Utc::now(),
        };
        tables.orders.insert(order.id, order.clone());
        Ok(order)
    }

    async fn list_for_user(&self, user_id: UserId) -> Result<Vec<Order>, RepositoryError> {
        let tables = self.tables.read().await;
        let mut orders: Vec<Order> = tables
            .orders
            .values()
            .filter(|o| o.user_id == user_id)
            .cloned()
            .collect();
        orders.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(orders)
    }

    async fn get(&self, user_id: UserId, id: OrderId) -> Result<Option<Order>, RepositoryError> {
        let tables = self.tables.read().await;
        Ok(tables
            .orders
            .get(&id)
            .filter(|o| o.user_id == user_id)
            .cloned())
    }
}

// =============================================================================
// Users
// =============================================================================

#[async_trait]
impl UserStore for MemoryStore {
    async fn create(
        &self,
        username: &Username,
        password_hash: &str,
    ) -> Result<User, RepositoryError> {
        let mut tables = self.tables.write().await;
        if tables.users.values().any(|(u, _)| &u.username == username) {
            return Err(RepositoryError::Conflict("username already exists".to_owned()));
        }

        let user = User {
            id: UserId::new(tables.next_id()),
            username: username.clone(),
            created_at: Utc::now(),
        };
        tables
            .users
            .insert(user.id, (user.clone(), password_hash.to_owned()));
        Ok(user)
    }

    async fn get_password_hash(
        &self,
        username: &Username,
    ) -> Result<Option<(User, String)>, RepositoryError> {
        let tables = self.tables.read().await;
        Ok(tables
            .users
            .values()
            .find(|(u, _)| &u.username == username)
            .cloned())
    }

    async fn get_by_id(&self, id: UserId) -> Result<Option<User>, RepositoryError> {
        let tables = self.tables.read().await;
        Ok(tables.users.get(&id).map(|(u, _)| u.clone()))
    }
}
