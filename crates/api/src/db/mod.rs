//! Storage for the shop.
//!
//! # Database: `toko` schema in `PostgreSQL`
//!
//! ## Tables
//!
//! - `users` - Accounts (username + argon2 hash)
//! - `categories`, `product_types`, `materials` - Taxonomy master data
//! - `products` - Catalog with stock counts
//! - `cart_lines` - Pending selections, unique per (user, product)
//! - `addresses` - Shipping addresses, at most one primary per user
//! - `orders` - Immutable order snapshots (items as JSONB)
//! - `tower_sessions.session` - Session storage (created by the session store)
//!
//! Each concern is reached through a store trait so services can run against
//! `PostgreSQL` in production and [`memory::MemoryStore`] in tests.
//!
//! # Migrations
//!
//! Migrations are stored in `crates/api/migrations/` and run via:
//! ```bash
//! cargo run -p toko-cli -- migrate
//! ```

pub mod addresses;
pub mod carts;
pub mod memory;
pub mod orders;
pub mod products;
pub mod seed;
pub mod users;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

use toko_core::{AddressId, CartLineId, OrderId, ProductId, UserId, Username};

use crate::models::{
    Address, AddressPatch, CartLine, NewAddress, NewOrder, NewProduct, Order, Product,
    ProductPatch, TaxonomyEntry, TaxonomyKind, User,
};

pub use addresses::PgAddressStore;
pub use carts::PgCartStore;
pub use memory::MemoryStore;
pub use orders::PgOrderStore;
pub use products::PgCatalogStore;
pub use users::PgUserStore;

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Constraint violation (e.g., unique username).
    #[error("constraint violation: {0}")]
    Conflict(String),
}

/// Map a unique-violation into `RepositoryError::Conflict`.
pub(crate) fn conflict_on_unique(e: sqlx::Error, what: &str) -> RepositoryError {
    if let sqlx::Error::Database(ref db_err) = e
        && db_err.is_unique_violation()
    {
        return RepositoryError::Conflict(format!("{what} already exists"));
    }
    RepositoryError::Database(e)
}

/// Convert a non-negative database integer into a count.
pub(crate) fn to_count(value: i32, column: &str) -> Result<u32, RepositoryError> {
    u32::try_from(value)
        .map_err(|_| RepositoryError::DataCorruption(format!("negative {column}: {value}")))
}

/// Convert a count into a database integer.
pub(crate) fn to_db_int(value: u32, column: &str) -> Result<i32, RepositoryError> {
    i32::try_from(value)
        .map_err(|_| RepositoryError::DataCorruption(format!("{column} out of range: {value}")))
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Arguments
///
/// * `database_url` - `PostgreSQL` connection string (wrapped in `SecretString`)
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}

// =============================================================================
// Store Traits
// =============================================================================

/// Products and taxonomy master data.
#[async_trait]
pub trait CatalogStore: Send + Sync {
    /// All products ordered by id.
    async fn list_products(&self) -> Result<Vec<Product>, RepositoryError>;

    /// A single product.
    async fn get_product(&self, id: ProductId) -> Result<Option<Product>, RepositoryError>;

    /// Every product whose id is in `ids`; unknown ids are skipped.
    async fn get_products(&self, ids: &[ProductId]) -> Result<Vec<Product>, RepositoryError>;

    /// Number of products in the catalog.
    async fn count_products(&self) -> Result<i64, RepositoryError>;

    /// Insert a product. Fails with `Conflict` on a duplicate SKU.
    async fn create_product(&self, input: &NewProduct) -> Result<Product, RepositoryError>;

    /// Apply a patch; `None` if the product does not exist.
    async fn update_product(
        &self,
        id: ProductId,
        patch: &ProductPatch,
    ) -> Result<Option<Product>, RepositoryError>;

    /// Delete a product; `false` if it did not exist.
    async fn delete_product(&self, id: ProductId) -> Result<bool, RepositoryError>;

    /// A taxonomy master list ordered by name.
    async fn list_taxonomy(&self, kind: TaxonomyKind)
    -> Result<Vec<TaxonomyEntry>, RepositoryError>;

    /// Whether a taxonomy entry exists.
    async fn taxonomy_exists(&self, kind: TaxonomyKind, id: i32) -> Result<bool, RepositoryError>;

    /// Insert a taxonomy entry. Fails with `Conflict` on a duplicate name.
    async fn create_taxonomy(
        &self,
        kind: TaxonomyKind,
        name: &str,
    ) -> Result<TaxonomyEntry, RepositoryError>;
}

/// Cart lines. Every operation is scoped to the owning user.
#[async_trait]
pub trait CartStore: Send + Sync {
    /// All lines of a user, oldest first.
    async fn list_lines(&self, user_id: UserId) -> Result<Vec<CartLine>, RepositoryError>;

    /// The line for a (user, product) pair.
    async fn find_line(
        &self,
        user_id: UserId,
        product_id: ProductId,
    ) -> Result<Option<CartLine>, RepositoryError>;

    /// A line by id, only if owned by `user_id`.
    async fn get_line(
        &self,
        user_id: UserId,
        id: CartLineId,
    ) -> Result<Option<CartLine>, RepositoryError>;

    /// Insert a selected line. Fails with `Conflict` if the pair already exists.
    async fn insert_line(
        &self,
        user_id: UserId,
        product_id: ProductId,
        quantity: u32,
    ) -> Result<CartLine, RepositoryError>;

    /// Change quantity and/or selection; `None` if the line is absent or not owned.
    async fn update_line(
        &self,
        user_id: UserId,
        id: CartLineId,
        quantity: Option<u32>,
        selected: Option<bool>,
    ) -> Result<Option<CartLine>, RepositoryError>;

    /// Delete a line; `false` if absent or not owned.
    async fn delete_line(&self, user_id: UserId, id: CartLineId) -> Result<bool, RepositoryError>;

    /// Delete every selected line of a user, returning how many were removed.
    async fn delete_selected(&self, user_id: UserId) -> Result<u64, RepositoryError>;
}

/// Shipping addresses. Every operation is scoped to the owning user.
#[async_trait]
pub trait AddressStore: Send + Sync {
    /// All addresses of a user: primary first, then newest first.
    async fn list(&self, user_id: UserId) -> Result<Vec<Address>, RepositoryError>;

    /// An address by id, only if owned by `user_id`.
    async fn get(&self, user_id: UserId, id: AddressId)
    -> Result<Option<Address>, RepositoryError>;

    /// Number of addresses a user has.
    async fn count(&self, user_id: UserId) -> Result<i64, RepositoryError>;

    /// Insert an address as given.
    async fn insert(&self, user_id: UserId, input: &NewAddress)
    -> Result<Address, RepositoryError>;

    /// Apply a patch; `None` if absent or not owned.
    async fn update(
        &self,
        user_id: UserId,
        id: AddressId,
        patch: &AddressPatch,
    ) -> Result<Option<Address>, RepositoryError>;

    /// Clear the primary flag on every address of a user except `keep`.
    async fn demote_all(
        &self,
        user_id: UserId,
        keep: Option<AddressId>,
    ) -> Result<u64, RepositoryError>;

    /// Delete an address; `false` if absent or not owned.
    async fn delete(&self, user_id: UserId, id: AddressId) -> Result<bool, RepositoryError>;
}

/// Placed orders. Orders are append-only.
#[async_trait]
pub trait OrderStore: Send + Sync {
    /// Persist a new order.
    async fn insert(&self, order: &NewOrder) -> Result<Order, RepositoryError>;

    /// All orders of a user, newest first.
    async fn list_for_user(&self, user_id: UserId) -> Result<Vec<Order>, RepositoryError>;

    /// An order by id, only if owned by `user_id`.
    async fn get(&self, user_id: UserId, id: OrderId) -> Result<Option<Order>, RepositoryError>;
}

/// Accounts.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Create an account. Fails with `Conflict` if the username is taken.
    async fn create(
        &self,
        username: &Username,
        password_hash: &str,
    ) -> Result<User, RepositoryError>;

    /// A user and their password hash, looked up by username.
    async fn get_password_hash(
        &self,
        username: &Username,
    ) -> Result<Option<(User, String)>, RepositoryError>;

    /// A user by id.
    async fn get_by_id(&self, id: UserId) -> Result<Option<User>, RepositoryError>;
}

// =============================================================================
// Store Bundle
// =============================================================================

/// The set of stores the application runs against.
#[derive(Clone)]
pub struct Stores {
    pub catalog: Arc<dyn CatalogStore>,
    pub carts: Arc<dyn CartStore>,
    pub addresses: Arc<dyn AddressStore>,
    pub orders: Arc<dyn OrderStore>,
    pub users: Arc<dyn UserStore>,
    pool: Option<PgPool>,
}

impl Stores {
    /// Stores backed by `PostgreSQL`.
    #[must_use]
    pub fn postgres(pool: PgPool) -> Self {
        Self {
            catalog: Arc::new(PgCatalogStore::new(pool.clone())),
            carts: Arc::new(PgCartStore::new(pool.clone())),
            addresses: Arc::new(PgAddressStore::new(pool.clone())),
            orders: Arc::new(PgOrderStore::new(pool.clone())),
            users: Arc::new(PgUserStore::new(pool.clone())),
            pool: Some(pool),
        }
    }

    /// Stores backed by a single in-process [`MemoryStore`].
    #[must_use]
    pub fn in_memory(store: MemoryStore) -> Self {
        let store = Arc::new(store);
        Self {
            catalog: store.clone(),
            carts: store.clone(),
            addresses: store.clone(),
            orders: store.clone(),
            users: store,
            pool: None,
        }
    }

    /// The `PostgreSQL` pool, if these stores are database-backed.
    #[must_use]
    pub const fn pool(&self) -> Option<&PgPool> {
        self.pool.as_ref()
    }

    /// Check that the backing storage answers.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the database cannot be reached.
    pub async fn ping(&self) -> Result<(), RepositoryError> {
        if let Some(pool) = &self.pool {
            sqlx::query("SELECT 1").fetch_one(pool).await?;
        }
        Ok(())
    }
}
