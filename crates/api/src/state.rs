//! Application state shared across handlers.

use std::sync::Arc;

use crate::config::ApiConfig;
use crate::db::Stores;
use crate::services::{
    AddressBook, AuthService, CartService, CatalogService, CheckoutService, UserLocks,
};

/// Application state shared across all handlers.
///
/// Cheaply cloneable via `Arc`; holds the configuration, the storage
/// backends and the per-user lock table.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: ApiConfig,
    stores: Stores,
    locks: UserLocks,
}

impl AppState {
    /// Create a new application state.
    #[must_use]
    pub fn new(config: ApiConfig, stores: Stores) -> Self {
        Self {
            inner: Arc::new(AppStateInner {
                config,
                stores,
                locks: UserLocks::new(),
            }),
        }
    }

    /// Get a reference to the API configuration.
    #[must_use]
    pub fn config(&self) -> &ApiConfig {
        &self.inner.config
    }

    /// Get a reference to the storage backends.
    #[must_use]
    pub fn stores(&self) -> &Stores {
        &self.inner.stores
    }

    /// Get a reference to the per-user lock table.
    #[must_use]
    pub fn locks(&self) -> &UserLocks {
        &self.inner.locks
    }

    /// Account registration and login.
    #[must_use]
    pub fn auth(&self) -> AuthService<'_> {
        AuthService::new(&*self.stores().users)
    }

    /// Product and taxonomy operations.
    #[must_use]
    pub fn catalog(&self) -> CatalogService<'_> {
        CatalogService::new(&*self.stores().catalog)
    }

    /// Cart operations.
    #[must_use]
    pub fn cart(&self) -> CartService<'_> {
        let stores = self.stores();
        CartService::new(&*stores.catalog, &*stores.carts, self.locks())
    }

    /// Checkout and order history.
    #[must_use]
    pub fn checkout(&self) -> CheckoutService<'_> {
        let stores = self.stores();
        CheckoutService::new(
            &*stores.catalog,
            &*stores.carts,
            &*stores.orders,
            self.locks(),
        )
    }

    /// The address book.
    #[must_use]
    pub fn address_book(&self) -> AddressBook<'_> {
        AddressBook::new(&*self.stores().addresses, self.locks())
    }
}
