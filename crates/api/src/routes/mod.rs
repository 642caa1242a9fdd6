//! JSON route handlers.
//!
//! # Route Structure
//!
//! ```text
//! # Auth
//! POST   /api/auth/register          - Create an account
//! POST   /api/auth/login             - Start a session
//! POST   /api/auth/logout            - End the session
//! GET    /api/auth/me                - Current user (requires auth)
//!
//! # Catalog
//! GET    /api/products               - All products
//! GET    /api/products/{id}          - One product
//! POST   /api/products               - Create a product (requires auth)
//! PUT    /api/products/{id}          - Update a product (requires auth)
//! DELETE /api/products/{id}          - Delete a product (requires auth)
//! GET    /api/master/categories      - Category master list
//! GET    /api/master/types           - Product type master list
//! GET    /api/master/materials       - Material master list
//!
//! # Cart (requires auth)
//! GET    /api/cart                   - Cart lines with product info
//! POST   /api/cart                   - Add a product
//! PUT    /api/cart/{id}              - Change quantity or selection
//! DELETE /api/cart/{id}              - Remove a line
//!
//! # Orders (requires auth)
//! POST   /api/orders                 - Checkout
//! GET    /api/orders                 - Order history
//! GET    /api/orders/{id}            - One order
//!
//! # Addresses (requires auth)
//! GET    /api/addresses              - Address book
//! POST   /api/addresses              - Add an address
//! PUT    /api/addresses/{id}         - Edit an address
//! DELETE /api/addresses/{id}         - Remove an address
//! ```

pub mod addresses;
pub mod auth;
pub mod cart;
pub mod master;
pub mod orders;
pub mod products;

use axum::{
    Router,
    extract::FromRequest,
    routing::{get, post, put},
};
use serde::Serialize;

use crate::error::AppError;
use crate::state::AppState;

/// `axum::Json` with rejections reported as JSON `AppError` bodies.
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct JsonBody<T>(pub T);

/// A bare `{"message": ...}` response.
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Create the auth routes router.
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/register", post(auth::register))
        .route("/login", post(auth::login))
        .route("/logout", post(auth::logout))
        .route("/me", get(auth::me))
}

/// Create the product routes router.
pub fn product_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(products::index).post(products::create))
        .route(
            "/{id}",
            get(products::show)
                .put(products::update)
                .delete(products::destroy),
        )
}

/// Create the taxonomy master data router.
pub fn master_routes() -> Router<AppState> {
    Router::new()
        .route("/categories", get(master::categories))
        .route("/types", get(master::types))
        .route("/materials", get(master::materials))
}

/// Create the cart routes router.
pub fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(cart::index).post(cart::add))
        .route("/{id}", put(cart::update).delete(cart::remove))
}

/// Create the order routes router.
pub fn order_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(orders::index).post(orders::create))
        .route("/{id}", get(orders::show))
}

/// Create the address routes router.
pub fn address_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(addresses::index).post(addresses::create))
        .route("/{id}", put(addresses::update).delete(addresses::destroy))
}

/// Every `/api` route except auth, which `crate::app` mounts separately so
/// it can carry its own rate limiter.
pub fn routes() -> Router<AppState> {
    Router::new()
        .nest("/api/products", product_routes())
        .nest("/api/master", master_routes())
        .nest("/api/cart", cart_routes())
        .nest("/api/orders", order_routes())
        .nest("/api/addresses", address_routes())
}
