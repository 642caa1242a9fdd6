//! Cart route handlers.
//!
//! Every cart route requires a logged-in user; lines are always scoped to
//! that user, so a foreign line id behaves exactly like an unknown one.

use axum::{
    Json,
    extract::{Path, State},
};
use serde::{Deserialize, Serialize};

use toko_core::{CartLineId, ProductId};

use super::{JsonBody, MessageResponse};
use crate::error::{Result, add_breadcrumb};
use crate::middleware::RequireAuth;
use crate::models::{CartLine, CartLineView};
use crate::services::{RawId, ShopError};
use crate::state::AppState;

/// Body of `POST /api/cart`.
#[derive(Debug, Deserialize)]
pub struct AddToCartRequest {
    pub product_id: Option<RawId>,
    #[serde(default)]
    pub quantity: i64,
}

/// Body of `PUT /api/cart/{id}`.
#[derive(Debug, Deserialize)]
pub struct UpdateCartLineRequest {
    pub quantity: Option<i64>,
    pub selected: Option<bool>,
}

/// Response of `POST /api/cart`.
#[derive(Debug, Serialize)]
pub struct AddToCartResponse {
    pub message: String,
    pub cart_item: CartLine,
}

fn parse_line_id(raw: &str) -> std::result::Result<CartLineId, ShopError> {
    raw.parse().map_err(|_| ShopError::not_found("cart item"))
}

/// GET /api/cart
#[tracing::instrument(skip_all, fields(user_id = %user.id))]
pub async fn index(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
) -> Result<Json<Vec<CartLineView>>> {
    Ok(Json(state.cart().list_cart(user.id).await?))
}

/// POST /api/cart
#[tracing::instrument(skip_all, fields(user_id = %user.id))]
pub async fn add(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    JsonBody(body): JsonBody<AddToCartRequest>,
) -> Result<Json<AddToCartResponse>> {
    let product_id: ProductId = body
        .product_id
        .as_ref()
        .and_then(RawId::parse)
        .ok_or_else(|| ShopError::invalid("invalid product id"))?;

    let line = state
        .cart()
        .add_to_cart(user.id, product_id, body.quantity)
        .await?;

    add_breadcrumb(
        "cart",
        "Added to cart",
        Some(&[("product_id", product_id.to_string().as_str())]),
    );

    Ok(Json(AddToCartResponse {
        message: "Product added to cart".to_owned(),
        cart_item: line,
    }))
}

/// PUT /api/cart/{id}
#[tracing::instrument(skip_all, fields(user_id = %user.id, line_id = %id))]
pub async fn update(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(id): Path<String>,
    JsonBody(body): JsonBody<UpdateCartLineRequest>,
) -> Result<Json<CartLine>> {
    let line_id = parse_line_id(&id)?;
    let line = state
        .cart()
        .update_line(user.id, line_id, body.quantity, body.selected)
        .await?;
    Ok(Json(line))
}

/// DELETE /api/cart/{id}
#[tracing::instrument(skip_all, fields(user_id = %user.id, line_id = %id))]
pub async fn remove(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>> {
    let line_id = parse_line_id(&id)?;
    state.cart().remove_line(user.id, line_id).await?;
    Ok(Json(MessageResponse::new("Item removed from cart")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_malformed_line_id_is_not_found() {
        assert!(matches!(parse_line_id("abc"), Err(ShopError::NotFound(_))));
        assert!(matches!(parse_line_id("-3"), Err(ShopError::NotFound(_))));
        assert!(parse_line_id("12").is_ok());
    }
}
