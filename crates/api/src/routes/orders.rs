//! Order route handlers.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use serde::Serialize;

use toko_core::OrderId;

use super::JsonBody;
use crate::error::{Result, add_breadcrumb};
use crate::middleware::RequireAuth;
use crate::models::Order;
use crate::services::CheckoutRequest;
use crate::state::AppState;

/// Response of a successful checkout.
#[derive(Debug, Serialize)]
pub struct CheckoutResponse {
    pub message: String,
    pub order_id: OrderId,
}

/// POST /api/orders
#[tracing::instrument(skip_all, fields(user_id = %user.id))]
pub async fn create(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    JsonBody(request): JsonBody<CheckoutRequest>,
) -> Result<(StatusCode, Json<CheckoutResponse>)> {
    let order = state.checkout().checkout(user.id, request).await?;
    add_breadcrumb(
        "checkout",
        "Order placed",
        Some(&[("order_id", order.id.to_string().as_str())]),
    );
    Ok((
        StatusCode::CREATED,
        Json(CheckoutResponse {
            message: "Order placed".to_owned(),
            order_id: order.id,
        }),
    ))
}

/// GET /api/orders
#[tracing::instrument(skip_all, fields(user_id = %user.id))]
pub async fn index(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
) -> Result<Json<Vec<Order>>> {
    Ok(Json(state.checkout().list_orders(user.id).await?))
}

/// GET /api/orders/{id}
#[tracing::instrument(skip_all, fields(user_id = %user.id, order_id = %id))]
pub async fn show(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(id): Path<String>,
) -> Result<Json<Order>> {
    Ok(Json(state.checkout().get_order(user.id, &id).await?))
}
