//! Catalog route handlers.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};

use super::{JsonBody, MessageResponse};
use crate::error::Result;
use crate::middleware::RequireAuth;
use crate::models::ProductView;
use crate::services::ProductForm;
use crate::state::AppState;

/// GET /api/products
pub async fn index(State(state): State<AppState>) -> Result<Json<Vec<ProductView>>> {
    Ok(Json(state.catalog().list_products().await?))
}

/// GET /api/products/{id}
pub async fn show(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ProductView>> {
    Ok(Json(state.catalog().get_product(&id).await?))
}

/// POST /api/products
#[tracing::instrument(skip_all, fields(user_id = %user.id))]
pub async fn create(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    JsonBody(form): JsonBody<ProductForm>,
) -> Result<(StatusCode, Json<ProductView>)> {
    let product = state.catalog().create_product(form).await?;
    Ok((StatusCode::CREATED, Json(product)))
}

/// PUT /api/products/{id}
#[tracing::instrument(skip_all, fields(user_id = %user.id, product_id = %id))]
pub async fn update(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(id): Path<String>,
    JsonBody(form): JsonBody<ProductForm>,
) -> Result<Json<ProductView>> {
    Ok(Json(state.catalog().update_product(&id, form).await?))
}

/// DELETE /api/products/{id}
#[tracing::instrument(skip_all, fields(user_id = %user.id, product_id = %id))]
pub async fn destroy(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>> {
    state.catalog().delete_product(&id).await?;
    Ok(Json(MessageResponse::new("Product deleted")))
}
