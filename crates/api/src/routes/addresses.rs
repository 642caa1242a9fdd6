//! Address book route handlers.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};

use super::{JsonBody, MessageResponse};
use crate::error::Result;
use crate::middleware::RequireAuth;
use crate::models::Address;
use crate::services::AddressForm;
use crate::state::AppState;

/// GET /api/addresses
#[tracing::instrument(skip_all, fields(user_id = %user.id))]
pub async fn index(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
) -> Result<Json<Vec<Address>>> {
    Ok(Json(state.address_book().list(user.id).await?))
}

/// POST /api/addresses
#[tracing::instrument(skip_all, fields(user_id = %user.id))]
pub async fn create(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    JsonBody(form): JsonBody<AddressForm>,
) -> Result<(StatusCode, Json<Address>)> {
    let address = state.address_book().create(user.id, form).await?;
    Ok((StatusCode::CREATED, Json(address)))
}

/// PUT /api/addresses/{id}
#[tracing::instrument(skip_all, fields(user_id = %user.id, address_id = %id))]
pub async fn update(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(id): Path<String>,
    JsonBody(form): JsonBody<AddressForm>,
) -> Result<Json<Address>> {
    Ok(Json(state.address_book().update(user.id, &id, form).await?))
}

/// DELETE /api/addresses/{id}
#[tracing::instrument(skip_all, fields(user_id = %user.id, address_id = %id))]
pub async fn destroy(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>> {
    state.address_book().delete(user.id, &id).await?;
    Ok(Json(MessageResponse::new("Address deleted")))
}
