//! Taxonomy master data handlers.

use axum::{Json, extract::State};

use crate::error::Result;
use crate::models::{TaxonomyEntry, TaxonomyKind};
use crate::state::AppState;

async fn list(state: &AppState, kind: TaxonomyKind) -> Result<Json<Vec<TaxonomyEntry>>> {
    Ok(Json(state.catalog().list_taxonomy(kind).await?))
}

/// GET /api/master/categories
pub async fn categories(State(state): State<AppState>) -> Result<Json<Vec<TaxonomyEntry>>> {
    list(&state, TaxonomyKind::Category).await
}

/// GET /api/master/types
pub async fn types(State(state): State<AppState>) -> Result<Json<Vec<TaxonomyEntry>>> {
    list(&state, TaxonomyKind::ProductType).await
}

/// GET /api/master/materials
pub async fn materials(State(state): State<AppState>) -> Result<Json<Vec<TaxonomyEntry>>> {
    list(&state, TaxonomyKind::Material).await
}
