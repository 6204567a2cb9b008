//! Public catalog.

use axum::{
    Json,
    extract::{Path, State},
    response::IntoResponse,
};
use serde_json::json;

use amazon_clone_core::ProductId;

use crate::db::ProductRepository;
use crate::error::{AppError, Result};
use crate::state::AppState;

/// `GET /api/products`
pub async fn index(State(state): State<AppState>) -> Result<impl IntoResponse> {
    let products = ProductRepository::new(state.pool()).list().await?;
    Ok(Json(json!({ "status": true, "products": products })))
}

/// `GET /api/product/{id}`
pub async fn show(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse> {
    let product = match id.parse::<ProductId>() {
        Ok(id) => ProductRepository::new(state.pool()).get(id).await?,
        Err(_) => None,
    }
    .ok_or_else(|| AppError::NotFound("Product not found".to_owned()))?;

    Ok(Json(json!({ "status": true, "product": product })))
}
