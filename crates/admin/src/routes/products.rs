//! Catalog management.

use axum::{
    Json,
    extract::{Path, Query, State, rejection::JsonRejection},
    http::StatusCode,
    response::IntoResponse,
};
use serde::Deserialize;
use serde_json::json;

use amazon_clone_core::ProductId;

use super::json_body;
use crate::db::ProductRepository;
use crate::error::{AppError, Result};
use crate::middleware::RequireAdmin;
use crate::models::{ListParams, ProductInput};
use crate::state::AppState;

const NOT_FOUND: &str = "Product not found";

#[derive(Debug, Deserialize)]
pub struct BulkDeleteRequest {
    #[serde(default)]
    pub ids: Vec<ProductId>,
}

fn not_found() -> AppError {
    AppError::NotFound(NOT_FOUND.to_owned())
}

/// `GET /api/admin/products`
pub async fn index(
    State(state): State<AppState>,
    _admin: RequireAdmin,
    Query(params): Query<ListParams>,
) -> Result<impl IntoResponse> {
    let page = ProductRepository::new(state.pool()).list(&params).await?;

    Ok(Json(json!({
        "status": true,
        "totalPages": page.total_pages(),
        "currentPage": page.page.number,
        "totalProducts": page.total,
        "products": page.items,
    })))
}

/// `GET /api/admin/products/{id}`
pub async fn show(
    State(state): State<AppState>,
    _admin: RequireAdmin,
    Path(id): Path<String>,
) -> Result<impl IntoResponse> {
    let id = id.parse::<ProductId>().map_err(|_| not_found())?;
    let product = ProductRepository::new(state.pool())
        .get(id)
        .await?
        .ok_or_else(not_found)?;

    Ok(Json(json!({ "status": true, "product": product })))
}

/// `POST /api/admin/products`
pub async fn create(
    State(state): State<AppState>,
    RequireAdmin { admin, .. }: RequireAdmin,
    payload: std::result::Result<Json<ProductInput>, JsonRejection>,
) -> Result<impl IntoResponse> {
    let new_product = json_body(payload)?
        .into_new()
        .map_err(AppError::Validation)?;
    let product = ProductRepository::new(state.pool())
        .create(&new_product)
        .await?;
    tracing::info!(admin_id = %admin.id, product_id = %product.product_id, "Product created by admin");

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "status": true,
            "message": "Product created successfully",
            "product": product,
        })),
    ))
}

/// `PUT /api/admin/products/{id}`
pub async fn update(
    State(state): State<AppState>,
    _admin: RequireAdmin,
    Path(id): Path<String>,
    payload: std::result::Result<Json<ProductInput>, JsonRejection>,
) -> Result<impl IntoResponse> {
    let id = id.parse::<ProductId>().map_err(|_| not_found())?;
    let patch = json_body(payload)?
        .into_patch()
        .map_err(AppError::Validation)?;
    let product = ProductRepository::new(state.pool())
        .update(id, &patch)
        .await?
        .ok_or_else(not_found)?;

    Ok(Json(json!({
        "status": true,
        "message": "Product updated successfully",
        "product": product,
    })))
}

/// `DELETE /api/admin/products/{id}`
pub async fn destroy(
    State(state): State<AppState>,
    RequireAdmin { admin, .. }: RequireAdmin,
    Path(id): Path<String>,
) -> Result<impl IntoResponse> {
    let id = id.parse::<ProductId>().map_err(|_| not_found())?;
    if !ProductRepository::new(state.pool()).delete(id).await? {
        return Err(not_found());
    }
    tracing::info!(admin_id = %admin.id, product_id = %id, "Product deleted");

    Ok(Json(json!({
        "status": true,
        "message": "Product deleted successfully",
    })))
}

/// `POST /api/admin/products/bulk-delete`
pub async fn bulk_delete(
    State(state): State<AppState>,
    RequireAdmin { admin, .. }: RequireAdmin,
    payload: std::result::Result<Json<BulkDeleteRequest>, JsonRejection>,
) -> Result<impl IntoResponse> {
    let request = json_body(payload)?;
    if request.ids.is_empty() {
        return Err(AppError::BadRequest("Product IDs array is required".to_owned()));
    }

    let deleted = ProductRepository::new(state.pool())
        .bulk_delete(&request.ids)
        .await?;
    tracing::info!(admin_id = %admin.id, requested = request.ids.len(), deleted, "Products bulk deleted");

    Ok(Json(json!({
        "status": true,
        "message": format!("{deleted} products deleted successfully"),
        "deletedCount": deleted,
    })))
}

/// `GET /api/admin/stats/products`
pub async fn stats(
    State(state): State<AppState>,
    _admin: RequireAdmin,
) -> Result<impl IntoResponse> {
    let stats = ProductRepository::new(state.pool()).stats().await?;
    Ok(Json(json!({ "status": true, "stats": stats })))
}
