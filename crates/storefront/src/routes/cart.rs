//! Cart mutations. Both routes require a session.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde_json::json;

use amazon_clone_core::ProductId;

use crate::db::{CartRepository, ProductRepository};
use crate::error::{AppError, Result};
use crate::middleware::RequireUser;
use crate::state::AppState;
use crate::store::CartStore;

fn parse_product_id(raw: &str) -> Result<ProductId> {
    raw.parse()
        .map_err(|_| AppError::NotFound("Product not found".to_owned()))
}

/// `POST /api/addtocart/{productId}`
///
/// Adds one unit, snapshotting the product as it is now.
pub async fn add(
    State(state): State<AppState>,
    RequireUser { user, .. }: RequireUser,
    Path(product_id): Path<String>,
) -> Result<impl IntoResponse> {
    let product_id = parse_product_id(&product_id)?;
    let product = ProductRepository::new(state.pool())
        .get(product_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Product not found".to_owned()))?;

    let carts = CartRepository::new(state.pool());
    carts.add(user.id, &product).await?;
    let cart = carts.lines(user.id).await?;

    tracing::info!(user_id = %user.id, product_id = %product_id, "Added to cart");
    Ok((
        StatusCode::CREATED,
        Json(json!({
            "status": true,
            "message": "Product added to cart",
            "cart": cart,
        })),
    ))
}

/// `DELETE /api/delete/{productId}`
///
/// Removes the whole line regardless of quantity.
pub async fn remove(
    State(state): State<AppState>,
    RequireUser { user, .. }: RequireUser,
    Path(product_id): Path<String>,
) -> Result<impl IntoResponse> {
    let product_id = parse_product_id(&product_id)?;
    let carts = CartRepository::new(state.pool());

    if !carts.remove(user.id, product_id).await? {
        return Err(AppError::NotFound("Product not found in cart".to_owned()));
    }
    let cart = carts.lines(user.id).await?;

    Ok(Json(json!({
        "status": true,
        "message": "Product removed from cart",
        "cart": cart,
    })))
}
