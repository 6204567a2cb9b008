//! The signed-in customer's profile and order history.

use axum::{Json, extract::State, response::IntoResponse};
use serde_json::json;

use crate::db::{CartRepository, OrderRepository};
use crate::error::{AppError, Result};
use crate::middleware::RequireUser;
use crate::state::AppState;
use crate::store::{CartStore, OrderStore};

/// `GET /api/getAuthUser`
pub async fn auth_user(
    State(state): State<AppState>,
    RequireUser { user, .. }: RequireUser,
) -> Result<impl IntoResponse> {
    let cart = CartRepository::new(state.pool()).lines(user.id).await?;
    let orders = OrderRepository::new(state.pool())
        .list_for_user(user.id)
        .await?;

    let mut profile = serde_json::to_value(&user)
        .map_err(|e| AppError::Internal(e.to_string()))?;
    profile["cart"] = json!(cart);
    profile["orders"] = json!(orders);

    Ok(Json(json!({ "status": true, "user": profile })))
}

/// `GET /api/orders`, newest first.
pub async fn orders(
    State(state): State<AppState>,
    RequireUser { user, .. }: RequireUser,
) -> Result<impl IntoResponse> {
    let orders = OrderRepository::new(state.pool())
        .list_for_user(user.id)
        .await?;
    Ok(Json(json!({ "status": true, "orders": orders })))
}
