//! Order management and revenue analytics.

use axum::{
    Json,
    extract::{Path, Query, State, rejection::JsonRejection},
    response::IntoResponse,
};
use chrono::Utc;
use serde::Deserialize;
use serde_json::json;

use amazon_clone_core::{OrderId, OrderStatus, PaymentStatus, UserId};

use super::json_body;
use crate::db::{NoteUpdate, OrderFilter, OrderRepository, StatusChange};
use crate::error::{AppError, Result};
use crate::middleware::{RequireAdmin, RequireSuperAdmin};
use crate::models::ListParams;
use crate::state::AppState;

const NOT_FOUND: &str = "Order not found";
const DEFAULT_REVENUE_DAYS: i32 = 30;
const MAX_REVENUE_DAYS: i32 = 365;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusUpdateRequest {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub tracking_number: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

impl StatusUpdateRequest {
    fn into_change(self) -> Result<StatusChange> {
        let status = self
            .status
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .ok_or_else(|| AppError::BadRequest("Status is required".to_owned()))?
            .parse::<OrderStatus>()
            .map_err(|_| AppError::BadRequest("Invalid order status".to_owned()))?;

        Ok(StatusChange {
            status,
            tracking_number: self
                .tracking_number
                .map(|t| t.trim().to_owned())
                .filter(|t| !t.is_empty()),
            note: self.notes.map_or(NoteUpdate::Keep, NoteUpdate::Replace),
        })
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentUpdateRequest {
    #[serde(default)]
    pub payment_status: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct CancelRequest {
    #[serde(default)]
    pub reason: Option<String>,
}

impl CancelRequest {
    fn into_change(self) -> StatusChange {
        let reason = self
            .reason
            .map(|r| r.trim().to_owned())
            .filter(|r| !r.is_empty())
            .unwrap_or_else(|| "No reason provided".to_owned());
        StatusChange {
            status: OrderStatus::Cancelled,
            tracking_number: None,
            note: NoteUpdate::Append(format!("Cancelled: {reason}")),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct RevenueQuery {
    pub days: Option<i64>,
}

impl RevenueQuery {
    fn days(&self) -> i32 {
        self.days.map_or(DEFAULT_REVENUE_DAYS, |d| {
            i32::try_from(d.clamp(1, i64::from(MAX_REVENUE_DAYS))).unwrap_or(DEFAULT_REVENUE_DAYS)
        })
    }
}

fn not_found() -> AppError {
    AppError::NotFound(NOT_FOUND.to_owned())
}

fn parse_order_id(raw: &str) -> Result<OrderId> {
    raw.parse().map_err(|_| not_found())
}

/// Status filters from the query string. Unknown values are rejected.
fn parse_filter(params: &ListParams) -> Result<OrderFilter<'_>> {
    let status = match params.status.as_deref().filter(|s| !s.is_empty()) {
        Some(raw) => Some(
            raw.parse::<OrderStatus>()
                .map_err(|_| AppError::BadRequest("Invalid order status".to_owned()))?,
        ),
        None => None,
    };
    let payment_status = match params.payment_status.as_deref().filter(|s| !s.is_empty()) {
        Some(raw) => Some(
            raw.parse::<PaymentStatus>()
                .map_err(|_| AppError::BadRequest("Invalid payment status".to_owned()))?,
        ),
        None => None,
    };

    Ok(OrderFilter {
        status,
        payment_status,
        search: params.search(),
    })
}

/// `GET /api/admin/orders`
pub async fn index(
    State(state): State<AppState>,
    _admin: RequireAdmin,
    Query(params): Query<ListParams>,
) -> Result<impl IntoResponse> {
    let filter = parse_filter(&params)?;
    let page = OrderRepository::new(state.pool())
        .list(&filter, &params)
        .await?;

    Ok(Json(json!({
        "status": true,
        "totalPages": page.total_pages(),
        "currentPage": page.page.number,
        "totalOrders": page.total,
        "orders": page.items,
    })))
}

/// `GET /api/admin/orders/{id}`
pub async fn show(
    State(state): State<AppState>,
    _admin: RequireAdmin,
    Path(id): Path<String>,
) -> Result<impl IntoResponse> {
    let order = OrderRepository::new(state.pool())
        .get(parse_order_id(&id)?)
        .await?
        .ok_or_else(not_found)?;

    Ok(Json(json!({ "status": true, "order": order })))
}

/// `GET /api/admin/orders/user/{user_id}`
pub async fn for_user(
    State(state): State<AppState>,
    _admin: RequireAdmin,
    Path(user_id): Path<String>,
) -> Result<impl IntoResponse> {
    let user_id = user_id
        .parse::<UserId>()
        .map_err(|_| AppError::NotFound("User not found".to_owned()))?;
    let orders = OrderRepository::new(state.pool())
        .list_for_user(user_id)
        .await?;

    Ok(Json(json!({ "status": true, "orders": orders })))
}

/// `PUT /api/admin/orders/{id}/status`
pub async fn update_status(
    State(state): State<AppState>,
    RequireAdmin { admin, .. }: RequireAdmin,
    Path(id): Path<String>,
    payload: std::result::Result<Json<StatusUpdateRequest>, JsonRejection>,
) -> Result<impl IntoResponse> {
    let id = parse_order_id(&id)?;
    let change = json_body(payload)?.into_change()?;
    let order = OrderRepository::new(state.pool())
        .update_status(id, &change, Utc::now())
        .await?
        .ok_or_else(not_found)?;
    tracing::info!(admin_id = %admin.id, order_id = %id, status = %change.status, "Order status changed by admin");

    Ok(Json(json!({
        "status": true,
        "message": "Order status updated successfully",
        "order": order,
    })))
}

/// `PUT /api/admin/orders/{id}/payment`
pub async fn update_payment(
    State(state): State<AppState>,
    RequireAdmin { admin, .. }: RequireAdmin,
    Path(id): Path<String>,
    payload: std::result::Result<Json<PaymentUpdateRequest>, JsonRejection>,
) -> Result<impl IntoResponse> {
    let id = parse_order_id(&id)?;
    let status = json_body(payload)?
        .payment_status
        .as_deref()
        .and_then(|s| s.trim().parse::<PaymentStatus>().ok())
        .ok_or_else(|| AppError::BadRequest("Invalid payment status".to_owned()))?;

    let order = OrderRepository::new(state.pool())
        .update_payment_status(id, status)
        .await?
        .ok_or_else(not_found)?;
    tracing::info!(admin_id = %admin.id, order_id = %id, payment_status = %status, "Payment status changed by admin");

    Ok(Json(json!({
        "status": true,
        "message": "Payment status updated successfully",
        "order": order,
    })))
}

/// `POST /api/admin/orders/{id}/cancel`
pub async fn cancel(
    State(state): State<AppState>,
    RequireAdmin { admin, .. }: RequireAdmin,
    Path(id): Path<String>,
    payload: std::result::Result<Json<CancelRequest>, JsonRejection>,
) -> Result<impl IntoResponse> {
    let id = parse_order_id(&id)?;
    let change = json_body(payload)?.into_change();
    let order = OrderRepository::new(state.pool())
        .update_status(id, &change, Utc::now())
        .await?
        .ok_or_else(not_found)?;
    tracing::info!(admin_id = %admin.id, order_id = %id, "Order cancelled by admin");

    Ok(Json(json!({
        "status": true,
        "message": "Order cancelled successfully",
        "order": order,
    })))
}

/// `DELETE /api/admin/orders/{id}`
pub async fn destroy(
    State(state): State<AppState>,
    RequireSuperAdmin(admin): RequireSuperAdmin,
    Path(id): Path<String>,
) -> Result<impl IntoResponse> {
    let id = parse_order_id(&id)?;
    if !OrderRepository::new(state.pool()).delete(id).await? {
        return Err(not_found());
    }
    tracing::warn!(admin_id = %admin.id, order_id = %id, "Order deleted");

    Ok(Json(json!({
        "status": true,
        "message": "Order deleted successfully",
    })))
}

/// `GET /api/admin/stats/orders`
pub async fn stats(
    State(state): State<AppState>,
    _admin: RequireAdmin,
) -> Result<impl IntoResponse> {
    let stats = OrderRepository::new(state.pool()).stats().await?;
    Ok(Json(json!({ "status": true, "stats": stats })))
}

/// `GET /api/admin/analytics/revenue?days=N`
pub async fn revenue(
    State(state): State<AppState>,
    _admin: RequireAdmin,
    Query(query): Query<RevenueQuery>,
) -> Result<impl IntoResponse> {
    let days = query.days();
    let analytics = OrderRepository::new(state.pool())
        .revenue_by_day(days, Utc::now())
        .await?;

    Ok(Json(json!({
        "status": true,
        "days": days,
        "analytics": analytics,
    })))
}
