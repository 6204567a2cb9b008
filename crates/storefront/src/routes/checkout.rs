//! Payment orders and order placement.
//!
//! Amounts are always computed from the persisted cart. A client-submitted
//! `amount` is only compared against that figure.

use std::str::FromStr;

use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
    response::IntoResponse,
};
use chrono::Utc;
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer};
use serde_json::{Value, json};

use amazon_clone_core::{GatewayPayment, ShippingAddress};

use super::json_body;
use crate::db::{CartRepository, OrderRepository};
use crate::error::Result;
use crate::middleware::RequireUser;
use crate::services::checkout::CheckoutService;
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct CreateOrderRequest {
    /// Amount the client expects to pay, in major units.
    #[serde(default, deserialize_with = "optional_amount")]
    pub amount: Option<Decimal>,
}

#[derive(Debug, Deserialize)]
pub struct VerifyPaymentRequest {
    pub razorpay_order_id: String,
    pub razorpay_payment_id: String,
    pub razorpay_signature: String,
    #[serde(default, rename = "shippingAddress")]
    pub shipping_address: Option<ShippingAddress>,
}

#[derive(Debug, Default, Deserialize)]
pub struct PlaceOrderRequest {
    #[serde(default, rename = "shippingAddress")]
    pub shipping_address: Option<ShippingAddress>,
}

/// Accept `amount` as a JSON number or a numeric string.
fn optional_amount<'de, D>(deserializer: D) -> std::result::Result<Option<Decimal>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => return Ok(None),
        Some(Value::Number(n)) => n.to_string(),
        Some(Value::String(s)) => s,
        Some(other) => {
            return Err(serde::de::Error::custom(format!(
                "amount must be a number, got {other}"
            )));
        }
    };
    Decimal::from_str(raw.trim())
        .or_else(|_| Decimal::from_scientific(raw.trim()))
        .map(Some)
        .map_err(serde::de::Error::custom)
}

/// Bodies that may be omitted entirely.
fn optional_body<T: Default>(payload: std::result::Result<Json<T>, JsonRejection>) -> Result<T> {
    match payload {
        Err(JsonRejection::MissingJsonContentType(_)) => Ok(T::default()),
        other => json_body(other),
    }
}

/// `POST /api/create-order`
pub async fn create_order(
    State(state): State<AppState>,
    RequireUser { user, .. }: RequireUser,
    payload: std::result::Result<Json<CreateOrderRequest>, JsonRejection>,
) -> Result<impl IntoResponse> {
    let request = optional_body(payload)?;
    let carts = CartRepository::new(state.pool());
    let orders = OrderRepository::new(state.pool());

    let payment = CheckoutService::new(&carts, &orders, state.razorpay())
        .create_payment_order(&user, request.amount, Utc::now())
        .await?;

    Ok(Json(json!({
        "status": true,
        "order": payment.order,
        "orderNumber": payment.order_number,
        "amount": payment.total.major(),
        "key": state.config().razorpay.key_id,
    })))
}

/// `POST /api/verify-payment`
pub async fn verify_payment(
    State(state): State<AppState>,
    RequireUser { user, .. }: RequireUser,
    payload: std::result::Result<Json<VerifyPaymentRequest>, JsonRejection>,
) -> Result<impl IntoResponse> {
    let request = json_body(payload)?;
    let carts = CartRepository::new(state.pool());
    let orders = OrderRepository::new(state.pool());

    let payment = GatewayPayment {
        order_id: request.razorpay_order_id,
        payment_id: request.razorpay_payment_id,
        signature: request.razorpay_signature,
    };
    let order = CheckoutService::new(&carts, &orders, state.razorpay())
        .confirm_payment(&user, payment, request.shipping_address, Utc::now())
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "status": true,
            "message": "Payment verified and order placed",
            "order": order,
        })),
    ))
}

/// `POST /api/place-order-cod`
pub async fn place_order_cod(
    State(state): State<AppState>,
    RequireUser { user, .. }: RequireUser,
    payload: std::result::Result<Json<PlaceOrderRequest>, JsonRejection>,
) -> Result<impl IntoResponse> {
    let request = optional_body(payload)?;
    let carts = CartRepository::new(state.pool());
    let orders = OrderRepository::new(state.pool());

    let order = CheckoutService::new(&carts, &orders, state.razorpay())
        .place_cod(&user, request.shipping_address, Utc::now())
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "status": true,
            "message": "Order placed successfully",
            "order": order,
        })),
    ))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_amount_accepts_number_and_string() {
        let from_number: CreateOrderRequest = serde_json::from_str(r#"{"amount": 2500}"#).unwrap();
        assert_eq!(from_number.amount, Some(Decimal::from(2500)));

        let from_float: CreateOrderRequest =
            serde_json::from_str(r#"{"amount": 2500.50}"#).unwrap();
        assert_eq!(from_float.amount, Some(Decimal::new(250_050, 2)));

        let from_string: CreateOrderRequest =
            serde_json::from_str(r#"{"amount": "1"}"#).unwrap();
        assert_eq!(from_string.amount, Some(Decimal::ONE));
    }

    #[test]
    fn test_amount_is_optional() {
        let empty: CreateOrderRequest = serde_json::from_str("{}").unwrap();
        assert!(empty.amount.is_none());
        let null: CreateOrderRequest = serde_json::from_str(r#"{"amount": null}"#).unwrap();
        assert!(null.amount.is_none());
        assert!(serde_json::from_str::<CreateOrderRequest>(r#"{"amount": [1]}"#).is_err());
    }

    #[test]
    fn test_verify_payment_field_names() {
        let request: VerifyPaymentRequest = serde_json::from_str(
            r#"{"razorpay_order_id":"order_1","razorpay_payment_id":"pay_1","razorpay_signature":"ab"}"#,
        )
        .unwrap();
        assert_eq!(request.razorpay_payment_id, "pay_1");
        assert!(request.shipping_address.is_none());
    }
}
