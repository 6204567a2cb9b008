//! Orders and the denormalized data captured when they are placed.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::catalog::{CartLine, ProductSnapshot};
use super::id::{OrderId, ProductId, UserId};
use super::order_number::OrderNumber;
use super::price::PriceError;
use super::status::{OrderStatus, PaymentMethod, PaymentStatus};

/// Customer details copied onto the order at purchase time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomerSnapshot {
    pub name: String,
    pub email: String,
    pub number: String,
}

fn default_country() -> String {
    "India".to_owned()
}

/// Delivery address supplied at checkout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShippingAddress {
    #[serde(default)]
    pub street: String,
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub state: String,
    #[serde(default)]
    pub pincode: String,
    #[serde(default = "default_country")]
    pub country: String,
}

/// The subset of product fields frozen onto an order line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderedProduct {
    pub name: String,
    pub url: String,
    pub price: String,
    #[serde(default)]
    pub discount: Option<String>,
}

impl From<&ProductSnapshot> for OrderedProduct {
    fn from(snapshot: &ProductSnapshot) -> Self {
        Self {
            name: snapshot.name.clone(),
            url: snapshot.url.clone(),
            price: snapshot.price.clone(),
            discount: snapshot.discount.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderLine {
    pub product_id: ProductId,
    pub product_details: OrderedProduct,
    pub quantity: i32,
    pub price_at_purchase: Decimal,
}

impl OrderLine {
    /// Freeze a cart line, pricing it with the same rule used for totals.
    ///
    /// # Errors
    ///
    /// Returns a [`PriceError`] if the line cannot be priced.
    pub fn from_cart_line(line: &CartLine) -> Result<Self, PriceError> {
        Ok(Self {
            product_id: line.product_id,
            product_details: OrderedProduct::from(&line.product),
            quantity: line.quantity,
            price_at_purchase: line.priced().unit_price()?,
        })
    }
}

/// Identifiers returned by the payment gateway for an online payment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GatewayPayment {
    pub order_id: String,
    pub payment_id: String,
    pub signature: String,
}

/// A placed order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: OrderId,
    pub order_number: OrderNumber,
    pub user_id: UserId,
    pub user_details: CustomerSnapshot,
    pub lines: Vec<OrderLine>,
    pub total_amount: Decimal,
    pub order_status: OrderStatus,
    pub payment_status: PaymentStatus,
    pub payment_method: PaymentMethod,
    pub gateway: Option<GatewayPayment>,
    pub shipping_address: Option<ShippingAddress>,
    pub tracking_number: Option<String>,
    pub delivery_date: Option<DateTime<Utc>>,
    pub notes: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Everything needed to insert an order.
#[derive(Debug, Clone)]
pub struct NewOrder {
    pub order_number: OrderNumber,
    pub user_id: UserId,
    pub user_details: CustomerSnapshot,
    pub lines: Vec<OrderLine>,
    pub total_amount: Decimal,
    pub payment_status: PaymentStatus,
    pub payment_method: PaymentMethod,
    pub gateway: Option<GatewayPayment>,
    pub shipping_address: Option<ShippingAddress>,
}
