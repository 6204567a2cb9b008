//! Database row types for the shared storefront tables.
//!
//! The storefront and admin binaries both read `storefront.user`,
//! `storefront.product`, `storefront.cart_item`, `storefront.order` and
//! `storefront.order_line`. Rows are fetched with runtime
//! `sqlx::query_as::<_, Row>` using the column lists below and converted into
//! domain types here, so both binaries agree on the mapping.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::types::Json;

use crate::types::{
    CartLine, CustomerSnapshot, Email, GatewayPayment, Order, OrderId, OrderLine, OrderNumber,
    OrderStatus, OrderedProduct, PaymentMethod, PaymentStatus, PhoneNumber, Product, ProductId,
    ProductSnapshot, ShippingAddress, User, UserId, UserRole,
};

/// A stored value failed domain validation.
#[derive(thiserror::Error, Debug)]
#[error("invalid {field} in database: {reason}")]
pub struct RowError {
    pub field: &'static str,
    pub reason: String,
}

pub const USER_COLUMNS: &str =
    "id, name, email, number, role, is_verified, created_at, updated_at";

pub const PRODUCT_COLUMNS: &str = "product_id, name, url, res_url, price, value, acc_value, \
     discount, mrp, points, created_at, updated_at";

pub const CART_COLUMNS: &str = "product_id, quantity, product_snapshot";

pub const ORDER_COLUMNS: &str = "id, order_number, user_id, user_details, total_amount, \
     order_status, payment_status, payment_method, razorpay_order_id, razorpay_payment_id, \
     razorpay_signature, shipping_address, tracking_number, delivery_date, notes, \
     created_at, updated_at";

pub const ORDER_LINE_COLUMNS: &str =
    "order_id, product_id, product_details, quantity, price_at_purchase";

#[derive(Debug, sqlx::FromRow)]
pub struct UserRow {
    pub id: UserId,
    pub name: String,
    pub email: String,
    pub number: String,
    pub role: UserRole,
    pub is_verified: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<UserRow> for User {
    type Error = RowError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        let email = Email::parse(&row.email).map_err(|e| RowError {
            field: "email",
            reason: e.to_string(),
        })?;
        let number = PhoneNumber::parse(&row.number).map_err(|e| RowError {
            field: "number",
            reason: e.to_string(),
        })?;
        Ok(Self {
            id: row.id,
            name: row.name,
            email,
            number,
            role: row.role,
            is_verified: row.is_verified,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
pub struct ProductRow {
    pub product_id: ProductId,
    pub name: String,
    pub url: String,
    pub res_url: Option<String>,
    pub price: String,
    pub value: Option<Decimal>,
    pub acc_value: Option<Decimal>,
    pub discount: Option<String>,
    pub mrp: Option<String>,
    pub points: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<ProductRow> for Product {
    fn from(row: ProductRow) -> Self {
        Self {
            product_id: row.product_id,
            name: row.name,
            url: row.url,
            res_url: row.res_url,
            price: row.price,
            value: row.value,
            acc_value: row.acc_value,
            discount: row.discount,
            mrp: row.mrp,
            points: row.points,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
pub struct CartRow {
    pub product_id: ProductId,
    pub quantity: i32,
    pub product_snapshot: Json<ProductSnapshot>,
}

impl From<CartRow> for CartLine {
    fn from(row: CartRow) -> Self {
        Self {
            product_id: row.product_id,
            quantity: row.quantity,
            product: row.product_snapshot.0,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
pub struct OrderRow {
    pub id: OrderId,
    pub order_number: String,
    pub user_id: UserId,
    pub user_details: Json<CustomerSnapshot>,
    pub total_amount: Decimal,
    pub order_status: OrderStatus,
    pub payment_status: PaymentStatus,
    pub payment_method: PaymentMethod,
    pub razorpay_order_id: Option<String>,
    pub razorpay_payment_id: Option<String>,
    pub razorpay_signature: Option<String>,
    pub shipping_address: Option<Json<ShippingAddress>>,
    pub tracking_number: Option<String>,
    pub delivery_date: Option<DateTime<Utc>>,
    pub notes: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl OrderRow {
    /// Combine the order row with its lines.
    #[must_use]
    pub fn into_order(self, lines: Vec<OrderLine>) -> Order {
        let gateway = match (
            self.razorpay_order_id,
            self.razorpay_payment_id,
            self.razorpay_signature,
        ) {
            (Some(order_id), Some(payment_id), Some(signature)) => Some(GatewayPayment {
                order_id,
                payment_id,
                signature,
            }),
            _ => None,
        };

        Order {
            id: self.id,
            order_number: OrderNumber::from_stored(self.order_number),
            user_id: self.user_id,
            user_details: self.user_details.0,
            lines,
            total_amount: self.total_amount,
            order_status: self.order_status,
            payment_status: self.payment_status,
            payment_method: self.payment_method,
            gateway,
            shipping_address: self.shipping_address.map(|a| a.0),
            tracking_number: self.tracking_number,
            delivery_date: self.delivery_date,
            notes: self.notes,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
pub struct OrderLineRow {
    pub order_id: OrderId,
    pub product_id: ProductId,
    pub product_details: Json<OrderedProduct>,
    pub quantity: i32,
    pub price_at_purchase: Decimal,
}

impl From<OrderLineRow> for OrderLine {
    fn from(row: OrderLineRow) -> Self {
        Self {
            product_id: row.product_id,
            product_details: row.product_details.0,
            quantity: row.quantity,
            price_at_purchase: row.price_at_purchase,
        }
    }
}

/// Attach fetched lines to their orders, preserving the order of `rows`.
#[must_use]
pub fn assemble_orders(rows: Vec<OrderRow>, lines: Vec<OrderLineRow>) -> Vec<Order> {
    let mut by_order: std::collections::HashMap<OrderId, Vec<OrderLine>> =
        std::collections::HashMap::new();
    for line in lines {
        by_order
            .entry(line.order_id)
            .or_default()
            .push(OrderLine::from(line));
    }
    rows.into_iter()
        .map(|row| {
            let lines = by_order.remove(&row.id).unwrap_or_default();
            row.into_order(lines)
        })
        .collect()
}
