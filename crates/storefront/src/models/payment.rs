//! Gateway orders awaiting payment.

use chrono::{DateTime, Utc};

use amazon_clone_core::{OrderNumber, UserId};

/// A gateway order created for one customer's cart.
///
/// A verified payment settles only the intent it was made against, and only
/// while the cart still prices to the amount the gateway collected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentIntent {
    pub gateway_order_id: String,
    pub user_id: UserId,
    /// Number the order will carry once paid; sent to the gateway as the receipt.
    pub order_number: OrderNumber,
    /// Amount the gateway was asked to collect, in paise.
    pub amount_minor: i64,
    pub created_at: DateTime<Utc>,
}
