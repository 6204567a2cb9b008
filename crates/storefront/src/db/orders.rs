//! Order placement and history.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use sqlx::types::Json;

use amazon_clone_core::rows::{
    ORDER_COLUMNS, ORDER_LINE_COLUMNS, OrderLineRow, OrderRow, assemble_orders,
};
use amazon_clone_core::{NewOrder, Order, OrderNumber, UserId};

use super::{RepositoryError, conflict_or_database};
use crate::models::PaymentIntent;
use crate::store::OrderStore;

#[derive(Debug, sqlx::FromRow)]
struct PaymentIntentRow {
    gateway_order_id: String,
    user_id: UserId,
    order_number: String,
    amount_minor: i64,
    created_at: DateTime<Utc>,
}

impl From<PaymentIntentRow> for PaymentIntent {
    fn from(row: PaymentIntentRow) -> Self {
        Self {
            gateway_order_id: row.gateway_order_id,
            user_id: row.user_id,
            order_number: OrderNumber::from_stored(row.order_number),
            amount_minor: row.amount_minor,
            created_at: row.created_at,
        }
    }
}

/// Repository for customer orders.
pub struct OrderRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> OrderRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    async fn lines_for(&self, ids: &[i32]) -> Result<Vec<OrderLineRow>, RepositoryError> {
        let rows = sqlx::query_as::<_, OrderLineRow>(&format!(
            "SELECT {ORDER_LINE_COLUMNS} FROM storefront.order_line \
             WHERE order_id = ANY($1) ORDER BY order_id, position"
        ))
        .bind(ids)
        .fetch_all(self.pool)
        .await?;
        Ok(rows)
    }
}

impl OrderStore for OrderRepository<'_> {
    #[tracing::instrument(skip(self, order), fields(order_number = %order.order_number))]
    async fn place(&self, order: &NewOrder) -> Result<Order, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let (razorpay_order_id, razorpay_payment_id, razorpay_signature) =
            match order.gateway.as_ref() {
                Some(g) => (
                    Some(g.order_id.as_str()),
                    Some(g.payment_id.as_str()),
                    Some(g.signature.as_str()),
                ),
                None => (None, None, None),
            };

        let row = sqlx::query_as::<_, OrderRow>(&format!(
            r"
            INSERT INTO storefront.order (
                order_number, user_id, user_details, total_amount, payment_status,
                payment_method, razorpay_order_id, razorpay_payment_id, razorpay_signature,
                shipping_address
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING {ORDER_COLUMNS}
            "
        ))
        .bind(order.order_number.as_str())
        .bind(order.user_id)
        .bind(Json(&order.user_details))
        .bind(order.total_amount)
        .bind(order.payment_status)
        .bind(order.payment_method)
        .bind(razorpay_order_id)
        .bind(razorpay_payment_id)
        .bind(razorpay_signature)
        .bind(order.shipping_address.as_ref().map(Json))
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| conflict_or_database(e, "Order already exists for this payment"))?;

        let mut lines = Vec::with_capacity(order.lines.len());
        for (position, line) in (0_i32..).zip(&order.lines) {
            let stored = sqlx::query_as::<_, OrderLineRow>(&format!(
                r"
                INSERT INTO storefront.order_line (
                    order_id, position, product_id, product_details, quantity, price_at_purchase
                )
                VALUES ($1, $2, $3, $4, $5, $6)
                RETURNING {ORDER_LINE_COLUMNS}
                "
            ))
            .bind(row.id)
            .bind(position)
            .bind(line.product_id)
            .bind(Json(&line.product_details))
            .bind(line.quantity)
            .bind(line.price_at_purchase)
            .fetch_one(&mut *tx)
            .await?;
            lines.push(stored.into());
        }

        sqlx::query("DELETE FROM storefront.cart_item WHERE user_id = $1")
            .bind(order.user_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        tracing::info!(order_id = %row.id, user_id = %order.user_id, "Order placed");
        Ok(row.into_order(lines))
    }

    async fn list_for_user(&self, user_id: UserId) -> Result<Vec<Order>, RepositoryError> {
        let rows = sqlx::query_as::<_, OrderRow>(&format!(
            "SELECT {ORDER_COLUMNS} FROM storefront.order \
             WHERE user_id = $1 ORDER BY created_at DESC"
        ))
        .bind(user_id)
        .fetch_all(self.pool)
        .await?;

        let ids: Vec<i32> = rows.iter().map(|r| r.id.as_i32()).collect();
        let lines = self.lines_for(&ids).await?;
        Ok(assemble_orders(rows, lines))
    }

    #[tracing::instrument(skip(self, intent), fields(gateway_order_id = %intent.gateway_order_id))]
    async fn record_payment_intent(&self, intent: &PaymentIntent) -> Result<(), RepositoryError> {
        sqlx::query(
            r"
            INSERT INTO storefront.payment_intent
                (gateway_order_id, user_id, order_number, amount_minor, created_at)
            VALUES ($1, $2, $3, $4, $5)
            ",
        )
        .bind(&intent.gateway_order_id)
        .bind(intent.user_id)
        .bind(intent.order_number.as_str())
        .bind(intent.amount_minor)
        .bind(intent.created_at)
        .execute(self.pool)
        .await
        .map_err(|e| conflict_or_database(e, "Payment order already recorded"))?;
        Ok(())
    }

    async fn find_payment_intent(
        &self,
        user_id: UserId,
        gateway_order_id: &str,
    ) -> Result<Option<PaymentIntent>, RepositoryError> {
        let row = sqlx::query_as::<_, PaymentIntentRow>(
            r"
            SELECT gateway_order_id, user_id, order_number, amount_minor, created_at
            FROM storefront.payment_intent
            WHERE gateway_order_id = $1 AND user_id = $2
            ",
        )
        .bind(gateway_order_id)
        .bind(user_id)
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(PaymentIntent::from))
    }
}
