//! Order management.
//!
//! Status changes lock the order row, run the lifecycle rule from
//! [`OrderStatus::transition`] against the locked values, and write the
//! result in the same transaction.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use sqlx::{PgPool, Postgres, QueryBuilder};
use thiserror::Error;

use amazon_clone_core::rows::{
    ORDER_COLUMNS, ORDER_LINE_COLUMNS, OrderLineRow, OrderRow, assemble_orders,
};
use amazon_clone_core::{Order, OrderId, OrderStatus, PaymentStatus, TransitionError, UserId};

use super::{RepositoryError, like_pattern};
use crate::models::{ListParams, OrderSort, Paged, SortOrder};

/// Why a status change was not applied.
#[derive(Debug, Error)]
pub enum OrderUpdateError {
    #[error(transparent)]
    Repository(#[from] RepositoryError),
    #[error(transparent)]
    Transition(#[from] TransitionError),
}

impl From<sqlx::Error> for OrderUpdateError {
    fn from(err: sqlx::Error) -> Self {
        Self::Repository(err.into())
    }
}

/// Filters for the order list.
#[derive(Debug, Clone, Copy, Default)]
pub struct OrderFilter<'a> {
    pub status: Option<OrderStatus>,
    pub payment_status: Option<PaymentStatus>,
    /// Matched against the order number and the customer's name and email.
    pub search: Option<&'a str>,
}

/// What happens to the order's free-text notes.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum NoteUpdate {
    #[default]
    Keep,
    Replace(String),
    /// Add a line after any existing notes.
    Append(String),
}

/// A requested fulfillment status change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusChange {
    pub status: OrderStatus,
    pub tracking_number: Option<String>,
    pub note: NoteUpdate,
}

/// Order counts and revenue.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderStats {
    pub total_orders: i64,
    /// Count per fulfillment status, zero-filled.
    pub by_status: Vec<StatusCount>,
    /// Sum of order totals with a completed payment.
    pub total_revenue: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow, serde::Serialize)]
pub struct StatusCount {
    pub status: OrderStatus,
    pub count: i64,
}

/// Completed-payment revenue for one calendar day (UTC).
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow, serde::Serialize)]
pub struct DailyRevenue {
    pub date: NaiveDate,
    pub revenue: Decimal,
    pub orders: i64,
}

#[derive(Debug, sqlx::FromRow)]
struct LockedOrder {
    order_status: OrderStatus,
    payment_status: PaymentStatus,
}

fn push_filter(qb: &mut QueryBuilder<'_, Postgres>, filter: &OrderFilter<'_>) {
    let mut sep = " WHERE ";
    if let Some(status) = filter.status {
        qb.push(sep).push("o.order_status = ").push_bind(status);
        sep = " AND ";
    }
    if let Some(payment) = filter.payment_status {
        qb.push(sep).push("o.payment_status = ").push_bind(payment);
        sep = " AND ";
    }
    if let Some(term) = filter.search {
        let pattern = like_pattern(term);
        qb.push(sep)
            .push("(o.order_number ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR o.user_details->>'name' ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR o.user_details->>'email' ILIKE ")
            .push_bind(pattern)
            .push(")");
    }
}

/// Repository for order management.
pub struct OrderRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> OrderRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    async fn with_lines(&self, rows: Vec<OrderRow>) -> Result<Vec<Order>, RepositoryError> {
        if rows.is_empty() {
            return Ok(Vec::new());
        }
        let ids: Vec<i32> = rows.iter().map(|r| r.id.as_i32()).collect();
        let lines = sqlx::query_as::<_, OrderLineRow>(&format!(
            "SELECT {ORDER_LINE_COLUMNS} FROM storefront.order_line \
             WHERE order_id = ANY($1) ORDER BY order_id, position"
        ))
        .bind(&ids)
        .fetch_all(self.pool)
        .await?;
        Ok(assemble_orders(rows, lines))
    }

    async fn single(&self, row: Option<OrderRow>) -> Result<Option<Order>, RepositoryError> {
        Ok(match row {
            Some(row) => self.with_lines(vec![row]).await?.pop(),
            None => None,
        })
    }

    /// One page of orders matching the filter.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    #[tracing::instrument(skip(self, params))]
    pub async fn list(
        &self,
        filter: &OrderFilter<'_>,
        params: &ListParams,
    ) -> Result<Paged<Order>, RepositoryError> {
        let page = params.page();
        let sort = OrderSort::parse(params.sort_by.as_deref());
        let order = params.order_or(SortOrder::Desc);

        let mut count = QueryBuilder::new("SELECT COUNT(*) FROM storefront.order o");
        push_filter(&mut count, filter);
        let total: i64 = count.build_query_scalar().fetch_one(self.pool).await?;

        let mut select = QueryBuilder::new(format!(
            "SELECT {ORDER_COLUMNS} FROM storefront.order o"
        ));
        push_filter(&mut select, filter);
        select
            .push(format!(
                " ORDER BY {} {}, o.id DESC LIMIT ",
                sort.column(),
                order.as_sql()
            ))
            .push_bind(page.limit)
            .push(" OFFSET ")
            .push_bind(page.offset());
        let rows: Vec<OrderRow> = select.build_query_as().fetch_all(self.pool).await?;

        Ok(Paged {
            items: self.with_lines(rows).await?,
            total,
            page,
        })
    }

    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(&self, id: OrderId) -> Result<Option<Order>, RepositoryError> {
        let row = sqlx::query_as::<_, OrderRow>(&format!(
            "SELECT {ORDER_COLUMNS} FROM storefront.order WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;
        self.single(row).await
    }

    /// A customer's orders, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_for_user(&self, user_id: UserId) -> Result<Vec<Order>, RepositoryError> {
        let rows = sqlx::query_as::<_, OrderRow>(&format!(
            "SELECT {ORDER_COLUMNS} FROM storefront.order \
             WHERE user_id = $1 ORDER BY created_at DESC"
        ))
        .bind(user_id)
        .fetch_all(self.pool)
        .await?;
        self.with_lines(rows).await
    }

    /// The most recently placed orders.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn recent(&self, limit: i64) -> Result<Vec<Order>, RepositoryError> {
        let rows = sqlx::query_as::<_, OrderRow>(&format!(
            "SELECT {ORDER_COLUMNS} FROM storefront.order ORDER BY created_at DESC, id DESC LIMIT $1"
        ))
        .bind(limit)
        .fetch_all(self.pool)
        .await?;
        self.with_lines(rows).await
    }

    /// Apply a fulfillment status change if the lifecycle allows it.
    ///
    /// Moving to delivered stamps the delivery date.
    ///
    /// # Errors
    ///
    /// Returns `OrderUpdateError::Transition` when the change is forbidden.
    #[tracing::instrument(skip(self, change), fields(status = %change.status))]
    pub async fn update_status(
        &self,
        id: OrderId,
        change: &StatusChange,
        now: DateTime<Utc>,
    ) -> Result<Option<Order>, OrderUpdateError> {
        let mut tx = self.pool.begin().await?;

        let Some(current) = sqlx::query_as::<_, LockedOrder>(
            "SELECT order_status, payment_status FROM storefront.order WHERE id = $1 FOR UPDATE",
        )
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?
        else {
            return Ok(None);
        };

        let effects = current
            .order_status
            .transition(change.status, current.payment_status)?;
        let delivery_date = effects.stamp_delivery_date.then_some(now);

        let (note_mode, note) = match &change.note {
            NoteUpdate::Keep => ("keep", None),
            NoteUpdate::Replace(text) => ("replace", Some(text.as_str())),
            NoteUpdate::Append(text) => ("append", Some(text.as_str())),
        };

        let row = sqlx::query_as::<_, OrderRow>(&format!(
            r"
            UPDATE storefront.order SET
                order_status = $2,
                tracking_number = COALESCE($3, tracking_number),
                delivery_date = COALESCE($4, delivery_date),
                notes = CASE $5
                    WHEN 'replace' THEN $6
                    WHEN 'append' THEN
                        CASE WHEN notes = '' THEN $6 ELSE notes || E'\n' || $6 END
                    ELSE notes
                END,
                updated_at = $7
            WHERE id = $1
            RETURNING {ORDER_COLUMNS}
            "
        ))
        .bind(id)
        .bind(change.status)
        .bind(change.tracking_number.as_deref())
        .bind(delivery_date)
        .bind(note_mode)
        .bind(note)
        .bind(now)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        tracing::info!(
            order_id = %id,
            from = %current.order_status,
            to = %change.status,
            "Order status updated"
        );
        Ok(self.single(Some(row)).await?)
    }

    /// Set the payment status.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    #[tracing::instrument(skip(self))]
    pub async fn update_payment_status(
        &self,
        id: OrderId,
        status: PaymentStatus,
    ) -> Result<Option<Order>, RepositoryError> {
        let row = sqlx::query_as::<_, OrderRow>(&format!(
            r"
            UPDATE storefront.order SET payment_status = $2, updated_at = NOW()
            WHERE id = $1
            RETURNING {ORDER_COLUMNS}
            "
        ))
        .bind(id)
        .bind(status)
        .fetch_optional(self.pool)
        .await?;
        self.single(row).await
    }

    /// Delete an order and its lines.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn delete(&self, id: OrderId) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM storefront.order WHERE id = $1")
            .bind(id)
            .execute(self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Counts per status and completed-payment revenue.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn stats(&self) -> Result<OrderStats, RepositoryError> {
        let counted = sqlx::query_as::<_, StatusCount>(
            "SELECT order_status AS status, COUNT(*) AS count \
             FROM storefront.order GROUP BY order_status",
        )
        .fetch_all(self.pool)
        .await?;

        let total_revenue: Decimal = sqlx::query_scalar(
            "SELECT COALESCE(SUM(total_amount), 0) FROM storefront.order \
             WHERE payment_status = 'completed'",
        )
        .fetch_one(self.pool)
        .await?;

        let by_status: Vec<StatusCount> = OrderStatus::ALL
            .iter()
            .map(|&status| StatusCount {
                status,
                count: counted
                    .iter()
                    .find(|c| c.status == status)
                    .map_or(0, |c| c.count),
            })
            .collect();

        Ok(OrderStats {
            total_orders: by_status.iter().map(|c| c.count).sum(),
            by_status,
            total_revenue,
        })
    }

    /// Daily completed-payment revenue for the last `days` days.
    ///
    /// Days without completed orders are omitted.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn revenue_by_day(
        &self,
        days: i32,
        now: DateTime<Utc>,
    ) -> Result<Vec<DailyRevenue>, RepositoryError> {
        let rows = sqlx::query_as::<_, DailyRevenue>(
            r"
            SELECT
                (created_at AT TIME ZONE 'UTC')::date AS date,
                SUM(total_amount) AS revenue,
                COUNT(*) AS orders
            FROM storefront.order
            WHERE payment_status = 'completed'
              AND created_at >= $1 - make_interval(days => $2)
            GROUP BY 1
            ORDER BY 1
            ",
        )
        .bind(now)
        .bind(days)
        .fetch_all(self.pool)
        .await?;
        Ok(rows)
    }
}
