//! Dashboard overview.

use rust_decimal::Decimal;
use sqlx::PgPool;

use amazon_clone_core::Order;

use super::{OrderRepository, RepositoryError};

const RECENT_ORDERS: i64 = 5;

#[derive(Debug, sqlx::FromRow)]
struct Totals {
    total_products: i64,
    total_orders: i64,
    total_users: i64,
    pending_orders: i64,
    total_revenue: Decimal,
}

/// Store-wide totals for the dashboard.
#[derive(Debug, Clone, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub total_products: i64,
    pub total_orders: i64,
    pub total_users: i64,
    pub pending_orders: i64,
    pub total_revenue: Decimal,
    pub recent_orders: Vec<Order>,
}

/// Repository for cross-table aggregates.
pub struct StatsRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> StatsRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    #[tracing::instrument(skip(self))]
    pub async fn dashboard(&self) -> Result<DashboardStats, RepositoryError> {
        let totals = sqlx::query_as::<_, Totals>(
            r"
            SELECT
                (SELECT COUNT(*) FROM storefront.product) AS total_products,
                (SELECT COUNT(*) FROM storefront.order) AS total_orders,
                (SELECT COUNT(*) FROM storefront.user) AS total_users,
                (SELECT COUNT(*) FROM storefront.order WHERE order_status = 'pending')
                    AS pending_orders,
                (SELECT COALESCE(SUM(total_amount), 0) FROM storefront.order
                    WHERE payment_status = 'completed') AS total_revenue
            ",
        )
        .fetch_one(self.pool)
        .await?;

        let recent_orders = OrderRepository::new(self.pool).recent(RECENT_ORDERS).await?;

        Ok(DashboardStats {
            total_products: totals.total_products,
            total_orders: totals.total_orders,
            total_users: totals.total_users,
            pending_orders: totals.pending_orders,
            total_revenue: totals.total_revenue,
            recent_orders,
        })
    }
}
