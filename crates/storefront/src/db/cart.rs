//! Persisted carts.

use sqlx::PgPool;
use sqlx::types::Json;

use amazon_clone_core::rows::{CART_COLUMNS, CartRow};
use amazon_clone_core::{CartLine, Product, ProductId, ProductSnapshot, UserId};

use super::RepositoryError;
use crate::store::CartStore;

/// Repository for cart lines.
pub struct CartRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> CartRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }
}

impl CartStore for CartRepository<'_> {
    async fn lines(&self, user_id: UserId) -> Result<Vec<CartLine>, RepositoryError> {
        let rows = sqlx::query_as::<_, CartRow>(&format!(
            "SELECT {CART_COLUMNS} FROM storefront.cart_item WHERE user_id = $1 ORDER BY added_at"
        ))
        .bind(user_id)
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(CartLine::from).collect())
    }

    async fn add(&self, user_id: UserId, product: &Product) -> Result<(), RepositoryError> {
        // The conflict target includes user_id, so an increment only ever
        // touches the caller's own line.
        sqlx::query(
            r"
            INSERT INTO storefront.cart_item (user_id, product_id, quantity, product_snapshot)
            VALUES ($1, $2, 1, $3)
            ON CONFLICT (user_id, product_id)
            DO UPDATE SET quantity = storefront.cart_item.quantity + 1
            ",
        )
        .bind(user_id)
        .bind(product.product_id)
        .bind(Json(ProductSnapshot::from(product)))
        .execute(self.pool)
        .await?;
        Ok(())
    }

    async fn remove(
        &self,
        user_id: UserId,
        product_id: ProductId,
    ) -> Result<bool, RepositoryError> {
        let result =
            sqlx::query("DELETE FROM storefront.cart_item WHERE user_id = $1 AND product_id = $2")
                .bind(user_id)
                .bind(product_id)
                .execute(self.pool)
                .await?;
        Ok(result.rows_affected() > 0)
    }
}
