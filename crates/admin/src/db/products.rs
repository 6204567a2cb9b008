//! Catalog management.

use rust_decimal::Decimal;
use sqlx::{PgPool, Postgres, QueryBuilder};

use amazon_clone_core::rows::{PRODUCT_COLUMNS, ProductRow};
use amazon_clone_core::{Product, ProductId};

use super::{RepositoryError, conflict_or_database, like_pattern};
use crate::models::{ListParams, NewProduct, Paged, ProductPatch, ProductSort, SortOrder};

const DUPLICATE_ID: &str = "Product with this ID already exists";

/// Catalog-wide figures for the stats endpoint.
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductStats {
    pub total_products: i64,
    pub discounted_products: i64,
    /// Mean of the numeric price over products that have one.
    pub average_price: Decimal,
}

/// Repository for catalog management.
pub struct ProductRepository<'a> {
    pool: &'a PgPool,
}

/// `WHERE` clause for a search term: name match, or exact catalog id when the
/// term is numeric.
fn push_search(qb: &mut QueryBuilder<'_, Postgres>, search: Option<&str>) {
    let Some(term) = search else {
        return;
    };
    qb.push(" WHERE (name ILIKE ")
        .push_bind(like_pattern(term));
    if let Ok(id) = term.parse::<i32>() {
        qb.push(" OR product_id = ").push_bind(id);
    }
    qb.push(")");
}

impl<'a> ProductRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// One page of products matching the search.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    #[tracing::instrument(skip(self))]
    pub async fn list(&self, params: &ListParams) -> Result<Paged<Product>, RepositoryError> {
        let page = params.page();
        let sort = ProductSort::parse(params.sort_by.as_deref());
        let order = params.order_or(SortOrder::Asc);

        let mut count = QueryBuilder::new("SELECT COUNT(*) FROM storefront.product");
        push_search(&mut count, params.search());
        let total: i64 = count.build_query_scalar().fetch_one(self.pool).await?;

        let mut select = QueryBuilder::new(format!(
            "SELECT {PRODUCT_COLUMNS} FROM storefront.product"
        ));
        push_search(&mut select, params.search());
        select
            .push(format!(
                " ORDER BY {} {}, product_id LIMIT ",
                sort.column(),
                order.as_sql()
            ))
            .push_bind(page.limit)
            .push(" OFFSET ")
            .push_bind(page.offset());
        let rows: Vec<ProductRow> = select.build_query_as().fetch_all(self.pool).await?;

        Ok(Paged {
            items: rows.into_iter().map(Product::from).collect(),
            total,
            page,
        })
    }

    /// Look up a product by its catalog id.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(&self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
        let row = sqlx::query_as::<_, ProductRow>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM storefront.product WHERE product_id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(Product::from))
    }

    /// Insert a product. A taken catalog id is `RepositoryError::Conflict`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` or `RepositoryError::Database`.
    #[tracing::instrument(skip(self, product), fields(product_id = %product.product_id))]
    pub async fn create(&self, product: &NewProduct) -> Result<Product, RepositoryError> {
        let row = sqlx::query_as::<_, ProductRow>(&format!(
            r"
            INSERT INTO storefront.product (
                product_id, name, url, res_url, price, value, acc_value, discount, mrp, points
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING {PRODUCT_COLUMNS}
            "
        ))
        .bind(product.product_id)
        .bind(&product.name)
        .bind(&product.url)
        .bind(product.res_url.as_deref())
        .bind(&product.price)
        .bind(product.value)
        .bind(product.acc_value)
        .bind(product.discount.as_deref())
        .bind(product.mrp.as_deref())
        .bind(&product.points)
        .fetch_one(self.pool)
        .await
        .map_err(|e| conflict_or_database(e, DUPLICATE_ID))?;

        tracing::info!(product_id = %row.product_id, "Product created");
        Ok(row.into())
    }

    /// Apply a partial update.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    #[tracing::instrument(skip(self, patch))]
    pub async fn update(
        &self,
        id: ProductId,
        patch: &ProductPatch,
    ) -> Result<Option<Product>, RepositoryError> {
        let row = sqlx::query_as::<_, ProductRow>(&format!(
            r"
            UPDATE storefront.product SET
                name = COALESCE($2, name),
                url = COALESCE($3, url),
                res_url = COALESCE($4, res_url),
                price = COALESCE($5, price),
                value = COALESCE($6, value),
                acc_value = COALESCE($7, acc_value),
                discount = COALESCE($8, discount),
                mrp = COALESCE($9, mrp),
                points = COALESCE($10, points),
                updated_at = NOW()
            WHERE product_id = $1
            RETURNING {PRODUCT_COLUMNS}
            "
        ))
        .bind(id)
        .bind(patch.name.as_deref())
        .bind(patch.url.as_deref())
        .bind(patch.res_url.as_deref())
        .bind(patch.price.as_deref())
        .bind(patch.value)
        .bind(patch.acc_value)
        .bind(patch.discount.as_deref())
        .bind(patch.mrp.as_deref())
        .bind(patch.points.as_deref())
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(Product::from))
    }

    /// Delete one product. Existing cart lines and orders keep their snapshots.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn delete(&self, id: ProductId) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM storefront.product WHERE product_id = $1")
            .bind(id)
            .execute(self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Delete every listed product and return how many existed.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn bulk_delete(&self, ids: &[ProductId]) -> Result<u64, RepositoryError> {
        let raw: Vec<i32> = ids.iter().map(ProductId::as_i32).collect();
        let result = sqlx::query("DELETE FROM storefront.product WHERE product_id = ANY($1)")
            .bind(&raw)
            .execute(self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    /// Counts and average price across the catalog.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn stats(&self) -> Result<ProductStats, RepositoryError> {
        let stats = sqlx::query_as::<_, ProductStats>(
            r"
            SELECT
                COUNT(*) AS total_products,
                COUNT(*) FILTER (WHERE discount IS NOT NULL AND discount <> '')
                    AS discounted_products,
                COALESCE(ROUND(AVG(acc_value), 2), 0) AS average_price
            FROM storefront.product
            ",
        )
        .fetch_one(self.pool)
        .await?;
        Ok(stats)
    }
}
