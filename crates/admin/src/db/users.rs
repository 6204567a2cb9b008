//! Customer account management.

use chrono::{DateTime, Duration, Utc};
use sqlx::{PgPool, Postgres, QueryBuilder};

use amazon_clone_core::rows::{USER_COLUMNS, UserRow};
use amazon_clone_core::{User, UserId};

use super::{RepositoryError, like_pattern};
use crate::models::{ListParams, Paged};

/// Customer figures for the stats endpoint.
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserStats {
    pub total_users: i64,
    pub verified_users: i64,
    pub new_users_last_30_days: i64,
}

fn push_search(qb: &mut QueryBuilder<'_, Postgres>, search: Option<&str>) {
    let Some(term) = search else {
        return;
    };
    let pattern = like_pattern(term);
    qb.push(" WHERE (name ILIKE ")
        .push_bind(pattern.clone())
        .push(" OR email ILIKE ")
        .push_bind(pattern.clone())
        .push(" OR number ILIKE ")
        .push_bind(pattern)
        .push(")");
}

/// Repository for customer accounts.
pub struct UserRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> UserRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// One page of customers, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    #[tracing::instrument(skip(self))]
    pub async fn list(&self, params: &ListParams) -> Result<Paged<User>, RepositoryError> {
        let page = params.page();

        let mut count = QueryBuilder::new("SELECT COUNT(*) FROM storefront.user");
        push_search(&mut count, params.search());
        let total: i64 = count.build_query_scalar().fetch_one(self.pool).await?;

        let mut select = QueryBuilder::new(format!("SELECT {USER_COLUMNS} FROM storefront.user"));
        push_search(&mut select, params.search());
        select
            .push(" ORDER BY created_at DESC, id DESC LIMIT ")
            .push_bind(page.limit)
            .push(" OFFSET ")
            .push_bind(page.offset());
        let rows: Vec<UserRow> = select.build_query_as().fetch_all(self.pool).await?;

        Ok(Paged {
            items: rows
                .into_iter()
                .map(User::try_from)
                .collect::<Result<_, _>>()?,
            total,
            page,
        })
    }

    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(&self, id: UserId) -> Result<Option<User>, RepositoryError> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM storefront.user WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(User::try_from).transpose()?)
    }

    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn order_count(&self, id: UserId) -> Result<i64, RepositoryError> {
        let count = sqlx::query_scalar("SELECT COUNT(*) FROM storefront.order WHERE user_id = $1")
            .bind(id)
            .fetch_one(self.pool)
            .await?;
        Ok(count)
    }

    /// Delete a customer. Their cart, session tokens and orders go with them.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    #[tracing::instrument(skip(self))]
    pub async fn delete(&self, id: UserId) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM storefront.user WHERE id = $1")
            .bind(id)
            .execute(self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn stats(&self, now: DateTime<Utc>) -> Result<UserStats, RepositoryError> {
        let stats = sqlx::query_as::<_, UserStats>(
            r"
            SELECT
                COUNT(*) AS total_users,
                COUNT(*) FILTER (WHERE is_verified) AS verified_users,
                COUNT(*) FILTER (WHERE created_at >= $1) AS new_users_last_30_days
            FROM storefront.user
            ",
        )
        .bind(now - Duration::days(30))
        .fetch_one(self.pool)
        .await?;
        Ok(stats)
    }
}
