//! Ledger entry queries

use super::models::Entry;
use sqlx::PgExecutor;

pub struct EntryQueries;

impl EntryQueries {
    /// Record a signed entry against an account
    pub async fn create(
        exec: impl PgExecutor<'_>,
        account_id: i64,
        amount: i64,
    ) -> Result<Entry, sqlx::Error> {
        sqlx::query_as(
            r#"INSERT INTO entries (account_id, amount)
               VALUES ($1, $2)
               RETURNING id, account_id, amount, created_at"#,
        )
        .bind(account_id)
        .bind(amount)
        .fetch_one(exec)
        .await
    }

    /// Get entry by ID
    pub async fn get(exec: impl PgExecutor<'_>, id: i64) -> Result<Option<Entry>, sqlx::Error> {
        sqlx::query_as(
            r#"SELECT id, account_id, amount, created_at
               FROM entries WHERE id = $1"#,
        )
        .bind(id)
        .fetch_optional(exec)
        .await
    }

    /// List entries for an account in insertion order
    pub async fn list(
        exec: impl PgExecutor<'_>,
        account_id: i64,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Entry>, sqlx::Error> {
        sqlx::query_as(
            r#"SELECT id, account_id, amount, created_at
               FROM entries
               WHERE account_id = $1
               ORDER BY id
               LIMIT $2 OFFSET $3"#,
        )
        .bind(account_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(exec)
        .await
    }
}
