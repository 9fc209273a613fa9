//! Transfer record queries

use super::models::Transfer;
use sqlx::PgExecutor;

/// Parameters for recording a transfer
#[derive(Debug, Clone, Copy)]
pub struct CreateTransferParams {
    pub from_account_id: i64,
    pub to_account_id: i64,
    pub amount: i64,
}

pub struct TransferQueries;

impl TransferQueries {
    /// Record a transfer row
    pub async fn create(
        exec: impl PgExecutor<'_>,
        arg: &CreateTransferParams,
    ) -> Result<Transfer, sqlx::Error> {
        sqlx::query_as(
            r#"INSERT INTO transfers (from_account_id, to_account_id, amount)
               VALUES ($1, $2, $3)
               RETURNING id, from_account_id, to_account_id, amount, created_at"#,
        )
        .bind(arg.from_account_id)
        .bind(arg.to_account_id)
        .bind(arg.amount)
        .fetch_one(exec)
        .await
    }

    /// Get transfer by ID
    pub async fn get(exec: impl PgExecutor<'_>, id: i64) -> Result<Option<Transfer>, sqlx::Error> {
        sqlx::query_as(
            r#"SELECT id, from_account_id, to_account_id, amount, created_at
               FROM transfers WHERE id = $1"#,
        )
        .bind(id)
        .fetch_optional(exec)
        .await
    }

    /// List transfers touching either of the two accounts, in insertion order
    pub async fn list(
        exec: impl PgExecutor<'_>,
        from_account_id: i64,
        to_account_id: i64,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Transfer>, sqlx::Error> {
        sqlx::query_as(
            r#"SELECT id, from_account_id, to_account_id, amount, created_at
               FROM transfers
               WHERE from_account_id = $1 OR to_account_id = $2
               ORDER BY id
               LIMIT $3 OFFSET $4"#,
        )
        .bind(from_account_id)
        .bind(to_account_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(exec)
        .await
    }
}
