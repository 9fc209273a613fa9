//! Account queries

use super::models::Account;
use sqlx::PgExecutor;

/// Parameters for creating an account
#[derive(Debug, Clone)]
pub struct CreateAccountParams {
    pub owner: String,
    pub balance: i64,
    pub currency: String,
}

/// Account repository. Every function takes an executor so the same query
/// runs against the pool or inside an open transaction.
pub struct AccountQueries;

impl AccountQueries {
    /// Create a new account
    pub async fn create(
        exec: impl PgExecutor<'_>,
        arg: &CreateAccountParams,
    ) -> Result<Account, sqlx::Error> {
        sqlx::query_as(
            r#"INSERT INTO accounts (owner, balance, currency)
               VALUES ($1, $2, $3)
               RETURNING id, owner, balance, currency, account_number, created_at"#,
        )
        .bind(&arg.owner)
        .bind(arg.balance)
        .bind(&arg.currency)
        .fetch_one(exec)
        .await
    }

    /// Get account by ID
    pub async fn get(exec: impl PgExecutor<'_>, id: i64) -> Result<Option<Account>, sqlx::Error> {
        sqlx::query_as(
            r#"SELECT id, owner, balance, currency, account_number, created_at
               FROM accounts WHERE id = $1"#,
        )
        .bind(id)
        .fetch_optional(exec)
        .await
    }

    /// List accounts for an owner, newest id last
    pub async fn list(
        exec: impl PgExecutor<'_>,
        owner: &str,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Account>, sqlx::Error> {
        sqlx::query_as(
            r#"SELECT id, owner, balance, currency, account_number, created_at
               FROM accounts
               WHERE owner = $1
               ORDER BY id
               LIMIT $2 OFFSET $3"#,
        )
        .bind(owner)
        .bind(limit)
        .bind(offset)
        .fetch_all(exec)
        .await
    }

    /// Apply a signed delta to an account balance and return the updated row.
    ///
    /// The UPDATE takes the row lock; callers composing a two-account move
    /// must invoke this smaller-id-first so concurrent opposite-direction
    /// transfers cannot form a wait cycle.
    pub async fn add_balance(
        exec: impl PgExecutor<'_>,
        id: i64,
        delta: i64,
    ) -> Result<Option<Account>, sqlx::Error> {
        sqlx::query_as(
            r#"UPDATE accounts
               SET balance = balance + $1
               WHERE id = $2
               RETURNING id, owner, balance, currency, account_number, created_at"#,
        )
        .bind(delta)
        .bind(id)
        .fetch_optional(exec)
        .await
    }
}
