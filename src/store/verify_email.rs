//! Email verification record queries

use super::models::VerifyEmail;
use sqlx::PgExecutor;

/// Verification records expire this long after issuance.
pub const VERIFY_EMAIL_TTL_MINUTES: i64 = 15;

/// Parameters for issuing a verification record
#[derive(Debug, Clone)]
pub struct CreateVerifyEmailParams {
    pub username: String,
    pub email: String,
    pub secret_code: String,
}

pub struct VerifyEmailQueries;

impl VerifyEmailQueries {
    /// Issue a new verification record
    pub async fn create(
        exec: impl PgExecutor<'_>,
        arg: &CreateVerifyEmailParams,
    ) -> Result<VerifyEmail, sqlx::Error> {
        sqlx::query_as(
            r#"INSERT INTO verify_emails (username, email, secret_code, expired_at)
               VALUES ($1, $2, $3, now() + make_interval(mins => $4))
               RETURNING id, username, email, secret_code, is_used, created_at, expired_at"#,
        )
        .bind(&arg.username)
        .bind(&arg.email)
        .bind(&arg.secret_code)
        .bind(VERIFY_EMAIL_TTL_MINUTES as i32)
        .fetch_one(exec)
        .await
    }

    /// Consume a verification record.
    ///
    /// The predicate matches on id AND code AND not-yet-used AND not-expired,
    /// so the same record can never be consumed twice: the row this UPDATE
    /// returned once will not match again. Returns None when nothing matched,
    /// without distinguishing which condition failed.
    pub async fn consume(
        exec: impl PgExecutor<'_>,
        id: i64,
        secret_code: &str,
    ) -> Result<Option<VerifyEmail>, sqlx::Error> {
        sqlx::query_as(
            r#"UPDATE verify_emails
               SET is_used = true
               WHERE id = $1
                 AND secret_code = $2
                 AND is_used = false
                 AND expired_at > now()
               RETURNING id, username, email, secret_code, is_used, created_at, expired_at"#,
        )
        .bind(id)
        .bind(secret_code)
        .fetch_optional(exec)
        .await
    }
}
