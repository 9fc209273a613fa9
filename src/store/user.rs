//! User queries

use super::models::User;
use sqlx::PgExecutor;

/// Parameters for creating a user. The password arrives already hashed;
/// credential hashing lives outside the store.
#[derive(Debug, Clone)]
pub struct CreateUserParams {
    pub username: String,
    pub hashed_password: String,
    pub full_name: String,
    pub email: String,
}

pub struct UserQueries;

impl UserQueries {
    /// Create a new user
    pub async fn create(
        exec: impl PgExecutor<'_>,
        arg: &CreateUserParams,
    ) -> Result<User, sqlx::Error> {
        sqlx::query_as(
            r#"INSERT INTO users (username, hashed_password, full_name, email)
               VALUES ($1, $2, $3, $4)
               RETURNING username, hashed_password, full_name, email,
                         is_email_verified, password_changed_at, created_at"#,
        )
        .bind(&arg.username)
        .bind(&arg.hashed_password)
        .bind(&arg.full_name)
        .bind(&arg.email)
        .fetch_one(exec)
        .await
    }

    /// Get user by username
    pub async fn get(
        exec: impl PgExecutor<'_>,
        username: &str,
    ) -> Result<Option<User>, sqlx::Error> {
        sqlx::query_as(
            r#"SELECT username, hashed_password, full_name, email,
                      is_email_verified, password_changed_at, created_at
               FROM users WHERE username = $1"#,
        )
        .bind(username)
        .fetch_optional(exec)
        .await
    }

    /// Mark a user's email as verified
    pub async fn set_email_verified(
        exec: impl PgExecutor<'_>,
        username: &str,
    ) -> Result<Option<User>, sqlx::Error> {
        sqlx::query_as(
            r#"UPDATE users
               SET is_email_verified = true
               WHERE username = $1
               RETURNING username, hashed_password, full_name, email,
                         is_email_verified, password_changed_at, created_at"#,
        )
        .bind(username)
        .fetch_optional(exec)
        .await
    }
}
