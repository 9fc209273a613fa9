//! Row types for the ledger schema

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Bank account. Balance is in minor units (cents) and equals the running
/// sum of all entries recorded against the account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Account {
    pub id: i64,
    pub owner: String,
    pub balance: i64,
    pub currency: String,
    /// External account number, assigned out of band
    pub account_number: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Immutable ledger entry. Negative amount for debits, positive for credits.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Entry {
    pub id: i64,
    pub account_id: i64,
    pub amount: i64,
    pub created_at: DateTime<Utc>,
}

/// Completed transfer between two accounts. Records the intent; the two
/// matching entries record the effect.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Transfer {
    pub id: i64,
    pub from_account_id: i64,
    pub to_account_id: i64,
    pub amount: i64,
    pub created_at: DateTime<Utc>,
}

/// Registered user. `is_email_verified` is flipped only by the email
/// verification transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
    pub username: String,
    #[serde(skip_serializing, default)]
    pub hashed_password: String,
    pub full_name: String,
    pub email: String,
    pub is_email_verified: bool,
    pub password_changed_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

/// Pending email verification. Consumed at most once.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct VerifyEmail {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub secret_code: String,
    pub is_used: bool,
    pub created_at: DateTime<Utc>,
    pub expired_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_serialization_hides_password() {
        let user = User {
            username: "alice".to_string(),
            hashed_password: "secret-hash".to_string(),
            full_name: "Alice".to_string(),
            email: "alice@example.com".to_string(),
            is_email_verified: false,
            password_changed_at: Utc::now(),
            created_at: Utc::now(),
        };

        let json = serde_json::to_string(&user).unwrap();
        assert!(!json.contains("secret-hash"));
        assert!(json.contains("alice@example.com"));
    }
}
