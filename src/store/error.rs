//! Store error taxonomy
//!
//! Every engine failure maps into one `StoreError`. The engine itself never
//! retries; callers decide retry/recovery from the category.

use thiserror::Error;

/// Postgres error codes we classify on.
const PG_UNIQUE_VIOLATION: &str = "23505";
const PG_FOREIGN_KEY_VIOLATION: &str = "23503";
const PG_CHECK_VIOLATION: &str = "23514";

const BALANCE_CHECK_CONSTRAINT: &str = "accounts_balance_non_negative";

/// Store error types
#[derive(Error, Debug)]
pub enum StoreError {
    // === Not found ===
    #[error("Account not found: {0}")]
    AccountNotFound(i64),

    #[error("User not found: {0}")]
    UserNotFound(String),

    #[error("Entry not found: {0}")]
    EntryNotFound(i64),

    #[error("Transfer not found: {0}")]
    TransferNotFound(i64),

    // === Conflict / invalid ===
    /// Verification failed: unknown id, wrong code, already consumed or
    /// expired. Deliberately undifferentiated so callers cannot probe which
    /// part mismatched.
    #[error("Invalid or expired verification code")]
    InvalidSecretCode,

    #[error("Insufficient funds")]
    InsufficientFunds,

    // === Constraint violations, surfaced unmodified ===
    #[error("Unique constraint violated: {0}")]
    UniqueViolation(String),

    #[error("Foreign key constraint violated: {0}")]
    ForeignKeyViolation(String),

    #[error("Check constraint violated: {0}")]
    CheckViolation(String),

    // === Transport / connectivity ===
    #[error("Database connection error: {0}")]
    Connection(String),

    // === Rollback failure: both causes preserved ===
    #[error("Transaction failed: {source}; rollback also failed: {rollback}")]
    RollbackFailed {
        source: Box<StoreError>,
        rollback: String,
    },

    #[error("Database error: {0}")]
    Database(String),
}

impl StoreError {
    /// Stable category code for caller mapping (transport status, re-enqueue
    /// decisions).
    pub fn code(&self) -> &'static str {
        match self {
            StoreError::AccountNotFound(_)
            | StoreError::UserNotFound(_)
            | StoreError::EntryNotFound(_)
            | StoreError::TransferNotFound(_) => "NOT_FOUND",
            StoreError::InvalidSecretCode => "INVALID_CODE",
            StoreError::InsufficientFunds => "INSUFFICIENT_FUNDS",
            StoreError::UniqueViolation(_)
            | StoreError::ForeignKeyViolation(_)
            | StoreError::CheckViolation(_) => "CONSTRAINT_VIOLATION",
            StoreError::Connection(_) => "CONNECTION",
            StoreError::RollbackFailed { .. } => "ROLLBACK_FAILED",
            StoreError::Database(_) => "DATABASE",
        }
    }

    /// Whether the caller may usefully retry the whole operation.
    pub fn is_retryable(&self) -> bool {
        matches!(self, StoreError::Connection(_))
    }
}

impl From<sqlx::Error> for StoreError {
    fn from(e: sqlx::Error) -> Self {
        match &e {
            sqlx::Error::Database(db) => {
                let constraint = db.constraint().unwrap_or_default().to_string();
                match db.code().as_deref() {
                    Some(PG_UNIQUE_VIOLATION) => StoreError::UniqueViolation(constraint),
                    Some(PG_FOREIGN_KEY_VIOLATION) => StoreError::ForeignKeyViolation(constraint),
                    Some(PG_CHECK_VIOLATION) if constraint == BALANCE_CHECK_CONSTRAINT => {
                        StoreError::InsufficientFunds
                    }
                    Some(PG_CHECK_VIOLATION) => StoreError::CheckViolation(constraint),
                    _ => StoreError::Database(db.to_string()),
                }
            }
            sqlx::Error::Io(_)
            | sqlx::Error::Tls(_)
            | sqlx::Error::PoolTimedOut
            | sqlx::Error::PoolClosed
            | sqlx::Error::WorkerCrashed => StoreError::Connection(e.to_string()),
            _ => StoreError::Database(e.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        assert_eq!(StoreError::AccountNotFound(7).code(), "NOT_FOUND");
        assert_eq!(StoreError::InvalidSecretCode.code(), "INVALID_CODE");
        assert_eq!(StoreError::InsufficientFunds.code(), "INSUFFICIENT_FUNDS");
        assert_eq!(
            StoreError::UniqueViolation("owner_currency_key".into()).code(),
            "CONSTRAINT_VIOLATION"
        );
        assert_eq!(StoreError::Connection("reset".into()).code(), "CONNECTION");
    }

    #[test]
    fn test_retryable() {
        assert!(StoreError::Connection("timeout".into()).is_retryable());
        assert!(!StoreError::InsufficientFunds.is_retryable());
        assert!(!StoreError::AccountNotFound(1).is_retryable());
    }

    #[test]
    fn test_rollback_failed_preserves_both_causes() {
        let err = StoreError::RollbackFailed {
            source: Box::new(StoreError::InsufficientFunds),
            rollback: "connection reset".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("Insufficient funds"));
        assert!(msg.contains("connection reset"));
    }

    #[test]
    fn test_pool_errors_classify_as_connection() {
        let err = StoreError::from(sqlx::Error::PoolTimedOut);
        assert!(matches!(err, StoreError::Connection(_)));

        let err = StoreError::from(sqlx::Error::PoolClosed);
        assert!(matches!(err, StoreError::Connection(_)));
    }

    #[test]
    fn test_row_not_found_is_generic_database_error() {
        // Query code maps missing rows to the specific *NotFound variants
        // itself; the fallback stays generic.
        let err = StoreError::from(sqlx::Error::RowNotFound);
        assert!(matches!(err, StoreError::Database(_)));
    }
}
