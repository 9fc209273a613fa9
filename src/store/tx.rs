//! Transaction executor
//!
//! One place owns the begin/commit/rollback discipline; the composed
//! operations only describe the statements they run inside it.

use futures::future::BoxFuture;
use sqlx::{Postgres, Transaction};

use super::SqlStore;
use super::error::StoreError;

impl SqlStore {
    /// Run a unit of work inside one database transaction.
    ///
    /// The closure is invoked exactly once against the open transaction.
    /// `Ok` commits, `Err` rolls back. A rollback failure is returned as
    /// `StoreError::RollbackFailed` carrying both causes. No retries happen
    /// here; the unit of work must not perform unrelated blocking calls, the
    /// connection and any row locks are held until it returns.
    ///
    /// Cancellation is safe: dropping the returned future before commit
    /// drops the transaction guard, and sqlx rolls the connection back
    /// before returning it to the pool. Nothing partial ever commits.
    pub(crate) async fn exec_tx<T, F>(&self, op: F) -> Result<T, StoreError>
    where
        F: for<'t> FnOnce(
            &'t mut Transaction<'static, Postgres>,
        ) -> BoxFuture<'t, Result<T, StoreError>>,
    {
        let mut tx = self.pool().begin().await?;

        match op(&mut tx).await {
            Ok(value) => {
                tx.commit().await?;
                Ok(value)
            }
            Err(source) => match tx.rollback().await {
                Ok(()) => Err(source),
                Err(rb_err) => Err(StoreError::RollbackFailed {
                    source: Box::new(source),
                    rollback: rb_err.to_string(),
                }),
            },
        }
    }
}
