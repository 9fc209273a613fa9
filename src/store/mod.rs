//! Ledger store
//!
//! Typed queries over the relational schema plus the composed transactional
//! operations, behind one substitutable [`Store`] facade. Two
//! implementations: [`SqlStore`] over PostgreSQL and [`MemStore`], a full
//! in-memory double for handler-level tests that never touch a database.

mod account;
mod entry;
mod error;
mod events;
mod mem;
mod models;
mod transfer;
mod tx;
mod tx_transfer;
mod tx_user;
mod tx_verify_email;
mod user;
mod verify_email;

pub use account::{AccountQueries, CreateAccountParams};
pub use entry::EntryQueries;
pub use error::StoreError;
pub use events::DomainEvent;
pub use mem::MemStore;
pub use models::{Account, Entry, Transfer, User, VerifyEmail};
pub use transfer::{CreateTransferParams, TransferQueries};
pub use tx_transfer::{TransferTxParams, TransferTxResult};
pub use tx_user::CreateUserTxResult;
pub use tx_verify_email::{VerifyEmailTxParams, VerifyEmailTxResult};
pub use user::{CreateUserParams, UserQueries};
pub use verify_email::{CreateVerifyEmailParams, VERIFY_EMAIL_TTL_MINUTES, VerifyEmailQueries};

use async_trait::async_trait;
use sqlx::PgPool;

use crate::config::WelcomeGrantConfig;

/// Single interface handlers and background workers depend on: the plain
/// single-row operations plus the composed transactional ones.
#[async_trait]
pub trait Store: Send + Sync {
    async fn create_user(&self, arg: CreateUserParams) -> Result<User, StoreError>;
    async fn get_user(&self, username: &str) -> Result<User, StoreError>;

    async fn create_account(&self, arg: CreateAccountParams) -> Result<Account, StoreError>;
    async fn get_account(&self, id: i64) -> Result<Account, StoreError>;
    async fn list_accounts(
        &self,
        owner: &str,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Account>, StoreError>;

    async fn get_entry(&self, id: i64) -> Result<Entry, StoreError>;
    async fn list_entries(
        &self,
        account_id: i64,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Entry>, StoreError>;

    async fn get_transfer(&self, id: i64) -> Result<Transfer, StoreError>;
    async fn list_transfers(
        &self,
        from_account_id: i64,
        to_account_id: i64,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Transfer>, StoreError>;

    async fn create_verify_email(
        &self,
        arg: CreateVerifyEmailParams,
    ) -> Result<VerifyEmail, StoreError>;

    /// Register a user and issue their verification record atomically.
    async fn create_user_tx(&self, arg: CreateUserParams) -> Result<CreateUserTxResult, StoreError>;

    /// Move money between two accounts atomically.
    async fn transfer_tx(&self, arg: TransferTxParams) -> Result<TransferTxResult, StoreError>;

    /// Consume a verification record, verify the user, grant the welcome
    /// account, atomically.
    async fn verify_email_tx(
        &self,
        arg: VerifyEmailTxParams,
    ) -> Result<VerifyEmailTxResult, StoreError>;
}

/// PostgreSQL-backed store. Stateless besides the pool; all coordination is
/// delegated to the database's row-level locking.
#[derive(Clone)]
pub struct SqlStore {
    pool: PgPool,
    welcome_grant: WelcomeGrantConfig,
}

impl SqlStore {
    pub fn new(pool: PgPool, welcome_grant: WelcomeGrantConfig) -> Self {
        Self {
            pool,
            welcome_grant,
        }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    pub(crate) fn welcome_grant(&self) -> &WelcomeGrantConfig {
        &self.welcome_grant
    }
}

#[async_trait]
impl Store for SqlStore {
    async fn create_user(&self, arg: CreateUserParams) -> Result<User, StoreError> {
        Ok(UserQueries::create(&self.pool, &arg).await?)
    }

    async fn get_user(&self, username: &str) -> Result<User, StoreError> {
        UserQueries::get(&self.pool, username)
            .await?
            .ok_or_else(|| StoreError::UserNotFound(username.to_string()))
    }

    async fn create_account(&self, arg: CreateAccountParams) -> Result<Account, StoreError> {
        Ok(AccountQueries::create(&self.pool, &arg).await?)
    }

    async fn get_account(&self, id: i64) -> Result<Account, StoreError> {
        AccountQueries::get(&self.pool, id)
            .await?
            .ok_or(StoreError::AccountNotFound(id))
    }

    async fn list_accounts(
        &self,
        owner: &str,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Account>, StoreError> {
        Ok(AccountQueries::list(&self.pool, owner, limit, offset).await?)
    }

    async fn get_entry(&self, id: i64) -> Result<Entry, StoreError> {
        EntryQueries::get(&self.pool, id)
            .await?
            .ok_or(StoreError::EntryNotFound(id))
    }

    async fn list_entries(
        &self,
        account_id: i64,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Entry>, StoreError> {
        Ok(EntryQueries::list(&self.pool, account_id, limit, offset).await?)
    }

    async fn get_transfer(&self, id: i64) -> Result<Transfer, StoreError> {
        TransferQueries::get(&self.pool, id)
            .await?
            .ok_or(StoreError::TransferNotFound(id))
    }

    async fn list_transfers(
        &self,
        from_account_id: i64,
        to_account_id: i64,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Transfer>, StoreError> {
        Ok(
            TransferQueries::list(&self.pool, from_account_id, to_account_id, limit, offset)
                .await?,
        )
    }

    async fn create_verify_email(
        &self,
        arg: CreateVerifyEmailParams,
    ) -> Result<VerifyEmail, StoreError> {
        Ok(VerifyEmailQueries::create(&self.pool, &arg).await?)
    }

    async fn create_user_tx(&self, arg: CreateUserParams) -> Result<CreateUserTxResult, StoreError> {
        self.create_user_tx(arg).await
    }

    async fn transfer_tx(&self, arg: TransferTxParams) -> Result<TransferTxResult, StoreError> {
        self.transfer_tx(arg).await
    }

    async fn verify_email_tx(
        &self,
        arg: VerifyEmailTxParams,
    ) -> Result<VerifyEmailTxResult, StoreError> {
        self.verify_email_tx(arg).await
    }
}
