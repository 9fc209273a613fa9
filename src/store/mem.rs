//! In-memory store double
//!
//! Implements the full [`Store`] facade over mutex-guarded maps so
//! handler-level tests run without a database. Observable semantics match
//! the SQL implementation: same constraint failures, balance conservation,
//! replay protection, and all-or-nothing composed operations (validation
//! happens before the first mutation).

use std::collections::{BTreeMap, HashMap};
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::{Duration, Utc};

use crate::config::WelcomeGrantConfig;
use crate::random;

use super::Store;
use super::account::CreateAccountParams;
use super::error::StoreError;
use super::events::DomainEvent;
use super::models::{Account, Entry, Transfer, User, VerifyEmail};
use super::tx_transfer::{TransferTxParams, TransferTxResult};
use super::tx_user::CreateUserTxResult;
use super::tx_verify_email::{VerifyEmailTxParams, VerifyEmailTxResult};
use super::user::CreateUserParams;
use super::verify_email::{CreateVerifyEmailParams, VERIFY_EMAIL_TTL_MINUTES};

#[derive(Default)]
struct MemState {
    users: HashMap<String, User>,
    accounts: BTreeMap<i64, Account>,
    entries: BTreeMap<i64, Entry>,
    transfers: BTreeMap<i64, Transfer>,
    verify_emails: BTreeMap<i64, VerifyEmail>,
    account_seq: i64,
    entry_seq: i64,
    transfer_seq: i64,
    verify_email_seq: i64,
}

/// In-memory [`Store`] implementation.
pub struct MemStore {
    state: Mutex<MemState>,
    welcome_grant: WelcomeGrantConfig,
}

impl MemStore {
    pub fn new(welcome_grant: WelcomeGrantConfig) -> Self {
        Self {
            state: Mutex::new(MemState::default()),
            welcome_grant,
        }
    }

    fn lock(&self) -> MutexGuard<'_, MemState> {
        // A poisoned mutex only means some test panicked; keep the data.
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl Default for MemStore {
    fn default() -> Self {
        Self::new(WelcomeGrantConfig::default())
    }
}

impl MemState {
    fn insert_user(&mut self, arg: &CreateUserParams) -> Result<User, StoreError> {
        if self.users.contains_key(&arg.username) {
            return Err(StoreError::UniqueViolation("users_pkey".to_string()));
        }
        if self.users.values().any(|u| u.email == arg.email) {
            return Err(StoreError::UniqueViolation("users_email_key".to_string()));
        }

        let now = Utc::now();
        let user = User {
            username: arg.username.clone(),
            hashed_password: arg.hashed_password.clone(),
            full_name: arg.full_name.clone(),
            email: arg.email.clone(),
            is_email_verified: false,
            password_changed_at: now,
            created_at: now,
        };
        self.users.insert(user.username.clone(), user.clone());
        Ok(user)
    }

    fn check_new_account(&self, arg: &CreateAccountParams) -> Result<(), StoreError> {
        if !self.users.contains_key(&arg.owner) {
            return Err(StoreError::ForeignKeyViolation(
                "accounts_owner_fkey".to_string(),
            ));
        }
        if arg.balance < 0 {
            return Err(StoreError::InsufficientFunds);
        }
        if self
            .accounts
            .values()
            .any(|a| a.owner == arg.owner && a.currency == arg.currency)
        {
            return Err(StoreError::UniqueViolation("owner_currency_key".to_string()));
        }
        Ok(())
    }

    fn insert_account(&mut self, arg: &CreateAccountParams) -> Result<Account, StoreError> {
        self.check_new_account(arg)?;

        self.account_seq += 1;
        let account = Account {
            id: self.account_seq,
            owner: arg.owner.clone(),
            balance: arg.balance,
            currency: arg.currency.clone(),
            account_number: None,
            created_at: Utc::now(),
        };
        self.accounts.insert(account.id, account.clone());
        Ok(account)
    }

    fn insert_entry(&mut self, account_id: i64, amount: i64) -> Entry {
        self.entry_seq += 1;
        let entry = Entry {
            id: self.entry_seq,
            account_id,
            amount,
            created_at: Utc::now(),
        };
        self.entries.insert(entry.id, entry.clone());
        entry
    }

    fn insert_verify_email(&mut self, arg: &CreateVerifyEmailParams) -> Result<VerifyEmail, StoreError> {
        if !self.users.contains_key(&arg.username) {
            return Err(StoreError::ForeignKeyViolation(
                "verify_emails_username_fkey".to_string(),
            ));
        }

        self.verify_email_seq += 1;
        let now = Utc::now();
        let record = VerifyEmail {
            id: self.verify_email_seq,
            username: arg.username.clone(),
            email: arg.email.clone(),
            secret_code: arg.secret_code.clone(),
            is_used: false,
            created_at: now,
            expired_at: now + Duration::minutes(VERIFY_EMAIL_TTL_MINUTES),
        };
        self.verify_emails.insert(record.id, record.clone());
        Ok(record)
    }
}

#[async_trait]
impl Store for MemStore {
    async fn create_user(&self, arg: CreateUserParams) -> Result<User, StoreError> {
        self.lock().insert_user(&arg)
    }

    async fn get_user(&self, username: &str) -> Result<User, StoreError> {
        self.lock()
            .users
            .get(username)
            .cloned()
            .ok_or_else(|| StoreError::UserNotFound(username.to_string()))
    }

    async fn create_account(&self, arg: CreateAccountParams) -> Result<Account, StoreError> {
        self.lock().insert_account(&arg)
    }

    async fn get_account(&self, id: i64) -> Result<Account, StoreError> {
        self.lock()
            .accounts
            .get(&id)
            .cloned()
            .ok_or(StoreError::AccountNotFound(id))
    }

    async fn list_accounts(
        &self,
        owner: &str,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Account>, StoreError> {
        let state = self.lock();
        Ok(state
            .accounts
            .values()
            .filter(|a| a.owner == owner)
            .skip(offset.max(0) as usize)
            .take(limit.max(0) as usize)
            .cloned()
            .collect())
    }

    async fn get_entry(&self, id: i64) -> Result<Entry, StoreError> {
        self.lock()
            .entries
            .get(&id)
            .cloned()
            .ok_or(StoreError::EntryNotFound(id))
    }

    async fn list_entries(
        &self,
        account_id: i64,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Entry>, StoreError> {
        let state = self.lock();
        Ok(state
            .entries
            .values()
            .filter(|e| e.account_id == account_id)
            .skip(offset.max(0) as usize)
            .take(limit.max(0) as usize)
            .cloned()
            .collect())
    }

    async fn get_transfer(&self, id: i64) -> Result<Transfer, StoreError> {
        self.lock()
            .transfers
            .get(&id)
            .cloned()
            .ok_or(StoreError::TransferNotFound(id))
    }

    async fn list_transfers(
        &self,
        from_account_id: i64,
        to_account_id: i64,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Transfer>, StoreError> {
        let state = self.lock();
        Ok(state
            .transfers
            .values()
            .filter(|t| t.from_account_id == from_account_id || t.to_account_id == to_account_id)
            .skip(offset.max(0) as usize)
            .take(limit.max(0) as usize)
            .cloned()
            .collect())
    }

    async fn create_verify_email(
        &self,
        arg: CreateVerifyEmailParams,
    ) -> Result<VerifyEmail, StoreError> {
        self.lock().insert_verify_email(&arg)
    }

    async fn create_user_tx(&self, arg: CreateUserParams) -> Result<CreateUserTxResult, StoreError> {
        let secret_code = random::random_string(32);
        let mut state = self.lock();

        let user = state.insert_user(&arg)?;
        let verify_email = state.insert_verify_email(&CreateVerifyEmailParams {
            username: user.username.clone(),
            email: user.email.clone(),
            secret_code,
        })?;

        let event = DomainEvent::VerificationEmailRequested {
            email_id: verify_email.id,
            username: user.username.clone(),
            email: user.email.clone(),
            secret_code: verify_email.secret_code.clone(),
        };

        Ok(CreateUserTxResult {
            user,
            verify_email,
            event,
        })
    }

    async fn transfer_tx(&self, arg: TransferTxParams) -> Result<TransferTxResult, StoreError> {
        let mut state = self.lock();

        // Validate everything before the first mutation; the whole operation
        // is all-or-nothing.
        if arg.amount <= 0 {
            return Err(StoreError::CheckViolation(
                "transfers_amount_positive".to_string(),
            ));
        }
        let from_balance = state
            .accounts
            .get(&arg.from_account_id)
            .map(|a| a.balance)
            .ok_or_else(|| {
                StoreError::ForeignKeyViolation("transfers_from_account_id_fkey".to_string())
            })?;
        if !state.accounts.contains_key(&arg.to_account_id) {
            return Err(StoreError::ForeignKeyViolation(
                "transfers_to_account_id_fkey".to_string(),
            ));
        }
        if from_balance < arg.amount {
            return Err(StoreError::InsufficientFunds);
        }

        state.transfer_seq += 1;
        let transfer = Transfer {
            id: state.transfer_seq,
            from_account_id: arg.from_account_id,
            to_account_id: arg.to_account_id,
            amount: arg.amount,
            created_at: Utc::now(),
        };
        state.transfers.insert(transfer.id, transfer.clone());

        let from_entry = state.insert_entry(arg.from_account_id, -arg.amount);
        let to_entry = state.insert_entry(arg.to_account_id, arg.amount);

        let from_account = {
            let account = state
                .accounts
                .get_mut(&arg.from_account_id)
                .ok_or(StoreError::AccountNotFound(arg.from_account_id))?;
            account.balance -= arg.amount;
            account.clone()
        };
        let to_account = {
            let account = state
                .accounts
                .get_mut(&arg.to_account_id)
                .ok_or(StoreError::AccountNotFound(arg.to_account_id))?;
            account.balance += arg.amount;
            account.clone()
        };

        Ok(TransferTxResult {
            transfer,
            from_account,
            to_account,
            from_entry,
            to_entry,
        })
    }

    async fn verify_email_tx(
        &self,
        arg: VerifyEmailTxParams,
    ) -> Result<VerifyEmailTxResult, StoreError> {
        let mut state = self.lock();
        let now = Utc::now();

        // One undifferentiated error for unknown id, wrong code, consumed or
        // expired record.
        let record = state
            .verify_emails
            .get(&arg.email_id)
            .filter(|r| r.secret_code == arg.secret_code && !r.is_used && r.expired_at > now)
            .cloned()
            .ok_or(StoreError::InvalidSecretCode)?;

        if !state.users.contains_key(&record.username) {
            return Err(StoreError::UserNotFound(record.username.clone()));
        }
        state.check_new_account(&CreateAccountParams {
            owner: record.username.clone(),
            balance: self.welcome_grant.balance,
            currency: self.welcome_grant.currency.clone(),
        })?;

        let verify_email = {
            let stored = state
                .verify_emails
                .get_mut(&arg.email_id)
                .ok_or(StoreError::InvalidSecretCode)?;
            stored.is_used = true;
            stored.clone()
        };

        let user = {
            let stored = state
                .users
                .get_mut(&record.username)
                .ok_or_else(|| StoreError::UserNotFound(record.username.clone()))?;
            stored.is_email_verified = true;
            stored.clone()
        };

        let welcome_account = state.insert_account(&CreateAccountParams {
            owner: record.username.clone(),
            balance: self.welcome_grant.balance,
            currency: self.welcome_grant.currency.clone(),
        })?;

        Ok(VerifyEmailTxResult {
            user,
            verify_email,
            welcome_account,
        })
    }
}
