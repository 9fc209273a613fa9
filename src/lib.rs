//! Ferrobank - Transactional Ledger Core
//!
//! The storage engine of a banking backend: double-entry money movement and
//! identity verification composed as atomic database transactions.
//!
//! # Modules
//!
//! - [`config`] - Application configuration (explicit, no globals)
//! - [`currency`] - Supported currency codes
//! - [`db`] - PostgreSQL connection pool and migrations
//! - [`logging`] - Tracing subscriber setup
//! - [`random`] - Random value helpers (secret codes, test fixtures)
//! - [`store`] - The ledger store: query layer, transaction executor,
//!   transfer and email-verification engines, store facade

pub mod config;
pub mod currency;
pub mod db;
pub mod logging;
pub mod random;
pub mod store;

// Convenient re-exports at crate root
pub use config::{AppConfig, WelcomeGrantConfig};
pub use db::Database;
pub use store::{
    Account, CreateAccountParams, CreateUserParams, CreateUserTxResult, CreateVerifyEmailParams,
    DomainEvent, Entry, MemStore, SqlStore, Store, StoreError, Transfer, TransferTxParams,
    TransferTxResult, User, VerifyEmail, VerifyEmailTxParams, VerifyEmailTxResult,
};
