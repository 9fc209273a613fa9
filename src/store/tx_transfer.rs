//! Transfer engine
//!
//! Moves money between two accounts as one atomic unit: one transfer row,
//! a debit entry, a credit entry, and both balance updates, or none of them.

use sqlx::{Postgres, Transaction};

use super::SqlStore;
use super::account::AccountQueries;
use super::entry::EntryQueries;
use super::error::StoreError;
use super::models::{Account, Entry, Transfer};
use super::transfer::{CreateTransferParams, TransferQueries};

/// Input for a money transfer. The caller has already validated the amount
/// is positive and performed any ownership/currency pre-checks.
#[derive(Debug, Clone, Copy)]
pub struct TransferTxParams {
    pub from_account_id: i64,
    pub to_account_id: i64,
    pub amount: i64,
}

/// Everything a completed transfer produced: the intent row, both entries,
/// and both accounts as of after the commit.
#[derive(Debug, Clone)]
pub struct TransferTxResult {
    pub transfer: Transfer,
    pub from_account: Account,
    pub to_account: Account,
    pub from_entry: Entry,
    pub to_entry: Entry,
}

impl SqlStore {
    /// Transfer `amount` from one account to another.
    ///
    /// Existence is not pre-checked; a missing account surfaces as the first
    /// failing write and rolls back the whole unit. An overdrawing debit is
    /// rejected by the balance check constraint and surfaces as
    /// `StoreError::InsufficientFunds`.
    pub async fn transfer_tx(&self, arg: TransferTxParams) -> Result<TransferTxResult, StoreError> {
        let result = self
            .exec_tx(move |tx| {
                Box::pin(async move {
                    let transfer = TransferQueries::create(
                        &mut **tx,
                        &CreateTransferParams {
                            from_account_id: arg.from_account_id,
                            to_account_id: arg.to_account_id,
                            amount: arg.amount,
                        },
                    )
                    .await?;

                    let from_entry =
                        EntryQueries::create(&mut **tx, arg.from_account_id, -arg.amount).await?;
                    let to_entry =
                        EntryQueries::create(&mut **tx, arg.to_account_id, arg.amount).await?;

                    // The balance updates take the row locks. Always lock the
                    // smaller account id first so two concurrent transfers
                    // between the same pair, run in opposite directions,
                    // request locks in the same order and cannot form a
                    // wait cycle.
                    let (from_account, to_account) = if arg.from_account_id < arg.to_account_id {
                        let from = apply_delta(tx, arg.from_account_id, -arg.amount).await?;
                        let to = apply_delta(tx, arg.to_account_id, arg.amount).await?;
                        (from, to)
                    } else {
                        let to = apply_delta(tx, arg.to_account_id, arg.amount).await?;
                        let from = apply_delta(tx, arg.from_account_id, -arg.amount).await?;
                        (from, to)
                    };

                    Ok(TransferTxResult {
                        transfer,
                        from_account,
                        to_account,
                        from_entry,
                        to_entry,
                    })
                })
            })
            .await?;

        tracing::debug!(
            transfer_id = result.transfer.id,
            from_account_id = arg.from_account_id,
            to_account_id = arg.to_account_id,
            amount = arg.amount,
            "transfer committed"
        );

        Ok(result)
    }
}

async fn apply_delta(
    tx: &mut Transaction<'static, Postgres>,
    account_id: i64,
    delta: i64,
) -> Result<Account, StoreError> {
    AccountQueries::add_balance(&mut **tx, account_id, delta)
        .await?
        .ok_or(StoreError::AccountNotFound(account_id))
}
