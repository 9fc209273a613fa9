//! Email verification engine
//!
//! Consumes a verification record, flips the user's verified flag, and
//! issues the one-time welcome account, all in one transaction.

use super::SqlStore;
use super::account::{AccountQueries, CreateAccountParams};
use super::error::StoreError;
use super::models::{Account, User, VerifyEmail};
use super::user::UserQueries;
use super::verify_email::VerifyEmailQueries;

#[derive(Debug, Clone)]
pub struct VerifyEmailTxParams {
    pub email_id: i64,
    pub secret_code: String,
}

#[derive(Debug, Clone)]
pub struct VerifyEmailTxResult {
    pub user: User,
    pub verify_email: VerifyEmail,
    pub welcome_account: Account,
}

impl SqlStore {
    /// Verify a user's email address.
    ///
    /// The consuming UPDATE matches on id, code, not-yet-used and
    /// not-expired, so a replay of the same (id, code) pair fails with the
    /// same undifferentiated `InvalidSecretCode` as a wrong code and grants
    /// nothing. Any later failure rolls the consumption back too.
    pub async fn verify_email_tx(
        &self,
        arg: VerifyEmailTxParams,
    ) -> Result<VerifyEmailTxResult, StoreError> {
        let grant = self.welcome_grant().clone();

        let result = self
            .exec_tx(move |tx| {
                Box::pin(async move {
                    let verify_email =
                        VerifyEmailQueries::consume(&mut **tx, arg.email_id, &arg.secret_code)
                            .await?
                            .ok_or(StoreError::InvalidSecretCode)?;

                    let user = UserQueries::set_email_verified(&mut **tx, &verify_email.username)
                        .await?
                        .ok_or_else(|| StoreError::UserNotFound(verify_email.username.clone()))?;

                    let welcome_account = AccountQueries::create(
                        &mut **tx,
                        &CreateAccountParams {
                            owner: verify_email.username.clone(),
                            balance: grant.balance,
                            currency: grant.currency,
                        },
                    )
                    .await?;

                    Ok(VerifyEmailTxResult {
                        user,
                        verify_email,
                        welcome_account,
                    })
                })
            })
            .await?;

        tracing::info!(
            username = %result.user.username,
            welcome_account_id = result.welcome_account.id,
            "email verified, welcome account granted"
        );

        Ok(result)
    }
}
