//! User registration transaction
//!
//! Creates the user row and its verification record in one unit of work.
//! The email dispatch itself is not performed here: the result carries a
//! domain event the caller enqueues strictly after the commit, so storage
//! consistency never waits on an external system.

use crate::random;

use super::SqlStore;
use super::error::StoreError;
use super::events::DomainEvent;
use super::models::{User, VerifyEmail};
use super::user::{CreateUserParams, UserQueries};
use super::verify_email::{CreateVerifyEmailParams, VerifyEmailQueries};

const SECRET_CODE_LEN: usize = 32;

#[derive(Debug, Clone)]
pub struct CreateUserTxResult {
    pub user: User,
    pub verify_email: VerifyEmail,
    /// Dispatch after commit.
    pub event: DomainEvent,
}

impl SqlStore {
    /// Register a user and issue their email verification record.
    pub async fn create_user_tx(
        &self,
        arg: CreateUserParams,
    ) -> Result<CreateUserTxResult, StoreError> {
        let secret_code = random::random_string(SECRET_CODE_LEN);

        let (user, verify_email) = self
            .exec_tx(move |tx| {
                Box::pin(async move {
                    let user = UserQueries::create(&mut **tx, &arg).await?;

                    let verify_email = VerifyEmailQueries::create(
                        &mut **tx,
                        &CreateVerifyEmailParams {
                            username: user.username.clone(),
                            email: user.email.clone(),
                            secret_code,
                        },
                    )
                    .await?;

                    Ok((user, verify_email))
                })
            })
            .await?;

        let event = DomainEvent::VerificationEmailRequested {
            email_id: verify_email.id,
            username: user.username.clone(),
            email: user.email.clone(),
            secret_code: verify_email.secret_code.clone(),
        };

        tracing::info!(username = %user.username, "user registered");

        Ok(CreateUserTxResult {
            user,
            verify_email,
            event,
        })
    }
}
