//! Email verification engine integration tests
//!
//! These run against a real PostgreSQL instance and are ignored by default.
//! Run with: cargo test -- --ignored

mod common;

use common::setup_store;
use ferrobank::{
    CreateUserParams, DomainEvent, Store, StoreError, VerifyEmailTxParams, currency, random,
};

async fn register_random_user(store: &ferrobank::SqlStore) -> (String, i64, String) {
    let result = store
        .create_user_tx(CreateUserParams {
            username: random::random_owner(),
            hashed_password: random::random_string(32),
            full_name: random::random_owner(),
            email: random::random_email(),
        })
        .await
        .expect("Should register user");

    assert!(!result.user.is_email_verified);
    assert!(!result.verify_email.is_used);

    // The event is handed back for post-commit dispatch and must carry
    // everything the mailer task needs.
    let DomainEvent::VerificationEmailRequested {
        email_id,
        username,
        email,
        secret_code,
    } = result.event;
    assert_eq!(email_id, result.verify_email.id);
    assert_eq!(username, result.user.username);
    assert_eq!(email, result.user.email);
    assert_eq!(secret_code, result.verify_email.secret_code);

    (username, email_id, secret_code)
}

#[tokio::test]
#[ignore] // Requires PostgreSQL
async fn test_verify_email_tx() {
    let store = setup_store().await;
    let (username, email_id, secret_code) = register_random_user(&store).await;

    let result = store
        .verify_email_tx(VerifyEmailTxParams {
            email_id,
            secret_code,
        })
        .await
        .expect("verification should succeed");

    assert!(result.user.is_email_verified);
    assert!(result.verify_email.is_used);
    assert_eq!(result.welcome_account.owner, username);
    assert_eq!(result.welcome_account.balance, 10_000);
    assert_eq!(result.welcome_account.currency, currency::USD);

    let user = store.get_user(&username).await.unwrap();
    assert!(user.is_email_verified);

    let accounts = store.list_accounts(&username, 10, 0).await.unwrap();
    assert_eq!(accounts.len(), 1);
    assert_eq!(accounts[0].id, result.welcome_account.id);
}

#[tokio::test]
#[ignore] // Requires PostgreSQL
async fn test_verify_email_tx_replay_fails() {
    let store = setup_store().await;
    let (username, email_id, secret_code) = register_random_user(&store).await;

    store
        .verify_email_tx(VerifyEmailTxParams {
            email_id,
            secret_code: secret_code.clone(),
        })
        .await
        .expect("first verification should succeed");

    // Same (id, code) pair can never succeed twice
    let err = store
        .verify_email_tx(VerifyEmailTxParams {
            email_id,
            secret_code,
        })
        .await
        .expect_err("replay must fail");
    assert!(matches!(err, StoreError::InvalidSecretCode), "got {err:?}");

    // And grants no second welcome account
    let accounts = store.list_accounts(&username, 10, 0).await.unwrap();
    assert_eq!(accounts.len(), 1);
}

#[tokio::test]
#[ignore] // Requires PostgreSQL
async fn test_verify_email_tx_wrong_code() {
    let store = setup_store().await;
    let (username, email_id, _secret_code) = register_random_user(&store).await;

    let err = store
        .verify_email_tx(VerifyEmailTxParams {
            email_id,
            secret_code: "definitely-wrong".to_string(),
        })
        .await
        .expect_err("wrong code must fail");
    assert!(matches!(err, StoreError::InvalidSecretCode));

    // Nothing happened: user unverified, no welcome account
    let user = store.get_user(&username).await.unwrap();
    assert!(!user.is_email_verified);
    assert!(store.list_accounts(&username, 10, 0).await.unwrap().is_empty());
}

#[tokio::test]
#[ignore] // Requires PostgreSQL
async fn test_verify_email_tx_unknown_id() {
    let store = setup_store().await;

    let err = store
        .verify_email_tx(VerifyEmailTxParams {
            email_id: i64::MAX - 41,
            secret_code: "whatever".to_string(),
        })
        .await
        .expect_err("unknown id must fail");

    // Indistinguishable from a wrong code
    assert!(matches!(err, StoreError::InvalidSecretCode));
}
