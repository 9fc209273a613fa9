//! Store facade tests against the in-memory double
//!
//! Same observable properties as the PostgreSQL tests, but runnable without
//! a database, so they are not ignored.

use std::sync::Arc;

use ferrobank::{
    CreateAccountParams, CreateUserParams, MemStore, Store, StoreError, TransferTxParams,
    VerifyEmailTxParams, WelcomeGrantConfig, currency, random,
};

async fn create_random_user(store: &dyn Store) -> String {
    let user = store
        .create_user(CreateUserParams {
            username: random::random_owner(),
            hashed_password: random::random_string(32),
            full_name: random::random_owner(),
            email: random::random_email(),
        })
        .await
        .expect("Should create user");
    user.username
}

async fn create_random_account(store: &dyn Store, balance: i64) -> i64 {
    let owner = create_random_user(store).await;
    let account = store
        .create_account(CreateAccountParams {
            owner,
            balance,
            currency: currency::USD.to_string(),
        })
        .await
        .expect("Should create account");
    account.id
}

#[tokio::test]
async fn test_transfer_tx_conserves_money() {
    let store = MemStore::default();
    let account1 = create_random_account(&store, 100).await;
    let account2 = create_random_account(&store, 50).await;

    let result = store
        .transfer_tx(TransferTxParams {
            from_account_id: account1,
            to_account_id: account2,
            amount: 30,
        })
        .await
        .expect("transfer should succeed");

    assert_eq!(result.from_account.balance, 70);
    assert_eq!(result.to_account.balance, 80);
    assert_eq!(result.from_entry.amount, -30);
    assert_eq!(result.to_entry.amount, 30);
    assert_eq!(result.from_entry.amount + result.to_entry.amount, 0);
    assert_eq!(result.transfer.amount, 30);

    let transfer = store.get_transfer(result.transfer.id).await.unwrap();
    assert_eq!(transfer, result.transfer);
}

#[tokio::test]
async fn test_transfer_tx_concurrent_both_directions() {
    let store = Arc::new(MemStore::default());
    let account1 = create_random_account(store.as_ref(), 100).await;
    let account2 = create_random_account(store.as_ref(), 50).await;

    let n = 10;
    let amount = 10;

    let mut handles = Vec::new();
    for i in 0..n {
        let store = store.clone();
        let (from, to) = if i % 2 == 0 {
            (account1, account2)
        } else {
            (account2, account1)
        };
        handles.push(tokio::spawn(async move {
            store
                .transfer_tx(TransferTxParams {
                    from_account_id: from,
                    to_account_id: to,
                    amount,
                })
                .await
        }));
    }

    for handle in handles {
        handle
            .await
            .expect("task panicked")
            .expect("transfer should succeed");
    }

    let final1 = store.get_account(account1).await.unwrap();
    let final2 = store.get_account(account2).await.unwrap();
    assert_eq!(final1.balance, 100);
    assert_eq!(final2.balance, 50);

    let transfers = store.list_transfers(account1, account1, 100, 0).await.unwrap();
    assert_eq!(transfers.len(), n);

    let entries1 = store.list_entries(account1, 100, 0).await.unwrap();
    let entries2 = store.list_entries(account2, 100, 0).await.unwrap();
    assert_eq!(entries1.len() + entries2.len(), 2 * n);
    let net: i64 = entries1.iter().chain(entries2.iter()).map(|e| e.amount).sum();
    assert_eq!(net, 0);
}

#[tokio::test]
async fn test_transfer_tx_one_direction_totals() {
    let store = Arc::new(MemStore::default());
    let account1 = create_random_account(store.as_ref(), 100).await;
    let account2 = create_random_account(store.as_ref(), 50).await;

    let mut handles = Vec::new();
    for _ in 0..5 {
        let store = store.clone();
        handles.push(tokio::spawn(async move {
            store
                .transfer_tx(TransferTxParams {
                    from_account_id: account1,
                    to_account_id: account2,
                    amount: 10,
                })
                .await
        }));
    }
    for handle in handles {
        handle.await.unwrap().expect("transfer should succeed");
    }

    assert_eq!(store.get_account(account1).await.unwrap().balance, 50);
    assert_eq!(store.get_account(account2).await.unwrap().balance, 100);
    assert_eq!(
        store.list_transfers(account1, account2, 100, 0).await.unwrap().len(),
        5
    );
    assert_eq!(store.list_entries(account1, 100, 0).await.unwrap().len(), 5);
    assert_eq!(store.list_entries(account2, 100, 0).await.unwrap().len(), 5);
}

#[tokio::test]
async fn test_transfer_tx_insufficient_funds_leaves_no_trace() {
    let store = MemStore::default();
    let account1 = create_random_account(&store, 5).await;
    let account2 = create_random_account(&store, 50).await;

    let err = store
        .transfer_tx(TransferTxParams {
            from_account_id: account1,
            to_account_id: account2,
            amount: 10,
        })
        .await
        .expect_err("overdraft must be rejected");
    assert!(matches!(err, StoreError::InsufficientFunds));

    assert_eq!(store.get_account(account1).await.unwrap().balance, 5);
    assert_eq!(store.get_account(account2).await.unwrap().balance, 50);
    assert!(store.list_entries(account1, 100, 0).await.unwrap().is_empty());
    assert!(store.list_transfers(account1, account2, 100, 0).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_transfer_tx_missing_account_leaves_no_trace() {
    let store = MemStore::default();
    let account1 = create_random_account(&store, 100).await;

    let err = store
        .transfer_tx(TransferTxParams {
            from_account_id: account1,
            to_account_id: 999_999,
            amount: 10,
        })
        .await
        .expect_err("missing account must fail");
    assert!(matches!(err, StoreError::ForeignKeyViolation(_)));

    assert_eq!(store.get_account(account1).await.unwrap().balance, 100);
    assert!(store.list_entries(account1, 100, 0).await.unwrap().is_empty());
    assert!(store.list_transfers(account1, 999_999, 100, 0).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_verify_email_tx_grants_welcome_account_once() {
    let store = MemStore::new(WelcomeGrantConfig {
        balance: 5_000,
        currency: currency::EUR.to_string(),
    });

    let result = store
        .create_user_tx(CreateUserParams {
            username: "alice".to_string(),
            hashed_password: random::random_string(32),
            full_name: "Alice".to_string(),
            email: "alice@example.com".to_string(),
        })
        .await
        .expect("Should register user");

    let email_id = result.verify_email.id;
    let secret_code = result.verify_email.secret_code.clone();

    let verified = store
        .verify_email_tx(VerifyEmailTxParams {
            email_id,
            secret_code: secret_code.clone(),
        })
        .await
        .expect("verification should succeed");

    assert!(verified.user.is_email_verified);
    assert!(verified.verify_email.is_used);
    assert_eq!(verified.welcome_account.balance, 5_000);
    assert_eq!(verified.welcome_account.currency, currency::EUR);

    // Replay fails and grants nothing more
    let err = store
        .verify_email_tx(VerifyEmailTxParams {
            email_id,
            secret_code,
        })
        .await
        .expect_err("replay must fail");
    assert!(matches!(err, StoreError::InvalidSecretCode));

    let accounts = store.list_accounts("alice", 10, 0).await.unwrap();
    assert_eq!(accounts.len(), 1);
}

#[tokio::test]
async fn test_verify_email_tx_wrong_code_changes_nothing() {
    let store = MemStore::default();

    let result = store
        .create_user_tx(CreateUserParams {
            username: "bob".to_string(),
            hashed_password: random::random_string(32),
            full_name: "Bob".to_string(),
            email: "bob@example.com".to_string(),
        })
        .await
        .unwrap();

    let err = store
        .verify_email_tx(VerifyEmailTxParams {
            email_id: result.verify_email.id,
            secret_code: "wrong".to_string(),
        })
        .await
        .expect_err("wrong code must fail");
    assert!(matches!(err, StoreError::InvalidSecretCode));

    let user = store.get_user("bob").await.unwrap();
    assert!(!user.is_email_verified);
    assert!(store.list_accounts("bob", 10, 0).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_create_user_tx_returns_dispatchable_event() {
    let store = MemStore::default();

    let result = store
        .create_user_tx(CreateUserParams {
            username: "carol".to_string(),
            hashed_password: random::random_string(32),
            full_name: "Carol".to_string(),
            email: "carol@example.com".to_string(),
        })
        .await
        .unwrap();

    assert_eq!(result.event.task_name(), "task:send_verify_email");
    let payload = result.event.payload();
    assert_eq!(payload["username"], "carol");
    assert_eq!(payload["email_id"], result.verify_email.id);
    assert_eq!(payload["secret_code"], result.verify_email.secret_code.as_str());
}

#[tokio::test]
async fn test_create_user_tx_duplicate_username() {
    let store = MemStore::default();

    let arg = CreateUserParams {
        username: "dave".to_string(),
        hashed_password: random::random_string(32),
        full_name: "Dave".to_string(),
        email: "dave@example.com".to_string(),
    };
    store.create_user_tx(arg.clone()).await.unwrap();

    let err = store
        .create_user_tx(CreateUserParams {
            email: "dave2@example.com".to_string(),
            ..arg
        })
        .await
        .expect_err("duplicate username must fail");
    assert!(matches!(err, StoreError::UniqueViolation(_)));
    assert_eq!(err.code(), "CONSTRAINT_VIOLATION");
}

#[tokio::test]
async fn test_one_account_per_currency() {
    let store = MemStore::default();
    let owner = create_random_user(&store).await;

    store
        .create_account(CreateAccountParams {
            owner: owner.clone(),
            balance: 0,
            currency: currency::USD.to_string(),
        })
        .await
        .unwrap();

    let err = store
        .create_account(CreateAccountParams {
            owner,
            balance: 0,
            currency: currency::USD.to_string(),
        })
        .await
        .expect_err("second USD account for the same owner must fail");
    assert!(matches!(err, StoreError::UniqueViolation(_)));
}
