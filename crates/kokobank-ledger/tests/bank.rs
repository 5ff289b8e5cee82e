use std::collections::HashSet;

use kokobank_core::{to_wei, AccountId, Amount};
use kokobank_ledger::{Bank, BankConfig, BankError, ErrorKind};

struct Deployment {
    bank: Bank,
    account: AccountId,
}

async fn deploy() -> Deployment {
    let deployer = AccountId::from_label("deployer");
    let account = AccountId::from_label("account");
    let bank = Bank::in_memory(
        &deployer,
        BankConfig::default(),
        [
            (deployer.clone(), to_wei("100").unwrap()),
            (account.clone(), to_wei("100").unwrap()),
        ],
    );
    let bank_address = bank.address().clone();
    bank.transfer_minter_ownership(&deployer, &bank_address)
        .await
        .unwrap();
    Deployment { bank, account }
}

fn wei(value: &str) -> Amount {
    to_wei(value).unwrap()
}

#[tokio::test]
async fn test_can_deposit_native_value() {
    let d = deploy().await;
    let before = d.bank.native_balance(&d.account).await;

    d.bank.deposit(&d.account, wei("0.003")).await.unwrap();

    assert!(d.bank.native_balance(&d.account).await < before);
}

#[tokio::test]
async fn test_can_withdraw_deposit_and_receive_ten_tokens() {
    let d = deploy().await;
    assert_eq!(d.bank.token_balance_of(&d.account).await, Amount::zero());

    d.bank.deposit(&d.account, wei("0.003")).await.unwrap();
    let after_deposit = d.bank.native_balance(&d.account).await;

    assert_eq!(d.bank.token_balance_of(&d.account).await, Amount::zero());
    assert_eq!(d.bank.deposited_balance(&d.account).await, wei("0.003"));

    let withdrawal = d.bank.withdraw(&d.account).await.unwrap();

    assert_eq!(withdrawal.amount, wei("0.003"));
    assert_eq!(d.bank.deposited_balance(&d.account).await, Amount::zero());
    assert_eq!(d.bank.token_balance_of(&d.account).await, Amount::new(10));
    assert!(d.bank.native_balance(&d.account).await > after_deposit);
}

#[tokio::test]
async fn test_reward_does_not_scale_with_deposit() {
    let d = deploy().await;

    d.bank.deposit(&d.account, wei("42")).await.unwrap();
    d.bank.withdraw(&d.account).await.unwrap();

    assert_eq!(d.bank.token_balance_of(&d.account).await, Amount::new(10));
}

#[tokio::test]
async fn test_can_lend_tokens() {
    let d = deploy().await;
    assert_eq!(d.bank.token_balance_of(&d.account).await, Amount::zero());

    d.bank.borrow(&d.account, wei("50")).await.unwrap();

    assert_eq!(d.bank.token_balance_of(&d.account).await, wei("50"));
}

#[tokio::test]
async fn test_can_not_lend_twice_to_the_same_account() {
    let d = deploy().await;

    d.bank.borrow(&d.account, wei("50")).await.unwrap();
    assert_eq!(d.bank.token_balance_of(&d.account).await, wei("50"));

    let err = d.bank.borrow(&d.account, wei("20")).await.unwrap_err();
    assert_eq!(err.to_string(), "You have already borrowed some money");
    assert_eq!(err.kind(), ErrorKind::InvalidState);

    assert_eq!(d.bank.token_balance_of(&d.account).await, wei("50"));
    assert_eq!(d.bank.borrowed_amount(&d.account).await, wei("50"));
}

#[tokio::test]
async fn test_withdraw_without_deposit_fails() {
    let d = deploy().await;
    let native_before = d.bank.native_balance(&d.account).await;

    let err = d.bank.withdraw(&d.account).await.unwrap_err();

    assert_eq!(err.to_string(), "Please deposit first, before you can withdraw");
    assert_eq!(err.kind(), ErrorKind::InsufficientState);
    assert_eq!(d.bank.native_balance(&d.account).await, native_before);
    assert_eq!(d.bank.token_balance_of(&d.account).await, Amount::zero());
}

#[tokio::test]
async fn test_second_withdraw_fails() {
    let d = deploy().await;
    d.bank.deposit(&d.account, wei("1")).await.unwrap();
    d.bank.withdraw(&d.account).await.unwrap();

    let result = d.bank.withdraw(&d.account).await;

    assert_eq!(result, Err(BankError::NoDeposit));
    assert_eq!(d.bank.token_balance_of(&d.account).await, Amount::new(10));
}

#[tokio::test]
async fn test_can_return_borrowed_money() {
    let d = deploy().await;
    let bank_address = d.bank.address().clone();

    d.bank.borrow(&d.account, wei("50")).await.unwrap();

    assert_eq!(d.bank.token_balance_of(&d.account).await, wei("50"));
    assert_eq!(d.bank.token_balance_of(&bank_address).await, Amount::zero());

    d.bank.approve(&d.account, &bank_address, wei("50")).await;
    d.bank
        .return_borrowed_money(&d.account, wei("50"))
        .await
        .unwrap();

    assert_eq!(d.bank.token_balance_of(&d.account).await, Amount::zero());
    assert_eq!(d.bank.token_balance_of(&bank_address).await, wei("50"));
    assert_eq!(d.bank.borrowed_amount(&d.account).await, Amount::zero());
}

#[tokio::test]
async fn test_cannot_return_borrowed_money_if_never_borrowed() {
    let d = deploy().await;

    for amount in [wei("1"), Amount::zero(), Amount::MAX] {
        let err = d
            .bank
            .return_borrowed_money(&d.account, amount)
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "You haven't borrowed money yet!");
    }
}

#[tokio::test]
async fn test_cannot_return_zero() {
    let d = deploy().await;
    d.bank.borrow(&d.account, wei("10")).await.unwrap();

    let err = d
        .bank
        .return_borrowed_money(&d.account, Amount::zero())
        .await
        .unwrap_err();

    assert_eq!(err.to_string(), "Please enter an amount greater than 0!");
    assert_eq!(err.kind(), ErrorKind::InvalidArgument);
}

#[tokio::test]
async fn test_cannot_return_more_than_borrowed() {
    let d = deploy().await;
    let bank_address = d.bank.address().clone();
    d.bank.borrow(&d.account, wei("10")).await.unwrap();
    d.bank.approve(&d.account, &bank_address, wei("11")).await;

    let err = d
        .bank
        .return_borrowed_money(&d.account, wei("11"))
        .await
        .unwrap_err();

    assert_eq!(err.to_string(), "Cannot return money greater than the borrowed!");
    assert_eq!(d.bank.borrowed_amount(&d.account).await, wei("10"));
    assert_eq!(d.bank.token_balance_of(&d.account).await, wei("10"));
}

#[tokio::test]
async fn test_end_to_end_scenario() {
    let d = deploy().await;
    let bank_address = d.bank.address().clone();

    d.bank.deposit(&d.account, wei("0.003")).await.unwrap();
    d.bank.withdraw(&d.account).await.unwrap();
    assert_eq!(d.bank.token_balance_of(&d.account).await, Amount::new(10));

    let borrower = AccountId::from_label("borrower");
    d.bank.borrow(&borrower, Amount::new(50)).await.unwrap();
    assert_eq!(d.bank.token_balance_of(&borrower).await, Amount::new(50));

    d.bank.approve(&borrower, &bank_address, Amount::new(50)).await;
    d.bank
        .return_borrowed_money(&borrower, Amount::new(50))
        .await
        .unwrap();

    assert_eq!(d.bank.token_balance_of(&borrower).await, Amount::zero());
    assert_eq!(d.bank.token_balance_of(&bank_address).await, Amount::new(50));
    assert_eq!(d.bank.borrowed_amount(&borrower).await, Amount::zero());

    let snapshot = d.bank.snapshot().await;
    let holder_sum: u128 = snapshot.token_holders.values().map(|a| a.0).sum();
    assert_eq!(snapshot.token_supply, Amount::new(holder_sum));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_borrows_open_one_loan_per_account() {
    let d = deploy().await;

    let mut handles = Vec::new();
    for _ in 0..32 {
        let bank = d.bank.clone();
        let account = d.account.clone();
        handles.push(tokio::spawn(async move {
            bank.borrow(&account, Amount::new(7)).await
        }));
    }

    let mut successes = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => successes += 1,
            Err(e) => assert_eq!(e, BankError::AlreadyBorrowed),
        }
    }

    assert_eq!(successes, 1);
    assert_eq!(d.bank.token_balance_of(&d.account).await, Amount::new(7));
    assert_eq!(d.bank.total_supply().await, Amount::new(7));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_accounts_are_independent() {
    let d = deploy().await;
    let accounts: Vec<AccountId> = (0..16).map(|_| AccountId::new()).collect();
    for account in &accounts {
        d.bank.fund(account, Amount::new(1_000)).await.unwrap();
    }

    let mut handles = Vec::new();
    for account in accounts.clone() {
        let bank = d.bank.clone();
        handles.push(tokio::spawn(async move {
            bank.deposit(&account, Amount::new(100)).await?;
            bank.borrow(&account, Amount::new(3)).await?;
            bank.withdraw(&account).await?;
            Ok::<_, BankError>(())
        }));
    }
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    let unique: HashSet<_> = accounts.iter().collect();
    assert_eq!(unique.len(), accounts.len());

    for account in &accounts {
        assert_eq!(d.bank.native_balance(account).await, Amount::new(1_000));
        assert_eq!(d.bank.token_balance_of(account).await, Amount::new(13));
        assert_eq!(d.bank.borrowed_amount(account).await, Amount::new(3));
    }

    let snapshot = d.bank.snapshot().await;
    assert_eq!(snapshot.total_deposits, Amount::zero());
    assert_eq!(snapshot.custody_held, Amount::zero());
    assert_eq!(snapshot.token_supply, Amount::new(13 * 16));
    assert_eq!(snapshot.sequence, 16 * 3);
}
