//! The bank: deposits, rewards and single-slot loans
//!
//! All state (native custody, the KOKO token, account records and the event
//! log) sits in one store behind a single `RwLock`. Every mutating operation
//! takes the write lock once, validates everything, and only then applies its
//! effects, so operations are totally ordered and a failed call changes
//! nothing.

use std::collections::{BTreeMap, HashMap, VecDeque};
use std::sync::Arc;

use chrono::Utc;
use kokobank_core::{AccountId, Amount};
use kokobank_token::{RewardToken, TokenConfig, TokenEvent};
use tokio::sync::RwLock;
use tracing::{info, warn};

use crate::config::{BankConfig, RepaymentMode};
use crate::custody::{Custody, CustodyError, InMemoryCustody};
use crate::error::{BankError, Result};
use crate::state::{AccountRecord, BankEvent, BankEventKind, BankSnapshot, Withdrawal};

/// Deployment nonce of the token contract
const TOKEN_NONCE: u64 = 0;
/// Deployment nonce of the bank contract
const BANK_NONCE: u64 = 1;

struct BankState<C> {
    custody: C,
    token: RewardToken,
    accounts: HashMap<AccountId, AccountRecord>,
    events: VecDeque<BankEvent>,
    sequence: u64,
}

impl<C> BankState<C> {
    fn record(&self, account: &AccountId) -> AccountRecord {
        self.accounts.get(account).copied().unwrap_or_default()
    }

    fn commit(
        &mut self,
        account: &AccountId,
        record: AccountRecord,
        kind: BankEventKind,
        capacity: usize,
    ) {
        if record.is_empty() {
            self.accounts.remove(account);
        } else {
            self.accounts.insert(account.clone(), record);
        }

        self.sequence += 1;
        if capacity == 0 {
            return;
        }
        if self.events.len() == capacity {
            self.events.pop_front();
        }
        self.events.push_back(BankEvent {
            sequence: self.sequence,
            account: account.clone(),
            kind,
            recorded_at: Utc::now(),
        });
    }
}

/// The KokoBank ledger
///
/// Cheap to clone; clones share the same store.
pub struct Bank<C: Custody = InMemoryCustody> {
    address: AccountId,
    token_address: AccountId,
    config: Arc<BankConfig>,
    state: Arc<RwLock<BankState<C>>>,
}

impl<C: Custody> Clone for Bank<C> {
    fn clone(&self) -> Self {
        Self {
            address: self.address.clone(),
            token_address: self.token_address.clone(),
            config: Arc::clone(&self.config),
            state: Arc::clone(&self.state),
        }
    }
}

impl<C: Custody> Bank<C> {
    /// Deploy the token and the bank from `deployer`
    ///
    /// The deployer starts out as the token's minter; it has to hand minter
    /// rights to the bank with `transfer_minter_ownership` before any
    /// withdrawal or borrow can mint.
    pub fn deploy(deployer: &AccountId, config: BankConfig, custody: C) -> Self {
        let token_address = AccountId::contract(deployer, TOKEN_NONCE);
        let address = AccountId::contract(deployer, BANK_NONCE);
        let token = RewardToken::new(
            token_address.clone(),
            deployer.clone(),
            config.token.clone(),
        );

        info!(
            bank = %address,
            token = %token_address,
            %deployer,
            "bank deployed"
        );

        Self {
            address,
            token_address,
            config: Arc::new(config),
            state: Arc::new(RwLock::new(BankState {
                custody,
                token,
                accounts: HashMap::new(),
                events: VecDeque::new(),
                sequence: 0,
            })),
        }
    }

    /// Address of the bank; custodies deposits and acts as token minter
    pub fn address(&self) -> &AccountId {
        &self.address
    }

    pub fn token_address(&self) -> &AccountId {
        &self.token_address
    }

    pub fn config(&self) -> &BankConfig {
        &self.config
    }

    // ========================================================================
    // Ledger operations
    // ========================================================================

    /// Move `amount` of native value from `caller` into the bank
    pub async fn deposit(&self, caller: &AccountId, amount: Amount) -> Result<AccountRecord> {
        self.ensure_customer("deposit", caller)?;
        let mut guard = self.state.write().await;
        let state = &mut *guard;

        if amount.is_zero() && !self.config.allow_zero_deposit {
            return Err(rejected("deposit", caller, BankError::ZeroDeposit));
        }

        let mut record = state.record(caller);
        record.deposited = record
            .deposited
            .checked_add(amount)
            .ok_or_else(|| rejected("deposit", caller, BankError::Overflow))?;

        state
            .custody
            .transfer(caller, &self.address, amount)
            .map_err(|e| rejected("deposit", caller, e.into()))?;

        state.commit(
            caller,
            record,
            BankEventKind::Deposited { amount },
            self.config.event_log_capacity,
        );
        info!(account = %caller, %amount, deposited = %record.deposited, "deposit committed");
        Ok(record)
    }

    /// Return the caller's whole deposit and mint the flat KOKO reward
    pub async fn withdraw(&self, caller: &AccountId) -> Result<Withdrawal> {
        self.ensure_customer("withdraw", caller)?;
        let mut guard = self.state.write().await;
        let state = &mut *guard;

        let mut record = state.record(caller);
        if !record.has_deposit() {
            return Err(rejected("withdraw", caller, BankError::NoDeposit));
        }
        let amount = record.deposited;
        let reward = self.config.reward_per_withdrawal;

        // The payout is the only effect that can fail once the mint is
        // validated, so it goes first.
        state
            .token
            .check_mint(&self.address, caller, reward)
            .map_err(|e| rejected("withdraw", caller, e.into()))?;
        state
            .custody
            .transfer(&self.address, caller, amount)
            .map_err(|e| rejected("withdraw", caller, e.into()))?;
        state.token.mint(&self.address, caller, reward)?;

        record.deposited = Amount::zero();
        state.commit(
            caller,
            record,
            BankEventKind::Withdrawn { amount, reward },
            self.config.event_log_capacity,
        );
        info!(account = %caller, %amount, %reward, "withdrawal committed");
        Ok(Withdrawal { amount, reward })
    }

    /// Open the caller's single loan slot and mint `amount` KOKO to it
    pub async fn borrow(&self, caller: &AccountId, amount: Amount) -> Result<AccountRecord> {
        self.ensure_customer("borrow", caller)?;
        let mut guard = self.state.write().await;
        let state = &mut *guard;

        let mut record = state.record(caller);
        if record.has_loan() {
            return Err(rejected("borrow", caller, BankError::AlreadyBorrowed));
        }
        if amount.is_zero() {
            return Err(rejected("borrow", caller, BankError::ZeroAmount));
        }

        state
            .token
            .mint(&self.address, caller, amount)
            .map_err(|e| rejected("borrow", caller, e.into()))?;

        record.borrowed = amount;
        state.commit(
            caller,
            record,
            BankEventKind::Borrowed { amount },
            self.config.event_log_capacity,
        );
        info!(account = %caller, %amount, "loan opened");
        Ok(record)
    }

    /// Repay up to the outstanding loan with KOKO the caller approved the
    /// bank to pull
    pub async fn return_borrowed_money(
        &self,
        caller: &AccountId,
        amount: Amount,
    ) -> Result<AccountRecord> {
        self.ensure_customer("repay", caller)?;
        let mut guard = self.state.write().await;
        let state = &mut *guard;

        let mut record = state.record(caller);
        if !record.has_loan() {
            return Err(rejected("repay", caller, BankError::NoLoan));
        }
        if amount.is_zero() {
            return Err(rejected("repay", caller, BankError::ZeroAmount));
        }
        let outstanding = record
            .borrowed
            .checked_sub(amount)
            .ok_or_else(|| rejected("repay", caller, BankError::RepaymentExceedsLoan))?;

        let pulled = match self.config.repayment_mode {
            RepaymentMode::Retain => {
                state
                    .token
                    .transfer_from(&self.address, caller, &self.address, amount)
            }
            RepaymentMode::Burn => state.token.burn_from(&self.address, caller, amount),
        };
        pulled.map_err(|e| rejected("repay", caller, e.into()))?;

        record.borrowed = outstanding;
        state.commit(
            caller,
            record,
            BankEventKind::Repaid {
                amount,
                outstanding,
            },
            self.config.event_log_capacity,
        );
        info!(account = %caller, %amount, %outstanding, "repayment committed");
        Ok(record)
    }

    /// The bank's own address holds every deposit in custody, so it can
    /// never be a depositor or borrower itself.
    fn ensure_customer(&self, operation: &str, caller: &AccountId) -> Result<()> {
        if caller == &self.address {
            return Err(rejected(operation, caller, BankError::SelfDealing));
        }
        Ok(())
    }

    // ========================================================================
    // Ledger queries
    // ========================================================================

    pub async fn account(&self, account: &AccountId) -> AccountRecord {
        self.state.read().await.record(account)
    }

    pub async fn deposited_balance(&self, account: &AccountId) -> Amount {
        self.account(account).await.deposited
    }

    pub async fn borrowed_amount(&self, account: &AccountId) -> Amount {
        self.account(account).await.borrowed
    }

    /// Native balance of any account, as seen by the custody substrate
    pub async fn native_balance(&self, account: &AccountId) -> Amount {
        self.state.read().await.custody.balance_of(account)
    }

    /// All retained events, oldest first
    pub async fn events(&self) -> Vec<BankEvent> {
        self.state.read().await.events.iter().cloned().collect()
    }

    pub async fn account_events(&self, account: &AccountId) -> Vec<BankEvent> {
        let state = self.state.read().await;
        state
            .events
            .iter()
            .filter(|e| &e.account == account)
            .cloned()
            .collect()
    }

    /// Get recent events (newest first)
    pub async fn recent_events(&self, limit: usize) -> Vec<BankEvent> {
        let state = self.state.read().await;
        state.events.iter().rev().take(limit).cloned().collect()
    }

    pub async fn snapshot(&self) -> BankSnapshot {
        let state = self.state.read().await;
        let accounts: BTreeMap<AccountId, AccountRecord> = state
            .accounts
            .iter()
            .map(|(account, record)| (account.clone(), *record))
            .collect();
        let total_deposits = accounts
            .values()
            .fold(Amount::zero(), |acc, r| Amount(acc.0.saturating_add(r.deposited.0)));
        let total_borrowed = accounts
            .values()
            .fold(Amount::zero(), |acc, r| Amount(acc.0.saturating_add(r.borrowed.0)));

        BankSnapshot {
            bank: self.address.clone(),
            token: self.token_address.clone(),
            minter: state.token.minter().clone(),
            sequence: state.sequence,
            accounts,
            total_deposits,
            total_borrowed,
            custody_held: state.custody.balance_of(&self.address),
            token_supply: state.token.total_supply(),
            token_holders: state.token.holders(),
        }
    }

    // ========================================================================
    // Token surface
    // ========================================================================

    /// Hand the token's minter rights to `new_minter` (normally the bank)
    pub async fn transfer_minter_ownership(
        &self,
        caller: &AccountId,
        new_minter: &AccountId,
    ) -> Result<()> {
        let mut state = self.state.write().await;
        state
            .token
            .transfer_minter_ownership(caller, new_minter)
            .map_err(|e| rejected("transfer_minter_ownership", caller, e.into()))?;
        info!(%caller, minter = %new_minter, "token minter transferred");
        Ok(())
    }

    pub async fn approve(&self, owner: &AccountId, spender: &AccountId, amount: Amount) {
        self.state.write().await.token.approve(owner, spender, amount);
    }

    pub async fn transfer_tokens(
        &self,
        from: &AccountId,
        to: &AccountId,
        amount: Amount,
    ) -> Result<()> {
        let mut state = self.state.write().await;
        state
            .token
            .transfer(from, to, amount)
            .map_err(|e| rejected("transfer_tokens", from, e.into()))
    }

    pub async fn transfer_tokens_from(
        &self,
        spender: &AccountId,
        owner: &AccountId,
        to: &AccountId,
        amount: Amount,
    ) -> Result<()> {
        let mut state = self.state.write().await;
        state
            .token
            .transfer_from(spender, owner, to, amount)
            .map_err(|e| rejected("transfer_tokens_from", spender, e.into()))
    }

    pub async fn token_balance_of(&self, holder: &AccountId) -> Amount {
        self.state.read().await.token.balance_of(holder)
    }

    pub async fn allowance(&self, owner: &AccountId, spender: &AccountId) -> Amount {
        self.state.read().await.token.allowance(owner, spender)
    }

    pub async fn total_supply(&self) -> Amount {
        self.state.read().await.token.total_supply()
    }

    pub async fn token_minter(&self) -> AccountId {
        self.state.read().await.token.minter().clone()
    }

    pub fn token_config(&self) -> &TokenConfig {
        &self.config.token
    }

    pub async fn token_events(&self) -> Vec<TokenEvent> {
        self.state.read().await.token.events().cloned().collect()
    }
}

impl Bank<InMemoryCustody> {
    /// Deploy over a fresh in-memory custody seeded with `genesis`
    pub fn in_memory(
        deployer: &AccountId,
        config: BankConfig,
        genesis: impl IntoIterator<Item = (AccountId, Amount)>,
    ) -> Self {
        Self::deploy(deployer, config, InMemoryCustody::with_genesis(genesis))
    }

    /// Faucet: credit native value to `account`. Returns the new balance.
    pub async fn fund(&self, account: &AccountId, amount: Amount) -> std::result::Result<Amount, CustodyError> {
        self.state.write().await.custody.fund(account, amount)
    }

    /// Non-zero native balances, sorted by account
    pub async fn native_balances(&self) -> BTreeMap<AccountId, Amount> {
        self.state.read().await.custody.balances()
    }
}

fn rejected(operation: &str, caller: &AccountId, error: BankError) -> BankError {
    warn!(operation, account = %caller, %error, "operation rejected");
    error
}
