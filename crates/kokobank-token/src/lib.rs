//! KokoBank Token - the KOKO reward token
//!
//! A fungible token with a single privileged minter. Even in-process it
//! follows the usual token rules:
//!
//! 1. Only the minter can mint or burn
//! 2. Minter rights move exactly once, from the deployer to the bank
//! 3. Third parties spend a holder's tokens only through an allowance
//! 4. Total supply always equals the sum of all balances
//!
//! # Atomicity
//!
//! Every mutating method validates completely before it touches state, so a
//! returned error means nothing changed. The token holds no lock of its own;
//! the bank serializes access to it.

use std::collections::{BTreeMap, HashMap, VecDeque};

use kokobank_core::{AccountId, Amount};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

/// Errors that can occur in token operations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TokenError {
    #[error("Caller {caller} is not the minter")]
    Unauthorized { caller: AccountId },

    #[error("Minter ownership has already been transferred")]
    MinterAlreadyTransferred,

    #[error("Insufficient balance: have {available}, need {required}")]
    InsufficientBalance { available: Amount, required: Amount },

    #[error("Insufficient allowance: have {available}, need {required}")]
    InsufficientAllowance { available: Amount, required: Amount },

    #[error("Token supply overflow")]
    SupplyOverflow,
}

pub type Result<T> = std::result::Result<T, TokenError>;

/// Static token metadata and bookkeeping limits
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenConfig {
    /// Human-readable name
    #[serde(default = "default_name")]
    pub name: String,
    /// Ticker symbol
    #[serde(default = "default_symbol")]
    pub symbol: String,
    /// Display precision; balances are always held in smallest units
    #[serde(default = "default_decimals")]
    pub decimals: u8,
    /// Maximum number of retained token events (oldest evicted)
    #[serde(default = "default_event_log_capacity")]
    pub event_log_capacity: usize,
}

impl Default for TokenConfig {
    fn default() -> Self {
        Self {
            name: default_name(),
            symbol: default_symbol(),
            decimals: default_decimals(),
            event_log_capacity: default_event_log_capacity(),
        }
    }
}

fn default_name() -> String {
    "Koko".to_string()
}

fn default_symbol() -> String {
    "KOKO".to_string()
}

fn default_decimals() -> u8 {
    18
}

fn default_event_log_capacity() -> usize {
    10_000
}

/// Token-level event, one per state change
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TokenEvent {
    /// Balance movement; `from: None` is a mint, `to: None` is a burn
    Transfer {
        from: Option<AccountId>,
        to: Option<AccountId>,
        amount: Amount,
    },
    Approval {
        owner: AccountId,
        spender: AccountId,
        amount: Amount,
    },
    MinterTransferred {
        previous: AccountId,
        minter: AccountId,
    },
}

/// The KOKO reward token
#[derive(Debug, Clone)]
pub struct RewardToken {
    address: AccountId,
    config: TokenConfig,
    minter: AccountId,
    minter_transferred: bool,
    balances: HashMap<AccountId, Amount>,
    allowances: HashMap<(AccountId, AccountId), Amount>,
    total_supply: Amount,
    events: VecDeque<TokenEvent>,
}

impl RewardToken {
    /// Deploy a token at `address`; the deployer starts out as minter
    pub fn new(address: AccountId, deployer: AccountId, config: TokenConfig) -> Self {
        Self {
            address,
            config,
            minter: deployer,
            minter_transferred: false,
            balances: HashMap::new(),
            allowances: HashMap::new(),
            total_supply: Amount::zero(),
            events: VecDeque::new(),
        }
    }

    pub fn address(&self) -> &AccountId {
        &self.address
    }

    pub fn config(&self) -> &TokenConfig {
        &self.config
    }

    pub fn name(&self) -> &str {
        &self.config.name
    }

    pub fn symbol(&self) -> &str {
        &self.config.symbol
    }

    pub fn decimals(&self) -> u8 {
        self.config.decimals
    }

    pub fn minter(&self) -> &AccountId {
        &self.minter
    }

    pub fn minter_transferred(&self) -> bool {
        self.minter_transferred
    }

    pub fn total_supply(&self) -> Amount {
        self.total_supply
    }

    pub fn balance_of(&self, holder: &AccountId) -> Amount {
        self.balances.get(holder).copied().unwrap_or_default()
    }

    pub fn allowance(&self, owner: &AccountId, spender: &AccountId) -> Amount {
        self.allowances
            .get(&(owner.clone(), spender.clone()))
            .copied()
            .unwrap_or_default()
    }

    /// Non-zero balances, sorted by holder
    pub fn holders(&self) -> BTreeMap<AccountId, Amount> {
        self.balances
            .iter()
            .filter(|(_, balance)| !balance.is_zero())
            .map(|(holder, balance)| (holder.clone(), *balance))
            .collect()
    }

    pub fn events(&self) -> impl Iterator<Item = &TokenEvent> {
        self.events.iter()
    }

    /// Hand minter rights to `new_minter`. One-shot: the deployer hands them
    /// to the bank at setup and they can never move again.
    pub fn transfer_minter_ownership(
        &mut self,
        caller: &AccountId,
        new_minter: &AccountId,
    ) -> Result<()> {
        self.ensure_minter(caller)?;
        if self.minter_transferred {
            return Err(TokenError::MinterAlreadyTransferred);
        }

        let previous = std::mem::replace(&mut self.minter, new_minter.clone());
        self.minter_transferred = true;
        debug!(%previous, minter = %new_minter, "minter ownership transferred");
        self.record(TokenEvent::MinterTransferred {
            previous,
            minter: new_minter.clone(),
        });
        Ok(())
    }

    /// Validate a mint without performing it
    pub fn check_mint(&self, caller: &AccountId, to: &AccountId, amount: Amount) -> Result<()> {
        self.ensure_minter(caller)?;
        self.total_supply
            .checked_add(amount)
            .ok_or(TokenError::SupplyOverflow)?;
        // supply bounds every balance, so the holder credit cannot overflow
        debug_assert!(self.balance_of(to).checked_add(amount).is_some());
        Ok(())
    }

    /// Mint `amount` to `to`. Returns the new balance of `to`.
    pub fn mint(&mut self, caller: &AccountId, to: &AccountId, amount: Amount) -> Result<Amount> {
        self.check_mint(caller, to, amount)?;

        self.total_supply = Amount(self.total_supply.0 + amount.0);
        let balance = self.balances.entry(to.clone()).or_default();
        *balance = Amount(balance.0 + amount.0);
        let new_balance = *balance;

        debug!(%to, %amount, supply = %self.total_supply, "minted");
        self.record(TokenEvent::Transfer {
            from: None,
            to: Some(to.clone()),
            amount,
        });
        Ok(new_balance)
    }

    /// Burn `amount` from `holder`. Minter only; when the minter burns
    /// someone else's tokens it spends the holder's allowance to the minter.
    pub fn burn_from(&mut self, caller: &AccountId, holder: &AccountId, amount: Amount) -> Result<()> {
        self.ensure_minter(caller)?;
        let spend_allowance = caller != holder;
        if spend_allowance {
            self.ensure_allowance(holder, caller, amount)?;
        }
        self.ensure_balance(holder, amount)?;

        if spend_allowance {
            self.spend_allowance(holder, caller, amount);
        }
        self.debit(holder, amount);
        self.total_supply = Amount(self.total_supply.0 - amount.0);

        debug!(%holder, %amount, supply = %self.total_supply, "burned");
        self.record(TokenEvent::Transfer {
            from: Some(holder.clone()),
            to: None,
            amount,
        });
        Ok(())
    }

    /// Set the amount `spender` may move out of `owner`'s balance
    pub fn approve(&mut self, owner: &AccountId, spender: &AccountId, amount: Amount) {
        self.allowances
            .insert((owner.clone(), spender.clone()), amount);
        debug!(%owner, %spender, %amount, "approval set");
        self.record(TokenEvent::Approval {
            owner: owner.clone(),
            spender: spender.clone(),
            amount,
        });
    }

    /// Move `amount` of the caller's own tokens to `to`
    pub fn transfer(&mut self, from: &AccountId, to: &AccountId, amount: Amount) -> Result<()> {
        self.ensure_balance(from, amount)?;
        self.move_balance(from, to, amount);
        Ok(())
    }

    /// Move `amount` from `owner` to `to` on behalf of `spender`
    pub fn transfer_from(
        &mut self,
        spender: &AccountId,
        owner: &AccountId,
        to: &AccountId,
        amount: Amount,
    ) -> Result<()> {
        self.ensure_allowance(owner, spender, amount)?;
        self.ensure_balance(owner, amount)?;

        self.spend_allowance(owner, spender, amount);
        self.move_balance(owner, to, amount);
        Ok(())
    }

    fn ensure_minter(&self, caller: &AccountId) -> Result<()> {
        if caller != &self.minter {
            return Err(TokenError::Unauthorized {
                caller: caller.clone(),
            });
        }
        Ok(())
    }

    fn ensure_balance(&self, holder: &AccountId, amount: Amount) -> Result<()> {
        let available = self.balance_of(holder);
        if available < amount {
            return Err(TokenError::InsufficientBalance {
                available,
                required: amount,
            });
        }
        Ok(())
    }

    fn ensure_allowance(&self, owner: &AccountId, spender: &AccountId, amount: Amount) -> Result<()> {
        let available = self.allowance(owner, spender);
        if available < amount {
            return Err(TokenError::InsufficientAllowance {
                available,
                required: amount,
            });
        }
        Ok(())
    }

    // Callers must have run ensure_allowance first.
    fn spend_allowance(&mut self, owner: &AccountId, spender: &AccountId, amount: Amount) {
        if let Some(allowance) = self.allowances.get_mut(&(owner.clone(), spender.clone())) {
            *allowance = allowance.saturating_sub(amount);
        }
    }

    // Callers must have run ensure_balance first.
    fn debit(&mut self, holder: &AccountId, amount: Amount) {
        if let Some(balance) = self.balances.get_mut(holder) {
            *balance = balance.saturating_sub(amount);
        }
    }

    fn move_balance(&mut self, from: &AccountId, to: &AccountId, amount: Amount) {
        if from != to {
            self.debit(from, amount);
            let balance = self.balances.entry(to.clone()).or_default();
            *balance = Amount(balance.0 + amount.0);
        }
        debug!(%from, %to, %amount, "transferred");
        self.record(TokenEvent::Transfer {
            from: Some(from.clone()),
            to: Some(to.clone()),
            amount,
        });
    }

    fn record(&mut self, event: TokenEvent) {
        if self.config.event_log_capacity == 0 {
            return;
        }
        if self.events.len() == self.config.event_log_capacity {
            self.events.pop_front();
        }
        self.events.push_back(event);
    }
}
