//! Native value custody
//!
//! The bank moves base-unit value through a `Custody` implementation. The
//! trait is synchronous: it is always invoked while the bank's store lock is
//! held, so a transfer is part of the enclosing operation.

use std::collections::{BTreeMap, HashMap};

use kokobank_core::{AccountId, Amount};
use thiserror::Error;

/// Errors raised by the value-transfer substrate
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CustodyError {
    #[error("Insufficient native funds in {account}: have {available}, need {required}")]
    InsufficientFunds {
        account: AccountId,
        available: Amount,
        required: Amount,
    },

    #[error("Native balance overflow for {account}")]
    Overflow { account: AccountId },
}

/// Value-transfer substrate for the native base unit
pub trait Custody: Send + Sync + 'static {
    /// Spendable balance of `account`
    fn balance_of(&self, account: &AccountId) -> Amount;

    /// Move `amount` from `from` to `to`. Must either fully apply or leave
    /// both balances untouched.
    fn transfer(
        &mut self,
        from: &AccountId,
        to: &AccountId,
        amount: Amount,
    ) -> Result<(), CustodyError>;
}

/// In-memory native balances with genesis allocation and a faucet
#[derive(Debug, Clone, Default)]
pub struct InMemoryCustody {
    balances: HashMap<AccountId, Amount>,
}

impl InMemoryCustody {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create with initial balances
    pub fn with_genesis(allocations: impl IntoIterator<Item = (AccountId, Amount)>) -> Self {
        let mut custody = Self::new();
        for (account, amount) in allocations {
            let balance = custody.balances.entry(account).or_default();
            *balance = Amount(balance.0.saturating_add(amount.0));
        }
        custody
    }

    /// Credit `amount` out of thin air. Returns the new balance.
    pub fn fund(&mut self, account: &AccountId, amount: Amount) -> Result<Amount, CustodyError> {
        let balance = self.balances.entry(account.clone()).or_default();
        *balance = balance
            .checked_add(amount)
            .ok_or_else(|| CustodyError::Overflow {
                account: account.clone(),
            })?;
        Ok(*balance)
    }

    /// Non-zero balances, sorted by account
    pub fn balances(&self) -> BTreeMap<AccountId, Amount> {
        self.balances
            .iter()
            .filter(|(_, balance)| !balance.is_zero())
            .map(|(account, balance)| (account.clone(), *balance))
            .collect()
    }
}

impl Custody for InMemoryCustody {
    fn balance_of(&self, account: &AccountId) -> Amount {
        self.balances.get(account).copied().unwrap_or_default()
    }

    fn transfer(
        &mut self,
        from: &AccountId,
        to: &AccountId,
        amount: Amount,
    ) -> Result<(), CustodyError> {
        let available = self.balance_of(from);
        let remaining = available
            .checked_sub(amount)
            .ok_or_else(|| CustodyError::InsufficientFunds {
                account: from.clone(),
                available,
                required: amount,
            })?;
        if from == to {
            return Ok(());
        }
        let credited = self
            .balance_of(to)
            .checked_add(amount)
            .ok_or_else(|| CustodyError::Overflow {
                account: to.clone(),
            })?;

        self.balances.insert(from.clone(), remaining);
        self.balances.insert(to.clone(), credited);
        Ok(())
    }
}
