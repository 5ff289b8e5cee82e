//! Account records, events and snapshots

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use kokobank_core::{hash_object, AccountId, Amount};
use serde::{Deserialize, Serialize};

/// Per-account bank state. A missing record reads as all zeros.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountRecord {
    /// Native value held for the account
    pub deposited: Amount,
    /// Outstanding KOKO loan; non-zero occupies the loan slot
    pub borrowed: Amount,
}

impl AccountRecord {
    pub fn has_deposit(&self) -> bool {
        !self.deposited.is_zero()
    }

    pub fn has_loan(&self) -> bool {
        !self.borrowed.is_zero()
    }

    pub fn is_empty(&self) -> bool {
        !self.has_deposit() && !self.has_loan()
    }
}

/// Outcome of a successful withdrawal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Withdrawal {
    /// Native value returned to the caller
    pub amount: Amount,
    /// KOKO minted to the caller
    pub reward: Amount,
}

/// What a committed operation did
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BankEventKind {
    Deposited { amount: Amount },
    Withdrawn { amount: Amount, reward: Amount },
    Borrowed { amount: Amount },
    Repaid { amount: Amount, outstanding: Amount },
}

/// A committed bank operation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BankEvent {
    /// Position in the global order of committed operations, starting at 1
    pub sequence: u64,
    pub account: AccountId,
    pub kind: BankEventKind,
    pub recorded_at: DateTime<Utc>,
}

/// Point-in-time view of the whole store
///
/// Contains no timestamps, so identical operation sequences produce
/// identical snapshots.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BankSnapshot {
    pub bank: AccountId,
    pub token: AccountId,
    pub minter: AccountId,
    /// Number of committed operations
    pub sequence: u64,
    /// Non-empty account records
    pub accounts: BTreeMap<AccountId, AccountRecord>,
    /// Sum of all deposited balances
    pub total_deposits: Amount,
    /// Sum of all outstanding loans
    pub total_borrowed: Amount,
    /// Native value held by the bank's own address
    pub custody_held: Amount,
    pub token_supply: Amount,
    /// Non-zero token balances
    pub token_holders: BTreeMap<AccountId, Amount>,
}

impl BankSnapshot {
    /// SHA-256 over the snapshot's canonical JSON
    pub fn state_root(&self) -> kokobank_core::Result<String> {
        hash_object(self)
    }
}
