//! KokoBank Ledger - deposits, rewards and single-slot loans
//!
//! The ledger is:
//! - Custodial (deposited native value sits at the bank's address)
//! - Rewarding (every withdrawal mints a flat KOKO reward)
//! - Lending (one uncollateralized KOKO loan per account at a time)
//! - Serialized (one store, one lock, one mutation path per operation)
//!
//! # Invariants
//!
//! 1. No withdrawal without a deposit
//! 2. No second loan while one is open
//! 3. No repayment above the outstanding loan
//! 4. Failed operations leave no partial effects
//!
//! # Usage
//!
//! ```ignore
//! let deployer = AccountId::from_label("deployer");
//! let bank = Bank::in_memory(&deployer, BankConfig::default(), genesis);
//! bank.transfer_minter_ownership(&deployer, &bank.address().clone()).await?;
//!
//! bank.deposit(&alice, to_wei("0.003")?).await?;
//! bank.withdraw(&alice).await?; // alice now holds 10 KOKO units
//! ```

pub mod bank;
pub mod config;
pub mod custody;
pub mod error;
pub mod state;

pub use bank::Bank;
pub use config::{BankConfig, RepaymentMode};
pub use custody::{Custody, CustodyError, InMemoryCustody};
pub use error::{BankError, ErrorKind, Result};
pub use state::{AccountRecord, BankEvent, BankEventKind, BankSnapshot, Withdrawal};
