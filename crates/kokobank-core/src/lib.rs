//! KokoBank Core - Canonical identity and amount types
//!
//! This crate holds the primitives shared by the token and the bank:
//! - AccountId: 20-byte hex address identifying a caller or a contract
//! - Amount: unsigned amount in smallest units (wei-like)
//! - units: exact conversion between decimal strings and smallest units
//! - crypto: address derivation and state hashing
//!
//! # Invariants
//!
//! 1. Amounts never go negative; all arithmetic is checked
//! 2. Addresses are always lowercase `0x` + 40 hex characters
//! 3. Hashes are deterministic for the same serialized input

pub mod crypto;
pub mod error;
pub mod types;
pub mod units;

pub use crypto::*;
pub use error::*;
pub use types::*;
pub use units::*;
