//! Canonical types for KokoBank
//!
//! Every caller, token and bank is identified by an `AccountId`. Every
//! balance, in native units or token units, is an `Amount`.

use std::fmt;
use std::str::FromStr;

use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use uuid::Uuid;

use crate::crypto::address_from_digest;
use crate::error::{CoreError, Result};

// ============================================================================
// Identity Types
// ============================================================================

/// Number of bytes in an address
pub const ADDRESS_LEN: usize = 20;

/// Identity of an account: an externally owned caller or a deployed contract
///
/// Stored as a lowercase `0x`-prefixed hex string of 20 bytes.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct AccountId(String);

impl AccountId {
    /// Generate a fresh random account
    pub fn new() -> Self {
        Self::from_seed(Uuid::new_v4().as_bytes())
    }

    /// Derive a deterministic account from arbitrary seed bytes
    pub fn from_seed(seed: &[u8]) -> Self {
        Self(address_from_digest(&[seed]))
    }

    /// Derive a deterministic account from a human label ("alice", "deployer")
    pub fn from_label(label: &str) -> Self {
        Self::from_seed(label.as_bytes())
    }

    /// Address of the contract created by `deployer` at deployment `nonce`
    pub fn contract(deployer: &AccountId, nonce: u64) -> Self {
        Self(address_from_digest(&[
            deployer.as_str().as_bytes(),
            &nonce.to_be_bytes(),
        ]))
    }

    /// Parse and normalize a `0x`-prefixed address
    pub fn parse(value: &str) -> Result<Self> {
        let invalid = || CoreError::InvalidAddress {
            value: value.to_string(),
        };
        let hex_part = value
            .strip_prefix("0x")
            .or_else(|| value.strip_prefix("0X"))
            .ok_or_else(invalid)?;
        if hex_part.len() != ADDRESS_LEN * 2 {
            return Err(invalid());
        }
        hex::decode(hex_part).map_err(|_| invalid())?;
        Ok(Self(format!("0x{}", hex_part.to_ascii_lowercase())))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for AccountId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for AccountId {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl TryFrom<String> for AccountId {
    type Error = CoreError;

    fn try_from(value: String) -> Result<Self> {
        Self::parse(&value)
    }
}

impl From<AccountId> for String {
    fn from(id: AccountId) -> Self {
        id.0
    }
}

// ============================================================================
// Amount Types
// ============================================================================

/// An amount in smallest units (wei for native value, 1e-18 KOKO for tokens)
///
/// Serialized as a decimal string so 18-decimal values survive JSON and
/// environment round trips; integers are accepted on input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Amount(pub u128);

impl Amount {
    pub const MAX: Amount = Amount(u128::MAX);

    pub fn zero() -> Self {
        Self(0)
    }

    pub fn new(value: u128) -> Self {
        Self(value)
    }

    pub fn checked_add(self, other: Self) -> Option<Self> {
        self.0.checked_add(other.0).map(Self)
    }

    pub fn checked_sub(self, other: Self) -> Option<Self> {
        self.0.checked_sub(other.0).map(Self)
    }

    pub fn saturating_sub(self, other: Self) -> Self {
        Self(self.0.saturating_sub(other.0))
    }

    pub fn is_zero(&self) -> bool {
        self.0 == 0
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u128> for Amount {
    fn from(value: u128) -> Self {
        Self(value)
    }
}

impl From<u64> for Amount {
    fn from(value: u64) -> Self {
        Self(value as u128)
    }
}

impl FromStr for Amount {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self> {
        s.trim()
            .parse::<u128>()
            .map(Self)
            .map_err(|e| CoreError::InvalidAmount {
                message: format!("'{}': {}", s, e),
            })
    }
}

impl Serialize for Amount {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0.to_string())
    }
}

impl<'de> Deserialize<'de> for Amount {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        struct AmountVisitor;

        impl<'de> Visitor<'de> for AmountVisitor {
            type Value = Amount;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a non-negative integer or a decimal string")
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> std::result::Result<Amount, E> {
                Ok(Amount(v as u128))
            }

            fn visit_u128<E: de::Error>(self, v: u128) -> std::result::Result<Amount, E> {
                Ok(Amount(v))
            }

            fn visit_i64<E: de::Error>(self, v: i64) -> std::result::Result<Amount, E> {
                u128::try_from(v)
                    .map(Amount)
                    .map_err(|_| E::custom("amount must not be negative"))
            }

            fn visit_str<E: de::Error>(self, v: &str) -> std::result::Result<Amount, E> {
                v.parse().map_err(E::custom)
            }
        }

        deserializer.deserialize_any(AmountVisitor)
    }
}
