//! Error types for bank operations
//!
//! The display strings of the state and argument errors are part of the
//! bank's contract: callers match on them.

use kokobank_token::TokenError;
use thiserror::Error;

use crate::custody::CustodyError;

/// Errors that can occur in bank operations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BankError {
    #[error("Please deposit first, before you can withdraw")]
    NoDeposit,

    #[error("You have already borrowed some money")]
    AlreadyBorrowed,

    #[error("You haven't borrowed money yet!")]
    NoLoan,

    #[error("Please enter an amount greater than 0!")]
    ZeroAmount,

    #[error("Cannot return money greater than the borrowed!")]
    RepaymentExceedsLoan,

    #[error("Please deposit an amount greater than 0!")]
    ZeroDeposit,

    #[error("Balance overflow")]
    Overflow,

    #[error("The bank cannot operate on its own account")]
    SelfDealing,

    #[error(transparent)]
    Token(#[from] TokenError),

    #[error(transparent)]
    Custody(#[from] CustodyError),
}

/// Coarse classification of a `BankError`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The account's loan state forbids the operation
    InvalidState,
    /// The account has nothing deposited
    InsufficientState,
    /// The amount is zero or above the allowed ceiling
    InvalidArgument,
    /// Token or native balance/allowance shortfall
    InsufficientFunds,
    /// The caller lacks the required role
    Unauthorized,
    /// Arithmetic would overflow
    Overflow,
}

impl BankError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            BankError::NoDeposit => ErrorKind::InsufficientState,
            BankError::AlreadyBorrowed | BankError::NoLoan => ErrorKind::InvalidState,
            BankError::ZeroAmount | BankError::RepaymentExceedsLoan | BankError::ZeroDeposit => {
                ErrorKind::InvalidArgument
            }
            BankError::Overflow => ErrorKind::Overflow,
            BankError::SelfDealing => ErrorKind::Unauthorized,
            BankError::Token(e) => match e {
                TokenError::InsufficientBalance { .. } | TokenError::InsufficientAllowance { .. } => {
                    ErrorKind::InsufficientFunds
                }
                TokenError::Unauthorized { .. } | TokenError::MinterAlreadyTransferred => {
                    ErrorKind::Unauthorized
                }
                TokenError::SupplyOverflow => ErrorKind::Overflow,
            },
            BankError::Custody(e) => match e {
                CustodyError::InsufficientFunds { .. } => ErrorKind::InsufficientFunds,
                CustodyError::Overflow { .. } => ErrorKind::Overflow,
            },
        }
    }
}

pub type Result<T> = std::result::Result<T, BankError>;
