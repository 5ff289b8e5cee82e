//! Error types for KokoBank core primitives

use thiserror::Error;

/// Errors raised while parsing or converting core values
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CoreError {
    #[error("Invalid address: {value}")]
    InvalidAddress { value: String },

    #[error("Invalid amount: {message}")]
    InvalidAmount { message: String },

    #[error("Amount overflow")]
    AmountOverflow,

    #[error("Serialization error: {message}")]
    SerializationError { message: String },
}

impl From<serde_json::Error> for CoreError {
    fn from(e: serde_json::Error) -> Self {
        CoreError::SerializationError {
            message: e.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, CoreError>;
