//! Decimal unit conversion
//!
//! Converts human decimal strings ("0.003") to smallest units and back
//! without going through floating point.

use crate::error::{CoreError, Result};
use crate::types::Amount;

/// Decimals of the native base unit (wei per ether)
pub const ETHER_DECIMALS: u8 = 18;

/// Largest supported precision; 10^38 is the largest power of ten in a u128
pub const MAX_DECIMALS: u8 = 38;

/// Parse a decimal string into smallest units with `decimals` precision
///
/// `parse_units("0.003", 18)` is `3_000_000_000_000_000`.
pub fn parse_units(value: &str, decimals: u8) -> Result<Amount> {
    if decimals > MAX_DECIMALS {
        return Err(CoreError::InvalidAmount {
            message: format!("precision {} exceeds {}", decimals, MAX_DECIMALS),
        });
    }

    let value = value.trim();
    let invalid = |reason: &str| CoreError::InvalidAmount {
        message: format!("'{}': {}", value, reason),
    };

    let (whole, fraction) = match value.split_once('.') {
        Some((w, f)) => (w, f),
        None => (value, ""),
    };
    if whole.is_empty() && fraction.is_empty() {
        return Err(invalid("empty"));
    }
    if !whole.chars().all(|c| c.is_ascii_digit()) || !fraction.chars().all(|c| c.is_ascii_digit())
    {
        return Err(invalid("expected digits with an optional decimal point"));
    }

    let fraction = fraction.trim_end_matches('0');
    if fraction.len() > decimals as usize {
        return Err(invalid("too many fractional digits"));
    }

    let scale = 10u128.pow(decimals as u32);
    let whole_units = if whole.is_empty() {
        0
    } else {
        whole.parse::<u128>().map_err(|_| CoreError::AmountOverflow)?
    };
    let fraction_units = if fraction.is_empty() {
        0
    } else {
        let padded = format!("{:0<width$}", fraction, width = decimals as usize);
        padded.parse::<u128>().map_err(|_| CoreError::AmountOverflow)?
    };

    whole_units
        .checked_mul(scale)
        .and_then(|v| v.checked_add(fraction_units))
        .map(Amount)
        .ok_or(CoreError::AmountOverflow)
}

/// Format smallest units as a decimal string, keeping at least one
/// fractional digit ("50.0", "0.003")
pub fn format_units(amount: Amount, decimals: u8) -> String {
    if decimals == 0 {
        return amount.0.to_string();
    }
    let decimals = decimals.min(MAX_DECIMALS);
    let scale = 10u128.pow(decimals as u32);
    let whole = amount.0 / scale;
    let fraction = format!("{:0>width$}", amount.0 % scale, width = decimals as usize);
    let fraction = fraction.trim_end_matches('0');
    if fraction.is_empty() {
        format!("{}.0", whole)
    } else {
        format!("{}.{}", whole, fraction)
    }
}

/// Parse an ether-denominated string into wei
pub fn to_wei(ether: &str) -> Result<Amount> {
    parse_units(ether, ETHER_DECIMALS)
}

/// Format wei as an ether-denominated string
pub fn from_wei(wei: Amount) -> String {
    format_units(wei, ETHER_DECIMALS)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_wei() {
        assert_eq!(to_wei("0.003").unwrap(), Amount::new(3_000_000_000_000_000));
        assert_eq!(to_wei("50").unwrap(), Amount::new(50_000_000_000_000_000_000));
        assert_eq!(to_wei(".5").unwrap(), Amount::new(500_000_000_000_000_000));
        assert_eq!(to_wei("1.000").unwrap(), Amount::new(1_000_000_000_000_000_000));
    }

    #[test]
    fn test_parse_units_rejects_garbage() {
        assert!(parse_units("", 18).is_err());
        assert!(parse_units(".", 18).is_err());
        assert!(parse_units("-1", 18).is_err());
        assert!(parse_units("1e18", 18).is_err());
        assert!(parse_units("0.123", 2).is_err());
        assert_eq!(
            parse_units("340282366920938463463374607431768211456", 0),
            Err(CoreError::AmountOverflow)
        );
    }

    #[test]
    fn test_format_units() {
        assert_eq!(from_wei(Amount::new(3_000_000_000_000_000)), "0.003");
        assert_eq!(from_wei(Amount::new(50_000_000_000_000_000_000)), "50.0");
        assert_eq!(from_wei(Amount::zero()), "0.0");
        assert_eq!(format_units(Amount::new(10), 0), "10");
        assert_eq!(format_units(Amount::new(10050), 2), "100.5");
    }
}
