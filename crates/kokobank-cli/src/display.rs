//! Display utilities for the CLI

use colored::*;
use kokobank_core::{format_units, Amount, ETHER_DECIMALS};

/// Print a section header
pub fn section(title: &str) {
    println!();
    println!("{}", "━".repeat(60).bright_black());
    println!(" {}", title.bright_white().bold());
    println!("{}", "━".repeat(60).bright_black());
}

/// Print a success message
pub fn success(message: &str) {
    println!("  {} {}", "✓".bright_green(), message);
}

/// Print an error message
pub fn error(message: &str) {
    println!("  {} {}", "✗".bright_red(), message.bright_red());
}

/// Print an info message
pub fn info(message: &str) {
    println!("  {} {}", "→".bright_blue(), message);
}

/// Print a key-value pair
pub fn kv(key: &str, value: &str) {
    println!("      {}: {}", key, value.bright_cyan());
}

/// Native amount as "<ether> ETH"
pub fn ether(amount: Amount) -> String {
    format!("{} ETH", format_units(amount, ETHER_DECIMALS))
}

/// Token amount as "<units> KOKO (<raw>)"
pub fn koko(amount: Amount, decimals: u8, symbol: &str) -> String {
    format!("{} {} ({} units)", format_units(amount, decimals), symbol, amount)
}
