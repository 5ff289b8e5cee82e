//! Bank Configuration
//!
//! Supports config files and environment variables (`KOKOBANK__*`).

use std::path::Path;

use kokobank_core::Amount;
use kokobank_token::TokenConfig;
use serde::{Deserialize, Serialize};

/// What happens to KOKO pulled back from a borrower on repayment
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RepaymentMode {
    /// Keep the repaid tokens in the bank's own token balance
    #[default]
    Retain,
    /// Destroy the repaid tokens, reducing total supply
    Burn,
}

/// Bank configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BankConfig {
    /// Flat KOKO reward minted on every successful withdrawal (smallest units)
    #[serde(default = "default_reward_per_withdrawal")]
    pub reward_per_withdrawal: Amount,

    /// Accept zero-value deposits as no-ops instead of rejecting them
    #[serde(default)]
    pub allow_zero_deposit: bool,

    /// Settlement of repaid tokens
    #[serde(default)]
    pub repayment_mode: RepaymentMode,

    /// Maximum number of retained bank events (oldest evicted)
    #[serde(default = "default_event_log_capacity")]
    pub event_log_capacity: usize,

    /// Reward token metadata
    #[serde(default)]
    pub token: TokenConfig,
}

impl Default for BankConfig {
    fn default() -> Self {
        Self {
            reward_per_withdrawal: default_reward_per_withdrawal(),
            allow_zero_deposit: false,
            repayment_mode: RepaymentMode::default(),
            event_log_capacity: default_event_log_capacity(),
            token: TokenConfig::default(),
        }
    }
}

fn default_reward_per_withdrawal() -> Amount {
    Amount::new(10)
}

fn default_event_log_capacity() -> usize {
    10_000
}

impl BankConfig {
    /// Load configuration from the default locations, an optional file and
    /// the environment. Later sources override earlier ones.
    pub fn load(config_path: Option<&str>) -> Result<Self, config::ConfigError> {
        Self::load_from_dir(Path::new("config"), config_path)
    }

    fn load_from_dir(
        config_dir: &Path,
        config_path: Option<&str>,
    ) -> Result<Self, config::ConfigError> {
        // Load .env file if present
        let _ = dotenvy::dotenv();

        let mut builder = config::Config::builder()
            .add_source(config::File::from(config_dir.join("default")).required(false))
            .add_source(config::File::from(config_dir.join("local")).required(false));

        if let Some(path) = config_path {
            builder = builder.add_source(config::File::with_name(path).required(true));
        }

        // Environment variables with KOKOBANK_ prefix, e.g. KOKOBANK__TOKEN__SYMBOL
        builder = builder.add_source(
            config::Environment::with_prefix("KOKOBANK")
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        );

        builder.build()?.try_deserialize()
    }
}
