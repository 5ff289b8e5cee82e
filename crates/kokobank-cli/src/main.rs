//! KokoBank CLI - deposits, rewards and loans in one process
//!
//! Every invocation deploys a fresh in-memory bank, so runs are
//! reproducible and nothing is persisted between them.
//!
//! # Quick Start
//!
//! ```bash
//! # Walk through deposit, withdraw, borrow and repay
//! kokobank demo
//!
//! # Replay a JSON script of operations
//! kokobank run scenario.json
//!
//! # Show the effective configuration
//! kokobank --config bank.toml config
//! ```

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use colored::*;
use kokobank_ledger::BankConfig;

mod commands;
mod display;
mod logging;

use commands::{demo, script};
use logging::LoggingConfig;

/// KokoBank CLI - a custodial bank with KOKO rewards and single-slot loans
#[derive(Parser)]
#[command(name = "kokobank")]
#[command(author = "KokoBank Contributors")]
#[command(version)]
#[command(about = "Deposit, withdraw for KOKO rewards, borrow and repay", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Configuration file (toml, json or yaml)
    #[arg(long, global = true, env = "KOKOBANK_CONFIG")]
    config: Option<PathBuf>,

    /// Log level filter, overridden by RUST_LOG
    #[arg(long, global = true, env = "KOKOBANK_LOG_LEVEL", default_value = "warn")]
    log_level: String,

    /// Log output format
    #[arg(long, global = true, default_value = "pretty", value_parser = ["pretty", "json"])]
    log_format: String,

    /// Print the event log after each command
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the end-to-end scenario: deposit, withdraw, borrow, repay
    Demo {
        /// Native value to deposit, in ether
        #[arg(long, default_value = "0.003")]
        deposit: String,

        /// KOKO to borrow and repay, in whole tokens
        #[arg(long, default_value = "50")]
        borrow: String,
    },

    /// Execute a JSON script of bank operations against a fresh bank
    Run {
        /// Path to the script file
        script: PathBuf,
    },

    /// Print the effective configuration as JSON
    Config,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    logging::init_logging(&LoggingConfig {
        level: cli.log_level.clone(),
        format: cli.log_format.clone(),
    })?;

    let config_path = cli.config.as_deref().and_then(|p| p.to_str());
    let config = match BankConfig::load(config_path) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{} {}", "Invalid configuration:".bright_red().bold(), e);
            std::process::exit(2);
        }
    };
    tracing::debug!(?config, "configuration loaded");

    match cli.command {
        Commands::Demo { deposit, borrow } => {
            demo::run_demo(config, &deposit, &borrow, cli.verbose).await?;
        }
        Commands::Run { script } => {
            script::run_script(config, &script, cli.verbose).await?;
        }
        Commands::Config => {
            println!("{}", serde_json::to_string_pretty(&config)?);
        }
    }

    Ok(())
}
