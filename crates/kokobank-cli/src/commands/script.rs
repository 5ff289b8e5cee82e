//! Script command - replay a JSON list of bank operations
//!
//! A script is either a bare array of commands or an object with a
//! `genesis` allocation list and `steps`:
//!
//! ```json
//! {
//!   "genesis": [{ "account": "alice", "amount": "100" }],
//!   "steps": [
//!     { "op": "deposit", "account": "alice", "amount": "0.003" },
//!     { "op": "withdraw", "account": "alice" },
//!     { "op": "borrow", "account": "bob", "amount": "50" },
//!     { "op": "approve", "owner": "bob", "spender": "bank", "amount": "50" },
//!     { "op": "repay", "account": "bob", "amount": "50" }
//!   ]
//! }
//! ```
//!
//! Accounts are labels, `0x` addresses, or `bank`. Native amounts are in
//! ether, token amounts in whole tokens.

use std::path::Path;

use anyhow::Context;
use colored::*;
use serde::{Deserialize, Serialize};

use kokobank_core::{parse_units, to_wei, AccountId};
use kokobank_ledger::{Bank, BankConfig};

use crate::display;

/// Label of the account that deploys the token and bank
pub const DEPLOYER: &str = "deployer";

/// Native value given to every genesis account unless stated otherwise
pub const DEFAULT_GENESIS_ETHER: &str = "100";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Allocation {
    pub account: String,
    #[serde(default = "default_genesis_amount")]
    pub amount: String,
}

fn default_genesis_amount() -> String {
    DEFAULT_GENESIS_ETHER.to_string()
}

/// One bank operation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Command {
    /// Credit native value from outside the bank
    Fund { account: String, amount: String },
    Deposit { account: String, amount: String },
    Withdraw { account: String },
    Borrow { account: String, amount: String },
    Approve {
        owner: String,
        spender: String,
        amount: String,
    },
    Repay { account: String, amount: String },
    /// Plain token transfer between holders
    Transfer {
        from: String,
        to: String,
        amount: String,
    },
    /// Token transfer by a spender against the owner's allowance
    TransferFrom {
        spender: String,
        owner: String,
        to: String,
        amount: String,
    },
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Script {
    #[serde(default)]
    pub genesis: Vec<Allocation>,
    pub steps: Vec<Command>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ScriptFile {
    Steps(Vec<Command>),
    Full(Script),
}

impl Script {
    pub fn from_json(json: &str) -> anyhow::Result<Self> {
        let script = match serde_json::from_str(json)? {
            ScriptFile::Steps(steps) => Script {
                genesis: Vec::new(),
                steps,
            },
            ScriptFile::Full(script) => script,
        };
        Ok(script)
    }
}

/// Result of one step
#[derive(Debug)]
pub struct StepOutcome {
    pub command: Command,
    pub result: Result<String, String>,
}

/// Deploy a fresh bank, hand it the minter role, then run every step.
/// Failing steps are recorded and execution continues.
pub async fn execute(config: BankConfig, script: &Script) -> anyhow::Result<(Bank, Vec<StepOutcome>)> {
    let deployer = AccountId::from_label(DEPLOYER);

    let mut genesis = vec![(deployer.clone(), to_wei(DEFAULT_GENESIS_ETHER)?)];
    for allocation in &script.genesis {
        let account = resolve_label(&allocation.account)
            .with_context(|| format!("genesis account {}", allocation.account))?;
        genesis.push((account, to_wei(&allocation.amount)?));
    }

    let bank = Bank::in_memory(&deployer, config, genesis);
    let bank_address = bank.address().clone();
    bank.transfer_minter_ownership(&deployer, &bank_address).await?;

    let mut outcomes = Vec::with_capacity(script.steps.len());
    for command in &script.steps {
        let result = apply(&bank, command).await.map_err(|e| e.to_string());
        outcomes.push(StepOutcome {
            command: command.clone(),
            result,
        });
    }
    Ok((bank, outcomes))
}

async fn apply(bank: &Bank, command: &Command) -> anyhow::Result<String> {
    let decimals = bank.token_config().decimals;
    let tokens = |amount: &str| parse_units(amount, decimals);

    let message = match command {
        Command::Fund { account, amount } => {
            let account = resolve(bank, account)?;
            let balance = bank.fund(&account, to_wei(amount)?).await?;
            format!("funded {}, balance {}", account, display::ether(balance))
        }
        Command::Deposit { account, amount } => {
            let account = resolve(bank, account)?;
            let record = bank.deposit(&account, to_wei(amount)?).await?;
            format!("{} deposited, now {}", account, display::ether(record.deposited))
        }
        Command::Withdraw { account } => {
            let account = resolve(bank, account)?;
            let withdrawal = bank.withdraw(&account).await?;
            format!(
                "{} withdrew {}, reward {}",
                account,
                display::ether(withdrawal.amount),
                withdrawal.reward
            )
        }
        Command::Borrow { account, amount } => {
            let account = resolve(bank, account)?;
            let record = bank.borrow(&account, tokens(amount)?).await?;
            format!("{} borrowed {}", account, record.borrowed)
        }
        Command::Approve {
            owner,
            spender,
            amount,
        } => {
            let owner = resolve(bank, owner)?;
            let spender = resolve(bank, spender)?;
            let amount = tokens(amount)?;
            bank.approve(&owner, &spender, amount).await;
            format!("{} approved {} for {}", owner, spender, amount)
        }
        Command::Repay { account, amount } => {
            let account = resolve(bank, account)?;
            let record = bank.return_borrowed_money(&account, tokens(amount)?).await?;
            format!("{} repaid, {} outstanding", account, record.borrowed)
        }
        Command::Transfer { from, to, amount } => {
            let from = resolve(bank, from)?;
            let to = resolve(bank, to)?;
            let amount = tokens(amount)?;
            bank.transfer_tokens(&from, &to, amount).await?;
            format!("{} sent {} to {}", from, amount, to)
        }
        Command::TransferFrom {
            spender,
            owner,
            to,
            amount,
        } => {
            let spender = resolve(bank, spender)?;
            let owner = resolve(bank, owner)?;
            let to = resolve(bank, to)?;
            let amount = tokens(amount)?;
            bank.transfer_tokens_from(&spender, &owner, &to, amount).await?;
            format!("{} moved {} from {} to {}", spender, amount, owner, to)
        }
    };
    Ok(message)
}

fn resolve(bank: &Bank, name: &str) -> anyhow::Result<AccountId> {
    if name == "bank" {
        return Ok(bank.address().clone());
    }
    resolve_label(name)
}

fn resolve_label(name: &str) -> anyhow::Result<AccountId> {
    if name.starts_with("0x") {
        Ok(AccountId::parse(name)?)
    } else {
        Ok(AccountId::from_label(name))
    }
}

/// Load, execute and print a script file
pub async fn run_script(config: BankConfig, path: &Path, verbose: bool) -> anyhow::Result<()> {
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("reading script {}", path.display()))?;
    let script = Script::from_json(&json)
        .with_context(|| format!("parsing script {}", path.display()))?;

    println!(
        "{} {} ({} steps)",
        "Running".bright_white().bold(),
        path.display(),
        script.steps.len()
    );

    let (bank, outcomes) = execute(config, &script).await?;

    display::section("Steps");
    let mut failed = 0;
    for (index, outcome) in outcomes.iter().enumerate() {
        match &outcome.result {
            Ok(message) => display::success(&format!("[{}] {}", index + 1, message)),
            Err(reason) => {
                failed += 1;
                display::error(&format!("[{}] {:?}: {}", index + 1, outcome.command, reason));
            }
        }
    }

    if verbose {
        super::print_events(&bank).await;
    }

    display::section("Snapshot");
    let snapshot = bank.snapshot().await;
    println!("{}", serde_json::to_string_pretty(&snapshot)?);
    display::kv("State root", &snapshot.state_root()?);
    display::kv(
        "Steps",
        &format!("{} ok, {} failed", outcomes.len() - failed, failed),
    );
    println!();

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use kokobank_core::Amount;

    const SCENARIO: &str = r#"{
        "genesis": [{ "account": "alice" }],
        "steps": [
            { "op": "deposit", "account": "alice", "amount": "0.003" },
            { "op": "withdraw", "account": "alice" },
            { "op": "withdraw", "account": "alice" },
            { "op": "borrow", "account": "bob", "amount": "50" },
            { "op": "borrow", "account": "bob", "amount": "20" },
            { "op": "approve", "owner": "bob", "spender": "bank", "amount": "50" },
            { "op": "repay", "account": "bob", "amount": "50" }
        ]
    }"#;

    #[test]
    fn test_parse_bare_step_list() {
        let script = Script::from_json(r#"[{ "op": "withdraw", "account": "alice" }]"#).unwrap();
        assert!(script.genesis.is_empty());
        assert_eq!(
            script.steps,
            vec![Command::Withdraw {
                account: "alice".to_string()
            }]
        );
    }

    #[test]
    fn test_parse_rejects_unknown_op() {
        assert!(Script::from_json(r#"[{ "op": "mint", "account": "alice" }]"#).is_err());
    }

    #[tokio::test]
    async fn test_scenario_continues_past_failures() {
        let script = Script::from_json(SCENARIO).unwrap();
        let (bank, outcomes) = execute(BankConfig::default(), &script).await.unwrap();

        let failures: Vec<usize> = outcomes
            .iter()
            .enumerate()
            .filter(|(_, o)| o.result.is_err())
            .map(|(i, _)| i)
            .collect();
        assert_eq!(failures, vec![2, 4]);
        assert_eq!(
            outcomes[2].result.as_ref().unwrap_err(),
            "Please deposit first, before you can withdraw"
        );
        assert_eq!(
            outcomes[4].result.as_ref().unwrap_err(),
            "You have already borrowed some money"
        );

        let alice = AccountId::from_label("alice");
        let bob = AccountId::from_label("bob");
        assert_eq!(bank.token_balance_of(&alice).await, Amount::new(10));
        assert_eq!(bank.token_balance_of(&bob).await, Amount::zero());
        assert_eq!(bank.borrowed_amount(&bob).await, Amount::zero());
        assert_eq!(
            bank.token_balance_of(bank.address()).await,
            parse_units("50", 18).unwrap()
        );
    }

    #[tokio::test]
    async fn test_identical_scripts_share_state_root() {
        let script = Script::from_json(SCENARIO).unwrap();
        let (first, _) = execute(BankConfig::default(), &script).await.unwrap();
        let (second, _) = execute(BankConfig::default(), &script).await.unwrap();

        assert_eq!(
            first.snapshot().await.state_root().unwrap(),
            second.snapshot().await.state_root().unwrap()
        );
    }

    #[tokio::test]
    async fn test_deposit_without_funds_fails() {
        let script = Script::from_json(
            r#"[{ "op": "deposit", "account": "pauper", "amount": "1" }]"#,
        )
        .unwrap();
        let (bank, outcomes) = execute(BankConfig::default(), &script).await.unwrap();

        assert!(outcomes[0].result.is_err());
        assert_eq!(bank.snapshot().await.sequence, 0);
    }

    #[tokio::test]
    async fn test_bank_account_is_refused_as_depositor() {
        let script = Script::from_json(
            r#"[
                { "op": "fund", "account": "bank", "amount": "1" },
                { "op": "deposit", "account": "bank", "amount": "1" },
                { "op": "withdraw", "account": "bank" }
            ]"#,
        )
        .unwrap();
        let (bank, outcomes) = execute(BankConfig::default(), &script).await.unwrap();

        assert!(outcomes[0].result.is_ok());
        for outcome in &outcomes[1..] {
            assert_eq!(
                outcome.result.as_ref().unwrap_err(),
                "The bank cannot operate on its own account"
            );
        }
        let snapshot = bank.snapshot().await;
        assert_eq!(snapshot.total_deposits, Amount::zero());
        assert_eq!(snapshot.token_supply, Amount::zero());
    }

    #[tokio::test]
    async fn test_transfer_from_spends_allowance() {
        let script = Script::from_json(
            r#"[
                { "op": "borrow", "account": "bob", "amount": "5" },
                { "op": "approve", "owner": "bob", "spender": "carol", "amount": "3" },
                { "op": "transfer_from", "spender": "carol", "owner": "bob", "to": "dave", "amount": "3" },
                { "op": "transfer_from", "spender": "carol", "owner": "bob", "to": "dave", "amount": "1" }
            ]"#,
        )
        .unwrap();
        let (bank, outcomes) = execute(BankConfig::default(), &script).await.unwrap();

        assert!(outcomes[2].result.is_ok());
        assert!(outcomes[3].result.is_err());
        let dave = AccountId::from_label("dave");
        assert_eq!(
            bank.token_balance_of(&dave).await,
            parse_units("3", 18).unwrap()
        );
    }
}
