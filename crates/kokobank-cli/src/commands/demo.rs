//! Demo command - the full deposit, reward, loan and repayment cycle

use colored::*;

use kokobank_core::{parse_units, to_wei, AccountId};
use kokobank_ledger::{Bank, BankConfig};

use crate::display;

/// Run the end-to-end scenario against a fresh in-memory bank
pub async fn run_demo(
    config: BankConfig,
    deposit: &str,
    borrow: &str,
    verbose: bool,
) -> anyhow::Result<()> {
    println!("{}", "KokoBank Demo: Deposit, Reward, Loan, Repay".bright_white().bold());

    let deposit = to_wei(deposit)?;
    let borrow = parse_units(borrow, config.token.decimals)?;
    let decimals = config.token.decimals;
    let symbol = config.token.symbol.clone();

    let deployer = AccountId::from_label("deployer");
    let alice = AccountId::from_label("alice");
    let bob = AccountId::from_label("bob");
    let genesis = to_wei("100")?;

    display::section("Step 1: Deploy");
    let bank = Bank::in_memory(
        &deployer,
        config,
        [
            (deployer.clone(), genesis),
            (alice.clone(), genesis),
            (bob.clone(), genesis),
        ],
    );
    let bank_address = bank.address().clone();
    display::success("Token and bank deployed");
    display::kv("Token", bank.token_address().as_str());
    display::kv("Bank", bank_address.as_str());

    bank.transfer_minter_ownership(&deployer, &bank_address).await?;
    display::success("Minter rights handed to the bank");
    display::kv("Minter", bank.token_minter().await.as_str());

    display::section("Step 2: Deposit");
    bank.deposit(&alice, deposit).await?;
    display::success(&format!("Alice deposited {}", display::ether(deposit)));
    display::kv("Deposited", &display::ether(bank.deposited_balance(&alice).await));
    display::kv("Wallet", &display::ether(bank.native_balance(&alice).await));

    display::section("Step 3: Withdraw");
    let withdrawal = bank.withdraw(&alice).await?;
    display::success(&format!("Alice withdrew {}", display::ether(withdrawal.amount)));
    display::kv("Reward", &display::koko(withdrawal.reward, decimals, &symbol));
    display::kv("Wallet", &display::ether(bank.native_balance(&alice).await));
    match bank.withdraw(&alice).await {
        Ok(_) => display::error("Second withdrawal unexpectedly succeeded"),
        Err(e) => display::info(&format!("Second withdrawal rejected: {}", e)),
    }

    display::section("Step 4: Borrow");
    bank.borrow(&bob, borrow).await?;
    display::success(&format!("Bob borrowed {}", display::koko(borrow, decimals, &symbol)));
    match bank.borrow(&bob, borrow).await {
        Ok(_) => display::error("Second loan unexpectedly opened"),
        Err(e) => display::info(&format!("Second loan rejected: {}", e)),
    }

    display::section("Step 5: Repay");
    bank.approve(&bob, &bank_address, borrow).await;
    display::info(&format!(
        "Bob approved the bank for {}",
        display::koko(borrow, decimals, &symbol)
    ));
    bank.return_borrowed_money(&bob, borrow).await?;
    display::success("Loan repaid");
    display::kv("Bob outstanding", &bank.borrowed_amount(&bob).await.to_string());
    display::kv(
        "Bob balance",
        &display::koko(bank.token_balance_of(&bob).await, decimals, &symbol),
    );
    display::kv(
        "Bank balance",
        &display::koko(bank.token_balance_of(&bank_address).await, decimals, &symbol),
    );

    display::section("Final State");
    let snapshot = bank.snapshot().await;
    display::kv("Operations", &snapshot.sequence.to_string());
    display::kv("Custody held", &display::ether(snapshot.custody_held));
    display::kv(
        "Total supply",
        &display::koko(snapshot.token_supply, decimals, &symbol),
    );
    display::kv("State root", &snapshot.state_root()?);

    if verbose {
        super::print_events(&bank).await;
    }

    println!();
    Ok(())
}
