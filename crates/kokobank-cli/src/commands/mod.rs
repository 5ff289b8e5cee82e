//! CLI subcommands

pub mod demo;
pub mod script;

use kokobank_ledger::{Bank, BankEvent, BankEventKind};

use crate::display;

/// Print the bank's event log, oldest first
pub(crate) async fn print_events(bank: &Bank) {
    display::section("Event Log");
    for event in bank.events().await {
        display::info(&describe_event(&event));
    }
}

pub(crate) fn describe_event(event: &BankEvent) -> String {
    let what = match &event.kind {
        BankEventKind::Deposited { amount } => format!("deposited {}", amount),
        BankEventKind::Withdrawn { amount, reward } => {
            format!("withdrew {} (reward {})", amount, reward)
        }
        BankEventKind::Borrowed { amount } => format!("borrowed {}", amount),
        BankEventKind::Repaid {
            amount,
            outstanding,
        } => format!("repaid {} ({} outstanding)", amount, outstanding),
    };
    format!("#{} {} {}", event.sequence, event.account, what)
}
