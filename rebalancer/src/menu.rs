//! Interactive menu loop.

use dialoguer::Select;
use log::error;
use wholeshare::TargetAllocations;
use wholeshare_broker::{Account, Broker};

use crate::audit::AuditLog;
use crate::error::{Error, Result};
use crate::execution::{self, Mode, RunOptions};

const ITEMS: [&str; 5] = ["Print accounts", "Invest cash", "Rebalance", "Drift", "Exit"];

/// Run the menu until the operator picks Exit.
///
/// Errors from a single action are reported and the loop continues.
pub fn run(broker: &dyn Broker, targets: &TargetAllocations, audit: &mut AuditLog) -> Result<()> {
    loop {
        println!();
        let choice = Select::new()
            .with_prompt("What next?")
            .items(&ITEMS)
            .default(0)
            .interact()
            .map_err(|e| Error::Aborted(format!("menu prompt failed: {e}")))?;

        let result = match choice {
            0 => execution::show_accounts(broker).map(|_| ()),
            1 => pick_account(broker).and_then(|a| {
                execution::run(broker, &a, targets, Mode::Invest, RunOptions::default(), audit)
                    .map(|_| ())
            }),
            2 => pick_account(broker).and_then(|a| {
                execution::run(broker, &a, targets, Mode::Rebalance, RunOptions::default(), audit)
                    .map(|_| ())
            }),
            3 => pick_account(broker).and_then(|a| execution::run_drift(broker, &a, targets).map(|_| ())),
            _ => return Ok(()),
        };

        if let Err(e) = result {
            error!("{e}");
            eprintln!("Error: {e}");
        }
    }
}

fn pick_account(broker: &dyn Broker) -> Result<Account> {
    let mut accounts = broker.accounts()?;
    if accounts.is_empty() {
        return Err(Error::Config("no accounts available".into()));
    }
    let labels: Vec<String> = accounts
        .iter()
        .map(|a| format!("{}  (cash ${:.2})", a.masked(), a.cash))
        .collect();
    let i = Select::new()
        .with_prompt("Account")
        .items(&labels)
        .default(0)
        .interact()
        .map_err(|e| Error::Aborted(format!("account prompt failed: {e}")))?;
    Ok(accounts.swap_remove(i))
}
