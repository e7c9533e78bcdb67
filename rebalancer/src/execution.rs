//! Execution orchestrator: fetch → plan → confirm → submit.
//!
//! This is the main workflow that ties together all components. Every
//! function takes a `&dyn Broker` so the same code runs against Schwab and
//! against the in-memory mock.

use std::fmt;

use log::{info, warn};
use wholeshare::{
    BalanceResult, Holdings, Prices, TargetAllocation, TargetAllocations, Ticker,
    balance_purchase, rebalance_with_selling,
};
use wholeshare_broker::{Account, Broker, BrokerOrder, OrderId, Position};

use crate::audit::{self, AuditLog};
use crate::error::{Error, Result};
use crate::reconcile::{self, ReconcileReport};

/// Which engine entry point a run uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Deploy the account's cash without selling.
    Invest,
    /// Sell and buy whole shares to move toward the targets.
    Rebalance,
}

impl Mode {
    pub fn as_str(self) -> &'static str {
        match self {
            Mode::Invest => "invest",
            Mode::Rebalance => "rebalance",
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Options for an invest or rebalance run.
#[derive(Debug, Clone, Copy, Default)]
pub struct RunOptions {
    /// Print the plan and stop before the confirmation gate.
    pub dry_run: bool,
    /// Skip the confirmation prompt.
    pub yes: bool,
}

/// How a run ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    NothingToDo,
    DryRun,
    Declined,
    Submitted(OrderId),
}

impl Outcome {
    fn as_str(&self) -> &'static str {
        match self {
            Outcome::NothingToDo => "nothing_to_do",
            Outcome::DryRun => "dry_run",
            Outcome::Declined => "declined",
            Outcome::Submitted(_) => "submitted",
        }
    }
}

/// Find an account by number, short id, or 1-based index as printed by
/// [`show_accounts`].
pub fn select_account(accounts: &[Account], selector: &str) -> Result<Account> {
    let selector = selector.trim();
    if let Some(account) = accounts
        .iter()
        .find(|a| a.number == selector || a.short_id() == selector)
    {
        return Ok(account.clone());
    }
    selector
        .parse::<usize>()
        .ok()
        .and_then(|i| i.checked_sub(1))
        .and_then(|i| accounts.get(i))
        .cloned()
        .ok_or_else(|| Error::Config(format!("no account matches '{selector}'")))
}

/// Fetch accounts from the broker and select one.
pub fn find_account(broker: &dyn Broker, selector: &str) -> Result<Account> {
    let accounts = broker.accounts()?;
    select_account(&accounts, selector)
}

/// Targets for `account`: its short id first, then the global entry.
pub fn targets_for<'a>(
    targets: &'a TargetAllocations,
    account: &Account,
) -> Result<&'a TargetAllocation> {
    targets.for_account(account.short_id()).ok_or_else(|| {
        Error::Target(format!(
            "no targets for account {} and no global entry",
            account.masked()
        ))
    })
}

/// Positions with a target, plus a zero holding for every target ticker
/// that is not held.
pub fn tracked_holdings(account: &Account, targets: &TargetAllocation) -> Holdings {
    let mut holdings: Holdings = targets.tickers().map(|t| (t.clone(), 0.0)).collect();
    for p in &account.positions {
        if targets.contains(p.ticker.as_str()) {
            *holdings.entry(p.ticker.clone()).or_insert(0.0) += p.quantity;
        }
    }
    holdings
}

/// Positions with no target. These take no part in planning.
pub fn untracked_positions<'a>(
    account: &'a Account,
    targets: &TargetAllocation,
) -> Vec<&'a Position> {
    account
        .positions
        .iter()
        .filter(|p| !targets.contains(p.ticker.as_str()))
        .collect()
}

/// Quote every tracked ticker in lexical order.
fn fetch_prices(broker: &dyn Broker, holdings: &Holdings) -> Result<Prices> {
    let mut tickers: Vec<Ticker> = holdings.keys().cloned().collect();
    tickers.sort();
    Ok(broker.quotes(&tickers)?)
}

/// Run the engine for `mode` on the account's cash and tracked holdings.
pub fn compute_plan(
    mode: Mode,
    cash: f64,
    holdings: &Holdings,
    prices: &Prices,
    targets: &TargetAllocation,
) -> Result<BalanceResult> {
    let result = match mode {
        Mode::Invest => balance_purchase(cash, holdings, prices, targets)?,
        Mode::Rebalance => rebalance_with_selling(cash, holdings, prices, targets)?,
    };
    Ok(result)
}

/// Execute an invest or rebalance run, asking on the terminal before
/// submitting.
pub fn run(
    broker: &dyn Broker,
    account: &Account,
    targets: &TargetAllocations,
    mode: Mode,
    opts: RunOptions,
    audit: &mut AuditLog,
) -> Result<Outcome> {
    run_with_confirm(broker, account, targets, mode, opts, audit, prompt_confirm)
}

/// [`run`] with a caller-supplied confirmation gate.
pub fn run_with_confirm(
    broker: &dyn Broker,
    account: &Account,
    targets: &TargetAllocations,
    mode: Mode,
    opts: RunOptions,
    audit: &mut AuditLog,
    confirm: impl FnOnce() -> Result<bool>,
) -> Result<Outcome> {
    let targets = targets_for(targets, account)?;

    audit::log_run_started(audit, mode.as_str(), account)?;
    audit::log_positions(audit, account)?;

    println!(
        "Account {}: ${:.2} value, ${:.2} cash",
        account.masked(),
        account.account_value,
        account.cash,
    );
    display_positions(account, targets);

    let holdings = tracked_holdings(account, targets);
    let prices = fetch_prices(broker, &holdings)?;

    info!("computing {mode} plan for {}", account.masked());
    let result = compute_plan(mode, account.cash, &holdings, &prices, targets)?;
    audit::log_plan(audit, &result)?;

    let outcome = gate_and_submit(broker, account, &result, &prices, opts, audit, confirm)?;
    audit::log_run_completed(audit, outcome.as_str())?;
    Ok(outcome)
}

fn gate_and_submit(
    broker: &dyn Broker,
    account: &Account,
    result: &BalanceResult,
    prices: &Prices,
    opts: RunOptions,
    audit: &mut AuditLog,
    confirm: impl FnOnce() -> Result<bool>,
) -> Result<Outcome> {
    let Some(order) = BrokerOrder::from_plan(&result.plan) else {
        println!("\nNothing to do.");
        return Ok(Outcome::NothingToDo);
    };

    display_plan(result, prices);

    if opts.dry_run {
        println!("\n[DRY RUN] No orders submitted.");
        return Ok(Outcome::DryRun);
    }

    if !opts.yes {
        let approved = confirm()?;
        audit::log_confirmation(audit, approved)?;
        if !approved {
            println!("Aborted.");
            return Ok(Outcome::Declined);
        }
    }

    let id = match broker.submit_order(account, &order) {
        Ok(id) => id,
        Err(e) => {
            warn!("order rejected for {}: {e}", account.masked());
            audit::log_run_completed(audit, "rejected")?;
            return Err(e.into());
        }
    };
    audit::log_order_submitted(audit, &result.plan, &id)?;
    println!("Order {id} submitted.");
    Ok(Outcome::Submitted(id))
}

fn prompt_confirm() -> Result<bool> {
    dialoguer::Confirm::new()
        .with_prompt("Execute?")
        .default(false)
        .interact()
        .map_err(|e| Error::Aborted(format!("confirmation prompt failed: {e}")))
}

/// Print every account with its value and cash.
pub fn show_accounts(broker: &dyn Broker) -> Result<Vec<Account>> {
    let accounts = broker.accounts()?;
    if accounts.is_empty() {
        println!("No accounts.");
    }
    for (i, a) in accounts.iter().enumerate() {
        println!(
            "  [{}] {}  value ${:>12.2}  cash ${:>12.2}",
            i + 1,
            a.masked(),
            a.account_value,
            a.cash,
        );
    }
    Ok(accounts)
}

/// Compare the account's tracked holdings with its targets.
pub fn run_drift(
    broker: &dyn Broker,
    account: &Account,
    targets: &TargetAllocations,
) -> Result<ReconcileReport> {
    let targets = targets_for(targets, account)?;
    let holdings = tracked_holdings(account, targets);
    let prices = fetch_prices(broker, &holdings)?;

    display_positions(account, targets);
    let report = reconcile::reconcile(&holdings, &prices, targets);
    print!("\n{report}");
    Ok(report)
}

// === Display ===

fn display_positions(account: &Account, targets: &TargetAllocation) {
    if account.positions.is_empty() {
        println!("No positions.");
        return;
    }

    println!("\nCURRENT POSITIONS:");
    for p in &account.positions {
        let note = if targets.contains(p.ticker.as_str()) {
            ""
        } else {
            "  (untracked, excluded)"
        };
        println!(
            "  {:8} {:>12.3}  ${:>12.2}{note}",
            p.ticker, p.quantity, p.market_value
        );
    }
}

fn display_plan(result: &BalanceResult, prices: &Prices) {
    println!("\nORDERS:");
    println!(
        "  {:6} {:8} {:>8} {:>10} {:>12}",
        "Action", "Ticker", "Shares", "Price", "Notional"
    );
    for (ticker, shares) in result.plan.iter() {
        let action = if shares > 0 { "BUY" } else { "SELL" };
        let price = prices.get(ticker).copied().unwrap_or(0.0);
        println!(
            "  {:6} {:8} {:>8} ${:>9.2} ${:>11.2}",
            action,
            ticker,
            shares.unsigned_abs(),
            price,
            shares.unsigned_abs() as f64 * price,
        );
    }
    println!("\nNet cost: ${:.2}", result.plan.net_cost(prices));
    println!("Cash after: ${:.2}", result.cash);
}
