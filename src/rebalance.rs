//! Rebalance with selling: liquidate-and-rebuy simulation.
//!
//! Whole shares of every holding are converted to simulated cash, the balance
//! orchestrator is run from an empty portfolio with that cash, and the result
//! is expressed as signed deltas against the original whole-share holdings.
//! Fractional remainders are never sold and never counted as inventory.

use std::collections::BTreeSet;

use log::debug;

use crate::balance::balance_pass;
use crate::error::Result;
use crate::plan::{BalanceResult, Plan};
use crate::target::TargetAllocation;
use crate::ticker::{Holdings, Prices, Ticker};
use crate::validate::validate_inputs;

/// Compute buys and sells that move the account toward `targets`.
///
/// If the simulated plan contains no purchase, the result is an empty plan
/// with the original `cash`: selling without redeploying the proceeds is
/// treated as a no-op.
///
/// Every held ticker takes part, so holdings of tickers absent from
/// `targets` are sold. Callers pass only tracked holdings.
pub fn rebalance_with_selling(
    cash: f64,
    holdings: &Holdings,
    prices: &Prices,
    targets: &TargetAllocation,
) -> Result<BalanceResult> {
    validate_inputs(cash, holdings, prices, targets)?;

    let simulated_cash = cash
        + holdings
            .iter()
            .map(|(ticker, &quantity)| quantity.floor() * prices[ticker])
            .sum::<f64>();

    let ideal = balance_pass(simulated_cash, &Holdings::default(), prices, targets);

    let tickers: BTreeSet<&Ticker> = holdings
        .keys()
        .chain(ideal.plan.iter().map(|(t, _)| t))
        .collect();

    let plan: Plan = tickers
        .into_iter()
        .map(|ticker| {
            let current = holdings.get(ticker).copied().unwrap_or(0.0).floor() as i64;
            (ticker.clone(), ideal.plan.get(ticker.as_ref()) - current)
        })
        .collect();

    if !plan.has_buys() {
        debug!("rebalance: simulation yields no purchases, leaving account as is");
        return Ok(BalanceResult::unchanged(cash));
    }

    debug!(
        "rebalance: ${simulated_cash:.2} simulated, {} buys, {} sells, ${:.2} left",
        plan.buys().count(),
        plan.sells().count(),
        ideal.cash
    );

    Ok(BalanceResult {
        plan,
        cash: ideal.cash,
    })
}
