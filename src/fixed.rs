//! Fixed-cash-value fill.
//!
//! Tops up tickers whose target is an absolute dollar amount. Each ticker is
//! visited in ticker order and spends from whatever cash is left when it is
//! reached, so when aggregate shortfall exceeds cash, later tickers are
//! underfunded.

use log::debug;

use crate::error::Result;
use crate::plan::{BalanceResult, Plan};
use crate::target::TargetAllocation;
use crate::ticker::{Holdings, Prices};
use crate::validate::validate_inputs;

/// Buy whole shares of fixed-cash-value tickers up to their dollar target.
///
/// Only the fixed-cash entries of `targets` are filled; proportional entries
/// are ignored. See [`crate::balance_purchase`] for the combined pass.
pub fn fill_fixed_targets(
    cash: f64,
    holdings: &Holdings,
    prices: &Prices,
    targets: &TargetAllocation,
) -> Result<BalanceResult> {
    validate_inputs(cash, holdings, prices, targets)?;
    Ok(fixed_pass(cash, holdings, prices, targets))
}

/// Unchecked fill; callers must have validated inputs.
pub(crate) fn fixed_pass(
    mut cash: f64,
    holdings: &Holdings,
    prices: &Prices,
    targets: &TargetAllocation,
) -> BalanceResult {
    let mut plan = Plan::new();

    for (ticker, target_value) in targets.fixed_values() {
        let price = prices[ticker];
        let held = holdings.get(ticker).copied().unwrap_or(0.0);
        let shortfall = target_value - held * price;
        if shortfall <= 0.0 {
            continue;
        }

        let spend = shortfall.min(cash);
        let shares = (spend / price).floor() as i64;
        if shares > 0 {
            cash -= shares as f64 * price;
            plan.add(ticker.clone(), shares);
        }
        debug!("fixed {ticker}: shortfall ${shortfall:.2}, bought {shares} @ ${price:.2}");
    }

    BalanceResult { plan, cash }
}
