//! Deploy cash: fixed-cash fill followed by the proportional greedy fill.

use log::debug;

use crate::error::Result;
use crate::fixed::fixed_pass;
use crate::greedy::greedy_pass;
use crate::plan::BalanceResult;
use crate::target::TargetAllocation;
use crate::ticker::{Holdings, Prices};
use crate::validate::validate_inputs;

/// Compute the whole-share purchases that spend `cash` toward `targets`.
///
/// Fixed-cash targets are topped up first; whatever cash remains goes to the
/// proportional targets. The two purchase sets are merged additively.
/// Nothing is sold.
///
/// Returns [`Error::MissingPrice`](crate::Error::MissingPrice) without
/// computing anything if a held or targeted ticker has no price.
///
/// ```
/// use wholeshare::{Allocation, TargetAllocation, Ticker, balance_purchase};
/// use wholeshare::ticker::quantities;
///
/// let targets = TargetAllocation::new([
///     (Ticker::from("VTI"), Allocation::Proportion(0.6)),
///     (Ticker::from("VXUS"), Allocation::Proportion(0.4)),
/// ])?;
/// let holdings = quantities(&[("VTI", 6.0), ("VXUS", 2.0)]);
/// let prices = quantities(&[("VTI", 100.0), ("VXUS", 100.0)]);
///
/// let result = balance_purchase(250.0, &holdings, &prices, &targets)?;
/// assert_eq!(result.plan.get("VXUS"), 2);
/// assert_eq!(result.cash, 50.0);
/// # Ok::<(), wholeshare::Error>(())
/// ```
pub fn balance_purchase(
    cash: f64,
    holdings: &Holdings,
    prices: &Prices,
    targets: &TargetAllocation,
) -> Result<BalanceResult> {
    validate_inputs(cash, holdings, prices, targets)?;
    Ok(balance_pass(cash, holdings, prices, targets))
}

/// Unchecked orchestration; callers must have validated inputs.
pub(crate) fn balance_pass(
    cash: f64,
    holdings: &Holdings,
    prices: &Prices,
    targets: &TargetAllocation,
) -> BalanceResult {
    let fixed = fixed_pass(cash, holdings, prices, targets);
    let proportional = greedy_pass(fixed.cash, holdings, prices, targets);

    let mut plan = fixed.plan;
    plan.merge(proportional.plan);

    debug!(
        "balance: ${cash:.2} in, {} tickers bought, ${:.2} left",
        plan.len(),
        proportional.cash
    );

    BalanceResult {
        plan,
        cash: proportional.cash,
    }
}
