//! Proportional greedy fill.
//!
//! Spends cash one whole share at a time, always on the most underweight
//! ticker that is still affordable, until the cheapest tracked ticker costs
//! more than the cash left.
//!
//! Deviations depend on total tracked value, which changes after every
//! purchase, so they are recomputed each round. Selection is a single
//! argmin over affordable tickers (ties go to the earlier ticker), which
//! picks the same ticker as re-sorting by deviation and taking the first
//! affordable one.

use log::{debug, trace};

use crate::error::Result;
use crate::plan::{BalanceResult, Plan};
use crate::target::TargetAllocation;
use crate::ticker::{Holdings, Prices, Ticker};
use crate::validate::validate_inputs;

/// Working state for one tracked ticker.
#[derive(Debug)]
struct Slot<'a> {
    ticker: &'a Ticker,
    price: f64,
    target: f64,
    quantity: f64,
    bought: i64,
}

impl Slot<'_> {
    #[inline]
    fn value(&self) -> f64 {
        self.quantity * self.price
    }

    /// Current weight minus target weight. Negative = underweight.
    ///
    /// With nothing held yet every current weight is taken as zero.
    #[inline]
    fn deviation(&self, total_value: f64) -> f64 {
        if total_value > 0.0 {
            self.value() / total_value - self.target
        } else {
            -self.target
        }
    }
}

/// Spend `cash` on the proportional entries of `targets`, one share at a time.
///
/// Fixed-cash entries are ignored. Holdings of untracked tickers do not count
/// toward total value.
pub fn fill_proportional(
    cash: f64,
    holdings: &Holdings,
    prices: &Prices,
    targets: &TargetAllocation,
) -> Result<BalanceResult> {
    validate_inputs(cash, holdings, prices, targets)?;
    Ok(greedy_pass(cash, holdings, prices, targets))
}

/// Unchecked fill; callers must have validated inputs.
pub(crate) fn greedy_pass(
    mut cash: f64,
    holdings: &Holdings,
    prices: &Prices,
    targets: &TargetAllocation,
) -> BalanceResult {
    let mut slots: Vec<Slot<'_>> = targets
        .proportions()
        .map(|(ticker, target)| Slot {
            ticker,
            price: prices[ticker],
            target,
            quantity: holdings.get(ticker).copied().unwrap_or(0.0),
            bought: 0,
        })
        .collect();

    if slots.is_empty() {
        return BalanceResult::unchanged(cash);
    }

    let min_price = slots.iter().map(|s| s.price).fold(f64::INFINITY, f64::min);
    let mut purchases = 0u64;

    while cash >= min_price {
        let total_value: f64 = slots.iter().map(Slot::value).sum();

        let mut pick: Option<(usize, f64)> = None;
        for (i, slot) in slots.iter().enumerate() {
            if slot.price > cash {
                continue;
            }
            let deviation = slot.deviation(total_value);
            match pick {
                Some((_, best)) if deviation >= best => {}
                _ => pick = Some((i, deviation)),
            }
        }

        // Unreachable while min_price is taken over the same slots
        let Some((i, deviation)) = pick else { break };

        let slot = &mut slots[i];
        slot.quantity += 1.0;
        slot.bought += 1;
        cash -= slot.price;
        purchases += 1;
        trace!(
            "buy 1 {} @ ${:.2} (deviation {:+.6}), cash left ${:.2}",
            slot.ticker, slot.price, deviation, cash
        );
    }

    debug!(
        "proportional fill: {purchases} shares across {} tickers, ${cash:.2} left",
        slots.iter().filter(|s| s.bought > 0).count()
    );

    let plan: Plan = slots
        .into_iter()
        .map(|s| (s.ticker.clone(), s.bought))
        .collect();
    BalanceResult { plan, cash }
}
