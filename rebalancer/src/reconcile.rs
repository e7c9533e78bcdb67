//! Drift reconciliation: compare tracked holdings against targets.

use serde::Serialize;
use wholeshare::{Allocation, Holdings, Prices, TargetAllocation};

/// Reconciliation report comparing actual vs target.
#[derive(Debug, Clone, Serialize)]
pub struct ReconcileReport {
    pub entries: Vec<ReconcileEntry>,
    /// Root-mean-square weight drift over proportional tickers.
    pub tracking_error_pct: f64,
}

/// One ticker's reconciliation entry.
#[derive(Debug, Clone, Serialize)]
pub struct ReconcileEntry {
    pub ticker: String,
    pub quantity: f64,
    pub value: f64,
    pub drift: Drift,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Drift {
    /// Weights are relative to the total value of proportional tickers.
    Proportion {
        target_weight: f64,
        actual_weight: f64,
        diff_weight: f64,
    },
    FixedCashValue { target_value: f64, diff_value: f64 },
}

/// Compare tracked holdings against `targets`.
///
/// Tickers without a price are valued at zero.
pub fn reconcile(holdings: &Holdings, prices: &Prices, targets: &TargetAllocation) -> ReconcileReport {
    let value_of = |ticker: &str| {
        let qty = holdings.get(ticker).copied().unwrap_or(0.0);
        let price = prices.get(ticker).copied().unwrap_or(0.0);
        (qty, qty * price)
    };

    let proportional_total: f64 = targets
        .proportions()
        .map(|(t, _)| value_of(t.as_str()).1)
        .sum();

    let mut entries = Vec::with_capacity(targets.len());
    let mut sum_sq_diff = 0.0_f64;
    let mut n_proportional = 0usize;

    for (ticker, allocation) in targets.iter() {
        let (quantity, value) = value_of(ticker.as_str());
        let drift = match allocation {
            Allocation::Proportion(target_weight) => {
                let actual_weight = if proportional_total > 0.0 {
                    value / proportional_total
                } else {
                    0.0
                };
                let diff_weight = actual_weight - target_weight;
                sum_sq_diff += diff_weight * diff_weight;
                n_proportional += 1;
                Drift::Proportion {
                    target_weight,
                    actual_weight,
                    diff_weight,
                }
            }
            Allocation::FixedCashValue(target_value) => Drift::FixedCashValue {
                target_value,
                diff_value: value - target_value,
            },
        };
        entries.push(ReconcileEntry {
            ticker: ticker.as_str().to_string(),
            quantity,
            value,
            drift,
        });
    }

    let tracking_error_pct = (sum_sq_diff / n_proportional.max(1) as f64).sqrt() * 100.0;

    ReconcileReport {
        entries,
        tracking_error_pct,
    }
}

impl std::fmt::Display for ReconcileReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "DRIFT:")?;
        writeln!(
            f,
            "  {:8} {:>12} {:>12} {:>10} {:>10} {:>10}",
            "Ticker", "Shares", "Value", "Target", "Actual", "Diff"
        )?;
        for e in &self.entries {
            match &e.drift {
                Drift::Proportion {
                    target_weight,
                    actual_weight,
                    diff_weight,
                } => writeln!(
                    f,
                    "  {:8} {:>12.3} ${:>11.2} {:>9.2}% {:>9.2}% {:>+9.2}%",
                    e.ticker,
                    e.quantity,
                    e.value,
                    target_weight * 100.0,
                    actual_weight * 100.0,
                    diff_weight * 100.0,
                )?,
                Drift::FixedCashValue {
                    target_value,
                    diff_value,
                } => writeln!(
                    f,
                    "  {:8} {:>12.3} ${:>11.2} ${:>9.2} ${:>9.2} {:>+10.2}",
                    e.ticker, e.quantity, e.value, target_value, e.value, diff_value,
                )?,
            }
        }
        writeln!(f, "\n  Tracking error: {:.3}%", self.tracking_error_pct)?;
        Ok(())
    }
}
