//! Trade plans: signed whole-share deltas per ticker.

use std::collections::BTreeMap;
use std::collections::btree_map;
use std::fmt;

use crate::ticker::{Prices, Ticker};

/// A set of whole-share trades. Positive = buy, negative = sell.
///
/// Zero entries are never stored, so an empty plan means "do nothing".
/// Iteration is in ticker order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct Plan {
    trades: BTreeMap<Ticker, i64>,
}

impl Plan {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `shares` to the entry for `ticker`. Additive: an existing entry is
    /// summed, not replaced, and an entry that nets to zero is removed.
    pub fn add(&mut self, ticker: Ticker, shares: i64) {
        if shares == 0 {
            return;
        }
        match self.trades.entry(ticker) {
            btree_map::Entry::Vacant(e) => {
                e.insert(shares);
            }
            btree_map::Entry::Occupied(mut e) => {
                *e.get_mut() += shares;
                if *e.get() == 0 {
                    e.remove();
                }
            }
        }
    }

    /// Merge another plan into this one, summing per ticker.
    pub fn merge(&mut self, other: Plan) {
        for (ticker, shares) in other.trades {
            self.add(ticker, shares);
        }
    }

    /// Signed delta for `ticker` (0 if absent).
    pub fn get(&self, ticker: &str) -> i64 {
        self.trades.get(ticker).copied().unwrap_or(0)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Ticker, i64)> {
        self.trades.iter().map(|(t, s)| (t, *s))
    }

    /// Purchases, in ticker order.
    pub fn buys(&self) -> impl Iterator<Item = (&Ticker, u64)> {
        self.iter()
            .filter(|(_, s)| *s > 0)
            .map(|(t, s)| (t, s.unsigned_abs()))
    }

    /// Sales as positive share counts, in ticker order.
    pub fn sells(&self) -> impl Iterator<Item = (&Ticker, u64)> {
        self.iter()
            .filter(|(_, s)| *s < 0)
            .map(|(t, s)| (t, s.unsigned_abs()))
    }

    pub fn has_buys(&self) -> bool {
        self.trades.values().any(|&s| s > 0)
    }

    pub fn has_sells(&self) -> bool {
        self.trades.values().any(|&s| s < 0)
    }

    /// Net cash consumed by the plan at `prices` (sales count negative).
    ///
    /// Tickers without a price contribute nothing; plans produced by the
    /// engine always have prices for every entry.
    pub fn net_cost(&self, prices: &Prices) -> f64 {
        self.iter()
            .map(|(t, s)| s as f64 * prices.get(t).copied().unwrap_or(0.0))
            .sum()
    }

    pub fn len(&self) -> usize {
        self.trades.len()
    }

    pub fn is_empty(&self) -> bool {
        self.trades.is_empty()
    }
}

impl FromIterator<(Ticker, i64)> for Plan {
    fn from_iter<I: IntoIterator<Item = (Ticker, i64)>>(iter: I) -> Self {
        let mut plan = Plan::new();
        for (ticker, shares) in iter {
            plan.add(ticker, shares);
        }
        plan
    }
}

impl<'a> FromIterator<(&'a str, i64)> for Plan {
    fn from_iter<I: IntoIterator<Item = (&'a str, i64)>>(iter: I) -> Self {
        iter.into_iter().map(|(t, s)| (Ticker::from(t), s)).collect()
    }
}

impl IntoIterator for Plan {
    type Item = (Ticker, i64);
    type IntoIter = btree_map::IntoIter<Ticker, i64>;

    fn into_iter(self) -> Self::IntoIter {
        self.trades.into_iter()
    }
}

impl fmt::Display for Plan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return write!(f, "(no trades)");
        }
        let mut first = true;
        for (ticker, shares) in self.iter() {
            if !first {
                write!(f, ", ")?;
            }
            first = false;
            write!(f, "{ticker}: {shares:+}")?;
        }
        Ok(())
    }
}

/// A plan together with the cash left over after executing it.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BalanceResult {
    pub plan: Plan,
    /// Cash remaining after the plan (dollars).
    pub cash: f64,
}

impl BalanceResult {
    /// An empty plan that leaves `cash` untouched.
    pub fn unchanged(cash: f64) -> Self {
        Self {
            plan: Plan::new(),
            cash,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ticker::quantities;

    #[test]
    fn add_is_additive() {
        let mut plan = Plan::new();
        plan.add(Ticker::from("VTI"), 3);
        plan.add(Ticker::from("VTI"), 2);
        assert_eq!(plan.get("VTI"), 5);
        assert_eq!(plan.len(), 1);
    }

    #[test]
    fn zero_entries_are_dropped() {
        let mut plan = Plan::new();
        plan.add(Ticker::from("VTI"), 0);
        assert!(plan.is_empty());

        plan.add(Ticker::from("VTI"), 4);
        plan.add(Ticker::from("VTI"), -4);
        assert!(plan.is_empty());
    }

    #[test]
    fn merge_sums_overlapping_tickers() {
        let mut a: Plan = [("SWVXX", 2), ("VTI", 1)].into_iter().collect();
        let b: Plan = [("VTI", 4), ("VWO", 1)].into_iter().collect();
        a.merge(b);
        assert_eq!(a.get("SWVXX"), 2);
        assert_eq!(a.get("VTI"), 5);
        assert_eq!(a.get("VWO"), 1);
    }

    #[test]
    fn buys_and_sells_split() {
        let plan: Plan = [("DFAC", -2), ("DFIC", 5), ("DFEM", -3)].into_iter().collect();
        let buys: Vec<_> = plan.buys().map(|(t, n)| (t.as_str(), n)).collect();
        let sells: Vec<_> = plan.sells().map(|(t, n)| (t.as_str(), n)).collect();
        assert_eq!(buys, vec![("DFIC", 5)]);
        assert_eq!(sells, vec![("DFAC", 2), ("DFEM", 3)]);
        assert!(plan.has_buys());
        assert!(plan.has_sells());
    }

    #[test]
    fn net_cost_counts_sales_negative() {
        let plan: Plan = [("VTI", 2), ("VWO", -1)].into_iter().collect();
        let prices = quantities(&[("VTI", 10.0), ("VWO", 4.0)]);
        assert_eq!(plan.net_cost(&prices), 16.0);
    }

    #[test]
    fn display() {
        let plan: Plan = [("VWO", -4), ("VTI", 20)].into_iter().collect();
        assert_eq!(format!("{plan}"), "VTI: +20, VWO: -4");
        assert_eq!(format!("{}", Plan::new()), "(no trades)");
    }
}
