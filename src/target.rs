//! Target allocations: what an account should hold.
//!
//! A [`TargetAllocation`] maps each tracked ticker to exactly one
//! [`Allocation`]: a proportion of total tracked value, or a fixed dollar
//! amount. Construction validates the set, so the engine never sees an
//! invalid one.

use std::collections::BTreeMap;

use crate::error::{Error, Result};
use crate::ticker::Ticker;

/// Tolerance for the proportion sum invariant.
pub const PROPORTION_TOLERANCE: f64 = 1e-7;

/// Account key used for targets shared by every account.
pub const GLOBAL_ACCOUNT: &str = "global";

/// Desired holding for one ticker.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum Allocation {
    /// Fraction of total tracked value, in (0, 1].
    Proportion(f64),
    /// Absolute dollar value, independent of portfolio size.
    FixedCashValue(f64),
}

/// Validated per-account target allocation set.
///
/// Invariant: proportions sum to 1.0 within [`PROPORTION_TOLERANCE`].
/// Fixed-cash entries are excluded from that sum.
#[derive(Clone, Debug, PartialEq)]
pub struct TargetAllocation {
    entries: BTreeMap<Ticker, Allocation>,
}

impl TargetAllocation {
    /// Build and validate a target set.
    pub fn new(entries: impl IntoIterator<Item = (Ticker, Allocation)>) -> Result<Self> {
        let mut map = BTreeMap::new();
        for (ticker, allocation) in entries {
            match allocation {
                Allocation::Proportion(p) => {
                    if !p.is_finite() || p <= 0.0 || p > 1.0 {
                        return Err(Error::InvalidProportion { ticker, value: p });
                    }
                }
                Allocation::FixedCashValue(v) => {
                    if !v.is_finite() || v <= 0.0 {
                        return Err(Error::InvalidFixedValue { ticker, value: v });
                    }
                }
            }
            if map.contains_key(&ticker) {
                return Err(Error::DuplicateTicker(ticker));
            }
            map.insert(ticker, allocation);
        }

        let sum: f64 = map
            .values()
            .filter_map(|a| match a {
                Allocation::Proportion(p) => Some(*p),
                Allocation::FixedCashValue(_) => None,
            })
            .sum();
        if (sum - 1.0).abs() >= PROPORTION_TOLERANCE {
            return Err(Error::ProportionSum { sum });
        }

        Ok(Self { entries: map })
    }

    /// Allocation for `ticker`, if tracked.
    pub fn get(&self, ticker: &str) -> Option<Allocation> {
        self.entries.get(ticker).copied()
    }

    pub fn contains(&self, ticker: &str) -> bool {
        self.entries.contains_key(ticker)
    }

    /// All tracked entries in ticker order.
    pub fn iter(&self) -> impl Iterator<Item = (&Ticker, Allocation)> {
        self.entries.iter().map(|(t, a)| (t, *a))
    }

    /// Tracked tickers in ticker order.
    pub fn tickers(&self) -> impl Iterator<Item = &Ticker> {
        self.entries.keys()
    }

    /// Proportional entries in ticker order.
    pub fn proportions(&self) -> impl Iterator<Item = (&Ticker, f64)> {
        self.entries.iter().filter_map(|(t, a)| match a {
            Allocation::Proportion(p) => Some((t, *p)),
            Allocation::FixedCashValue(_) => None,
        })
    }

    /// Fixed-cash entries in ticker order.
    pub fn fixed_values(&self) -> impl Iterator<Item = (&Ticker, f64)> {
        self.entries.iter().filter_map(|(t, a)| match a {
            Allocation::FixedCashValue(v) => Some((t, *v)),
            Allocation::Proportion(_) => None,
        })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Target allocation sets keyed by account identifier.
///
/// Identifiers are the last three digits of an account number, or
/// [`GLOBAL_ACCOUNT`] for a set that applies to any account without its own.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TargetAllocations {
    accounts: BTreeMap<String, TargetAllocation>,
}

impl TargetAllocations {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, account: impl Into<String>, targets: TargetAllocation) {
        self.accounts.insert(account.into(), targets);
    }

    /// Targets for `account`, falling back to the global set.
    pub fn for_account(&self, account: &str) -> Option<&TargetAllocation> {
        self.accounts
            .get(account)
            .or_else(|| self.accounts.get(GLOBAL_ACCOUNT))
    }

    /// Account identifiers in order.
    pub fn accounts(&self) -> impl Iterator<Item = &str> {
        self.accounts.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.accounts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.accounts.is_empty()
    }
}
