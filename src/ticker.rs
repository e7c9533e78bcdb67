//! Core types: Ticker, Prices, Holdings

use std::borrow::Borrow;
use std::fmt;

use rustc_hash::FxHashMap;

/// Symbol identifying a tradable instrument (e.g. `"VTI"`).
///
/// Tickers are compared byte-wise, so `Ord` gives the lexical order the engine
/// uses wherever it needs a deterministic visiting order.
#[derive(Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct Ticker(String);

impl Ticker {
    pub fn new(s: impl Into<String>) -> Self {
        Ticker(s.into())
    }

    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Ticker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Pad support so tables can use `{:8}`
        f.pad(&self.0)
    }
}

impl From<&str> for Ticker {
    fn from(s: &str) -> Self {
        Ticker(s.to_string())
    }
}

impl From<String> for Ticker {
    fn from(s: String) -> Self {
        Ticker(s)
    }
}

impl Borrow<str> for Ticker {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for Ticker {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Current price per ticker, in dollars.
pub type Prices = FxHashMap<Ticker, f64>;

/// Held quantity per ticker. Quantities may be fractional (dividend reinvestment).
pub type Holdings = FxHashMap<Ticker, f64>;

/// Build a [`Prices`] or [`Holdings`] map from `(&str, f64)` pairs.
///
/// ```
/// use wholeshare::ticker::quantities;
///
/// let prices = quantities(&[("VTI", 250.0), ("VXUS", 60.0)]);
/// assert_eq!(prices["VTI"], 250.0);
/// ```
pub fn quantities(pairs: &[(&str, f64)]) -> FxHashMap<Ticker, f64> {
    pairs.iter().map(|&(t, v)| (Ticker::from(t), v)).collect()
}
