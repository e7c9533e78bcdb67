//! Target allocation file loading and validation.
//!
//! The file maps an account identifier (last three digits of the account
//! number, or `"global"`) to per-ticker targets:
//!
//! ```json
//! {
//!   "global": {
//!     "DFAC":  { "proportion": 0.64 },
//!     "DFIC":  { "proportion": 0.27 },
//!     "DFEM":  { "proportion": 0.09 },
//!     "SWVXX": { "fixed_cash_value": 4000 }
//!   }
//! }
//! ```

use std::collections::BTreeMap;
use std::path::Path;

use log::debug;
use serde::Deserialize;
use wholeshare::{Allocation, TargetAllocation, TargetAllocations, Ticker};

use crate::error::{Error, Result};

/// One ticker's entry as written in the file.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EntrySpec {
    #[serde(default)]
    pub proportion: Option<f64>,
    #[serde(default, alias = "fixedCashValue")]
    pub fixed_cash_value: Option<f64>,
}

impl EntrySpec {
    /// `None` for an untracked entry (neither field set to a non-zero value).
    fn to_allocation(&self, account: &str, ticker: &str) -> Result<Option<Allocation>> {
        let p = self.proportion.unwrap_or(0.0);
        let v = self.fixed_cash_value.unwrap_or(0.0);
        match (p != 0.0, v != 0.0) {
            (true, true) => Err(Error::Target(format!(
                "{account}/{ticker}: set either proportion or fixed_cash_value, not both"
            ))),
            (true, false) => Ok(Some(Allocation::Proportion(p))),
            (false, true) => Ok(Some(Allocation::FixedCashValue(v))),
            (false, false) => Ok(None),
        }
    }
}

type FileSpec = BTreeMap<String, BTreeMap<String, EntrySpec>>;

/// Load and validate a target allocation file.
pub fn load(path: &Path) -> Result<TargetAllocations> {
    let contents = std::fs::read_to_string(path).map_err(|e| Error::TargetRead {
        path: path.to_path_buf(),
        source: e,
    })?;
    from_json(&contents)
}

/// Parse from a JSON string (useful for testing).
pub fn from_json(json: &str) -> Result<TargetAllocations> {
    let spec: FileSpec = serde_json::from_str(json)?;
    if spec.is_empty() {
        return Err(Error::Target("no accounts defined".into()));
    }

    let mut allocations = TargetAllocations::new();
    for (account, entries) in spec {
        let mut tracked = Vec::with_capacity(entries.len());
        for (ticker, entry) in &entries {
            if ticker.trim().is_empty() {
                return Err(Error::Target(format!("{account}: empty ticker")));
            }
            match entry.to_allocation(&account, ticker)? {
                Some(a) => tracked.push((Ticker::new(ticker.as_str()), a)),
                None => debug!("{account}/{ticker}: no target, untracked"),
            }
        }

        let targets = TargetAllocation::new(tracked)
            .map_err(|e| Error::Target(format!("account {account}: {e}")))?;
        allocations.insert(account, targets);
    }
    Ok(allocations)
}
