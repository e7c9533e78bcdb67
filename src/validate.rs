//! Input preconditions shared by every engine entry point.
//!
//! Validation is all-or-nothing: it runs before any computation, and on
//! failure no plan is produced.

use crate::error::{Error, PriceRef, Result};
use crate::target::TargetAllocation;
use crate::ticker::{Holdings, Prices, Ticker};

/// Check cash, holdings and prices for one engine call.
///
/// Target tickers are checked before holdings; each group is visited in ticker
/// order, so the reported ticker is deterministic.
pub fn validate_inputs(
    cash: f64,
    holdings: &Holdings,
    prices: &Prices,
    targets: &TargetAllocation,
) -> Result<()> {
    if !cash.is_finite() || cash < 0.0 {
        return Err(Error::InvalidCash(cash));
    }
    ensure_prices(holdings, prices, targets)?;

    for ticker in sorted_keys(holdings) {
        let quantity = holdings[ticker];
        if !quantity.is_finite() || quantity < 0.0 {
            return Err(Error::InvalidHolding {
                ticker: ticker.clone(),
                quantity,
            });
        }
    }
    Ok(())
}

/// Confirm that every ticker referenced by `targets` or `holdings` has a
/// positive, finite price.
pub fn ensure_prices(holdings: &Holdings, prices: &Prices, targets: &TargetAllocation) -> Result<()> {
    for ticker in targets.tickers() {
        check_price(ticker, prices, PriceRef::Targets)?;
    }
    for ticker in sorted_keys(holdings) {
        check_price(ticker, prices, PriceRef::Holdings)?;
    }
    Ok(())
}

fn check_price(ticker: &Ticker, prices: &Prices, referenced_by: PriceRef) -> Result<()> {
    match prices.get(ticker) {
        None => Err(Error::MissingPrice {
            ticker: ticker.clone(),
            referenced_by,
        }),
        Some(&price) if !price.is_finite() || price <= 0.0 => Err(Error::InvalidPrice {
            ticker: ticker.clone(),
            price,
        }),
        Some(_) => Ok(()),
    }
}

fn sorted_keys(holdings: &Holdings) -> Vec<&Ticker> {
    let mut keys: Vec<&Ticker> = holdings.keys().collect();
    keys.sort();
    keys
}
