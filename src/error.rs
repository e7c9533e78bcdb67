//! Engine error types.

use std::fmt;

use crate::ticker::Ticker;

/// Which input referenced a ticker that failed price validation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PriceRef {
    Holdings,
    Targets,
}

impl fmt::Display for PriceRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PriceRef::Holdings => write!(f, "holdings"),
            PriceRef::Targets => write!(f, "target allocation"),
        }
    }
}

/// Errors returned by the allocation engine and target validation.
///
/// Every variant is a precondition failure: when one is returned, no plan was
/// computed and nothing the caller owns was touched.
#[derive(Clone, Debug, PartialEq, thiserror::Error)]
pub enum Error {
    #[error("price for {ticker} in {referenced_by} not found")]
    MissingPrice { ticker: Ticker, referenced_by: PriceRef },

    #[error("price for {ticker} must be positive and finite, got {price}")]
    InvalidPrice { ticker: Ticker, price: f64 },

    #[error("cash must be non-negative and finite, got {0}")]
    InvalidCash(f64),

    #[error("holding of {ticker} must be non-negative and finite, got {quantity}")]
    InvalidHolding { ticker: Ticker, quantity: f64 },

    #[error("proportion for {ticker} must be in (0, 1], got {value}")]
    InvalidProportion { ticker: Ticker, value: f64 },

    #[error("fixed cash value for {ticker} must be positive and finite, got {value}")]
    InvalidFixedValue { ticker: Ticker, value: f64 },

    #[error("allocation proportions sum to {sum}, expected 1.0")]
    ProportionSum { sum: f64 },

    #[error("duplicate ticker in target allocation: {0}")]
    DuplicateTicker(Ticker),
}

pub type Result<T> = std::result::Result<T, Error>;
