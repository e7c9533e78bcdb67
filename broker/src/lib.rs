//! Broker trait and implementations for wholeshare.
//!
//! Provides a generic `Broker` trait that abstracts over brokerages: it is
//! the holdings source, the price source and the order sink for the
//! rebalancer. Implementations:
//!
//! - **Schwab** (feature `schwab`): Charles Schwab trader and market data REST APIs
//! - **Mock** ([`mock::MockBroker`]): in-memory broker for tests

pub mod error;
pub mod mock;
pub mod types;

#[cfg(feature = "schwab")]
pub mod schwab;

pub use error::BrokerError;
pub use types::*;

use wholeshare::{Prices, Ticker};

/// A broker connection that can list accounts, quote prices and submit orders.
pub trait Broker {
    /// All accounts linked to the login, with balances and positions.
    fn accounts(&self) -> Result<Vec<Account>, BrokerError>;

    /// Last trade price for each ticker.
    ///
    /// Tickers the broker does not know are omitted from the result; the
    /// engine reports them as missing prices.
    fn quotes(&self, tickers: &[Ticker]) -> Result<Prices, BrokerError>;

    /// Submit an order against `account`. Returns order ID.
    fn submit_order(&self, account: &Account, order: &BrokerOrder) -> Result<OrderId, BrokerError>;
}
