//! Mock broker for testing: implements the `Broker` trait with configurable behavior.
//!
//! Use this in integration tests to simulate broker responses without network calls.
//!
//! ```
//! use wholeshare_broker::Broker;
//! use wholeshare_broker::mock::MockBroker;
//!
//! let broker = MockBroker::builder()
//!     .with_account("12345678", 1_000.0)
//!     .with_position("12345678", "VTI", 10.5, 250.0)
//!     .with_quote("VTI", 250.0)
//!     .build();
//!
//! let accounts = broker.accounts().unwrap();
//! assert_eq!(accounts[0].short_id(), "678");
//! ```

use std::sync::Mutex;

use wholeshare::{Prices, Ticker};

use crate::Broker;
use crate::error::BrokerError;
use crate::types::*;

/// How the mock broker handles submitted orders.
#[derive(Clone, Debug)]
pub enum FillMode {
    /// Orders are accepted and assigned sequential IDs.
    Accept,
    /// All orders are rejected.
    Reject,
}

/// A recorded order submission for assertion in tests.
#[derive(Clone, Debug)]
pub struct RecordedOrder {
    pub account: String,
    pub order: BrokerOrder,
}

/// Builder for `MockBroker`.
pub struct MockBrokerBuilder {
    fill_mode: FillMode,
    accounts: Vec<Account>,
    quotes: Prices,
}

impl MockBrokerBuilder {
    pub fn fill_mode(mut self, mode: FillMode) -> Self {
        self.fill_mode = mode;
        self
    }

    /// Add an account holding `cash`. The account hash is `H<number>`.
    pub fn with_account(mut self, number: &str, cash: f64) -> Self {
        self.accounts.push(Account {
            number: number.to_string(),
            hash: format!("H{number}"),
            cash,
            account_value: cash,
            positions: Vec::new(),
        });
        self
    }

    /// Add a position to a previously added account.
    ///
    /// Positions for unknown accounts are ignored.
    pub fn with_position(mut self, number: &str, ticker: &str, quantity: f64, price: f64) -> Self {
        if let Some(account) = self.accounts.iter_mut().find(|a| a.number == number) {
            let market_value = quantity * price;
            account.positions.push(Position {
                ticker: Ticker::from(ticker),
                quantity,
                market_value,
            });
            account.account_value += market_value;
        }
        self
    }

    pub fn with_quote(mut self, ticker: &str, price: f64) -> Self {
        self.quotes.insert(Ticker::from(ticker), price);
        self
    }

    pub fn build(self) -> MockBroker {
        MockBroker {
            fill_mode: self.fill_mode,
            accounts: self.accounts,
            quotes: self.quotes,
            submitted_orders: Mutex::new(Vec::new()),
        }
    }
}

/// A mock broker that records submitted orders and returns configurable responses.
pub struct MockBroker {
    fill_mode: FillMode,
    accounts: Vec<Account>,
    quotes: Prices,
    submitted_orders: Mutex<Vec<RecordedOrder>>,
}

impl MockBroker {
    pub fn builder() -> MockBrokerBuilder {
        MockBrokerBuilder {
            fill_mode: FillMode::Accept,
            accounts: Vec::new(),
            quotes: Prices::default(),
        }
    }

    /// Get all orders that were submitted (for assertion in tests).
    pub fn submitted_orders(&self) -> Vec<RecordedOrder> {
        self.submitted_orders
            .lock()
            .map(|orders| orders.clone())
            .unwrap_or_default()
    }
}

impl Broker for MockBroker {
    fn accounts(&self) -> Result<Vec<Account>, BrokerError> {
        Ok(self.accounts.clone())
    }

    fn quotes(&self, tickers: &[Ticker]) -> Result<Prices, BrokerError> {
        Ok(tickers
            .iter()
            .filter_map(|t| self.quotes.get(t).map(|&p| (t.clone(), p)))
            .collect())
    }

    fn submit_order(&self, account: &Account, order: &BrokerOrder) -> Result<OrderId, BrokerError> {
        let mut orders = self
            .submitted_orders
            .lock()
            .map_err(|_| BrokerError::Other("mock: order log poisoned".into()))?;

        // Record the order
        orders.push(RecordedOrder {
            account: account.number.clone(),
            order: order.clone(),
        });

        match &self.fill_mode {
            FillMode::Reject => Err(BrokerError::Order("mock: order rejected".into())),
            FillMode::Accept => Ok(OrderId(orders.len().to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wholeshare::Plan;

    fn broker() -> MockBroker {
        MockBroker::builder()
            .with_account("11111234", 500.0)
            .with_position("11111234", "VTI", 10.0, 250.0)
            .with_quote("VTI", 250.0)
            .with_quote("BND", 70.0)
            .build()
    }

    #[test]
    fn builder_basic() {
        let broker = broker();
        let accounts = broker.accounts().unwrap();
        assert_eq!(accounts.len(), 1);
        assert_eq!(accounts[0].positions.len(), 1);
        assert_eq!(accounts[0].account_value, 3000.0);
        assert_eq!(accounts[0].hash, "H11111234");
    }

    #[test]
    fn quotes_omit_unknown_tickers() {
        let prices = broker()
            .quotes(&[Ticker::from("VTI"), Ticker::from("XYZ")])
            .unwrap();
        assert_eq!(prices.len(), 1);
        assert_eq!(prices["VTI"], 250.0);
    }

    #[test]
    fn submit_records_orders() {
        let broker = broker();
        let account = &broker.accounts().unwrap()[0];
        let plan: Plan = [("BND", 2)].into_iter().collect();
        let order = BrokerOrder::from_plan(&plan).unwrap();

        let id = broker.submit_order(account, &order).unwrap();
        assert_eq!(id, OrderId("1".into()));

        let recorded = broker.submitted_orders();
        assert_eq!(recorded.len(), 1);
        assert_eq!(recorded[0].account, "11111234");
        assert_eq!(recorded[0].order, order);
    }

    #[test]
    fn reject_mode() {
        let broker = MockBroker::builder()
            .fill_mode(FillMode::Reject)
            .with_account("1", 0.0)
            .build();
        let account = &broker.accounts().unwrap()[0];
        let plan: Plan = [("BND", 2)].into_iter().collect();
        let order = BrokerOrder::from_plan(&plan).unwrap();

        assert!(broker.submit_order(account, &order).is_err());
        // Rejected orders are still recorded
        assert_eq!(broker.submitted_orders().len(), 1);
    }
}
