//! Shared broker types: accounts, positions, orders.

use std::fmt;

use wholeshare::{Plan, Ticker};

/// A position held in a brokerage account.
#[derive(Debug, Clone, PartialEq)]
pub struct Position {
    pub ticker: Ticker,
    /// Long quantity. Fractional shares are preserved.
    pub quantity: f64,
    pub market_value: f64,
}

/// A brokerage account with its balances and positions.
#[derive(Debug, Clone, PartialEq)]
pub struct Account {
    pub number: String,
    /// Opaque identifier the broker uses in URLs instead of the account number.
    pub hash: String,
    pub cash: f64,
    pub account_value: f64,
    pub positions: Vec<Position>,
}

impl Account {
    /// Last three characters of the account number.
    ///
    /// Target allocation files key accounts by this suffix.
    pub fn short_id(&self) -> &str {
        let n = self.number.len();
        // Account numbers are ASCII digits; fall back to the whole string otherwise
        self.number.get(n.saturating_sub(3)..).unwrap_or(&self.number)
    }

    /// Account number with all but the last three characters hidden.
    pub fn masked(&self) -> String {
        format!("********{}", self.short_id())
    }

    pub fn position(&self, ticker: &str) -> Option<&Position> {
        self.positions.iter().find(|p| p.ticker.as_str() == ticker)
    }
}

/// Buy or sell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BrokerSide {
    Buy,
    Sell,
}

impl fmt::Display for BrokerSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BrokerSide::Buy => f.write_str("BUY"),
            BrokerSide::Sell => f.write_str("SELL"),
        }
    }
}

/// One market-order leg: a side and a whole number of shares.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderLeg {
    pub ticker: Ticker,
    pub side: BrokerSide,
    pub quantity: u64,
}

/// Order to submit to a broker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BrokerOrder {
    /// All legs execute together.
    Single(Vec<OrderLeg>),
    /// `then` is released only after `first` fills.
    Trigger {
        first: Vec<OrderLeg>,
        then: Vec<OrderLeg>,
    },
}

impl BrokerOrder {
    /// Translate a trade plan into a submittable order.
    ///
    /// Returns `None` for an empty plan. A plan with sales becomes a
    /// [`BrokerOrder::Trigger`] so the proceeds settle before the purchases
    /// are released.
    pub fn from_plan(plan: &Plan) -> Option<BrokerOrder> {
        let buys: Vec<OrderLeg> = plan
            .buys()
            .map(|(ticker, quantity)| OrderLeg {
                ticker: ticker.clone(),
                side: BrokerSide::Buy,
                quantity,
            })
            .collect();
        let sells: Vec<OrderLeg> = plan
            .sells()
            .map(|(ticker, quantity)| OrderLeg {
                ticker: ticker.clone(),
                side: BrokerSide::Sell,
                quantity,
            })
            .collect();

        match (sells.is_empty(), buys.is_empty()) {
            (true, true) => None,
            (true, false) => Some(BrokerOrder::Single(buys)),
            (false, _) => Some(BrokerOrder::Trigger {
                first: sells,
                then: buys,
            }),
        }
    }

    /// All legs, sells first for trigger orders.
    pub fn legs(&self) -> impl Iterator<Item = &OrderLeg> {
        let none: &[OrderLeg] = &[];
        let (a, b) = match self {
            BrokerOrder::Single(legs) => (legs.as_slice(), none),
            BrokerOrder::Trigger { first, then } => (first.as_slice(), then.as_slice()),
        };
        a.iter().chain(b.iter())
    }
}

/// Opaque order ID returned by the broker.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct OrderId(pub String);

impl fmt::Display for OrderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
