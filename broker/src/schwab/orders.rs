//! Schwab order payloads.
//!
//! Every order is a DAY market order in the normal session. A
//! [`BrokerOrder::Trigger`] becomes a `TRIGGER` parent carrying the sells
//! with one `SINGLE` child carrying the buys.

use serde::Serialize;

use crate::types::{BrokerOrder, OrderLeg};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderRequest {
    pub order_type: &'static str,
    pub session: &'static str,
    pub duration: &'static str,
    pub order_strategy_type: &'static str,
    pub order_leg_collection: Vec<LegRequest>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub child_order_strategies: Vec<OrderRequest>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LegRequest {
    pub instruction: String,
    pub quantity: u64,
    pub instrument: InstrumentRequest,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InstrumentRequest {
    pub symbol: String,
    pub asset_type: &'static str,
}

impl From<&OrderLeg> for LegRequest {
    fn from(leg: &OrderLeg) -> Self {
        LegRequest {
            instruction: leg.side.to_string(),
            quantity: leg.quantity,
            instrument: InstrumentRequest {
                symbol: leg.ticker.as_str().to_string(),
                asset_type: "EQUITY",
            },
        }
    }
}

impl OrderRequest {
    fn market(strategy: &'static str, legs: &[OrderLeg]) -> Self {
        OrderRequest {
            order_type: "MARKET",
            session: "NORMAL",
            duration: "DAY",
            order_strategy_type: strategy,
            order_leg_collection: legs.iter().map(LegRequest::from).collect(),
            child_order_strategies: Vec::new(),
        }
    }

    pub fn from_order(order: &BrokerOrder) -> Self {
        match order {
            BrokerOrder::Single(legs) => Self::market("SINGLE", legs),
            // Nothing to release after the sells
            BrokerOrder::Trigger { first, then } if then.is_empty() => {
                Self::market("SINGLE", first)
            }
            BrokerOrder::Trigger { first, then } => {
                let mut parent = Self::market("TRIGGER", first);
                parent.child_order_strategies.push(Self::market("SINGLE", then));
                parent
            }
        }
    }
}
