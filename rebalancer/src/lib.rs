//! wholeshare-rebalancer: whole-share investing and rebalancing for Schwab accounts.
//!
//! Reads per-account target allocations from a JSON file, fetches positions
//! and quotes through a [`wholeshare_broker::Broker`], plans whole-share
//! trades with the `wholeshare` engine, and submits them after confirmation
//! with an audit trail.

pub mod audit;
pub mod broker;
pub mod config;
pub mod error;
pub mod execution;
pub mod menu;
pub mod reconcile;
pub mod target;
