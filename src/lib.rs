//! # wholeshare
//!
//! A deterministic whole-share allocation engine for brokerage accounts.
//!
//! Given cash, current holdings (possibly fractional), current prices and a
//! [`TargetAllocation`], the engine computes which whole shares to buy (and,
//! when rebalancing, sell) to move the account toward its targets.
//!
//! ## Features
//!
//! - **Fixed-cash targets**: hold an absolute dollar amount of a ticker (e.g. a money market fund)
//! - **Proportional targets**: hold a fraction of total tracked value
//! - **Greedy fill**: buy one share at a time of the most underweight affordable ticker
//! - **Rebalance with selling**: simulate liquidation of whole shares and rebuy from scratch
//! - **No partial trades**: plans are integer share counts; fractional remainders are never sold
//!
//! ## Quick Start
//!
//! ```
//! use wholeshare::{Allocation, TargetAllocation, Ticker, balance_purchase};
//! use wholeshare::ticker::quantities;
//!
//! let targets = TargetAllocation::new([
//!     (Ticker::from("DFAC"), Allocation::Proportion(0.64)),
//!     (Ticker::from("DFIC"), Allocation::Proportion(0.27)),
//!     (Ticker::from("DFEM"), Allocation::Proportion(0.09)),
//!     (Ticker::from("SWVXX"), Allocation::FixedCashValue(4000.0)),
//! ])?;
//!
//! let holdings = quantities(&[("DFAC", 30.0), ("DFIC", 20.0), ("DFEM", 10.0), ("SWVXX", 3998.0)]);
//! let prices = quantities(&[("DFAC", 30.0), ("DFIC", 20.0), ("DFEM", 10.0), ("SWVXX", 1.0)]);
//!
//! let result = balance_purchase(503.10, &holdings, &prices, &targets)?;
//! assert_eq!(result.plan.get("SWVXX"), 2); // fixed target topped up first
//! assert_eq!(result.plan.get("DFAC"), 10);
//! assert!((result.cash - 1.10).abs() < 1e-7);
//! # Ok::<(), wholeshare::Error>(())
//! ```
//!
//! ## Rebalancing
//!
//! ```
//! use wholeshare::{Allocation, TargetAllocation, Ticker, rebalance_with_selling};
//! use wholeshare::ticker::quantities;
//!
//! let targets = TargetAllocation::new([
//!     (Ticker::from("VTI"), Allocation::Proportion(0.5)),
//!     (Ticker::from("VXUS"), Allocation::Proportion(0.5)),
//! ])?;
//! let holdings = quantities(&[("VTI", 8.0), ("VXUS", 2.0)]);
//! let prices = quantities(&[("VTI", 10.0), ("VXUS", 10.0)]);
//!
//! let result = rebalance_with_selling(0.0, &holdings, &prices, &targets)?;
//! assert_eq!(result.plan.get("VTI"), -3);
//! assert_eq!(result.plan.get("VXUS"), 3);
//! # Ok::<(), wholeshare::Error>(())
//! ```
//!
//! ## Determinism
//!
//! Every operation is a pure function of its inputs. Where the algorithm has
//! a free choice (the order fixed-cash targets are filled in, ties between
//! equally underweight tickers) the lexical ticker order decides.

pub mod balance;
pub mod error;
pub mod fixed;
pub mod greedy;
pub mod plan;
pub mod rebalance;
pub mod target;
pub mod ticker;
pub mod validate;

pub use balance::balance_purchase;
pub use error::{Error, PriceRef, Result};
pub use fixed::fill_fixed_targets;
pub use greedy::fill_proportional;
pub use plan::{BalanceResult, Plan};
pub use rebalance::rebalance_with_selling;
pub use target::{Allocation, GLOBAL_ACCOUNT, PROPORTION_TOLERANCE, TargetAllocation, TargetAllocations};
pub use ticker::{Holdings, Prices, Ticker};
pub use validate::{ensure_prices, validate_inputs};
