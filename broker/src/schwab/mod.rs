//! Charles Schwab broker implementation.

pub mod auth;
pub mod client;
pub mod orders;
pub mod token_store;
pub mod types;

use std::time::Duration;

use log::{debug, warn};
use wholeshare::{Prices, Ticker};

use crate::Broker;
use crate::error::BrokerError;
use crate::types::*;
use client::SchwabClient;
use orders::OrderRequest;
use token_store::TokenStore;
use types::SecuritiesAccount;

pub const DEFAULT_AUTH_URL: &str = "https://api.schwabapi.com/v1/oauth/authorize";
pub const DEFAULT_TOKEN_URL: &str = "https://api.schwabapi.com/v1/oauth/token";
pub const DEFAULT_TRADER_URL: &str = "https://api.schwabapi.com/trader/v1";
pub const DEFAULT_MARKET_DATA_URL: &str = "https://api.schwabapi.com/marketdata/v1";

/// OAuth application credentials and API endpoints.
#[derive(Clone)]
pub struct SchwabConfig {
    pub client_id: String,
    pub client_secret: String,
    pub redirect_uri: String,
    pub auth_url: String,
    pub token_url: String,
    pub trader_url: String,
    pub market_data_url: String,
    pub timeout: Duration,
}

impl std::fmt::Debug for SchwabConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SchwabConfig")
            .field("client_id", &self.client_id)
            .field("redirect_uri", &self.redirect_uri)
            .field("trader_url", &self.trader_url)
            .field("market_data_url", &self.market_data_url)
            .finish_non_exhaustive()
    }
}

impl SchwabConfig {
    /// Credentials with the production endpoints and a 30 second timeout.
    pub fn new(client_id: &str, client_secret: &str, redirect_uri: &str) -> Self {
        Self {
            client_id: client_id.to_string(),
            client_secret: client_secret.to_string(),
            redirect_uri: redirect_uri.to_string(),
            auth_url: DEFAULT_AUTH_URL.to_string(),
            token_url: DEFAULT_TOKEN_URL.to_string(),
            trader_url: DEFAULT_TRADER_URL.to_string(),
            market_data_url: DEFAULT_MARKET_DATA_URL.to_string(),
            timeout: Duration::from_secs(30),
        }
    }
}

/// Schwab broker implementing the generic Broker trait.
///
/// Uses REST API for all operations. Blocking (sync) via reqwest::blocking.
pub struct SchwabBroker {
    client: SchwabClient,
}

impl SchwabBroker {
    pub fn new(config: SchwabConfig, store: TokenStore) -> Result<Self, BrokerError> {
        Ok(Self {
            client: SchwabClient::new(config, store)?,
        })
    }

    /// URL the operator opens to authorize this application.
    pub fn login_url(&self) -> Result<String, BrokerError> {
        auth::authorize_url(self.client.config())
    }

    /// Finish logging in with the pasted redirect URL.
    pub fn login(&self, redirect: &str) -> Result<(), BrokerError> {
        self.client.login(redirect)
    }

    /// Whether a token (possibly expired) is available.
    pub fn has_token(&self) -> bool {
        self.client.has_token()
    }
}

/// Convert a Schwab account into the broker-neutral form.
///
/// Short positions are not supported by the rebalancer and are dropped.
pub fn to_account(account: SecuritiesAccount, hash: String) -> Account {
    let positions = account
        .positions
        .into_iter()
        .filter_map(|p| {
            if p.short_quantity > 0.0 {
                warn!("Ignoring short position in {}", p.instrument.symbol);
                return None;
            }
            Some(Position {
                ticker: Ticker::from(p.instrument.symbol),
                quantity: p.long_quantity,
                market_value: p.market_value,
            })
        })
        .collect();

    Account {
        number: account.account_number,
        hash,
        cash: account.initial_balances.cash_balance,
        account_value: account.initial_balances.account_value,
        positions,
    }
}

/// Last prices from a quote response. Entries without a quote are skipped.
pub fn to_prices(resp: types::QuoteResponse) -> Prices {
    resp.into_values()
        .filter_map(|entry| {
            let quote = entry.quote?;
            Some((Ticker::from(entry.symbol), quote.last_price))
        })
        .collect()
}

impl Broker for SchwabBroker {
    fn accounts(&self) -> Result<Vec<Account>, BrokerError> {
        let numbers = self.client.account_numbers()?;
        debug!("Found {} linked accounts", numbers.len());

        numbers
            .into_iter()
            .map(|n| {
                let resp = self.client.account(&n.hash_value)?;
                Ok(to_account(resp.securities_account, n.hash_value))
            })
            .collect()
    }

    fn quotes(&self, tickers: &[Ticker]) -> Result<Prices, BrokerError> {
        if tickers.is_empty() {
            return Ok(Prices::default());
        }
        let symbols: Vec<&str> = tickers.iter().map(Ticker::as_str).collect();
        let resp = self.client.quotes(&symbols)?;
        Ok(to_prices(resp))
    }

    fn submit_order(&self, account: &Account, order: &BrokerOrder) -> Result<OrderId, BrokerError> {
        let request = OrderRequest::from_order(order);
        self.client.place_order(&account.hash, &request)
    }
}
