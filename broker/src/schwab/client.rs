//! Schwab REST API client.

use std::sync::Mutex;

use chrono::{Duration, Utc};
use log::debug;
use reqwest::blocking::{Client, RequestBuilder, Response};
use reqwest::{StatusCode, Url};
use serde::de::DeserializeOwned;

use super::SchwabConfig;
use super::auth;
use super::orders::OrderRequest;
use super::token_store::TokenStore;
use super::types::{AccountNumber, AccountResponse, QuoteResponse, Token};
use crate::error::BrokerError;
use crate::types::OrderId;

/// Refresh this long before the access token actually expires.
const EXPIRY_MARGIN_SECS: i64 = 60;

/// Blocking Schwab REST client.
///
/// Holds the current token and refreshes it (persisting the result) before
/// any request made with an expired access token.
pub struct SchwabClient {
    http: Client,
    config: SchwabConfig,
    store: TokenStore,
    token: Mutex<Option<Token>>,
}

impl SchwabClient {
    /// Create a client and load any previously stored token.
    pub fn new(config: SchwabConfig, store: TokenStore) -> Result<Self, BrokerError> {
        let http = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| BrokerError::Connection(format!("failed to build http client: {e}")))?;
        let token = store.load()?;
        Ok(Self {
            http,
            config,
            store,
            token: Mutex::new(token),
        })
    }

    pub fn config(&self) -> &SchwabConfig {
        &self.config
    }

    pub fn has_token(&self) -> bool {
        self.token.lock().map(|t| t.is_some()).unwrap_or(false)
    }

    /// Complete a login with the redirect URL the operator pasted.
    pub fn login(&self, redirect: &str) -> Result<(), BrokerError> {
        let code = auth::code_from_redirect(redirect)?;
        let token = auth::exchange_code(&self.http, &self.config, &code)?;
        self.store.save(&token)?;
        *self.lock_token()? = Some(token);
        Ok(())
    }

    fn lock_token(&self) -> Result<std::sync::MutexGuard<'_, Option<Token>>, BrokerError> {
        self.token
            .lock()
            .map_err(|_| BrokerError::Other("token lock poisoned".into()))
    }

    /// Current access token, refreshed first if it has expired.
    fn access_token(&self) -> Result<String, BrokerError> {
        let mut guard = self.lock_token()?;
        let token = guard
            .as_ref()
            .ok_or_else(|| BrokerError::Auth("not logged in; run `rebalancer login`".into()))?;

        if token.is_expired(Utc::now(), Duration::seconds(EXPIRY_MARGIN_SECS)) {
            let fresh = auth::refresh(&self.http, &self.config, token)?;
            self.store.save(&fresh)?;
            let access = fresh.access_token.clone();
            *guard = Some(fresh);
            return Ok(access);
        }
        Ok(token.access_token.clone())
    }

    fn send(&self, req: RequestBuilder, what: &str) -> Result<Response, BrokerError> {
        let resp = req
            .bearer_auth(self.access_token()?)
            .send()
            .map_err(|e| BrokerError::Connection(format!("{what} request failed: {e}")))?;

        match resp.status() {
            StatusCode::UNAUTHORIZED => Err(BrokerError::Auth(format!(
                "{what} returned 401; run `rebalancer login`"
            ))),
            s if s.is_success() => Ok(resp),
            status => {
                let body = resp.text().unwrap_or_default();
                Err(BrokerError::Connection(format!(
                    "{what} returned {status}: {body}"
                )))
            }
        }
    }

    fn get_json<T: DeserializeOwned>(&self, url: Url, what: &str) -> Result<T, BrokerError> {
        debug!("GET {}", url.path());
        let resp = self.send(self.http.get(url), what)?;
        resp.json::<T>()
            .map_err(|e| BrokerError::Connection(format!("failed to parse {what}: {e}")))
    }

    fn url(&self, base: &str, path: &str) -> Result<Url, BrokerError> {
        Url::parse(&format!("{}/{path}", base.trim_end_matches('/')))
            .map_err(|e| BrokerError::Other(format!("invalid url: {e}")))
    }

    /// GET /accounts/accountNumbers
    pub fn account_numbers(&self) -> Result<Vec<AccountNumber>, BrokerError> {
        let url = self.url(&self.config.trader_url, "accounts/accountNumbers")?;
        self.get_json(url, "account numbers")
    }

    /// GET /accounts/{hash}?fields=positions
    pub fn account(&self, hash: &str) -> Result<AccountResponse, BrokerError> {
        let mut url = self.url(&self.config.trader_url, &format!("accounts/{hash}"))?;
        url.query_pairs_mut().append_pair("fields", "positions");
        self.get_json(url, "account")
    }

    /// GET /quotes?symbols=..&fields=quote&indicative=false
    pub fn quotes(&self, symbols: &[&str]) -> Result<QuoteResponse, BrokerError> {
        let mut url = self.url(&self.config.market_data_url, "quotes")?;
        url.query_pairs_mut()
            .append_pair("symbols", &symbols.join(","))
            .append_pair("fields", "quote")
            .append_pair("indicative", "false");
        self.get_json(url, "quotes")
    }

    /// POST /accounts/{hash}/orders
    ///
    /// Schwab answers 201 with an empty body; the order ID is the last
    /// segment of the `Location` header.
    pub fn place_order(&self, hash: &str, order: &OrderRequest) -> Result<OrderId, BrokerError> {
        let url = self.url(&self.config.trader_url, &format!("accounts/{hash}/orders"))?;
        if let Ok(body) = serde_json::to_string(order) {
            debug!("Submitting Schwab order: {body}");
        }

        let resp = self.send(self.http.post(url).json(order), "order")?;
        if resp.status() != StatusCode::CREATED {
            let status = resp.status();
            let body = resp.text().unwrap_or_default();
            return Err(BrokerError::Order(format!("order returned {status}: {body}")));
        }

        let location = resp
            .headers()
            .get(reqwest::header::LOCATION)
            .and_then(|v| v.to_str().ok());
        Ok(order_id_from_location(location))
    }
}

/// Last path segment of the `Location` header, or `"unknown"`.
pub fn order_id_from_location(location: Option<&str>) -> OrderId {
    let id = location
        .and_then(|l| l.trim_end_matches('/').rsplit('/').next())
        .filter(|s| !s.is_empty())
        .unwrap_or("unknown");
    OrderId(id.to_string())
}
