//! Schwab-specific API response types.
//!
//! Only the fields the rebalancer reads are declared; serde ignores the rest.

use std::collections::HashMap;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Entry of `GET /accounts/accountNumbers`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountNumber {
    pub account_number: String,
    pub hash_value: String,
}

/// Response of `GET /accounts/{hash}`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountResponse {
    pub securities_account: SecuritiesAccount,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SecuritiesAccount {
    pub account_number: String,
    #[serde(default)]
    pub positions: Vec<PositionInfo>,
    #[serde(default)]
    pub initial_balances: Balances,
}

/// Start-of-day balances.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Balances {
    #[serde(default)]
    pub cash_balance: f64,
    #[serde(default)]
    pub account_value: f64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PositionInfo {
    #[serde(default)]
    pub long_quantity: f64,
    #[serde(default)]
    pub short_quantity: f64,
    #[serde(default)]
    pub market_value: f64,
    pub instrument: Instrument,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Instrument {
    pub symbol: String,
    #[serde(default)]
    pub asset_type: Option<String>,
}

/// Response of `GET /quotes`, keyed by symbol.
pub type QuoteResponse = HashMap<String, QuoteEntry>;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteEntry {
    pub symbol: String,
    /// Absent for symbols the market data API could not resolve.
    #[serde(default)]
    pub quote: Option<QuoteData>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteData {
    pub last_price: f64,
    #[serde(default)]
    pub bid_price: Option<f64>,
    #[serde(default)]
    pub ask_price: Option<f64>,
}

/// Response of the OAuth token endpoint.
#[derive(Debug, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    pub token_type: String,
    /// Lifetime of the access token in seconds.
    pub expires_in: i64,
    #[serde(default)]
    pub scope: Option<String>,
}

/// An OAuth token as persisted in the token store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Token {
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: String,
    pub expires_at: DateTime<Utc>,
}

impl Token {
    /// Build a token from an endpoint response received at `now`.
    ///
    /// Refresh responses may omit the refresh token; `previous_refresh` is
    /// carried over in that case.
    pub fn from_response(
        resp: TokenResponse,
        previous_refresh: Option<&str>,
        now: DateTime<Utc>,
    ) -> Option<Token> {
        let refresh_token = resp
            .refresh_token
            .or_else(|| previous_refresh.map(str::to_string))?;
        Some(Token {
            access_token: resp.access_token,
            refresh_token,
            token_type: resp.token_type,
            expires_at: now + Duration::seconds(resp.expires_in),
        })
    }

    /// Whether the access token expires within `margin` of `now`.
    pub fn is_expired(&self, now: DateTime<Utc>, margin: Duration) -> bool {
        now + margin >= self.expires_at
    }
}
