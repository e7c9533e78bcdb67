//! OAuth 2.0 authorization-code flow against the Schwab identity endpoints.
//!
//! The operator opens [`authorize_url`] in a browser, logs in, and pastes the
//! URL they were redirected to. [`code_from_redirect`] pulls the code out of
//! it and [`exchange_code`] trades it for a token.

use chrono::Utc;
use log::{debug, info};
use reqwest::Url;
use reqwest::blocking::Client;

use super::SchwabConfig;
use super::types::{Token, TokenResponse};
use crate::error::BrokerError;

/// URL the operator opens to grant access.
pub fn authorize_url(config: &SchwabConfig) -> Result<String, BrokerError> {
    let url = Url::parse_with_params(
        &config.auth_url,
        &[
            ("client_id", config.client_id.as_str()),
            ("redirect_uri", config.redirect_uri.as_str()),
            ("response_type", "code"),
        ],
    )
    .map_err(|e| BrokerError::Auth(format!("invalid authorize url: {e}")))?;
    Ok(url.into())
}

/// Extract the `code` query parameter from a pasted redirect URL.
pub fn code_from_redirect(redirect: &str) -> Result<String, BrokerError> {
    let url = Url::parse(redirect.trim())
        .map_err(|e| BrokerError::Auth(format!("not a url: {e}")))?;
    url.query_pairs()
        .find(|(k, _)| k == "code")
        .map(|(_, v)| v.into_owned())
        .filter(|code| !code.is_empty())
        .ok_or_else(|| BrokerError::Auth("no code in redirect url".into()))
}

/// Exchange an authorization code for a token.
pub fn exchange_code(
    http: &Client,
    config: &SchwabConfig,
    code: &str,
) -> Result<Token, BrokerError> {
    debug!("Exchanging authorization code");
    let resp = request_token(
        http,
        config,
        &[
            ("grant_type", "authorization_code"),
            ("code", code),
            ("redirect_uri", config.redirect_uri.as_str()),
        ],
    )?;
    Token::from_response(resp, None, Utc::now())
        .ok_or_else(|| BrokerError::Auth("token response has no refresh token".into()))
}

/// Obtain a fresh access token using `token.refresh_token`.
pub fn refresh(http: &Client, config: &SchwabConfig, token: &Token) -> Result<Token, BrokerError> {
    let resp = request_token(
        http,
        config,
        &[
            ("grant_type", "refresh_token"),
            ("refresh_token", token.refresh_token.as_str()),
        ],
    )?;
    info!("Access token refreshed");
    Token::from_response(resp, Some(&token.refresh_token), Utc::now())
        .ok_or_else(|| BrokerError::Auth("token response has no refresh token".into()))
}

fn request_token(
    http: &Client,
    config: &SchwabConfig,
    form: &[(&str, &str)],
) -> Result<TokenResponse, BrokerError> {
    let resp = http
        .post(&config.token_url)
        .basic_auth(&config.client_id, Some(&config.client_secret))
        .form(form)
        .send()
        .map_err(|e| BrokerError::Connection(format!("token request failed: {e}")))?;

    if !resp.status().is_success() {
        let status = resp.status();
        let body = resp.text().unwrap_or_default();
        return Err(BrokerError::Auth(format!(
            "token endpoint returned {status}: {body}; run `rebalancer login`"
        )));
    }

    resp.json::<TokenResponse>()
        .map_err(|e| BrokerError::Auth(format!("failed to parse token response: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_code() {
        let code = code_from_redirect(
            "https://127.0.0.1:8182/oauth2/callback?code=C0.abc%40&session=xyz",
        )
        .unwrap();
        assert_eq!(code, "C0.abc@");
    }

    #[test]
    fn missing_code_is_an_error() {
        assert!(code_from_redirect("https://127.0.0.1/cb?session=1").is_err());
        assert!(code_from_redirect("https://127.0.0.1/cb?code=").is_err());
        assert!(code_from_redirect("not a url").is_err());
    }

    #[test]
    fn authorize_url_carries_client() {
        let config = SchwabConfig::new("id123", "secret", "https://127.0.0.1/cb");
        let url = authorize_url(&config).unwrap();
        assert!(url.starts_with("https://api.schwabapi.com/v1/oauth/authorize?"));
        assert!(url.contains("client_id=id123"));
        assert!(url.contains("redirect_uri=https%3A%2F%2F127.0.0.1%2Fcb"));
        assert!(!url.contains("secret"));
    }
}
