//! Schwab connection and the interactive OAuth login.

use log::{info, warn};
use wholeshare_broker::schwab::SchwabBroker;
use wholeshare_broker::schwab::token_store::TokenStore;

use crate::config::Config;
use crate::error::{Error, Result};

/// Build a Schwab broker from the config and environment.
pub fn connect(config: &Config) -> Result<SchwabBroker> {
    let store = TokenStore::from_env(config.token_path(), &config.auth.key_env)?;
    let broker = SchwabBroker::new(config.schwab_config()?, store)?;
    Ok(broker)
}

/// Connect, running the login flow first when no token is stored.
pub fn connect_logged_in(config: &Config) -> Result<SchwabBroker> {
    let broker = connect(config)?;
    if !broker.has_token() {
        warn!("no stored token, starting login");
        login(&broker)?;
    }
    Ok(broker)
}

/// Print the authorize URL, read the redirect URL the browser lands on, and
/// store the resulting token.
pub fn login(broker: &SchwabBroker) -> Result<()> {
    let url = broker.login_url()?;
    println!("Open this URL in a browser and log in:\n\n  {url}\n");
    println!("After approving, copy the full URL of the page you are redirected to.");

    let redirect: String = dialoguer::Input::new()
        .with_prompt("Redirect URL")
        .interact_text()
        .map_err(|e| Error::Aborted(format!("login prompt failed: {e}")))?;

    broker.login(redirect.trim())?;
    info!("login complete, token stored");
    println!("Logged in.");
    Ok(())
}
