//! TOML configuration loading and validation.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use wholeshare_broker::schwab::{
    DEFAULT_AUTH_URL, DEFAULT_MARKET_DATA_URL, DEFAULT_TOKEN_URL, DEFAULT_TRADER_URL, SchwabConfig,
};

use crate::error::{Error, Result};

/// Top-level configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub schwab: SchwabSection,
    #[serde(default)]
    pub auth: AuthConfig,
    #[serde(default)]
    pub targets: TargetsConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// OAuth application and API endpoints. Secrets are read from the
/// environment variables named here, never from the file itself.
#[derive(Debug, Clone, Deserialize)]
pub struct SchwabSection {
    #[serde(default = "default_client_id_env")]
    pub client_id_env: String,
    #[serde(default = "default_client_secret_env")]
    pub client_secret_env: String,
    pub redirect_uri: String,
    #[serde(default = "default_auth_url")]
    pub auth_url: String,
    #[serde(default = "default_token_url")]
    pub token_url: String,
    #[serde(default = "default_trader_url")]
    pub trader_url: String,
    #[serde(default = "default_market_data_url")]
    pub market_data_url: String,
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

fn default_client_id_env() -> String {
    "SCHWAB_OAUTH_CLIENT_ID".into()
}
fn default_client_secret_env() -> String {
    "SCHWAB_OAUTH_CLIENT_SECRET".into()
}
fn default_auth_url() -> String {
    DEFAULT_AUTH_URL.into()
}
fn default_token_url() -> String {
    DEFAULT_TOKEN_URL.into()
}
fn default_trader_url() -> String {
    DEFAULT_TRADER_URL.into()
}
fn default_market_data_url() -> String {
    DEFAULT_MARKET_DATA_URL.into()
}
fn default_timeout() -> u64 {
    30
}

#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    #[serde(default = "default_token_file")]
    pub token_file: String,
    /// Environment variable holding the token encryption key.
    #[serde(default = "default_key_env")]
    pub key_env: String,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            token_file: default_token_file(),
            key_env: default_key_env(),
        }
    }
}

fn default_token_file() -> String {
    "token.json".into()
}
fn default_key_env() -> String {
    "SCHWAB_TOKEN_KEY".into()
}

#[derive(Debug, Clone, Deserialize)]
pub struct TargetsConfig {
    #[serde(default = "default_targets_file")]
    pub file: String,
}

impl Default for TargetsConfig {
    fn default() -> Self {
        Self {
            file: default_targets_file(),
        }
    }
}

fn default_targets_file() -> String {
    "targetAllocations.json".into()
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_dir")]
    pub dir: String,
    #[serde(default = "default_audit_file")]
    pub audit_file: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            dir: default_log_dir(),
            audit_file: default_audit_file(),
        }
    }
}

fn default_log_dir() -> String {
    "./logs".into()
}
fn default_audit_file() -> String {
    "audit.jsonl".into()
}

impl Config {
    /// Load config from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| Error::ConfigRead {
            path: path.to_path_buf(),
            source: e,
        })?;
        Self::from_toml(&contents)
    }

    /// Parse and validate a TOML string.
    pub fn from_toml(contents: &str) -> Result<Self> {
        let config: Config = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate config invariants.
    fn validate(&self) -> Result<()> {
        let s = &self.schwab;
        if !(s.redirect_uri.starts_with("https://") || s.redirect_uri.starts_with("http://")) {
            return Err(Error::Config(
                "redirect_uri must be an http(s) url".into(),
            ));
        }
        if s.timeout_secs == 0 {
            return Err(Error::Config("timeout_secs must be > 0".into()));
        }
        for (name, value) in [
            ("client_id_env", &s.client_id_env),
            ("client_secret_env", &s.client_secret_env),
            ("auth.key_env", &self.auth.key_env),
            ("auth.token_file", &self.auth.token_file),
            ("targets.file", &self.targets.file),
        ] {
            if value.trim().is_empty() {
                return Err(Error::Config(format!("{name} must not be empty")));
            }
        }
        Ok(())
    }

    /// Schwab client settings with credentials read from the environment.
    pub fn schwab_config(&self) -> Result<SchwabConfig> {
        let s = &self.schwab;
        let client_id = env_var(&s.client_id_env)?;
        let client_secret = env_var(&s.client_secret_env)?;

        let mut config = SchwabConfig::new(&client_id, &client_secret, &s.redirect_uri);
        config.auth_url = s.auth_url.clone();
        config.token_url = s.token_url.clone();
        config.trader_url = s.trader_url.clone();
        config.market_data_url = s.market_data_url.clone();
        config.timeout = Duration::from_secs(s.timeout_secs);
        Ok(config)
    }

    pub fn token_path(&self) -> PathBuf {
        PathBuf::from(&self.auth.token_file)
    }

    pub fn targets_path(&self) -> PathBuf {
        PathBuf::from(&self.targets.file)
    }

    /// Full path to the audit log file.
    pub fn audit_path(&self) -> PathBuf {
        Path::new(&self.logging.dir).join(&self.logging.audit_file)
    }
}

fn env_var(name: &str) -> Result<String> {
    std::env::var(name)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| Error::Config(format!("environment variable {name} is not set")))
}
