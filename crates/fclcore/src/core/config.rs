//! Client configuration
//!
//! Values are merged from, in increasing priority:
//! - built-in defaults
//! - a TOML file (`fcl.toml` unless another path is given)
//! - `FCL_`-prefixed environment variables (`FCL_API_BASE`, `FCL_INIT_DATA`, ...)

use figment::providers::{Env, Format, Toml};
use figment::Figment;
use secrecy::SecretString;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use url::Url;

use crate::core::error::ConfigError;

/// Default config file looked up in the working directory
pub const DEFAULT_CONFIG_FILE: &str = "fcl.toml";

/// Environment variable prefix
pub const ENV_PREFIX: &str = "FCL_";

/// Page location used when nothing else is configured (the Vite dev server)
pub const DEFAULT_PAGE_URL: &str = "http://localhost:5173/register";

/// Maximum accepted init data age: 24 hours
pub const DEFAULT_MAX_AUTH_AGE_SECS: u64 = 60 * 60 * 24;

/// Path of the registration API relative to the page origin
pub const API_PATH: &str = "/api";

#[derive(Debug, Deserialize)]
struct RawConfig {
    api_base: Option<String>,
    #[serde(default = "default_page_url")]
    page_url: String,
    init_data: Option<String>,
    host_state: Option<PathBuf>,
    bot_token: Option<String>,
    #[serde(default = "default_max_auth_age_secs")]
    max_auth_age_secs: u64,
    #[serde(default = "default_log_level")]
    log_level: String,
}

fn default_page_url() -> String {
    DEFAULT_PAGE_URL.to_string()
}

fn default_max_auth_age_secs() -> u64 {
    DEFAULT_MAX_AUTH_AGE_SECS
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Resolved client configuration
#[derive(Debug)]
pub struct ClientConfig {
    /// Base URL of the registration API, e.g. `https://fcl.example/api`
    pub api_base: Url,
    /// Location the Mini App page was opened at (query string and fragment included)
    pub page_url: Url,
    /// Init data as the Telegram host would expose it
    pub init_data: Option<SecretString>,
    /// JSON snapshot of `window.Telegram.WebApp`
    pub host_state: Option<PathBuf>,
    /// Bot token, only needed to verify init data locally
    pub bot_token: Option<SecretString>,
    pub max_auth_age: Duration,
    pub log_level: String,
}

impl ClientConfig {
    /// Builds the provider chain without extracting it
    pub fn figment(config_file: Option<&Path>) -> Figment {
        let file = config_file.unwrap_or_else(|| Path::new(DEFAULT_CONFIG_FILE));
        Figment::new().merge(Toml::file(file)).merge(Env::prefixed(ENV_PREFIX))
    }

    /// Loads configuration from the default providers
    ///
    /// A missing config file is not an error; environment variables alone are enough.
    pub fn load(config_file: Option<&Path>) -> Result<Self, ConfigError> {
        Self::from_figment(&Self::figment(config_file))
    }

    pub fn from_figment(figment: &Figment) -> Result<Self, ConfigError> {
        let raw: RawConfig = figment.extract()?;

        let page_url = parse_url(&raw.page_url)?;
        let api_base = match raw.api_base.as_deref() {
            Some(base) if !base.trim().is_empty() => parse_url(base)?,
            _ => page_url.join(API_PATH).map_err(|source| ConfigError::Url {
                value: raw.page_url.clone(),
                source,
            })?,
        };

        Ok(Self {
            api_base,
            page_url,
            init_data: non_empty_secret(raw.init_data),
            host_state: raw.host_state,
            bot_token: non_empty_secret(raw.bot_token),
            max_auth_age: Duration::from_secs(raw.max_auth_age_secs),
            log_level: raw.log_level,
        })
    }
}

fn parse_url(value: &str) -> Result<Url, ConfigError> {
    Url::parse(value).map_err(|source| ConfigError::Url {
        value: value.to_string(),
        source,
    })
}

fn non_empty_secret(value: Option<String>) -> Option<SecretString> {
    value.filter(|v| !v.is_empty()).map(SecretString::from)
}
