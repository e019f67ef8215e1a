//! crates/biblio_client/src/config.rs
//!
//! Client configuration, loaded from environment variables at startup.

use std::path::PathBuf;
use std::time::Duration;

/// A custom error type for configuration loading failures.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for the environment variable {0}: {1}")]
    InvalidValue(String, String),
}

#[derive(Clone, Debug)]
pub struct ClientConfig {
    pub api_url: String,
    pub pins_path: PathBuf,
    pub request_timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_url: "http://localhost:5000".to_string(),
            pins_path: PathBuf::from("./biblio-pins.json"),
            request_timeout: Duration::from_secs(30),
        }
    }
}

impl ClientConfig {
    /// Loads configuration from environment variables, falling back to defaults.
    ///
    /// A `.env` file is honoured outside of tests.
    pub fn from_env() -> Result<Self, ConfigError> {
        if !cfg!(test) {
            dotenvy::dotenv().ok();
        }
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from any `key -> value` source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let api_url = lookup("BIBLIO_API_URL").unwrap_or(defaults.api_url);
        if !api_url.starts_with("http://") && !api_url.starts_with("https://") {
            return Err(ConfigError::InvalidValue(
                "BIBLIO_API_URL".to_string(),
                format!("'{}' is not an http(s) URL", api_url),
            ));
        }

        let pins_path = lookup("BIBLIO_PINS_PATH")
            .map(PathBuf::from)
            .unwrap_or(defaults.pins_path);

        let request_timeout = match lookup("BIBLIO_HTTP_TIMEOUT_SECS") {
            Some(raw) => raw.parse::<u64>().map(Duration::from_secs).map_err(|_| {
                ConfigError::InvalidValue(
                    "BIBLIO_HTTP_TIMEOUT_SECS".to_string(),
                    format!("'{}' is not a number of seconds", raw),
                )
            })?,
            None => defaults.request_timeout,
        };

        Ok(Self {
            api_url,
            pins_path,
            request_timeout,
        })
    }
}
