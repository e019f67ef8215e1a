//! crates/biblio_client/src/error.rs

use crate::config::ConfigError;
use biblio_core::ports::PortError;

/// Errors raised while bringing the client up.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Service Port Error: {0}")]
    Port(#[from] PortError),

    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),
}
