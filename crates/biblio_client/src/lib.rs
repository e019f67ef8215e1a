//! crates/biblio_client/src/lib.rs
//!
//! Concrete adapters for the Biblio reading client and the wiring that puts
//! them behind the core's session, favorites and bookmark components.

pub mod config;
pub mod error;
pub mod http;
pub mod kv;

use std::sync::Arc;

use biblio_core::bookmarks::{ReadingPositionStore, ReadingSession};
use biblio_core::ports::CatalogApi;
use biblio_core::session::SessionContext;
use tracing::info;

pub use config::ClientConfig;
pub use error::ClientError;
pub use http::HttpBackend;
pub use kv::{JsonFileStore, MemoryStore};

/// Everything a running client needs: the reader's session, the on-device
/// bookmarks and the catalog.
pub struct Reader {
    pub session: SessionContext,
    pub pins: ReadingPositionStore,
    pub catalog: Arc<dyn CatalogApi>,
}

impl Reader {
    pub async fn connect(config: &ClientConfig) -> Result<Self, ClientError> {
        let store = JsonFileStore::open(&config.pins_path).await?;
        let backend = Arc::new(HttpBackend::new(&config.api_url, config.request_timeout)?);
        info!(api_url = %config.api_url, "Reader connected");

        Ok(Self {
            session: SessionContext::new(backend.clone(), backend.clone()),
            pins: ReadingPositionStore::new(Arc::new(store)),
            catalog: backend,
        })
    }

    /// Connects with configuration taken from the environment.
    pub async fn from_env() -> Result<Self, ClientError> {
        let config = ClientConfig::from_env()?;
        Self::connect(&config).await
    }

    /// Opens the reading screen state for `title`.
    pub async fn open_book(&self, title: &str) -> ReadingSession {
        ReadingSession::mount(self.pins.clone(), title).await
    }
}
