//! crates/biblio_client/src/kv.rs
//!
//! `KeyValueStore` adapters for the device: a JSON file that survives app
//! restarts, and a purely in-memory map.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use biblio_core::ports::{KeyValueStore, PortError, PortResult};
use tokio::sync::Mutex;
use tracing::{debug, info};

//=========================================================================================
// JsonFileStore
//=========================================================================================

/// A key-value store persisted as a single JSON object on disk.
///
/// The whole map is loaded on open and rewritten on every mutation through a
/// temporary file and a rename, so a crash never leaves a half-written file.
pub struct JsonFileStore {
    path: PathBuf,
    entries: Mutex<BTreeMap<String, String>>,
}

impl JsonFileStore {
    /// Opens the store at `path`, starting empty if the file does not exist yet.
    pub async fn open(path: impl AsRef<Path>) -> PortResult<Self> {
        let path = path.as_ref().to_path_buf();
        let entries = match tokio::fs::read(&path).await {
            Ok(bytes) if bytes.is_empty() => BTreeMap::new(),
            Ok(bytes) => serde_json::from_slice(&bytes).map_err(|e| {
                PortError::Storage(format!("corrupt store {}: {}", path.display(), e))
            })?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => return Err(storage_err(&path, e)),
        };
        info!(path = %path.display(), entries = entries.len(), "Opened key-value store");
        Ok(Self {
            path,
            entries: Mutex::new(entries),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn persist(&self, entries: &BTreeMap<String, String>) -> PortResult<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| storage_err(parent, e))?;
        }
        let json = serde_json::to_vec_pretty(entries)
            .map_err(|e| PortError::Storage(e.to_string()))?;
        let tmp = tmp_path(&self.path);
        tokio::fs::write(&tmp, json)
            .await
            .map_err(|e| storage_err(&tmp, e))?;
        tokio::fs::rename(&tmp, &self.path)
            .await
            .map_err(|e| storage_err(&self.path, e))?;
        debug!(path = %self.path.display(), "Key-value store flushed");
        Ok(())
    }
}

/// Sibling of `path` with `.tmp` appended, never equal to `path` itself.
fn tmp_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_os_string();
    name.push(".tmp");
    PathBuf::from(name)
}

fn storage_err(path: &Path, e: std::io::Error) -> PortError {
    PortError::Storage(format!("{}: {}", path.display(), e))
}

#[async_trait]
impl KeyValueStore for JsonFileStore {
    async fn get(&self, key: &str) -> PortResult<Option<String>> {
        Ok(self.entries.lock().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> PortResult<()> {
        let mut entries = self.entries.lock().await;
        let previous = entries.insert(key.to_string(), value.to_string());
        if let Err(e) = self.persist(&entries).await {
            // Keep memory consistent with what is on disk.
            match previous {
                Some(old) => entries.insert(key.to_string(), old),
                None => entries.remove(key),
            };
            return Err(e);
        }
        Ok(())
    }

    async fn remove(&self, key: &str) -> PortResult<()> {
        let mut entries = self.entries.lock().await;
        let Some(previous) = entries.remove(key) else {
            return Ok(());
        };
        if let Err(e) = self.persist(&entries).await {
            entries.insert(key.to_string(), previous);
            return Err(e);
        }
        Ok(())
    }

    async fn list_keys(&self) -> PortResult<Vec<String>> {
        Ok(self.entries.lock().await.keys().cloned().collect())
    }
}

//=========================================================================================
// MemoryStore
//=========================================================================================

/// An ephemeral store; everything is lost when it is dropped.
#[derive(Default)]
pub struct MemoryStore {
    entries: parking_lot::Mutex<BTreeMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn get(&self, key: &str) -> PortResult<Option<String>> {
        Ok(self.entries.lock().get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> PortResult<()> {
        self.entries.lock().insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn remove(&self, key: &str) -> PortResult<()> {
        self.entries.lock().remove(key);
        Ok(())
    }

    async fn list_keys(&self) -> PortResult<Vec<String>> {
        Ok(self.entries.lock().keys().cloned().collect())
    }
}
