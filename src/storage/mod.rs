pub mod cache;
pub mod index;
pub mod local;
pub mod memory;

pub use cache::CacheStore;
pub use index::{load_index, save_index, BatchIndex, BatchRecord, INDEX_KEY};
pub use local::LocalStore;
pub use memory::MemoryStore;

use crate::error::StoreError;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Where uploaded and processed documents live.
///
/// Keys are relative, `/`-separated paths such as
/// `original/1700000000000-suppliers.csv`.
pub trait BatchStore {
    /// Write `bytes` under `key`, replacing any previous content.
    fn store(&self, key: &str, bytes: &[u8]) -> Result<(), StoreError>;

    /// Read the document at `key`; `None` if it was never stored.
    fn retrieve(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError>;

    /// Address a user can open to reach the document.
    fn public_url(&self, key: &str) -> String;
}

/// Storage backend selection.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    /// Plain files under a directory
    #[default]
    Local,
    /// Content-addressed cache directory
    Cache,
    /// Process memory; nothing survives exit
    Memory,
}

/// Storage section of the config file.
///
/// Example YAML:
/// ```yaml
/// storage:
///   backend: local
///   path: ~/supplier-data
/// ```
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Default)]
#[serde(deny_unknown_fields)]
pub struct StorageConfig {
    #[serde(default)]
    pub backend: Option<StorageBackend>,

    /// Root directory for `local` and `cache` backends
    #[serde(default)]
    pub path: Option<String>,
}

impl StorageConfig {
    pub fn backend(&self) -> StorageBackend {
        self.backend.unwrap_or_default()
    }

    /// Resolved root directory, expanding a leading `~/`.
    pub fn root(&self) -> PathBuf {
        match &self.path {
            Some(path) => expand_home(path),
            None => default_root(self.backend()),
        }
    }
}

/// Open the configured backend.
pub fn open_store(config: &StorageConfig) -> Box<dyn BatchStore> {
    match config.backend() {
        StorageBackend::Local => Box::new(LocalStore::new(config.root())),
        StorageBackend::Cache => Box::new(CacheStore::new(config.root())),
        StorageBackend::Memory => Box::new(MemoryStore::new()),
    }
}

fn home_dir() -> PathBuf {
    dirs::home_dir().unwrap_or_else(|| PathBuf::from(std::env::var("HOME").unwrap_or_default()))
}

fn default_root(backend: StorageBackend) -> PathBuf {
    match backend {
        StorageBackend::Cache => dirs::cache_dir()
            .map(|p| p.join("supplier-rank/batches"))
            .unwrap_or_else(|| home_dir().join(".cache/supplier-rank/batches")),
        _ => dirs::data_dir()
            .map(|p| p.join("supplier-rank"))
            .unwrap_or_else(|| home_dir().join(".local/share/supplier-rank")),
    }
}

fn expand_home(path: &str) -> PathBuf {
    match path.strip_prefix("~/") {
        Some(rest) => home_dir().join(rest),
        None => PathBuf::from(path),
    }
}

/// Reject keys that could escape the store root.
pub(crate) fn check_key(key: &str) -> Result<(), StoreError> {
    let bad = key.is_empty()
        || key.starts_with('/')
        || key.contains('\\')
        || key.split('/').any(|part| part.is_empty() || part == "." || part == "..");
    if bad {
        Err(StoreError::InvalidKey(key.to_string()))
    } else {
        Ok(())
    }
}
