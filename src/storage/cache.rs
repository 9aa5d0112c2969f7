use super::{check_key, BatchStore};
use crate::error::StoreError;
use std::path::PathBuf;

/// Documents kept in a cacache content-addressed directory.
///
/// Keys map to content hashes in the cache index; re-storing a key points it
/// at the new content.
pub struct CacheStore {
    cache_path: PathBuf,
}

impl CacheStore {
    pub fn new(cache_path: PathBuf) -> Self {
        Self { cache_path }
    }

    fn cache_err(key: &str, e: cacache::Error) -> StoreError {
        StoreError::Cache {
            key: key.to_string(),
            message: e.to_string(),
        }
    }
}

impl BatchStore for CacheStore {
    fn store(&self, key: &str, bytes: &[u8]) -> Result<(), StoreError> {
        check_key(key)?;
        let integrity = cacache::write_sync(&self.cache_path, key, bytes)
            .map_err(|e| Self::cache_err(key, e))?;
        tracing::debug!(key, %integrity, "stored document in cache");
        Ok(())
    }

    fn retrieve(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        check_key(key)?;
        let metadata = cacache::metadata_sync(&self.cache_path, key)
            .map_err(|e| Self::cache_err(key, e))?;
        if metadata.is_none() {
            return Ok(None);
        }
        cacache::read_sync(&self.cache_path, key)
            .map(Some)
            .map_err(|e| Self::cache_err(key, e))
    }

    fn public_url(&self, key: &str) -> String {
        format!("cacache://{}#{}", self.cache_path.display(), key)
    }
}
