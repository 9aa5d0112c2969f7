use super::{check_key, BatchStore};
use crate::error::StoreError;
use atomic_write_file::AtomicWriteFile;
use std::fs;
use std::io::Write;
use std::path::PathBuf;

/// Documents stored as plain files below a root directory.
///
/// Each write goes through atomic-write-file, so a reader never sees a
/// half-written document.
pub struct LocalStore {
    root: PathBuf,
}

impl LocalStore {
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    fn path_for(&self, key: &str) -> Result<PathBuf, StoreError> {
        check_key(key)?;
        Ok(key.split('/').fold(self.root.clone(), |path, part| path.join(part)))
    }
}

impl BatchStore for LocalStore {
    fn store(&self, key: &str, bytes: &[u8]) -> Result<(), StoreError> {
        let path = self.path_for(key)?;
        let io_err = |source| StoreError::Io {
            key: key.to_string(),
            source,
        };

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(io_err)?;
        }

        let mut file = AtomicWriteFile::open(&path).map_err(io_err)?;
        file.write_all(bytes).map_err(io_err)?;
        file.commit().map_err(io_err)?;

        tracing::debug!(key, bytes = bytes.len(), "stored document");
        Ok(())
    }

    fn retrieve(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        let path = self.path_for(key)?;
        match fs::read(&path) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(source) => Err(StoreError::Io {
                key: key.to_string(),
                source,
            }),
        }
    }

    fn public_url(&self, key: &str) -> String {
        let path = key.split('/').fold(self.root.clone(), |path, part| path.join(part));
        format!("file://{}", path.display())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_store_and_retrieve() {
        let dir = TempDir::new().unwrap();
        let store = LocalStore::new(dir.path().to_path_buf());

        store.store("original/1-suppliers.csv", b"supplier_id,name\n").unwrap();
        let bytes = store.retrieve("original/1-suppliers.csv").unwrap();

        assert_eq!(bytes, Some(b"supplier_id,name\n".to_vec()));
        assert!(dir.path().join("original").join("1-suppliers.csv").exists());
    }

    #[test]
    fn test_retrieve_missing_returns_none() {
        let dir = TempDir::new().unwrap();
        let store = LocalStore::new(dir.path().to_path_buf());
        assert_eq!(store.retrieve("processed/nothing.json").unwrap(), None);
    }

    #[test]
    fn test_store_overwrites() {
        let dir = TempDir::new().unwrap();
        let store = LocalStore::new(dir.path().to_path_buf());
        store.store("index.json", b"first").unwrap();
        store.store("index.json", b"second").unwrap();
        assert_eq!(store.retrieve("index.json").unwrap(), Some(b"second".to_vec()));
    }

    #[test]
    fn test_rejects_escaping_key() {
        let dir = TempDir::new().unwrap();
        let store = LocalStore::new(dir.path().to_path_buf());
        let result = store.store("../escape.txt", b"x");
        assert!(matches!(result, Err(StoreError::InvalidKey(_))));
    }

    #[test]
    fn test_public_url() {
        let store = LocalStore::new(PathBuf::from("/srv/data"));
        let url = store.public_url("processed/2-processed.json");
        assert!(url.starts_with("file:///srv/data"));
        assert!(url.ends_with("2-processed.json"));
    }
}
