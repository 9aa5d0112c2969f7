use super::BatchStore;
use crate::error::StoreError;
use crate::scoring::Weights;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Store key of the batch index document.
pub const INDEX_KEY: &str = "index.json";

const INDEX_VERSION: u32 = 1;

/// Every uploaded batch, oldest first.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BatchIndex {
    pub version: u32,
    #[serde(default)]
    pub batches: Vec<BatchRecord>,
}

/// One upload and, once processed, where its scored output lives.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BatchRecord {
    pub id: String,
    /// File name as uploaded
    pub source_name: String,
    pub original_key: String,
    pub uploaded_at: DateTime<Utc>,
    #[serde(default)]
    pub processed_key: Option<String>,
    #[serde(default)]
    pub processed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub record_count: usize,
    /// Rows rejected during processing
    #[serde(default)]
    pub skipped: usize,
    /// Weights the stored scores were computed with
    #[serde(default)]
    pub weights: Option<Weights>,
}

impl Default for BatchIndex {
    fn default() -> Self {
        Self::new()
    }
}

impl BatchIndex {
    pub fn new() -> Self {
        Self {
            version: INDEX_VERSION,
            batches: Vec::new(),
        }
    }

    /// Id the next upload at `uploaded_at` will receive. Unique within the
    /// index even when several uploads share a millisecond.
    pub fn next_id(&self, uploaded_at: DateTime<Utc>) -> String {
        format!("{}-{}", uploaded_at.timestamp_millis(), self.batches.len() + 1)
    }

    /// Append a new upload and return a reference to it.
    pub fn add_upload(
        &mut self,
        source_name: &str,
        original_key: String,
        uploaded_at: DateTime<Utc>,
    ) -> &BatchRecord {
        let id = self.next_id(uploaded_at);
        self.batches.push(BatchRecord {
            id,
            source_name: source_name.to_string(),
            original_key,
            uploaded_at,
            processed_key: None,
            processed_at: None,
            record_count: 0,
            skipped: 0,
            weights: None,
        });
        &self.batches[self.batches.len() - 1]
    }

    pub fn get(&self, id: &str) -> Option<&BatchRecord> {
        self.batches.iter().find(|b| b.id == id)
    }

    pub fn get_mut(&mut self, id: &str) -> Option<&mut BatchRecord> {
        self.batches.iter_mut().find(|b| b.id == id)
    }

    /// Most recently uploaded batch that has been processed.
    pub fn latest_processed(&self) -> Option<&BatchRecord> {
        self.batches.iter().rev().find(|b| b.processed_key.is_some())
    }
}

/// Load the batch index, or an empty one if none has been written yet.
pub fn load_index(store: &dyn BatchStore) -> Result<BatchIndex, StoreError> {
    let Some(bytes) = store.retrieve(INDEX_KEY)? else {
        return Ok(BatchIndex::new());
    };

    let index: BatchIndex = serde_json::from_slice(&bytes).map_err(|source| StoreError::Corrupt {
        key: INDEX_KEY.to_string(),
        source,
    })?;

    if index.version != INDEX_VERSION {
        return Err(StoreError::UnsupportedVersion(index.version));
    }

    Ok(index)
}

/// Write the batch index.
///
/// This is a plain read-modify-write with no locking: two processes updating
/// the index concurrently race and the last writer wins.
pub fn save_index(store: &dyn BatchStore, index: &BatchIndex) -> Result<(), StoreError> {
    let bytes = serde_json::to_vec_pretty(index).map_err(|source| StoreError::Corrupt {
        key: INDEX_KEY.to_string(),
        source,
    })?;
    store.store(INDEX_KEY, &bytes)
}
