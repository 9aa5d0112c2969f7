use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, Utc};
use std::collections::HashSet;
use std::path::Path;

use super::parse::CsvParser;
use crate::error::{IngestError, StoreError};
use crate::scoring::{breakdown, rank_all, score_batch, ScoreBreakdown, Weights, DEFAULT_INTENSITY_CEILING};
use crate::storage::{load_index, save_index, BatchRecord, BatchStore};
use crate::supplier::{RowRejection, ScoredSupplier, Supplier};

/// Scoring parameters applied when a batch is processed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoringSettings {
    pub weights: Weights,
    pub intensity_ceiling: f64,
}

impl Default for ScoringSettings {
    fn default() -> Self {
        Self {
            weights: Weights::default(),
            intensity_ceiling: DEFAULT_INTENSITY_CEILING,
        }
    }
}

/// A CSV row that did not make it into the batch.
#[derive(Debug, Clone, PartialEq)]
pub struct RejectedRow {
    pub line: u64,
    pub reason: RowRejection,
}

/// Result of processing one uploaded file.
#[derive(Debug, Clone)]
pub struct ProcessedBatch {
    pub record: BatchRecord,
    pub processed_url: String,
    pub suppliers: Vec<ScoredSupplier>,
    pub rejected: Vec<RejectedRow>,
}

/// Upload, process and persist supplier batches against one store.
///
/// The batch index is read, modified and written back on every mutating
/// call without locking. Two processes ingesting into the same store at the
/// same time race; the last index write wins.
pub struct Pipeline {
    store: Box<dyn BatchStore>,
    settings: ScoringSettings,
}

impl Pipeline {
    pub fn new(store: Box<dyn BatchStore>, settings: ScoringSettings) -> Self {
        Self { store, settings }
    }

    pub fn store(&self) -> &dyn BatchStore {
        self.store.as_ref()
    }

    pub fn settings(&self) -> &ScoringSettings {
        &self.settings
    }

    /// Store a CSV file as a new, unprocessed batch.
    pub fn upload(&self, path: &Path) -> Result<BatchRecord> {
        if !path.is_file() {
            return Err(IngestError::NotFound(path.to_path_buf()).into());
        }

        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .ok_or_else(|| IngestError::NotFound(path.to_path_buf()))?;

        if !is_csv(&file_name) {
            return Err(IngestError::UnsupportedFormat(file_name).into());
        }

        let bytes = std::fs::read(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;

        self.upload_bytes(&file_name, &bytes, Utc::now())
    }

    /// Store raw CSV bytes under `original/` and register the batch.
    pub fn upload_bytes(&self, file_name: &str, bytes: &[u8], now: DateTime<Utc>) -> Result<BatchRecord> {
        if !is_csv(file_name) {
            return Err(IngestError::UnsupportedFormat(file_name.to_string()).into());
        }

        let mut index = load_index(self.store())?;
        let original_key = format!("original/{}-{}", index.next_id(now), sanitize_file_name(file_name));
        self.store
            .store(&original_key, bytes)
            .context("Failed to store uploaded file")?;

        let record = index.add_upload(file_name, original_key, now).clone();
        save_index(self.store(), &index)?;

        tracing::info!(
            batch = %record.id,
            file = file_name,
            bytes = bytes.len(),
            url = %self.store.public_url(&record.original_key),
            "uploaded batch"
        );
        Ok(record)
    }

    /// Parse, score and rank an uploaded batch and persist the result.
    ///
    /// Reprocessing a batch overwrites its previous processed document.
    pub fn process(&self, batch_id: &str) -> Result<ProcessedBatch> {
        let mut index = load_index(self.store())?;
        let record = index
            .get(batch_id)
            .cloned()
            .ok_or_else(|| IngestError::UnknownBatch(batch_id.to_string()))?;

        let bytes = self
            .store
            .retrieve(&record.original_key)?
            .ok_or_else(|| anyhow!("Original file for batch {} is missing from storage", record.id))?;

        let parsed = CsvParser::new().parse(&bytes)?;
        let (suppliers, rejected) = collect_suppliers(parsed.rows);

        for rejection in &rejected {
            tracing::warn!(
                batch = %record.id,
                line = rejection.line,
                reason = %rejection.reason,
                "skipping row"
            );
        }

        let scored = score_batch(
            &suppliers,
            &self.settings.weights,
            self.settings.intensity_ceiling,
        );

        let now = Utc::now();
        let processed_key = record
            .processed_key
            .clone()
            .unwrap_or_else(|| format!("processed/{}-processed.json", record.id));
        self.write_suppliers(&processed_key, &scored)?;

        let updated = {
            let entry = index
                .get_mut(batch_id)
                .ok_or_else(|| IngestError::UnknownBatch(batch_id.to_string()))?;
            entry.processed_key = Some(processed_key.clone());
            entry.processed_at = Some(now);
            entry.record_count = scored.len();
            entry.skipped = rejected.len();
            entry.weights = Some(self.settings.weights);
            entry.clone()
        };
        save_index(self.store(), &index)?;

        tracing::info!(
            batch = %updated.id,
            suppliers = scored.len(),
            skipped = rejected.len(),
            "processed batch"
        );

        Ok(ProcessedBatch {
            processed_url: self.store.public_url(&processed_key),
            record: updated,
            suppliers: scored,
            rejected,
        })
    }

    /// Upload then process a file in one step.
    pub fn ingest(&self, path: &Path) -> Result<ProcessedBatch> {
        let record = self.upload(path)?;
        self.process(&record.id)
    }

    /// The most recent processed batch and its suppliers in rank order.
    pub fn latest_batch(&self) -> Result<Option<(BatchRecord, Vec<ScoredSupplier>)>> {
        let index = load_index(self.store())?;
        let Some(record) = index.latest_processed().cloned() else {
            return Ok(None);
        };
        let Some(key) = record.processed_key.as_deref() else {
            return Ok(None);
        };

        let suppliers = match self.store.retrieve(key)? {
            Some(bytes) => serde_json::from_slice(&bytes).map_err(|source| StoreError::Corrupt {
                key: key.to_string(),
                source,
            })?,
            None => {
                tracing::warn!(batch = %record.id, key, "processed document missing");
                Vec::new()
            }
        };

        Ok(Some((record, suppliers)))
    }

    /// Suppliers of the latest processed batch; empty when nothing has been
    /// processed yet.
    pub fn load_latest(&self) -> Result<Vec<ScoredSupplier>> {
        Ok(self
            .latest_batch()?
            .map(|(_, suppliers)| suppliers)
            .unwrap_or_default())
    }

    /// Replace the stored suppliers of the latest processed batch, or of the
    /// most recent upload when nothing has been processed yet.
    pub fn save_latest(&self, suppliers: &[ScoredSupplier]) -> Result<BatchRecord> {
        let index = load_index(self.store())?;
        let id = index
            .latest_processed()
            .or_else(|| index.batches.last())
            .map(|b| b.id.clone())
            .ok_or(IngestError::NoBatches)?;
        self.save_batch(&id, suppliers)
    }

    /// Replace the stored suppliers of one batch, creating its processed
    /// document if it has none.
    fn save_batch(&self, batch_id: &str, suppliers: &[ScoredSupplier]) -> Result<BatchRecord> {
        let mut index = load_index(self.store())?;
        let now = Utc::now();

        let (processed_key, updated) = {
            let entry = index
                .get_mut(batch_id)
                .ok_or_else(|| IngestError::UnknownBatch(batch_id.to_string()))?;
            let key = entry
                .processed_key
                .clone()
                .unwrap_or_else(|| format!("processed/{}-suppliers.json", entry.id));
            entry.processed_key = Some(key.clone());
            entry.processed_at = Some(now);
            entry.record_count = suppliers.len();
            (key, entry.clone())
        };

        self.write_suppliers(&processed_key, suppliers)?;
        save_index(self.store(), &index)?;

        tracing::info!(batch = %updated.id, suppliers = suppliers.len(), "saved suppliers");
        Ok(updated)
    }

    /// The supplier at `rank` in the latest batch and its score breakdown,
    /// computed with the weights the batch was scored with.
    pub fn explain(&self, rank: usize) -> Result<(ScoredSupplier, ScoreBreakdown)> {
        let (record, suppliers) = self.latest_batch()?.ok_or(IngestError::NoBatches)?;
        if suppliers.is_empty() {
            return Err(IngestError::EmptyBatch(record.id).into());
        }

        let count = suppliers.len();
        let scored = suppliers
            .into_iter()
            .find(|s| s.rank == rank)
            .ok_or(IngestError::UnknownRank { rank, count })?;

        let weights = record.weights.unwrap_or(self.settings.weights);
        let explained = breakdown(&scored, &weights);
        Ok((scored, explained))
    }

    /// Reprocess the latest processed batch from its original upload with
    /// the current settings.
    pub fn rescore(&self) -> Result<ProcessedBatch> {
        let index = load_index(self.store())?;
        let id = index
            .latest_processed()
            .map(|b| b.id.clone())
            .ok_or(IngestError::NoBatches)?;
        self.process(&id)
    }

    /// Drop one supplier from the latest batch and re-rank the rest.
    pub fn remove_supplier(&self, supplier_id: &str) -> Result<Vec<ScoredSupplier>> {
        let (record, suppliers) = self.latest_batch()?.ok_or(IngestError::NoBatches)?;
        let before = suppliers.len();
        let remaining: Vec<ScoredSupplier> = suppliers
            .into_iter()
            .filter(|s| s.supplier.supplier_id != supplier_id)
            .collect();

        if remaining.len() == before {
            return Err(IngestError::UnknownSupplier(supplier_id.to_string()).into());
        }

        let reranked = rank_all(remaining);
        self.save_batch(&record.id, &reranked)?;
        Ok(reranked)
    }

    /// All batches, newest first.
    pub fn history(&self) -> Result<Vec<BatchRecord>> {
        let mut batches = load_index(self.store())?.batches;
        batches.reverse();
        Ok(batches)
    }

    /// Batches uploaded within `window` (a humantime duration such as "7d")
    /// before `now`, newest first.
    pub fn history_since(&self, window: &str, now: DateTime<Utc>) -> Result<Vec<BatchRecord>> {
        let parsed = humantime::parse_duration(window)
            .map_err(|e| anyhow!("Invalid --since '{}': {}", window, e))?;
        let cutoff = chrono::Duration::from_std(parsed)
            .ok()
            .and_then(|d| now.checked_sub_signed(d))
            .ok_or_else(|| anyhow!("--since window '{}' is too large", window))?;

        Ok(self
            .history()?
            .into_iter()
            .filter(|b| b.uploaded_at >= cutoff)
            .collect())
    }

    fn write_suppliers(&self, key: &str, suppliers: &[ScoredSupplier]) -> Result<()> {
        let json = serde_json::to_vec_pretty(suppliers).context("Failed to serialize suppliers")?;
        self.store
            .store(key, &json)
            .with_context(|| format!("Failed to store processed batch at {}", key))
    }
}

/// Turn parsed rows into suppliers, rejecting rows without required fields
/// and repeated supplier ids (the first occurrence wins).
fn collect_suppliers(rows: Vec<super::parse::ParsedRow>) -> (Vec<Supplier>, Vec<RejectedRow>) {
    let mut seen = HashSet::new();
    let mut suppliers = Vec::new();
    let mut rejected = Vec::new();

    for row in rows {
        match Supplier::from_row(&row.values) {
            Ok(supplier) => {
                if seen.insert(supplier.supplier_id.clone()) {
                    suppliers.push(supplier);
                } else {
                    rejected.push(RejectedRow {
                        line: row.line,
                        reason: RowRejection::DuplicateSupplierId(supplier.supplier_id),
                    });
                }
            }
            Err(reason) => rejected.push(RejectedRow {
                line: row.line,
                reason,
            }),
        }
    }

    (suppliers, rejected)
}

fn is_csv(file_name: &str) -> bool {
    Path::new(file_name)
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"))
}

fn sanitize_file_name(file_name: &str) -> String {
    file_name
        .chars()
        .map(|c| if c == '/' || c == '\\' || c.is_control() { '_' } else { c })
        .collect()
}
