//! Error kinds the CLI maps to distinct exit codes.
//!
//! Library functions return `anyhow::Result`; these types travel inside the
//! `anyhow::Error` and are recovered with `downcast_ref` at the edge.

use std::path::PathBuf;
use thiserror::Error;

/// Failures while accepting or processing an uploaded file.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum IngestError {
    #[error("File not found: {0}")]
    NotFound(PathBuf),

    #[error("Unsupported file format: {0} (only .csv is accepted)")]
    UnsupportedFormat(String),

    #[error("Failed to parse CSV at line {line}: {message}")]
    Parse { line: u64, message: String },

    #[error("CSV has no header row")]
    MissingHeader,

    #[error("No batch with id {0}")]
    UnknownBatch(String),

    #[error("No supplier with id {0} in the latest batch")]
    UnknownSupplier(String),

    #[error("No supplier batches yet. Run `supplier-rank ingest <file.csv>` first")]
    NoBatches,

    #[error("Batch {0} has no suppliers")]
    EmptyBatch(String),

    #[error("Invalid rank {rank}. Must be between 1 and {count}.")]
    UnknownRank { rank: usize, count: usize },

    #[error("No matching files for pattern '{0}'")]
    NoMatches(String),
}

/// Failures of a storage backend.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum StoreError {
    #[error("IO error for '{key}': {source}")]
    Io {
        key: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Cache error for '{key}': {message}")]
    Cache { key: String, message: String },

    #[error("Corrupt document '{key}': {source}")]
    Corrupt {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Invalid storage key '{0}'")]
    InvalidKey(String),

    #[error("Unsupported batch index version: {0}")]
    UnsupportedVersion(u32),
}
