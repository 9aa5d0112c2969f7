pub mod coerce;
pub mod parse;
pub mod pipeline;

pub use coerce::{coerce_cell, normalize_key, CellValue, Row};
pub use pipeline::{Pipeline, ProcessedBatch, RejectedRow, ScoringSettings};

use anyhow::{Context, Result};
use std::path::PathBuf;

use crate::error::IngestError;

/// Expand ingest arguments into file paths, in argument order.
///
/// Arguments without glob metacharacters are passed through untouched so a
/// missing file is reported by the upload step. A pattern that matches
/// nothing is an error.
pub fn resolve_inputs(patterns: &[String]) -> Result<Vec<PathBuf>> {
    let mut paths = Vec::new();

    for pattern in patterns {
        if !pattern.contains(['*', '?', '[']) {
            paths.push(PathBuf::from(pattern));
            continue;
        }

        let mut matched: Vec<PathBuf> = glob::glob(pattern)
            .with_context(|| format!("Invalid file pattern '{}'", pattern))?
            .filter_map(|entry| entry.ok())
            .filter(|path| path.is_file())
            .collect();

        if matched.is_empty() {
            return Err(IngestError::NoMatches(pattern.clone()).into());
        }
        matched.sort();
        paths.extend(matched);
    }

    Ok(paths)
}
