use csv::{ReaderBuilder, StringRecord, Trim};

use super::coerce::{coerce_cell, normalize_key, Row};
use crate::error::IngestError;

/// Comma-delimited parser producing coerced rows.
pub struct CsvParser {
    delimiter: u8,
    trim: bool,
}

impl Default for CsvParser {
    fn default() -> Self {
        Self {
            delimiter: b',',
            trim: true,
        }
    }
}

/// Output of a parse: normalized headers in file order plus one row per
/// non-blank record.
#[derive(Debug)]
pub struct ParsedCsv {
    pub headers: Vec<String>,
    pub rows: Vec<ParsedRow>,
}

#[derive(Debug)]
pub struct ParsedRow {
    /// 1-based line number in the source file
    pub line: u64,
    pub values: Row,
}

impl CsvParser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse CSV bytes. The first record is the header row; lines that are
    /// empty or contain only empty cells are skipped. Short rows are padded
    /// with absent values, extra trailing cells are ignored.
    pub fn parse(&self, content: &[u8]) -> Result<ParsedCsv, IngestError> {
        let mut reader = ReaderBuilder::new()
            .delimiter(self.delimiter)
            .trim(if self.trim { Trim::All } else { Trim::None })
            .flexible(true)
            .from_reader(content);

        let headers: Vec<String> = reader
            .headers()
            .map_err(|e| parse_error(&e))?
            .iter()
            .map(normalize_key)
            .collect();

        if headers.iter().all(|h| h.is_empty()) {
            return Err(IngestError::MissingHeader);
        }

        let mut rows = Vec::new();
        for result in reader.records() {
            let record = result.map_err(|e| parse_error(&e))?;
            if is_blank(&record) {
                continue;
            }

            let line = record.position().map(|p| p.line()).unwrap_or(0);
            let values = headers
                .iter()
                .zip(record.iter())
                .filter(|(header, _)| !header.is_empty())
                .map(|(header, cell)| (header.clone(), coerce_cell(cell)))
                .collect();

            rows.push(ParsedRow { line, values });
        }

        Ok(ParsedCsv { headers, rows })
    }
}

fn is_blank(record: &StringRecord) -> bool {
    record.iter().all(|cell| cell.trim().is_empty())
}

fn parse_error(e: &csv::Error) -> IngestError {
    let line = e.position().map(|p| p.line()).unwrap_or(0);
    IngestError::Parse {
        line,
        message: e.to_string(),
    }
}
