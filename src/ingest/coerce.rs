use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A CSV cell after type inference.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CellValue {
    Bool(bool),
    Number(f64),
    Text(String),
}

/// One parsed CSV row keyed by normalized column name.
pub type Row = BTreeMap<String, CellValue>;

/// Infer a typed value from a raw cell.
///
/// `true`/`yes` and `false`/`no` (any case) become booleans, anything that
/// parses as a finite float becomes a number, and everything else is kept as
/// trimmed text.
pub fn coerce_cell(raw: &str) -> CellValue {
    let trimmed = raw.trim();
    let lower = trimmed.to_ascii_lowercase();

    match lower.as_str() {
        "true" | "yes" => return CellValue::Bool(true),
        "false" | "no" => return CellValue::Bool(false),
        _ => {}
    }

    match trimmed.parse::<f64>() {
        Ok(n) if n.is_finite() => CellValue::Number(n),
        _ => CellValue::Text(trimmed.to_string()),
    }
}

/// Normalize a header: lower-case, every whitespace run replaced by `_`.
pub fn normalize_key(header: &str) -> String {
    header
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("_")
        .to_lowercase()
}

impl CellValue {
    pub fn as_number(&self) -> Option<f64> {
        match self {
            CellValue::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// Set for `true` and any non-zero number.
    pub fn as_flag(&self) -> bool {
        match self {
            CellValue::Bool(b) => *b,
            CellValue::Number(n) => *n != 0.0,
            CellValue::Text(_) => false,
        }
    }

    /// Text usable as a name or identifier. Numbers are rendered without a
    /// trailing `.0` when integral; blank text and booleans yield `None`.
    pub fn as_identifier(&self) -> Option<String> {
        match self {
            CellValue::Text(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
            CellValue::Text(_) => None,
            CellValue::Number(n) => Some(format_number(*n)),
            CellValue::Bool(_) => None,
        }
    }
}

fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        n.to_string()
    }
}
