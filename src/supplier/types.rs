use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::ingest::coerce::{CellValue, Row};

/// A supplier as uploaded, after cell coercion.
///
/// Only `supplier_id` and `name` are required. Columns the scoring engine
/// does not know about are kept in `extra` so persisted batches preserve the
/// upload verbatim.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Supplier {
    pub supplier_id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sector: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub revenue_usd_m: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scope1_tco2e: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scope2_tco2e: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scope3_tco2e: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub esg_total: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub esg_e: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub esg_s: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub esg_g: Option<f64>,
    #[serde(default)]
    pub is_iso14001: bool,
    #[serde(default)]
    pub is_bcorp: bool,
    #[serde(default)]
    pub is_fairtrade: bool,
    #[serde(default)]
    pub has_decarb_target: bool,
    #[serde(flatten)]
    pub extra: BTreeMap<String, CellValue>,
}

/// Columns consumed by `Supplier::from_row`; everything else lands in `extra`.
/// Scored output columns are listed too so re-ingesting an export of a
/// processed batch does not duplicate them.
const KNOWN_COLUMNS: &[&str] = &[
    "supplier_id",
    "name",
    "country",
    "sector",
    "revenue_usd_m",
    "scope1_tco2e",
    "scope2_tco2e",
    "scope3_tco2e",
    "esg_total",
    "esg_e",
    "esg_s",
    "esg_g",
    "is_iso14001",
    "is_bcorp",
    "is_fairtrade",
    "has_decarb_target",
    "s1_intensity",
    "s2_intensity",
    "s3_intensity",
    "esg_total_norm",
    "s1_norm_cost",
    "s2_norm_cost",
    "s3_norm_cost",
    "certs_norm",
    "policy_norm",
    "score",
    "rank",
    "incomplete",
];

/// Why a row could not become a `Supplier`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RowRejection {
    MissingSupplierId,
    MissingName,
    DuplicateSupplierId(String),
}

impl std::fmt::Display for RowRejection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RowRejection::MissingSupplierId => write!(f, "missing supplier_id"),
            RowRejection::MissingName => write!(f, "missing name"),
            RowRejection::DuplicateSupplierId(id) => write!(f, "duplicate supplier_id '{}'", id),
        }
    }
}

impl Supplier {
    /// Minimal supplier with only the required fields set.
    pub fn new(supplier_id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            supplier_id: supplier_id.into(),
            name: name.into(),
            country: None,
            sector: None,
            revenue_usd_m: None,
            scope1_tco2e: None,
            scope2_tco2e: None,
            scope3_tco2e: None,
            esg_total: None,
            esg_e: None,
            esg_s: None,
            esg_g: None,
            is_iso14001: false,
            is_bcorp: false,
            is_fairtrade: false,
            has_decarb_target: false,
            extra: BTreeMap::new(),
        }
    }

    /// Build a supplier from a coerced CSV row.
    ///
    /// Numeric fields accept only numeric cells; a blank or textual cell is
    /// treated as absent. Flags accept booleans, or numbers where non-zero
    /// means set.
    pub fn from_row(row: &Row) -> Result<Self, RowRejection> {
        let supplier_id = row
            .get("supplier_id")
            .and_then(CellValue::as_identifier)
            .ok_or(RowRejection::MissingSupplierId)?;
        let name = row
            .get("name")
            .and_then(CellValue::as_identifier)
            .ok_or(RowRejection::MissingName)?;

        let number = |key: &str| row.get(key).and_then(CellValue::as_number);
        let text = |key: &str| row.get(key).and_then(CellValue::as_identifier);
        let flag = |key: &str| row.get(key).map(CellValue::as_flag).unwrap_or(false);

        let extra = row
            .iter()
            .filter(|(key, _)| !KNOWN_COLUMNS.contains(&key.as_str()))
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect();

        Ok(Self {
            supplier_id,
            name,
            country: text("country"),
            sector: text("sector"),
            revenue_usd_m: number("revenue_usd_m"),
            scope1_tco2e: number("scope1_tco2e"),
            scope2_tco2e: number("scope2_tco2e"),
            scope3_tco2e: number("scope3_tco2e"),
            esg_total: number("esg_total"),
            esg_e: number("esg_e"),
            esg_s: number("esg_s"),
            esg_g: number("esg_g"),
            is_iso14001: flag("is_iso14001"),
            is_bcorp: flag("is_bcorp"),
            is_fairtrade: flag("is_fairtrade"),
            has_decarb_target: flag("has_decarb_target"),
            extra,
        })
    }

    /// True when the supplier holds at least one of the scored certifications.
    pub fn is_certified(&self) -> bool {
        self.is_iso14001 || self.is_bcorp || self.is_fairtrade
    }
}

/// A supplier with every intermediate scoring value attached.
///
/// Intensities are `None` when they could not be computed (zero or missing
/// revenue, missing emissions). `rank` is 0 until the batch has been ranked.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredSupplier {
    #[serde(flatten)]
    pub supplier: Supplier,
    pub s1_intensity: Option<f64>,
    pub s2_intensity: Option<f64>,
    pub s3_intensity: Option<f64>,
    pub esg_total_norm: f64,
    pub s1_norm_cost: f64,
    pub s2_norm_cost: f64,
    pub s3_norm_cost: f64,
    pub certs_norm: f64,
    pub policy_norm: f64,
    pub score: f64,
    #[serde(default)]
    pub rank: usize,
    /// Set when a fallback was used for missing or degenerate inputs
    #[serde(default)]
    pub incomplete: bool,
}
