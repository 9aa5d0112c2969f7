use anyhow::{bail, Context, Result};

use crate::supplier::ScoredSupplier;

/// Comparison applied to a supplier's score.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ScoreRange {
    LessThan(f64),
    LessEqual(f64),
    GreaterThan(f64),
    GreaterEqual(f64),
    Equal(f64),
    Between(f64, f64), // Inclusive range: N-M
}

impl ScoreRange {
    pub fn parse(s: &str) -> Result<Self> {
        let s = s.trim();
        let number = |v: &str| -> Result<f64> {
            v.trim()
                .parse::<f64>()
                .with_context(|| format!("Invalid score '{}'", v.trim()))
        };

        if let Some(val) = s.strip_prefix(">=") {
            Ok(ScoreRange::GreaterEqual(number(val)?))
        } else if let Some(val) = s.strip_prefix("<=") {
            Ok(ScoreRange::LessEqual(number(val)?))
        } else if let Some(val) = s.strip_prefix('>') {
            Ok(ScoreRange::GreaterThan(number(val)?))
        } else if let Some(val) = s.strip_prefix('<') {
            Ok(ScoreRange::LessThan(number(val)?))
        } else if let Some((low, high)) = s.split_once('-').filter(|_| !s.starts_with('-')) {
            let low = number(low)?;
            let high = number(high)?;
            if low > high {
                bail!("Invalid score range '{}': lower bound exceeds upper bound", s);
            }
            Ok(ScoreRange::Between(low, high))
        } else {
            Ok(ScoreRange::Equal(number(s)?))
        }
    }

    pub fn matches(&self, value: f64) -> bool {
        match *self {
            ScoreRange::LessThan(n) => value < n,
            ScoreRange::LessEqual(n) => value <= n,
            ScoreRange::GreaterThan(n) => value > n,
            ScoreRange::GreaterEqual(n) => value >= n,
            ScoreRange::Equal(n) => value == n,
            ScoreRange::Between(low, high) => value >= low && value <= high,
        }
    }
}

/// Certifications a filter can ask for.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CertificationFilter {
    pub iso14001: bool,
    pub bcorp: bool,
    pub fairtrade: bool,
}

impl CertificationFilter {
    fn is_empty(&self) -> bool {
        !(self.iso14001 || self.bcorp || self.fairtrade)
    }

    /// A supplier matches when it holds ANY of the selected certifications.
    fn matches(&self, supplier: &ScoredSupplier) -> bool {
        let s = &supplier.supplier;
        (self.iso14001 && s.is_iso14001)
            || (self.bcorp && s.is_bcorp)
            || (self.fairtrade && s.is_fairtrade)
    }
}

/// Narrow a ranked list for display or export. Empty fields match everything.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RankingFilter {
    /// Case-insensitive substring of name, sector or country
    pub search: Option<String>,
    pub sector: Option<String>,
    pub country: Option<String>,
    pub score: Option<ScoreRange>,
    pub certifications: CertificationFilter,
}

impl RankingFilter {
    pub fn is_empty(&self) -> bool {
        self.search.is_none()
            && self.sector.is_none()
            && self.country.is_none()
            && self.score.is_none()
            && self.certifications.is_empty()
    }

    pub fn matches(&self, supplier: &ScoredSupplier) -> bool {
        let s = &supplier.supplier;

        if let Some(term) = self.search.as_deref() {
            let term = term.to_lowercase();
            let hit = std::iter::once(Some(s.name.as_str()))
                .chain([s.sector.as_deref(), s.country.as_deref()])
                .flatten()
                .any(|field| field.to_lowercase().contains(&term));
            if !hit {
                return false;
            }
        }

        if let Some(sector) = self.sector.as_deref() {
            if s.sector.as_deref() != Some(sector) {
                return false;
            }
        }

        if let Some(country) = self.country.as_deref() {
            if s.country.as_deref() != Some(country) {
                return false;
            }
        }

        if let Some(range) = &self.score {
            if !range.matches(supplier.score) {
                return false;
            }
        }

        self.certifications.is_empty() || self.certifications.matches(supplier)
    }

    /// Keep matching suppliers; ranks are left as assigned to the full batch.
    pub fn apply<'a>(&self, suppliers: &'a [ScoredSupplier]) -> Vec<&'a ScoredSupplier> {
        suppliers.iter().filter(|s| self.matches(s)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scoring::{score, Weights};
    use crate::supplier::Supplier;

    fn supplier(id: &str, name: &str, sector: &str, country: &str, esg: f64) -> ScoredSupplier {
        let mut s = Supplier::new(id, name);
        s.sector = Some(sector.to_string());
        s.country = Some(country.to_string());
        s.revenue_usd_m = Some(100.0);
        s.scope1_tco2e = Some(100.0);
        s.scope2_tco2e = Some(100.0);
        s.esg_total = Some(esg);
        score(&s, &Weights::default())
    }

    fn sample() -> Vec<ScoredSupplier> {
        let mut a = supplier("S-1", "Acme Metals", "Manufacturing", "Germany", 90.0);
        a.supplier.is_iso14001 = true;
        let mut b = supplier("S-2", "Blue Freight", "Logistics", "France", 50.0);
        b.supplier.is_fairtrade = true;
        let c = supplier("S-3", "Cedar Foods", "Agriculture", "Germany", 10.0);
        vec![a, b, c]
    }

    #[test]
    fn test_score_range_parse() {
        assert_eq!(ScoreRange::parse("<50").unwrap(), ScoreRange::LessThan(50.0));
        assert_eq!(ScoreRange::parse("<= 50.5").unwrap(), ScoreRange::LessEqual(50.5));
        assert_eq!(ScoreRange::parse(">80").unwrap(), ScoreRange::GreaterThan(80.0));
        assert_eq!(ScoreRange::parse(">=80").unwrap(), ScoreRange::GreaterEqual(80.0));
        assert_eq!(ScoreRange::parse("60-80").unwrap(), ScoreRange::Between(60.0, 80.0));
        assert_eq!(ScoreRange::parse("42").unwrap(), ScoreRange::Equal(42.0));
    }

    #[test]
    fn test_score_range_parse_errors() {
        assert!(ScoreRange::parse("abc").is_err());
        assert!(ScoreRange::parse(">").is_err());
        assert!(ScoreRange::parse("80-60").is_err());
    }

    #[test]
    fn test_score_range_matches() {
        let between = ScoreRange::Between(60.0, 80.0);
        assert!(between.matches(60.0));
        assert!(between.matches(80.0));
        assert!(!between.matches(80.1));
        assert!(ScoreRange::LessThan(50.0).matches(49.9));
        assert!(!ScoreRange::LessThan(50.0).matches(50.0));
    }

    #[test]
    fn test_empty_filter_matches_all() {
        let suppliers = sample();
        let filter = RankingFilter::default();
        assert!(filter.is_empty());
        assert_eq!(filter.apply(&suppliers).len(), 3);
    }

    #[test]
    fn test_search_is_case_insensitive_across_fields() {
        let suppliers = sample();
        let by_name = RankingFilter {
            search: Some("acme".to_string()),
            ..Default::default()
        };
        assert_eq!(by_name.apply(&suppliers).len(), 1);

        let by_country = RankingFilter {
            search: Some("GERMANY".to_string()),
            ..Default::default()
        };
        assert_eq!(by_country.apply(&suppliers).len(), 2);

        let by_sector = RankingFilter {
            search: Some("logis".to_string()),
            ..Default::default()
        };
        assert_eq!(by_sector.apply(&suppliers)[0].supplier.supplier_id, "S-2");
    }

    #[test]
    fn test_sector_and_country_exact() {
        let suppliers = sample();
        let filter = RankingFilter {
            country: Some("Germany".to_string()),
            sector: Some("Agriculture".to_string()),
            ..Default::default()
        };
        let matched = filter.apply(&suppliers);
        assert_eq!(matched.len(), 1);
        assert_eq!(matched[0].supplier.supplier_id, "S-3");

        let partial = RankingFilter {
            country: Some("Germ".to_string()),
            ..Default::default()
        };
        assert!(partial.apply(&suppliers).is_empty());
    }

    #[test]
    fn test_certifications_match_any() {
        let suppliers = sample();
        let filter = RankingFilter {
            certifications: CertificationFilter {
                iso14001: true,
                fairtrade: true,
                ..Default::default()
            },
            ..Default::default()
        };
        let ids: Vec<&str> = filter
            .apply(&suppliers)
            .iter()
            .map(|s| s.supplier.supplier_id.as_str())
            .collect();
        assert_eq!(ids, vec!["S-1", "S-2"]);
    }

    #[test]
    fn test_score_filter() {
        let suppliers = sample();
        let threshold = suppliers[1].score;
        let filter = RankingFilter {
            score: Some(ScoreRange::GreaterEqual(threshold)),
            ..Default::default()
        };
        assert_eq!(filter.apply(&suppliers).len(), 2);
    }
}
