use std::collections::HashMap;

use crate::scoring::round_one_decimal;
use crate::supplier::ScoredSupplier;

/// Number of suppliers shown as top performers by default.
pub const DEFAULT_TOP_PERFORMERS: usize = 5;

/// Headline metrics for a batch.
#[derive(Debug, Clone, PartialEq)]
pub struct DashboardStats {
    pub total: usize,
    /// Mean score, one decimal
    pub average_score: f64,
    pub top_score: f64,
    /// Suppliers holding ISO 14001, B-Corp or Fair Trade
    pub certified: usize,
    /// Mean of scope 1 + scope 2 intensity, two decimals
    pub average_intensity: f64,
    pub with_targets: usize,
}

/// One score band of the distribution.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoreBucket {
    pub label: &'static str,
    pub count: usize,
}

/// Upper bounds (inclusive) of the distribution bands. The first band also
/// takes everything at or below 0.
const BUCKETS: [(&str, f64); 5] = [
    ("0-20", 20.0),
    ("21-40", 40.0),
    ("41-60", 60.0),
    ("61-80", 80.0),
    ("81-100", f64::INFINITY),
];

pub fn dashboard_stats(suppliers: &[ScoredSupplier]) -> DashboardStats {
    let total = suppliers.len();
    if total == 0 {
        return DashboardStats {
            total: 0,
            average_score: 0.0,
            top_score: 0.0,
            certified: 0,
            average_intensity: 0.0,
            with_targets: 0,
        };
    }

    let n = total as f64;
    let score_sum: f64 = suppliers.iter().map(|s| s.score).sum();
    let top_score = suppliers
        .iter()
        .map(|s| s.score)
        .fold(f64::NEG_INFINITY, f64::max);
    let intensity_sum: f64 = suppliers
        .iter()
        .map(|s| s.s1_intensity.unwrap_or(0.0) + s.s2_intensity.unwrap_or(0.0))
        .sum();

    DashboardStats {
        total,
        average_score: round_one_decimal(score_sum / n),
        top_score,
        certified: suppliers.iter().filter(|s| s.supplier.is_certified()).count(),
        average_intensity: (intensity_sum / n * 100.0).round() / 100.0,
        with_targets: suppliers
            .iter()
            .filter(|s| s.supplier.has_decarb_target)
            .count(),
    }
}

/// Count suppliers per score band. Bands are contiguous so fractional scores
/// such as 20.5 land in `21-40`.
pub fn score_distribution(suppliers: &[ScoredSupplier]) -> Vec<ScoreBucket> {
    let mut counts = [0usize; BUCKETS.len()];
    for supplier in suppliers {
        let slot = BUCKETS
            .iter()
            .position(|(_, upper)| supplier.score <= *upper)
            .unwrap_or(BUCKETS.len() - 1);
        counts[slot] += 1;
    }

    BUCKETS
        .iter()
        .zip(counts)
        .map(|((label, _), count)| ScoreBucket { label, count })
        .collect()
}

/// Supplier count per sector, largest first, ties by name.
pub fn sector_breakdown(suppliers: &[ScoredSupplier]) -> Vec<(String, usize)> {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for supplier in suppliers {
        let sector = supplier.supplier.sector.as_deref().unwrap_or("Unknown");
        *counts.entry(sector).or_default() += 1;
    }

    let mut breakdown: Vec<(String, usize)> = counts
        .into_iter()
        .map(|(sector, count)| (sector.to_string(), count))
        .collect();
    breakdown.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    breakdown
}

/// The best `n` suppliers by rank.
pub fn top_performers(suppliers: &[ScoredSupplier], n: usize) -> Vec<&ScoredSupplier> {
    let mut ranked: Vec<&ScoredSupplier> = suppliers.iter().collect();
    ranked.sort_by_key(|s| s.rank);
    ranked.truncate(n);
    ranked
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scoring::{rank_all, score, Weights};
    use crate::supplier::Supplier;

    fn scored(id: &str, score_value: f64, sector: Option<&str>) -> ScoredSupplier {
        let mut s = Supplier::new(id, format!("Supplier {}", id));
        s.sector = sector.map(str::to_string);
        let mut scored = score(&s, &Weights::default());
        scored.score = score_value;
        scored
    }

    #[test]
    fn test_stats_empty() {
        let stats = dashboard_stats(&[]);
        assert_eq!(stats.total, 0);
        assert_eq!(stats.average_score, 0.0);
        assert_eq!(stats.top_score, 0.0);
    }

    #[test]
    fn test_stats_values() {
        let mut a = scored("A", 80.0, None);
        a.supplier.is_bcorp = true;
        a.supplier.has_decarb_target = true;
        a.s1_intensity = Some(1.5);
        a.s2_intensity = Some(0.5);
        let mut b = scored("B", 65.0, None);
        b.s1_intensity = Some(1.0);
        b.s2_intensity = None;
        let c = scored("C", 50.5, None);

        let stats = dashboard_stats(&[a, b, c]);
        assert_eq!(stats.total, 3);
        assert_eq!(stats.average_score, 65.2);
        assert_eq!(stats.top_score, 80.0);
        assert_eq!(stats.certified, 1);
        assert_eq!(stats.with_targets, 1);
        assert_eq!(stats.average_intensity, 1.0);
    }

    #[test]
    fn test_distribution_is_contiguous() {
        let suppliers: Vec<ScoredSupplier> = [0.0, 20.0, 20.5, 40.0, 60.05, 80.0, 80.1, 100.0]
            .iter()
            .enumerate()
            .map(|(i, v)| scored(&i.to_string(), *v, None))
            .collect();

        let counts: Vec<(&str, usize)> = score_distribution(&suppliers)
            .into_iter()
            .map(|b| (b.label, b.count))
            .collect();
        assert_eq!(
            counts,
            vec![("0-20", 2), ("21-40", 2), ("41-60", 0), ("61-80", 2), ("81-100", 2)]
        );
        assert_eq!(counts.iter().map(|(_, c)| c).sum::<usize>(), suppliers.len());
    }

    #[test]
    fn test_sector_breakdown_sorted() {
        let suppliers = vec![
            scored("1", 10.0, Some("Retail")),
            scored("2", 10.0, Some("Energy")),
            scored("3", 10.0, None),
            scored("4", 10.0, Some("Retail")),
            scored("5", 10.0, Some("Agriculture")),
        ];
        let breakdown = sector_breakdown(&suppliers);
        assert_eq!(
            breakdown,
            vec![
                ("Retail".to_string(), 2),
                ("Agriculture".to_string(), 1),
                ("Energy".to_string(), 1),
                ("Unknown".to_string(), 1),
            ]
        );
    }

    #[test]
    fn test_top_performers() {
        let suppliers = rank_all(vec![
            scored("low", 10.0, None),
            scored("high", 90.0, None),
            scored("mid", 50.0, None),
        ]);
        let top = top_performers(&suppliers, 2);
        let ids: Vec<&str> = top.iter().map(|s| s.supplier.supplier_id.as_str()).collect();
        assert_eq!(ids, vec!["high", "mid"]);

        assert_eq!(top_performers(&suppliers, DEFAULT_TOP_PERFORMERS).len(), 3);
    }
}
