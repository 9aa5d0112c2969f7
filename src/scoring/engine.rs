use super::config::{Weights, DEFAULT_INTENSITY_CEILING};
use super::factors::{
    certifications_norm, emission_intensity, esg_norm, intensity_norm, policy_norm,
    round_one_decimal, NEUTRAL_NORM,
};
use crate::supplier::{ScoredSupplier, Supplier};

#[derive(Debug, Clone)]
pub struct FactorContribution {
    pub label: String,  // e.g. "ESG", "Scope 1", "Certifications"
    pub norm: f64,      // normalized input in [0, 1]
    pub weight: f64,    // fraction of the composite
    pub points: f64,    // weight * norm * 100
    pub fallback: bool, // norm came from a missing-input policy
}

#[derive(Debug, Clone)]
pub struct ScoreBreakdown {
    pub factors: Vec<FactorContribution>,
    /// Unrounded sum of all contributions
    pub total: f64,
}

/// Score one supplier against the default 100 tCO2e/$M intensity ceiling.
pub fn score(supplier: &Supplier, weights: &Weights) -> ScoredSupplier {
    score_with_ceiling(supplier, weights, DEFAULT_INTENSITY_CEILING)
}

/// Score one supplier.
///
/// Missing inputs never produce NaN. Zero or missing revenue leaves all
/// intensities undefined and puts every emissions norm at the neutral 0.5;
/// a missing scope 1 or 2 figure does the same for that scope. A missing
/// scope 3 figure is expected and yields intensity 0 with a neutral norm.
/// A missing ESG total scores as 0. Every fallback except the scope 3 one
/// marks the result `incomplete`.
pub fn score_with_ceiling(supplier: &Supplier, weights: &Weights, ceiling: f64) -> ScoredSupplier {
    let revenue_ok = supplier
        .revenue_usd_m
        .is_some_and(|r| r > 0.0 && r.is_finite());
    let mut incomplete = !revenue_ok;

    let s1_intensity = emission_intensity(supplier.scope1_tco2e, supplier.revenue_usd_m);
    let s2_intensity = emission_intensity(supplier.scope2_tco2e, supplier.revenue_usd_m);
    let s3_intensity = if revenue_ok {
        emission_intensity(supplier.scope3_tco2e, supplier.revenue_usd_m).or(Some(0.0))
    } else {
        None
    };

    let s1_norm_cost = s1_intensity.map_or(NEUTRAL_NORM, |i| intensity_norm(i, ceiling));
    let s2_norm_cost = s2_intensity.map_or(NEUTRAL_NORM, |i| intensity_norm(i, ceiling));
    let s3_norm_cost = match (supplier.scope3_tco2e, s3_intensity) {
        (Some(_), Some(i)) => intensity_norm(i, ceiling),
        _ => NEUTRAL_NORM,
    };
    if s1_intensity.is_none() || s2_intensity.is_none() {
        incomplete = true;
    }

    let esg_total_norm = match supplier.esg_total {
        Some(esg) => {
            if !(0.0..=100.0).contains(&esg) {
                tracing::warn!(
                    supplier_id = %supplier.supplier_id,
                    esg_total = esg,
                    "esg_total outside 0-100, clamping"
                );
            }
            esg_norm(esg)
        }
        None => {
            incomplete = true;
            0.0
        }
    };

    let certs_norm = certifications_norm(
        supplier.is_iso14001,
        supplier.is_bcorp,
        supplier.is_fairtrade,
    );
    let policy_norm = policy_norm(supplier.has_decarb_target);

    let composite = weights.esg * esg_total_norm
        + weights.scope1 * s1_norm_cost
        + weights.scope2 * s2_norm_cost
        + weights.scope3 * s3_norm_cost
        + weights.certs * certs_norm
        + weights.policy * policy_norm;

    if incomplete {
        tracing::debug!(supplier_id = %supplier.supplier_id, "scored with fallback inputs");
    }

    ScoredSupplier {
        supplier: supplier.clone(),
        s1_intensity,
        s2_intensity,
        s3_intensity,
        esg_total_norm,
        s1_norm_cost,
        s2_norm_cost,
        s3_norm_cost,
        certs_norm,
        policy_norm,
        score: round_one_decimal(composite * 100.0),
        rank: 0,
        incomplete,
    }
}

/// Assign ranks to a fully scored batch.
///
/// Orders by `(-score, input position)`: highest score first, ties keep the
/// order they arrived in. Ranks are 1-based and dense.
pub fn rank_all(records: Vec<ScoredSupplier>) -> Vec<ScoredSupplier> {
    let mut indexed: Vec<(usize, ScoredSupplier)> = records.into_iter().enumerate().collect();

    indexed.sort_by(|(ia, a), (ib, b)| b.score.total_cmp(&a.score).then(ia.cmp(ib)));

    indexed
        .into_iter()
        .enumerate()
        .map(|(position, (_, mut record))| {
            record.rank = position + 1;
            record
        })
        .collect()
}

/// Score every supplier, then rank the batch.
pub fn score_batch(suppliers: &[Supplier], weights: &Weights, ceiling: f64) -> Vec<ScoredSupplier> {
    let scored = suppliers
        .iter()
        .map(|s| score_with_ceiling(s, weights, ceiling))
        .collect();
    rank_all(scored)
}

/// Explain a scored record in terms of per-component points.
pub fn breakdown(scored: &ScoredSupplier, weights: &Weights) -> ScoreBreakdown {
    let supplier = &scored.supplier;
    let components = [
        ("ESG", scored.esg_total_norm, weights.esg, supplier.esg_total.is_none()),
        ("Scope 1", scored.s1_norm_cost, weights.scope1, scored.s1_intensity.is_none()),
        ("Scope 2", scored.s2_norm_cost, weights.scope2, scored.s2_intensity.is_none()),
        (
            "Scope 3",
            scored.s3_norm_cost,
            weights.scope3,
            supplier.scope3_tco2e.is_none() || scored.s3_intensity.is_none(),
        ),
        ("Certifications", scored.certs_norm, weights.certs, false),
        ("Policy", scored.policy_norm, weights.policy, false),
    ];

    let factors: Vec<FactorContribution> = components
        .into_iter()
        .map(|(label, norm, weight, fallback)| FactorContribution {
            label: label.to_string(),
            norm,
            weight,
            points: weight * norm * 100.0,
            fallback,
        })
        .collect();
    let total = factors.iter().map(|f| f.points).sum();

    ScoreBreakdown { factors, total }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_supplier(id: &str, esg: f64, scope1: f64, scope2: f64, revenue: f64) -> Supplier {
        let mut s = Supplier::new(id, format!("Supplier {}", id));
        s.esg_total = Some(esg);
        s.scope1_tco2e = Some(scope1);
        s.scope2_tco2e = Some(scope2);
        s.revenue_usd_m = Some(revenue);
        s
    }

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_reference_scenario() {
        let mut supplier = sample_supplier("S-1", 80.0, 50.0, 30.0, 100.0);
        supplier.is_iso14001 = true;
        supplier.has_decarb_target = true;

        let scored = score(&supplier, &Weights::default());

        assert!(approx(scored.s1_intensity.unwrap(), 0.5));
        assert!(approx(scored.s1_norm_cost, 0.995));
        assert!(approx(scored.s2_intensity.unwrap(), 0.3));
        assert!(approx(scored.s2_norm_cost, 0.997));
        assert_eq!(scored.s3_intensity, Some(0.0));
        assert_eq!(scored.s3_norm_cost, 0.5);
        assert!(approx(scored.esg_total_norm, 0.8));
        assert_eq!(scored.certs_norm, 0.6);
        assert_eq!(scored.policy_norm, 1.0);
        // 100 * (0.24 + 0.199 + 0.14955 + 0.075 + 0.06 + 0.1) = 82.355
        assert_eq!(scored.score, 82.4);
        assert!(!scored.incomplete);
    }

    #[test]
    fn test_scope3_present() {
        let mut supplier = sample_supplier("S-1", 50.0, 10.0, 10.0, 10.0);
        supplier.scope3_tco2e = Some(200.0);
        let scored = score(&supplier, &Weights::default());
        assert!(approx(scored.s3_intensity.unwrap(), 20.0));
        assert!(approx(scored.s3_norm_cost, 0.8));
    }

    #[test]
    fn test_scope3_zero_is_not_missing() {
        let mut supplier = sample_supplier("S-1", 50.0, 10.0, 10.0, 10.0);
        supplier.scope3_tco2e = Some(0.0);
        let scored = score(&supplier, &Weights::default());
        assert_eq!(scored.s3_intensity, Some(0.0));
        assert_eq!(scored.s3_norm_cost, 1.0);
    }

    #[test]
    fn test_zero_revenue_falls_back_to_neutral() {
        let supplier = sample_supplier("S-1", 60.0, 50.0, 30.0, 0.0);
        let scored = score(&supplier, &Weights::default());

        assert_eq!(scored.s1_intensity, None);
        assert_eq!(scored.s2_intensity, None);
        assert_eq!(scored.s3_intensity, None);
        assert_eq!(scored.s1_norm_cost, 0.5);
        assert_eq!(scored.s2_norm_cost, 0.5);
        assert_eq!(scored.s3_norm_cost, 0.5);
        assert!(scored.score.is_finite());
        assert!(scored.incomplete);
        // 100 * (0.3*0.6 + 0.2*0.5 + 0.15*0.5 + 0.15*0.5) = 43.0
        assert_eq!(scored.score, 43.0);
    }

    #[test]
    fn test_missing_revenue_is_degenerate() {
        let mut supplier = sample_supplier("S-1", 60.0, 50.0, 30.0, 1.0);
        supplier.revenue_usd_m = None;
        let scored = score(&supplier, &Weights::default());
        assert_eq!(scored.s1_intensity, None);
        assert!(scored.score.is_finite());
        assert!(scored.incomplete);
    }

    #[test]
    fn test_missing_esg_scores_worst_case() {
        let mut supplier = sample_supplier("S-1", 0.0, 0.0, 0.0, 10.0);
        supplier.esg_total = None;
        let scored = score(&supplier, &Weights::default());
        assert_eq!(scored.esg_total_norm, 0.0);
        assert!(scored.incomplete);
    }

    #[test]
    fn test_esg_above_range_is_clamped() {
        let high = score(&sample_supplier("S-1", 150.0, 0.0, 0.0, 10.0), &Weights::default());
        let max = score(&sample_supplier("S-2", 100.0, 0.0, 0.0, 10.0), &Weights::default());
        assert_eq!(high.esg_total_norm, 1.0);
        assert_eq!(high.score, max.score);
        assert_eq!(high.supplier.esg_total, Some(150.0));
    }

    #[test]
    fn test_score_within_bounds() {
        let weights = Weights::default();
        for esg in [0.0, 25.0, 50.0, 99.9, 100.0] {
            for scope1 in [0.0, 10.0, 1_000.0, 1e9] {
                for revenue in [0.001, 1.0, 500.0] {
                    let mut supplier = sample_supplier("S", esg, scope1, scope1 / 2.0, revenue);
                    supplier.is_iso14001 = true;
                    supplier.is_bcorp = true;
                    supplier.is_fairtrade = true;
                    supplier.has_decarb_target = true;
                    let scored = score(&supplier, &weights);
                    assert!((0.0..=100.0).contains(&scored.score), "score {}", scored.score);
                }
            }
        }
    }

    #[test]
    fn test_perfect_supplier_scores_100() {
        let mut supplier = sample_supplier("S-1", 100.0, 0.0, 0.0, 10.0);
        supplier.scope3_tco2e = Some(0.0);
        supplier.is_iso14001 = true;
        supplier.is_bcorp = true;
        supplier.is_fairtrade = true;
        supplier.has_decarb_target = true;
        let scored = score(&supplier, &Weights::default());
        assert_eq!(scored.certs_norm, 1.0);
        assert_eq!(scored.score, 100.0);
    }

    #[test]
    fn test_scoring_is_deterministic() {
        let supplier = sample_supplier("S-1", 73.0, 12.3, 4.56, 78.9);
        let weights = Weights::default();
        let a = score(&supplier, &weights);
        let b = score(&supplier, &weights);
        assert_eq!(a, b);
        assert_eq!(a.score.to_bits(), b.score.to_bits());
    }

    #[test]
    fn test_monotonic_in_esg() {
        let weights = Weights::default();
        let mut previous = f64::MIN;
        for esg in [0.0, 10.0, 35.5, 60.0, 90.0, 100.0] {
            let scored = score(&sample_supplier("S", esg, 20.0, 10.0, 50.0), &weights);
            assert!(scored.score >= previous);
            previous = scored.score;
        }
    }

    #[test]
    fn test_monotonic_in_scope1() {
        let weights = Weights::default();
        let mut previous = f64::MAX;
        for scope1 in [0.0, 100.0, 1_000.0, 4_000.0, 10_000.0] {
            let scored = score(&sample_supplier("S", 50.0, scope1, 10.0, 50.0), &weights);
            assert!(scored.score <= previous);
            previous = scored.score;
        }
    }

    #[test]
    fn test_custom_ceiling() {
        let supplier = sample_supplier("S-1", 50.0, 5_000.0, 0.0, 50.0); // intensity 100
        let default = score(&supplier, &Weights::default());
        let relaxed = score_with_ceiling(&supplier, &Weights::default(), 200.0);
        assert_eq!(default.s1_norm_cost, 0.0);
        assert!(approx(relaxed.s1_norm_cost, 0.5));
    }

    #[test]
    fn test_custom_weights() {
        let weights = Weights {
            esg: 1.0,
            scope1: 0.0,
            scope2: 0.0,
            scope3: 0.0,
            certs: 0.0,
            policy: 0.0,
        };
        let scored = score(&sample_supplier("S-1", 64.0, 999.0, 999.0, 1.0), &weights);
        assert_eq!(scored.score, 64.0);
    }

    fn scored_with(id: &str, score_value: f64) -> ScoredSupplier {
        let mut scored = score(&Supplier::new(id, id), &Weights::default());
        scored.score = score_value;
        scored
    }

    #[test]
    fn test_rank_all_orders_by_score() {
        let ranked = rank_all(vec![
            scored_with("a", 40.0),
            scored_with("b", 90.5),
            scored_with("c", 65.0),
        ]);
        let ids: Vec<_> = ranked.iter().map(|r| r.supplier.supplier_id.as_str()).collect();
        assert_eq!(ids, vec!["b", "c", "a"]);
        let ranks: Vec<_> = ranked.iter().map(|r| r.rank).collect();
        assert_eq!(ranks, vec![1, 2, 3]);
    }

    #[test]
    fn test_rank_all_ties_keep_input_order() {
        let ranked = rank_all(vec![
            scored_with("first", 50.0),
            scored_with("top", 70.0),
            scored_with("second", 50.0),
            scored_with("third", 50.0),
        ]);
        let ids: Vec<_> = ranked.iter().map(|r| r.supplier.supplier_id.as_str()).collect();
        assert_eq!(ids, vec!["top", "first", "second", "third"]);
        assert_eq!(ranked[3].rank, 4);
    }

    #[test]
    fn test_rank_all_dense_and_strict() {
        let scores = [12.0, 99.0, 45.5, 45.5, 0.0, 78.1, 12.0];
        let ranked = rank_all(
            scores
                .iter()
                .enumerate()
                .map(|(i, s)| scored_with(&i.to_string(), *s))
                .collect(),
        );

        let mut ranks: Vec<_> = ranked.iter().map(|r| r.rank).collect();
        ranks.sort_unstable();
        assert_eq!(ranks, (1..=scores.len()).collect::<Vec<_>>());

        for a in &ranked {
            for b in &ranked {
                if a.score > b.score {
                    assert!(a.rank < b.rank);
                }
            }
        }
    }

    #[test]
    fn test_rank_all_empty() {
        assert!(rank_all(Vec::new()).is_empty());
    }

    #[test]
    fn test_rerank_after_removal() {
        let ranked = rank_all(vec![
            scored_with("a", 10.0),
            scored_with("b", 20.0),
            scored_with("c", 30.0),
        ]);
        let remaining: Vec<_> = ranked
            .into_iter()
            .filter(|r| r.supplier.supplier_id != "c")
            .collect();
        let reranked = rank_all(remaining);
        assert_eq!(reranked[0].supplier.supplier_id, "b");
        assert_eq!(reranked[0].rank, 1);
        assert_eq!(reranked[1].rank, 2);
    }

    #[test]
    fn test_score_batch_ranks() {
        let suppliers = vec![
            sample_supplier("low", 10.0, 500.0, 500.0, 10.0),
            sample_supplier("high", 95.0, 1.0, 1.0, 100.0),
        ];
        let ranked = score_batch(&suppliers, &Weights::default(), 100.0);
        assert_eq!(ranked[0].supplier.supplier_id, "high");
        assert_eq!(ranked[0].rank, 1);
        assert_eq!(ranked[1].rank, 2);
    }

    #[test]
    fn test_breakdown_sums_to_score() {
        let mut supplier = sample_supplier("S-1", 80.0, 50.0, 30.0, 100.0);
        supplier.is_iso14001 = true;
        supplier.has_decarb_target = true;
        let weights = Weights::default();
        let scored = score(&supplier, &weights);
        let explained = breakdown(&scored, &weights);

        assert_eq!(explained.factors.len(), 6);
        assert!((explained.total - 82.355).abs() < 1e-9);
        assert_eq!(round_one_decimal(explained.total), scored.score);

        let scope3 = &explained.factors[3];
        assert_eq!(scope3.label, "Scope 3");
        assert!(scope3.fallback);
        assert!(!explained.factors[0].fallback);
    }
}
