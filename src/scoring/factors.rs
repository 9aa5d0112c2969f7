/// Normalized value used when an input needed for a component is missing.
pub const NEUTRAL_NORM: f64 = 0.5;

// Certification points in tenths, summed as integers so the cap lands on 1.0 exactly
const ISO14001_TENTHS: u8 = 6;
const BCORP_TENTHS: u8 = 3;
const FAIRTRADE_TENTHS: u8 = 1;

/// Emissions per $M revenue. `None` when either input is missing or revenue
/// is not a positive number.
pub fn emission_intensity(emissions: Option<f64>, revenue: Option<f64>) -> Option<f64> {
    let revenue = revenue.filter(|r| *r > 0.0 && r.is_finite())?;
    let emissions = emissions.filter(|e| e.is_finite())?;
    Some(emissions / revenue)
}

/// Linear decay against a fixed worst-case intensity: 1 at zero emissions,
/// 0 at or above `ceiling`. Always within [0, 1].
pub fn intensity_norm(intensity: f64, ceiling: f64) -> f64 {
    (1.0 - intensity / ceiling).clamp(0.0, 1.0)
}

/// ESG total on a 0-100 scale mapped to [0, 1]. Out-of-range input is clamped.
pub fn esg_norm(esg_total: f64) -> f64 {
    (esg_total / 100.0).clamp(0.0, 1.0)
}

/// Additive certification points, capped at 1.
pub fn certifications_norm(iso14001: bool, bcorp: bool, fairtrade: bool) -> f64 {
    let mut tenths = 0u8;
    if iso14001 {
        tenths += ISO14001_TENTHS;
    }
    if bcorp {
        tenths += BCORP_TENTHS;
    }
    if fairtrade {
        tenths += FAIRTRADE_TENTHS;
    }
    f64::min(1.0, f64::from(tenths) / 10.0)
}

pub fn policy_norm(has_decarb_target: bool) -> f64 {
    if has_decarb_target {
        1.0
    } else {
        0.0
    }
}

/// Round half away from zero at one decimal place.
pub fn round_one_decimal(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_intensity_basic() {
        assert_eq!(emission_intensity(Some(50.0), Some(100.0)), Some(0.5));
        assert_eq!(emission_intensity(Some(0.0), Some(100.0)), Some(0.0));
    }

    #[test]
    fn test_intensity_degenerate_revenue() {
        assert_eq!(emission_intensity(Some(50.0), Some(0.0)), None);
        assert_eq!(emission_intensity(Some(50.0), None), None);
        assert_eq!(emission_intensity(Some(50.0), Some(-10.0)), None);
    }

    #[test]
    fn test_intensity_missing_emissions() {
        assert_eq!(emission_intensity(None, Some(100.0)), None);
    }

    #[test]
    fn test_intensity_norm_decay() {
        assert!((intensity_norm(0.5, 100.0) - 0.995).abs() < 1e-12);
        assert_eq!(intensity_norm(0.0, 100.0), 1.0);
        assert_eq!(intensity_norm(100.0, 100.0), 0.0);
        assert_eq!(intensity_norm(250.0, 100.0), 0.0);
    }

    #[test]
    fn test_intensity_norm_negative_capped() {
        assert_eq!(intensity_norm(-20.0, 100.0), 1.0);
    }

    #[test]
    fn test_intensity_norm_custom_ceiling() {
        assert!((intensity_norm(50.0, 200.0) - 0.75).abs() < 1e-12);
    }

    #[test]
    fn test_esg_norm_clamps() {
        assert!((esg_norm(80.0) - 0.8).abs() < 1e-12);
        assert_eq!(esg_norm(130.0), 1.0);
        assert_eq!(esg_norm(-5.0), 0.0);
    }

    #[test]
    fn test_certifications_cap() {
        assert_eq!(certifications_norm(false, false, false), 0.0);
        assert_eq!(certifications_norm(true, false, false), 0.6);
        assert_eq!(certifications_norm(false, true, true), 0.4);

        let all = certifications_norm(true, true, true);
        assert_eq!(all, 1.0);
        assert!(all <= 1.0);
    }

    #[test]
    fn test_policy_norm() {
        assert_eq!(policy_norm(true), 1.0);
        assert_eq!(policy_norm(false), 0.0);
    }

    #[test]
    fn test_round_one_decimal() {
        assert_eq!(round_one_decimal(82.355), 82.4);
        assert_eq!(round_one_decimal(76.65), 76.7);
        assert_eq!(round_one_decimal(0.04), 0.0);
        assert_eq!(round_one_decimal(100.0), 100.0);
    }
}
