use super::config::{NormalizationConfig, WeightsConfig};

/// Allowed drift of the weight total from 100 (percent points).
const TOTAL_TOLERANCE: f64 = 0.01;

/// Validate weight configuration at startup.
/// Returns all validation errors at once (not just the first).
pub fn validate_weights(config: &WeightsConfig) -> Result<(), Vec<String>> {
    let mut errors = Vec::new();

    for (key, value) in config.entries() {
        if !value.is_finite() {
            errors.push(format!("weights.{}: must be a finite number", key));
        } else if value < 0.0 {
            errors.push(format!("weights.{}: must be non-negative (got {})", key, value));
        } else if value > 100.0 {
            errors.push(format!("weights.{}: must not exceed 100 (got {})", key, value));
        }
    }

    let total = config.total();
    if total.is_finite() && (total - 100.0).abs() > TOTAL_TOLERANCE {
        let direction = if total > 100.0 { "reduce by" } else { "add" };
        errors.push(format!(
            "weights: total is {}% but must equal 100% ({} {}%)",
            format_percent(total),
            direction,
            format_percent((total - 100.0).abs())
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Validate normalization settings.
pub fn validate_normalization(config: &NormalizationConfig) -> Result<(), Vec<String>> {
    let mut errors = Vec::new();

    if let Some(ceiling) = config.intensity_ceiling {
        if !ceiling.is_finite() || ceiling <= 0.0 {
            errors.push(format!(
                "normalization.intensity_ceiling: must be a positive number (got {})",
                ceiling
            ));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn format_percent(value: f64) -> String {
    let rounded = (value * 100.0).round() / 100.0;
    if rounded.fract() == 0.0 {
        format!("{}", rounded as i64)
    } else {
        format!("{}", rounded)
    }
}
