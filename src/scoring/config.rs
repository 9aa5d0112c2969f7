use serde::{Deserialize, Serialize};

/// Weight configuration as written in the config file, in percent.
///
/// The six weights must add up to 100. Missing keys take their default.
///
/// Example YAML:
/// ```yaml
/// weights:
///   esg: 30
///   scope1: 20
///   scope2: 15
///   scope3: 15
///   certs: 10
///   policy: 10
/// ```
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct WeightsConfig {
    #[serde(default)]
    pub esg: Option<f64>,

    #[serde(default)]
    pub scope1: Option<f64>,

    #[serde(default)]
    pub scope2: Option<f64>,

    #[serde(default)]
    pub scope3: Option<f64>,

    /// Certifications weight (`certifications` is accepted as well)
    #[serde(default, alias = "certifications")]
    pub certs: Option<f64>,

    /// Decarbonization policy weight
    #[serde(default)]
    pub policy: Option<f64>,
}

impl Default for WeightsConfig {
    fn default() -> Self {
        Self {
            esg: Some(30.0),
            scope1: Some(20.0),
            scope2: Some(15.0),
            scope3: Some(15.0),
            certs: Some(10.0),
            policy: Some(10.0),
        }
    }
}

impl WeightsConfig {
    /// Percentages with defaults filled in, in display order.
    pub fn entries(&self) -> [(&'static str, f64); 6] {
        let d = WeightsConfig::default();
        let pick = |v: Option<f64>, fallback: Option<f64>| v.or(fallback).unwrap_or(0.0);
        [
            ("esg", pick(self.esg, d.esg)),
            ("scope1", pick(self.scope1, d.scope1)),
            ("scope2", pick(self.scope2, d.scope2)),
            ("scope3", pick(self.scope3, d.scope3)),
            ("certs", pick(self.certs, d.certs)),
            ("policy", pick(self.policy, d.policy)),
        ]
    }

    /// Sum of the effective percentages.
    pub fn total(&self) -> f64 {
        self.entries().iter().map(|(_, v)| v).sum()
    }

    /// Convert percentages to the fractions the engine consumes.
    pub fn to_weights(&self) -> Weights {
        let [esg, scope1, scope2, scope3, certs, policy] = self.entries().map(|(_, v)| v / 100.0);
        Weights {
            esg,
            scope1,
            scope2,
            scope3,
            certs,
            policy,
        }
    }
}

/// Contribution fractions used by `score`. Conceptually they sum to 1.0.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Weights {
    pub esg: f64,
    pub scope1: f64,
    pub scope2: f64,
    pub scope3: f64,
    pub certs: f64,
    pub policy: f64,
}

impl Default for Weights {
    fn default() -> Self {
        Self {
            esg: 0.30,
            scope1: 0.20,
            scope2: 0.15,
            scope3: 0.15,
            certs: 0.10,
            policy: 0.10,
        }
    }
}

/// Emission-intensity normalization settings.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct NormalizationConfig {
    /// Intensity (tCO2e per $M revenue) at which an emissions norm reaches 0
    #[serde(default)]
    pub intensity_ceiling: Option<f64>,
}

pub const DEFAULT_INTENSITY_CEILING: f64 = 100.0;

impl Default for NormalizationConfig {
    fn default() -> Self {
        Self {
            intensity_ceiling: Some(DEFAULT_INTENSITY_CEILING),
        }
    }
}

impl NormalizationConfig {
    pub fn ceiling(&self) -> f64 {
        self.intensity_ceiling.unwrap_or(DEFAULT_INTENSITY_CEILING)
    }
}
