use serde::{Deserialize, Serialize};

use crate::ingest::ScoringSettings;
use crate::scoring::{validate_normalization, validate_weights, NormalizationConfig, WeightsConfig};
use crate::storage::StorageConfig;

/// Contents of `config.yaml`. Every section is optional.
///
/// Example YAML:
/// ```yaml
/// weights:
///   esg: 30
///   scope1: 20
///   scope2: 15
///   scope3: 15
///   certifications: 10
///   policy: 10
/// normalization:
///   intensity_ceiling: 100
/// storage:
///   backend: local
/// ```
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weights: Option<WeightsConfig>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub normalization: Option<NormalizationConfig>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub storage: Option<StorageConfig>,
}

impl Config {
    /// Weights as configured, defaults otherwise.
    pub fn weights(&self) -> WeightsConfig {
        self.weights.clone().unwrap_or_default()
    }

    pub fn normalization(&self) -> NormalizationConfig {
        self.normalization.clone().unwrap_or_default()
    }

    pub fn storage(&self) -> StorageConfig {
        self.storage.clone().unwrap_or_default()
    }

    /// Scoring parameters for the ingest pipeline.
    pub fn scoring_settings(&self) -> ScoringSettings {
        ScoringSettings {
            weights: self.weights().to_weights(),
            intensity_ceiling: self.normalization().ceiling(),
        }
    }

    /// Validate every section, collecting all errors.
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();
        if let Err(e) = validate_weights(&self.weights()) {
            errors.extend(e);
        }
        if let Err(e) = validate_normalization(&self.normalization()) {
            errors.extend(e);
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scoring::Weights;
    use crate::storage::StorageBackend;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config: Config = serde_saphyr::from_str("{}").unwrap();
        assert_eq!(config, Config::default());
        let settings = config.scoring_settings();
        assert_eq!(settings.weights, Weights::default());
        assert_eq!(settings.intensity_ceiling, 100.0);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_full_config() {
        let yaml = r#"
weights:
  esg: 40
  scope1: 20
  scope2: 10
  scope3: 10
  certifications: 10
  policy: 10
normalization:
  intensity_ceiling: 250
storage:
  backend: cache
  path: /tmp/supplier-batches
"#;
        let config: Config = serde_saphyr::from_str(yaml).unwrap();
        let settings = config.scoring_settings();
        assert!((settings.weights.esg - 0.4).abs() < 1e-12);
        assert_eq!(settings.intensity_ceiling, 250.0);
        assert_eq!(config.storage().backend(), StorageBackend::Cache);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_unknown_section_rejected() {
        let result: Result<Config, _> = serde_saphyr::from_str("queries: []\n");
        assert!(result.is_err());
    }

    #[test]
    fn test_validate_collects_all_errors() {
        let yaml = r#"
weights:
  esg: -5
normalization:
  intensity_ceiling: 0
"#;
        let config: Config = serde_saphyr::from_str(yaml).unwrap();
        let errors = config.validate().unwrap_err();
        assert!(errors.iter().any(|e| e.starts_with("weights.esg")));
        assert!(errors.iter().any(|e| e.starts_with("weights: total")));
        assert!(errors.iter().any(|e| e.starts_with("normalization.intensity_ceiling")));
    }
}
