//! TOML configuration file.

use super::{ConfigError, NoiseConfig};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Full configuration file format.
///
/// ```toml
/// [noise]
/// intensity = 0.1
/// workers = 4
/// strategy = "full-chain"
/// seed = 42
///
/// [noise.bands]
/// low = 0.05
/// mid = 0.1
/// high = 0.2
///
/// [noise.watermark]
/// text = "do not train"
///
/// [output]
/// suffix = ".protected.png"
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct FileConfig {
    /// The `[noise]` table.
    #[serde(default)]
    pub noise: NoiseConfig,
    /// The `[output]` table.
    #[serde(default)]
    pub output: OutputConfig,
}

/// Output configuration for the CLI adapter.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Suffix replacing the input extension when writing results.
    pub suffix: String,
    /// Where to write Prometheus text metrics after a run (disabled if unset).
    pub metrics_path: Option<PathBuf>,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            suffix: ".protected.png".to_string(),
            metrics_path: None,
        }
    }
}

impl FileConfig {
    /// Loads configuration from a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| ConfigError::FileReadError(e.to_string()))?;
        Self::from_toml(&content)
    }

    /// Parses and validates configuration from TOML text.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: FileConfig =
            toml::from_str(content).map_err(|e| ConfigError::ParseError(e.to_string()))?;
        config.noise.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{FrequencyVariant, WatermarkPayload};
    use crate::crypto::HashAlgorithm;
    use crate::pipeline::{Stage, Strategy};

    #[test]
    fn test_empty_file_uses_defaults() {
        let config = FileConfig::from_toml("").unwrap();
        assert_eq!(config.noise, NoiseConfig::default());
        assert_eq!(config.output.suffix, ".protected.png");
    }

    #[test]
    fn test_full_file_parses() {
        let config = FileConfig::from_toml(
            r#"
            [noise]
            intensity = 0.2
            workers = 8
            strategy = "dct-only"
            frequency_variant = "multiplicative"
            seed = 7
            digest = "blake3"

            [noise.bands]
            low = 0.01
            mid = 0.02
            high = 0.03

            [noise.watermark]
            text = "mine"

            [output]
            suffix = ".glazed.png"
            metrics_path = "metrics.prom"
            "#,
        )
        .unwrap();

        assert_eq!(config.noise.workers, 8);
        assert_eq!(config.noise.strategy, Strategy::DctOnly);
        assert_eq!(config.noise.frequency_variant, FrequencyVariant::Multiplicative);
        assert_eq!(config.noise.seed, Some(7));
        assert_eq!(config.noise.digest, HashAlgorithm::Blake3);
        assert_eq!(config.noise.bands.high, 0.03);
        assert_eq!(
            config.noise.watermark,
            Some(WatermarkPayload::Text("mine".into()))
        );
        assert_eq!(config.output.metrics_path, Some(PathBuf::from("metrics.prom")));
    }

    #[test]
    fn test_custom_strategy_parses() {
        let config = FileConfig::from_toml(
            r#"
            [noise.strategy]
            custom = ["semantic-noise", "restore-statistics"]
            "#,
        )
        .unwrap();

        assert_eq!(
            config.noise.strategy,
            Strategy::Custom(vec![Stage::SemanticNoise, Stage::RestoreStatistics])
        );
    }

    #[test]
    fn test_invalid_values_rejected_on_load() {
        let result = FileConfig::from_toml("[noise]\nworkers = 0\n");
        assert!(matches!(result, Err(ConfigError::InvalidWorkers(0))));

        let result = FileConfig::from_toml("[noise]\nworkers = -2\n");
        assert!(matches!(result, Err(ConfigError::ParseError(_))));
    }
}
