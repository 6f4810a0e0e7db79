//! Per-invocation noise configuration.
//!
//! A [`NoiseConfig`] is created once per protection request and never
//! mutated while a run is in flight. Validation happens up front so a
//! bad value is rejected before any stage touches a pixel.

use crate::crypto::HashAlgorithm;
use crate::pipeline::Strategy;
use crate::stego::WatermarkPlane;
use serde::{Deserialize, Serialize};

/// Upper bound on the frequency worker pool.
pub const MAX_WORKERS: usize = 16;

/// Gaussian amplitudes for the three DCT frequency bands.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IntensityBands {
    /// Top-left quarter of each block's coefficients.
    pub low: f64,
    /// Top-left half, excluding the low band.
    pub mid: f64,
    /// Everything else.
    pub high: f64,
}

impl Default for IntensityBands {
    fn default() -> Self {
        Self {
            low: 0.05,
            mid: 0.1,
            high: 0.2,
        }
    }
}

impl IntensityBands {
    /// Same amplitude in every band (the plain additive variant).
    pub fn uniform(intensity: f64) -> Self {
        Self {
            low: intensity,
            mid: intensity,
            high: intensity,
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        check_intensity("low", self.low)?;
        check_intensity("mid", self.mid)?;
        check_intensity("high", self.high)
    }
}

/// How the frequency stage perturbs DCT coefficients.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FrequencyVariant {
    /// Additive Gaussian noise scaled per band.
    #[default]
    BandAdditive,
    /// High-frequency coefficients scaled by `1 + N(0, intensity)`.
    Multiplicative,
}

/// Watermark to embed in the luma bit plane.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum WatermarkPayload {
    /// UTF-8 text tiled over the image, most significant bit first.
    Text(String),
    /// An explicit plane; must match the image dimensions.
    Plane(WatermarkPlane),
}

/// Immutable configuration for one protection request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NoiseConfig {
    /// Single intensity used by the spatial, cryptographic and
    /// multiplicative frequency stages, in (0, 1].
    pub intensity: f64,
    /// Band amplitudes for the additive frequency stage.
    pub bands: IntensityBands,
    /// Frequency worker count, 1 to [`MAX_WORKERS`].
    pub workers: usize,
    /// Named stage composition.
    pub strategy: Strategy,
    /// Frequency stage variant.
    pub frequency_variant: FrequencyVariant,
    /// Optional watermark payload.
    pub watermark: Option<WatermarkPayload>,
    /// Seed for reproducible noise; `None` draws from OS entropy.
    pub seed: Option<u64>,
    /// Digest used for content-bound noise and identifiers.
    pub digest: HashAlgorithm,
}

impl Default for NoiseConfig {
    fn default() -> Self {
        Self {
            intensity: 0.1,
            bands: IntensityBands::default(),
            workers: 4,
            strategy: Strategy::default(),
            frequency_variant: FrequencyVariant::default(),
            watermark: None,
            seed: None,
            digest: HashAlgorithm::default(),
        }
    }
}

impl NoiseConfig {
    /// Creates a configuration for the given strategy with defaults elsewhere.
    pub fn with_strategy(strategy: Strategy) -> Self {
        Self {
            strategy,
            ..Default::default()
        }
    }

    /// Validates the configuration parameters.
    pub fn validate(&self) -> Result<(), ConfigError> {
        check_intensity("intensity", self.intensity)?;
        self.bands.validate()?;
        if self.workers == 0 || self.workers > MAX_WORKERS {
            return Err(ConfigError::InvalidWorkers(self.workers));
        }
        if self.strategy.stages().is_empty() {
            return Err(ConfigError::EmptyStrategy);
        }
        if let Some(WatermarkPayload::Text(text)) = &self.watermark {
            if text.is_empty() {
                return Err(ConfigError::EmptyWatermark);
            }
        }
        Ok(())
    }
}

/// Rejects intensities outside (0, 1].
fn check_intensity(name: &'static str, value: f64) -> Result<(), ConfigError> {
    if !value.is_finite() || value <= 0.0 || value > 1.0 {
        return Err(ConfigError::InvalidIntensity { name, value });
    }
    Ok(())
}

/// Rejects amplitudes that are negative or not finite.
///
/// Stage engines accept zero (a no-op perturbation); only the
/// request-level configuration insists on a strictly positive value.
pub(crate) fn check_amplitude(name: &'static str, value: f64) -> Result<(), ConfigError> {
    if !value.is_finite() || value < 0.0 {
        return Err(ConfigError::InvalidAmplitude { name, value });
    }
    Ok(())
}

/// Configuration validation errors.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigError {
    /// A noise intensity outside (0, 1].
    #[error("intensity `{name}` must be in (0, 1], got {value}")]
    InvalidIntensity {
        /// Which intensity.
        name: &'static str,
        /// The rejected value.
        value: f64,
    },
    /// An amplitude that is negative or not finite.
    #[error("amplitude `{name}` must be finite and non-negative, got {value}")]
    InvalidAmplitude {
        /// Which amplitude.
        name: &'static str,
        /// The rejected value.
        value: f64,
    },
    /// Worker count outside 1-16.
    #[error("invalid worker count {0} (must be 1-16)")]
    InvalidWorkers(usize),
    /// Custom strategy with no stages.
    #[error("strategy has no stages")]
    EmptyStrategy,
    /// Text watermark payload with nothing in it.
    #[error("watermark text is empty")]
    EmptyWatermark,
    /// Unrecognized strategy, stage or digest name.
    #[error("unknown name `{0}`")]
    UnknownName(String),
    /// The frequency worker pool could not be started.
    #[error("failed to build worker pool: {0}")]
    PoolBuild(String),
    /// Config file could not be read.
    #[error("failed to read config file: {0}")]
    FileReadError(String),
    /// Config file is not valid TOML for this schema.
    #[error("failed to parse config file: {0}")]
    ParseError(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_valid() {
        assert!(NoiseConfig::default().validate().is_ok());
    }

    #[test]
    fn test_zero_workers_invalid() {
        let config = NoiseConfig {
            workers: 0,
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidWorkers(0))
        ));
    }

    #[test]
    fn test_too_many_workers_invalid() {
        let config = NoiseConfig {
            workers: MAX_WORKERS + 1,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_intensity_bounds() {
        for bad in [0.0, -0.1, 1.01, f64::NAN, f64::INFINITY] {
            let config = NoiseConfig {
                intensity: bad,
                ..Default::default()
            };
            assert!(
                matches!(
                    config.validate(),
                    Err(ConfigError::InvalidIntensity { name: "intensity", .. })
                ),
                "intensity {bad} should be rejected"
            );
        }

        let config = NoiseConfig {
            intensity: 1.0,
            bands: IntensityBands::uniform(1.0),
            ..Default::default()
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_band_intensity_checked() {
        let config = NoiseConfig {
            bands: IntensityBands {
                low: 0.05,
                mid: 0.0,
                high: 0.2,
            },
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidIntensity { name: "mid", .. })
        ));
    }

    #[test]
    fn test_empty_custom_strategy_invalid() {
        let config = NoiseConfig::with_strategy(Strategy::Custom(Vec::new()));
        assert!(matches!(config.validate(), Err(ConfigError::EmptyStrategy)));
    }

    #[test]
    fn test_empty_watermark_text_invalid() {
        let config = NoiseConfig {
            watermark: Some(WatermarkPayload::Text(String::new())),
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::EmptyWatermark)));
    }
}
