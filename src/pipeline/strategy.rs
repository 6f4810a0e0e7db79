//! Named stage compositions.

use crate::config::ConfigError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// One buffer-in, buffer-out transform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Stage {
    /// Luma LSB watermark from the configured payload.
    Watermark,
    /// Gaussian noise masked away from edges.
    AdaptiveNoise,
    /// Gaussian noise weighted toward flat regions.
    SemanticNoise,
    /// Block-wise DCT coefficient noise on the worker pool.
    FrequencyNoise,
    /// Digest-derived noise bound to the buffer content.
    CryptographicNoise,
    /// Fixed step wherever the local gradient is non-zero.
    GradientSign,
    /// Random base64 token XORed on a sparse lattice.
    HiddenToken,
    /// Digest prefix XORed on a dense lattice.
    ContentIdentifier,
    /// Channel mean and deviation matched back to the input.
    RestoreStatistics,
}

impl Stage {
    /// Every stage, in declaration order.
    pub const ALL: [Stage; 9] = [
        Stage::Watermark,
        Stage::AdaptiveNoise,
        Stage::SemanticNoise,
        Stage::FrequencyNoise,
        Stage::CryptographicNoise,
        Stage::GradientSign,
        Stage::HiddenToken,
        Stage::ContentIdentifier,
        Stage::RestoreStatistics,
    ];

    /// Stable kebab-case name, used in logs, errors and RNG labels.
    pub fn name(&self) -> &'static str {
        match self {
            Stage::Watermark => "watermark",
            Stage::AdaptiveNoise => "adaptive-noise",
            Stage::SemanticNoise => "semantic-noise",
            Stage::FrequencyNoise => "frequency-noise",
            Stage::CryptographicNoise => "cryptographic-noise",
            Stage::GradientSign => "gradient-sign",
            Stage::HiddenToken => "hidden-token",
            Stage::ContentIdentifier => "content-identifier",
            Stage::RestoreStatistics => "restore-statistics",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Stage {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Stage::ALL
            .into_iter()
            .find(|stage| stage.name() == s)
            .ok_or_else(|| ConfigError::UnknownName(s.to_string()))
    }
}

/// An ordered list of stages, either named or custom.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Strategy {
    /// Frequency noise only.
    DctOnly,
    /// Edge-aware noise, then frequency noise.
    AdaptiveMultifrequency,
    /// Watermark, adaptive, semantic, frequency, then restoration.
    #[default]
    FullChain,
    /// Gradient sign, hidden token, digest noise, then content identifier.
    Cryptographic,
    /// Any ordered stage list.
    Custom(Vec<Stage>),
}

impl Strategy {
    /// Stages in execution order.
    pub fn stages(&self) -> Vec<Stage> {
        match self {
            Strategy::DctOnly => vec![Stage::FrequencyNoise],
            Strategy::AdaptiveMultifrequency => vec![Stage::AdaptiveNoise, Stage::FrequencyNoise],
            Strategy::FullChain => vec![
                Stage::Watermark,
                Stage::AdaptiveNoise,
                Stage::SemanticNoise,
                Stage::FrequencyNoise,
                Stage::RestoreStatistics,
            ],
            Strategy::Cryptographic => vec![
                Stage::GradientSign,
                Stage::HiddenToken,
                Stage::CryptographicNoise,
                Stage::ContentIdentifier,
            ],
            Strategy::Custom(stages) => stages.clone(),
        }
    }

    /// Kebab-case strategy name; custom lists are just `custom`.
    pub fn name(&self) -> &'static str {
        match self {
            Strategy::DctOnly => "dct-only",
            Strategy::AdaptiveMultifrequency => "adaptive-multifrequency",
            Strategy::FullChain => "full-chain",
            Strategy::Cryptographic => "cryptographic",
            Strategy::Custom(_) => "custom",
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Strategy::Custom(stages) => {
                let names: Vec<_> = stages.iter().map(Stage::name).collect();
                write!(f, "custom({})", names.join(","))
            }
            named => f.write_str(named.name()),
        }
    }
}

impl FromStr for Strategy {
    type Err = ConfigError;

    /// Parses a strategy name, or a comma-separated stage list as a custom strategy.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "dct-only" => Ok(Strategy::DctOnly),
            "adaptive-multifrequency" => Ok(Strategy::AdaptiveMultifrequency),
            "full-chain" => Ok(Strategy::FullChain),
            "cryptographic" => Ok(Strategy::Cryptographic),
            list if list.contains(',') || list.parse::<Stage>().is_ok() => list
                .split(',')
                .map(|name| name.trim().parse())
                .collect::<Result<Vec<_>, _>>()
                .map(Strategy::Custom),
            other => Err(ConfigError::UnknownName(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_named_compositions() {
        assert_eq!(Strategy::DctOnly.stages(), vec![Stage::FrequencyNoise]);
        assert_eq!(Strategy::default(), Strategy::FullChain);
        assert_eq!(Strategy::FullChain.stages().len(), 5);
        assert_eq!(Strategy::FullChain.stages()[0], Stage::Watermark);
        assert_eq!(
            Strategy::FullChain.stages().last(),
            Some(&Stage::RestoreStatistics)
        );
    }

    #[test]
    fn test_parse_names_and_lists() {
        assert_eq!("full-chain".parse::<Strategy>().unwrap(), Strategy::FullChain);
        assert_eq!(
            "semantic-noise, frequency-noise".parse::<Strategy>().unwrap(),
            Strategy::Custom(vec![Stage::SemanticNoise, Stage::FrequencyNoise])
        );
        assert_eq!(
            "gradient-sign".parse::<Strategy>().unwrap(),
            Strategy::Custom(vec![Stage::GradientSign])
        );
        assert!(matches!(
            "blur".parse::<Strategy>(),
            Err(ConfigError::UnknownName(name)) if name == "blur"
        ));
    }

    #[test]
    fn test_stage_names_roundtrip() {
        for stage in Stage::ALL {
            assert_eq!(stage.name().parse::<Stage>().unwrap(), stage);
        }
    }

    #[test]
    fn test_display() {
        let custom = Strategy::Custom(vec![Stage::Watermark, Stage::HiddenToken]);
        assert_eq!(custom.to_string(), "custom(watermark,hidden-token)");
        assert_eq!(Strategy::Cryptographic.to_string(), "cryptographic");
    }
}
