//! Strategy execution.

use super::strategy::Stage;
use crate::analysis::{QualityReport, StatisticsRestorer};
use crate::buffer::PixelBuffer;
use crate::config::{ConfigError, FrequencyVariant, NoiseConfig, WatermarkPayload};
use crate::crypto::{ContentDigest, CryptographicNoiseGenerator};
use crate::error::Result;
use crate::frequency::FrequencyNoiseEngine;
use crate::rng::{EntropySource, NoiseRng, OsEntropy};
use crate::spatial::{GradientSignNoise, SpatialMode, SpatialNoiseEngine};
use crate::stego::{LatticeMarker, WatermarkEmbedder, WatermarkPlane, HIDDEN_TOKEN_STRIDE, IDENTIFIER_STRIDE};
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use rand::RngCore;
use rayon::{ThreadPool, ThreadPoolBuilder};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

/// Hex characters of the digest used as content identifier.
const IDENTIFIER_HEX_LEN: usize = 16;

/// Raw bytes behind the hidden token, before base64.
const TOKEN_BYTES: usize = 32;

/// Wall time spent in one stage.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StageTiming {
    /// Stage that ran.
    pub stage: Stage,
    /// Time it took.
    pub elapsed: Duration,
}

/// Diagnostics from one successful protection.
#[derive(Debug, Clone)]
pub struct ProtectionReport {
    /// Display form of the strategy that ran.
    pub strategy: String,
    /// Stages in execution order; skipped stages are absent.
    pub stages: Vec<StageTiming>,
    /// Total wall time, validation included.
    pub elapsed: Duration,
    /// Row-blocks processed by frequency stages.
    pub frequency_blocks: usize,
    /// Distortion of the output against the input.
    pub quality: QualityReport,
}

/// Runs noise strategies over pixel buffers.
///
/// The frequency worker pool is either injected with [`with_pool`] or
/// built on first use and reused while the configured worker count stays
/// the same. A pipeline can serve concurrent `protect` calls; they share
/// only the pool.
///
/// [`with_pool`]: ProtectionPipeline::with_pool
pub struct ProtectionPipeline {
    injected_pool: Option<Arc<ThreadPool>>,
    cached_pool: Mutex<Option<(usize, Arc<ThreadPool>)>>,
    entropy: Box<dyn EntropySource>,
    spatial: SpatialNoiseEngine,
    gradient_sign: GradientSignNoise,
    restorer: StatisticsRestorer,
}

impl ProtectionPipeline {
    /// Creates a pipeline seeding unseeded runs from the operating system.
    pub fn new() -> Self {
        Self {
            injected_pool: None,
            cached_pool: Mutex::new(None),
            entropy: Box::new(OsEntropy),
            spatial: SpatialNoiseEngine::new(),
            gradient_sign: GradientSignNoise::default(),
            restorer: StatisticsRestorer::new(),
        }
    }

    /// Uses `pool` for every frequency stage instead of building one.
    pub fn with_pool(mut self, pool: Arc<ThreadPool>) -> Self {
        self.injected_pool = Some(pool);
        self
    }

    /// Replaces the entropy source used when the config has no seed.
    pub fn with_entropy(mut self, entropy: impl EntropySource + 'static) -> Self {
        self.entropy = Box::new(entropy);
        self
    }

    /// Uses a custom spatial engine for the adaptive and semantic stages.
    pub fn with_spatial(mut self, spatial: SpatialNoiseEngine) -> Self {
        self.spatial = spatial;
        self
    }

    /// Protects `input` according to `config`.
    ///
    /// `input` is never modified. On error nothing is returned but the
    /// error; there is no partial output.
    pub fn protect(&self, input: &PixelBuffer, config: &NoiseConfig) -> Result<PixelBuffer> {
        self.protect_with_report(input, config).map(|(out, _)| out)
    }

    /// Like [`protect`](Self::protect), also returning timings and a quality report.
    pub fn protect_with_report(
        &self,
        input: &PixelBuffer,
        config: &NoiseConfig,
    ) -> Result<(PixelBuffer, ProtectionReport)> {
        let started = Instant::now();

        config.validate()?;
        let stages = config.strategy.stages();
        let watermark = if stages.contains(&Stage::Watermark) {
            resolve_watermark(input, config)?
        } else {
            None
        };

        let root = match config.seed {
            Some(seed) => NoiseRng::from_seed(seed),
            None => NoiseRng::from_source(self.entropy.as_ref()),
        };

        let mut current = input.clone();
        let mut timings = Vec::with_capacity(stages.len());
        let mut frequency_blocks = 0;

        for (position, &stage) in stages.iter().enumerate() {
            let stage_started = Instant::now();
            let rng = root.child(stage.name(), position as u64);

            let next = match stage {
                Stage::Watermark => match &watermark {
                    Some(plane) => Some(WatermarkEmbedder::embed(&current, plane)?),
                    None => {
                        tracing::warn!(position, "No watermark payload configured, skipping stage");
                        None
                    }
                },
                Stage::AdaptiveNoise => Some(self.spatial.apply(
                    &current,
                    SpatialMode::Adaptive,
                    config.intensity,
                    &mut rng.stream("pixels", 0),
                )?),
                Stage::SemanticNoise => Some(self.spatial.apply(
                    &current,
                    SpatialMode::Semantic,
                    config.intensity,
                    &mut rng.stream("pixels", 0),
                )?),
                Stage::FrequencyNoise => {
                    let engine = frequency_engine(config);
                    let pool = self.pool(config.workers)?;
                    frequency_blocks += engine.workers().min(current.height());
                    Some(engine.apply(&current, &rng, &pool)?)
                }
                Stage::CryptographicNoise => Some(
                    CryptographicNoiseGenerator::new(config.digest).apply(&current, config.intensity)?,
                ),
                Stage::GradientSign => Some(self.gradient_sign.apply(&current)?),
                Stage::HiddenToken => Some(mark_hidden_token(&current, &rng)),
                Stage::ContentIdentifier => Some(mark_content_identifier(&current, config)),
                Stage::RestoreStatistics => Some(self.restorer.restore(input, &current)?),
            };

            if let Some(next) = next {
                current = next;
                let elapsed = stage_started.elapsed();
                tracing::debug!(stage = stage.name(), position, ?elapsed, "Stage complete");
                timings.push(StageTiming { stage, elapsed });
            }
        }

        let quality = QualityReport::compare(input, &current)?;
        let report = ProtectionReport {
            strategy: config.strategy.to_string(),
            stages: timings,
            elapsed: started.elapsed(),
            frequency_blocks,
            quality,
        };

        tracing::info!(
            strategy = %report.strategy,
            height = input.height(),
            width = input.width(),
            channels = input.channels(),
            stages = report.stages.len(),
            psnr_db = report.quality.psnr_db,
            elapsed = ?report.elapsed,
            "Protection complete"
        );

        Ok((current, report))
    }

    fn pool(&self, workers: usize) -> Result<Arc<ThreadPool>> {
        if let Some(pool) = &self.injected_pool {
            return Ok(Arc::clone(pool));
        }

        let mut cached = self
            .cached_pool
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if let Some((size, pool)) = cached.as_ref() {
            if *size == workers {
                return Ok(Arc::clone(pool));
            }
        }

        let pool = ThreadPoolBuilder::new()
            .num_threads(workers)
            .thread_name(|i| format!("glaze-frequency-{i}"))
            .build()
            .map_err(|e| ConfigError::PoolBuild(e.to_string()))?;
        let pool = Arc::new(pool);
        tracing::debug!(workers, "Built frequency worker pool");
        *cached = Some((workers, Arc::clone(&pool)));
        Ok(pool)
    }
}

impl Default for ProtectionPipeline {
    fn default() -> Self {
        Self::new()
    }
}

fn frequency_engine(config: &NoiseConfig) -> FrequencyNoiseEngine {
    let engine = match config.frequency_variant {
        FrequencyVariant::BandAdditive => FrequencyNoiseEngine::band_additive(config.bands),
        FrequencyVariant::Multiplicative => FrequencyNoiseEngine::multiplicative(config.intensity),
    };
    engine.with_workers(config.workers)
}

fn mark_hidden_token(current: &PixelBuffer, rng: &NoiseRng) -> PixelBuffer {
    let mut raw = [0u8; TOKEN_BYTES];
    rng.stream("token", 0).fill_bytes(&mut raw);
    let token = URL_SAFE_NO_PAD.encode(raw);
    LatticeMarker::new(HIDDEN_TOKEN_STRIDE).apply(current, token.as_bytes())
}

fn mark_content_identifier(current: &PixelBuffer, config: &NoiseConfig) -> PixelBuffer {
    let hex = ContentDigest::of(current.as_bytes(), config.digest).to_hex();
    let identifier = &hex[..IDENTIFIER_HEX_LEN];
    tracing::debug!(identifier, "Marking content identifier");
    LatticeMarker::new(IDENTIFIER_STRIDE).apply(current, identifier.as_bytes())
}

/// Builds the watermark plane before any stage runs, so a mismatched
/// plane fails the request without doing any work.
fn resolve_watermark(input: &PixelBuffer, config: &NoiseConfig) -> Result<Option<WatermarkPlane>> {
    match &config.watermark {
        Some(WatermarkPayload::Text(text)) => Ok(Some(WatermarkPlane::from_text(
            text,
            input.height(),
            input.width(),
        )?)),
        Some(WatermarkPayload::Plane(plane)) => {
            input.ensure_same_dimensions(plane.height(), plane.width())?;
            Ok(Some(plane.clone()))
        }
        None => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ProtectError, ShapeError};
    use crate::pipeline::Strategy;
    use crate::rng::FixedEntropy;

    fn textured() -> PixelBuffer {
        PixelBuffer::from_fn(32, 24, 3, |r, c, ch| ((r * 7 + c * 5 + ch * 60) % 200 + 20) as u8).unwrap()
    }

    fn seeded(strategy: Strategy, seed: u64) -> NoiseConfig {
        NoiseConfig {
            seed: Some(seed),
            ..NoiseConfig::with_strategy(strategy)
        }
    }

    #[test]
    fn test_seeded_runs_repeat() {
        let pipeline = ProtectionPipeline::new();
        let buffer = textured();
        let config = seeded(Strategy::AdaptiveMultifrequency, 9);

        let a = pipeline.protect(&buffer, &config).unwrap();
        let b = pipeline.protect(&buffer, &config).unwrap();
        assert_eq!(a, b);

        let c = pipeline.protect(&buffer, &seeded(Strategy::AdaptiveMultifrequency, 10)).unwrap();
        assert_ne!(a, c);
    }

    #[test]
    fn test_unseeded_runs_use_injected_entropy() {
        let pipeline = ProtectionPipeline::new().with_entropy(FixedEntropy([3; 32]));
        let buffer = textured();
        let config = NoiseConfig::with_strategy(Strategy::DctOnly);

        let a = pipeline.protect(&buffer, &config).unwrap();
        let b = pipeline.protect(&buffer, &config).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_invalid_config_fails_before_work() {
        let pipeline = ProtectionPipeline::new();
        let config = NoiseConfig {
            workers: 17,
            ..Default::default()
        };
        assert!(matches!(
            pipeline.protect(&textured(), &config),
            Err(ProtectError::Config(ConfigError::InvalidWorkers(17)))
        ));
    }

    #[test]
    fn test_mismatched_watermark_plane_rejected() {
        let pipeline = ProtectionPipeline::new();
        let plane = WatermarkPlane::from_fn(4, 4, |r, c| r == c).unwrap();
        let config = NoiseConfig {
            watermark: Some(WatermarkPayload::Plane(plane)),
            ..seeded(Strategy::FullChain, 1)
        };
        assert!(matches!(
            pipeline.protect(&textured(), &config),
            Err(ProtectError::Shape(ShapeError::Mismatch { .. }))
        ));
    }

    #[test]
    fn test_missing_payload_skips_watermark() {
        let pipeline = ProtectionPipeline::new();
        let (_, report) = pipeline
            .protect_with_report(&textured(), &seeded(Strategy::FullChain, 2))
            .unwrap();

        let ran: Vec<_> = report.stages.iter().map(|t| t.stage).collect();
        assert_eq!(
            ran,
            vec![
                Stage::AdaptiveNoise,
                Stage::SemanticNoise,
                Stage::FrequencyNoise,
                Stage::RestoreStatistics
            ]
        );
        assert_eq!(report.frequency_blocks, 4);
        assert_eq!(report.strategy, "full-chain");
    }

    #[test]
    fn test_text_watermark_survives_when_last() {
        let pipeline = ProtectionPipeline::new();
        let buffer = textured();
        let config = NoiseConfig {
            watermark: Some(WatermarkPayload::Text("mine".into())),
            ..seeded(
                Strategy::Custom(vec![Stage::AdaptiveNoise, Stage::Watermark]),
                3,
            )
        };

        let out = pipeline.protect(&buffer, &config).unwrap();
        let expected = WatermarkPlane::from_text("mine", buffer.height(), buffer.width()).unwrap();
        assert_eq!(WatermarkEmbedder::extract(&out).unwrap(), expected);
    }

    #[test]
    fn test_cryptographic_strategy_is_content_bound() {
        let pipeline = ProtectionPipeline::new();
        let buffer = textured();
        let config = seeded(Strategy::Cryptographic, 4);

        let a = pipeline.protect(&buffer, &config).unwrap();
        let b = pipeline.protect(&buffer, &config).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.shape(), buffer.shape());
        assert_ne!(a, buffer);
    }

    #[test]
    fn test_injected_pool_is_used() {
        let pool = Arc::new(ThreadPoolBuilder::new().num_threads(2).build().unwrap());
        let pipeline = ProtectionPipeline::new().with_pool(Arc::clone(&pool));
        let buffer = textured();
        let config = seeded(Strategy::DctOnly, 5);

        let injected = pipeline.protect(&buffer, &config).unwrap();
        let built = ProtectionPipeline::new().protect(&buffer, &config).unwrap();
        // Block streams do not depend on the pool size.
        assert_eq!(injected, built);
    }

    #[test]
    fn test_every_stage_runs_alone() {
        let pipeline = ProtectionPipeline::new();
        let buffer = textured();

        for stage in Stage::ALL {
            let config = NoiseConfig {
                watermark: Some(WatermarkPayload::Text("glaze".into())),
                workers: 2,
                ..seeded(Strategy::Custom(vec![stage]), 13)
            };
            let (out, report) = pipeline.protect_with_report(&buffer, &config).unwrap();

            assert_eq!(out.shape(), buffer.shape(), "{stage}");
            let ran: Vec<_> = report.stages.iter().map(|t| t.stage).collect();
            assert_eq!(ran, vec![stage]);
        }
    }

    #[test]
    fn test_input_untouched() {
        let pipeline = ProtectionPipeline::new();
        let buffer = textured();
        let copy = buffer.clone();
        let _ = pipeline.protect(&buffer, &seeded(Strategy::FullChain, 6)).unwrap();
        assert_eq!(buffer, copy);
    }
}
