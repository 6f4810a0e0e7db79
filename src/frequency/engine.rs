//! Parallel block-wise DCT noise injection.

use super::block::{reassemble, split_rows, FrequencyBlock};
use super::dct::Dct2d;
use crate::buffer::PixelBuffer;
use crate::config::{check_amplitude, ConfigError, IntensityBands, MAX_WORKERS};
use crate::error::{ProtectError, Result};
use crate::rng::{gaussian, NoiseRng};
use rand::Rng;
use rayon::prelude::*;
use rayon::ThreadPool;
use rustdct::DctPlanner;

const STAGE: &str = "frequency-noise";

/// How coefficients of each block are perturbed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FrequencyPerturbation {
    /// Additive Gaussian noise with a per-band amplitude.
    Bands(IntensityBands),
    /// Coefficients beyond the first quarter of rows and columns are
    /// scaled by `1 + N(0, intensity)`.
    Multiplicative {
        /// Standard deviation of the scale jitter.
        intensity: f64,
    },
}

/// Splits an image into row-blocks and perturbs each in the DCT domain.
#[derive(Debug, Clone, Copy)]
pub struct FrequencyNoiseEngine {
    perturbation: FrequencyPerturbation,
    workers: usize,
}

impl FrequencyNoiseEngine {
    /// Additive band noise. A uniform band set gives the plain additive
    /// variant.
    pub fn band_additive(bands: IntensityBands) -> Self {
        Self {
            perturbation: FrequencyPerturbation::Bands(bands),
            workers: 1,
        }
    }

    /// Multiplicative high-frequency noise.
    pub fn multiplicative(intensity: f64) -> Self {
        Self {
            perturbation: FrequencyPerturbation::Multiplicative { intensity },
            workers: 1,
        }
    }

    /// Sets the number of row-blocks (and thus parallel jobs).
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers;
        self
    }

    /// Row-block count.
    #[inline]
    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Coefficient perturbation in use.
    #[inline]
    pub fn perturbation(&self) -> FrequencyPerturbation {
        self.perturbation
    }

    fn validate(&self) -> std::result::Result<(), ConfigError> {
        if self.workers == 0 || self.workers > MAX_WORKERS {
            return Err(ConfigError::InvalidWorkers(self.workers));
        }
        match self.perturbation {
            FrequencyPerturbation::Bands(bands) => {
                check_amplitude("low", bands.low)?;
                check_amplitude("mid", bands.mid)?;
                check_amplitude("high", bands.high)
            }
            FrequencyPerturbation::Multiplicative { intensity } => {
                check_amplitude("intensity", intensity)
            }
        }
    }

    /// Perturbs `buffer` on `pool`, blocking until every block is done.
    ///
    /// Block `i` draws from `rng.stream("block", i)`, so a seeded run gives
    /// the same output whatever order the pool finishes blocks in.
    pub fn apply(&self, buffer: &PixelBuffer, rng: &NoiseRng, pool: &ThreadPool) -> Result<PixelBuffer> {
        self.validate()?;
        let (height, width, channels) = buffer.shape();
        let color = buffer.color_channels();

        let blocks = split_rows(&buffer.to_float(), self.workers);
        let block_count = blocks.len();

        let processed = pool.install(|| {
            blocks
                .into_par_iter()
                .map(|block| self.perturb_block(block, color, rng))
                .collect::<Result<Vec<_>>>()
        })?;

        let work = reassemble(processed, height, width, channels)?;

        tracing::debug!(
            blocks = block_count,
            threads = pool.current_num_threads(),
            perturbation = ?self.perturbation,
            "Applied frequency noise"
        );

        work.narrow_truncating(STAGE)
    }

    /// Transforms, perturbs and inverse-transforms one block.
    pub fn perturb_block(
        &self,
        mut block: FrequencyBlock,
        color_channels: usize,
        rng: &NoiseRng,
    ) -> Result<FrequencyBlock> {
        let rows = block.rows();
        let width = block.data().width();
        let mut planner = DctPlanner::new();
        let dct = Dct2d::new(&mut planner, rows, width);
        let mut stream = rng.stream("block", block.index() as u64);

        for ch in 0..color_channels {
            let mut plane = block.data().channel_plane(ch);
            dct.forward(&mut plane);
            self.perturb_coefficients(&mut plane, rows, width, &mut stream);
            dct.inverse(&mut plane);

            if let Some(bad) = plane.iter().find(|v| !v.is_finite()) {
                return Err(ProtectError::stage(
                    STAGE,
                    format!("block {} channel {ch} produced {bad}", block.index()),
                ));
            }
            block.data_mut().write_channel_plane(ch, &plane);
        }

        tracing::trace!(block = block.index(), rows, "Perturbed frequency block");
        Ok(block)
    }

    fn perturb_coefficients<R: Rng + ?Sized>(
        &self,
        coefficients: &mut [f64],
        rows: usize,
        width: usize,
        rng: &mut R,
    ) {
        match self.perturbation {
            FrequencyPerturbation::Bands(bands) => {
                for i in 0..rows {
                    for j in 0..width {
                        let amplitude = if i < rows / 4 && j < width / 4 {
                            bands.low
                        } else if i < rows / 2 && j < width / 2 {
                            bands.mid
                        } else {
                            bands.high
                        };
                        coefficients[i * width + j] += gaussian(rng) * amplitude;
                    }
                }
            }
            FrequencyPerturbation::Multiplicative { intensity } => {
                for i in rows / 4..rows {
                    for j in width / 4..width {
                        coefficients[i * width + j] *= 1.0 + gaussian(rng) * intensity;
                    }
                }
            }
        }
    }
}
