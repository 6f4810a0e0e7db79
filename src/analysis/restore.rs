//! Color statistics restoration.
//!
//! Noise stages shift channel means and widen their spread. Restoring
//! renormalizes each channel of the perturbed buffer to the mean and
//! population standard deviation of the original:
//!
//! ```text
//! out = (p - mean_p) / (std_p + eps) * std_o + mean_o
//! ```

use super::statistics::ChannelStats;
use crate::buffer::PixelBuffer;
use crate::error::Result;

const STAGE: &str = "restore-statistics";

/// Keeps the division finite for constant channels.
pub const RESTORE_EPSILON: f64 = 1e-8;

/// Renormalizes per-channel mean and standard deviation.
#[derive(Debug, Clone, Copy)]
pub struct StatisticsRestorer {
    epsilon: f64,
}

impl StatisticsRestorer {
    /// Creates a restorer with the default division guard.
    pub fn new() -> Self {
        Self {
            epsilon: RESTORE_EPSILON,
        }
    }

    /// Matches `perturbed`'s channel statistics to `original`'s.
    ///
    /// When the two buffers are equal the result equals `original`: the
    /// epsilon error stays far below half a unit and is rounded away.
    pub fn restore(&self, original: &PixelBuffer, perturbed: &PixelBuffer) -> Result<PixelBuffer> {
        original.ensure_same_shape(perturbed)?;

        let target = ChannelStats::per_channel(original);
        let current = ChannelStats::per_channel(perturbed);
        let channels = perturbed.channels();
        let mut work = perturbed.to_float();

        for px in work.as_mut_slice().chunks_exact_mut(channels) {
            for (ch, sample) in px.iter_mut().enumerate() {
                let (o, p) = (target[ch], current[ch]);
                *sample = (*sample - p.mean) / (p.std + self.epsilon) * o.std + o.mean;
            }
        }

        tracing::debug!(
            channels,
            shift = ?target
                .iter()
                .zip(&current)
                .map(|(o, p)| o.mean - p.mean)
                .collect::<Vec<_>>(),
            "Restored channel statistics"
        );

        work.narrow(STAGE)
    }
}

impl Default for StatisticsRestorer {
    fn default() -> Self {
        Self::new()
    }
}
