//! Per-channel sample statistics.

use crate::buffer::PixelBuffer;

/// Mean and population standard deviation of one channel.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChannelStats {
    /// Arithmetic mean.
    pub mean: f64,
    /// Population standard deviation.
    pub std: f64,
}

impl ChannelStats {
    /// Computes statistics over an iterator of samples.
    ///
    /// An empty iterator yields zero mean and zero deviation.
    pub fn from_samples(samples: impl Iterator<Item = f64> + Clone) -> Self {
        let (count, sum) = samples
            .clone()
            .fold((0usize, 0.0), |(n, s), v| (n + 1, s + v));
        if count == 0 {
            return Self { mean: 0.0, std: 0.0 };
        }

        let n = count as f64;
        let mean = sum / n;
        let variance: f64 = samples.map(|v| (v - mean).powi(2)).sum::<f64>() / n;

        Self {
            mean,
            std: variance.sqrt(),
        }
    }

    /// Statistics of every channel of a pixel buffer.
    pub fn per_channel(buffer: &PixelBuffer) -> Vec<Self> {
        let channels = buffer.channels();
        (0..channels)
            .map(|ch| {
                Self::from_samples(
                    buffer
                        .as_bytes()
                        .iter()
                        .skip(ch)
                        .step_by(channels)
                        .map(|&v| f64::from(v)),
                )
            })
            .collect()
    }
}
