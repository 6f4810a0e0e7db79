//! Fidelity of a protected buffer against its original.

use super::statistics::ChannelStats;
use crate::buffer::PixelBuffer;
use crate::error::ShapeError;

/// Distortion summary between an original and a protected buffer.
#[derive(Debug, Clone, PartialEq)]
pub struct QualityReport {
    /// Peak signal-to-noise ratio in dB; infinite for identical buffers.
    pub psnr_db: f64,
    /// Largest absolute sample difference.
    pub max_abs_diff: u8,
    /// Mean absolute sample difference.
    pub mean_abs_diff: f64,
    /// Protected minus original mean, per channel.
    pub channel_mean_shift: Vec<f64>,
}

impl QualityReport {
    /// Compares two buffers of identical shape.
    pub fn compare(original: &PixelBuffer, protected: &PixelBuffer) -> Result<Self, ShapeError> {
        original.ensure_same_shape(protected)?;

        let mut max_abs_diff = 0u8;
        let mut abs_sum = 0.0;
        let mut sq_sum = 0.0;
        for (&a, &b) in original.as_bytes().iter().zip(protected.as_bytes()) {
            let d = a.abs_diff(b);
            max_abs_diff = max_abs_diff.max(d);
            abs_sum += f64::from(d);
            sq_sum += f64::from(d).powi(2);
        }

        let n = original.as_bytes().len() as f64;
        let mse = sq_sum / n;
        let psnr_db = if mse == 0.0 {
            f64::INFINITY
        } else {
            10.0 * (255.0f64.powi(2) / mse).log10()
        };

        let channel_mean_shift = ChannelStats::per_channel(original)
            .iter()
            .zip(ChannelStats::per_channel(protected))
            .map(|(o, p)| p.mean - o.mean)
            .collect();

        Ok(Self {
            psnr_db,
            max_abs_diff,
            mean_abs_diff: abs_sum / n,
            channel_mean_shift,
        })
    }

    /// Largest absolute per-channel mean shift.
    pub fn max_mean_shift(&self) -> f64 {
        self.channel_mean_shift
            .iter()
            .fold(0.0, |acc: f64, s| acc.max(s.abs()))
    }
}
