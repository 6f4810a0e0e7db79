//! Content-bound pseudo-noise.
//!
//! The noise field is the 32-byte digest of the buffer repeated until it
//! covers every sample. Identical buffers always receive identical noise,
//! which ties the perturbation to the image itself rather than to an
//! external seed. Changing a single sample changes the digest and with it
//! the whole field.

use super::digest::{ContentDigest, HashAlgorithm};
use crate::buffer::{FloatBuffer, PixelBuffer};
use crate::config::check_amplitude;
use crate::error::Result;

const STAGE: &str = "cryptographic-noise";

/// Generates digest-derived noise in [-intensity, +intensity].
#[derive(Debug, Clone, Copy, Default)]
pub struct CryptographicNoiseGenerator {
    algorithm: HashAlgorithm,
}

impl CryptographicNoiseGenerator {
    /// Creates a generator hashing with `algorithm`.
    pub fn new(algorithm: HashAlgorithm) -> Self {
        Self { algorithm }
    }

    /// Returns the digest the noise is derived from.
    pub fn digest(&self, buffer: &PixelBuffer) -> ContentDigest {
        ContentDigest::of(buffer.as_bytes(), self.algorithm)
    }

    /// Generates the noise field for `buffer`.
    ///
    /// Each digest byte `b` maps to `(b / 255 - 0.5) * 2 * intensity`.
    pub fn generate(&self, buffer: &PixelBuffer, intensity: f64) -> Result<FloatBuffer> {
        check_amplitude("intensity", intensity)?;
        let digest = self.digest(buffer);
        let (height, width, channels) = buffer.shape();

        let noise = digest
            .as_bytes()
            .iter()
            .cycle()
            .take(height * width * channels)
            .map(|&b| (f64::from(b) / 255.0 - 0.5) * 2.0 * intensity)
            .collect();

        Ok(FloatBuffer::from_parts(noise, height, width, channels))
    }

    /// Adds the noise field to `buffer`, clipping back to 8-bit.
    pub fn apply(&self, buffer: &PixelBuffer, intensity: f64) -> Result<PixelBuffer> {
        let noise = self.generate(buffer, intensity)?;
        let mut work = buffer.to_float();
        work.add_assign(&noise)?;

        tracing::debug!(
            algorithm = ?self.algorithm,
            intensity,
            samples = noise.as_slice().len(),
            "Applied cryptographic noise"
        );

        work.narrow_truncating(STAGE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_buffer() -> PixelBuffer {
        PixelBuffer::from_fn(8, 8, 3, |r, c, ch| ((r * 31 + c * 7 + ch) % 256) as u8).unwrap()
    }

    #[test]
    fn test_generate_is_deterministic() {
        let generator = CryptographicNoiseGenerator::default();
        let buffer = sample_buffer();

        let a = generator.generate(&buffer, 0.5).unwrap();
        let b = generator.generate(&buffer, 0.5).unwrap();

        assert_eq!(a, b);
        assert_eq!(a.shape(), buffer.shape());
    }

    #[test]
    fn test_single_pixel_changes_whole_field() {
        let generator = CryptographicNoiseGenerator::default();
        let original = sample_buffer();
        let noise = generator.generate(&original, 1.0).unwrap();

        for (row, col) in [(0, 0), (3, 5), (7, 7)] {
            let mut mutated = original.clone();
            let v = mutated.get(row, col, 1);
            mutated.set(row, col, 1, v.wrapping_add(1));

            let other = generator.generate(&mutated, 1.0).unwrap();
            let differing = noise
                .as_slice()
                .iter()
                .zip(other.as_slice())
                .filter(|(a, b)| a != b)
                .count();

            // A fresh digest leaves only chance byte collisions (~1/256).
            assert!(differing > noise.as_slice().len() * 9 / 10);
        }
    }

    #[test]
    fn test_noise_is_bounded_and_periodic() {
        let generator = CryptographicNoiseGenerator::new(HashAlgorithm::Blake3);
        let noise = generator.generate(&sample_buffer(), 0.3).unwrap();
        let values = noise.as_slice();

        assert!(values.iter().all(|v| v.abs() <= 0.3 + 1e-12));
        assert_eq!(values[0], values[32]);
        assert_eq!(values[5], values[5 + 64]);
    }

    #[test]
    fn test_byte_mapping() {
        let generator = CryptographicNoiseGenerator::default();
        let buffer = sample_buffer();
        let digest = generator.digest(&buffer);
        let noise = generator.generate(&buffer, 1.0).unwrap();

        let expected = (f64::from(digest.as_bytes()[0]) / 255.0 - 0.5) * 2.0;
        assert_eq!(noise.as_slice()[0], expected);
    }

    #[test]
    fn test_apply_stays_close() {
        let generator = CryptographicNoiseGenerator::default();
        let buffer = sample_buffer();
        let out = generator.apply(&buffer, 1.0).unwrap();

        assert_eq!(out.shape(), buffer.shape());
        for (a, b) in buffer.as_bytes().iter().zip(out.as_bytes()) {
            assert!(a.abs_diff(*b) <= 1);
        }
    }

    #[test]
    fn test_negative_intensity_rejected() {
        let generator = CryptographicNoiseGenerator::default();
        assert!(generator.generate(&sample_buffer(), -1.0).is_err());
    }
}
