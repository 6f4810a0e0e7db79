//! Explicit randomness for the Gaussian noise stages.
//!
//! No stage touches ambient global randomness. Each run has one root
//! [`NoiseRng`], seeded from the configuration or from an injected
//! [`EntropySource`], and every draw comes from a stream derived from it.

mod stream;

pub use stream::{EntropySource, FixedEntropy, NoiseRng, OsEntropy};

use rand::Rng;
use rand_distr::{Distribution, StandardNormal};

/// Draws one standard normal sample.
#[inline]
pub fn gaussian<R: Rng + ?Sized>(rng: &mut R) -> f64 {
    StandardNormal.sample(rng)
}
