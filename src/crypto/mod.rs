//! Cryptographic digests and digest-derived noise.
//!
//! Uses standard 256-bit hash functions to bind a perturbation to the
//! exact bytes of an image.

mod digest;
mod noise;

pub use digest::{ContentDigest, HashAlgorithm};
pub use noise::CryptographicNoiseGenerator;
