//! ChaCha20 noise streams derived from one run seed.
//!
//! # Derivation Model
//!
//! Every stream is keyed by BLAKE3 over:
//! - A domain separator
//! - The parent seed material
//! - A label and an index
//!
//! A stage gets a child keyed by its name and position in the strategy,
//! and the frequency stage derives one stream per block from that child.
//! Streams never depend on which thread runs them or when, so a seeded
//! run is reproducible no matter how the worker pool schedules blocks.

use blake3::Hasher;
use rand_chacha::ChaCha20Rng;
use rand_core::{OsRng, RngCore, SeedableRng};

/// Domain separator for root seeds built from a `u64`.
const SEED_DOMAIN: &[u8] = b"glaze-noise-seed-v1";

/// Domain separator for child derivation.
const CHILD_DOMAIN: &[u8] = b"glaze-noise-child-v1";

/// Domain separator for stream derivation.
const STREAM_DOMAIN: &[u8] = b"glaze-noise-stream-v1";

/// Supplies root seed material for runs without an explicit seed.
///
/// Passed to the pipeline at construction so tests can substitute a
/// fixed source for the operating system.
pub trait EntropySource: Send + Sync {
    /// Returns 32 bytes of seed material.
    fn seed_material(&self) -> [u8; 32];
}

/// Seeds from the operating system.
#[derive(Debug, Default, Clone, Copy)]
pub struct OsEntropy;

impl EntropySource for OsEntropy {
    fn seed_material(&self) -> [u8; 32] {
        let mut seed = [0u8; 32];
        OsRng.fill_bytes(&mut seed);
        seed
    }
}

/// Returns the same material on every call.
#[derive(Debug, Clone, Copy)]
pub struct FixedEntropy(pub [u8; 32]);

impl EntropySource for FixedEntropy {
    fn seed_material(&self) -> [u8; 32] {
        self.0
    }
}

/// Root of a tree of deterministic noise streams.
#[derive(Clone)]
pub struct NoiseRng {
    material: [u8; 32],
}

impl NoiseRng {
    /// Creates a root from a user-facing `u64` seed.
    pub fn from_seed(seed: u64) -> Self {
        let mut hasher = Hasher::new();
        hasher.update(SEED_DOMAIN);
        hasher.update(&seed.to_le_bytes());
        Self {
            material: *hasher.finalize().as_bytes(),
        }
    }

    /// Creates a root from raw seed material.
    pub fn from_material(material: [u8; 32]) -> Self {
        Self { material }
    }

    /// Creates a root from an entropy source.
    pub fn from_source(source: &dyn EntropySource) -> Self {
        Self::from_material(source.seed_material())
    }

    /// Derives an independent child root.
    pub fn child(&self, label: &str, index: u64) -> NoiseRng {
        Self {
            material: self.derive(CHILD_DOMAIN, label, index),
        }
    }

    /// Derives a ChaCha20 stream.
    pub fn stream(&self, label: &str, index: u64) -> ChaCha20Rng {
        ChaCha20Rng::from_seed(self.derive(STREAM_DOMAIN, label, index))
    }

    fn derive(&self, domain: &[u8], label: &str, index: u64) -> [u8; 32] {
        // key = BLAKE3(domain || len(label) || label || index || material)
        let mut hasher = Hasher::new();
        hasher.update(domain);
        hasher.update(&(label.len() as u64).to_le_bytes());
        hasher.update(label.as_bytes());
        hasher.update(&index.to_le_bytes());
        hasher.update(&self.material);
        *hasher.finalize().as_bytes()
    }
}

impl std::fmt::Debug for NoiseRng {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NoiseRng").finish_non_exhaustive()
    }
}
