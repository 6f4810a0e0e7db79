//! Glaze Noise Library
//!
//! Structured, low-visibility perturbation of raster images. The noise
//! degrades what style-copying and fine-tuning models extract from an
//! image while keeping it visually acceptable. Best effort only: none of
//! this is steganalysis-resistant or robust against adaptive attackers.
//!
//! # Architecture
//!
//! Every stage takes a [`PixelBuffer`] and returns a new one:
//!
//! ```text
//! watermark → adaptive/semantic noise → frequency noise → restore statistics
//!                                            ↓
//!                                  row-blocks on a worker pool
//! ```
//!
//! # Design Principles
//!
//! - **Borrowed input**: the caller's buffer is never modified
//! - **Fail fast**: configuration and dimensions are validated before any stage
//! - **Explicit randomness**: every draw comes from a stream derived from the run seed
//! - **Injected capabilities**: thread pool and entropy source are passed in
//!
//! # Example
//!
//! ```
//! use glaze_noise::{NoiseConfig, PixelBuffer, ProtectionPipeline, Strategy};
//!
//! let image = PixelBuffer::from_fn(32, 32, 3, |r, c, _| (r * 4 + c * 3) as u8).unwrap();
//! let config = NoiseConfig {
//!     seed: Some(42),
//!     ..NoiseConfig::with_strategy(Strategy::FullChain)
//! };
//!
//! let pipeline = ProtectionPipeline::new();
//! let protected = pipeline.protect(&image, &config).unwrap();
//! assert_eq!(protected.shape(), image.shape());
//! ```

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]
#![deny(unsafe_code)]

pub mod analysis;
pub mod buffer;
pub mod color;
pub mod config;
pub mod crypto;
pub mod error;
pub mod frequency;
pub mod metrics;
pub mod pipeline;
pub mod rng;
pub mod spatial;
pub mod stego;

// Re-export commonly used types at crate root
pub use analysis::{QualityReport, StatisticsRestorer};
pub use buffer::{FloatBuffer, PixelBuffer};
pub use color::ColorSpaceConverter;
pub use config::{ConfigError, FileConfig, FrequencyVariant, IntensityBands, NoiseConfig, WatermarkPayload};
pub use crypto::{CryptographicNoiseGenerator, HashAlgorithm};
pub use error::{ProtectError, Result, ShapeError};
pub use frequency::FrequencyNoiseEngine;
pub use pipeline::{ProtectionPipeline, ProtectionReport, Stage, Strategy};
pub use spatial::SpatialNoiseEngine;
pub use stego::{WatermarkEmbedder, WatermarkPlane};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
