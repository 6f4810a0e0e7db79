//! Protection configuration.
//!
//! [`NoiseConfig`] is the per-request record every stage reads from;
//! [`FileConfig`] wraps it for TOML files consumed by the CLI adapter.

mod file;
mod noise;

pub use file::{FileConfig, OutputConfig};
pub(crate) use noise::check_amplitude;
pub use noise::{
    ConfigError, FrequencyVariant, IntensityBands, NoiseConfig, WatermarkPayload, MAX_WORKERS,
};
