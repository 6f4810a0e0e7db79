//! Prometheus metrics for protection runs.
//!
//! # Metrics Exposed
//!
//! ## Counters
//! - `glaze_noise_protections_total` - Successful protections
//! - `glaze_noise_failures_total` - Failed protections
//! - `glaze_noise_frequency_blocks_total` - Row-blocks processed by frequency stages
//!
//! ## Last-run gauges
//! - `glaze_noise_last_psnr_db` - PSNR of the last output against its input
//! - `glaze_noise_last_max_abs_diff` - Largest sample change in the last run
//! - `glaze_noise_last_mean_shift` - Largest per-channel mean shift in the last run
//! - `glaze_noise_last_duration_seconds` - Wall time of the last run
//!
//! The CLI writes the text exposition to a file after a batch; nothing
//! here opens a socket.
//!
//! # Example
//!
//! ```
//! use glaze_noise::metrics::{MetricsRegistry, MetricsSnapshot};
//!
//! let registry = MetricsRegistry::new().unwrap();
//! registry.update(&MetricsSnapshot {
//!     protections: 3,
//!     failures: 1,
//!     frequency_blocks: 12,
//!     last_psnr_db: Some(41.2),
//!     last_max_abs_diff: Some(6),
//!     last_mean_shift: Some(0.3),
//!     last_duration_seconds: Some(0.05),
//! });
//! assert!(registry.encode().unwrap().contains("glaze_noise_protections_total 3"));
//! ```

mod collector;

pub use collector::{MetricsError, MetricsRegistry, MetricsSnapshot};
