//! Channel statistics, restoration and quality reporting.
//!
//! These run on whole buffers after the noise stages. Restoration is a
//! pipeline stage; the quality report is diagnostics only and never
//! changes pixels.

mod quality;
mod restore;
mod statistics;

pub use quality::QualityReport;
pub use restore::{StatisticsRestorer, RESTORE_EPSILON};
pub use statistics::ChannelStats;
