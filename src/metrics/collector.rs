//! Metrics collection and registry.

use crate::pipeline::ProtectionReport;
use prometheus::{Encoder, Gauge, IntCounter, IntGauge, Registry, TextEncoder};
use thiserror::Error;

/// Errors that can occur during metrics operations.
#[derive(Debug, Error)]
pub enum MetricsError {
    /// Registration or encoding failed.
    #[error("prometheus error: {0}")]
    Prometheus(#[from] prometheus::Error),
}

/// Running totals and last-run values for a batch of protections.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MetricsSnapshot {
    /// Successful protections so far.
    pub protections: u64,
    /// Failed protections so far.
    pub failures: u64,
    /// Frequency row-blocks processed so far.
    pub frequency_blocks: u64,
    /// PSNR of the last successful run.
    pub last_psnr_db: Option<f64>,
    /// Largest sample change in the last successful run.
    pub last_max_abs_diff: Option<u8>,
    /// Largest per-channel mean shift in the last successful run.
    pub last_mean_shift: Option<f64>,
    /// Wall time of the last successful run.
    pub last_duration_seconds: Option<f64>,
}

impl MetricsSnapshot {
    /// Folds a successful run into the snapshot.
    pub fn record(&mut self, report: &ProtectionReport) {
        self.protections += 1;
        self.frequency_blocks += report.frequency_blocks as u64;
        self.last_psnr_db = Some(report.quality.psnr_db);
        self.last_max_abs_diff = Some(report.quality.max_abs_diff);
        self.last_mean_shift = Some(report.quality.max_mean_shift());
        self.last_duration_seconds = Some(report.elapsed.as_secs_f64());
    }

    /// Counts a failed run.
    pub fn record_failure(&mut self) {
        self.failures += 1;
    }
}

/// Prometheus metrics registry for protection runs.
pub struct MetricsRegistry {
    registry: Registry,

    protections_total: IntCounter,
    failures_total: IntCounter,
    frequency_blocks_total: IntCounter,

    last_psnr_db: Gauge,
    last_max_abs_diff: IntGauge,
    last_mean_shift: Gauge,
    last_duration_seconds: Gauge,
}

impl MetricsRegistry {
    /// Creates a registry with every metric registered.
    pub fn new() -> Result<Self, MetricsError> {
        let registry = Registry::new();

        let protections_total = IntCounter::new(
            "glaze_noise_protections_total",
            "Total number of successful protections",
        )?;
        let failures_total = IntCounter::new(
            "glaze_noise_failures_total",
            "Total number of failed protections",
        )?;
        let frequency_blocks_total = IntCounter::new(
            "glaze_noise_frequency_blocks_total",
            "Total row-blocks processed by frequency stages",
        )?;

        let last_psnr_db = Gauge::new(
            "glaze_noise_last_psnr_db",
            "PSNR in dB of the last output against its input",
        )?;
        let last_max_abs_diff = IntGauge::new(
            "glaze_noise_last_max_abs_diff",
            "Largest absolute sample difference in the last run",
        )?;
        let last_mean_shift = Gauge::new(
            "glaze_noise_last_mean_shift",
            "Largest absolute per-channel mean shift in the last run",
        )?;
        let last_duration_seconds = Gauge::new(
            "glaze_noise_last_duration_seconds",
            "Wall time of the last run in seconds",
        )?;

        registry.register(Box::new(protections_total.clone()))?;
        registry.register(Box::new(failures_total.clone()))?;
        registry.register(Box::new(frequency_blocks_total.clone()))?;
        registry.register(Box::new(last_psnr_db.clone()))?;
        registry.register(Box::new(last_max_abs_diff.clone()))?;
        registry.register(Box::new(last_mean_shift.clone()))?;
        registry.register(Box::new(last_duration_seconds.clone()))?;

        Ok(Self {
            registry,
            protections_total,
            failures_total,
            frequency_blocks_total,
            last_psnr_db,
            last_max_abs_diff,
            last_mean_shift,
            last_duration_seconds,
        })
    }

    /// Updates all metrics from a snapshot.
    pub fn update(&self, snapshot: &MetricsSnapshot) {
        // Counters only move forward, by the difference to the snapshot.
        advance(&self.protections_total, snapshot.protections);
        advance(&self.failures_total, snapshot.failures);
        advance(&self.frequency_blocks_total, snapshot.frequency_blocks);

        if let Some(psnr) = snapshot.last_psnr_db {
            self.last_psnr_db.set(psnr);
        }
        if let Some(diff) = snapshot.last_max_abs_diff {
            self.last_max_abs_diff.set(i64::from(diff));
        }
        if let Some(shift) = snapshot.last_mean_shift {
            self.last_mean_shift.set(shift);
        }
        if let Some(secs) = snapshot.last_duration_seconds {
            self.last_duration_seconds.set(secs);
        }
    }

    /// Returns the underlying Prometheus registry.
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Encodes all metrics in Prometheus text format.
    pub fn encode(&self) -> Result<String, MetricsError> {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        encoder.encode(&metric_families, &mut buffer)?;
        Ok(String::from_utf8_lossy(&buffer).into_owned())
    }
}

fn advance(counter: &IntCounter, target: u64) {
    let current = counter.get();
    if target > current {
        counter.inc_by(target - current);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::QualityReport;
    use crate::buffer::PixelBuffer;
    use std::time::Duration;

    fn report() -> ProtectionReport {
        let a = PixelBuffer::filled(4, 4, 3, 100).unwrap();
        let b = PixelBuffer::filled(4, 4, 3, 104).unwrap();
        ProtectionReport {
            strategy: "dct-only".into(),
            stages: Vec::new(),
            elapsed: Duration::from_millis(250),
            frequency_blocks: 4,
            quality: QualityReport::compare(&a, &b).unwrap(),
        }
    }

    #[test]
    fn test_registry_creation() {
        assert!(MetricsRegistry::new().is_ok());
    }

    #[test]
    fn test_snapshot_records_reports() {
        let mut snapshot = MetricsSnapshot::default();
        snapshot.record(&report());
        snapshot.record(&report());
        snapshot.record_failure();

        assert_eq!(snapshot.protections, 2);
        assert_eq!(snapshot.failures, 1);
        assert_eq!(snapshot.frequency_blocks, 8);
        assert_eq!(snapshot.last_max_abs_diff, Some(4));
        assert_eq!(snapshot.last_mean_shift, Some(4.0));
        assert_eq!(snapshot.last_duration_seconds, Some(0.25));
    }

    #[test]
    fn test_metrics_update() {
        let registry = MetricsRegistry::new().unwrap();
        let mut snapshot = MetricsSnapshot::default();
        snapshot.record(&report());
        registry.update(&snapshot);

        let output = registry.encode().unwrap();
        assert!(output.contains("glaze_noise_protections_total 1"));
        assert!(output.contains("glaze_noise_frequency_blocks_total 4"));
        assert!(output.contains("glaze_noise_last_max_abs_diff 4"));
    }

    #[test]
    fn test_counters_never_go_backwards() {
        let registry = MetricsRegistry::new().unwrap();
        registry.update(&MetricsSnapshot {
            protections: 5,
            ..Default::default()
        });
        registry.update(&MetricsSnapshot {
            protections: 2,
            ..Default::default()
        });

        let output = registry.encode().unwrap();
        assert!(output.contains("glaze_noise_protections_total 5"));
    }

    #[test]
    fn test_metrics_encode() {
        let registry = MetricsRegistry::new().unwrap();
        let output = registry.encode().unwrap();

        assert!(output.contains("glaze_noise_failures_total"));
        assert!(output.contains("glaze_noise_last_psnr_db"));
    }
}
