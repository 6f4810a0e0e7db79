//! Glaze Noise CLI
//!
//! Decodes images, runs a protection strategy over each one, and writes
//! the results next to the inputs (or into `--output-dir`).

use clap::{Parser, ValueEnum};
use glaze_noise::{
    config::{ConfigError, FileConfig, FrequencyVariant, WatermarkPayload},
    crypto::HashAlgorithm,
    metrics::{MetricsError, MetricsRegistry, MetricsSnapshot},
    PixelBuffer, ProtectError, ProtectionPipeline, ShapeError, Strategy,
};
use image::{ColorType, DynamicImage};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{info, warn};

#[derive(Debug, Error)]
enum CliError {
    #[error("{0}")]
    Config(#[from] ConfigError),
    #[error("{0}")]
    Protect(#[from] ProtectError),
    #[error("{0}")]
    Shape(#[from] ShapeError),
    #[error("image codec error: {0}")]
    Image(#[from] image::ImageError),
    #[error("metrics error: {0}")]
    Metrics(#[from] MetricsError),
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
    #[error("{failed} of {total} images failed")]
    Batch { failed: usize, total: usize },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum VariantArg {
    BandAdditive,
    Multiplicative,
}

impl From<VariantArg> for FrequencyVariant {
    fn from(arg: VariantArg) -> Self {
        match arg {
            VariantArg::BandAdditive => FrequencyVariant::BandAdditive,
            VariantArg::Multiplicative => FrequencyVariant::Multiplicative,
        }
    }
}

/// Protect images against style copying with structured noise.
#[derive(Debug, Parser)]
#[command(name = "glaze-noise", version, about)]
struct Cli {
    /// Images to protect.
    #[arg(required = true)]
    inputs: Vec<PathBuf>,

    /// TOML configuration file; flags override its values.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Strategy name, or a comma-separated stage list.
    #[arg(short, long)]
    strategy: Option<Strategy>,

    /// Spatial, cryptographic and multiplicative intensity, in (0, 1].
    #[arg(long)]
    intensity: Option<f64>,

    /// Low-band DCT amplitude.
    #[arg(long)]
    low: Option<f64>,

    /// Mid-band DCT amplitude.
    #[arg(long)]
    mid: Option<f64>,

    /// High-band DCT amplitude.
    #[arg(long)]
    high: Option<f64>,

    /// Frequency worker threads (1-16).
    #[arg(short, long)]
    workers: Option<usize>,

    /// Seed for reproducible output.
    #[arg(long)]
    seed: Option<u64>,

    /// Digest for content-bound stages (sha256 or blake3).
    #[arg(long)]
    digest: Option<HashAlgorithm>,

    /// Text to embed in the luma bit plane.
    #[arg(long)]
    watermark_text: Option<String>,

    /// Frequency stage variant.
    #[arg(long, value_enum)]
    variant: Option<VariantArg>,

    /// Suffix replacing each input's extension.
    #[arg(long)]
    suffix: Option<String>,

    /// Directory for outputs instead of each input's own directory.
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Write Prometheus text metrics here after the batch.
    #[arg(long)]
    metrics_out: Option<PathBuf>,
}

impl Cli {
    fn resolve_config(&self) -> Result<FileConfig, ConfigError> {
        let mut file = match &self.config {
            Some(path) => FileConfig::from_file(path)?,
            None => FileConfig::default(),
        };

        let noise = &mut file.noise;
        if let Some(strategy) = &self.strategy {
            noise.strategy = strategy.clone();
        }
        if let Some(intensity) = self.intensity {
            noise.intensity = intensity;
        }
        if let Some(low) = self.low {
            noise.bands.low = low;
        }
        if let Some(mid) = self.mid {
            noise.bands.mid = mid;
        }
        if let Some(high) = self.high {
            noise.bands.high = high;
        }
        if let Some(workers) = self.workers {
            noise.workers = workers;
        }
        if self.seed.is_some() {
            noise.seed = self.seed;
        }
        if let Some(digest) = self.digest {
            noise.digest = digest;
        }
        if let Some(text) = &self.watermark_text {
            noise.watermark = Some(WatermarkPayload::Text(text.clone()));
        }
        if let Some(variant) = self.variant {
            noise.frequency_variant = variant.into();
        }
        if let Some(suffix) = &self.suffix {
            file.output.suffix = suffix.clone();
        }
        if let Some(path) = &self.metrics_out {
            file.output.metrics_path = Some(path.clone());
        }

        file.noise.validate()?;
        Ok(file)
    }

    fn output_path(&self, input: &Path, suffix: &str) -> PathBuf {
        let stem = input
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "image".to_string());
        let dir = match &self.output_dir {
            Some(dir) => dir.clone(),
            None => input.parent().map(Path::to_path_buf).unwrap_or_default(),
        };
        dir.join(format!("{stem}{suffix}"))
    }
}

fn main() {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(&cli) {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

fn run(cli: &Cli) -> Result<(), CliError> {
    let config = cli.resolve_config()?;
    info!(
        "Glaze Noise v{} (strategy: {})",
        glaze_noise::VERSION,
        config.noise.strategy
    );

    let pipeline = ProtectionPipeline::new();
    let mut snapshot = MetricsSnapshot::default();

    for input in &cli.inputs {
        let output = cli.output_path(input, &config.output.suffix);
        match protect_file(&pipeline, input, &output, &config) {
            Ok(report) => {
                info!(
                    input = %input.display(),
                    output = %output.display(),
                    psnr_db = report.quality.psnr_db,
                    max_abs_diff = report.quality.max_abs_diff,
                    "Protected image"
                );
                snapshot.record(&report);
            }
            Err(e) => {
                warn!(input = %input.display(), error = %e, "Protection failed");
                snapshot.record_failure();
            }
        }
    }

    if let Some(path) = &config.output.metrics_path {
        let registry = MetricsRegistry::new()?;
        registry.update(&snapshot);
        std::fs::write(path, registry.encode()?)?;
        info!(path = %path.display(), "Wrote metrics");
    }

    if snapshot.failures > 0 {
        return Err(CliError::Batch {
            failed: snapshot.failures as usize,
            total: cli.inputs.len(),
        });
    }
    Ok(())
}

fn protect_file(
    pipeline: &ProtectionPipeline,
    input: &Path,
    output: &Path,
    config: &FileConfig,
) -> Result<glaze_noise::ProtectionReport, CliError> {
    let buffer = load(input)?;
    let (protected, report) = pipeline.protect_with_report(&buffer, &config.noise)?;
    save(&protected, output)?;
    Ok(report)
}

fn load(path: &Path) -> Result<PixelBuffer, CliError> {
    let image = image::open(path)?;
    let (width, height) = (image.width() as usize, image.height() as usize);

    let (data, channels) = match image {
        DynamicImage::ImageLuma8(gray) => (gray.into_raw(), 1),
        DynamicImage::ImageRgb8(rgb) => (rgb.into_raw(), 3),
        DynamicImage::ImageRgba8(rgba) => (rgba.into_raw(), 4),
        other if other.color().has_alpha() => (other.to_rgba8().into_raw(), 4),
        other if other.color().has_color() => (other.to_rgb8().into_raw(), 3),
        other => (other.to_luma8().into_raw(), 1),
    };

    Ok(PixelBuffer::new(data, height, width, channels)?)
}

fn save(buffer: &PixelBuffer, path: &Path) -> Result<(), CliError> {
    let color = match buffer.channels() {
        1 => ColorType::L8,
        3 => ColorType::Rgb8,
        4 => ColorType::Rgba8,
        other => return Err(ShapeError::UnsupportedChannels(other).into()),
    };
    image::save_buffer(
        path,
        buffer.as_bytes(),
        buffer.width() as u32,
        buffer.height() as u32,
        color,
    )?;
    Ok(())
}
