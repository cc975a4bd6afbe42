//! imagemin - Batch Image Converter
//!
//! Walks a directory tree, downscales every qualifying image so that its
//! longer side fits a maximum dimension, and re-encodes it as WebP or JPEG.
//! HEIC sources are supported when built with the `heic` feature.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use imagemin::{BatchConverter, CodecRegistry, ConversionRequest, TargetFormat};
//!
//! let converter = BatchConverter::new(CodecRegistry::new()?);
//! let request = ConversionRequest::new("photos", "web", TargetFormat::WebP, 1600);
//!
//! let report = converter.convert(&request)?;
//! for outcome in &report.outcomes {
//!     println!("{}", outcome.message());
//! }
//! # Ok::<(), imagemin::ImageminError>(())
//! ```

#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod error;
pub mod processing;

// Re-export commonly used types
pub use config::{Config, ConversionRequest, EncodeSettings, OutputLayout, TargetFormat};
pub use error::{Result, ImageminError};
pub use processing::{BatchConverter, BatchReport, CodecRegistry, FileOutcome};

use tracing::{info, warn};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Initialize logging with `RUST_LOG` filtering and run startup checks
///
/// Safe to call more than once; only the first subscriber is installed.
pub fn init() -> Result<()> {
    if tracing::subscriber::set_global_default(
        tracing_subscriber::FmtSubscriber::builder()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_writer(std::io::stderr)
            .finish()
    ).is_ok() {
        info!("imagemin v{} initialized", VERSION);
    }

    validate_system_requirements();
    Ok(())
}

/// Initialize with custom configuration
///
/// `RUST_LOG` still wins over `logging.level` when it is set.
pub fn init_with_config(config: &Config) -> Result<()> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .or_else(|_| tracing_subscriber::EnvFilter::try_new(&config.logging.level))
        .map_err(|e| ImageminError::config(format!("Invalid log level '{}': {}", config.logging.level, e)))?;

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);

    let installed = if config.logging.json_format {
        tracing::subscriber::set_global_default(builder.json().finish()).is_ok()
    } else {
        tracing::subscriber::set_global_default(builder.finish()).is_ok()
    };

    if installed {
        info!("imagemin v{} initialized with custom config", VERSION);
    }

    validate_system_requirements();
    Ok(())
}

fn validate_system_requirements() {
    use sysinfo::{System, SystemExt};

    let mut system = System::new();
    system.refresh_memory();

    // One decoded image lives at a time; warn when that may not fit
    let available_memory = system.available_memory();
    const MIN_MEMORY_MB: u64 = 256;

    if available_memory < MIN_MEMORY_MB * 1024 * 1024 {
        warn!(
            "Low available memory: {}MB (recommended: >{}MB)",
            available_memory / (1024 * 1024),
            MIN_MEMORY_MB
        );
    }

    info!("Image format support:");
    info!("  JPEG: {}", image::ImageFormat::Jpeg.reading_enabled());
    info!("  PNG: {}", image::ImageFormat::Png.reading_enabled());
    info!("  WebP: {}", image::ImageFormat::WebP.reading_enabled());
    info!("  HEIC: {}", cfg!(feature = "heic"));
}
