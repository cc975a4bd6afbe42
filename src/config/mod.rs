//! Configuration management for imagemin

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use serde::{Deserialize, Serialize};
use crate::error::{Result, ImageminError};

pub mod request;
pub use request::*;

/// Default longest side, in pixels
pub const DEFAULT_MAX_SIZE: u32 = 1600;

/// Default lossy quality for both targets
pub const DEFAULT_QUALITY: u8 = 85;

/// Highest-effort libwebp compression method
pub const DEFAULT_WEBP_METHOD: u8 = 6;

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Conversion defaults, overridden by CLI flags
    pub conversion: ConversionConfig,

    /// Logging configuration
    pub logging: LoggingConfig,
}

/// Conversion defaults
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ConversionConfig {
    /// Output format
    pub target: TargetFormat,

    /// Maximum width or height of the output
    pub max_size: u32,

    /// Lossy quality (1-100)
    pub quality: u8,

    /// libwebp method (0 = fast, 6 = slowest/smallest)
    pub webp_method: u8,

    /// Enable encoder-side optimization passes
    pub optimize: bool,

    /// Mirror source subdirectories in the destination
    pub preserve_structure: bool,
}

impl Default for ConversionConfig {
    fn default() -> Self {
        Self {
            target: TargetFormat::WebP,
            max_size: DEFAULT_MAX_SIZE,
            quality: DEFAULT_QUALITY,
            webp_method: DEFAULT_WEBP_METHOD,
            optimize: true,
            preserve_structure: false,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,

    /// Enable JSON logging
    pub json_format: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json_format: false,
        }
    }
}

/// Conversion target
///
/// The target decides both the output encoding and which source
/// extensions are picked up. A target never accepts its own output
/// extension, so re-running over a mixed tree does not re-convert outputs.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum TargetFormat {
    #[serde(rename = "webp")]
    WebP,
    #[serde(rename = "jpg", alias = "jpeg")]
    Jpeg,
}

impl TargetFormat {
    /// Source extensions (lowercase, with dot) that qualify for this target
    pub fn accepted_extensions(self) -> &'static [&'static str] {
        match self {
            Self::WebP => &[".jpg", ".jpeg", ".png", ".heic"],
            Self::Jpeg => &[".webp", ".heic"],
        }
    }

    /// Output file extension, without the dot
    pub fn extension(self) -> &'static str {
        match self {
            Self::WebP => "webp",
            Self::Jpeg => "jpg",
        }
    }

    /// Name used on the command line
    pub fn as_str(self) -> &'static str {
        self.extension()
    }

    pub fn accepts_heic(self) -> bool {
        self.accepted_extensions().contains(&".heic")
    }
}

impl Default for TargetFormat {
    fn default() -> Self {
        Self::WebP
    }
}

impl fmt::Display for TargetFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TargetFormat {
    type Err = ImageminError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "webp" => Ok(Self::WebP),
            "jpg" | "jpeg" => Ok(Self::Jpeg),
            _ => Err(ImageminError::invalid_conversion(s)),
        }
    }
}

impl Config {
    /// Load configuration from file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path)
            .map_err(|e| ImageminError::config(
                format!("Failed to read config file {:?}: {}", path.as_ref(), e)
            ))?;

        let extension = path.as_ref()
            .extension()
            .and_then(|ext| ext.to_str())
            .unwrap_or("");

        let config: Config = match extension.to_lowercase().as_str() {
            "toml" => toml::from_str(&content)?,
            "yaml" | "yml" => serde_yaml::from_str(&content)?,
            _ => return Err(ImageminError::config(
                "Unsupported config file format. Use .toml or .yaml"
            )),
        };

        config.validate()?;
        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        self.conversion.settings().validate()?;

        if self.conversion.max_size == 0 {
            return Err(ImageminError::config("max_size must be greater than 0"));
        }

        Ok(())
    }

    /// Build a conversion request for the given directories
    pub fn request(&self, source: impl Into<PathBuf>, destination: impl Into<PathBuf>) -> ConversionRequest {
        ConversionRequest::new(source, destination, self.conversion.target, self.conversion.max_size)
            .settings(self.conversion.settings())
            .layout(if self.conversion.preserve_structure {
                OutputLayout::Mirror
            } else {
                OutputLayout::Flat
            })
    }
}

impl ConversionConfig {
    /// Encoder settings described by this section
    pub fn settings(&self) -> EncodeSettings {
        EncodeSettings {
            quality: self.quality,
            webp_method: self.webp_method,
            optimize: self.optimize,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::Builder;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.conversion.target, TargetFormat::WebP);
        assert_eq!(config.conversion.max_size, 1600);
        assert_eq!(config.conversion.quality, 85);
        assert_eq!(config.conversion.webp_method, 6);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_target_format_parsing() {
        assert_eq!("webp".parse::<TargetFormat>().unwrap(), TargetFormat::WebP);
        assert_eq!("WEBP".parse::<TargetFormat>().unwrap(), TargetFormat::WebP);
        assert_eq!("jpg".parse::<TargetFormat>().unwrap(), TargetFormat::Jpeg);
        assert_eq!("Jpeg".parse::<TargetFormat>().unwrap(), TargetFormat::Jpeg);

        let err = "png".parse::<TargetFormat>().unwrap_err();
        assert!(matches!(err, ImageminError::InvalidConversion { .. }));
        assert!(err.is_fatal());
    }

    #[test]
    fn test_accepted_extensions_exclude_output() {
        for target in [TargetFormat::WebP, TargetFormat::Jpeg] {
            let own = format!(".{}", target.extension());
            assert!(!target.accepted_extensions().contains(&own.as_str()));
            assert!(target.accepts_heic());
        }
        assert!(TargetFormat::WebP.accepted_extensions().contains(&".png"));
        assert!(!TargetFormat::Jpeg.accepted_extensions().contains(&".png"));
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let parsed: Config = toml::from_str(
            "[conversion]\ntarget = \"jpg\"\nmax_size = 800\n"
        ).unwrap();

        assert_eq!(parsed.conversion.target, TargetFormat::Jpeg);
        assert_eq!(parsed.conversion.max_size, 800);
        assert_eq!(parsed.conversion.quality, 85);
        assert_eq!(parsed.logging.level, "info");
    }

    #[test]
    fn test_config_file_loading() {
        let mut toml_file = Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(toml_file, "[conversion]\nquality = 70\npreserve_structure = true").unwrap();
        let loaded = Config::from_file(toml_file.path()).unwrap();
        assert_eq!(loaded.conversion.quality, 70);
        assert!(loaded.conversion.preserve_structure);

        let mut yaml_file = Builder::new().suffix(".yaml").tempfile().unwrap();
        writeln!(yaml_file, "conversion:\n  target: jpeg\nlogging:\n  level: debug").unwrap();
        let loaded = Config::from_file(yaml_file.path()).unwrap();
        assert_eq!(loaded.conversion.target, TargetFormat::Jpeg);
        assert_eq!(loaded.logging.level, "debug");
    }

    #[test]
    fn test_config_file_rejects_bad_values() {
        let mut toml_file = Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(toml_file, "[conversion]\nquality = 0").unwrap();
        assert!(Config::from_file(toml_file.path()).is_err());

        let mut toml_file = Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(toml_file, "[conversion]\ntarget = \"png\"").unwrap();
        assert!(matches!(
            Config::from_file(toml_file.path()),
            Err(ImageminError::SerdeError(_))
        ));

        let other = Builder::new().suffix(".ini").tempfile().unwrap();
        assert!(Config::from_file(other.path()).is_err());
    }

    #[test]
    fn test_request_from_config() {
        let mut config = Config::default();
        config.conversion.preserve_structure = true;
        config.conversion.max_size = 512;

        let request = config.request("in", "out");
        assert_eq!(request.max_dimension, 512);
        assert_eq!(request.layout, OutputLayout::Mirror);
        assert_eq!(request.settings.quality, 85);
    }
}
