//! Conversion requests and encoder settings

use std::path::PathBuf;
use serde::{Deserialize, Serialize};
use crate::config::{TargetFormat, DEFAULT_QUALITY, DEFAULT_WEBP_METHOD};
use crate::error::{Result, ImageminError};

/// Everything the batch converter needs for one run
#[derive(Debug, Clone)]
pub struct ConversionRequest {
    pub source_directory: PathBuf,
    pub destination_directory: PathBuf,
    pub target_format: TargetFormat,

    /// Longest allowed side of an output image
    pub max_dimension: u32,

    pub settings: EncodeSettings,
    pub layout: OutputLayout,
}

impl ConversionRequest {
    /// Create a request with default encoder settings and a flat layout
    pub fn new(
        source_directory: impl Into<PathBuf>,
        destination_directory: impl Into<PathBuf>,
        target_format: TargetFormat,
        max_dimension: u32,
    ) -> Self {
        Self {
            source_directory: source_directory.into(),
            destination_directory: destination_directory.into(),
            target_format,
            max_dimension,
            settings: EncodeSettings::default(),
            layout: OutputLayout::default(),
        }
    }

    /// Set the encoder settings
    pub fn settings(mut self, settings: EncodeSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Set the output layout
    pub fn layout(mut self, layout: OutputLayout) -> Self {
        self.layout = layout;
        self
    }

    /// Validate the numeric parameters of the request
    pub fn validate(&self) -> Result<()> {
        if self.max_dimension == 0 {
            return Err(ImageminError::invalid_parameters(
                "Maximum size must be greater than 0"
            ));
        }
        self.settings.validate()
    }
}

/// Format-specific encoder settings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncodeSettings {
    /// Lossy quality (1-100) for both WebP and JPEG
    pub quality: u8,

    /// libwebp compression method (0-6)
    pub webp_method: u8,

    /// Multi-pass WebP and optimized JPEG Huffman tables
    pub optimize: bool,
}

impl Default for EncodeSettings {
    fn default() -> Self {
        Self {
            quality: DEFAULT_QUALITY,
            webp_method: DEFAULT_WEBP_METHOD,
            optimize: true,
        }
    }
}

impl EncodeSettings {
    /// Set the output quality
    pub fn quality(mut self, quality: u8) -> Self {
        self.quality = quality;
        self
    }

    /// Validate the settings
    pub fn validate(&self) -> Result<()> {
        if self.quality == 0 || self.quality > 100 {
            return Err(ImageminError::invalid_parameters(
                format!("Quality must be between 1-100, got {}", self.quality)
            ));
        }

        if self.webp_method > 6 {
            return Err(ImageminError::invalid_parameters(
                format!("WebP method must be between 0-6, got {}", self.webp_method)
            ));
        }

        Ok(())
    }
}

/// Where outputs land relative to the destination directory
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputLayout {
    /// Every output directly in the destination; same-named files overwrite
    #[default]
    Flat,

    /// Recreate the source subdirectory of each file under the destination
    Mirror,
}
