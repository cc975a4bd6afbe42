//! Image format detection and output naming

use std::path::{Path, PathBuf};
use crate::config::TargetFormat;
use crate::error::{Result, ImageminError};

/// Formats the pipeline can decode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceFormat {
    Jpeg,
    Png,
    WebP,
    Heic,
}

impl SourceFormat {
    /// Map to the `image` crate format, `None` for formats decoded elsewhere
    pub fn image_format(self) -> Option<image::ImageFormat> {
        match self {
            Self::Jpeg => Some(image::ImageFormat::Jpeg),
            Self::Png => Some(image::ImageFormat::Png),
            Self::WebP => Some(image::ImageFormat::WebP),
            Self::Heic => None,
        }
    }
}

/// Check whether a file qualifies for conversion to `target`
///
/// Matches on the lowercased file name suffix, so `photo.HEIC` qualifies
/// and so does a bare `.jpg`.
pub fn is_accepted<P: AsRef<Path>>(path: P, target: TargetFormat) -> bool {
    let name = match path.as_ref().file_name() {
        Some(name) => name.to_string_lossy().to_lowercase(),
        None => return false,
    };

    target
        .accepted_extensions()
        .iter()
        .any(|ext| name.ends_with(ext))
}

/// File name of the output for `path`: the stem with the target extension
pub fn output_filename<P: AsRef<Path>>(path: P, target: TargetFormat) -> Result<PathBuf> {
    let path = path.as_ref();
    let stem = path.file_stem().ok_or_else(|| ImageminError::decode(
        "Invalid input filename",
        Some(path.to_path_buf()),
    ))?;

    // Appended, not `with_extension`: the stem may itself contain dots
    let mut name = stem.to_os_string();
    name.push(".");
    name.push(target.extension());
    Ok(PathBuf::from(name))
}

/// Detect image format from file extension
pub fn detect_format_from_path<P: AsRef<Path>>(path: P) -> Result<SourceFormat> {
    let path = path.as_ref();
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .ok_or_else(|| ImageminError::unsupported_format(
            "Unknown".to_string(),
            Some(path.to_path_buf())
        ))?;

    match extension.to_lowercase().as_str() {
        "jpg" | "jpeg" => Ok(SourceFormat::Jpeg),
        "png" => Ok(SourceFormat::Png),
        "webp" => Ok(SourceFormat::WebP),
        "heic" | "heif" => Ok(SourceFormat::Heic),
        _ => Err(ImageminError::unsupported_format(
            extension.to_string(),
            Some(path.to_path_buf())
        )),
    }
}

/// Detect image format from file header (magic bytes)
pub fn detect_format_from_header(data: &[u8]) -> Option<SourceFormat> {
    if data.len() < 12 {
        return None;
    }

    // JPEG: FF D8 FF
    if data.starts_with(&[0xFF, 0xD8, 0xFF]) {
        return Some(SourceFormat::Jpeg);
    }

    // PNG: 89 50 4E 47 0D 0A 1A 0A
    if data.starts_with(&[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A]) {
        return Some(SourceFormat::Png);
    }

    // WebP: RIFF....WEBP
    if data.starts_with(b"RIFF") && &data[8..12] == b"WEBP" {
        return Some(SourceFormat::WebP);
    }

    // HEIF family: ....ftyp<brand>
    if &data[4..8] == b"ftyp" {
        let brand = &data[8..12];
        let heif_brands: [&[u8]; 6] = [b"heic", b"heix", b"hevc", b"hevx", b"mif1", b"msf1"];
        if heif_brands.contains(&brand) {
            return Some(SourceFormat::Heic);
        }
    }

    None
}

/// Resolve the decoder to use: header sniffing wins over the extension
pub fn resolve_source_format<P: AsRef<Path>>(path: P, header: &[u8]) -> Result<SourceFormat> {
    match detect_format_from_header(header) {
        Some(format) => Ok(format),
        None => detect_format_from_path(path),
    }
}
