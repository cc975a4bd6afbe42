//! Codec registry: decoding sources and encoding targets

use std::fs;
use std::path::Path;
use image::DynamicImage;
use tracing::debug;

use crate::config::{EncodeSettings, TargetFormat};
use crate::error::{Result, ImageminError, ErrorContext};
use crate::processing::formats::resolve_source_format;

/// Files above this size are memory-mapped instead of read
const MMAP_THRESHOLD: u64 = 100 * 1024 * 1024;

/// Decoders and encoders available to a converter
///
/// Built once at startup and handed to the converter. HEIC support is
/// present only when the crate is compiled with the `heic` feature.
pub struct CodecRegistry {
    #[cfg(feature = "heic")]
    heif: libheif_rs::LibHeif,
}

/// One row of the codec capability table
#[derive(Debug, Clone, serde::Serialize)]
pub struct CodecInfo {
    pub name: &'static str,
    pub decode: bool,
    pub encode: bool,
}

impl CodecRegistry {
    /// Initialise every compiled-in codec
    ///
    /// Fails when the `heic` feature is enabled but libheif cannot be
    /// initialised.
    pub fn new() -> Result<Self> {
        #[cfg(feature = "heic")]
        {
            let heif = libheif_rs::LibHeif::new_checked()
                .map_err(|e| ImageminError::heic_unavailable(e.to_string(), None))?;
            debug!("libheif initialised");
            Ok(Self { heif })
        }

        #[cfg(not(feature = "heic"))]
        {
            Ok(Self {})
        }
    }

    pub fn supports_heic(&self) -> bool {
        cfg!(feature = "heic")
    }

    /// Capability table, for display
    pub fn capabilities(&self) -> Vec<CodecInfo> {
        vec![
            CodecInfo { name: "JPEG", decode: true, encode: true },
            CodecInfo { name: "PNG", decode: true, encode: false },
            CodecInfo { name: "WebP", decode: true, encode: true },
            CodecInfo { name: "HEIC", decode: self.supports_heic(), encode: false },
        ]
    }

    /// Decode the image at `path`
    ///
    /// The decoder is picked from the file header, falling back to the
    /// extension when the header is not recognised.
    pub fn decode(&self, path: &Path) -> Result<DynamicImage> {
        let file_size = fs::metadata(path)
            .with_file_context(path.to_path_buf())?
            .len();

        if file_size > MMAP_THRESHOLD {
            debug!("Using memory mapping for large file: {:?}", path);
            let file = fs::File::open(path)?;
            // The map is read-only and dropped before this function returns
            let mmap = unsafe { memmap2::Mmap::map(&file)? };
            self.decode_bytes(&mmap, path)
        } else {
            let data = fs::read(path)?;
            self.decode_bytes(&data, path)
        }
    }

    /// Decode an in-memory image; `path` is used for format fallback and errors
    pub fn decode_bytes(&self, data: &[u8], path: &Path) -> Result<DynamicImage> {
        let header = &data[..data.len().min(32)];
        let format = resolve_source_format(path, header)?;
        debug!("Decoding {:?} as {:?}", path, format);

        match format.image_format() {
            Some(image_format) => image::load_from_memory_with_format(data, image_format)
                .map_err(|e| ImageminError::decode(e.to_string(), Some(path.to_path_buf()))),
            None => self.decode_heic(data, path),
        }
    }

    #[cfg(feature = "heic")]
    fn decode_heic(&self, data: &[u8], path: &Path) -> Result<DynamicImage> {
        use image::{RgbImage, RgbaImage};
        use libheif_rs::{ColorSpace, HeifContext, RgbChroma};

        let heif_err = |e: libheif_rs::HeifError| {
            ImageminError::decode(e.to_string(), Some(path.to_path_buf()))
        };

        let context = HeifContext::read_from_bytes(data).map_err(heif_err)?;
        let handle = context.primary_image_handle().map_err(heif_err)?;
        let has_alpha = handle.has_alpha_channel();
        let chroma = if has_alpha { RgbChroma::Rgba } else { RgbChroma::Rgb };

        let decoded = self.heif
            .decode(&handle, ColorSpace::Rgb(chroma), None)
            .map_err(heif_err)?;
        let planes = decoded.planes();
        let plane = planes.interleaved.ok_or_else(|| ImageminError::decode(
            "HEIC image has no interleaved plane",
            Some(path.to_path_buf()),
        ))?;

        // Rows are padded to `stride`; copy only the pixel bytes
        let channels = if has_alpha { 4 } else { 3 };
        let row_len = plane.width as usize * channels;
        let mut pixels = Vec::with_capacity(row_len * plane.height as usize);
        for row in plane.data.chunks(plane.stride).take(plane.height as usize) {
            pixels.extend_from_slice(&row[..row_len]);
        }

        let image = if has_alpha {
            RgbaImage::from_raw(plane.width, plane.height, pixels).map(DynamicImage::ImageRgba8)
        } else {
            RgbImage::from_raw(plane.width, plane.height, pixels).map(DynamicImage::ImageRgb8)
        };

        image.ok_or_else(|| ImageminError::decode(
            "HEIC plane size does not match its dimensions",
            Some(path.to_path_buf()),
        ))
    }

    #[cfg(not(feature = "heic"))]
    fn decode_heic(&self, _data: &[u8], path: &Path) -> Result<DynamicImage> {
        Err(ImageminError::heic_unavailable(
            "imagemin was built without the `heic` feature",
            Some(path.to_path_buf()),
        ))
    }

    /// Encode `image` for `target`, returning the file bytes
    pub fn encode(
        &self,
        image: &DynamicImage,
        target: TargetFormat,
        settings: &EncodeSettings,
    ) -> Result<Vec<u8>> {
        debug!(
            "Encoding {}x{} as {} (quality {}, optimize {})",
            image.width(), image.height(), target, settings.quality, settings.optimize
        );

        match target {
            TargetFormat::WebP => encode_webp(image, settings),
            TargetFormat::Jpeg => encode_jpeg(image, settings),
        }
    }
}

fn encode_webp(image: &DynamicImage, settings: &EncodeSettings) -> Result<Vec<u8>> {
    let mut config = webp::WebPConfig::new()
        .map_err(|_| ImageminError::encode("Failed to initialise WebP encoder config", None))?;
    config.lossless = 0;
    config.quality = f32::from(settings.quality);
    config.method = i32::from(settings.webp_method);
    if settings.optimize {
        config.autofilter = 1;
    }

    let (width, height) = (image.width(), image.height());
    let has_alpha = image.color().has_alpha();
    let pixels = if has_alpha {
        image.to_rgba8().into_raw()
    } else {
        image.to_rgb8().into_raw()
    };

    let encoder = if has_alpha {
        webp::Encoder::from_rgba(&pixels, width, height)
    } else {
        webp::Encoder::from_rgb(&pixels, width, height)
    };

    let memory = encoder
        .encode_advanced(&config)
        .map_err(|e| ImageminError::encode(format!("WebP encoding failed: {:?}", e), None))?;

    Ok(memory.to_vec())
}

fn encode_jpeg(image: &DynamicImage, settings: &EncodeSettings) -> Result<Vec<u8>> {
    // JPEG has no alpha or palette: flatten to 8-bit RGB
    let rgb = image.to_rgb8();

    let too_large = || ImageminError::encode(
        format!("JPEG dimensions limited to 65535, got {}x{}", rgb.width(), rgb.height()),
        None,
    );
    let width = u16::try_from(rgb.width()).map_err(|_| too_large())?;
    let height = u16::try_from(rgb.height()).map_err(|_| too_large())?;

    let mut bytes = Vec::new();
    let mut encoder = jpeg_encoder::Encoder::new(&mut bytes, settings.quality);
    encoder.set_optimized_huffman_tables(settings.optimize);
    encoder
        .encode(rgb.as_raw(), width, height, jpeg_encoder::ColorType::Rgb)
        .map_err(|e| ImageminError::encode(format!("JPEG encoding failed: {}", e), None))?;

    Ok(bytes)
}
