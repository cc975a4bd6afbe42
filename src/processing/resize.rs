//! Aspect-preserving resize math and resampling

use image::imageops::FilterType;
use image::DynamicImage;
use tracing::debug;

/// Output size of an image after fitting it to a maximum dimension
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScaledDimensions {
    pub width: u32,
    pub height: u32,
}

impl ScaledDimensions {
    pub fn as_tuple(self) -> (u32, u32) {
        (self.width, self.height)
    }
}

/// Fit `width` x `height` inside a `max_dimension` box
///
/// Images that already fit keep their size. Otherwise the longer side
/// becomes `max_dimension` and the shorter side is scaled by the same
/// ratio and truncated. A square counts as width-longer. The shorter side
/// never drops below one pixel.
pub fn scaled_dimensions(width: u32, height: u32, max_dimension: u32) -> ScaledDimensions {
    if width.max(height) <= max_dimension {
        return ScaledDimensions { width, height };
    }

    let max = u64::from(max_dimension);
    if width >= height {
        let scaled = u64::from(height) * max / u64::from(width);
        ScaledDimensions {
            width: max_dimension,
            height: (scaled as u32).max(1),
        }
    } else {
        let scaled = u64::from(width) * max / u64::from(height);
        ScaledDimensions {
            width: (scaled as u32).max(1),
            height: max_dimension,
        }
    }
}

/// Resampling filter used for every downscale
const RESAMPLE_FILTER: FilterType = FilterType::Lanczos3;

/// Lanczos3 resampler that shrinks images to a maximum dimension
#[derive(Debug, Clone, Copy, Default)]
pub struct ImageResizer;

impl ImageResizer {
    pub fn new() -> Self {
        Self
    }

    /// Resample `image` so that it fits `max_dimension`
    ///
    /// Takes the image by value; an image that already fits is returned
    /// untouched without a copy.
    pub fn fit(&self, image: DynamicImage, max_dimension: u32) -> DynamicImage {
        let target = scaled_dimensions(image.width(), image.height(), max_dimension);
        self.resize_to(image, target)
    }

    /// Resample `image` to exactly `target`
    pub fn resize_to(&self, image: DynamicImage, target: ScaledDimensions) -> DynamicImage {
        if target.width == image.width() && target.height == image.height() {
            debug!("No resize needed, {}x{} already fits", image.width(), image.height());
            return image;
        }

        debug!(
            "Resizing {}x{} -> {}x{} using {:?}",
            image.width(),
            image.height(),
            target.width,
            target.height,
            RESAMPLE_FILTER
        );

        // resize_exact: the target is already aspect-correct and truncated
        image.resize_exact(target.width, target.height, RESAMPLE_FILTER)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageBuffer, Rgb};

    fn create_test_image(width: u32, height: u32) -> DynamicImage {
        let img = ImageBuffer::from_fn(width, height, |x, y| {
            let intensity = ((x + y) % 255) as u8;
            Rgb([intensity, intensity, intensity])
        });
        DynamicImage::ImageRgb8(img)
    }

    #[test]
    fn test_fitting_image_is_unchanged() {
        assert_eq!(scaled_dimensions(800, 600, 1600).as_tuple(), (800, 600));
        assert_eq!(scaled_dimensions(1600, 900, 1600).as_tuple(), (1600, 900));
        assert_eq!(scaled_dimensions(1600, 1600, 1600).as_tuple(), (1600, 1600));
        assert_eq!(scaled_dimensions(1, 1, 1).as_tuple(), (1, 1));
    }

    #[test]
    fn test_landscape_clamps_width() {
        assert_eq!(scaled_dimensions(4000, 3000, 1600).as_tuple(), (1600, 1200));
        // 2000 * 1600 / 3000 = 1066.67, truncated
        assert_eq!(scaled_dimensions(3000, 2000, 1600).as_tuple(), (1600, 1066));
    }

    #[test]
    fn test_portrait_clamps_height() {
        assert_eq!(scaled_dimensions(3000, 4000, 1600).as_tuple(), (1200, 1600));
        assert_eq!(scaled_dimensions(2000, 3000, 1600).as_tuple(), (1066, 1600));
    }

    #[test]
    fn test_square_uses_width_branch() {
        assert_eq!(scaled_dimensions(5000, 5000, 1600).as_tuple(), (1600, 1600));
        assert_eq!(scaled_dimensions(1601, 1601, 1600).as_tuple(), (1600, 1600));
    }

    #[test]
    fn test_truncation_not_rounding() {
        // 999 * 100 / 1000 = 99.9
        assert_eq!(scaled_dimensions(1000, 999, 100).as_tuple(), (100, 99));
        assert_eq!(scaled_dimensions(999, 1000, 100).as_tuple(), (99, 100));
    }

    #[test]
    fn test_extreme_aspect_keeps_one_pixel() {
        assert_eq!(scaled_dimensions(10_000, 1, 1600).as_tuple(), (1600, 1));
        assert_eq!(scaled_dimensions(3, 20_000, 10).as_tuple(), (1, 10));
    }

    #[test]
    fn test_aspect_ratio_within_one_pixel() {
        let cases = [(4032, 3024), (3024, 4032), (6000, 4000), (1921, 1080), (7, 5000)];
        for (w, h) in cases {
            let scaled = scaled_dimensions(w, h, 1600);
            assert_eq!(scaled.width.max(scaled.height), 1600);

            let exact_short = if w >= h {
                h as f64 * 1600.0 / w as f64
            } else {
                w as f64 * 1600.0 / h as f64
            };
            let short = scaled.width.min(scaled.height) as f64;
            assert!((short - exact_short).abs() <= 1.0, "{}x{} -> {:?}", w, h, scaled);
        }
    }

    #[test]
    fn test_resizer_fit() {
        let resizer = ImageResizer::new();
        let resized = resizer.fit(create_test_image(400, 200), 100);
        assert_eq!((resized.width(), resized.height()), (100, 50));
    }

    #[test]
    fn test_resizer_passthrough() {
        let resizer = ImageResizer::new();
        let resized = resizer.fit(create_test_image(64, 48), 100);
        assert_eq!((resized.width(), resized.height()), (64, 48));
    }

    #[test]
    fn test_resize_to_exact_target() {
        let resizer = ImageResizer::new();
        let target = scaled_dimensions(300, 200, 100);
        let resized = resizer.resize_to(create_test_image(300, 200), target);
        assert_eq!((resized.width(), resized.height()), (100, 66));
    }
}
