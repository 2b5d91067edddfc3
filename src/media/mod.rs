// SPDX-License-Identifier: GPL-3.0-only

//! Image sizing helpers shared by the mask pipeline and preset storage

use image::DynamicImage;
use image::imageops::FilterType;
use tracing::trace;

/// Dimensions after fitting `width`×`height` inside a `max_dimension` square
///
/// Aspect ratio is preserved and images already inside the bound keep their
/// size; nothing is ever upscaled.
pub fn fitted_dimensions(width: u32, height: u32, max_dimension: u32) -> (u32, u32) {
    if max_dimension == 0 || (width <= max_dimension && height <= max_dimension) {
        return (width, height);
    }
    let scale = (width as f64 / max_dimension as f64).max(height as f64 / max_dimension as f64);
    let new_width = ((width as f64 / scale).round() as u32).clamp(1, max_dimension);
    let new_height = ((height as f64 / scale).round() as u32).clamp(1, max_dimension);
    (new_width, new_height)
}

/// Downscale an image so neither side exceeds `max_dimension`
pub fn fit_within(image: &DynamicImage, max_dimension: u32) -> DynamicImage {
    let (width, height) = (image.width(), image.height());
    let (new_width, new_height) = fitted_dimensions(width, height, max_dimension);
    if (new_width, new_height) == (width, height) {
        return image.clone();
    }

    trace!(width, height, new_width, new_height, "Downscaling image");
    image.resize_exact(new_width, new_height, FilterType::Triangle)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fitted_dimensions_preserves_aspect() {
        assert_eq!(fitted_dimensions(1600, 1200, 800), (800, 600));
        assert_eq!(fitted_dimensions(1200, 4800, 1200), (300, 1200));
        assert_eq!(fitted_dimensions(640, 480, 800), (640, 480));
        assert_eq!(fitted_dimensions(10_000, 1, 800), (800, 1));
    }

    #[test]
    fn test_fit_within_never_upscales() {
        let small = DynamicImage::new_rgba8(20, 10);
        let out = fit_within(&small, 800);
        assert_eq!((out.width(), out.height()), (20, 10));

        let large = DynamicImage::new_rgba8(2000, 1000);
        let out = fit_within(&large, 800);
        assert_eq!((out.width(), out.height()), (800, 400));
    }
}
