// SPDX-License-Identifier: MPL-2.0

//! Post-capture correction for photos
//!
//! Every captured frame goes through three steps, in order:
//! - Intrinsic orientation fix (EXIF tag 1-8 baked into the pixels)
//! - Device rotation for landscape shots
//! - Centred crop to the configured aspect ratio
//!
//! No step can abort the pipeline. A step that has nothing sensible to do
//! hands its input through unchanged.

use crate::backends::camera::types::{CapturedFrame, PixelOrientation};
use crate::backends::motion::OrientationSample;
use image::DynamicImage;
use tracing::{debug, info};

/// Post-processing configuration
///
/// Snapshotted when the shutter fires.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PostProcessingConfig {
    /// Device orientation at the moment of capture
    pub orientation: OrientationSample,
    /// Width / height of the crop window, `None` to keep the full frame
    pub target_aspect_ratio: Option<f32>,
}

/// Corrected photo, upright and cropped
///
/// Immutable once produced.
#[derive(Debug, Clone)]
pub struct FinalPhoto {
    image: DynamicImage,
}

impl FinalPhoto {
    /// Pixel width
    pub fn width(&self) -> u32 {
        self.image.width()
    }

    /// Pixel height
    pub fn height(&self) -> u32 {
        self.image.height()
    }

    /// Borrow the pixels
    pub fn image(&self) -> &DynamicImage {
        &self.image
    }

    /// Take ownership of the pixels
    pub fn into_image(self) -> DynamicImage {
        self.image
    }
}

/// Pixel rectangle inside an image
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CropRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

/// Post-processor for captured frames
pub struct PostProcessor {
    config: PostProcessingConfig,
}

impl PostProcessor {
    /// Create a new post-processor with the given configuration
    pub fn new(config: PostProcessingConfig) -> Self {
        Self { config }
    }

    /// Run the full correction sequence
    ///
    /// CPU-bound; call from a blocking worker.
    pub fn process(&self, frame: CapturedFrame) -> FinalPhoto {
        info!(
            width = frame.width,
            height = frame.height,
            tag = frame.orientation.exif_value(),
            orientation = %self.config.orientation,
            "Correcting captured frame"
        );

        let image = fix_orientation(frame.image, frame.orientation);
        let image = rotate_for_device(image, self.config.orientation);
        let image = match self.config.target_aspect_ratio {
            Some(ratio) => crop_to_aspect(image, ratio),
            None => image,
        };

        debug!(width = image.width(), height = image.height(), "Correction complete");
        FinalPhoto { image }
    }
}

/// Bake the intrinsic orientation tag into the pixels
pub fn fix_orientation(image: DynamicImage, tag: PixelOrientation) -> DynamicImage {
    match tag {
        PixelOrientation::Up => image,
        PixelOrientation::UpMirrored => image.fliph(),
        PixelOrientation::Down => image.rotate180(),
        PixelOrientation::DownMirrored => image.flipv(),
        PixelOrientation::LeftMirrored => image.rotate90().fliph(),
        PixelOrientation::Right => image.rotate90(),
        PixelOrientation::RightMirrored => image.rotate270().fliph(),
        PixelOrientation::Left => image.rotate270(),
    }
}

/// Rotate a sensor-upright image to match how the device was held
///
/// Landscape-left turns the image a quarter counter-clockwise, landscape-right
/// a quarter clockwise. Portrait leaves it alone.
pub fn rotate_for_device(image: DynamicImage, orientation: OrientationSample) -> DynamicImage {
    match orientation {
        OrientationSample::Portrait => image,
        OrientationSample::LandscapeLeft => image.rotate270(),
        OrientationSample::LandscapeRight => image.rotate90(),
    }
}

/// Largest centred window with the given width/height ratio
///
/// The ratio is flipped to its reciprocal when its landscape/portrait sense
/// disagrees with the image's. Returns `None` for empty images and ratios
/// that are not finite and positive.
pub fn crop_rect(width: u32, height: u32, ratio: f32) -> Option<CropRect> {
    if width == 0 || height == 0 || !ratio.is_finite() || ratio <= 0.0 {
        return None;
    }

    let mut ratio = f64::from(ratio);
    let image_is_landscape = width > height;
    let ratio_is_landscape = ratio > 1.0;
    if ratio != 1.0 && image_is_landscape != ratio_is_landscape {
        ratio = 1.0 / ratio;
    }

    let (w, h) = (f64::from(width), f64::from(height));
    if w / h > ratio {
        let crop_width = ((h * ratio).round() as u32).clamp(1, width);
        Some(CropRect {
            x: (width - crop_width) / 2,
            y: 0,
            width: crop_width,
            height,
        })
    } else {
        let crop_height = ((w / ratio).round() as u32).clamp(1, height);
        Some(CropRect {
            x: 0,
            y: (height - crop_height) / 2,
            width,
            height: crop_height,
        })
    }
}

/// Crop to the largest centred window matching `ratio`
pub fn crop_to_aspect(image: DynamicImage, ratio: f32) -> DynamicImage {
    let Some(rect) = crop_rect(image.width(), image.height(), ratio) else {
        debug!(ratio, "Skipping crop");
        return image;
    };

    if rect.width == image.width() && rect.height == image.height() {
        return image;
    }

    debug!(
        x = rect.x,
        y = rect.y,
        width = rect.width,
        height = rect.height,
        "Cropping to aspect ratio"
    );
    image.crop_imm(rect.x, rect.y, rect.width, rect.height)
}
