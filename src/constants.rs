// SPDX-License-Identifier: GPL-3.0-only

//! Application-wide constants
//!
//! These are the compile-time defaults. Most of them can be overridden at
//! runtime through [`crate::config::Config`].

use std::time::Duration;

/// Zoom limits for the capture device
pub mod zoom {
    /// Lowest zoom factor ever applied (no digital crop)
    pub const MIN_FACTOR: f32 = 1.0;

    /// Upper cap applied on top of the device-reported maximum
    pub const MAX_FACTOR_CAP: f32 = 8.0;
}

/// Capture timing
pub mod capture {
    use super::Duration;

    /// How long the screen flash is shown before the shutter fires on the
    /// front camera
    pub const FRONT_FLASH_DELAY: Duration = Duration::from_millis(100);
}

/// Motion sensor sampling
pub mod motion {
    use super::Duration;

    /// Accelerometer polling interval (~3.3 Hz)
    pub const UPDATE_INTERVAL: Duration = Duration::from_millis(300);
}

/// Mask synthesis parameters
pub mod mask {
    /// Frames are downscaled to this max dimension before analysis
    pub const ANALYSIS_MAX_DIMENSION: u32 = 800;

    /// Contrast boost handed to the contour pass
    pub const CONTRAST_ADJUSTMENT: f32 = 3.0;

    /// Contours with this many points or fewer are treated as noise
    pub const MIN_CONTOUR_POINTS: usize = 40;

    /// Saliency outline stroke width as a fraction of mask width
    pub const SALIENCY_STROKE_FRACTION: f32 = 0.006;

    /// Contour outline stroke width as a fraction of mask width
    pub const CONTOUR_STROKE_FRACTION: f32 = 0.005;

    /// Dash pattern (on, off) for saliency rectangles, in pixels
    pub const SALIENCY_DASH: [f32; 2] = [10.0, 10.0];

    /// Saliency outline alpha (0-255)
    pub const SALIENCY_ALPHA: u8 = 153;

    /// Minimum salient component size as a fraction of the frame area
    pub const MIN_SALIENT_AREA_FRACTION: f32 = 0.01;
}

/// Preset storage
pub mod presets {
    /// Saved masks are downscaled to this max dimension
    pub const MAX_DIMENSION: u32 = 1200;

    /// Thumbnails are downscaled to this max dimension
    pub const THUMBNAIL_MAX_DIMENSION: u32 = 200;

    /// Name of the writable preset folder inside the data directory
    pub const USER_FOLDER: &str = "UserPresets";

    /// Name prefix shared by every mask asset
    pub const NAME_PREFIX: &str = "mask_";

    /// File extension used when saving
    pub const SAVE_EXTENSION: &str = "png";
}

/// Overlay presentation
pub mod overlay {
    /// Lowest overlay opacity the UI slider allows
    pub const MIN_OPACITY: f32 = 0.1;

    /// Highest overlay opacity the UI slider allows
    pub const MAX_OPACITY: f32 = 0.9;

    /// Opacity used when a mask is first shown
    pub const DEFAULT_OPACITY: f32 = 0.4;
}

/// Supported file formats for masks and file-backed capture
pub mod file_formats {
    /// Image extensions accepted for built-in masks
    pub const MASK_EXTENSIONS: &[&str] = &["png", "jpg"];

    /// Image extensions accepted by the file-backed camera
    pub const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "gif", "bmp", "webp"];

    /// Check if a file extension is an accepted mask format
    pub fn is_mask_extension(ext: &str) -> bool {
        MASK_EXTENSIONS.contains(&ext.to_lowercase().as_str())
    }

    /// Check if a file extension is a supported image format
    pub fn is_image_extension(ext: &str) -> bool {
        IMAGE_EXTENSIONS.contains(&ext.to_lowercase().as_str())
    }
}
