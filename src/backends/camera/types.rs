// SPDX-License-Identifier: GPL-3.0-only
// Shared types for capture device abstraction

//! Shared types for capture devices

use image::DynamicImage;
use serde::{Deserialize, Serialize};

/// Physical position of a camera on the device
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum CameraPosition {
    /// Rear-facing camera (default at startup)
    #[default]
    Back,
    /// User-facing camera
    Front,
}

impl CameraPosition {
    /// The camera on the other side of the device
    pub fn opposite(self) -> Self {
        match self {
            CameraPosition::Back => CameraPosition::Front,
            CameraPosition::Front => CameraPosition::Back,
        }
    }
}

impl std::fmt::Display for CameraPosition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CameraPosition::Back => write!(f, "back"),
            CameraPosition::Front => write!(f, "front"),
        }
    }
}

/// Flash operating mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum FlashMode {
    /// Flash never fires
    Off,
    /// Flash always fires
    On,
    /// Device decides based on scene brightness
    #[default]
    Auto,
}

impl FlashMode {
    /// Cycle to the next mode: Off -> On -> Auto -> Off
    pub fn next(self) -> Self {
        match self {
            FlashMode::Off => FlashMode::On,
            FlashMode::On => FlashMode::Auto,
            FlashMode::Auto => FlashMode::Off,
        }
    }
}

/// Focus behaviour after a point of interest is set
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FocusMode {
    /// Focus once, then hold
    AutoFocus,
    /// Keep refocusing as the scene changes
    ContinuousAutoFocus,
    /// Lens position is fixed
    Locked,
}

/// Exposure behaviour after a point of interest is set
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExposureMode {
    /// Meter once, then hold
    AutoExpose,
    /// Keep metering as the scene changes
    ContinuousAutoExposure,
    /// Exposure is fixed
    Locked,
}

/// A point in normalized device space, both axes in [0, 1]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NormalizedPoint {
    pub x: f32,
    pub y: f32,
}

impl NormalizedPoint {
    /// Create a point, clamping both axes into [0, 1]
    pub fn new(x: f32, y: f32) -> Self {
        Self {
            x: clamp_unit(x),
            y: clamp_unit(y),
        }
    }

    /// Centre of the sensor
    pub fn center() -> Self {
        Self { x: 0.5, y: 0.5 }
    }

    /// Convert a tap on a portrait preview into sensor coordinates
    ///
    /// Sensors are mounted landscape, so the view's vertical axis becomes the
    /// device x axis and the view's horizontal axis is flipped into device y.
    pub fn from_view_tap(x: f32, y: f32, view_width: f32, view_height: f32) -> Self {
        if view_width <= 0.0 || view_height <= 0.0 {
            return Self::center();
        }
        Self::new(y / view_height, 1.0 - x / view_width)
    }
}

fn clamp_unit(value: f32) -> f32 {
    if value.is_nan() {
        0.5
    } else {
        value.clamp(0.0, 1.0)
    }
}

/// Features a device may or may not support
///
/// Queried before attempting an action instead of attempting it and
/// handling the failure.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DeviceCapabilities {
    /// Focus point of interest can be set
    pub focus_point_of_interest: bool,
    /// Exposure point of interest can be set
    pub exposure_point_of_interest: bool,
    /// A hardware flash is present
    pub has_flash: bool,
    /// Highest zoom factor the active format supports
    pub max_zoom_factor: f32,
}

impl Default for DeviceCapabilities {
    fn default() -> Self {
        Self {
            focus_point_of_interest: false,
            exposure_point_of_interest: false,
            has_flash: false,
            max_zoom_factor: 1.0,
        }
    }
}

/// Per-shot settings handed to the device
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CaptureSettings {
    /// Flash mode for this shot (already downgraded to Off without a flash)
    pub flash_mode: FlashMode,
}

/// Intrinsic orientation tag carried by a raw frame
///
/// Uses the EXIF numbering (1-8). The tag describes how the stored pixels
/// must be transformed to appear upright.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PixelOrientation {
    /// 1: already upright
    #[default]
    Up,
    /// 2: mirrored horizontally
    UpMirrored,
    /// 3: rotated 180°
    Down,
    /// 4: mirrored vertically
    DownMirrored,
    /// 5: needs 90° clockwise rotation, then horizontal flip
    LeftMirrored,
    /// 6: needs 90° clockwise rotation
    Right,
    /// 7: needs 270° clockwise rotation, then horizontal flip
    RightMirrored,
    /// 8: needs 270° clockwise rotation
    Left,
}

impl PixelOrientation {
    /// Parse an EXIF orientation value, `None` for out-of-range values
    pub fn from_exif(value: u8) -> Option<Self> {
        match value {
            1 => Some(Self::Up),
            2 => Some(Self::UpMirrored),
            3 => Some(Self::Down),
            4 => Some(Self::DownMirrored),
            5 => Some(Self::LeftMirrored),
            6 => Some(Self::Right),
            7 => Some(Self::RightMirrored),
            8 => Some(Self::Left),
            _ => None,
        }
    }

    /// EXIF numeric value
    pub fn exif_value(&self) -> u8 {
        match self {
            Self::Up => 1,
            Self::UpMirrored => 2,
            Self::Down => 3,
            Self::DownMirrored => 4,
            Self::LeftMirrored => 5,
            Self::Right => 6,
            Self::RightMirrored => 7,
            Self::Left => 8,
        }
    }
}

/// A raw frame delivered by the device
///
/// Transient: created at capture, consumed by the correction pipeline.
#[derive(Debug, Clone)]
pub struct CapturedFrame {
    /// Pixels as stored by the sensor pipeline
    pub image: DynamicImage,
    /// How the stored pixels must be transformed to appear upright
    pub orientation: PixelOrientation,
    /// Original pixel width
    pub width: u32,
    /// Original pixel height
    pub height: u32,
}

impl CapturedFrame {
    /// Wrap an image delivered by a device
    pub fn new(image: DynamicImage, orientation: PixelOrientation) -> Self {
        Self {
            width: image.width(),
            height: image.height(),
            image,
            orientation,
        }
    }
}

/// Result type for backend operations
pub type BackendResult<T> = Result<T, BackendError>;

/// Error types for backend operations
#[derive(Debug, Clone, thiserror::Error)]
pub enum BackendError {
    /// No device at the requested position
    #[error("Device not found: {0}")]
    DeviceNotFound(String),
    /// The device could not be locked for configuration
    #[error("Configuration lock failed: {0}")]
    LockFailed(String),
    /// The device rejected a setting
    #[error("Setting rejected: {0}")]
    SettingRejected(String),
    /// The device did not deliver a frame
    #[error("Capture failed: {0}")]
    CaptureFailed(String),
    /// General I/O error
    #[error("I/O error: {0}")]
    IoError(String),
}

impl From<BackendError> for crate::errors::CameraError {
    fn from(err: BackendError) -> Self {
        use crate::errors::CameraError;
        match err {
            BackendError::DeviceNotFound(_) => CameraError::DeviceUnavailable,
            BackendError::LockFailed(msg) | BackendError::SettingRejected(msg) => {
                CameraError::ConfigurationFailed(msg)
            }
            BackendError::CaptureFailed(msg) | BackendError::IoError(msg) => {
                CameraError::CaptureFailed(msg)
            }
        }
    }
}
