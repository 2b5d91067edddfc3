// SPDX-License-Identifier: GPL-3.0-only

//! File-backed capture device
//!
//! Serves a still image from disk as the raw frame, so the capture path can be
//! driven without camera hardware. Zoom is applied digitally: the frame is
//! centre-cropped by the zoom factor and scaled back to its full size.

use super::{
    BackendError, BackendResult, CameraPosition, CameraSystem, CaptureDevice, CaptureSettings,
    CapturedFrame, DeviceCapabilities, ExposureMode, FocusMode, NormalizedPoint, PixelOrientation,
};
use crate::constants::file_formats;
use image::imageops::FilterType;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Default digital zoom limit
const DEFAULT_MAX_ZOOM: f32 = 4.0;

/// Camera system whose devices all read the same image file
#[derive(Debug, Clone)]
pub struct FileCameraSystem {
    path: PathBuf,
    orientation_tag: PixelOrientation,
    max_zoom: f32,
}

impl FileCameraSystem {
    /// Serve the image at `path`
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            orientation_tag: PixelOrientation::Up,
            max_zoom: DEFAULT_MAX_ZOOM,
        }
    }

    /// Orientation tag attached to every delivered frame
    pub fn with_orientation_tag(mut self, tag: PixelOrientation) -> Self {
        self.orientation_tag = tag;
        self
    }

    /// Maximum digital zoom reported by the devices
    pub fn with_max_zoom(mut self, max_zoom: f32) -> Self {
        self.max_zoom = max_zoom.max(1.0);
        self
    }
}

impl CameraSystem for FileCameraSystem {
    fn open(&self, position: CameraPosition) -> BackendResult<Box<dyn CaptureDevice>> {
        let supported = self
            .path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(file_formats::is_image_extension);
        if !supported || !self.path.is_file() {
            return Err(BackendError::DeviceNotFound(format!(
                "'{}' is not a readable image",
                self.path.display()
            )));
        }

        info!(path = %self.path.display(), position = %position, "Opening file camera");
        Ok(Box::new(FileCaptureDevice {
            name: format!("file:{}", self.path.display()),
            path: self.path.clone(),
            position,
            orientation_tag: self.orientation_tag,
            max_zoom: self.max_zoom,
            zoom: 1.0,
            locked: false,
        }))
    }
}

/// A device that captures by decoding an image file
pub struct FileCaptureDevice {
    name: String,
    path: PathBuf,
    position: CameraPosition,
    orientation_tag: PixelOrientation,
    max_zoom: f32,
    zoom: f32,
    locked: bool,
}

impl FileCaptureDevice {
    fn require_lock(&self, what: &str) -> BackendResult<()> {
        if self.locked {
            Ok(())
        } else {
            Err(BackendError::LockFailed(format!("{what} requires a configuration lock")))
        }
    }
}

impl CaptureDevice for FileCaptureDevice {
    fn position(&self) -> CameraPosition {
        self.position
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn capabilities(&self) -> DeviceCapabilities {
        DeviceCapabilities {
            focus_point_of_interest: true,
            exposure_point_of_interest: true,
            has_flash: false,
            max_zoom_factor: self.max_zoom,
        }
    }

    fn lock_for_configuration(&mut self) -> BackendResult<()> {
        self.locked = true;
        Ok(())
    }

    fn unlock_for_configuration(&mut self) {
        self.locked = false;
    }

    fn zoom_factor(&self) -> f32 {
        self.zoom
    }

    fn set_zoom_factor(&mut self, factor: f32) -> BackendResult<()> {
        self.require_lock("zoom")?;
        if !(1.0..=self.max_zoom).contains(&factor) {
            return Err(BackendError::SettingRejected(format!(
                "zoom {factor} outside 1.0..={}",
                self.max_zoom
            )));
        }
        self.zoom = factor;
        Ok(())
    }

    fn set_focus(&mut self, point: NormalizedPoint, mode: FocusMode) -> BackendResult<()> {
        self.require_lock("focus")?;
        debug!(x = point.x, y = point.y, ?mode, "File camera focus (no-op)");
        Ok(())
    }

    fn set_exposure(&mut self, point: NormalizedPoint, mode: ExposureMode) -> BackendResult<()> {
        self.require_lock("exposure")?;
        debug!(x = point.x, y = point.y, ?mode, "File camera exposure (no-op)");
        Ok(())
    }

    fn set_subject_area_monitoring(&mut self, _enabled: bool) -> BackendResult<()> {
        self.require_lock("subject area monitoring")
    }

    fn capture(&mut self, settings: &CaptureSettings) -> BackendResult<CapturedFrame> {
        debug!(flash = ?settings.flash_mode, zoom = self.zoom, "File camera capture");
        let image = load_frame(&self.path)?;
        let image = apply_digital_zoom(image, self.zoom);
        Ok(CapturedFrame::new(image, self.orientation_tag))
    }
}

fn load_frame(path: &Path) -> BackendResult<image::DynamicImage> {
    image::open(path).map_err(|e| {
        BackendError::CaptureFailed(format!("Failed to load image '{}': {}", path.display(), e))
    })
}

fn apply_digital_zoom(image: image::DynamicImage, zoom: f32) -> image::DynamicImage {
    if zoom <= 1.0 {
        return image;
    }
    let (width, height) = (image.width(), image.height());
    let crop_w = ((width as f32 / zoom).round() as u32).clamp(1, width.max(1));
    let crop_h = ((height as f32 / zoom).round() as u32).clamp(1, height.max(1));
    image
        .crop_imm((width - crop_w) / 2, (height - crop_h) / 2, crop_w, crop_h)
        .resize_exact(width, height, FilterType::Triangle)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgba, RgbaImage};

    fn write_test_image(dir: &Path) -> PathBuf {
        let path = dir.join("frame.png");
        RgbaImage::from_pixel(64, 48, Rgba([10, 20, 30, 255]))
            .save(&path)
            .unwrap();
        path
    }

    #[test]
    fn test_open_rejects_missing_or_unsupported_files() {
        let dir = tempfile::tempdir().unwrap();
        let missing = FileCameraSystem::new(dir.path().join("nope.png"));
        assert!(missing.open(CameraPosition::Back).is_err());

        let text = dir.path().join("notes.txt");
        std::fs::write(&text, "hi").unwrap();
        assert!(FileCameraSystem::new(text).open(CameraPosition::Back).is_err());
    }

    #[test]
    fn test_capture_keeps_size_under_zoom() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_test_image(dir.path());
        let system = FileCameraSystem::new(path).with_orientation_tag(PixelOrientation::Right);
        let mut device = system.open(CameraPosition::Front).unwrap();

        assert_eq!(device.position(), CameraPosition::Front);
        assert!(device.set_zoom_factor(2.0).is_err(), "zoom requires a lock");

        crate::backends::camera::configure(device.as_mut(), |d| d.set_zoom_factor(2.0)).unwrap();
        let frame = device.capture(&CaptureSettings::default()).unwrap();
        assert_eq!((frame.width, frame.height), (64, 48));
        assert_eq!(frame.orientation, PixelOrientation::Right);
    }
}
