// SPDX-License-Identifier: GPL-3.0-only

//! Integration tests for the capture controller

use camerate::backends::camera::{
    BackendError, BackendResult, CameraPosition, CameraSystem, CaptureDevice, CaptureSettings,
    CapturedFrame, DeviceCapabilities, ExposureMode, FileCameraSystem, FlashMode, FocusMode,
    NormalizedPoint, PixelOrientation,
};
use camerate::backends::motion::{Acceleration, OrientationTracker};
use camerate::{CaptureController, Config};
use image::{DynamicImage, Rgba, RgbaImage};
use std::path::{Path, PathBuf};
use std::sync::mpsc;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Device whose capture blocks until the test releases it
struct GatedSystem {
    release: Arc<Mutex<mpsc::Receiver<()>>>,
    captures: Arc<Mutex<usize>>,
    fail_capture: bool,
}

struct GatedDevice {
    position: CameraPosition,
    release: Arc<Mutex<mpsc::Receiver<()>>>,
    captures: Arc<Mutex<usize>>,
    fail_capture: bool,
}

impl CameraSystem for GatedSystem {
    fn open(&self, position: CameraPosition) -> BackendResult<Box<dyn CaptureDevice>> {
        Ok(Box::new(GatedDevice {
            position,
            release: self.release.clone(),
            captures: self.captures.clone(),
            fail_capture: self.fail_capture,
        }))
    }
}

impl CaptureDevice for GatedDevice {
    fn position(&self) -> CameraPosition {
        self.position
    }
    fn name(&self) -> &str {
        "gated"
    }
    fn capabilities(&self) -> DeviceCapabilities {
        DeviceCapabilities {
            has_flash: true,
            max_zoom_factor: 2.0,
            ..Default::default()
        }
    }
    fn lock_for_configuration(&mut self) -> BackendResult<()> {
        Ok(())
    }
    fn unlock_for_configuration(&mut self) {}
    fn zoom_factor(&self) -> f32 {
        1.0
    }
    fn set_zoom_factor(&mut self, _factor: f32) -> BackendResult<()> {
        Ok(())
    }
    fn set_focus(&mut self, _point: NormalizedPoint, _mode: FocusMode) -> BackendResult<()> {
        Ok(())
    }
    fn set_exposure(&mut self, _point: NormalizedPoint, _mode: ExposureMode) -> BackendResult<()> {
        Ok(())
    }
    fn set_subject_area_monitoring(&mut self, _enabled: bool) -> BackendResult<()> {
        Ok(())
    }
    fn capture(&mut self, _settings: &CaptureSettings) -> BackendResult<CapturedFrame> {
        let _ = self.release.lock().unwrap().recv_timeout(Duration::from_secs(5));
        *self.captures.lock().unwrap() += 1;
        if self.fail_capture {
            return Err(BackendError::CaptureFailed("sensor timeout".into()));
        }
        let image = DynamicImage::ImageRgba8(RgbaImage::new(8, 6));
        Ok(CapturedFrame::new(image, PixelOrientation::Up))
    }
}

fn gated_controller() -> (Arc<CaptureController>, mpsc::Sender<()>, Arc<Mutex<usize>>) {
    controller_with(false)
}

fn controller_with(
    fail_capture: bool,
) -> (Arc<CaptureController>, mpsc::Sender<()>, Arc<Mutex<usize>>) {
    let (release_tx, release_rx) = mpsc::channel();
    let captures = Arc::new(Mutex::new(0));
    let system = GatedSystem {
        release: Arc::new(Mutex::new(release_rx)),
        captures: captures.clone(),
        fail_capture,
    };
    let config = Config {
        front_flash_delay_ms: 20,
        ..Config::default()
    };
    let tracker = OrientationTracker::new();
    let controller = CaptureController::new(Box::new(system), tracker.handle(), &config);
    (Arc::new(controller), release_tx, captures)
}

async fn wait_until(mut condition: impl FnMut() -> bool) {
    for _ in 0..200 {
        if condition() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    panic!("condition not reached in time");
}

fn write_frame(dir: &Path, width: u32, height: u32) -> PathBuf {
    let path = dir.join("frame.png");
    RgbaImage::from_pixel(width, height, Rgba([200, 100, 50, 255]))
        .save(&path)
        .unwrap();
    path
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_capture_while_in_flight_is_ignored() {
    let (controller, release, captures) = gated_controller();

    let first = {
        let controller = controller.clone();
        tokio::spawn(async move { controller.capture_photo().await })
    };
    let watcher = controller.clone();
    wait_until(move || watcher.is_capturing()).await;

    // Second request bounces off without disturbing the first
    assert!(controller.capture_photo().await.is_none());
    assert!(controller.is_capturing());

    release.send(()).unwrap();
    let photo = first.await.unwrap().expect("first capture completes");
    assert_eq!((photo.width(), photo.height()), (8, 6));
    assert!(!controller.is_capturing());
    assert_eq!(*captures.lock().unwrap(), 1);

    // Capturing is possible again afterwards
    release.send(()).unwrap();
    assert!(controller.capture_photo().await.is_some());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_front_flash_is_published_during_capture() {
    let (controller, release, _) = gated_controller();
    assert_eq!(controller.switch_camera().await, Some(CameraPosition::Front));
    assert_eq!(controller.flash_mode(), FlashMode::Auto);

    let mut front_flash = controller.subscribe_front_flash();
    let capture = {
        let controller = controller.clone();
        tokio::spawn(async move { controller.capture_photo().await })
    };

    front_flash.changed().await.unwrap();
    assert!(*front_flash.borrow_and_update());

    release.send(()).unwrap();
    assert!(capture.await.unwrap().is_some());
    assert!(!controller.is_front_flash_active());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_front_flash_reverts_when_capture_fails() {
    let (controller, release, captures) = controller_with(true);
    assert_eq!(controller.switch_camera().await, Some(CameraPosition::Front));
    assert_eq!(controller.flash_mode(), FlashMode::Auto);

    let mut front_flash = controller.subscribe_front_flash();
    let capture = {
        let controller = controller.clone();
        tokio::spawn(async move { controller.capture_photo().await })
    };

    front_flash.changed().await.unwrap();
    assert!(*front_flash.borrow_and_update());

    release.send(()).unwrap();
    assert!(capture.await.unwrap().is_none());
    assert_eq!(*captures.lock().unwrap(), 1);
    assert!(!controller.is_front_flash_active());
    assert!(!*front_flash.borrow());
    assert!(!controller.is_capturing());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_front_flash_stays_off_with_flash_disabled() {
    let (controller, release, _) = gated_controller();
    controller.switch_camera().await;
    while controller.flash_mode() != FlashMode::Off {
        controller.toggle_flash();
    }

    release.send(()).unwrap();
    assert!(controller.capture_photo().await.is_some());
    assert!(!controller.is_front_flash_active());
}

#[tokio::test]
async fn test_file_camera_applies_exif_tag() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_frame(dir.path(), 60, 40);

    let system = FileCameraSystem::new(&path).with_orientation_tag(PixelOrientation::Right);
    let tracker = OrientationTracker::new();
    let controller = CaptureController::new(Box::new(system), tracker.handle(), &Config::default());

    let photo = controller.capture_photo().await.expect("photo");
    assert_eq!((photo.width(), photo.height()), (40, 60));
}

#[tokio::test]
async fn test_file_camera_landscape_capture_with_square_crop() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_frame(dir.path(), 60, 40);

    let tracker = OrientationTracker::new();
    let controller = CaptureController::new(
        Box::new(FileCameraSystem::new(&path)),
        tracker.handle(),
        &Config::default(),
    );

    tracker.update(Acceleration {
        x: 0.9,
        y: 0.1,
        z: 0.0,
    });
    let photo = controller.capture_photo().await.expect("photo");
    assert_eq!((photo.width(), photo.height()), (40, 60));

    controller.set_target_aspect_ratio(Some(1.0));
    let photo = controller.capture_photo().await.expect("photo");
    assert_eq!((photo.width(), photo.height()), (40, 40));
}

#[tokio::test]
async fn test_file_camera_zoom_is_clamped_to_device_range() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_frame(dir.path(), 32, 32);

    let tracker = OrientationTracker::new();
    let controller = CaptureController::new(
        Box::new(FileCameraSystem::new(&path).with_max_zoom(3.0)),
        tracker.handle(),
        &Config::default(),
    );

    assert_eq!(controller.set_zoom(10.0).await, 3.0);
    assert_eq!(controller.set_zoom(0.5).await, 1.0);
    assert_eq!(controller.zoom_factor(), 1.0);

    let photo = controller.capture_photo().await.expect("photo");
    assert_eq!(photo.width(), 32);
}

#[tokio::test]
async fn test_missing_file_leaves_controller_without_camera() {
    let tracker = OrientationTracker::new();
    let controller = CaptureController::new(
        Box::new(FileCameraSystem::new("/nonexistent/frame.png")),
        tracker.handle(),
        &Config::default(),
    );

    assert!(controller.capabilities().await.is_none());
    assert_eq!(controller.set_zoom(2.0).await, 1.0);
    assert!(controller.capture_photo().await.is_none());
    assert!(controller.switch_camera().await.is_none());
}
