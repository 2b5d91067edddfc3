// SPDX-License-Identifier: GPL-3.0-only

//! Capture controller
//!
//! Owns the capture device (through the device worker) and the state the UI
//! observes: zoom factor, flash mode and the front-flash indicator. Capture
//! pipes the raw frame through the photo correction pipeline using the
//! orientation sampled when the shutter was pressed.
//!
//! Every public operation absorbs device failures: the caller sees either the
//! new value or the previous one, never an error.

use super::worker::DeviceWorker;
use super::{
    CameraPosition, CameraSystem, CaptureDevice, CaptureSettings, DeviceCapabilities,
    ExposureMode, FlashMode, FocusMode, NormalizedPoint, configure,
};
use crate::backends::motion::OrientationHandle;
use crate::config::Config;
use crate::constants;
use crate::errors::CameraError;
use crate::pipelines::photo::{FinalPhoto, PhotoPipeline, PostProcessingConfig};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, PoisonError};
use std::time::Duration;
use tokio::sync::watch;
use tracing::{debug, info, warn};

/// Clamp a zoom request to `[MIN_FACTOR, min(device_max, cap)]`
///
/// A device maximum below 1.0 collapses the range to 1.0.
pub fn clamp_zoom(requested: f32, device_max: f32, cap: f32) -> f32 {
    let min = constants::zoom::MIN_FACTOR;
    let upper = device_max.min(cap).max(min);
    requested.max(min).min(upper)
}

/// Clears the in-flight flag when a capture finishes or is dropped
struct InFlightGuard<'a>(&'a AtomicBool);

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Reverts the front-flash indicator when capture finishes or fails
struct FrontFlashGuard<'a>(&'a watch::Sender<bool>);

impl Drop for FrontFlashGuard<'_> {
    fn drop(&mut self) {
        self.0.send_replace(false);
    }
}

/// Capture device state machine
pub struct CaptureController {
    worker: DeviceWorker,
    orientation: OrientationHandle,
    max_zoom_cap: f32,
    front_flash_delay: Duration,
    zoom: watch::Sender<f32>,
    flash_mode: watch::Sender<FlashMode>,
    front_flash_active: watch::Sender<bool>,
    target_aspect_ratio: watch::Sender<Option<f32>>,
    zoom_gesture_baseline: Mutex<Option<f32>>,
    capture_in_flight: AtomicBool,
}

impl CaptureController {
    /// Attach the back camera of `system` and start the device worker
    pub fn new(
        system: Box<dyn CameraSystem>,
        orientation: OrientationHandle,
        config: &Config,
    ) -> Self {
        info!(
            flash = ?config.flash_mode,
            zoom_cap = config.max_zoom_cap,
            "Creating capture controller"
        );

        let (zoom, _) = watch::channel(constants::zoom::MIN_FACTOR);
        let (flash_mode, _) = watch::channel(config.flash_mode);
        let (front_flash_active, _) = watch::channel(false);
        let (target_aspect_ratio, _) = watch::channel(None);

        Self {
            worker: DeviceWorker::spawn(system, CameraPosition::Back),
            orientation,
            max_zoom_cap: config.max_zoom_cap,
            front_flash_delay: config.front_flash_delay(),
            zoom,
            flash_mode,
            front_flash_active,
            target_aspect_ratio,
            zoom_gesture_baseline: Mutex::new(None),
            capture_in_flight: AtomicBool::new(false),
        }
    }

    /// Last published zoom factor
    pub fn zoom_factor(&self) -> f32 {
        *self.zoom.borrow()
    }

    /// Current flash mode
    pub fn flash_mode(&self) -> FlashMode {
        *self.flash_mode.borrow()
    }

    /// Whether the front-camera screen flash is showing
    pub fn is_front_flash_active(&self) -> bool {
        *self.front_flash_active.borrow()
    }

    /// Crop ratio applied to captured photos
    pub fn target_aspect_ratio(&self) -> Option<f32> {
        *self.target_aspect_ratio.borrow()
    }

    /// Whether a capture is in flight
    pub fn is_capturing(&self) -> bool {
        self.capture_in_flight.load(Ordering::Acquire)
    }

    pub fn subscribe_zoom(&self) -> watch::Receiver<f32> {
        self.zoom.subscribe()
    }

    pub fn subscribe_flash_mode(&self) -> watch::Receiver<FlashMode> {
        self.flash_mode.subscribe()
    }

    pub fn subscribe_front_flash(&self) -> watch::Receiver<bool> {
        self.front_flash_active.subscribe()
    }

    /// Capabilities of the attached device, `None` without one
    pub async fn capabilities(&self) -> Option<DeviceCapabilities> {
        self.worker
            .run(|slot| slot.device_mut().ok().map(|device| device.capabilities()))
            .await
            .flatten()
    }

    /// Set the crop ratio for later captures
    ///
    /// Non-positive or non-finite ratios clear it.
    pub fn set_target_aspect_ratio(&self, ratio: Option<f32>) {
        let ratio = ratio.filter(|r| r.is_finite() && *r > 0.0);
        debug!(?ratio, "Target aspect ratio set");
        self.target_aspect_ratio.send_replace(ratio);
    }

    /// Set an absolute zoom factor
    ///
    /// Returns the value now in effect: the clamped request on success, the
    /// previous value if the device refused or is missing.
    pub async fn set_zoom(&self, factor: f32) -> f32 {
        let cap = self.max_zoom_cap;
        let result = self
            .worker
            .run(move |slot| {
                let device = slot.device_mut()?;
                let clamped = clamp_zoom(factor, device.capabilities().max_zoom_factor, cap);
                configure(device, |d| d.set_zoom_factor(clamped))?;
                Ok::<_, super::BackendError>(clamped)
            })
            .await;

        match result {
            Some(Ok(zoom)) => {
                self.zoom.send_replace(zoom);
                debug!(requested = factor, zoom, "Zoom applied");
                zoom
            }
            Some(Err(e)) => {
                warn!(requested = factor, error = %CameraError::from(e), "Zoom change rejected");
                self.zoom_factor()
            }
            None => self.zoom_factor(),
        }
    }

    /// Start a pinch gesture, capturing the current zoom as its baseline
    pub fn begin_zoom_gesture(&self) {
        let current = self.zoom_factor();
        *self.baseline() = Some(current);
    }

    /// Apply a pinch scale relative to the zoom at gesture start
    ///
    /// Starts the gesture implicitly if [`begin_zoom_gesture`] was not called.
    ///
    /// [`begin_zoom_gesture`]: Self::begin_zoom_gesture
    pub async fn update_zoom_gesture(&self, scale: f32) -> f32 {
        let baseline = {
            let mut guard = self.baseline();
            *guard.get_or_insert(self.zoom_factor())
        };
        self.set_zoom(baseline * scale).await
    }

    /// Finish the pinch gesture
    pub fn end_zoom_gesture(&self) {
        *self.baseline() = None;
    }

    fn baseline(&self) -> std::sync::MutexGuard<'_, Option<f32>> {
        self.zoom_gesture_baseline
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Focus and meter at a device-space point
    ///
    /// Fire-and-forget. Features the device lacks are skipped.
    pub fn focus(&self, point: NormalizedPoint) {
        self.worker.submit(move |slot| {
            let Ok(device) = slot.device_mut() else {
                debug!("No camera attached, focus ignored");
                return;
            };

            let caps = device.capabilities();
            if !caps.focus_point_of_interest && !caps.exposure_point_of_interest {
                debug!("Device has no point-of-interest support");
                return;
            }

            match configure(device, |d| apply_focus(d, &caps, point)) {
                Ok(()) => debug!(x = point.x, y = point.y, "Focus point set"),
                Err(e) => warn!(error = %CameraError::from(e), "Focus change rejected"),
            }
        });
    }

    /// Capture one corrected photo
    ///
    /// Returns `None` while another capture is in flight, without touching
    /// that capture's state, and on any device failure.
    pub async fn capture_photo(&self) -> Option<FinalPhoto> {
        if self
            .capture_in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            debug!(error = %CameraError::Busy, "Capture already in flight, ignoring request");
            return None;
        }
        let _in_flight = InFlightGuard(&self.capture_in_flight);

        let config = PostProcessingConfig {
            orientation: self.orientation.current(),
            target_aspect_ratio: self.target_aspect_ratio(),
        };
        let flash_mode = self.flash_mode();

        let position = self
            .worker
            .run(|slot| slot.device_mut().ok().map(|device| device.position()))
            .await
            .flatten();
        let Some(position) = position else {
            warn!(error = %CameraError::DeviceUnavailable, "Capture skipped");
            return None;
        };

        let frame = {
            let use_front_flash =
                position == CameraPosition::Front && flash_mode != FlashMode::Off;
            let _front_flash = if use_front_flash {
                self.front_flash_active.send_replace(true);
                let guard = FrontFlashGuard(&self.front_flash_active);
                debug!(delay_ms = self.front_flash_delay.as_millis() as u64, "Front flash on");
                tokio::time::sleep(self.front_flash_delay).await;
                Some(guard)
            } else {
                None
            };

            self.worker
                .run(move |slot| {
                    let device = slot.device_mut()?;
                    let settings = CaptureSettings {
                        flash_mode: if device.capabilities().has_flash {
                            flash_mode
                        } else {
                            FlashMode::Off
                        },
                    };
                    device.capture(&settings)
                })
                .await
        };

        let frame = match frame {
            Some(Ok(frame)) => frame,
            Some(Err(e)) => {
                warn!(error = %CameraError::from(e), "Capture failed");
                return None;
            }
            None => return None,
        };

        info!(
            width = frame.width,
            height = frame.height,
            orientation = %config.orientation,
            "Frame captured"
        );
        PhotoPipeline::new(config).process(frame).await
    }

    /// Switch between the front and back cameras
    ///
    /// Zoom is reset to 1.0 on success. On failure the current camera stays
    /// attached and `None` is returned.
    pub async fn switch_camera(&self) -> Option<CameraPosition> {
        match self.worker.run(|slot| slot.switch()).await {
            Some(Ok(position)) => {
                self.zoom.send_replace(constants::zoom::MIN_FACTOR);
                self.end_zoom_gesture();
                Some(position)
            }
            Some(Err(e)) => {
                warn!(
                    error = %CameraError::from(e),
                    "Camera switch failed, keeping current camera"
                );
                None
            }
            None => None,
        }
    }

    /// Cycle the flash mode and return the new one
    pub fn toggle_flash(&self) -> FlashMode {
        self.flash_mode.send_modify(|mode| *mode = mode.next());
        let mode = self.flash_mode();
        debug!(?mode, "Flash mode changed");
        mode
    }
}

fn apply_focus(
    device: &mut dyn CaptureDevice,
    caps: &DeviceCapabilities,
    point: NormalizedPoint,
) -> super::BackendResult<()> {
    if caps.focus_point_of_interest {
        device.set_focus(point, FocusMode::AutoFocus)?;
    }
    if caps.exposure_point_of_interest {
        device.set_exposure(point, ExposureMode::ContinuousAutoExposure)?;
    }
    device.set_subject_area_monitoring(true)
}
