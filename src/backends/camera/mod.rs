// SPDX-License-Identifier: MPL-2.0

//! Capture device abstraction
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────┐
//! │   UI Layer (App)    │
//! └──────────┬──────────┘
//!            │
//!            ▼
//! ┌─────────────────────┐
//! │  CaptureController  │  ← zoom/focus/flash state, capture + correction
//! └──────────┬──────────┘
//!            │
//!            ▼
//! ┌─────────────────────┐
//! │    DeviceWorker     │  ← one thread, serialises device reconfiguration
//! └──────────┬──────────┘
//!            │
//!            ▼
//! ┌─────────────────────┐
//! │ CameraSystem trait  │  ← open device by position
//! │ CaptureDevice trait │  ← platform implementation
//! └─────────────────────┘
//! ```
//!
//! The device handle is owned by the worker thread. Nothing outside
//! [`CaptureController`] can reach it.

pub mod controller;
pub mod file_device;
pub mod types;
pub(crate) mod worker;

pub use controller::CaptureController;
pub use file_device::FileCameraSystem;
pub use types::*;

/// Entry point to the platform's cameras
///
/// Implementations enumerate devices by position and hand out exclusive
/// handles to them.
pub trait CameraSystem: Send {
    /// Open the camera at the given position
    fn open(&self, position: CameraPosition) -> BackendResult<Box<dyn CaptureDevice>>;
}

/// A single opened capture device
///
/// All setters must be called between [`lock_for_configuration`] and
/// [`unlock_for_configuration`]; use [`configure`] to get that right.
///
/// [`lock_for_configuration`]: CaptureDevice::lock_for_configuration
/// [`unlock_for_configuration`]: CaptureDevice::unlock_for_configuration
pub trait CaptureDevice: Send {
    /// Which side of the device this camera is on
    fn position(&self) -> CameraPosition;

    /// Human-readable device name
    fn name(&self) -> &str;

    /// Capability query for capability-gated features
    fn capabilities(&self) -> DeviceCapabilities;

    /// Acquire exclusive configuration access
    fn lock_for_configuration(&mut self) -> BackendResult<()>;

    /// Release configuration access
    fn unlock_for_configuration(&mut self);

    /// Current zoom factor
    fn zoom_factor(&self) -> f32;

    /// Set the zoom factor (caller clamps to the supported range)
    fn set_zoom_factor(&mut self, factor: f32) -> BackendResult<()>;

    /// Set the focus point of interest and mode
    fn set_focus(&mut self, point: NormalizedPoint, mode: FocusMode) -> BackendResult<()>;

    /// Set the exposure point of interest and mode
    fn set_exposure(&mut self, point: NormalizedPoint, mode: ExposureMode) -> BackendResult<()>;

    /// Toggle subject-area change monitoring
    fn set_subject_area_monitoring(&mut self, enabled: bool) -> BackendResult<()>;

    /// Capture one still frame with the given settings
    ///
    /// May block until the sensor delivers. Called on the device worker only.
    fn capture(&mut self, settings: &CaptureSettings) -> BackendResult<CapturedFrame>;
}

/// Run `f` with the device locked for configuration
///
/// The device is unlocked again whether or not `f` succeeds.
pub fn configure<R>(
    device: &mut dyn CaptureDevice,
    f: impl FnOnce(&mut dyn CaptureDevice) -> BackendResult<R>,
) -> BackendResult<R> {
    device.lock_for_configuration()?;
    let result = f(&mut *device);
    device.unlock_for_configuration();
    result
}
