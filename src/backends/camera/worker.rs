// SPDX-License-Identifier: GPL-3.0-only

//! Device worker thread
//!
//! The worker owns the camera system and the active device handle. Every
//! reconfiguration (zoom, focus, camera switch) and every capture runs as a
//! job on this one thread, so device calls are serialised and never block the
//! async runtime.

use super::{BackendError, BackendResult, CameraPosition, CameraSystem, CaptureDevice};
use tokio::sync::oneshot;
use tracing::{debug, error, info, warn};

/// State owned by the worker thread
pub(crate) struct DeviceSlot {
    system: Box<dyn CameraSystem>,
    device: Option<Box<dyn CaptureDevice>>,
}

impl DeviceSlot {
    /// The active device, or an error when no input is attached
    pub(crate) fn device_mut(&mut self) -> BackendResult<&mut dyn CaptureDevice> {
        match self.device.as_mut() {
            Some(boxed) => {
                let device: &mut dyn CaptureDevice = boxed.as_mut();
                Ok(device)
            }
            None => Err(BackendError::DeviceNotFound("no active camera".into())),
        }
    }

    /// Replace the active device with the one on the opposite side
    ///
    /// The new device is opened before the old one is released, so a failed
    /// open leaves the current camera attached.
    pub(crate) fn switch(&mut self) -> BackendResult<CameraPosition> {
        let current = self.device_mut()?.position();
        let target = current.opposite();

        let replacement = self.system.open(target)?;
        info!(from = %current, to = %target, device = replacement.name(), "Switched camera");
        self.device = Some(replacement);
        Ok(target)
    }
}

type Job = Box<dyn FnOnce(&mut DeviceSlot) + Send>;

/// Handle to the device worker thread
///
/// The thread exits once every handle is dropped, releasing the device.
#[derive(Clone)]
pub(crate) struct DeviceWorker {
    jobs: std::sync::mpsc::Sender<Job>,
}

impl DeviceWorker {
    /// Spawn the worker and open the camera at `position` on it
    pub(crate) fn spawn(system: Box<dyn CameraSystem>, position: CameraPosition) -> Self {
        let (jobs, rx) = std::sync::mpsc::channel::<Job>();

        let spawned = std::thread::Builder::new()
            .name("camera-device".into())
            .spawn(move || {
                let device = match system.open(position) {
                    Ok(device) => {
                        info!(position = %position, device = device.name(), "Camera attached");
                        Some(device)
                    }
                    Err(e) => {
                        warn!(position = %position, error = %e, "No camera attached");
                        None
                    }
                };

                let mut slot = DeviceSlot { system, device };
                while let Ok(job) = rx.recv() {
                    job(&mut slot);
                }
                debug!("Device worker stopped");
            });

        if let Err(e) = spawned {
            error!(error = %e, "Failed to spawn device worker");
        }

        Self { jobs }
    }

    /// Run `f` on the worker and wait for its result
    ///
    /// Returns `None` if the worker is gone.
    pub(crate) async fn run<R, F>(&self, f: F) -> Option<R>
    where
        F: FnOnce(&mut DeviceSlot) -> R + Send + 'static,
        R: Send + 'static,
    {
        let (tx, rx) = oneshot::channel();
        let job: Job = Box::new(move |slot| {
            let _ = tx.send(f(slot));
        });

        if self.jobs.send(job).is_err() {
            warn!("Device worker is not running");
            return None;
        }
        rx.await.ok()
    }

    /// Queue `f` on the worker without waiting
    pub(crate) fn submit<F>(&self, f: F)
    where
        F: FnOnce(&mut DeviceSlot) + Send + 'static,
    {
        if self.jobs.send(Box::new(f)).is_err() {
            warn!("Device worker is not running");
        }
    }
}
