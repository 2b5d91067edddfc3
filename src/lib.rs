// SPDX-License-Identifier: MPL-2.0

//! Camerate - composition-guide camera core
//!
//! This library holds everything behind the camera screen that is not UI:
//! capture with geometry correction, guide-mask synthesis from photos, the
//! overlay placement model and mask preset storage.
//!
//! # Architecture
//!
//! The crate is organized into several modules:
//!
//! - [`backends`]: Capture device and motion sensor abstraction
//! - [`pipelines`]: Photo correction, mask synthesis and drawing pipelines
//! - [`overlay`]: Overlay placement and compositing
//! - [`storage`]: Mask preset storage
//! - [`media`]: Shared image helpers
//! - [`config`]: User configuration handling
//!
//! # Example
//!
//! ```ignore
//! let tracker = OrientationTracker::new();
//! let controller = CaptureController::new(system, tracker.handle(), &Config::load());
//! let photo = controller.capture_photo().await;
//! ```

pub mod backends;
pub mod config;
pub mod constants;
pub mod errors;
pub mod media;
pub mod overlay;
pub mod pipelines;
pub mod storage;

// Re-export commonly used types
pub use backends::camera::{CameraPosition, CaptureController, FlashMode, NormalizedPoint};
pub use backends::motion::{OrientationSample, OrientationTracker};
pub use config::Config;
pub use overlay::{OverlayStyle, TransformModel, TransformState};
pub use pipelines::mask::MaskSynthesizer;
pub use pipelines::photo::FinalPhoto;
pub use storage::{MaskSource, PresetStore};
