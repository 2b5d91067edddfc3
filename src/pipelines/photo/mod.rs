// SPDX-License-Identifier: MPL-2.0

//! Async photo correction pipeline
//!
//! ```text
//! Capture device → raw frame → orientation fix → device rotation → aspect crop
//!                                    (blocking worker, off the async runtime)
//! ```
//!
//! The steps themselves are synchronous and live in [`processing`]; this
//! module only moves the work onto a blocking thread and hands back one
//! result.

pub mod processing;

pub use processing::{FinalPhoto, PostProcessingConfig, PostProcessor};

use crate::backends::camera::types::CapturedFrame;
use tracing::warn;

/// Complete photo correction pipeline
pub struct PhotoPipeline {
    post_processor: PostProcessor,
}

impl PhotoPipeline {
    /// Create a pipeline for one capture
    pub fn new(config: PostProcessingConfig) -> Self {
        Self {
            post_processor: PostProcessor::new(config),
        }
    }

    /// Correct a raw frame on a blocking worker
    ///
    /// Returns `None` only if the worker itself died.
    pub async fn process(self, frame: CapturedFrame) -> Option<FinalPhoto> {
        match tokio::task::spawn_blocking(move || self.post_processor.process(frame)).await {
            Ok(photo) => Some(photo),
            Err(e) => {
                warn!(error = %e, "Correction task failed");
                None
            }
        }
    }
}
