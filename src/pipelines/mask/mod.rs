// SPDX-License-Identifier: GPL-3.0-only

//! Composition-guide mask synthesis
//!
//! ```text
//! still image ─▶ downscale (≤ 800 px) ─▶ VisionBackend ─┬─ salient regions ─▶ dashed boxes
//!                                                       └─ contours (> 40 pts) ─▶ outlines
//!                                                                     │
//!                                               transparent RGBA mask ◀┘
//! ```
//!
//! Analysis runs on a blocking worker. The input image is only read.

pub mod render;
pub mod software;
pub mod vision;

pub use software::SoftwareVisionBackend;
pub use vision::{
    Contour, ContourPolarity, ContourRequest, FrameRegion, VisionBackend, VisionResults,
};

use crate::config::Config;
use crate::constants;
use crate::errors::AnalysisError;
use crate::media::fit_within;
use image::{DynamicImage, RgbaImage};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Tuning for one synthesizer
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MaskConfig {
    /// Frames are downscaled to this max dimension before analysis
    pub max_dimension: u32,
    /// Contrast boost for the contour pass
    pub contrast_adjustment: f32,
    /// Contours with this many points or fewer are dropped
    pub min_contour_points: usize,
}

impl Default for MaskConfig {
    fn default() -> Self {
        Self {
            max_dimension: constants::mask::ANALYSIS_MAX_DIMENSION,
            contrast_adjustment: constants::mask::CONTRAST_ADJUSTMENT,
            min_contour_points: constants::mask::MIN_CONTOUR_POINTS,
        }
    }
}

impl From<&Config> for MaskConfig {
    fn from(config: &Config) -> Self {
        Self {
            max_dimension: config.analysis_max_dimension,
            contrast_adjustment: config.contrast_adjustment,
            min_contour_points: config.min_contour_points,
        }
    }
}

/// Turns a still image into a stroke-only guide mask
#[derive(Clone)]
pub struct MaskSynthesizer {
    backend: Arc<dyn VisionBackend>,
    config: MaskConfig,
}

impl MaskSynthesizer {
    pub fn new(backend: Arc<dyn VisionBackend>, config: MaskConfig) -> Self {
        Self { backend, config }
    }

    /// Synthesizer backed by [`SoftwareVisionBackend`]
    pub fn software(config: MaskConfig) -> Self {
        Self::new(Arc::new(SoftwareVisionBackend::new()), config)
    }

    /// Analyze `image` off the calling task
    ///
    /// Returns `None` when the backend fails. A frame with nothing to find
    /// still yields a (blank) mask.
    pub async fn analyze(&self, image: Arc<DynamicImage>) -> Option<RgbaImage> {
        let synthesizer = self.clone();
        tokio::task::spawn_blocking(move || synthesizer.analyze_sync(&image))
            .await
            .unwrap_or_else(|e| {
                warn!(error = %e, "Mask analysis task panicked");
                None
            })
    }

    /// Blocking variant of [`analyze`](Self::analyze)
    pub fn analyze_sync(&self, image: &DynamicImage) -> Option<RgbaImage> {
        match self.try_analyze(image) {
            Ok(mask) => Some(mask),
            Err(e) => {
                warn!(error = %e, "No mask produced");
                None
            }
        }
    }

    fn try_analyze(&self, image: &DynamicImage) -> Result<RgbaImage, AnalysisError> {
        if image.width() == 0 || image.height() == 0 {
            return Err(AnalysisError::InvalidInput("empty image".into()));
        }

        let start = std::time::Instant::now();
        let frame = fit_within(image, self.config.max_dimension).to_rgba8();
        let (width, height) = frame.dimensions();
        debug!(
            source_width = image.width(),
            source_height = image.height(),
            width,
            height,
            "Prepared frame for analysis"
        );

        let request = ContourRequest {
            contrast_adjustment: self.config.contrast_adjustment,
            polarity: ContourPolarity::DarkOnLight,
        };
        let results = self.backend.analyze(&frame, &request)?;
        let mask = render::render_mask(width, height, &results, self.config.min_contour_points)?;

        info!(
            width,
            height,
            regions = results.salient_regions.len(),
            contours = results.contours.len(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Mask synthesized"
        );
        Ok(mask)
    }
}
