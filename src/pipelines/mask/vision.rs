// SPDX-License-Identifier: GPL-3.0-only

//! Vision backend contract
//!
//! A backend answers one dual request over a single still frame: where the
//! salient regions are, and which contours it can trace. Every coordinate it
//! returns is normalized to [0, 1] with the origin at the bottom-left corner
//! of the frame, so renderers must flip the vertical axis.

use crate::errors::AnalysisError;
use image::RgbaImage;

/// Normalized rectangle, origin at the bottom-left of the frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameRegion {
    /// Left edge (0.0 = left of frame, 1.0 = right of frame)
    pub x: f32,
    /// Bottom edge (0.0 = bottom of frame, 1.0 = top of frame)
    pub y: f32,
    /// Width as fraction of frame width
    pub width: f32,
    /// Height as fraction of frame height
    pub height: f32,
}

impl FrameRegion {
    /// Create a region from a top-left-origin pixel box
    pub fn from_pixels(
        x: u32,
        y: u32,
        width: u32,
        height: u32,
        frame_width: u32,
        frame_height: u32,
    ) -> Self {
        let fw = frame_width.max(1) as f32;
        let fh = frame_height.max(1) as f32;
        Self {
            x: x as f32 / fw,
            y: 1.0 - (y + height) as f32 / fh,
            width: width as f32 / fw,
            height: height as f32 / fh,
        }
    }
}

/// Traced outline in normalized, bottom-left-origin coordinates
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Contour {
    pub points: Vec<(f32, f32)>,
    /// Whether the last point connects back to the first
    pub closed: bool,
}

impl Contour {
    pub fn point_count(&self) -> usize {
        self.points.len()
    }
}

/// Which side of an edge counts as the object
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ContourPolarity {
    /// Dark shapes on a light background
    #[default]
    DarkOnLight,
    /// Light shapes on a dark background
    LightOnDark,
}

/// Parameters for the contour pass
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ContourRequest {
    /// Contrast multiplier applied before tracing
    pub contrast_adjustment: f32,
    pub polarity: ContourPolarity,
}

impl Default for ContourRequest {
    fn default() -> Self {
        Self {
            contrast_adjustment: crate::constants::mask::CONTRAST_ADJUSTMENT,
            polarity: ContourPolarity::DarkOnLight,
        }
    }
}

/// Output of one dual request
///
/// Empty vectors mean the pass found nothing, which is not an error.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct VisionResults {
    pub salient_regions: Vec<FrameRegion>,
    /// Top-level contours only
    pub contours: Vec<Contour>,
}

/// Saliency plus contour detection over a still frame
pub trait VisionBackend: Send + Sync {
    /// Run both passes over `frame`
    fn analyze(
        &self,
        frame: &RgbaImage,
        request: &ContourRequest,
    ) -> Result<VisionResults, AnalysisError>;
}
