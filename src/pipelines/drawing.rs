// SPDX-License-Identifier: GPL-3.0-only

//! Hand-drawn mask rasterization
//!
//! A drawing is captured in canvas coordinates. Rasterizing maps every point
//! into the target image's pixel space, scaling each axis by
//! target / canvas, and strokes onto a transparent canvas of the target's
//! native size.

use crate::errors::AnalysisError;
use image::{Rgba, RgbaImage};
use serde::{Deserialize, Serialize};
use tiny_skia::{LineCap, LineJoin, Paint, PathBuilder, Pixmap, Stroke, Transform};
use tracing::debug;

fn default_color() -> [u8; 4] {
    [0, 0, 0, 255]
}

fn default_width() -> f32 {
    4.0
}

/// One continuous pen stroke
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PenStroke {
    /// Points in canvas coordinates
    pub points: Vec<[f32; 2]>,
    /// Line width in canvas units
    #[serde(default = "default_width")]
    pub width: f32,
    /// RGBA colour
    #[serde(default = "default_color")]
    pub color: [u8; 4],
}

/// A vector drawing made on a canvas of a given size
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrokeDrawing {
    pub canvas_width: f32,
    pub canvas_height: f32,
    #[serde(default)]
    pub strokes: Vec<PenStroke>,
}

impl StrokeDrawing {
    pub fn new(canvas_width: f32, canvas_height: f32) -> Self {
        Self {
            canvas_width,
            canvas_height,
            strokes: Vec::new(),
        }
    }

    /// Parse a drawing from JSON
    pub fn from_json(json: &str) -> Result<Self, AnalysisError> {
        serde_json::from_str(json).map_err(|e| AnalysisError::InvalidInput(e.to_string()))
    }

    /// Rasterize at `target_width`×`target_height`
    pub fn rasterize(
        &self,
        target_width: u32,
        target_height: u32,
    ) -> Result<RgbaImage, AnalysisError> {
        if self.canvas_width <= 0.0 || self.canvas_height <= 0.0 {
            return Err(AnalysisError::InvalidInput(format!(
                "canvas size {}x{} is empty",
                self.canvas_width, self.canvas_height
            )));
        }

        let mut pixmap = Pixmap::new(target_width, target_height).ok_or_else(|| {
            AnalysisError::RenderFailed(format!(
                "cannot allocate {target_width}x{target_height} pixmap"
            ))
        })?;

        let sx = target_width as f32 / self.canvas_width;
        let sy = target_height as f32 / self.canvas_height;
        let width_scale = (sx * sy).sqrt();

        for stroke in &self.strokes {
            let mut points = stroke.points.iter();
            let Some(&[x0, y0]) = points.next() else {
                continue;
            };

            let mut pb = PathBuilder::new();
            pb.move_to(x0 * sx, y0 * sy);
            let mut segments = 0;
            for &[x, y] in points {
                pb.line_to(x * sx, y * sy);
                segments += 1;
            }
            if segments == 0 {
                // A tap: draw a dot
                pb.line_to(x0 * sx + 0.01, y0 * sy);
            }
            let Some(path) = pb.finish() else {
                continue;
            };

            let mut paint = Paint::default();
            let [r, g, b, a] = stroke.color;
            paint.set_color_rgba8(r, g, b, a);
            paint.anti_alias = true;

            let pen = Stroke {
                width: (stroke.width * width_scale).max(1.0),
                line_cap: LineCap::Round,
                line_join: LineJoin::Round,
                ..Default::default()
            };
            pixmap.stroke_path(&path, &paint, &pen, Transform::identity(), None);
        }

        debug!(
            strokes = self.strokes.len(),
            width = target_width,
            height = target_height,
            "Drawing rasterized"
        );

        let pixels = pixmap.pixels();
        Ok(RgbaImage::from_fn(target_width, target_height, |x, y| {
            let c = pixels[(y * target_width + x) as usize].demultiply();
            Rgba([c.red(), c.green(), c.blue(), c.alpha()])
        }))
    }
}
