// SPDX-License-Identifier: GPL-3.0-only

//! Rasterize vision results into a stroke-only mask

use super::vision::{Contour, FrameRegion, VisionResults};
use crate::constants::mask as consts;
use crate::errors::AnalysisError;
use image::{Rgba, RgbaImage};
use tiny_skia::{Paint, Path, PathBuilder, Pixmap, Rect, Stroke, StrokeDash, Transform};
use tracing::{debug, trace};

/// Draw salient regions and surviving contours onto a transparent canvas
///
/// Contours with `min_contour_points` points or fewer are dropped.
pub fn render_mask(
    width: u32,
    height: u32,
    results: &VisionResults,
    min_contour_points: usize,
) -> Result<RgbaImage, AnalysisError> {
    let mut pixmap = Pixmap::new(width, height).ok_or_else(|| {
        AnalysisError::RenderFailed(format!("cannot allocate {width}x{height} pixmap"))
    })?;

    let (w, h) = (width as f32, height as f32);
    let to_raster = Transform::from_scale(w, -h).post_translate(0.0, h);

    let mut saliency_paint = Paint::default();
    saliency_paint.set_color_rgba8(0, 0, 0, consts::SALIENCY_ALPHA);
    saliency_paint.anti_alias = true;
    let saliency_stroke = Stroke {
        width: (w * consts::SALIENCY_STROKE_FRACTION).max(1.0),
        dash: StrokeDash::new(consts::SALIENCY_DASH.to_vec(), 0.0),
        ..Default::default()
    };

    for region in &results.salient_regions {
        if let Some(path) = region_path(region, w, h) {
            pixmap.stroke_path(
                &path,
                &saliency_paint,
                &saliency_stroke,
                Transform::identity(),
                None,
            );
        }
    }

    let mut contour_paint = Paint::default();
    contour_paint.set_color_rgba8(0, 0, 0, 255);
    contour_paint.anti_alias = true;
    let contour_stroke = Stroke {
        width: (w * consts::CONTOUR_STROKE_FRACTION).max(1.0),
        ..Default::default()
    };

    let mut drawn = 0usize;
    for contour in results
        .contours
        .iter()
        .filter(|c| c.point_count() > min_contour_points)
    {
        // Transform the geometry, not the stroke, so line width stays in pixels
        if let Some(path) = contour_path(contour).and_then(|p| p.transform(to_raster)) {
            pixmap.stroke_path(&path, &contour_paint, &contour_stroke, Transform::identity(), None);
            drawn += 1;
        }
    }

    debug!(
        regions = results.salient_regions.len(),
        contours = drawn,
        dropped = results.contours.len() - drawn,
        "Mask rendered"
    );

    Ok(pixmap_to_image(&pixmap))
}

/// Dashed-rectangle path for a bottom-left-origin region
fn region_path(region: &FrameRegion, w: f32, h: f32) -> Option<Path> {
    let top = (1.0 - region.y - region.height) * h;
    let rect = Rect::from_xywh(region.x * w, top, region.width * w, region.height * h)?;
    Some(PathBuilder::from_rect(rect))
}

fn contour_path(contour: &Contour) -> Option<Path> {
    let mut points = contour.points.iter();
    let &(x, y) = points.next()?;

    let mut pb = PathBuilder::new();
    pb.move_to(x, y);
    for &(x, y) in points {
        pb.line_to(x, y);
    }
    if contour.closed {
        pb.close();
    }
    pb.finish()
}

/// Copy a premultiplied pixmap into a straight-alpha image
fn pixmap_to_image(pixmap: &Pixmap) -> RgbaImage {
    let width = pixmap.width();
    let pixels = pixmap.pixels();
    trace!(count = pixels.len(), "Converting pixmap");
    RgbaImage::from_fn(width, pixmap.height(), |x, y| {
        let c = pixels[(y * width + x) as usize].demultiply();
        Rgba([c.red(), c.green(), c.blue(), c.alpha()])
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square_contour(points_per_side: usize) -> Contour {
        let n = points_per_side as f32;
        let mut points = Vec::new();
        for i in 0..points_per_side {
            points.push((0.25 + 0.5 * i as f32 / n, 0.25));
        }
        for i in 0..points_per_side {
            points.push((0.75, 0.25 + 0.5 * i as f32 / n));
        }
        for i in 0..points_per_side {
            points.push((0.75 - 0.5 * i as f32 / n, 0.75));
        }
        for i in 0..points_per_side {
            points.push((0.25, 0.75 - 0.5 * i as f32 / n));
        }
        Contour { points, closed: true }
    }

    fn opaque_pixels(image: &RgbaImage) -> usize {
        image.pixels().filter(|p| p.0[3] > 0).count()
    }

    #[test]
    fn test_empty_results_give_blank_mask() {
        let mask = render_mask(64, 48, &VisionResults::default(), 40).unwrap();
        assert_eq!(mask.dimensions(), (64, 48));
        assert_eq!(opaque_pixels(&mask), 0);
    }

    #[test]
    fn test_short_contours_are_dropped() {
        let results = VisionResults {
            salient_regions: Vec::new(),
            contours: vec![square_contour(10)],
        };
        let mask = render_mask(100, 100, &results, 40).unwrap();
        assert_eq!(opaque_pixels(&mask), 0);

        let results = VisionResults {
            salient_regions: Vec::new(),
            contours: vec![square_contour(20)],
        };
        let mask = render_mask(100, 100, &results, 40).unwrap();
        assert!(opaque_pixels(&mask) > 0);
    }

    #[test]
    fn test_contour_is_flipped_into_raster_space() {
        // A horizontal line near the bottom in vision space, centred on row 89
        let contour = Contour {
            points: (0..=50).map(|i| (0.1 + 0.016 * i as f32, 0.105)).collect(),
            closed: false,
        };
        let results = VisionResults {
            salient_regions: Vec::new(),
            contours: vec![contour],
        };
        let mask = render_mask(100, 100, &results, 40).unwrap();

        assert!(mask.get_pixel(50, 89).0[3] > 0);
        assert_eq!(mask.get_pixel(50, 10).0[3], 0);
    }

    #[test]
    fn test_salient_region_outline_is_translucent_black() {
        let results = VisionResults {
            salient_regions: vec![FrameRegion {
                x: 0.1,
                y: 0.1,
                width: 0.8,
                height: 0.8,
            }],
            contours: Vec::new(),
        };
        let mask = render_mask(200, 200, &results, 40).unwrap();

        let stroked: Vec<_> = mask.pixels().filter(|p| p.0[3] > 0).collect();
        assert!(!stroked.is_empty());
        assert!(stroked.iter().all(|p| p.0[0] == 0 && p.0[3] <= consts::SALIENCY_ALPHA));
        // Interior stays clear
        assert_eq!(mask.get_pixel(100, 100).0[3], 0);
    }
}
