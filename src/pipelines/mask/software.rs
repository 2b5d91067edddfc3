// SPDX-License-Identifier: GPL-3.0-only

//! CPU vision backend built on imageproc
//!
//! - Contours: contrast-boosted luma, Otsu threshold with the requested
//!   polarity, then the outer borders of top-level components.
//! - Saliency: deviation of the blurred luma from its mean, Otsu threshold,
//!   then bounding boxes of the larger connected components.

use super::vision::{
    Contour, ContourPolarity, ContourRequest, FrameRegion, VisionBackend, VisionResults,
};
use crate::constants::mask::MIN_SALIENT_AREA_FRACTION;
use crate::errors::AnalysisError;
use image::{GrayImage, Luma, RgbaImage};
use imageproc::contours::{BorderType, find_contours};
use imageproc::contrast::otsu_level;
use imageproc::filter::gaussian_blur_f32;
use imageproc::region_labelling::{Connectivity, connected_components};
use tracing::{debug, trace};

/// Frames whose luma range is narrower than this have nothing to trace
const MIN_LUMA_RANGE: u8 = 24;

/// Saliency deviations below this are ignored even if Otsu keeps them
const MIN_SALIENCY: u8 = 16;

/// Most salient regions reported per frame
const MAX_SALIENT_REGIONS: usize = 8;

/// Blur radius for the saliency map as a fraction of the longer side
const SALIENCY_BLUR_FRACTION: f32 = 0.01;

/// Vision backend that runs entirely on the CPU
#[derive(Debug, Clone, Copy, Default)]
pub struct SoftwareVisionBackend;

impl SoftwareVisionBackend {
    pub fn new() -> Self {
        Self
    }
}

impl VisionBackend for SoftwareVisionBackend {
    fn analyze(
        &self,
        frame: &RgbaImage,
        request: &ContourRequest,
    ) -> Result<VisionResults, AnalysisError> {
        let (width, height) = frame.dimensions();
        if width == 0 || height == 0 {
            return Err(AnalysisError::InvalidInput("empty frame".into()));
        }

        let start = std::time::Instant::now();
        let luma = image::imageops::grayscale(frame);

        let (min, max) = luma
            .pixels()
            .fold((u8::MAX, u8::MIN), |(lo, hi), p| (lo.min(p.0[0]), hi.max(p.0[0])));
        if max.saturating_sub(min) < MIN_LUMA_RANGE {
            debug!(min, max, "Frame has no usable contrast");
            return Ok(VisionResults::default());
        }

        let salient_regions = detect_salient_regions(&luma);
        let contours = detect_contours(&luma, request);

        trace!(
            regions = salient_regions.len(),
            contours = contours.len(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Software vision pass complete"
        );
        Ok(VisionResults {
            salient_regions,
            contours,
        })
    }
}

fn mean(image: &GrayImage) -> f32 {
    let count = (image.width() as u64 * image.height() as u64).max(1);
    let sum: u64 = image.pixels().map(|p| u64::from(p.0[0])).sum();
    (sum as f64 / count as f64) as f32
}

fn boost_contrast(luma: &GrayImage, factor: f32) -> GrayImage {
    let mean = mean(luma);
    GrayImage::from_fn(luma.width(), luma.height(), |x, y| {
        let v = f32::from(luma.get_pixel(x, y).0[0]);
        Luma([((v - mean) * factor + mean).round().clamp(0.0, 255.0) as u8])
    })
}

fn detect_contours(luma: &GrayImage, request: &ContourRequest) -> Vec<Contour> {
    let (width, height) = luma.dimensions();
    let boosted = boost_contrast(luma, request.contrast_adjustment.max(0.0));
    let level = otsu_level(&boosted);

    let foreground = GrayImage::from_fn(width, height, |x, y| {
        let v = boosted.get_pixel(x, y).0[0];
        let is_object = match request.polarity {
            ContourPolarity::DarkOnLight => v <= level,
            ContourPolarity::LightOnDark => v > level,
        };
        Luma([if is_object { 255 } else { 0 }])
    });

    let (w, h) = (width as f32, height as f32);
    find_contours::<u32>(&foreground)
        .into_iter()
        .filter(|c| c.parent.is_none() && c.border_type == BorderType::Outer)
        .map(|c| Contour {
            points: c
                .points
                .iter()
                .map(|p| ((p.x as f32 + 0.5) / w, 1.0 - (p.y as f32 + 0.5) / h))
                .collect(),
            closed: true,
        })
        .collect()
}

#[derive(Clone, Copy)]
struct Bounds {
    min_x: u32,
    min_y: u32,
    max_x: u32,
    max_y: u32,
    area: u64,
}

fn detect_salient_regions(luma: &GrayImage) -> Vec<FrameRegion> {
    let (width, height) = luma.dimensions();
    let sigma = (width.max(height) as f32 * SALIENCY_BLUR_FRACTION).max(1.0);
    let blurred = gaussian_blur_f32(luma, sigma);
    let mean = mean(&blurred);

    let saliency = GrayImage::from_fn(width, height, |x, y| {
        let v = f32::from(blurred.get_pixel(x, y).0[0]);
        Luma([(v - mean).abs().round().min(255.0) as u8])
    });
    let level = otsu_level(&saliency).max(MIN_SALIENCY);
    let salient = GrayImage::from_fn(width, height, |x, y| {
        Luma([if saliency.get_pixel(x, y).0[0] > level { 255 } else { 0 }])
    });

    let labels = connected_components(&salient, Connectivity::Eight, Luma([0u8]));
    let mut bounds: Vec<Option<Bounds>> = Vec::new();
    for (x, y, label) in labels.enumerate_pixels() {
        let label = label.0[0] as usize;
        if label == 0 {
            continue;
        }
        if bounds.len() <= label {
            bounds.resize(label + 1, None);
        }
        let entry = bounds[label].get_or_insert(Bounds {
            min_x: x,
            min_y: y,
            max_x: x,
            max_y: y,
            area: 0,
        });
        entry.min_x = entry.min_x.min(x);
        entry.min_y = entry.min_y.min(y);
        entry.max_x = entry.max_x.max(x);
        entry.max_y = entry.max_y.max(y);
        entry.area += 1;
    }

    let min_area = (width as f64 * height as f64 * MIN_SALIENT_AREA_FRACTION as f64).ceil() as u64;
    let mut components: Vec<Bounds> = bounds
        .into_iter()
        .flatten()
        .filter(|b| b.area >= min_area)
        .collect();
    components.sort_by(|a, b| b.area.cmp(&a.area));
    components.truncate(MAX_SALIENT_REGIONS);

    components
        .into_iter()
        .map(|b| {
            FrameRegion::from_pixels(
                b.min_x,
                b.min_y,
                b.max_x - b.min_x + 1,
                b.max_y - b.min_y + 1,
                width,
                height,
            )
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    fn dark_square_on_white() -> RgbaImage {
        RgbaImage::from_fn(400, 300, |x, y| {
            if (150..250).contains(&x) && (100..200).contains(&y) {
                Rgba([0, 0, 0, 255])
            } else {
                Rgba([255, 255, 255, 255])
            }
        })
    }

    #[test]
    fn test_uniform_frame_yields_nothing() {
        let frame = RgbaImage::from_pixel(200, 100, Rgba([240, 240, 240, 255]));
        let results = SoftwareVisionBackend::new()
            .analyze(&frame, &ContourRequest::default())
            .unwrap();
        assert!(results.salient_regions.is_empty());
        assert!(results.contours.is_empty());
    }

    #[test]
    fn test_dark_square_is_traced_and_salient() {
        let results = SoftwareVisionBackend::new()
            .analyze(&dark_square_on_white(), &ContourRequest::default())
            .unwrap();

        assert_eq!(results.contours.len(), 1);
        let contour = &results.contours[0];
        assert!(contour.point_count() > 40);
        // Bottom-left origin: the square spans y 100..200 of 300, so 1/3..2/3
        assert!(contour.points.iter().all(|&(x, y)| {
            (0.37..0.63).contains(&x) && (0.32..0.68).contains(&y)
        }));

        assert!(!results.salient_regions.is_empty());
        let region = results.salient_regions[0];
        let cx = region.x + region.width / 2.0;
        let cy = region.y + region.height / 2.0;
        assert!((cx - 0.5).abs() < 0.1, "centre x {cx}");
        assert!((cy - 0.5).abs() < 0.1, "centre y {cy}");
    }

    #[test]
    fn test_empty_frame_is_invalid() {
        let frame = RgbaImage::new(0, 0);
        assert!(
            SoftwareVisionBackend::new()
                .analyze(&frame, &ContourRequest::default())
                .is_err()
        );
    }
}
