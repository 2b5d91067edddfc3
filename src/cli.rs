// SPDX-License-Identifier: GPL-3.0-only

//! CLI commands
//!
//! This module provides command-line functionality for:
//! - Synthesizing guide masks from photos
//! - Running file-backed captures through the correction pipeline
//! - Managing mask presets
//! - Previewing a mask overlay on a frame

use camerate::backends::camera::{FileCameraSystem, PixelOrientation};
use camerate::backends::motion::{Acceleration, OrientationTracker};
use camerate::overlay::{OverlayStyle, TransformState, Vector2, compose_overlay, prepare_overlay};
use camerate::pipelines::drawing::StrokeDrawing;
use camerate::pipelines::mask::{MaskConfig, MaskSynthesizer};
use camerate::storage::{MaskSource, PresetStore};
use camerate::{CaptureController, Config};
use chrono::Local;
use image::DynamicImage;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Device orientation as given on the command line
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OrientationArg {
    Portrait,
    LandscapeLeft,
    LandscapeRight,
}

impl OrientationArg {
    /// Accelerometer reading that classifies as this orientation
    fn gravity(self) -> Acceleration {
        let (x, y) = match self {
            OrientationArg::Portrait => (0.0, -1.0),
            OrientationArg::LandscapeLeft => (-1.0, 0.0),
            OrientationArg::LandscapeRight => (1.0, 0.0),
        };
        Acceleration { x, y, z: 0.0 }
    }
}

pub struct CorrectOptions {
    pub image: PathBuf,
    pub orientation: OrientationArg,
    pub aspect: Option<f32>,
    pub exif: u8,
    pub zoom: Option<f32>,
    pub front: bool,
    pub output: Option<PathBuf>,
}

pub struct OverlayOptions {
    pub frame: PathBuf,
    pub mask: PathBuf,
    pub offset: Option<(f32, f32)>,
    pub scale: f32,
    pub rotation: f32,
    pub opacity: f32,
    pub invert: bool,
    pub output: Option<PathBuf>,
}

/// Parse `W:H` or a decimal width/height ratio
pub fn parse_aspect(value: &str) -> Result<f32, String> {
    let ratio = match value.split_once(':') {
        Some((w, h)) => {
            let w: f32 = w.trim().parse().map_err(|_| format!("invalid width in '{value}'"))?;
            let h: f32 = h.trim().parse().map_err(|_| format!("invalid height in '{value}'"))?;
            w / h
        }
        None => value
            .trim()
            .parse()
            .map_err(|_| format!("'{value}' is not a ratio"))?,
    };

    if ratio.is_finite() && ratio > 0.0 {
        Ok(ratio)
    } else {
        Err(format!("'{value}' is not a positive ratio"))
    }
}

/// Parse an `X,Y` offset
pub fn parse_offset(value: &str) -> Result<(f32, f32), String> {
    let (x, y) = value
        .split_once(',')
        .ok_or_else(|| format!("expected X,Y but got '{value}'"))?;
    let x = x.trim().parse().map_err(|_| format!("invalid X in '{value}'"))?;
    let y = y.trim().parse().map_err(|_| format!("invalid Y in '{value}'"))?;
    Ok((x, y))
}

/// Output path, defaulting to `<prefix>_TIMESTAMP.png` in the working directory
fn output_path(output: Option<PathBuf>, prefix: &str) -> PathBuf {
    output.unwrap_or_else(|| {
        let timestamp = Local::now().format("%Y%m%d_%H%M%S");
        PathBuf::from(format!("{prefix}_{timestamp}.png"))
    })
}

fn ensure_parent(path: &Path) -> std::io::Result<()> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => std::fs::create_dir_all(parent),
        _ => Ok(()),
    }
}

/// Synthesize a mask from a photo
pub fn analyze(
    image_path: PathBuf,
    output: Option<PathBuf>,
    save: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load();
    let image = image::open(&image_path)?;
    println!("Analyzing {} ({}x{})", image_path.display(), image.width(), image.height());

    let synthesizer = MaskSynthesizer::software(MaskConfig::from(&config));
    let rt = tokio::runtime::Runtime::new()?;
    let mask = rt
        .block_on(synthesizer.analyze(Arc::new(image)))
        .ok_or("Mask synthesis failed")?;
    let mask = DynamicImage::ImageRgba8(mask);

    let output_path = output_path(output, "mask");
    ensure_parent(&output_path)?;
    mask.save(&output_path)?;
    println!("Mask saved: {}", output_path.display());

    if save {
        let store = PresetStore::from_config(&config);
        let id = store.save(&mask, MaskSource::Ai).ok_or("Failed to store preset")?;
        println!("Preset stored: {id}");
    }

    Ok(())
}

/// Capture an image file through the capture controller
pub fn correct(options: CorrectOptions) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load();
    let tag = PixelOrientation::from_exif(options.exif)
        .ok_or_else(|| format!("EXIF orientation {} is not in 1-8", options.exif))?;

    let tracker = OrientationTracker::new();
    let sample = tracker.update(options.orientation.gravity());
    let system = FileCameraSystem::new(&options.image).with_orientation_tag(tag);

    let rt = tokio::runtime::Runtime::new()?;
    let photo = rt.block_on(async {
        let controller = CaptureController::new(Box::new(system), tracker.handle(), &config);
        controller.set_target_aspect_ratio(options.aspect);

        if options.front && controller.switch_camera().await.is_none() {
            return Err("Could not switch to the front camera");
        }
        if let Some(zoom) = options.zoom {
            let applied = controller.set_zoom(zoom).await;
            println!("Zoom: {applied:.2}x");
        }

        controller.capture_photo().await.ok_or("Capture failed")
    })?;

    println!(
        "Captured {}x{} ({}, EXIF {})",
        photo.width(),
        photo.height(),
        sample,
        tag.exif_value()
    );

    let output_path = output_path(options.output, "photo");
    ensure_parent(&output_path)?;
    photo.image().save(&output_path)?;
    println!("Photo saved: {}", output_path.display());
    Ok(())
}

/// List all presets
pub fn list_presets() -> Result<(), Box<dyn std::error::Error>> {
    let store = PresetStore::from_config(&Config::load());
    let rt = tokio::runtime::Runtime::new()?;
    let entries = rt.block_on(store.list());

    if entries.is_empty() {
        println!("No presets found.");
        return Ok(());
    }

    println!("Presets:");
    println!();
    for entry in &entries {
        let marker = if entry.is_deletable() { " " } else { "*" };
        println!("  {marker} {:<10} {}", entry.source.to_string(), entry.id);
    }
    println!();
    println!("  * built-in, cannot be deleted");
    Ok(())
}

/// Store an image file as an uploaded preset
pub fn import_preset(image_path: PathBuf) -> Result<(), Box<dyn std::error::Error>> {
    let store = PresetStore::from_config(&Config::load());
    let image = image::open(&image_path)?;
    let id = store
        .save(&image, MaskSource::Uploaded)
        .ok_or("Failed to store preset")?;
    println!("Preset stored: {id}");
    Ok(())
}

/// Rasterize a stroke drawing and store it
pub fn draw_preset(
    drawing_path: PathBuf,
    width: Option<u32>,
    height: Option<u32>,
) -> Result<(), Box<dyn std::error::Error>> {
    let json = std::fs::read_to_string(&drawing_path)?;
    let drawing = StrokeDrawing::from_json(&json)?;

    let width = width.unwrap_or(drawing.canvas_width.round().max(1.0) as u32);
    let height = height.unwrap_or(drawing.canvas_height.round().max(1.0) as u32);
    let mask = DynamicImage::ImageRgba8(drawing.rasterize(width, height)?);

    let store = PresetStore::from_config(&Config::load());
    let id = store.save(&mask, MaskSource::Drawn).ok_or("Failed to store preset")?;
    println!("Preset stored: {id} ({width}x{height})");
    Ok(())
}

/// Delete a user preset
pub fn delete_preset(id: &str) -> Result<(), Box<dyn std::error::Error>> {
    let store = PresetStore::from_config(&Config::load());
    if store.delete(id) {
        println!("Deleted: {id}");
    } else {
        println!("Nothing to delete for '{id}'");
    }
    Ok(())
}

/// Composite a mask over a frame
pub fn overlay(options: OverlayOptions) -> Result<(), Box<dyn std::error::Error>> {
    let frame = image::open(&options.frame)?;
    let prepared = prepare_overlay(image::open(&options.mask)?);
    println!("Mask aspect ratio: {:.3}", prepared.aspect_ratio);

    let (x, y) = options.offset.unwrap_or((0.0, 0.0));
    let transform = TransformState {
        translation: Vector2::new(x, y),
        scale: options.scale.max(0.0),
        rotation: options.rotation.to_radians(),
    };
    let style = OverlayStyle {
        inverted: options.invert,
        ..OverlayStyle::default()
    }
    .with_opacity(options.opacity);

    let composed = compose_overlay(&frame, &prepared.image, &transform, &style);

    let output_path = output_path(options.output, "overlay");
    ensure_parent(&output_path)?;
    composed.save(&output_path)?;
    println!("Overlay saved: {}", output_path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use camerate::OrientationSample;

    #[test]
    fn test_parse_aspect_forms() {
        assert_eq!(parse_aspect("4:3").unwrap(), 4.0 / 3.0);
        assert_eq!(parse_aspect("0.75").unwrap(), 0.75);
        assert!(parse_aspect("0:3").is_err());
        assert!(parse_aspect("4:0").is_err());
        assert!(parse_aspect("wide").is_err());
    }

    #[test]
    fn test_parse_offset() {
        assert_eq!(parse_offset("-12.5, 4").unwrap(), (-12.5, 4.0));
        assert!(parse_offset("12").is_err());
    }

    #[test]
    fn test_orientation_arg_classifies_as_itself() {
        let tracker = OrientationTracker::new();
        assert_eq!(
            tracker.update(OrientationArg::LandscapeLeft.gravity()),
            OrientationSample::LandscapeLeft
        );
        assert_eq!(
            tracker.update(OrientationArg::LandscapeRight.gravity()),
            OrientationSample::LandscapeRight
        );
        assert_eq!(tracker.update(OrientationArg::Portrait.gravity()), OrientationSample::Portrait);
    }
}
