// SPDX-License-Identifier: GPL-3.0-only

//! End-to-end tests: photo to mask to preset to overlay

use camerate::overlay::{OverlayStyle, TransformModel, Vector2, compose_overlay, prepare_overlay};
use camerate::pipelines::drawing::{PenStroke, StrokeDrawing};
use camerate::pipelines::mask::{MaskConfig, MaskSynthesizer};
use camerate::storage::{MaskSource, PresetStore};
use image::{DynamicImage, Rgba, RgbaImage};
use std::sync::Arc;

fn photo_with_dark_block(width: u32, height: u32) -> DynamicImage {
    let image = RgbaImage::from_fn(width, height, |x, y| {
        let inside = (width / 4..width * 3 / 4).contains(&x)
            && (height / 4..height * 3 / 4).contains(&y);
        if inside {
            Rgba([20, 20, 20, 255])
        } else {
            Rgba([235, 235, 235, 255])
        }
    });
    DynamicImage::ImageRgba8(image)
}

#[tokio::test]
async fn test_photo_becomes_a_stored_mask() {
    let synthesizer = MaskSynthesizer::software(MaskConfig::default());
    let photo = Arc::new(photo_with_dark_block(1600, 1200));

    let mask = synthesizer.analyze(photo.clone()).await.expect("mask");
    assert_eq!(mask.dimensions(), (800, 600));
    assert!(mask.pixels().any(|p| p.0[3] > 0), "mask has strokes");
    assert!(mask.pixels().any(|p| p.0[3] == 0), "mask stays mostly transparent");
    // Source photo is untouched
    assert_eq!(photo.width(), 1600);

    let dir = tempfile::tempdir().unwrap();
    let store = PresetStore::new(dir.path(), None);
    let id = store
        .save(&DynamicImage::ImageRgba8(mask), MaskSource::Ai)
        .expect("saved");

    let entries = store.list().await;
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].id, id);
    let asset = store.load(&entries[0]).expect("loaded");
    assert_eq!((asset.image.width(), asset.image.height()), (800, 600));
}

#[tokio::test]
async fn test_flat_photo_gives_blank_mask() {
    let synthesizer = MaskSynthesizer::software(MaskConfig::default());
    let flat =
        DynamicImage::ImageRgba8(RgbaImage::from_pixel(300, 200, Rgba([128, 128, 128, 255])));

    let mask = synthesizer.analyze(Arc::new(flat)).await.expect("mask");
    assert_eq!(mask.dimensions(), (300, 200));
    assert!(mask.pixels().all(|p| p.0[3] == 0));
}

#[test]
fn test_drawn_landscape_mask_is_placed_over_frame() {
    let mut drawing = StrokeDrawing::new(400.0, 300.0);
    drawing.strokes.push(PenStroke {
        points: vec![[0.0, 150.0], [400.0, 150.0]],
        width: 20.0,
        color: [0, 0, 0, 255],
    });
    let mask = DynamicImage::ImageRgba8(drawing.rasterize(400, 300).unwrap());

    // Landscape masks are stood upright for the portrait viewfinder
    let prepared = prepare_overlay(mask);
    assert_eq!(prepared.image.width(), 300);
    assert!((prepared.aspect_ratio - 0.75).abs() < 1e-6);

    let mut model = TransformModel::new();
    model.pan_changed(Vector2::new(10.0, 0.0));
    model.pan_ended();

    let frame = DynamicImage::ImageRgba8(RgbaImage::from_pixel(300, 400, Rgba([0, 0, 0, 255])));
    let out = compose_overlay(&frame, &prepared.image, &model.state(), &OverlayStyle::default());
    assert_eq!(out.dimensions(), (300, 400));

    // The horizontal line is now vertical, through x = 150 shifted by 10
    assert!(out.get_pixel(160, 200).0[0] > 0);
    assert_eq!(out.get_pixel(60, 200).0[0], 0);
}
