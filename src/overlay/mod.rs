// SPDX-License-Identifier: GPL-3.0-only

//! Mask overlay over the viewfinder
//!
//! The mask is shown desaturated and translucent on top of the live frame,
//! fitted to the frame and then placed by the gesture [`transform`] model.
//! The placement never affects capture.

pub mod transform;

pub use transform::{GesturePhase, TransformModel, TransformState, Vector2};

use crate::constants::overlay as consts;
use image::{DynamicImage, Rgba, RgbaImage};
use tiny_skia::{ColorU8, FilterQuality, Pixmap, PixmapPaint, Transform};
use tracing::{debug, warn};

/// How the mask is drawn
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OverlayStyle {
    /// Blend opacity, kept within the slider range
    pub opacity: f32,
    /// Show the mask's own colours instead of the default inverted look
    pub inverted: bool,
}

impl Default for OverlayStyle {
    fn default() -> Self {
        Self {
            opacity: consts::DEFAULT_OPACITY,
            inverted: false,
        }
    }
}

impl OverlayStyle {
    pub fn with_opacity(mut self, opacity: f32) -> Self {
        self.opacity = clamp_opacity(opacity);
        self
    }
}

/// Clamp an opacity into the allowed slider range
pub fn clamp_opacity(opacity: f32) -> f32 {
    if opacity.is_nan() {
        consts::DEFAULT_OPACITY
    } else {
        opacity.clamp(consts::MIN_OPACITY, consts::MAX_OPACITY)
    }
}

/// A mask ready to be shown, plus the crop ratio it implies
#[derive(Debug, Clone)]
pub struct PreparedOverlay {
    pub image: DynamicImage,
    /// Width / height, to hand to the capture controller
    pub aspect_ratio: f32,
}

/// Turn landscape masks upright and report their aspect ratio
///
/// The viewfinder is portrait, so a landscape mask is rotated a quarter turn
/// clockwise before use.
pub fn prepare_overlay(image: DynamicImage) -> PreparedOverlay {
    let image = if image.width() > image.height() {
        debug!(width = image.width(), height = image.height(), "Rotating landscape mask");
        image.rotate90()
    } else {
        image
    };
    let aspect_ratio = image.width() as f32 / image.height().max(1) as f32;
    PreparedOverlay { image, aspect_ratio }
}

/// Desaturate and (unless `inverted`) colour-invert a mask, keeping alpha
fn stylize(mask: &DynamicImage, inverted: bool) -> RgbaImage {
    let luma = mask.to_luma_alpha8();
    RgbaImage::from_fn(luma.width(), luma.height(), |x, y| {
        let [l, a] = luma.get_pixel(x, y).0;
        let v = if inverted { l } else { 255 - l };
        Rgba([v, v, v, a])
    })
}

fn to_pixmap(image: &RgbaImage) -> Option<Pixmap> {
    let mut pixmap = Pixmap::new(image.width(), image.height())?;
    for (dst, src) in pixmap.pixels_mut().iter_mut().zip(image.pixels()) {
        let [r, g, b, a] = src.0;
        *dst = ColorU8::from_rgba(r, g, b, a).premultiply();
    }
    Some(pixmap)
}

/// Draw `mask` over `frame` as the viewfinder would show it
///
/// The mask is fitted inside the frame, centred, then scaled, rotated and
/// offset by `transform` (offsets in frame pixels). Returns the frame
/// unchanged if either image is empty.
pub fn compose_overlay(
    frame: &DynamicImage,
    mask: &DynamicImage,
    transform: &TransformState,
    style: &OverlayStyle,
) -> RgbaImage {
    let base = frame.to_rgba8();
    let stylized = stylize(mask, style.inverted);
    let (Some(mut canvas), Some(overlay)) = (to_pixmap(&base), to_pixmap(&stylized)) else {
        warn!("Cannot compose overlay on an empty image");
        return base;
    };

    let (fw, fh) = (base.width() as f32, base.height() as f32);
    let (mw, mh) = (mask.width() as f32, mask.height() as f32);
    let fit = (fw / mw).min(fh / mh);
    let k = fit * transform.scale.max(0.0);

    let placement = Transform::from_translate(-mw / 2.0, -mh / 2.0)
        .post_scale(k, k)
        .post_rotate(transform.rotation.to_degrees())
        .post_translate(fw / 2.0 + transform.translation.x, fh / 2.0 + transform.translation.y);

    let paint = PixmapPaint {
        opacity: clamp_opacity(style.opacity),
        quality: FilterQuality::Bilinear,
        ..Default::default()
    };
    canvas.draw_pixmap(0, 0, overlay.as_ref(), &paint, placement, None);

    let pixels = canvas.pixels();
    let width = base.width();
    RgbaImage::from_fn(width, base.height(), |x, y| {
        let c = pixels[(y * width + x) as usize].demultiply();
        Rgba([c.red(), c.green(), c.blue(), c.alpha()])
    })
}
