// SPDX-License-Identifier: MPL-2.0

//! Image pipelines
//!
//! Everything here is CPU work that runs off the interactive context, either
//! on a blocking worker or from the CLI.
//!
//! # Pipeline Architecture
//!
//! ```text
//! ┌────────────────┐     ┌───────────────────────┐     ┌──────────────┐
//! │ Captured Frame │ ──▶ │   Photo Pipeline      │ ──▶ │  FinalPhoto  │
//! │ (+ EXIF tag)   │     │  - orientation fix    │     │              │
//! │                │     │  - device rotation    │     │              │
//! │                │     │  - aspect crop        │     │              │
//! └────────────────┘     └───────────────────────┘     └──────────────┘
//!
//! ┌────────────────┐     ┌───────────────────────┐     ┌──────────────┐
//! │  Still Image   │ ──▶ │   Mask Synthesizer    │ ──▶ │  RGBA Mask   │
//! │                │     │  - saliency boxes     │     │ (strokes on  │
//! │                │     │  - contour outlines   │     │ transparent) │
//! └────────────────┘     └───────────────────────┘     └──────────────┘
//!
//! ┌────────────────┐     ┌───────────────────────┐     ┌──────────────┐
//! │ Stroke Drawing │ ──▶ │   Rasterizer          │ ──▶ │  RGBA Mask   │
//! └────────────────┘     └───────────────────────┘     └──────────────┘
//! ```
//!
//! # Modules
//!
//! - [`photo`]: Capture correction (orientation, rotation, crop)
//! - [`mask`]: Composition-guide mask synthesis
//! - [`drawing`]: Hand-drawn mask rasterization

pub mod drawing;
pub mod mask;
pub mod photo;
