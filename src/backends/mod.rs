// SPDX-License-Identifier: MPL-2.0

//! Hardware collaborators: capture device and motion sensor
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │                  App Layer                   │
//! └────────────────────┬────────────────────────┘
//!                      │
//! ┌────────────────────┴────────────────────────┐
//! │              Backend Layer                   │
//! │  ┌──────────────────┐  ┌─────────────────┐  │
//! │  │ OrientationTrack │─▶│ CaptureControl  │  │
//! │  │  (accelerometer) │  │ (device worker) │  │
//! │  └──────────────────┘  └─────────────────┘  │
//! └─────────────────────────────────────────────┘
//! ```
//!
//! # Modules
//!
//! - [`camera`]: capture device traits, controller and a file-backed device
//! - [`motion`]: accelerometer-driven orientation tracking

pub mod camera;
pub mod motion;
