// SPDX-License-Identifier: MPL-2.0

//! Storage for mask presets

pub mod presets;

pub use presets::{MaskAsset, MaskSource, PresetEntry, PresetId, PresetStore};
