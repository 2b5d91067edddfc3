// SPDX-License-Identifier: MPL-2.0

//! Mask preset persistence
//!
//! User presets live in a writable directory, named
//! `<provenance prefix><uuid>.png` so the listing can tell where a mask came
//! from without opening it. Built-in presets are `mask_*.png`/`mask_*.jpg`
//! files in a read-only bundle directory and can never be deleted.

use crate::config::Config;
use crate::constants::{file_formats, presets as consts};
use crate::errors::StorageError;
use crate::media::fit_within;
use image::{DynamicImage, ImageFormat, RgbaImage};
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// How a mask was produced
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MaskSource {
    /// User-added mask with no more specific origin
    Custom,
    /// Synthesized from a photo
    Ai,
    /// Drawn by hand
    Drawn,
    /// Uploaded image used as-is
    Uploaded,
    /// Shipped with the app, read-only
    BuiltIn,
}

impl MaskSource {
    /// File name prefix for user presets of this source
    pub fn prefix(&self) -> &'static str {
        match self {
            MaskSource::Ai => "mask_ai_",
            MaskSource::Drawn => "mask_draw_",
            MaskSource::Uploaded => "mask_img_",
            MaskSource::Custom | MaskSource::BuiltIn => consts::NAME_PREFIX,
        }
    }

    /// Recover the source of a user preset from its file name
    pub fn from_user_file_name(name: &str) -> Self {
        [MaskSource::Ai, MaskSource::Drawn, MaskSource::Uploaded]
            .into_iter()
            .find(|source| name.starts_with(source.prefix()))
            .unwrap_or(MaskSource::Custom)
    }

    /// Whether masks of this source may be deleted
    pub fn is_user_added(&self) -> bool {
        !matches!(self, MaskSource::BuiltIn)
    }
}

impl std::fmt::Display for MaskSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            MaskSource::Custom => "custom",
            MaskSource::Ai => "ai",
            MaskSource::Drawn => "drawn",
            MaskSource::Uploaded => "uploaded",
            MaskSource::BuiltIn => "built-in",
        };
        write!(f, "{name}")
    }
}

/// Stable identity of a preset: its file name
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PresetId(String);

impl PresetId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for PresetId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// One listed preset
#[derive(Debug, Clone, PartialEq)]
pub struct PresetEntry {
    pub id: PresetId,
    pub source: MaskSource,
    pub path: PathBuf,
}

impl PresetEntry {
    pub fn is_deletable(&self) -> bool {
        self.source.is_user_added()
    }
}

/// A decoded mask with its provenance
#[derive(Debug, Clone)]
pub struct MaskAsset {
    pub image: DynamicImage,
    pub source: MaskSource,
    pub id: PresetId,
}

/// Saves, lists and deletes mask presets
#[derive(Debug, Clone)]
pub struct PresetStore {
    user_dir: PathBuf,
    bundle_dir: Option<PathBuf>,
    max_dimension: u32,
    thumbnail_max_dimension: u32,
}

impl PresetStore {
    /// Store writing to `user_dir`, with optional built-ins in `bundle_dir`
    pub fn new(user_dir: impl Into<PathBuf>, bundle_dir: Option<PathBuf>) -> Self {
        Self {
            user_dir: user_dir.into(),
            bundle_dir,
            max_dimension: consts::MAX_DIMENSION,
            thumbnail_max_dimension: consts::THUMBNAIL_MAX_DIMENSION,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self {
            user_dir: config.presets_dir(),
            bundle_dir: config.bundle_dir.clone(),
            max_dimension: config.preset_max_dimension,
            thumbnail_max_dimension: config.thumbnail_max_dimension,
        }
    }

    pub fn user_dir(&self) -> &Path {
        &self.user_dir
    }

    /// Save a mask, downscaled to the preset size limit
    ///
    /// Returns the new identity, or `None` if writing failed. Built-in masks
    /// cannot be saved.
    pub fn save(&self, image: &DynamicImage, source: MaskSource) -> Option<PresetId> {
        if !source.is_user_added() {
            warn!("Refusing to save a mask as built-in");
            return None;
        }
        match self.try_save(image, source) {
            Ok(id) => Some(id),
            Err(e) => {
                warn!(error = %e, source = %source, "Failed to save preset");
                None
            }
        }
    }

    fn try_save(&self, image: &DynamicImage, source: MaskSource) -> Result<PresetId, StorageError> {
        std::fs::create_dir_all(&self.user_dir)?;

        let name = format!("{}{}.{}", source.prefix(), Uuid::new_v4(), consts::SAVE_EXTENSION);
        let path = self.user_dir.join(&name);
        let resized = fit_within(image, self.max_dimension);

        if let Err(e) = resized.save_with_format(&path, ImageFormat::Png) {
            let _ = std::fs::remove_file(&path);
            return Err(e.into());
        }

        info!(
            id = %name,
            width = resized.width(),
            height = resized.height(),
            "Preset saved"
        );
        Ok(PresetId(name))
    }

    /// List user presets (newest first) followed by built-ins (by name)
    pub async fn list(&self) -> Vec<PresetEntry> {
        let store = self.clone();
        tokio::task::spawn_blocking(move || store.list_blocking())
            .await
            .unwrap_or_else(|e| {
                warn!(error = %e, "Preset listing task failed");
                Vec::new()
            })
    }

    /// Blocking variant of [`list`](Self::list)
    pub fn list_blocking(&self) -> Vec<PresetEntry> {
        let mut user: Vec<(SystemTime, PresetEntry)> = scan_dir(&self.user_dir)
            .into_iter()
            .filter(|(name, _)| name.starts_with(consts::NAME_PREFIX))
            .filter_map(|(name, path)| {
                let modified = std::fs::metadata(&path).and_then(|m| m.modified()).ok()?;
                let source = MaskSource::from_user_file_name(&name);
                Some((
                    modified,
                    PresetEntry {
                        id: PresetId(name),
                        source,
                        path,
                    },
                ))
            })
            .collect();
        user.sort_by(|a, b| b.0.cmp(&a.0).then_with(|| a.1.id.cmp(&b.1.id)));

        let mut built_in: Vec<PresetEntry> = self
            .bundle_dir
            .as_deref()
            .map(scan_dir)
            .unwrap_or_default()
            .into_iter()
            .filter(|(name, _)| name.to_lowercase().starts_with(consts::NAME_PREFIX))
            .map(|(name, path)| PresetEntry {
                id: PresetId(name),
                source: MaskSource::BuiltIn,
                path,
            })
            .collect();
        built_in.sort_by(|a, b| a.id.cmp(&b.id));

        debug!(user = user.len(), built_in = built_in.len(), "Listed presets");
        user.into_iter().map(|(_, entry)| entry).chain(built_in).collect()
    }

    /// Delete a user preset
    ///
    /// Returns whether a file was removed. Unknown, built-in and path-like
    /// identities are ignored.
    pub fn delete(&self, id: &str) -> bool {
        let path = self.user_dir.join(id);
        if !is_plain_preset_name(id) || !path.is_file() {
            debug!(error = %StorageError::UnknownPreset(id.to_string()), "Nothing deleted");
            return false;
        }
        match std::fs::remove_file(&path) {
            Ok(()) => {
                info!(id, "Preset deleted");
                true
            }
            Err(e) => {
                warn!(id, error = %e, "Failed to delete preset");
                false
            }
        }
    }

    /// Decode a listed preset
    pub fn load(&self, entry: &PresetEntry) -> Option<MaskAsset> {
        match image::open(&entry.path) {
            Ok(image) => Some(MaskAsset {
                image,
                source: entry.source,
                id: entry.id.clone(),
            }),
            Err(e) => {
                warn!(id = %entry.id, error = %e, "Failed to load preset");
                None
            }
        }
    }

    /// Load one thumbnail on a blocking worker
    ///
    /// Each thumbnail is its own task, so a slow or broken file never holds
    /// up the others; abort the handle if the result is no longer wanted.
    pub fn spawn_thumbnail(&self, entry: &PresetEntry) -> JoinHandle<Option<RgbaImage>> {
        let path = entry.path.clone();
        let max_dimension = self.thumbnail_max_dimension;
        tokio::task::spawn_blocking(move || match image::open(&path) {
            Ok(image) => Some(fit_within(&image, max_dimension).to_rgba8()),
            Err(e) => {
                debug!(path = %path.display(), error = %e, "Thumbnail decode failed");
                None
            }
        })
    }

    /// Load thumbnails for all entries concurrently, in listing order
    pub async fn load_thumbnails(&self, entries: &[PresetEntry]) -> Vec<Option<RgbaImage>> {
        let handles: Vec<_> = entries.iter().map(|entry| self.spawn_thumbnail(entry)).collect();
        futures::future::join_all(handles)
            .await
            .into_iter()
            .map(|result| result.ok().flatten())
            .collect()
    }
}

/// Image files directly inside `dir` as (file name, path)
///
/// Unreadable entries are skipped; a missing directory lists as empty.
fn scan_dir(dir: &Path) -> Vec<(String, PathBuf)> {
    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) => {
            debug!(dir = %dir.display(), error = %e, "Preset directory not readable");
            return Vec::new();
        }
    };

    entries
        .flatten()
        .filter(|entry| entry.file_type().is_ok_and(|t| t.is_file()))
        .filter_map(|entry| {
            let path = entry.path();
            let ext = path.extension()?.to_str()?;
            if !file_formats::is_mask_extension(ext) {
                return None;
            }
            let name = entry.file_name().into_string().ok()?;
            Some((name, path))
        })
        .collect()
}

fn is_plain_preset_name(id: &str) -> bool {
    id.starts_with(consts::NAME_PREFIX)
        && !id.contains(['/', '\\'])
        && !id.contains("..")
        && Path::new(id).file_name().is_some_and(|name| name == id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_round_trips_through_prefix() {
        let sources = [
            MaskSource::Custom,
            MaskSource::Ai,
            MaskSource::Drawn,
            MaskSource::Uploaded,
        ];
        for source in sources {
            let name = format!("{}abc.png", source.prefix());
            assert_eq!(MaskSource::from_user_file_name(&name), source);
        }
        assert!(!MaskSource::BuiltIn.is_user_added());
    }

    #[test]
    fn test_path_like_identities_are_not_preset_names() {
        assert!(is_plain_preset_name("mask_ai_1234.png"));
        assert!(!is_plain_preset_name("../mask_x.png"));
        assert!(!is_plain_preset_name("mask_/../../etc"));
        assert!(!is_plain_preset_name("photo.png"));
    }
}
