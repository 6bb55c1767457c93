//! On-disk cache of rendered background previews.
//!
//! Previews are small (at most 100x75) and cheap to store, so they are
//! persisted once rendered and reloaded on later runs instead of decoding
//! the full-size source again. The cache directory lives under the user
//! cache dir by default:
//! - Linux: ~/.cache/backdrops/backgrounds/previews
//! - macOS: ~/Library/Caches/backdrops/backgrounds/previews
//!
//! The store is purely a performance optimization: every file in it can be
//! regenerated from the source images, and save failures are non-fatal.

use std::fs;
use std::path::{Path, PathBuf};

use image::{ImageFormat, RgbaImage};

use crate::error::BackdropError;

/// Load/save access to the preview cache directory.
#[derive(Debug, Clone)]
pub struct PreviewStore {
    dir: PathBuf,
}

impl PreviewStore {
    /// Store rooted at an explicit directory (created lazily on save).
    pub fn new(dir: PathBuf) -> Self {
        PreviewStore { dir }
    }

    /// Store rooted in the user cache directory.
    pub fn in_user_cache() -> Self {
        let mut dir = dirs_next::cache_dir()
            .or_else(dirs_next::home_dir)
            .unwrap_or_else(|| PathBuf::from("."));
        dir.push("backdrops");
        dir.push("backgrounds");
        dir.push("previews");
        PreviewStore::new(dir)
    }

    /// The cache directory this store reads and writes.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Where the preview for `name` is (or would be) stored.
    pub fn path(&self, name: &str) -> PathBuf {
        self.dir.join(name)
    }

    /// Path of a previously saved preview, `None` if none exists on disk.
    pub fn existing_path(&self, name: &str) -> Option<PathBuf> {
        let path = self.path(name);
        if path.is_file() {
            Some(path)
        } else {
            None
        }
    }

    /// Load a previously saved preview. Missing or corrupt files yield
    /// `None`; a corrupt file will simply be re-rendered and overwritten.
    pub fn load(&self, name: &str) -> Option<RgbaImage> {
        let path = self.existing_path(name)?;
        match image::open(&path) {
            Ok(decoded) => Some(decoded.to_rgba8()),
            Err(_) => None,
        }
    }

    /// Persist a rendered preview as PNG, creating the cache directory on
    /// first use. Callers treat failure as best-effort.
    pub fn save(&self, name: &str, preview: &RgbaImage) -> Result<(), BackdropError> {
        fs::create_dir_all(&self.dir)?;
        let path = self.path(name);
        preview
            .save_with_format(&path, ImageFormat::Png)
            .map_err(|source| BackdropError::PreviewSave {
                path: path.clone(),
                source,
            })?;
        Ok(())
    }
}
