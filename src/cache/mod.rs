//! The background cache manager.
//!
//! This module owns every decoded background, composited variant and
//! chooser preview, and hands out borrowed image handles to the UI layer:
//! - Entry bookkeeping and decode state (entry.rs)
//! - Debounced deferred reclamation (gc.rs)
//! - Subscribe/unsubscribe, lookups and preview generation (this file)
//!
//! All operations are synchronous and run on the host's event loop; the
//! only deferred element is the reclamation deadline, which the host
//! drives through [`BackgroundManager::poll_reclaim`].

pub mod entry;
pub mod gc;

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Instant;

use image::RgbaImage;

use crate::catalog::{self, DiscoveredImage};
use crate::color::Color;
use crate::compose;
use crate::preview::PreviewStore;
use self::entry::{CompositeEntry, CompositeKey, ImageEntry};
use self::gc::ReclaimTimer;

/// Shared cache of panel background images.
///
/// One instance serves every UI consumer. Consumers subscribe to an image
/// (plain, or composited onto a color), fetch the ready-to-draw buffer any
/// number of times, and unsubscribe when done; buffers are reclaimed
/// lazily once nothing references them.
#[derive(Debug)]
pub struct BackgroundManager {
    /// Catalog entries in discovery order. Lookup by name returns the
    /// first match, so earlier search roots shadow later ones.
    images: Vec<ImageEntry>,
    /// Composited variants, keyed by (name, color). The map is the sole
    /// owner; `remove` during reclamation is the only deletion path.
    composites: HashMap<CompositeKey, CompositeEntry>,
    timer: ReclaimTimer,
    previews: PreviewStore,
}

impl BackgroundManager {
    /// Discover backgrounds in the default search roots and cache
    /// previews under the user cache directory.
    pub fn new() -> Self {
        Self::with_paths(&catalog::default_search_roots(), PreviewStore::in_user_cache())
    }

    /// Explicit roots and preview store (embedding hosts, tests).
    pub fn with_paths(search_roots: &[PathBuf], previews: PreviewStore) -> Self {
        let images: Vec<ImageEntry> = catalog::discover(search_roots)
            .into_iter()
            .map(ImageEntry::new)
            .collect();

        println!("🖼️  Found {} background image(s)", images.len());

        BackgroundManager {
            images,
            composites: HashMap::new(),
            timer: ReclaimTimer::default(),
            previews,
        }
    }

    /// Register a single image file directly, bypassing discovery.
    /// Returns `false` when the path has no usable file name.
    pub fn register(&mut self, location: PathBuf) -> bool {
        match DiscoveredImage::from_location(location) {
            Some(image) => {
                self.images.push(ImageEntry::new(image));
                true
            }
            None => false,
        }
    }

    fn entry_for(&self, name: &str) -> Option<&ImageEntry> {
        self.images.iter().find(|e| e.name == name)
    }

    fn entry_for_mut(&mut self, name: &str) -> Option<&mut ImageEntry> {
        self.images.iter_mut().find(|e| e.name == name)
    }

    // --- subscription -----------------------------------------------------

    /// Subscribe to the plain image `name`.
    ///
    /// The first successful call decodes the source file and resolves the
    /// tiled flag; later calls only bump the subscriber count. Returns
    /// `false` for unknown names and for images that will not decode
    /// (the failure is remembered, not retried).
    pub fn subscribe(&mut self, name: &str) -> bool {
        let Some(entry) = self.entry_for_mut(name) else {
            eprintln!("⚠️  Subscribe to unknown background: {}", name);
            return false;
        };
        if !entry.ensure_decoded() {
            return false;
        }
        entry.add_subscriber();
        true
    }

    /// Subscribe to `name` flattened onto `color`.
    ///
    /// Requires the plain image to be currently loaded and valid; this
    /// never decodes the source as a side effect. The first call for a
    /// given (name, color) renders the composite; later calls reuse it.
    pub fn subscribe_composite(&mut self, name: &str, color: Color) -> bool {
        let source = self
            .images
            .iter()
            .find(|e| e.name == name)
            .and_then(|e| e.image());
        let Some(source) = source else {
            eprintln!(
                "⚠️  Composite subscribe needs a loaded source: ({}, {})",
                name, color
            );
            return false;
        };

        let key = (name.to_string(), color);
        let entry = self
            .composites
            .entry(key)
            .or_insert_with(|| CompositeEntry::new(compose::flatten_onto(color, source)));
        entry.add_subscriber();
        true
    }

    /// Drop one plain subscription. Unknown names are logged, not fatal.
    pub fn unsubscribe(&mut self, name: &str) {
        let count = match self.entry_for_mut(name) {
            Some(entry) => entry.remove_subscriber(),
            None => {
                eprintln!("⚠️  Unsubscribe from unknown background: {}", name);
                return;
            }
        };
        if count == 0 {
            self.request_delayed_reclaim();
        }
    }

    /// Drop one composite subscription. Unknown keys are logged, not fatal.
    pub fn unsubscribe_composite(&mut self, name: &str, color: Color) {
        let key = (name.to_string(), color);
        let count = match self.composites.get_mut(&key) {
            Some(entry) => entry.remove_subscriber(),
            None => {
                eprintln!(
                    "⚠️  Unsubscribe from unknown composite: ({}, {})",
                    name, color
                );
                return;
            }
        };
        if count == 0 {
            self.request_delayed_reclaim();
        }
    }

    // --- retrieval (pure lookups, no side effects) ------------------------

    /// The decoded plain image, if currently cached and valid.
    pub fn image(&self, name: &str) -> Option<&RgbaImage> {
        self.entry_for(name).and_then(|e| e.image())
    }

    /// The composited buffer for (name, color), if currently cached.
    pub fn composite_image(&self, name: &str, color: Color) -> Option<&RgbaImage> {
        let key = (name.to_string(), color);
        self.composites.get(&key).map(|e| &e.pixmap)
    }

    /// The resolved tiling flag; `false` when the entry is unknown or its
    /// image is not currently loaded and valid.
    pub fn is_tiled(&self, name: &str) -> bool {
        match self.entry_for(name) {
            Some(entry) if entry.image().is_some() => entry.tiled,
            _ => false,
        }
    }

    /// Whether `name` is in the catalog.
    pub fn exists(&self, name: &str) -> bool {
        self.entry_for(name).is_some()
    }

    /// All known names in discovery order. Names duplicated across search
    /// roots appear more than once, as discovered.
    pub fn image_names(&self) -> Vec<String> {
        self.images.iter().map(|e| e.name.clone()).collect()
    }

    /// Source file path for `name`, if known.
    pub fn path_for(&self, name: &str) -> Option<&Path> {
        self.entry_for(name).map(|e| e.location.as_path())
    }

    /// Path of the saved preview file for `name`, if one exists on disk.
    pub fn preview_path_for(&self, name: &str) -> Option<PathBuf> {
        let entry = self.entry_for(name)?;
        self.previews.existing_path(&entry.name)
    }

    /// Diagnostic: how many times a decode was attempted for `name`.
    /// Zero for unknown names and for entries never touched.
    pub fn decode_attempts(&self, name: &str) -> u32 {
        self.entry_for(name).map_or(0, |e| e.decode_attempts)
    }

    // --- preview generation -----------------------------------------------

    /// The chooser preview for `name` (at most 100x75, on opaque white).
    ///
    /// Looks in order at: the in-process cache, the preview file saved by
    /// an earlier run, and finally a fresh rendering from the decoded
    /// source. Rendering decodes the source (and resolves the tiled flag)
    /// without subscribing it: a preview request means the full image is
    /// likely needed soon, so the decode is kept around but a delayed
    /// reclamation is scheduled in case it never is.
    pub fn preview(&mut self, name: &str) -> Option<&RgbaImage> {
        let Some(idx) = self.images.iter().position(|e| e.name == name) else {
            eprintln!("⚠️  Preview of unknown background: {}", name);
            return None;
        };

        // Already computed in-process.
        if self.images[idx].preview.is_some() {
            return self.images[idx].preview.as_ref();
        }

        // Saved by a previous run.
        if let Some(loaded) = self.previews.load(name) {
            self.images[idx].preview = Some(loaded);
            return self.images[idx].preview.as_ref();
        }

        // Render from the source, decoding it if needed.
        if !self.images[idx].ensure_decoded() {
            return None;
        }
        let rendered = match self.images[idx].image() {
            Some(source) => compose::render_preview(source),
            None => return None,
        };

        // Best effort: a failed save only costs a re-render next run.
        if let Err(e) = self.previews.save(name, &rendered) {
            eprintln!("⚠️  Could not save preview for {}: {}", name, e);
        }

        self.images[idx].preview = Some(rendered);
        self.request_delayed_reclaim();
        self.images[idx].preview.as_ref()
    }

    // --- deferred reclamation ---------------------------------------------

    /// Arm the reclamation deadline unless one is already pending.
    pub fn request_delayed_reclaim(&mut self) {
        self.timer.request(Instant::now());
    }

    /// Whether a reclamation deadline is currently armed.
    pub fn reclaim_pending(&self) -> bool {
        self.timer.is_armed()
    }

    /// Event-loop hook: run the reclamation pass if the armed deadline
    /// has elapsed. Returns whether a pass ran.
    pub fn poll_reclaim(&mut self) -> bool {
        if self.timer.fire_if_due(Instant::now()) {
            self.run_reclaim_pass();
            true
        } else {
            false
        }
    }

    /// Run the reclamation pass immediately and disarm any pending
    /// deadline.
    pub fn reclaim_now(&mut self) {
        self.timer.disarm();
        self.run_reclaim_pass();
    }

    /// Release unreferenced buffers: plain entries drop their decoded
    /// image (previews are cheap and kept for the chooser); composite
    /// entries are removed outright, they can be re-rendered from the
    /// still-known source and color.
    fn run_reclaim_pass(&mut self) {
        let mut released = 0;
        for entry in &mut self.images {
            if entry.subscribers == 0 && entry.release_image() {
                released += 1;
            }
        }

        let before = self.composites.len();
        self.composites.retain(|_, entry| entry.subscribers > 0);
        let removed = before - self.composites.len();

        if released > 0 || removed > 0 {
            println!(
                "🧹 Reclaimed {} background(s), {} composite(s)",
                released, removed
            );
        }
    }
}

impl Default for BackgroundManager {
    fn default() -> Self {
        Self::new()
    }
}
