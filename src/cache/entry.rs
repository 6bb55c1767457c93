//! Cache entry data model.
//!
//! One `ImageEntry` exists per catalog image for the whole process
//! lifetime; only its heavy buffers (decoded image, preview) come and go.
//! `CompositeEntry` records are created on demand per (name, color) pair
//! and removed entirely once unreferenced.

use std::path::PathBuf;

use image::RgbaImage;

use crate::catalog::DiscoveredImage;
use crate::color::Color;
use crate::config;

/// Decode lifecycle of a background image.
///
/// `Failed` is sticky for the rest of the process: a file that would not
/// decode once is not retried on every lookup. `Loaded` can drop back to
/// `Unloaded` when a reclamation pass releases the buffer.
#[derive(Debug, Default)]
pub enum DecodeState {
    #[default]
    Unloaded,
    Loaded(RgbaImage),
    Failed,
}

impl DecodeState {
    /// The single "is this usable" accessor: a decoded, non-empty image.
    pub fn image(&self) -> Option<&RgbaImage> {
        match self {
            DecodeState::Loaded(image) => Some(image),
            _ => None,
        }
    }

    pub fn is_unloaded(&self) -> bool {
        matches!(self, DecodeState::Unloaded)
    }
}

/// One known background image and its cached buffers.
#[derive(Debug)]
pub struct ImageEntry {
    /// Lookup key, the source file's base name.
    pub name: String,
    /// Full path to the source file.
    pub location: PathBuf,
    /// Tiling flag from the sidecar config, resolved at first decode.
    pub tiled: bool,
    /// Decoded source image, if currently loaded.
    pub state: DecodeState,
    /// Cached chooser preview (at most 100x75). Never reclaimed.
    pub preview: Option<RgbaImage>,
    /// Number of active subscribers holding this entry.
    pub subscribers: u32,
    /// How many times a decode was attempted (stats; drives the
    /// decode-at-most-once tests).
    pub decode_attempts: u32,
}

impl ImageEntry {
    pub fn new(image: DiscoveredImage) -> Self {
        ImageEntry {
            name: image.name,
            location: image.location,
            tiled: false,
            state: DecodeState::Unloaded,
            preview: None,
            subscribers: 0,
            decode_attempts: 0,
        }
    }

    /// The decoded image, if present and valid.
    pub fn image(&self) -> Option<&RgbaImage> {
        self.state.image()
    }

    /// Decode the source file and resolve the tiled flag, once.
    ///
    /// `Loaded` and `Failed` states return immediately; only `Unloaded`
    /// triggers work. Returns whether the entry is usable afterwards.
    pub fn ensure_decoded(&mut self) -> bool {
        if self.state.is_unloaded() {
            self.decode_attempts += 1;
            self.state = match image::open(&self.location) {
                Ok(decoded) => {
                    let rgba = decoded.to_rgba8();
                    if rgba.width() == 0 || rgba.height() == 0 {
                        DecodeState::Failed
                    } else {
                        DecodeState::Loaded(rgba)
                    }
                }
                Err(e) => {
                    eprintln!(
                        "⚠️  Failed to load background {}: {}",
                        self.location.display(),
                        e
                    );
                    DecodeState::Failed
                }
            };
            // Resolved together with the decode so the flag is ready when
            // the image gets used (default: not tiled).
            self.tiled = config::read_tiled(&self.location);
        }
        self.image().is_some()
    }

    pub fn add_subscriber(&mut self) {
        self.subscribers += 1;
    }

    /// Decrement the subscriber count, clamped at zero so a spurious
    /// extra unsubscribe cannot mask a later legitimate subscription.
    /// Returns the new count.
    pub fn remove_subscriber(&mut self) -> u32 {
        self.subscribers = self.subscribers.saturating_sub(1);
        self.subscribers
    }

    /// Release the decoded buffer, keeping the preview and the sticky
    /// failure state. Returns whether anything was released.
    pub fn release_image(&mut self) -> bool {
        if self.image().is_some() {
            self.state = DecodeState::Unloaded;
            true
        } else {
            false
        }
    }
}

/// Key of a composited background: (image name, fill color).
pub type CompositeKey = (String, Color);

/// A source image flattened onto a solid color.
#[derive(Debug)]
pub struct CompositeEntry {
    /// The flattened, fully opaque buffer.
    pub pixmap: RgbaImage,
    /// Number of active subscribers holding this entry.
    pub subscribers: u32,
}

impl CompositeEntry {
    pub fn new(pixmap: RgbaImage) -> Self {
        CompositeEntry {
            pixmap,
            subscribers: 0,
        }
    }

    pub fn add_subscriber(&mut self) {
        self.subscribers += 1;
    }

    /// Clamped decrement, same rationale as [`ImageEntry::remove_subscriber`].
    pub fn remove_subscriber(&mut self) -> u32 {
        self.subscribers = self.subscribers.saturating_sub(1);
        self.subscribers
    }
}
