//! Shared cache of panel background images for a note-taking app.
//!
//! Many UI panels can show the same background image, plain or flattened
//! onto an arbitrary color. Decoding, compositing and preview rendering
//! are expensive, so this crate does each at most once per distinct key
//! and reclaims the buffers lazily once nothing references them:
//!
//! - Discovery of installed images across search roots (catalog.rs)
//! - Sidecar per-image configuration, the "tiled" flag (config.rs)
//! - Pixel operations: flatten-onto-color, preview downscale (compose.rs)
//! - On-disk preview cache (preview.rs)
//! - The reference-counting manager and its deferred reclamation (cache/)
//!
//! Consumers hold the single [`BackgroundManager`], subscribe before
//! relying on a buffer, and unsubscribe when done; a debounced 60-second
//! deadline coalesces drops into one reclamation pass, driven from the
//! host event loop via [`BackgroundManager::poll_reclaim`].

pub mod cache;
pub mod catalog;
pub mod color;
pub mod compose;
pub mod config;
pub mod error;
pub mod preview;

pub use cache::entry::{CompositeEntry, DecodeState, ImageEntry};
pub use cache::gc::{ReclaimTimer, RECLAIM_DELAY};
pub use cache::BackgroundManager;
pub use catalog::DiscoveredImage;
pub use color::Color;
pub use error::BackdropError;
pub use preview::PreviewStore;
