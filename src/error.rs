//! Error types for internal fallible operations.
//!
//! The public manager API reports failure through `bool` / `Option` only;
//! these errors stay inside the crate (decode helpers, preview
//! persistence) and in log messages.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum BackdropError {
    /// A rendered preview could not be written to the cache directory.
    #[error("failed to save preview {path}: {source}")]
    PreviewSave {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    /// Filesystem error outside of encode/decode (directory creation etc.).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
