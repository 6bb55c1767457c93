//! Per-image sidecar configuration.
//!
//! Each background image may ship with a `<location>.config` sidecar file
//! telling the UI whether the image should be tiled instead of stretched.
//! The sidecar is a tiny JSON document, e.g. `{"tiled": true}`.
//!
//! Reading is deliberately forgiving: a missing sidecar, unreadable file,
//! malformed JSON or absent key all resolve to the default (not tiled).
//! Callers never see an error from this module.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Settings stored in an image's sidecar file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ImageConfig {
    /// Whether the image is meant to be tiled across the panel.
    #[serde(default)]
    pub tiled: bool,
}

impl ImageConfig {
    /// Serialize to JSON for writing a sidecar file.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Deserialize from sidecar JSON.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

/// Path of the sidecar file for an image at `location`.
///
/// The sidecar sits next to the image with `.config` appended to the full
/// file name (`sky.png` -> `sky.png.config`).
pub fn sidecar_path(location: &Path) -> PathBuf {
    let mut name = location.as_os_str().to_os_string();
    name.push(".config");
    PathBuf::from(name)
}

/// Resolve the `tiled` flag for the image at `location`.
///
/// Defaults to `false` on any read or parse failure.
pub fn read_tiled(location: &Path) -> bool {
    let path = sidecar_path(location);
    let json = match fs::read_to_string(&path) {
        Ok(json) => json,
        Err(_) => return false,
    };
    match ImageConfig::from_json(&json) {
        Ok(config) => config.tiled,
        Err(_) => false,
    }
}
