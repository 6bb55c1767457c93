//! Discovery of installed background images.
//!
//! Background images live in a `backgrounds/` subdirectory of each search
//! root (e.g. the application's data directory). Discovery runs once at
//! startup; the resulting set is immutable afterwards, apart from explicit
//! programmatic registration on the manager.

use std::path::{Path, PathBuf};

use walkdir::WalkDir;

/// File extension accepted for background images.
const BACKGROUND_EXTENSION: &str = "png";

/// Name of the per-root subdirectory holding background images.
const BACKGROUNDS_SUBDIR: &str = "backgrounds";

/// A background image file found during discovery.
#[derive(Debug, Clone, PartialEq)]
pub struct DiscoveredImage {
    /// Lookup key: the file's base name (e.g. "sky.png").
    pub name: String,
    /// Full path to the source file.
    pub location: PathBuf,
}

impl DiscoveredImage {
    /// Build a record from a source path. Returns `None` when the path has
    /// no usable file name.
    pub fn from_location(location: PathBuf) -> Option<DiscoveredImage> {
        let name = location.file_name()?.to_string_lossy().to_string();
        Some(DiscoveredImage { name, location })
    }
}

/// The default search root: the user data directory for this application.
///
/// Hosts with additional roots (system-wide installs, portable bundles)
/// pass their own list to the manager instead.
pub fn default_search_roots() -> Vec<PathBuf> {
    let mut roots = Vec::new();
    if let Some(mut dir) = dirs::data_dir().or_else(|| dirs::home_dir()) {
        dir.push("backdrops");
        roots.push(dir);
    }
    roots
}

/// Scan `<root>/backgrounds/` in every search root for image files.
///
/// Per directory the files are sorted by name, case-insensitively. Only
/// plain files with the expected extension are taken; symlinks are not
/// followed. Roots without a `backgrounds/` directory are skipped.
///
/// Duplicate names across roots are all kept: lookup by name resolves to
/// the first-registered entry, so earlier roots shadow later ones.
pub fn discover(search_roots: &[PathBuf]) -> Vec<DiscoveredImage> {
    let mut found = Vec::new();

    for root in search_roots {
        let dir = root.join(BACKGROUNDS_SUBDIR);
        if !dir.is_dir() {
            continue;
        }

        let mut files: Vec<PathBuf> = WalkDir::new(&dir)
            .min_depth(1)
            .max_depth(1)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
            .map(|e| e.into_path())
            .filter(|path| has_background_extension(path))
            .collect();

        files.sort_by_key(|path| {
            path.file_name()
                .map(|n| n.to_string_lossy().to_lowercase())
                .unwrap_or_default()
        });

        for path in files {
            if let Some(image) = DiscoveredImage::from_location(path) {
                found.push(image);
            }
        }
    }

    found
}

fn has_background_extension(path: &Path) -> bool {
    match path.extension() {
        Some(ext) => ext.to_string_lossy().eq_ignore_ascii_case(BACKGROUND_EXTENSION),
        None => false,
    }
}
