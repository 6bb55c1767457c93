//! End-to-end tests of the background cache manager over real PNG files.

use std::fs;
use std::path::PathBuf;

use image::{Rgba, RgbaImage};
use tempfile::TempDir;

use backdrops::{BackgroundManager, Color, PreviewStore};

/// A temp search root with a `backgrounds/` dir holding the given images.
struct Fixture {
    root: TempDir,
}

impl Fixture {
    fn new() -> Self {
        let root = tempfile::tempdir().unwrap();
        fs::create_dir_all(root.path().join("backgrounds")).unwrap();
        Fixture { root }
    }

    fn add_solid(&self, name: &str, w: u32, h: u32, pixel: Rgba<u8>) {
        RgbaImage::from_pixel(w, h, pixel)
            .save(self.root.path().join("backgrounds").join(name))
            .unwrap();
    }

    /// An image whose left half is transparent and right half is `pixel`.
    fn add_half_transparent(&self, name: &str, w: u32, h: u32, pixel: Rgba<u8>) {
        let img = RgbaImage::from_fn(w, h, |x, _| {
            if x < w / 2 {
                Rgba([0, 0, 0, 0])
            } else {
                pixel
            }
        });
        img.save(self.root.path().join("backgrounds").join(name))
            .unwrap();
    }

    fn add_corrupt(&self, name: &str) {
        fs::write(
            self.root.path().join("backgrounds").join(name),
            b"definitely not a png",
        )
        .unwrap();
    }

    fn preview_dir(&self) -> PathBuf {
        self.root.path().join("previews")
    }

    fn manager(&self) -> BackgroundManager {
        BackgroundManager::with_paths(
            &[self.root.path().to_path_buf()],
            PreviewStore::new(self.preview_dir()),
        )
    }
}

#[test]
fn lookup_without_subscribe_never_decodes() {
    let fixture = Fixture::new();
    fixture.add_solid("sky.png", 8, 8, Rgba([0, 0, 200, 255]));
    let manager = fixture.manager();

    assert!(manager.image("sky.png").is_none());
    assert!(manager.composite_image("sky.png", Color::WHITE).is_none());
    assert!(!manager.is_tiled("sky.png"));
    assert_eq!(manager.decode_attempts("sky.png"), 0);
}

#[test]
fn repeated_subscribes_decode_once() {
    let fixture = Fixture::new();
    fixture.add_solid("sky.png", 8, 8, Rgba([0, 0, 200, 255]));
    let mut manager = fixture.manager();

    for _ in 0..5 {
        assert!(manager.subscribe("sky.png"));
    }
    assert_eq!(manager.decode_attempts("sky.png"), 1);
    assert!(manager.image("sky.png").is_some());
}

#[test]
fn subscribe_unknown_name_fails() {
    let fixture = Fixture::new();
    let mut manager = fixture.manager();
    assert!(!manager.subscribe("nope.png"));
}

#[test]
fn corrupt_image_fails_sticky() {
    let fixture = Fixture::new();
    fixture.add_corrupt("broken.png");
    let mut manager = fixture.manager();

    assert!(!manager.subscribe("broken.png"));
    assert!(!manager.subscribe("broken.png"));
    // The failure is remembered; the file is not re-read every call.
    assert_eq!(manager.decode_attempts("broken.png"), 1);
    assert!(manager.image("broken.png").is_none());
    assert!(manager.preview("broken.png").is_none());
}

#[test]
fn composite_requires_loaded_source() {
    let fixture = Fixture::new();
    fixture.add_solid("sky.png", 8, 8, Rgba([0, 0, 200, 255]));
    let mut manager = fixture.manager();

    // No plain subscription yet: refused, and no entry is created.
    assert!(!manager.subscribe_composite("sky.png", Color::WHITE));
    assert!(manager.composite_image("sky.png", Color::WHITE).is_none());
    assert_eq!(manager.decode_attempts("sky.png"), 0);

    assert!(manager.subscribe("sky.png"));
    assert!(manager.subscribe_composite("sky.png", Color::WHITE));
    assert!(manager.composite_image("sky.png", Color::WHITE).is_some());
}

#[test]
fn composites_are_distinct_per_color() {
    let fixture = Fixture::new();
    // Left half transparent, right half opaque green.
    fixture.add_half_transparent("leaf.png", 8, 8, Rgba([0, 200, 0, 255]));
    let mut manager = fixture.manager();
    assert!(manager.subscribe("leaf.png"));

    let red = Color::new(255, 0, 0);
    let blue = Color::new(0, 0, 255);
    assert!(manager.subscribe_composite("leaf.png", red));
    assert!(manager.subscribe_composite("leaf.png", blue));

    let on_red = manager.composite_image("leaf.png", red).unwrap();
    let on_blue = manager.composite_image("leaf.png", blue).unwrap();

    // The fill shows through where the source was transparent...
    assert_eq!(*on_red.get_pixel(0, 0), Rgba([255, 0, 0, 255]));
    assert_eq!(*on_blue.get_pixel(0, 0), Rgba([0, 0, 255, 255]));
    // ...and the source wins where it was opaque.
    assert_eq!(*on_red.get_pixel(7, 0), Rgba([0, 200, 0, 255]));
    assert_eq!(*on_blue.get_pixel(7, 0), Rgba([0, 200, 0, 255]));
}

#[test]
fn reclaim_after_unsubscribe_releases_then_redecodes() {
    let fixture = Fixture::new();
    fixture.add_solid("sky.png", 8, 8, Rgba([0, 0, 200, 255]));
    let mut manager = fixture.manager();

    assert!(manager.subscribe("sky.png"));
    manager.unsubscribe("sky.png");

    // Reclamation is deferred: still retrievable until the pass runs.
    assert!(manager.image("sky.png").is_some());
    assert!(manager.reclaim_pending());

    manager.reclaim_now();
    assert!(manager.image("sky.png").is_none());

    // Transparently decodable again.
    assert!(manager.subscribe("sky.png"));
    assert!(manager.image("sky.png").is_some());
    assert_eq!(manager.decode_attempts("sky.png"), 2);
}

#[test]
fn reclaim_removes_unreferenced_composites() {
    let fixture = Fixture::new();
    fixture.add_solid("sky.png", 8, 8, Rgba([0, 0, 200, 255]));
    let mut manager = fixture.manager();

    let red = Color::new(255, 0, 0);
    assert!(manager.subscribe("sky.png"));
    assert!(manager.subscribe_composite("sky.png", red));

    manager.unsubscribe_composite("sky.png", red);
    assert!(manager.composite_image("sky.png", red).is_some());

    manager.reclaim_now();
    // The composite entry is gone; the still-subscribed plain image stays.
    assert!(manager.composite_image("sky.png", red).is_none());
    assert!(manager.image("sky.png").is_some());
}

#[test]
fn over_unsubscribe_cannot_evict_other_entries() {
    let fixture = Fixture::new();
    fixture.add_solid("a.png", 8, 8, Rgba([10, 0, 0, 255]));
    fixture.add_solid("b.png", 8, 8, Rgba([0, 10, 0, 255]));
    let mut manager = fixture.manager();

    assert!(manager.subscribe("a.png"));
    assert!(manager.subscribe("b.png"));

    // Buggy caller unsubscribes a.png three times.
    manager.unsubscribe("a.png");
    manager.unsubscribe("a.png");
    manager.unsubscribe("a.png");

    manager.reclaim_now();
    // b.png is untouched; a.png is reclaimed as its count reached zero.
    assert!(manager.image("b.png").is_some());
    assert!(manager.image("a.png").is_none());
}

#[test]
fn over_unsubscribe_cannot_mask_a_later_subscription() {
    let fixture = Fixture::new();
    fixture.add_solid("a.png", 8, 8, Rgba([10, 0, 0, 255]));
    let mut manager = fixture.manager();

    assert!(manager.subscribe("a.png"));
    manager.unsubscribe("a.png");
    manager.unsubscribe("a.png"); // spurious; count clamps at zero
    manager.unsubscribe("a.png"); // spurious

    // A fresh legitimate subscription must survive the next pass.
    assert!(manager.subscribe("a.png"));
    manager.reclaim_now();
    assert!(manager.image("a.png").is_some());
}

#[test]
fn preview_small_source_is_not_upscaled() {
    let fixture = Fixture::new();
    fixture.add_half_transparent("tiny.png", 40, 30, Rgba([200, 0, 0, 255]));
    let mut manager = fixture.manager();

    let preview = manager.preview("tiny.png").unwrap();
    assert_eq!(preview.dimensions(), (40, 30));
    // Transparent half composited onto white.
    assert_eq!(*preview.get_pixel(0, 0), Rgba([255, 255, 255, 255]));
}

#[test]
fn preview_wide_source_is_width_bound() {
    let fixture = Fixture::new();
    fixture.add_solid("wide.png", 400, 100, Rgba([0, 0, 0, 255]));
    let mut manager = fixture.manager();

    let preview = manager.preview("wide.png").unwrap();
    assert_eq!(preview.dimensions(), (100, 25));
}

#[test]
fn preview_decodes_without_subscribing_and_schedules_reclaim() {
    let fixture = Fixture::new();
    fixture.add_solid("sky.png", 200, 200, Rgba([0, 0, 200, 255]));
    let mut manager = fixture.manager();

    assert!(manager.preview("sky.png").is_some());
    // The implicit decode is kept for an imminent subscribe...
    assert!(manager.image("sky.png").is_some());
    // ...but a deferred pass is armed to release it if that never comes.
    assert!(manager.reclaim_pending());

    manager.reclaim_now();
    assert!(manager.image("sky.png").is_none());
    assert!(manager.preview("sky.png").is_some());
}

#[test]
fn preview_is_persisted_and_reloaded_without_decoding() {
    let fixture = Fixture::new();
    fixture.add_solid("sky.png", 200, 200, Rgba([0, 0, 200, 255]));

    {
        let mut manager = fixture.manager();
        assert!(manager.preview("sky.png").is_some());
        assert!(manager.preview_path_for("sky.png").is_some());
    }

    // A fresh process finds the saved file and skips the expensive decode.
    let mut manager = fixture.manager();
    let preview = manager.preview("sky.png").unwrap();
    assert_eq!(preview.dimensions(), (75, 75));
    assert_eq!(manager.decode_attempts("sky.png"), 0);
}

#[test]
fn reclaim_requests_within_window_coalesce() {
    let fixture = Fixture::new();
    fixture.add_solid("a.png", 8, 8, Rgba([10, 0, 0, 255]));
    fixture.add_solid("b.png", 8, 8, Rgba([0, 10, 0, 255]));
    let mut manager = fixture.manager();

    assert!(manager.subscribe("a.png"));
    assert!(manager.subscribe("b.png"));
    manager.unsubscribe("a.png");
    manager.unsubscribe("b.png");

    // Two drops, one armed deadline; it has not elapsed yet.
    assert!(manager.reclaim_pending());
    assert!(!manager.poll_reclaim());

    manager.reclaim_now();
    // The pass consumed the deadline: nothing further is pending.
    assert!(!manager.reclaim_pending());
    assert!(!manager.poll_reclaim());
}

#[test]
fn exists_and_path_for_unknown_name() {
    let fixture = Fixture::new();
    fixture.add_solid("sky.png", 8, 8, Rgba([0, 0, 200, 255]));
    let manager = fixture.manager();

    assert!(manager.exists("sky.png"));
    assert!(!manager.exists("nonexistent.png"));
    assert!(manager.path_for("nonexistent.png").is_none());

    let path = manager.path_for("sky.png").unwrap();
    assert!(path.ends_with("backgrounds/sky.png"));
}
