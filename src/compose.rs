//! Pixel operations on decoded backgrounds.
//!
//! Two derived renderings exist: a source image flattened onto a solid
//! color (for opaque panel backgrounds) and a small fit-within-box preview
//! for the background chooser. Both produce fully opaque buffers.

use image::imageops::{self, FilterType};
use image::RgbaImage;

use crate::color::Color;

/// Maximum preview width in pixels.
pub const PREVIEW_MAX_WIDTH: u32 = 100;

/// Maximum preview height in pixels.
pub const PREVIEW_MAX_HEIGHT: u32 = 75;

/// Background color previews are composited onto.
const PREVIEW_BACKGROUND: Color = Color::WHITE;

/// Flatten `source` onto a solid fill of `color`.
///
/// The result has the source's dimensions and no transparency: the fill is
/// opaque and the source is alpha-blended on top of it.
pub fn flatten_onto(color: Color, source: &RgbaImage) -> RgbaImage {
    let mut flattened =
        RgbaImage::from_pixel(source.width(), source.height(), color.to_rgba());
    imageops::overlay(&mut flattened, source, 0, 0);
    flattened
}

/// Target preview dimensions for a source of `width` x `height`.
///
/// Shrinks by the width ratio first, then re-checks the height and shrinks
/// again if still too tall. Images that already fit are left untouched
/// (previews never upscale). Integer arithmetic, matching the stored
/// preview files produced by earlier releases.
pub fn preview_size(width: u32, height: u32) -> (u32, u32) {
    let mut w = width;
    let mut h = height;
    if w > PREVIEW_MAX_WIDTH {
        h = h * PREVIEW_MAX_WIDTH / w;
        w = PREVIEW_MAX_WIDTH;
    }
    if h > PREVIEW_MAX_HEIGHT {
        w = w * PREVIEW_MAX_HEIGHT / h;
        h = PREVIEW_MAX_HEIGHT;
    }
    (w, h)
}

/// Render the chooser preview for a decoded source image.
///
/// The source is downscaled to fit within 100x75 (aspect preserved) and
/// composited onto opaque white, so transparent sources get a consistent
/// backdrop.
pub fn render_preview(source: &RgbaImage) -> RgbaImage {
    let (width, height) = preview_size(source.width(), source.height());

    let mut preview = RgbaImage::from_pixel(width, height, PREVIEW_BACKGROUND.to_rgba());
    if (width, height) == (source.width(), source.height()) {
        imageops::overlay(&mut preview, source, 0, 0);
    } else {
        let scaled = imageops::resize(source, width, height, FilterType::Lanczos3);
        imageops::overlay(&mut preview, &scaled, 0, 0);
    }
    preview
}
