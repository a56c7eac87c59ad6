//! Transparent-border trimming and derivation of placeable sizes.

use crate::model::{PlaceableRect, Rect, SourceImage};
use image::RgbaImage;
use image::imageops;
use tracing::{debug, warn};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Bounding box of pixels with alpha above `threshold`, or `None` if the image
/// is fully transparent (or empty).
pub fn compute_trim_rect(rgba: &RgbaImage, threshold: u8) -> Option<Rect> {
    let (w, h) = rgba.dimensions();
    if w == 0 || h == 0 {
        return None;
    }
    let opaque = |x: u32, y: u32| rgba.get_pixel(x, y)[3] > threshold;
    let column_empty = |x: u32, y1: u32, y2: u32| (y1..=y2).all(|y| !opaque(x, y));
    let row_empty = |y: u32, x1: u32, x2: u32| (x1..=x2).all(|x| !opaque(x, y));

    let mut x1 = 0;
    while x1 < w && column_empty(x1, 0, h - 1) {
        x1 += 1;
    }
    if x1 >= w {
        return None;
    }
    let mut x2 = w - 1;
    while x2 > x1 && column_empty(x2, 0, h - 1) {
        x2 -= 1;
    }
    let mut y1 = 0;
    while y1 < h && row_empty(y1, x1, x2) {
        y1 += 1;
    }
    let mut y2 = h - 1;
    while y2 > y1 && row_empty(y2, x1, x2) {
        y2 -= 1;
    }
    Some(Rect::new(x1, y1, x2 - x1 + 1, y2 - y1 + 1))
}

/// Crops `src` to its opaque bounding box and records the trimmed size.
///
/// A fully transparent image keeps its pixels; its trimmed size equals the
/// original, so it is reported as not trimmed.
pub fn trim_source(src: &mut SourceImage, threshold: u8) {
    let Some(r) = compute_trim_rect(&src.pixels, threshold) else {
        debug!(name = %src.name, "fully transparent, left untrimmed");
        src.trimmed_width = Some(src.original_width);
        src.trimmed_height = Some(src.original_height);
        return;
    };
    if r.w != src.original_width || r.h != src.original_height {
        src.pixels = imageops::crop_imm(&src.pixels, r.x, r.y, r.w, r.h).to_image();
        let (ox, oy) = sprite_source_offset(src.original_width, src.original_height, r.w, r.h);
        if (ox, oy) != (r.x, r.y) {
            warn!(
                name = %src.name,
                crop_x = r.x,
                crop_y = r.y,
                offset_x = ox,
                offset_y = oy,
                "asymmetric trim; spriteSourceSize offset is approximate"
            );
        }
    }
    src.trimmed_width = Some(r.w);
    src.trimmed_height = Some(r.h);
    src.trim_rect = Some(r);
}

/// Trims every source. Per-image work is independent and may run in parallel.
pub fn trim_sources(sources: &mut [SourceImage], threshold: u8) {
    #[cfg(feature = "parallel")]
    {
        sources
            .par_iter_mut()
            .for_each(|s| trim_source(s, threshold));
    }
    #[cfg(not(feature = "parallel"))]
    {
        for s in sources.iter_mut() {
            trim_source(s, threshold);
        }
    }
}

/// `spriteSourceSize` offset: half the removed border per axis, rounded down.
/// Assumes the trim removed the same amount on both sides.
pub fn sprite_source_offset(
    original_w: u32,
    original_h: u32,
    trimmed_w: u32,
    trimmed_h: u32,
) -> (u32, u32) {
    (
        original_w.saturating_sub(trimmed_w) / 2,
        original_h.saturating_sub(trimmed_h) / 2,
    )
}

/// One placeable rect per source, in source order.
pub fn placeable_rects(sources: &[SourceImage], trim: bool) -> Vec<PlaceableRect> {
    sources
        .iter()
        .enumerate()
        .map(|(i, s)| {
            let (w, h) = s.placeable_size(trim);
            PlaceableRect::new(i, w, h)
        })
        .collect()
}
