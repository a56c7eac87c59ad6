use crate::model::Orientation;
use image::{RgbaImage, imageops};

/// Fresh fully transparent canvas.
pub fn transparent_canvas(width: u32, height: u32) -> RgbaImage {
    RgbaImage::new(width, height)
}

/// Copy `src` into `canvas` with its top-left at (dx, dy), rotating 90°
/// clockwise first when `orientation` asks for it. Pixels falling outside the
/// canvas are dropped.
pub fn blit_rgba(src: &RgbaImage, canvas: &mut RgbaImage, dx: u32, dy: u32, orientation: Orientation) {
    match orientation {
        Orientation::Upright => imageops::replace(canvas, src, dx as i64, dy as i64),
        Orientation::Rotated90 => {
            let rotated = imageops::rotate90(src);
            imageops::replace(canvas, &rotated, dx as i64, dy as i64);
        }
    }
}
