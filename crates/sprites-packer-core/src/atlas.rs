//! Turns packed bins into composited canvases and frame manifests.

use crate::compositing::{blit_rgba, transparent_canvas};
use crate::error::{Result, SpritePackerError};
use crate::manifest::{AtlasManifest, ManifestFrame, Size};
use crate::model::{PlaceableRect, Rect, SourceImage};
use crate::packer::Bin;
use crate::trim::sprite_source_offset;
use image::RgbaImage;
use tracing::debug;

/// One assembled atlas: its pixels and manifest.
#[derive(Debug, Clone)]
pub struct AtlasPage {
    /// Position of the bin in the packing result.
    pub index: usize,
    pub canvas: RgbaImage,
    pub manifest: AtlasManifest,
}

impl AtlasPage {
    pub fn width(&self) -> u32 {
        self.canvas.width()
    }

    pub fn height(&self) -> u32 {
        self.canvas.height()
    }
}

/// Manifest entry for a placed rect.
pub fn frame_entry(rect: &PlaceableRect, src: &SourceImage) -> ManifestFrame {
    let trimmed = src.is_trimmed();
    let (ox, oy) = if trimmed {
        sprite_source_offset(src.original_width, src.original_height, rect.width, rect.height)
    } else {
        (0, 0)
    };
    ManifestFrame {
        frame: rect.frame(),
        rotated: rect.placement.orientation.is_rotated(),
        trimmed,
        sprite_source_size: Rect::new(ox, oy, rect.width, rect.height),
        source_size: Size {
            w: src.original_width,
            h: src.original_height,
        },
    }
}

/// Composites every rect of `bin` onto a transparent canvas of the bin's size
/// and builds its manifest. `image_name` is the texture file name recorded in `meta`.
pub fn assemble_bin(
    index: usize,
    bin: &Bin,
    sources: &[SourceImage],
    image_name: &str,
) -> Result<AtlasPage> {
    let (w, h) = (bin.width(), bin.height());
    let mut canvas = transparent_canvas(w, h);
    let mut manifest = AtlasManifest::new(image_name, w, h);
    for rect in bin.placed() {
        let src = sources.get(rect.source).ok_or_else(|| {
            SpritePackerError::InvalidConfig(format!(
                "placed rect refers to missing source #{}",
                rect.source
            ))
        })?;
        blit_rgba(
            &src.pixels,
            &mut canvas,
            rect.placement.x,
            rect.placement.y,
            rect.placement.orientation,
        );
        manifest.insert(src.name.clone(), frame_entry(rect, src))?;
    }
    debug!(index, width = w, height = h, frames = bin.placed().len(), "assembled atlas");
    Ok(AtlasPage {
        index,
        canvas,
        manifest,
    })
}
