use image::RgbaImage;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Axis-aligned rectangle (pixels). `x,y` is top-left; `w,h` are sizes.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct Rect {
    pub x: u32,
    pub y: u32,
    pub w: u32,
    pub h: u32,
}

impl Rect {
    pub fn new(x: u32, y: u32, w: u32, h: u32) -> Self {
        Self { x, y, w, h }
    }
    /// Inclusive right edge coordinate (`x + w - 1`).
    pub fn right(&self) -> u32 {
        self.x + self.w.saturating_sub(1)
    }
    /// Inclusive bottom edge coordinate (`y + h - 1`).
    pub fn bottom(&self) -> u32 {
        self.y + self.h.saturating_sub(1)
    }
    /// Returns true if `r` is fully inside `self` (inclusive edges).
    pub fn contains(&self, r: &Rect) -> bool {
        r.x >= self.x && r.y >= self.y && r.right() <= self.right() && r.bottom() <= self.bottom()
    }
    /// Returns true if the two rectangles share at least one pixel.
    pub fn intersects(&self, other: &Rect) -> bool {
        self.x < other.x + other.w
            && other.x < self.x + self.w
            && self.y < other.y + other.h
            && other.y < self.y + self.h
    }
    pub fn area(&self) -> u64 {
        (self.w as u64) * (self.h as u64)
    }
}

/// Orientation of a placed sprite inside its atlas.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum Orientation {
    #[default]
    Upright,
    /// Rotated 90° clockwise.
    Rotated90,
}

impl Orientation {
    pub fn is_rotated(&self) -> bool {
        matches!(self, Orientation::Rotated90)
    }
}

/// Where the packer put a rectangle. Filled in by the packer; `(0, 0, Upright)` before.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct Placement {
    pub x: u32,
    pub y: u32,
    pub orientation: Orientation,
}

/// A decoded sprite, optionally trimmed.
#[derive(Debug, Clone)]
pub struct SourceImage {
    /// Sprite name used as the manifest key.
    pub name: String,
    /// File the sprite was loaded from, if any.
    pub path: Option<PathBuf>,
    pub original_width: u32,
    pub original_height: u32,
    pub trimmed_width: Option<u32>,
    pub trimmed_height: Option<u32>,
    /// Exact crop region within the original image, recorded by the trim pass.
    pub trim_rect: Option<Rect>,
    /// Current pixels: the cropped buffer once trimmed, else the original.
    pub pixels: RgbaImage,
}

impl SourceImage {
    pub fn new(name: impl Into<String>, pixels: RgbaImage) -> Self {
        let (w, h) = pixels.dimensions();
        Self {
            name: name.into(),
            path: None,
            original_width: w,
            original_height: h,
            trimmed_width: None,
            trimmed_height: None,
            trim_rect: None,
            pixels,
        }
    }

    pub fn with_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.path = Some(path.into());
        self
    }

    /// True iff the trim pass ran and shrank at least one dimension.
    pub fn is_trimmed(&self) -> bool {
        match (self.trimmed_width, self.trimmed_height) {
            (Some(tw), Some(th)) => self.original_width > tw || self.original_height > th,
            _ => false,
        }
    }

    /// Size the packer has to reserve for this sprite.
    pub fn placeable_size(&self, trim: bool) -> (u32, u32) {
        if trim {
            (
                self.trimmed_width.unwrap_or(self.original_width),
                self.trimmed_height.unwrap_or(self.original_height),
            )
        } else {
            (self.original_width, self.original_height)
        }
    }
}

/// A rectangle handed to the packer, referring back to its source by index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlaceableRect {
    pub width: u32,
    pub height: u32,
    /// Index into the source list the rect was built from.
    pub source: usize,
    pub placement: Placement,
}

impl PlaceableRect {
    pub fn new(source: usize, width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            source,
            placement: Placement::default(),
        }
    }

    /// Atlas-space rectangle covered by the sprite pixels.
    pub fn frame(&self) -> Rect {
        Rect::new(self.placement.x, self.placement.y, self.width, self.height)
    }
}

/// Statistics about packing efficiency.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct PackStats {
    /// Number of bins (atlases) produced.
    pub num_bins: usize,
    /// Number of sprites placed.
    pub num_frames: usize,
    /// Sum of width * height over all bins.
    pub total_bin_area: u64,
    /// Sum of width * height over all placed sprites.
    pub used_frame_area: u64,
    /// used_frame_area / total_bin_area (0.0 to 1.0).
    pub occupancy: f64,
}

impl PackStats {
    /// Returns a human-readable summary of the statistics.
    pub fn summary(&self) -> String {
        format!(
            "Atlases: {}, Sprites: {}, Occupancy: {:.2}%, Total Area: {} px², Used Area: {} px²",
            self.num_bins,
            self.num_frames,
            self.occupancy * 100.0,
            self.total_bin_area,
            self.used_frame_area,
        )
    }

    /// Returns wasted space in pixels.
    pub fn wasted_area(&self) -> u64 {
        self.total_bin_area.saturating_sub(self.used_frame_area)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trimmed_flag_follows_dimensions() {
        let mut s = SourceImage::new("a", RgbaImage::new(10, 8));
        assert!(!s.is_trimmed());
        s.trimmed_width = Some(10);
        s.trimmed_height = Some(8);
        assert!(!s.is_trimmed());
        s.trimmed_height = Some(7);
        assert!(s.is_trimmed());
        assert_eq!(s.placeable_size(true), (10, 7));
        assert_eq!(s.placeable_size(false), (10, 8));
    }

    #[test]
    fn rect_intersection() {
        let a = Rect::new(0, 0, 10, 10);
        assert!(a.intersects(&Rect::new(9, 9, 2, 2)));
        assert!(!a.intersects(&Rect::new(10, 0, 5, 5)));
        assert!(a.contains(&Rect::new(2, 2, 8, 8)));
        assert!(!a.contains(&Rect::new(2, 2, 9, 8)));
    }
}
