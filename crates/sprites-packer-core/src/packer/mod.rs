//! Multi-bin rectangle packer.
//!
//! Rects are sorted by descending longest side, then placed first-fit across
//! bins (in creation order) and best-short-side-fit within a bin. A new bin is
//! opened when no existing bin accepts a rect.

use crate::config::PackerConfig;
use crate::error::{Result, SpritePackerError};
use crate::model::{PackStats, PlaceableRect, Rect};
use tracing::{debug, instrument, trace};

pub mod bin;

pub use bin::Bin;

/// Smallest power of two `>= v` (1 for 0).
pub fn next_pow2(mut v: u32) -> u32 {
    if v <= 1 {
        return 1;
    }
    v -= 1;
    v |= v >> 1;
    v |= v >> 2;
    v |= v >> 4;
    v |= v >> 8;
    v |= v >> 16;
    v + 1
}

/// Largest power of two `<= v` (0 for 0).
pub fn prev_pow2(v: u32) -> u32 {
    if v == 0 { 0 } else { 1 << (31 - v.leading_zeros()) }
}

/// Ordered bins produced by one packing run.
#[derive(Debug, Clone, Default)]
pub struct PackingResult {
    pub bins: Vec<Bin>,
}

impl PackingResult {
    pub fn len(&self) -> usize {
        self.bins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bins.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Bin> {
        self.bins.iter()
    }

    /// Computes packing statistics over all bins.
    pub fn stats(&self) -> PackStats {
        let mut num_frames = 0;
        let mut total_bin_area = 0u64;
        let mut used_frame_area = 0u64;
        for bin in &self.bins {
            total_bin_area += Rect::new(0, 0, bin.width(), bin.height()).area();
            for r in bin.placed() {
                num_frames += 1;
                used_frame_area += r.frame().area();
            }
        }
        let occupancy = if total_bin_area > 0 {
            used_frame_area as f64 / total_bin_area as f64
        } else {
            0.0
        };
        PackStats {
            num_bins: self.bins.len(),
            num_frames,
            total_bin_area,
            used_frame_area,
            occupancy,
        }
    }
}

/// Stable sort by descending `max(width, height)`; equal keys keep input order.
pub fn sort_for_packing(rects: &mut [PlaceableRect]) {
    rects.sort_by(|a, b| b.width.max(b.height).cmp(&a.width.max(a.height)));
}

#[derive(Debug, Clone, Copy)]
pub struct RectanglePacker {
    max_width: u32,
    max_height: u32,
    padding: u32,
}

impl RectanglePacker {
    /// Builds a packer for `cfg`. Bins are powers of two, so the usable area is
    /// the largest power of two not above each (clamped) maximum.
    pub fn new(cfg: &PackerConfig) -> Self {
        let cfg = cfg.clamped();
        Self::with_limits(cfg.max_width, cfg.max_height, cfg.padding)
    }

    pub fn with_limits(max_width: u32, max_height: u32, padding: u32) -> Self {
        Self {
            max_width: prev_pow2(max_width),
            max_height: prev_pow2(max_height),
            padding,
        }
    }

    /// Effective (power-of-two) bin limits.
    pub fn limits(&self) -> (u32, u32) {
        (self.max_width, self.max_height)
    }

    /// Assigns every rect an (x, y, bin). Fails before placing anything if a
    /// single rect cannot fit an empty bin.
    #[instrument(skip_all, fields(count = rects.len()))]
    pub fn pack(&self, mut rects: Vec<PlaceableRect>) -> Result<PackingResult> {
        if let Some(r) = rects
            .iter()
            .find(|r| r.width > self.max_width || r.height > self.max_height)
        {
            return Err(SpritePackerError::RectTooLarge {
                width: r.width,
                height: r.height,
                max_width: self.max_width,
                max_height: self.max_height,
            });
        }

        sort_for_packing(&mut rects);

        let mut bins: Vec<Bin> = Vec::new();
        for rect in &rects {
            if let Some(idx) = bins.iter_mut().position(|b| b.try_place(rect)) {
                trace!(source = rect.source, bin = idx, "placed");
                continue;
            }
            let mut bin = Bin::new(self.max_width, self.max_height, self.padding);
            if !bin.try_place(rect) {
                // empty bins accept anything that passed the size check
                return Err(SpritePackerError::RectTooLarge {
                    width: rect.width,
                    height: rect.height,
                    max_width: self.max_width,
                    max_height: self.max_height,
                });
            }
            debug!(bin = bins.len(), "opened new bin");
            bins.push(bin);
        }
        Ok(PackingResult { bins })
    }
}
