use super::next_pow2;
use crate::model::{Orientation, Placement, PlaceableRect, Rect};

/// Packing state of one output atlas.
///
/// The free list is owned exclusively by the bin. A placement removes the chosen
/// free rectangle and appends up to two fresh remainders; entries are never
/// edited in place. Free rectangles may overlap each other (no MaxRects pruning).
#[derive(Debug, Clone)]
pub struct Bin {
    max_width: u32,
    max_height: u32,
    padding: u32,
    free: Vec<Rect>,
    placed: Vec<PlaceableRect>,
    width: u32,
    height: u32,
}

struct Candidate {
    index: usize,
    size: (u32, u32),
}

impl Bin {
    /// `max_width`/`max_height` must be powers of two; trailing padding may overhang them.
    pub fn new(max_width: u32, max_height: u32, padding: u32) -> Self {
        let full = Rect::new(
            0,
            0,
            max_width.saturating_add(padding),
            max_height.saturating_add(padding),
        );
        Self {
            max_width,
            max_height,
            padding,
            free: vec![full],
            placed: Vec::new(),
            width: 0,
            height: 0,
        }
    }

    /// Current atlas width: a power of two once anything is placed, 0 before.
    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn free_rects(&self) -> &[Rect] {
        &self.free
    }

    /// Placed rects, in placement order.
    pub fn placed(&self) -> &[PlaceableRect] {
        &self.placed
    }

    pub fn is_empty(&self) -> bool {
        self.placed.is_empty()
    }

    /// Places `rect` with best short-side fit. Returns false, leaving the bin
    /// untouched, when no free rectangle can take it within the size cap.
    pub fn try_place(&mut self, rect: &PlaceableRect) -> bool {
        let Some(Candidate { index, size }) = self.choose(rect.width, rect.height) else {
            return false;
        };
        let fr = self.free.remove(index);
        let (fw, fh) = self.footprint(rect.width, rect.height);
        if fr.w > fw {
            self.free.push(Rect::new(fr.x + fw, fr.y, fr.w - fw, fh));
        }
        if fr.h > fh {
            self.free.push(Rect::new(fr.x, fr.y + fh, fr.w, fr.h - fh));
        }
        let mut placed = *rect;
        placed.placement = Placement {
            x: fr.x,
            y: fr.y,
            orientation: Orientation::Upright,
        };
        self.placed.push(placed);
        (self.width, self.height) = size;
        true
    }

    fn choose(&self, w: u32, h: u32) -> Option<Candidate> {
        let (fw, fh) = self.footprint(w, h);
        let mut best: Option<(u32, Candidate)> = None;
        for (index, fr) in self.free.iter().enumerate() {
            if fr.w < fw || fr.h < fh {
                continue;
            }
            let right = fr.x.saturating_add(w);
            let bottom = fr.y.saturating_add(h);
            let Some(size) = self.grown_size(right, bottom) else {
                continue;
            };
            let score = (fr.w - fw).min(fr.h - fh);
            if best.as_ref().is_none_or(|(s, _)| score < *s) {
                best = Some((score, Candidate { index, size }));
            }
        }
        best.map(|(_, c)| c)
    }

    /// Space reserved for a `w` x `h` sprite, padding included.
    fn footprint(&self, w: u32, h: u32) -> (u32, u32) {
        (w.saturating_add(self.padding), h.saturating_add(self.padding))
    }

    /// Bin size after covering `(right, bottom)`, or `None` above the cap.
    fn grown_size(&self, right: u32, bottom: u32) -> Option<(u32, u32)> {
        let w = next_pow2(self.width.max(right));
        let h = next_pow2(self.height.max(bottom));
        (w <= self.max_width && h <= self.max_height).then_some((w, h))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_produces_right_and_bottom_remainders() {
        let mut bin = Bin::new(512, 512, 0);
        assert!(bin.try_place(&PlaceableRect::new(0, 300, 300)));
        assert_eq!(
            bin.free_rects(),
            &[Rect::new(300, 0, 212, 300), Rect::new(0, 300, 512, 212)]
        );
        assert_eq!((bin.width(), bin.height()), (512, 512));
    }

    #[test]
    fn exact_fit_leaves_no_remainder() {
        let mut bin = Bin::new(128, 128, 0);
        assert!(bin.try_place(&PlaceableRect::new(0, 128, 128)));
        assert!(bin.free_rects().is_empty());
        assert!(!bin.try_place(&PlaceableRect::new(1, 1, 1)));
    }

    #[test]
    fn best_short_side_fit_prefers_tightest() {
        let mut bin = Bin::new(256, 256, 0);
        // free: right 156x100 at (100,0), bottom 256x156 at (0,100)
        assert!(bin.try_place(&PlaceableRect::new(0, 100, 100)));
        // 150x90: right scores min(6,10)=6, bottom min(106,66)=66
        assert!(bin.try_place(&PlaceableRect::new(1, 150, 90)));
        assert_eq!(bin.placed()[1].placement.x, 100);
        assert_eq!(bin.placed()[1].placement.y, 0);
    }

    #[test]
    fn padding_is_reserved_but_may_overhang_edge() {
        let mut bin = Bin::new(128, 128, 4);
        assert!(bin.try_place(&PlaceableRect::new(0, 128, 60)));
        assert!(bin.try_place(&PlaceableRect::new(1, 128, 60)));
        let second = bin.placed()[1].placement;
        assert_eq!((second.x, second.y), (0, 64));
        assert_eq!((bin.width(), bin.height()), (128, 128));
    }

    #[test]
    fn size_grows_in_powers_of_two() {
        let mut bin = Bin::new(1024, 1024, 0);
        assert!(bin.try_place(&PlaceableRect::new(0, 100, 20)));
        assert_eq!((bin.width(), bin.height()), (128, 32));
        assert!(bin.try_place(&PlaceableRect::new(1, 100, 20)));
        assert_eq!((bin.width(), bin.height()), (256, 32));
    }

    #[test]
    fn rejection_does_not_mutate() {
        let mut bin = Bin::new(128, 128, 0);
        assert!(bin.try_place(&PlaceableRect::new(0, 100, 100)));
        let before = bin.free_rects().to_vec();
        assert!(!bin.try_place(&PlaceableRect::new(1, 100, 100)));
        assert_eq!(bin.free_rects(), before.as_slice());
        assert_eq!(bin.placed().len(), 1);
    }

    #[test]
    fn huge_padding_saturates_instead_of_wrapping() {
        let mut bin = Bin::new(1024, 1024, u32::MAX);
        assert!(bin.try_place(&PlaceableRect::new(0, 10, 10)));
        assert!(bin.free_rects().is_empty());
        assert!(!bin.try_place(&PlaceableRect::new(1, 10, 10)));
        assert_eq!((bin.width(), bin.height()), (16, 16));
    }
}
