use std::fmt;

use crate::config::{AlgorithmFamily, PackerConfig};
use crate::error::{PackError, Result};
use crate::geometry::Rect;
use crate::model::{PlacedRect, RectId};
use crate::numeric::Coord;

pub mod guillotine;
pub mod maxrects;
pub mod skyline;
pub mod waste;

pub use guillotine::Guillotine;
pub use maxrects::MaxRects;
pub use skyline::Skyline;
pub use waste::WasteManager;

/// A bin as seen by the packer: boxed strategy instance.
pub type Bin<N> = Box<dyn PackingAlgorithm<N>>;

/// Placement score; lower is better. Compares `primary` first and falls back to
/// `secondary` on equal primaries, so two keys never share one number.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct Fitness<N> {
    pub primary: N,
    pub secondary: N,
}

impl<N: Coord> Fitness<N> {
    pub fn new(primary: N) -> Self {
        Self {
            primary,
            secondary: N::zero(),
        }
    }

    pub fn with_tiebreak(primary: N, secondary: N) -> Self {
        Self { primary, secondary }
    }
}

/// Bookkeeping shared by every strategy: bin size, rotation flag, optional bin id,
/// and the placed rectangles in placement order.
#[derive(Debug, Clone)]
pub struct Surface<N> {
    pub width: N,
    pub height: N,
    pub rotation: bool,
    pub bid: Option<usize>,
    placed: Vec<PlacedRect<N>>,
}

impl<N: Coord> Surface<N> {
    pub fn new(width: N, height: N, rotation: bool) -> Self {
        Self {
            width,
            height,
            rotation,
            bid: None,
            placed: Vec::new(),
        }
    }

    pub fn bounds(&self) -> Rect<N> {
        Rect::new(N::zero(), N::zero(), self.width, self.height)
    }

    /// True if a `width x height` box (rotated when allowed) fits an empty surface.
    pub fn fits(&self, width: N, height: N) -> bool {
        let (mut w, mut h) = (width, height);
        if self.rotation && (w > self.width || h > self.height) {
            std::mem::swap(&mut w, &mut h);
        }
        w <= self.width && h <= self.height
    }

    /// True if `rect` lies inside the bin and overlaps no placed rectangle.
    pub fn is_free(&self, rect: &Rect<N>) -> bool {
        !rect.is_degenerate()
            && self.bounds().contains(rect)
            && !self.placed.iter().any(|p| p.rect.intersects(rect, false))
    }

    pub fn placed(&self) -> &[PlacedRect<N>] {
        &self.placed
    }

    pub(crate) fn push(&mut self, placed: PlacedRect<N>) {
        self.placed.push(placed);
    }

    pub(crate) fn clear(&mut self) {
        self.placed.clear();
    }

    /// Checks every placed rectangle is inside the bin and no two overlap.
    pub fn validate(&self) -> Result<()> {
        let bounds = self.bounds();
        for (index, p) in self.placed.iter().enumerate() {
            if !bounds.contains(&p.rect) {
                return Err(PackError::OutsideBin {
                    index,
                    rect: format!("{:?}", p.rect),
                    width: format!("{:?}", self.width),
                    height: format!("{:?}", self.height),
                });
            }
        }
        for (i, a) in self.placed.iter().enumerate() {
            for (j, b) in self.placed.iter().enumerate().skip(i + 1) {
                if a.rect.intersects(&b.rect, false) {
                    return Err(PackError::Collision {
                        first: i,
                        second: j,
                    });
                }
            }
        }
        Ok(())
    }
}

/// A free-space strategy placing rectangles into one bin.
///
/// Implementations must never produce overlapping placements or placements outside
/// the bin. `fitness` never mutates state; lower scores are better.
pub trait PackingAlgorithm<N: Coord>: fmt::Debug + Send + Sync {
    fn surface(&self) -> &Surface<N>;

    /// Score for placing a `width x height` box, or `None` if it doesn't fit.
    fn fitness(&self, width: N, height: N) -> Option<Fitness<N>>;

    /// Places a `width x height` box, rotating it when allowed and better.
    /// Returns `None` without touching the bin if it doesn't fit.
    fn add_rect(&mut self, width: N, height: N, rid: Option<RectId>) -> Option<PlacedRect<N>>;

    /// Forces a rectangle at `(x, y)`. Returns `false` if the region is outside the
    /// bin or overlaps something already placed.
    fn add_preset_rect(&mut self, x: N, y: N, width: N, height: N, rid: Option<RectId>) -> bool;

    /// Empties the bin.
    fn reset(&mut self);

    fn width(&self) -> N {
        self.surface().width
    }

    fn height(&self) -> N {
        self.surface().height
    }

    fn rotation(&self) -> bool {
        self.surface().rotation
    }

    fn bid(&self) -> Option<usize> {
        self.surface().bid
    }

    /// Placed rectangles in placement order.
    fn rectangles(&self) -> &[PlacedRect<N>] {
        self.surface().placed()
    }

    /// Indexed access; negative indices count from the last placement.
    fn get(&self, index: isize) -> Option<&PlacedRect<N>> {
        let rects = self.rectangles();
        let idx = if index < 0 {
            rects.len().checked_sub(index.unsigned_abs())?
        } else {
            index as usize
        };
        rects.get(idx)
    }

    fn len(&self) -> usize {
        self.rectangles().len()
    }

    fn is_empty(&self) -> bool {
        self.rectangles().is_empty()
    }

    fn used_area(&self) -> N {
        self.rectangles()
            .iter()
            .fold(N::zero(), |acc, p| acc + p.rect.area())
    }

    /// True if the box (rotated when allowed) fits inside an empty bin of this size.
    fn fits_surface(&self, width: N, height: N) -> bool {
        self.surface().fits(width, height)
    }

    /// `(x, y, width, height, rid)` for every placed rectangle.
    fn rect_list(&self) -> Vec<(N, N, N, N, Option<RectId>)> {
        self.rectangles()
            .iter()
            .map(|p| (p.rect.x, p.rect.y, p.rect.width, p.rect.height, p.rid))
            .collect()
    }

    fn validate_packing(&self) -> Result<()> {
        self.surface().validate()
    }
}

/// Builds an empty bin of the configured strategy.
pub fn build_bin<N: Coord>(
    cfg: &PackerConfig,
    width: N,
    height: N,
    bid: Option<usize>,
    merge: Option<bool>,
) -> Bin<N> {
    let rotation = cfg.allow_rotation;
    match cfg.family {
        AlgorithmFamily::MaxRects => {
            Box::new(MaxRects::new(width, height, rotation, cfg.mr_heuristic).with_bid(bid))
        }
        AlgorithmFamily::Guillotine => Box::new(
            Guillotine::new(width, height, rotation, cfg.g_choice, cfg.g_split)
                .with_merge(merge.unwrap_or(cfg.g_merge))
                .with_bid(bid),
        ),
        AlgorithmFamily::Skyline => Box::new(
            Skyline::new(width, height, rotation, cfg.skyline_heuristic)
                .with_waste_management(cfg.use_waste_map)
                .with_bid(bid),
        ),
    }
}

/// Keeps the first of equally scored candidates.
pub(crate) fn better<S: PartialOrd>(candidate: S, best: Option<S>) -> bool {
    match best {
        None => true,
        Some(b) => candidate < b,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MaxRectsHeuristic;

    #[test]
    fn surface_fit_respects_rotation() {
        let s = Surface::new(30, 10, true);
        assert!(s.fits(10, 30));
        assert!(!s.fits(31, 10));
        let s = Surface::new(30, 10, false);
        assert!(!s.fits(10, 30));
        assert!(s.fits(30, 10));
    }

    #[test]
    fn negative_indices_resolve_from_the_end() {
        let mut bin = MaxRects::new(100, 100, false, MaxRectsHeuristic::BottomLeft);
        bin.add_rect(10, 10, Some(1)).unwrap();
        bin.add_rect(20, 20, Some(2)).unwrap();
        assert_eq!(bin.get(-1).unwrap().rid, Some(2));
        assert_eq!(bin.get(-2).unwrap().rid, Some(1));
        assert!(bin.get(-3).is_none());
        assert_eq!(bin.get(0).unwrap().rid, Some(1));
        assert!(bin.get(2).is_none());
    }

    #[test]
    fn validate_reports_overlap_and_escape() {
        let mut s = Surface::new(10, 10, false);
        s.push(PlacedRect::new(Rect::new(0, 0, 5, 5), None, false));
        s.push(PlacedRect::new(Rect::new(5, 0, 5, 5), None, false));
        assert!(s.validate().is_ok());

        s.push(PlacedRect::new(Rect::new(4, 4, 2, 2), None, false));
        assert!(matches!(
            s.validate(),
            Err(PackError::Collision { first: 0, second: 2 })
        ));

        let mut s = Surface::new(10, 10, false);
        s.push(PlacedRect::new(Rect::new(8, 8, 5, 5), None, false));
        assert!(matches!(s.validate(), Err(PackError::OutsideBin { index: 0, .. })));
    }
}
