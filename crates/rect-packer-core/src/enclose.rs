//! Smallest single container for a set of rectangles.
//!
//! Candidate widths come from the rectangles' sides: the widest lower bound, the
//! total upper bound, and the running sums of the sorted sides from both ends. Every
//! candidate starts at the tallest useful height and is packed once with a
//! bottom-left skyline; the container then shrinks to the highest placed top.

#[cfg(feature = "parallel")]
use rayon::prelude::*;
use tracing::{debug, instrument};

use crate::config::{BinSelection, PackerConfig, PackingMode, SkylineHeuristic, SortOrder};
use crate::numeric::Coord;
use crate::orchestrator::Packer;

/// A container that holds every rectangle, with the packing that proves it.
///
/// `height` is trimmed to the highest placed top. The single bin inside `packer`
/// keeps the untrimmed candidate height it was packed with, so read the container
/// size from `width` and `height`, not from the bin.
#[derive(Debug)]
pub struct Enclosure<N: Coord> {
    pub width: N,
    pub height: N,
    /// Packing into a `width x candidate height` bin; every placement lies
    /// within `width x height`.
    pub packer: Packer<N>,
}

impl<N: Coord> Enclosure<N> {
    pub fn area(&self) -> N {
        self.width * self.height
    }
}

/// Searches container sizes for the smallest one holding every rectangle.
///
/// ```
/// use rect_packer_core::enclose::Enclose;
///
/// let mut en = Enclose::new(true).max_width(100).max_height(100);
/// en.add_rect(10, 10);
/// en.add_rect(20, 20);
/// let found = en.generate().unwrap();
/// assert_eq!(found.area(), 600);
/// ```
#[derive(Debug, Clone)]
pub struct Enclose<N> {
    rects: Vec<(N, N)>,
    max_width: Option<N>,
    max_height: Option<N>,
    rotation: bool,
}

impl<N: Coord> Enclose<N> {
    pub fn new(rotation: bool) -> Self {
        Self {
            rects: Vec::new(),
            max_width: None,
            max_height: None,
            rotation,
        }
    }

    pub fn max_width(mut self, width: N) -> Self {
        self.max_width = Some(width);
        self
    }

    pub fn max_height(mut self, height: N) -> Self {
        self.max_height = Some(height);
        self
    }

    pub fn add_rect(&mut self, width: N, height: N) {
        self.rects.push((width, height));
    }

    pub fn len(&self) -> usize {
        self.rects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rects.is_empty()
    }

    /// `(width, max height)` pairs worth refining, in evaluation order.
    pub(crate) fn container_candidates(&self) -> Vec<(N, N)> {
        if self.rects.is_empty() {
            return Vec::new();
        }

        let (mut sides, mut max_width, mut max_height, min_width) = if self.rotation {
            let max_height = sum_of(self.rects.iter().map(|&(w, h)| w.max_of(h)));
            (
                self.rects.iter().flat_map(|&(w, h)| [w, h]).collect::<Vec<_>>(),
                max_height,
                max_height,
                largest(self.rects.iter().map(|&(w, h)| w.min_of(h))),
            )
        } else {
            (
                self.rects.iter().map(|&(w, _)| w).collect::<Vec<_>>(),
                sum_of(self.rects.iter().map(|&(w, _)| w)),
                sum_of(self.rects.iter().map(|&(_, h)| h)),
                largest(self.rects.iter().map(|&(w, _)| w)),
            )
        };
        sides.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

        if let Some(limit) = self.max_width {
            max_width = max_width.min_of(limit);
        }
        if let Some(limit) = self.max_height {
            max_height = max_height.min_of(limit);
        }
        if max_width < min_width {
            return Vec::new();
        }

        let mut widths = vec![max_width, min_width];
        let mut running = N::zero();
        for &s in sides.iter().rev() {
            running = running + s;
            widths.push(running);
        }
        running = N::zero();
        for &s in &sides {
            running = running + s;
            widths.push(running);
        }

        let mut unique: Vec<N> = Vec::with_capacity(widths.len());
        for w in widths {
            if !unique.contains(&w) {
                unique.push(w);
            }
        }

        let min_area = sum_of(self.rects.iter().map(|&(w, h)| w * h));
        unique
            .into_iter()
            .filter(|&w| w >= min_width && w <= max_width && w * max_height >= min_area)
            .map(|w| (w, max_height))
            .collect()
    }

    /// Packs everything into one `width x height` bin and trims the height.
    fn refine(&self, width: N, height: N) -> Option<Enclosure<N>> {
        let cfg = PackerConfig::builder()
            .mode(PackingMode::Offline)
            .bin_selection(BinSelection::FirstFit)
            .skyline_heuristic(SkylineHeuristic::BottomLeft)
            .use_waste_map(true)
            .sort_order(SortOrder::LongSide)
            .allow_rotation(self.rotation)
            .build();
        let mut packer = Packer::new(cfg).ok()?;
        packer.add_bin(width, height, 1).ok()?;
        for &(w, h) in &self.rects {
            packer.add_rect(w, h, None).ok()?;
        }
        packer.pack().ok()?;

        let bin = packer.get(0)?;
        if bin.len() != self.rects.len() {
            return None;
        }
        let top = bin
            .rectangles()
            .iter()
            .fold(N::zero(), |acc, p| acc.max_of(p.rect.top()));
        Some(Enclosure {
            width,
            height: top,
            packer,
        })
    }

    /// Smallest-area container holding every rectangle; ties keep the earlier
    /// candidate. `None` without rectangles or when nothing within the limits works.
    #[instrument(skip_all)]
    pub fn generate(&self) -> Option<Enclosure<N>> {
        let candidates = self.container_candidates();
        debug!(rects = self.rects.len(), candidates = candidates.len(), "enclosing");

        #[cfg(feature = "parallel")]
        let refined: Vec<Enclosure<N>> = candidates
            .par_iter()
            .filter_map(|&(w, h)| self.refine(w, h))
            .collect();
        #[cfg(not(feature = "parallel"))]
        let refined: Vec<Enclosure<N>> = candidates
            .iter()
            .filter_map(|&(w, h)| self.refine(w, h))
            .collect();

        let mut best: Option<Enclosure<N>> = None;
        for e in refined {
            if best.as_ref().is_none_or(|b| e.area() < b.area()) {
                best = Some(e);
            }
        }
        best
    }
}

fn sum_of<N: Coord>(values: impl Iterator<Item = N>) -> N {
    values.fold(N::zero(), |acc, v| acc + v)
}

fn largest<N: Coord>(values: impl Iterator<Item = N>) -> N {
    values.fold(N::zero(), |acc, v| acc.max_of(v))
}
