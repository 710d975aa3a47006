use super::{better, Fitness, PackingAlgorithm, Surface};
use crate::config::{GuillotineChoice, GuillotineSplit};
use crate::geometry::Rect;
use crate::model::{PlacedRect, RectId};
use crate::numeric::Coord;

/// Guillotine sections tracker.
///
/// Free space is a list of disjoint sections. A placement goes into the corner of
/// the best-scoring section, and the section's remainder is cut edge to edge into
/// at most two new sections.
///
/// With `merge` on, every new section is joined with existing sections that form
/// an exact rectangle with it. Joining walks the free list in order and repeats
/// until a pass joins nothing, then the (possibly grown) section is appended.
#[derive(Debug, Clone)]
pub struct Guillotine<N> {
    surface: Surface<N>,
    sections: Vec<Rect<N>>,
    choice: GuillotineChoice,
    split: GuillotineSplit,
    merge: bool,
}

impl<N: Coord> Guillotine<N> {
    pub fn new(
        width: N,
        height: N,
        rotation: bool,
        choice: GuillotineChoice,
        split: GuillotineSplit,
    ) -> Self {
        Self {
            surface: Surface::new(width, height, rotation),
            sections: vec![Rect::new(N::zero(), N::zero(), width, height)],
            choice,
            split,
            merge: true,
        }
    }

    pub fn with_merge(mut self, merge: bool) -> Self {
        self.merge = merge;
        self
    }

    pub fn with_bid(mut self, bid: Option<usize>) -> Self {
        self.surface.bid = bid;
        self
    }

    pub fn sections(&self) -> &[Rect<N>] {
        &self.sections
    }

    pub(crate) fn clear_sections(&mut self) {
        self.sections.clear();
    }

    pub(crate) fn add_section(&mut self, mut section: Rect<N>) {
        let mut previous = usize::MAX;
        while self.merge && !self.sections.is_empty() && previous != self.sections.len() {
            previous = self.sections.len();
            self.sections.retain(|s| !section.join(s));
        }
        self.sections.push(section);
    }

    /// Removes `rect` from free space: every section it overlaps is replaced by the
    /// disjoint pieces around the overlap (full-height strips left and right,
    /// then the pieces below and above).
    pub(crate) fn carve(&mut self, rect: &Rect<N>) {
        let (hit, kept): (Vec<_>, Vec<_>) = self
            .sections
            .drain(..)
            .partition(|s| s.intersects(rect, false));
        self.sections = kept;
        for s in hit {
            let Some(i) = s.intersection(rect, false) else {
                continue;
            };
            let mut pieces = Vec::with_capacity(4);
            if i.left() > s.left() {
                pieces.push(Rect::new(s.left(), s.bottom(), i.left() - s.left(), s.height));
            }
            if i.right() < s.right() {
                pieces.push(Rect::new(i.right(), s.bottom(), s.right() - i.right(), s.height));
            }
            if i.bottom() > s.bottom() {
                pieces.push(Rect::new(i.left(), s.bottom(), i.width, i.bottom() - s.bottom()));
            }
            if i.top() < s.top() {
                pieces.push(Rect::new(i.left(), i.top(), i.width, s.top() - i.top()));
            }
            for p in pieces {
                self.add_section(p);
            }
        }
    }

    fn section_fitness(&self, section: &Rect<N>, width: N, height: N) -> Option<N> {
        if width > section.width || height > section.height {
            return None;
        }
        let leftover_h = section.width - width;
        let leftover_v = section.height - height;
        Some(match self.choice {
            GuillotineChoice::BestAreaFit => section.area() - width * height,
            GuillotineChoice::BestShortSideFit => leftover_h.min_of(leftover_v),
            GuillotineChoice::BestLongSideFit => leftover_h.max_of(leftover_v),
        })
    }

    /// Index of the best section with its score and orientation; normal
    /// orientations are scanned before rotated ones and the first wins ties.
    fn select_fittest_section(&self, width: N, height: N) -> Option<(usize, N, bool)> {
        let mut best: Option<(usize, N, bool)> = None;
        let mut orientations = vec![(width, height, false)];
        if self.surface.rotation {
            orientations.push((height, width, true));
        }
        for (w, h, rotated) in orientations {
            for (idx, s) in self.sections.iter().enumerate() {
                if let Some(score) = self.section_fitness(s, w, h) {
                    if better(score, best.map(|b| b.1)) {
                        best = Some((idx, score, rotated));
                    }
                }
            }
        }
        best
    }

    fn split_horizontal(&mut self, section: &Rect<N>, width: N, height: N) {
        if height < section.height {
            self.add_section(Rect::new(
                section.x,
                section.y + height,
                section.width,
                section.height - height,
            ));
        }
        if width < section.width {
            self.add_section(Rect::new(
                section.x + width,
                section.y,
                section.width - width,
                height,
            ));
        }
    }

    fn split_vertical(&mut self, section: &Rect<N>, width: N, height: N) {
        if height < section.height {
            self.add_section(Rect::new(
                section.x,
                section.y + height,
                width,
                section.height - height,
            ));
        }
        if width < section.width {
            self.add_section(Rect::new(
                section.x + width,
                section.y,
                section.width - width,
                section.height,
            ));
        }
    }

    fn split_section(&mut self, section: &Rect<N>, width: N, height: N) {
        let leftover_w = section.width - width;
        let leftover_h = section.height - height;
        let horizontal = match self.split {
            GuillotineSplit::SplitShorterAxis => section.width < section.height,
            GuillotineSplit::SplitLongerAxis => section.width >= section.height,
            GuillotineSplit::SplitShorterLeftoverAxis => leftover_w < leftover_h,
            GuillotineSplit::SplitLongerLeftoverAxis => leftover_w >= leftover_h,
            GuillotineSplit::SplitMaximizeArea => width * leftover_h <= height * leftover_w,
            GuillotineSplit::SplitMinimizeArea => width * leftover_h >= height * leftover_w,
        };
        if horizontal {
            self.split_horizontal(section, width, height);
        } else {
            self.split_vertical(section, width, height);
        }
    }
}

impl<N: Coord> PackingAlgorithm<N> for Guillotine<N> {
    fn surface(&self) -> &Surface<N> {
        &self.surface
    }

    fn fitness(&self, width: N, height: N) -> Option<Fitness<N>> {
        if !width.is_positive() || !height.is_positive() {
            return None;
        }
        self.select_fittest_section(width, height)
            .map(|(_, score, _)| Fitness::new(score))
    }

    fn add_rect(&mut self, width: N, height: N, rid: Option<RectId>) -> Option<PlacedRect<N>> {
        if !width.is_positive() || !height.is_positive() {
            return None;
        }
        let (idx, _, rotated) = self.select_fittest_section(width, height)?;
        let (w, h) = if rotated {
            (height, width)
        } else {
            (width, height)
        };
        let section = self.sections.remove(idx);
        self.split_section(&section, w, h);

        let placed = PlacedRect::new(Rect::new(section.x, section.y, w, h), rid, rotated);
        self.surface.push(placed);
        Some(placed)
    }

    fn add_preset_rect(&mut self, x: N, y: N, width: N, height: N, rid: Option<RectId>) -> bool {
        let rect = Rect::new(x, y, width, height);
        if !self.surface.is_free(&rect) {
            return false;
        }
        self.carve(&rect);
        self.surface.push(PlacedRect::new(rect, rid, false));
        true
    }

    fn reset(&mut self) {
        self.surface.clear();
        self.sections.clear();
        self.add_section(self.surface.bounds());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn baf_sas(w: i32, h: i32) -> Guillotine<i32> {
        Guillotine::new(
            w,
            h,
            false,
            GuillotineChoice::BestAreaFit,
            GuillotineSplit::SplitShorterAxis,
        )
    }

    #[test]
    fn add_section_merges_to_fixed_point() {
        let mut g = baf_sas(100, 100);
        g.sections.clear();
        g.add_section(Rect::new(0, 0, 50, 50));
        g.add_section(Rect::new(50, 50, 50, 50));
        assert_eq!(g.sections.len(), 2);

        // Joins the bottom-left square, and the grown strip then still can't
        // join the top-right one.
        g.add_section(Rect::new(50, 0, 50, 50));
        assert_eq!(
            g.sections,
            vec![Rect::new(50, 50, 50, 50), Rect::new(0, 0, 100, 50)]
        );

        g.add_section(Rect::new(0, 50, 50, 50));
        assert_eq!(g.sections, vec![Rect::new(0, 0, 100, 100)]);
    }

    #[test]
    fn add_section_revisits_earlier_sections_after_growing() {
        let mut g = baf_sas(100, 100);
        g.sections = vec![Rect::new(0, 50, 100, 50), Rect::new(50, 0, 50, 50)];
        g.add_section(Rect::new(0, 0, 50, 50));
        assert_eq!(g.sections, vec![Rect::new(0, 0, 100, 100)]);
    }

    #[test]
    fn placements_follow_best_area_and_shorter_axis() {
        let mut g = baf_sas(100, 100);
        g.add_rect(10, 10, None).unwrap();
        g.add_rect(5, 5, None).unwrap();
        g.add_rect(1, 1, None).unwrap();
        assert_eq!(g.get(0).unwrap().rect, Rect::new(0, 0, 10, 10));
        assert_eq!(g.get(1).unwrap().rect, Rect::new(0, 10, 5, 5));
        assert_eq!(g.get(-1).unwrap().rect, Rect::new(5, 10, 1, 1));
    }

    #[test]
    fn long_side_fit_with_max_area_split() {
        let mut g = Guillotine::new(
            100,
            100,
            false,
            GuillotineChoice::BestLongSideFit,
            GuillotineSplit::SplitMaximizeArea,
        );
        assert_eq!(g.add_rect(60, 40, None).unwrap().rect, Rect::new(0, 0, 60, 40));
        assert_eq!(g.add_rect(20, 30, None).unwrap().rect, Rect::new(0, 40, 20, 30));
        assert_eq!(g.add_rect(30, 40, None).unwrap().rect, Rect::new(60, 0, 30, 40));
    }

    #[test]
    fn rotates_into_a_tall_bin() {
        let mut g = Guillotine::new(
            50,
            100,
            true,
            GuillotineChoice::BestLongSideFit,
            GuillotineSplit::SplitMaximizeArea,
        );
        let placed = g.add_rect(100, 50, Some(3)).unwrap();
        assert_eq!(placed.rect, Rect::new(0, 0, 50, 100));
        assert!(placed.rotated);
        assert!(g.fitness(1, 1).is_none());
    }

    #[test]
    fn add_section_without_merge_keeps_pieces() {
        let mut g = baf_sas(100, 100).with_merge(false);
        g.sections.clear();
        g.add_section(Rect::new(0, 0, 50, 100));
        g.add_section(Rect::new(50, 0, 50, 100));
        assert_eq!(g.sections.len(), 2);
    }

    #[test]
    fn split_rules_pick_the_expected_axis() {
        // 100x50 section, 20x20 box.
        let section = Rect::new(0, 0, 100, 50);
        let cases = [
            (GuillotineSplit::SplitShorterAxis, false),
            (GuillotineSplit::SplitLongerAxis, true),
            (GuillotineSplit::SplitShorterLeftoverAxis, false),
            (GuillotineSplit::SplitLongerLeftoverAxis, true),
            (GuillotineSplit::SplitMaximizeArea, true),
            (GuillotineSplit::SplitMinimizeArea, false),
        ];
        for (split, horizontal) in cases {
            let mut g = Guillotine::new(100, 50, false, GuillotineChoice::BestAreaFit, split)
                .with_merge(false);
            g.sections.clear();
            g.split_section(&section, 20, 20);
            let expected = if horizontal {
                vec![Rect::new(0, 20, 100, 30), Rect::new(20, 0, 80, 20)]
            } else {
                vec![Rect::new(0, 20, 20, 30), Rect::new(20, 0, 80, 50)]
            };
            assert_eq!(g.sections, expected, "{split:?}");
        }
    }

    #[test]
    fn exact_width_match_leaves_one_section() {
        let mut g = baf_sas(50, 100);
        g.add_rect(50, 30, None).unwrap();
        assert_eq!(g.sections(), &[Rect::new(0, 30, 50, 70)]);
    }

    #[test]
    fn carve_leaves_disjoint_pieces() {
        let mut g = baf_sas(100, 100).with_merge(false);
        g.carve(&Rect::new(40, 40, 20, 20));
        assert_eq!(
            g.sections,
            vec![
                Rect::new(0, 0, 40, 100),
                Rect::new(60, 0, 40, 100),
                Rect::new(40, 0, 20, 40),
                Rect::new(40, 60, 20, 40),
            ]
        );
        let area: i32 = g.sections.iter().map(|s| s.area()).sum();
        assert_eq!(area, 100 * 100 - 20 * 20);
    }

    #[test]
    fn preset_then_pack_around_it() {
        let mut g = baf_sas(100, 100);
        assert!(g.add_preset_rect(0, 0, 50, 50, Some(9)));
        assert!(!g.add_preset_rect(25, 25, 10, 10, None));
        assert!(!g.add_preset_rect(90, 90, 20, 20, None));
        for _ in 0..3 {
            g.add_rect(50, 50, None).unwrap();
        }
        assert!(g.add_rect(1, 1, None).is_none());
        assert!(g.validate_packing().is_ok());
    }
}
