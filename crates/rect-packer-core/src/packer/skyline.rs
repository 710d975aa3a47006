use super::{better, Fitness, PackingAlgorithm, Surface, WasteManager};
use crate::config::SkylineHeuristic;
use crate::geometry::{HSegment, Point, Rect};
use crate::model::{PlacedRect, RectId};
use crate::numeric::Coord;

/// A candidate position on the skyline: the rectangle at its resting height and the
/// first/last skyline segments under it.
#[derive(Debug, Clone, Copy)]
struct Placement<N> {
    rect: Rect<N>,
    left: usize,
    right: usize,
    rotated: bool,
}

/// Skyline tracker.
///
/// The skyline is an ordered list of horizontal segments covering the bin width;
/// each rectangle rests on the highest segment under its span and raises that span
/// to its top. Candidate x positions are every segment's left edge and every
/// segment's right edge minus the rectangle width.
///
/// With waste management on, the pockets a placement leaves below itself are handed
/// to a [`WasteManager`], which is always tried before the skyline.
///
/// `MinWasteLowest` scores `waste * width * height + top`, so the coordinate type
/// must be able to hold the wasted area times the bin area.
#[derive(Debug, Clone)]
pub struct Skyline<N> {
    surface: Surface<N>,
    skyline: Vec<HSegment<N>>,
    heuristic: SkylineHeuristic,
    waste: Option<WasteManager<N>>,
}

impl<N: Coord> Skyline<N> {
    pub fn new(width: N, height: N, rotation: bool, heuristic: SkylineHeuristic) -> Self {
        Self {
            surface: Surface::new(width, height, rotation),
            skyline: vec![HSegment::new(Point::new(N::zero(), N::zero()), width)],
            heuristic,
            waste: None,
        }
    }

    pub fn with_waste_management(mut self, enabled: bool) -> Self {
        self.waste = enabled.then(|| {
            WasteManager::new(self.surface.width, self.surface.height, self.surface.rotation)
        });
        self
    }

    pub fn with_bid(mut self, bid: Option<usize>) -> Self {
        self.surface.bid = bid;
        self
    }

    pub fn heuristic(&self) -> SkylineHeuristic {
        self.heuristic
    }

    pub fn skyline(&self) -> &[HSegment<N>] {
        &self.skyline
    }

    pub fn waste(&self) -> Option<&WasteManager<N>> {
        self.waste.as_ref()
    }

    /// Candidate x positions for a box `width` wide, ascending. Left-edge points come
    /// before equal right-edge points; duplicates are kept.
    fn placement_points(&self, width: N) -> Vec<N> {
        let (Some(first), Some(last)) = (self.skyline.first(), self.skyline.last()) else {
            return Vec::new();
        };
        let (sky_left, sky_right) = (first.left(), last.right());

        let mut lefts = self
            .skyline
            .iter()
            .filter(|s| s.left() + width <= sky_right)
            .map(|s| s.left())
            .peekable();
        let mut rights = self
            .skyline
            .iter()
            .filter(|s| s.right() >= sky_left + width)
            .map(|s| s.right() - width)
            .peekable();

        let mut points = Vec::with_capacity(self.skyline.len() * 2);
        loop {
            let next = match (lefts.peek(), rights.peek()) {
                (Some(l), Some(r)) if l <= r => lefts.next(),
                (Some(_), Some(_)) => rights.next(),
                (Some(_), None) => lefts.next(),
                (None, Some(_)) => rights.next(),
                (None, None) => break,
            };
            points.extend(next);
        }
        points
    }

    /// Sweeps the placement points left to right, tracking the segments under the
    /// box and the highest of them (its support).
    fn generate_placements(&self, width: N, height: N, rotated: bool) -> Vec<Placement<N>> {
        let sky = &self.skyline;
        let mut placements = Vec::new();
        let (mut left_index, mut right_index) = (0usize, 0usize);
        let mut support_index = 0usize;
        let mut support_height = sky[0].top();

        for p in self.placement_points(width) {
            if p + width > sky[right_index].right() {
                let mut i = right_index + 1;
                while i < sky.len() {
                    if sky[i].top() >= support_height {
                        support_index = i;
                        support_height = sky[i].top();
                    }
                    if p + width <= sky[i].right() {
                        break;
                    }
                    i += 1;
                }
                right_index = i.min(sky.len() - 1);
            }

            if p >= sky[left_index].right() {
                left_index += 1;
            }

            if support_index < left_index {
                support_index = left_index;
                support_height = sky[left_index].top();
                for (i, seg) in sky.iter().enumerate().take(right_index + 1).skip(left_index) {
                    if seg.top() >= support_height {
                        support_index = i;
                        support_height = seg.top();
                    }
                }
            }

            if support_height + height <= self.surface.height {
                placements.push(Placement {
                    rect: Rect::new(p, support_height, width, height),
                    left: left_index,
                    right: right_index,
                    rotated,
                });
            }
        }
        placements
    }

    /// Area between the box bottom and the segments it spans.
    fn wasted_area(&self, placement: &Placement<N>) -> N {
        let rect = &placement.rect;
        self.skyline[placement.left..=placement.right]
            .iter()
            .fold(N::zero(), |acc, seg| {
                let left = rect.left().max_of(seg.left());
                let right = rect.right().min_of(seg.right());
                if right <= left || seg.top() >= rect.bottom() {
                    acc
                } else {
                    acc + (right - left) * (rect.bottom() - seg.top())
                }
            })
    }

    fn rect_fitness(&self, placement: &Placement<N>) -> Fitness<N> {
        match self.heuristic {
            SkylineHeuristic::BottomLeft => Fitness::new(placement.rect.top()),
            SkylineHeuristic::MinWaste => Fitness::new(self.wasted_area(placement)),
            SkylineHeuristic::MinWasteLowest => {
                Fitness::with_tiebreak(self.wasted_area(placement), placement.rect.top())
            }
        }
    }

    fn select_position(&self, width: N, height: N) -> Option<(Placement<N>, Fitness<N>)> {
        let mut candidates = self.generate_placements(width, height, false);
        if self.surface.rotation && width != height {
            candidates.extend(self.generate_placements(height, width, true));
        }
        let mut best: Option<(Placement<N>, Fitness<N>)> = None;
        for placement in candidates {
            let score = self.rect_fitness(&placement);
            if better(score, best.map(|b| b.1)) {
                best = Some((placement, score));
            }
        }
        best
    }

    fn too_large(&self, width: N, height: N) -> bool {
        let side = self.surface.width.max_of(self.surface.height);
        !width.is_positive() || !height.is_positive() || width > side || height > side
    }

    /// Replaces the segments under `rect` with one segment at its top, handing the
    /// pockets below it to the waste manager.
    fn add_skyline(&mut self, rect: &Rect<N>) {
        let mut next = Vec::with_capacity(self.skyline.len() + 2);
        for mut sky in std::mem::take(&mut self.skyline) {
            if sky.right() <= rect.left() || sky.left() >= rect.right() {
                merge_skyline(&mut next, sky);
                continue;
            }

            if sky.left() < rect.left() && sky.right() > rect.left() {
                merge_skyline(&mut next, HSegment::new(sky.start, rect.left() - sky.left()));
                sky = HSegment::new(Point::new(rect.left(), sky.top()), sky.right() - rect.left());
            }

            if sky.left() < rect.right() {
                if sky.left() == rect.left() {
                    merge_skyline(
                        &mut next,
                        HSegment::new(Point::new(rect.left(), rect.top()), rect.width),
                    );
                }
                if sky.right() > rect.right() {
                    merge_skyline(
                        &mut next,
                        HSegment::new(
                            Point::new(rect.right(), sky.top()),
                            sky.right() - rect.right(),
                        ),
                    );
                    sky = HSegment::new(sky.start, rect.right() - sky.left());
                }
            }

            if sky.left() >= rect.left() && sky.right() <= rect.right() {
                if let Some(waste) = self.waste.as_mut() {
                    if sky.top() < rect.bottom() {
                        waste.add_waste(sky.left(), sky.top(), sky.length, rect.bottom() - sky.top());
                    }
                }
            } else {
                merge_skyline(&mut next, sky);
            }
        }
        self.skyline = next;
    }

    /// Lifts the skyline over a preset rectangle's span to at least its top.
    fn raise_skyline(&mut self, rect: &Rect<N>) {
        let mut next = Vec::with_capacity(self.skyline.len() + 2);
        for sky in std::mem::take(&mut self.skyline) {
            if sky.right() <= rect.left() || sky.left() >= rect.right() {
                merge_skyline(&mut next, sky);
                continue;
            }
            let left = sky.left().max_of(rect.left());
            let right = sky.right().min_of(rect.right());
            if sky.left() < left {
                merge_skyline(&mut next, HSegment::new(sky.start, left - sky.left()));
            }
            if let Some(waste) = self.waste.as_mut() {
                if sky.top() < rect.bottom() {
                    waste.add_waste(left, sky.top(), right - left, rect.bottom() - sky.top());
                }
            }
            let top = sky.top().max_of(rect.top());
            merge_skyline(&mut next, HSegment::new(Point::new(left, top), right - left));
            if right < sky.right() {
                merge_skyline(
                    &mut next,
                    HSegment::new(Point::new(right, sky.top()), sky.right() - right),
                );
            }
        }
        self.skyline = next;
    }
}

/// Appends `segment`, extending the last one instead when both have the same height.
fn merge_skyline<N: Coord>(skyline: &mut Vec<HSegment<N>>, segment: HSegment<N>) {
    match skyline.last_mut() {
        Some(last) if last.top() == segment.top() => last.length = last.length + segment.length,
        _ => skyline.push(segment),
    }
}

impl<N: Coord> PackingAlgorithm<N> for Skyline<N> {
    fn surface(&self) -> &Surface<N> {
        &self.surface
    }

    fn fitness(&self, width: N, height: N) -> Option<Fitness<N>> {
        if self.too_large(width, height) {
            return None;
        }
        if let Some(waste) = &self.waste {
            if waste.fitness(width, height).is_some() {
                return Some(Fitness::new(N::zero()));
            }
        }
        self.select_position(width, height).map(|(_, score)| score)
    }

    fn add_rect(&mut self, width: N, height: N, rid: Option<RectId>) -> Option<PlacedRect<N>> {
        if self.too_large(width, height) {
            return None;
        }

        let from_waste = self
            .waste
            .as_mut()
            .and_then(|waste| waste.add_rect(width, height, rid));
        let placed = match from_waste {
            Some(placed) => placed,
            None => {
                let (placement, _) = self.select_position(width, height)?;
                self.add_skyline(&placement.rect);
                PlacedRect::new(placement.rect, rid, placement.rotated)
            }
        };
        self.surface.push(placed);
        Some(placed)
    }

    fn add_preset_rect(&mut self, x: N, y: N, width: N, height: N, rid: Option<RectId>) -> bool {
        let rect = Rect::new(x, y, width, height);
        if !self.surface.is_free(&rect) {
            return false;
        }
        if let Some(waste) = self.waste.as_mut() {
            waste.carve(&rect);
        }
        self.raise_skyline(&rect);
        self.surface.push(PlacedRect::new(rect, rid, false));
        true
    }

    fn reset(&mut self) {
        self.surface.clear();
        self.skyline = vec![HSegment::new(
            Point::new(N::zero(), N::zero()),
            self.surface.width,
        )];
        if let Some(waste) = self.waste.as_mut() {
            waste.reset();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn skyline(heuristic: SkylineHeuristic, rotation: bool, waste: bool) -> Skyline<i32> {
        Skyline::new(100, 100, rotation, heuristic).with_waste_management(waste)
    }

    fn pack(s: &mut Skyline<i32>, sizes: &[(i32, i32)]) -> Vec<Option<Rect<i32>>> {
        sizes
            .iter()
            .map(|&(w, h)| s.add_rect(w, h, None).map(|p| p.rect))
            .collect()
    }

    fn r(x: i32, y: i32, w: i32, h: i32) -> Option<Rect<i32>> {
        Some(Rect::new(x, y, w, h))
    }

    #[test]
    fn placement_points_cover_both_edges() {
        let mut s = skyline(SkylineHeuristic::BottomLeft, false, false);
        s.add_rect(30, 10, None).unwrap();
        s.add_rect(30, 20, None).unwrap();
        // Segments: [0,30)@10, [30,60)@20, [60,100)@0
        assert_eq!(s.placement_points(20), vec![0, 10, 30, 40, 60, 80]);
        assert_eq!(s.placement_points(100), vec![0, 0]);
    }

    #[test]
    fn bottom_left_stacks_and_rotates() {
        let mut s = skyline(SkylineHeuristic::BottomLeft, false, false);
        assert_eq!(pack(&mut s, &[(30, 30), (100, 70)]), vec![r(0, 0, 30, 30), r(0, 30, 100, 70)]);
        assert_eq!(s.add_rect(70, 30, None), None);
        assert_eq!(s.len(), 2);

        let mut s = Skyline::new(100, 10, true, SkylineHeuristic::BottomLeft);
        let placed = s.add_rect(10, 100, None).unwrap();
        assert_eq!(placed.rect, Rect::new(0, 0, 100, 10));
        assert!(placed.rotated);

        let mut s = Skyline::new(100, 10, false, SkylineHeuristic::BottomLeft);
        assert!(s.add_rect(10, 100, None).is_none());
    }

    #[test]
    fn waste_recovers_space_under_a_bridge() {
        let mut s = skyline(SkylineHeuristic::BottomLeft, false, true);
        assert_eq!(pack(&mut s, &[(30, 30), (100, 70)]), vec![r(0, 0, 30, 30), r(0, 30, 100, 70)]);
        assert_eq!(s.add_rect(71, 30, None), None);
        assert_eq!(s.add_rect(70, 31, None), None);
        assert_eq!(s.add_rect(70, 30, None).unwrap().rect, Rect::new(30, 0, 70, 30));
        assert_eq!(s.add_rect(70, 30, None), None);
        assert_eq!(s.len(), 3);

        let mut sr = skyline(SkylineHeuristic::BottomLeft, true, true);
        pack(&mut sr, &[(30, 30), (100, 70)]);
        assert_eq!(sr.add_rect(30, 70, None).unwrap().rect, Rect::new(30, 0, 70, 30));
    }

    #[test]
    fn waste_holds_several_pockets() {
        let mut s = skyline(SkylineHeuristic::BottomLeft, false, true);
        assert_eq!(
            pack(&mut s, &[(40, 50), (20, 30), (20, 10), (100, 50)]),
            vec![r(0, 0, 40, 50), r(40, 0, 20, 30), r(60, 0, 20, 10), r(0, 50, 100, 50)]
        );
        assert_eq!(
            pack(&mut s, &[(20, 20), (20, 30), (20, 50), (20, 5), (20, 5), (1, 1)]),
            vec![
                r(40, 30, 20, 20),
                r(60, 10, 20, 30),
                r(80, 0, 20, 50),
                r(60, 40, 20, 5),
                r(60, 45, 20, 5),
                None,
            ]
        );
        assert!(s.validate_packing().is_ok());
    }

    #[test]
    fn min_waste_prefers_flush_spans() {
        let mut s = skyline(SkylineHeuristic::MinWaste, false, false);
        assert_eq!(
            pack(&mut s, &[(40, 60), (60, 10), (70, 20), (80, 20), (20, 40)]),
            vec![
                r(0, 0, 40, 60),
                r(40, 0, 60, 10),
                r(0, 60, 70, 20),
                r(0, 80, 80, 20),
                r(80, 10, 20, 40),
            ]
        );
    }

    #[test]
    fn min_waste_lowest_breaks_ties_on_height() {
        let mut s = skyline(SkylineHeuristic::MinWasteLowest, false, false);
        assert_eq!(
            pack(&mut s, &[(20, 60), (50, 10), (30, 60), (70, 20)]),
            vec![r(0, 0, 20, 60), r(20, 0, 50, 10), r(70, 0, 30, 60), r(30, 60, 70, 20)]
        );
    }

    #[test]
    fn waste_management_fills_what_min_waste_leaves() {
        let sizes = [
            (20, 50),
            (30, 30),
            (40, 10),
            (50, 40),
            (70, 20),
            (20, 40),
            (10, 30),
            (40, 20),
            (30, 30),
            (70, 10),
        ];
        let expected = vec![
            r(0, 0, 20, 50),
            r(20, 0, 30, 30),
            r(50, 0, 40, 10),
            r(50, 10, 50, 40),
            r(30, 50, 70, 20),
            r(0, 50, 20, 40),
            r(20, 30, 10, 30),
            r(30, 70, 40, 20),
            r(70, 70, 30, 30),
            r(0, 90, 70, 10),
        ];

        let mut plain = skyline(SkylineHeuristic::MinWaste, false, false);
        assert_eq!(pack(&mut plain, &sizes), expected);
        assert_eq!(pack(&mut plain, &[(20, 20), (10, 30)]), vec![None, None]);

        let mut wm = skyline(SkylineHeuristic::MinWaste, false, true);
        assert_eq!(pack(&mut wm, &sizes), expected);
        assert_eq!(
            pack(&mut wm, &[(20, 20), (10, 30)]),
            vec![r(30, 30, 20, 20), r(20, 60, 10, 30)]
        );
        assert!(wm.validate_packing().is_ok());
    }

    #[test]
    fn reclaimed_pocket_is_used_before_the_skyline() {
        let mut s = skyline(SkylineHeuristic::MinWasteLowest, false, true);
        assert_eq!(
            pack(&mut s, &[(20, 80), (60, 20), (20, 80), (80, 20), (60, 50), (20, 20)]),
            vec![
                r(0, 0, 20, 80),
                r(20, 0, 60, 20),
                r(80, 0, 20, 80),
                r(0, 80, 80, 20),
                r(20, 20, 60, 50),
                r(80, 80, 20, 20),
            ]
        );
    }

    #[test]
    fn min_waste_lowest_ranks_waste_before_height_on_large_bins() {
        let mut s = Skyline::new(1000, 1000, false, SkylineHeuristic::MinWasteLowest);
        s.add_rect(100, 500, None).unwrap();
        assert_eq!(s.add_rect(100, 10, None).unwrap().rect, Rect::new(100, 0, 100, 10));
        assert_eq!(s.add_rect(200, 10, None).unwrap().rect, Rect::new(200, 0, 200, 10));

        // only spot left for a full-width strip, over a tall pocket
        assert_eq!(
            s.fitness(1000, 10),
            Some(Fitness::with_tiebreak(300 * 490 + 600 * 500, 510))
        );
        assert_eq!(s.add_rect(1000, 10, None).unwrap().rect, Rect::new(0, 500, 1000, 10));
        s.validate_packing().unwrap();
    }

    #[test]
    fn fitness_is_zero_when_waste_fits() {
        let mut s = skyline(SkylineHeuristic::BottomLeft, false, true);
        pack(&mut s, &[(30, 30), (100, 70)]);
        assert_eq!(s.fitness(10, 10), Some(Fitness::new(0)));
        assert_eq!(s.fitness(101, 1), None);
    }

    #[test]
    fn preset_raises_the_skyline_and_feeds_waste() {
        let mut s = skyline(SkylineHeuristic::BottomLeft, false, true);
        assert!(s.add_preset_rect(20, 40, 30, 10, Some(1)));
        assert_eq!(
            s.skyline(),
            &[
                HSegment::new(Point::new(0, 0), 20),
                HSegment::new(Point::new(20, 50), 30),
                HSegment::new(Point::new(50, 0), 50),
            ]
        );
        assert_eq!(s.waste().unwrap().sections(), &[Rect::new(20, 0, 30, 40)]);
        assert!(!s.add_preset_rect(25, 45, 5, 5, None));

        assert_eq!(s.add_rect(30, 40, None).unwrap().rect, Rect::new(20, 0, 30, 40));
        assert!(s.validate_packing().is_ok());
    }

    #[test]
    fn preset_inside_waste_carves_it() {
        let mut s = skyline(SkylineHeuristic::BottomLeft, false, true);
        pack(&mut s, &[(30, 30), (100, 70)]);
        assert!(s.add_preset_rect(30, 0, 10, 30, None));
        assert!(s.add_rect(70, 30, None).is_none());
        assert_eq!(s.add_rect(60, 30, None).unwrap().rect, Rect::new(40, 0, 60, 30));
        assert!(s.validate_packing().is_ok());
    }

    #[test]
    fn reset_restores_a_flat_skyline() {
        let mut s = skyline(SkylineHeuristic::BottomLeft, true, true);
        pack(&mut s, &[(30, 30), (100, 70)]);
        s.reset();
        assert!(s.is_empty());
        assert_eq!(s.skyline(), &[HSegment::new(Point::new(0, 0), 100)]);
        assert!(s.waste().unwrap().sections().is_empty());
    }
}
