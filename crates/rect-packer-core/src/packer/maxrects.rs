use super::{Fitness, PackingAlgorithm, Surface};
use crate::config::MaxRectsHeuristic;
use crate::geometry::Rect;
use crate::model::{PlacedRect, RectId};
use crate::numeric::Coord;

/// Maximal free rectangles tracker.
///
/// The free list starts as the whole bin. Every placement splits the free
/// rectangles it overlaps into up to four maximal remainders, then drops any free
/// rectangle contained in another.
#[derive(Debug, Clone)]
pub struct MaxRects<N> {
    surface: Surface<N>,
    free: Vec<Rect<N>>,
    heuristic: MaxRectsHeuristic,
    prune: bool,
}

/// Chosen position: rectangle to place, score, rotated flag.
type Candidate<N> = (Rect<N>, N, bool);

impl<N: Coord> MaxRects<N> {
    pub fn new(width: N, height: N, rotation: bool, heuristic: MaxRectsHeuristic) -> Self {
        Self {
            surface: Surface::new(width, height, rotation),
            free: vec![Rect::new(N::zero(), N::zero(), width, height)],
            heuristic,
            prune: true,
        }
    }

    pub fn with_bid(mut self, bid: Option<usize>) -> Self {
        self.surface.bid = bid;
        self
    }

    pub fn heuristic(&self) -> MaxRectsHeuristic {
        self.heuristic
    }

    pub fn free_rects(&self) -> &[Rect<N>] {
        &self.free
    }

    pub fn free_list_len(&self) -> usize {
        self.free.len()
    }

    #[cfg(test)]
    pub(crate) fn without_pruning(mut self) -> Self {
        self.prune = false;
        self
    }

    /// Score of a `w x h` box at the bottom-left corner of `fr`, `None` if it
    /// doesn't fit there.
    fn score(&self, fr: &Rect<N>, w: N, h: N) -> Option<N> {
        if w > fr.width || h > fr.height {
            return None;
        }
        let leftover_h = fr.width - w;
        let leftover_v = fr.height - h;
        let score = match self.heuristic {
            MaxRectsHeuristic::BestAreaFit => fr.area() - w * h,
            MaxRectsHeuristic::BestShortSideFit => leftover_h.min_of(leftover_v),
            MaxRectsHeuristic::BestLongSideFit => leftover_h.max_of(leftover_v),
            MaxRectsHeuristic::BottomLeft => fr.y + h,
            MaxRectsHeuristic::ContactPoint => {
                // uncovered perimeter; minimizing it maximizes contact
                let perimeter = (w + h) + (w + h);
                let contact = self.contact_point_score(&Rect::new(fr.x, fr.y, w, h));
                if perimeter >= contact {
                    perimeter - contact
                } else {
                    N::zero()
                }
            }
        };
        Some(score)
    }

    /// Lowest score over every free rectangle, normal orientation first, then
    /// rotated. The first candidate wins ties, except bottom-left which breaks
    /// ties on the lower `x`.
    fn find_position(&self, w: N, h: N) -> Option<Candidate<N>> {
        let mut best: Option<Candidate<N>> = None;
        let mut orientations = vec![(w, h, false)];
        if self.surface.rotation {
            orientations.push((h, w, true));
        }
        for (cw, ch, rotated) in orientations {
            for fr in &self.free {
                let Some(score) = self.score(fr, cw, ch) else {
                    continue;
                };
                let take = match &best {
                    None => true,
                    Some((rect, s, _)) => {
                        score < *s
                            || (self.heuristic == MaxRectsHeuristic::BottomLeft
                                && score == *s
                                && fr.x < rect.x)
                    }
                };
                if take {
                    best = Some((Rect::new(fr.x, fr.y, cw, ch), score, rotated));
                }
            }
        }
        best
    }

    fn contact_point_score(&self, node: &Rect<N>) -> N {
        let mut score = N::zero();
        // contact with bin borders
        if node.left() == N::zero() {
            score = score + node.height;
        }
        if node.bottom() == N::zero() {
            score = score + node.width;
        }
        if node.right() == self.surface.width {
            score = score + node.height;
        }
        if node.top() == self.surface.height {
            score = score + node.width;
        }

        // contact with placed rectangles
        for u in self.surface.placed().iter().map(|p| &p.rect) {
            if node.left() == u.right() || u.left() == node.right() {
                score = score + overlap_1d(node.bottom(), node.top(), u.bottom(), u.top());
            }
            if node.bottom() == u.top() || u.bottom() == node.top() {
                score = score + overlap_1d(node.left(), node.right(), u.left(), u.right());
            }
        }
        score
    }

    /// Remainders of free rectangle `m` once `r` is carved out of it: the maximal
    /// strips left, right, above and below `r` that are still inside `m`.
    pub(crate) fn generate_splits(m: &Rect<N>, r: &Rect<N>) -> Vec<Rect<N>> {
        let mut splits = Vec::with_capacity(4);
        if r.left() > m.left() {
            splits.push(Rect::new(m.left(), m.bottom(), r.left() - m.left(), m.height));
        }
        if r.right() < m.right() {
            splits.push(Rect::new(r.right(), m.bottom(), m.right() - r.right(), m.height));
        }
        if r.top() < m.top() {
            splits.push(Rect::new(m.left(), r.top(), m.width, m.top() - r.top()));
        }
        if r.bottom() > m.bottom() {
            splits.push(Rect::new(m.left(), m.bottom(), m.width, r.bottom() - m.bottom()));
        }
        splits
    }

    /// Replaces every free rectangle overlapping `rect` with its remainders.
    fn split(&mut self, rect: &Rect<N>) {
        let mut next = Vec::with_capacity(self.free.len() + 4);
        for fr in self.free.drain(..) {
            if fr.intersects(rect, false) {
                next.extend(Self::generate_splits(&fr, rect));
            } else {
                next.push(fr);
            }
        }
        self.free = next;
    }

    /// Drops every free rectangle contained in another one; of two identical
    /// rectangles the first is kept.
    fn remove_duplicates(&mut self) {
        let n = self.free.len();
        let mut contained = vec![false; n];
        for i in 0..n {
            for j in (i + 1)..n {
                if self.free[i].contains(&self.free[j]) {
                    contained[j] = true;
                } else if self.free[j].contains(&self.free[i]) {
                    contained[i] = true;
                }
            }
        }
        let mut flags = contained.into_iter();
        self.free.retain(|_| !flags.next().unwrap_or(false));
    }

    fn place_rect(&mut self, node: &Rect<N>) {
        self.split(node);
        if self.prune {
            self.remove_duplicates();
        }
    }
}

fn overlap_1d<N: Coord>(a1: N, a2: N, b1: N, b2: N) -> N {
    let start = a1.max_of(b1);
    let end = a2.min_of(b2);
    if end > start { end - start } else { N::zero() }
}

impl<N: Coord> PackingAlgorithm<N> for MaxRects<N> {
    fn surface(&self) -> &Surface<N> {
        &self.surface
    }

    fn fitness(&self, width: N, height: N) -> Option<Fitness<N>> {
        if !width.is_positive() || !height.is_positive() {
            return None;
        }
        self.find_position(width, height)
            .map(|(_, score, _)| Fitness::new(score))
    }

    fn add_rect(&mut self, width: N, height: N, rid: Option<RectId>) -> Option<PlacedRect<N>> {
        if !width.is_positive() || !height.is_positive() {
            return None;
        }
        let (rect, _, rotated) = self.find_position(width, height)?;
        self.place_rect(&rect);
        let placed = PlacedRect::new(rect, rid, rotated);
        self.surface.push(placed);
        Some(placed)
    }

    fn add_preset_rect(&mut self, x: N, y: N, width: N, height: N, rid: Option<RectId>) -> bool {
        let rect = Rect::new(x, y, width, height);
        if !self.surface.is_free(&rect) {
            return false;
        }
        self.place_rect(&rect);
        self.surface.push(PlacedRect::new(rect, rid, false));
        true
    }

    fn reset(&mut self) {
        self.surface.clear();
        self.free = vec![self.surface.bounds()];
    }
}
