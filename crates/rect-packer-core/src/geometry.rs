//! Axis-aligned geometry primitives.
//!
//! Coordinates grow to the right (`x`) and upwards (`y`): a rectangle's
//! `bottom` is its `y` and its `top` is `y + height`.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::numeric::Coord;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Point<N> {
    pub x: N,
    pub y: N,
}

impl<N: Coord> Point<N> {
    pub fn new(x: N, y: N) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to `other`.
    pub fn distance(&self, other: &Point<N>) -> f64 {
        let dx = self.x.abs_diff_of(other.x).as_f64();
        let dy = self.y.abs_diff_of(other.y).as_f64();
        dx.hypot(dy)
    }

    /// Squared distance, exact in the coordinate type.
    pub fn distance_squared(&self, other: &Point<N>) -> N {
        let dx = self.x.abs_diff_of(other.x);
        let dy = self.y.abs_diff_of(other.y);
        dx * dx + dy * dy
    }
}

/// Segment between two arbitrary points.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Segment<N> {
    pub start: Point<N>,
    pub end: Point<N>,
}

impl<N: Coord> Segment<N> {
    pub fn new(start: Point<N>, end: Point<N>) -> Self {
        Self { start, end }
    }

    pub fn length(&self) -> f64 {
        self.start.distance(&self.end)
    }

    pub fn top(&self) -> N {
        self.start.y.max_of(self.end.y)
    }

    pub fn bottom(&self) -> N {
        self.start.y.min_of(self.end.y)
    }

    pub fn left(&self) -> N {
        self.start.x.min_of(self.end.x)
    }

    pub fn right(&self) -> N {
        self.start.x.max_of(self.end.x)
    }
}

/// Horizontal segment: a start point and a length along `x`.
///
/// The skyline is a sequence of these.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct HSegment<N> {
    pub start: Point<N>,
    pub length: N,
}

impl<N: Coord> HSegment<N> {
    pub fn new(start: Point<N>, length: N) -> Self {
        Self { start, length }
    }

    pub fn end(&self) -> Point<N> {
        Point::new(self.start.x + self.length, self.start.y)
    }

    pub fn top(&self) -> N {
        self.start.y
    }

    pub fn bottom(&self) -> N {
        self.start.y
    }

    pub fn left(&self) -> N {
        self.start.x
    }

    pub fn right(&self) -> N {
        self.start.x + self.length
    }

    pub fn as_segment(&self) -> Segment<N> {
        Segment::new(self.start, self.end())
    }
}

/// Vertical segment: a start point and a length along `y`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VSegment<N> {
    pub start: Point<N>,
    pub length: N,
}

impl<N: Coord> VSegment<N> {
    pub fn new(start: Point<N>, length: N) -> Self {
        Self { start, length }
    }

    pub fn end(&self) -> Point<N> {
        Point::new(self.start.x, self.start.y + self.length)
    }

    pub fn top(&self) -> N {
        self.start.y + self.length
    }

    pub fn bottom(&self) -> N {
        self.start.y
    }

    pub fn left(&self) -> N {
        self.start.x
    }

    pub fn right(&self) -> N {
        self.start.x
    }

    pub fn as_segment(&self) -> Segment<N> {
        Segment::new(self.start, self.end())
    }
}

/// Axis-aligned rectangle anchored at its bottom-left corner.
///
/// Equality compares position and size. Use [`Rect::cmp_area`] to order by area.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rect<N> {
    pub x: N,
    pub y: N,
    pub width: N,
    pub height: N,
}

impl<N: Coord> Rect<N> {
    pub fn new(x: N, y: N, width: N, height: N) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn bottom(&self) -> N {
        self.y
    }

    pub fn top(&self) -> N {
        self.y + self.height
    }

    pub fn left(&self) -> N {
        self.x
    }

    pub fn right(&self) -> N {
        self.x + self.width
    }

    pub fn corner_top_left(&self) -> Point<N> {
        Point::new(self.left(), self.top())
    }

    pub fn corner_top_right(&self) -> Point<N> {
        Point::new(self.right(), self.top())
    }

    pub fn corner_bottom_left(&self) -> Point<N> {
        Point::new(self.left(), self.bottom())
    }

    pub fn corner_bottom_right(&self) -> Point<N> {
        Point::new(self.right(), self.bottom())
    }

    pub fn area(&self) -> N {
        self.width * self.height
    }

    /// True when either side is zero; such rectangles are never placed.
    pub fn is_degenerate(&self) -> bool {
        !self.width.is_positive() || !self.height.is_positive()
    }

    /// Moves the bottom-left corner to `(x, y)`, keeping the size.
    pub fn move_to(&mut self, x: N, y: N) {
        self.x = x;
        self.y = y;
    }

    /// Orders two rectangles by area.
    pub fn cmp_area(&self, other: &Rect<N>) -> Option<Ordering> {
        self.area().partial_cmp(&other.area())
    }

    /// True if `other` lies fully inside `self`; shared boundaries count as inside.
    pub fn contains(&self, other: &Rect<N>) -> bool {
        other.y >= self.y
            && other.x >= self.x
            && other.top() <= self.top()
            && other.right() <= self.right()
    }

    /// Overlap test. With `edges == false` only interior overlap counts; with
    /// `edges == true` rectangles that merely touch along an edge or a corner
    /// also intersect.
    pub fn intersects(&self, other: &Rect<N>, edges: bool) -> bool {
        if edges {
            !(self.bottom() > other.top()
                || self.top() < other.bottom()
                || self.left() > other.right()
                || self.right() < other.left())
        } else {
            !(self.bottom() >= other.top()
                || self.top() <= other.bottom()
                || self.left() >= other.right()
                || self.right() <= other.left())
        }
    }

    /// The overlapping region, or `None` when the rectangles don't intersect
    /// under the given edge mode. In edge mode, touching rectangles yield a
    /// zero-width or zero-height result.
    pub fn intersection(&self, other: &Rect<N>, edges: bool) -> Option<Rect<N>> {
        if !self.intersects(other, edges) {
            return None;
        }
        let bottom = self.bottom().max_of(other.bottom());
        let left = self.left().max_of(other.left());
        let top = self.top().min_of(other.top());
        let right = self.right().min_of(other.right());
        Some(Rect::new(left, bottom, right - left, top - bottom))
    }

    /// Grows `self` into the union with `other` when that union is itself a
    /// rectangle: one contains the other, or both share a full edge.
    /// Returns `false` and leaves `self` untouched otherwise.
    pub fn join(&mut self, other: &Rect<N>) -> bool {
        if self.contains(other) {
            return true;
        }
        if other.contains(self) {
            *self = *other;
            return true;
        }
        if !self.intersects(other, true) {
            return false;
        }

        // Same column: stack vertically.
        if self.left() == other.left() && self.width == other.width {
            let y = self.y.min_of(other.y);
            let top = self.top().max_of(other.top());
            self.y = y;
            self.height = top - y;
            return true;
        }

        // Same row: stack horizontally.
        if self.bottom() == other.bottom() && self.height == other.height {
            let x = self.x.min_of(other.x);
            let right = self.right().max_of(other.right());
            self.x = x;
            self.width = right - x;
            return true;
        }

        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn derived_edges_and_corners() {
        let r = Rect::new(1, 2, 3, 4);
        assert_eq!((r.left(), r.bottom(), r.right(), r.top()), (1, 2, 4, 6));
        assert_eq!(r.corner_top_left(), Point::new(1, 6));
        assert_eq!(r.corner_top_right(), Point::new(4, 6));
        assert_eq!(r.corner_bottom_left(), Point::new(1, 2));
        assert_eq!(r.corner_bottom_right(), Point::new(4, 2));
        assert_eq!(r.area(), 12);
    }

    #[test]
    fn move_keeps_size() {
        let mut r = Rect::new(0, 0, 5, 7);
        r.move_to(10, 20);
        assert_eq!(r, Rect::new(10, 20, 5, 7));
    }

    #[test]
    fn area_ordering_is_independent_of_position() {
        let small = Rect::new(50, 50, 2, 2);
        let big = Rect::new(0, 0, 3, 3);
        assert_eq!(small.cmp_area(&big), Some(Ordering::Less));
        assert_eq!(big.cmp_area(&Rect::new(9, 9, 1, 9)), Some(Ordering::Equal));
    }

    #[test]
    fn contains_includes_boundary() {
        let outer = Rect::new(0, 0, 10, 10);
        assert!(outer.contains(&Rect::new(0, 0, 10, 10)));
        assert!(outer.contains(&Rect::new(5, 5, 5, 5)));
        assert!(!outer.contains(&Rect::new(5, 5, 6, 5)));
        assert!(!outer.contains(&Rect::new(-1, 0, 2, 2)));
    }

    #[test]
    fn edge_contact_only_counts_in_edge_mode() {
        let a = Rect::new(0, 0, 10, 10);
        let side = Rect::new(10, 0, 5, 10);
        let corner = Rect::new(10, 10, 5, 5);
        let apart = Rect::new(11, 0, 5, 5);

        assert!(!a.intersects(&side, false));
        assert!(a.intersects(&side, true));
        assert!(!a.intersects(&corner, false));
        assert!(a.intersects(&corner, true));
        assert!(!a.intersects(&apart, true));
        assert!(a.intersects(&Rect::new(9, 9, 5, 5), false));
    }

    #[test]
    fn intersection_region() {
        let a = Rect::new(0, 0, 10, 10);
        assert_eq!(
            a.intersection(&Rect::new(5, 5, 10, 10), false),
            Some(Rect::new(5, 5, 5, 5))
        );
        assert_eq!(a.intersection(&Rect::new(10, 0, 5, 10), false), None);
        assert_eq!(
            a.intersection(&Rect::new(10, 2, 5, 5), true),
            Some(Rect::new(10, 2, 0, 5))
        );
        assert_eq!(
            a.intersection(&Rect::new(10, 10, 5, 5), true),
            Some(Rect::new(10, 10, 0, 0))
        );
    }

    #[test]
    fn join_requires_exact_union() {
        // Contained either way.
        let mut r = Rect::new(0, 0, 10, 10);
        assert!(r.join(&Rect::new(2, 2, 3, 3)));
        assert_eq!(r, Rect::new(0, 0, 10, 10));
        let mut r = Rect::new(2, 2, 3, 3);
        assert!(r.join(&Rect::new(0, 0, 10, 10)));
        assert_eq!(r, Rect::new(0, 0, 10, 10));

        // Shared vertical edge of equal height.
        let mut r = Rect::new(0, 0, 10, 10);
        assert!(r.join(&Rect::new(10, 0, 5, 10)));
        assert_eq!(r, Rect::new(0, 0, 15, 10));

        // Shared horizontal edge of equal width, other rectangle below.
        let mut r = Rect::new(0, 10, 10, 10);
        assert!(r.join(&Rect::new(0, 0, 10, 10)));
        assert_eq!(r, Rect::new(0, 0, 10, 20));

        // Misaligned neighbours stay separate.
        let mut r = Rect::new(0, 0, 10, 10);
        assert!(!r.join(&Rect::new(10, 1, 5, 10)));
        assert!(!r.join(&Rect::new(0, 10, 9, 5)));
        assert!(!r.join(&Rect::new(20, 0, 10, 10)));
        assert_eq!(r, Rect::new(0, 0, 10, 10));
    }

    #[test]
    fn join_is_order_independent_for_three_strips() {
        let a = Rect::new(0, 0, 10, 10);
        let b = Rect::new(10, 0, 10, 10);
        let c = Rect::new(20, 0, 10, 10);

        let mut ab = a;
        assert!(ab.join(&b));
        assert!(ab.join(&c));

        let mut cb = c;
        assert!(cb.join(&b));
        assert!(cb.join(&a));

        assert_eq!(ab, cb);
        assert_eq!(ab, Rect::new(0, 0, 30, 10));
    }

    #[test]
    fn segments() {
        let h = HSegment::new(Point::new(2, 5), 10);
        assert_eq!((h.left(), h.right(), h.top(), h.bottom()), (2, 12, 5, 5));
        assert_eq!(h.end(), Point::new(12, 5));

        let v = VSegment::new(Point::new(2, 5), 10);
        assert_eq!((v.left(), v.right(), v.top(), v.bottom()), (2, 2, 15, 5));

        let s = Segment::new(Point::new(0, 0), Point::new(3, 4));
        assert_eq!(s.length(), 5.0);
        assert_eq!((s.left(), s.right(), s.bottom(), s.top()), (0, 3, 0, 4));
        assert_eq!(h.as_segment().length(), 10.0);
        assert_eq!(Point::new(0, 0).distance_squared(&Point::new(3, 4)), 25);
    }

    #[test]
    fn float_coordinates() {
        let a = Rect::new(0.0, 0.0, 1.5, 2.5);
        let b = Rect::new(1.5, 0.0, 1.0, 2.5);
        assert!(!a.intersects(&b, false));
        let mut j = a;
        assert!(j.join(&b));
        assert_eq!(j, Rect::new(0.0, 0.0, 2.5, 2.5));
    }
}
