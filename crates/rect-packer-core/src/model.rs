use serde::{Deserialize, Serialize};

use crate::geometry::Rect;
use crate::numeric::Coord;

/// Caller-supplied rectangle identifier.
pub type RectId = usize;

/// A rectangle placed inside a bin.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PlacedRect<N> {
    /// Identifier passed to `add_rect`, if any.
    pub rid: Option<RectId>,
    /// Position and size inside the bin (post-rotation width/height).
    pub rect: Rect<N>,
    /// True if the rectangle was rotated 90° when placed.
    pub rotated: bool,
}

impl<N: Coord> PlacedRect<N> {
    pub fn new(rect: Rect<N>, rid: Option<RectId>, rotated: bool) -> Self {
        Self { rid, rect, rotated }
    }
}

/// One row of [`crate::Packer::rect_list`]: which bin, where, and which rectangle.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PackedRect<N> {
    pub bin: usize,
    pub x: N,
    pub y: N,
    pub width: N,
    pub height: N,
    pub rid: Option<RectId>,
}

impl<N: Coord> PackedRect<N> {
    pub fn new(bin: usize, x: N, y: N, width: N, height: N, rid: Option<RectId>) -> Self {
        Self {
            bin,
            x,
            y,
            width,
            height,
            rid,
        }
    }
}

/// Summary of a finished packing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PackStats<N> {
    /// Bins holding at least one rectangle.
    pub num_bins: usize,
    /// Rectangles placed across all bins.
    pub num_rects: usize,
    /// Sum of `width * height` over the used bins.
    pub total_bin_area: N,
    /// Sum of the placed rectangles' areas.
    pub used_area: N,
    /// `used_area / total_bin_area` (0.0 to 1.0). Higher is better.
    pub occupancy: f64,
    /// Rectangles placed in rotated orientation.
    pub num_rotated: usize,
}

impl<N: Coord> PackStats<N> {
    /// Area of the used bins left uncovered.
    pub fn wasted_area(&self) -> N {
        if self.total_bin_area >= self.used_area {
            self.total_bin_area - self.used_area
        } else {
            N::zero()
        }
    }

    /// Wasted space as a percentage (0.0 to 100.0).
    pub fn waste_percentage(&self) -> f64 {
        (1.0 - self.occupancy) * 100.0
    }

    /// Human-readable one-liner.
    pub fn summary(&self) -> String {
        format!(
            "Bins: {}, Rects: {}, Occupancy: {:.2}%, Rotated: {}",
            self.num_bins,
            self.num_rects,
            self.occupancy * 100.0,
            self.num_rotated,
        )
    }
}

/// One bin of a [`PackReport`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BinReport<N> {
    pub width: N,
    pub height: N,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bid: Option<usize>,
    pub rects: Vec<PlacedRect<N>>,
}

/// Serializable snapshot of a packing: the used bins and their statistics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PackReport<N> {
    pub bins: Vec<BinReport<N>>,
    pub stats: PackStats<N>,
}
