//! Two-dimensional rectangle bin packing.
//!
//! - Strategies: MaxRects (BAF/BSSF/BLSF/BL/CP), Guillotine (choice + split, optional merge),
//!   Skyline (BL/MW/MWL + optional waste recovery)
//! - Bin selection: Next-Fit, First-Fit, Best-Fit and Global, Online or Offline
//! - `Enclose` searches for the smallest single container holding a set of rectangles
//! - Coordinates are generic over any numeric type implementing [`Coord`]; results are
//!   serde-serializable.
//!
//! Quick example:
//! ```
//! use rect_packer_core::prelude::*;
//!
//! let cfg = PackerConfig::builder()
//!     .skyline_heuristic(SkylineHeuristic::MinWaste)
//!     .use_waste_map(true)
//!     .build();
//! let mut packer = Packer::new(cfg).unwrap();
//! packer.add_bin(256, 256, 2).unwrap();
//! for (rid, (w, h)) in [(100, 30), (64, 64), (200, 120)].into_iter().enumerate() {
//!     packer.add_rect(w, h, Some(rid)).unwrap();
//! }
//! packer.pack().unwrap();
//! packer.validate_packing().unwrap();
//! assert_eq!(packer.rect_list().len(), 3);
//! ```

pub mod config;
pub mod enclose;
pub mod error;
pub mod factory;
pub mod geometry;
pub mod model;
pub mod numeric;
pub mod orchestrator;
pub mod packer;

pub use config::*;
pub use enclose::{Enclose, Enclosure};
pub use error::*;
pub use factory::{BinCount, BinFactory, BinOptions};
pub use geometry::{HSegment, Point, Rect, Segment, VSegment};
pub use model::*;
pub use numeric::Coord;
pub use orchestrator::{sort_by_order, Packer};
pub use packer::{
    build_bin, Bin, Fitness, Guillotine, MaxRects, PackingAlgorithm, Skyline, WasteManager,
};

/// Convenience prelude for common types.
/// Importing `rect_packer_core::prelude::*` brings the primary APIs into scope.
pub mod prelude {
    pub use crate::config::{
        AlgorithmFamily, BinSelection, GuillotineChoice, GuillotineSplit, MaxRectsHeuristic,
        PackerConfig, PackerConfigBuilder, PackingMode, SkylineHeuristic, SortOrder,
    };
    pub use crate::enclose::{Enclose, Enclosure};
    pub use crate::error::{PackError, Result};
    pub use crate::factory::{BinCount, BinOptions};
    pub use crate::geometry::Rect;
    pub use crate::model::{PackReport, PackStats, PackedRect, PlacedRect, RectId};
    pub use crate::numeric::Coord;
    pub use crate::orchestrator::Packer;
    pub use crate::packer::PackingAlgorithm;
}
