//! Coordinate types accepted by the packing engine.
//!
//! Every strategy is generic over a [`Coord`]: plain integers, floats, or (with the
//! `decimal` feature) exact decimals. Comparisons are always the exact comparisons
//! of the underlying type; nothing in the engine applies a tolerance.

use std::fmt::Debug;

use num_traits::{Num, ToPrimitive};

/// Numeric type usable for rectangle coordinates and sizes.
///
/// Blanket-implemented for anything that behaves like a number, so `u32`, `i64`,
/// `f64` and `rust_decimal::Decimal` all work out of the box.
pub trait Coord: Num + Copy + PartialOrd + Debug + ToPrimitive + Send + Sync + 'static {
    /// Smaller of two values (the first one on ties or incomparable values).
    fn min_of(self, other: Self) -> Self {
        if other < self { other } else { self }
    }

    /// Larger of two values (the first one on ties or incomparable values).
    fn max_of(self, other: Self) -> Self {
        if other > self { other } else { self }
    }

    /// `|self - other|` without ever producing an intermediate negative value,
    /// which keeps unsigned coordinates safe.
    fn abs_diff_of(self, other: Self) -> Self {
        if self >= other { self - other } else { other - self }
    }

    fn is_positive(self) -> bool {
        self > Self::zero()
    }

    /// Lossy conversion used for reporting only (occupancy, distances).
    fn as_f64(self) -> f64 {
        self.to_f64().unwrap_or(f64::NAN)
    }
}

impl<T> Coord for T where T: Num + Copy + PartialOrd + Debug + ToPrimitive + Send + Sync + 'static {}

/// Converts a float into an exact decimal, rounding *up* (away from zero) to
/// `places` digits after the decimal point.
///
/// Rounding up guarantees that sizes computed from floats never shrink, so
/// rectangles packed with the rounded sizes cannot overlap once the real
/// objects are laid out. Returns `None` for NaN or infinite input.
///
/// ```
/// use rect_packer_core::numeric::round_up;
/// use rust_decimal::Decimal;
///
/// assert_eq!(round_up(3.141511, 3), Some(Decimal::new(3142, 3)));
/// assert_eq!(round_up(3.243234, 0), Some(Decimal::new(4, 0)));
/// ```
#[cfg(feature = "decimal")]
pub fn round_up(value: f64, places: u32) -> Option<rust_decimal::Decimal> {
    use rust_decimal::{Decimal, RoundingStrategy};

    Decimal::from_f64_retain(value)
        .map(|d| d.round_dp_with_strategy(places, RoundingStrategy::AwayFromZero))
}
