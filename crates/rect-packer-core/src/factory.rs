use crate::config::PackerConfig;
use crate::numeric::Coord;
use crate::packer::{build_bin, Bin, Fitness};

/// How many bins a factory may still produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinCount {
    Limited(usize),
    Unbounded,
}

/// Per-bin construction options.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BinOptions {
    /// Id carried by every bin the factory builds.
    pub bid: Option<usize>,
    /// Overrides `PackerConfig::g_merge` for Guillotine bins.
    pub merge: Option<bool>,
}

/// Template for identical bins, instantiated lazily one at a time.
#[derive(Debug, Clone)]
pub struct BinFactory<N> {
    width: N,
    height: N,
    count: BinCount,
    config: PackerConfig,
    options: BinOptions,
}

impl<N: Coord> BinFactory<N> {
    pub fn new(width: N, height: N, count: BinCount, config: PackerConfig) -> Self {
        Self {
            width,
            height,
            count,
            config,
            options: BinOptions::default(),
        }
    }

    pub fn with_options(mut self, options: BinOptions) -> Self {
        self.options = options;
        self
    }

    pub fn width(&self) -> N {
        self.width
    }

    pub fn height(&self) -> N {
        self.height
    }

    pub fn count(&self) -> BinCount {
        self.count
    }

    /// True once every bin has been handed out. Unbounded factories never empty.
    pub fn is_empty(&self) -> bool {
        matches!(self.count, BinCount::Limited(0))
    }

    /// Whether an empty bin of this template could hold the box, rotated if allowed.
    pub fn fits_inside(&self, width: N, height: N) -> bool {
        let fits = |w: N, h: N| w <= self.width && h <= self.height;
        fits(width, height) || (self.config.allow_rotation && fits(height, width))
    }

    /// Whether the region `(x, y, width, height)` lies inside an empty bin of this template.
    pub fn fits_region(&self, x: N, y: N, width: N, height: N) -> bool {
        x + width <= self.width && y + height <= self.height
    }

    /// Score a fresh bin from this factory would give the box.
    pub fn fitness(&self, width: N, height: N) -> Option<Fitness<N>> {
        self.build().fitness(width, height)
    }

    /// Builds the next bin, or `None` if the factory is depleted.
    pub fn new_bin(&mut self) -> Option<Bin<N>> {
        match &mut self.count {
            BinCount::Limited(0) => return None,
            BinCount::Limited(n) => *n -= 1,
            BinCount::Unbounded => {}
        }
        Some(self.build())
    }

    fn build(&self) -> Bin<N> {
        build_bin(
            &self.config,
            self.width,
            self.height,
            self.options.bid,
            self.options.merge,
        )
    }
}
