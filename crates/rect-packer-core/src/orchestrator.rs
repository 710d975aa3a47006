use std::cmp::Ordering;
use std::collections::{BTreeMap, VecDeque};

use serde::Serialize;
use tracing::{debug, instrument, trace};

use crate::config::{BinSelection, PackerConfig, PackingMode, SortOrder};
use crate::error::{PackError, Result};
use crate::factory::{BinCount, BinFactory, BinOptions};
use crate::model::{BinReport, PackReport, PackStats, PackedRect, PlacedRect, RectId};
use crate::numeric::Coord;
use crate::packer::{better, Bin, Fitness, PackingAlgorithm};

#[derive(Debug, Clone, Copy)]
struct PendingBin<N> {
    width: N,
    height: N,
    count: BinCount,
    options: BinOptions,
}

#[derive(Debug, Clone, Copy)]
struct PendingRect<N> {
    width: N,
    height: N,
    rid: Option<RectId>,
}

#[derive(Debug, Clone, Copy)]
struct PendingPreset<N> {
    x: N,
    y: N,
    width: N,
    height: N,
    rid: Option<RectId>,
}

/// Distributes rectangles over a set of bins.
///
/// In Online mode every `add_rect` is placed immediately. In Offline mode bins and
/// rectangles are buffered and placed by [`Packer::pack`], which sorts the
/// rectangles first and may be called again after adding more input.
///
/// Bins are kept closed-then-open; that order is the one used by [`Packer::iter`],
/// [`Packer::get`] and the bin index of [`Packer::rect_list`].
///
/// ```
/// use rect_packer_core::prelude::*;
///
/// let cfg = PackerConfig::builder()
///     .bin_selection(BinSelection::FirstFit)
///     .build();
/// let mut packer = Packer::new(cfg).unwrap();
/// packer.add_bin(100, 100, 1).unwrap();
/// packer.add_rect(60, 60, Some(1)).unwrap();
/// packer.add_rect(40, 40, Some(2)).unwrap();
/// packer.pack().unwrap();
/// assert_eq!(packer.rect_list().len(), 2);
/// ```
#[derive(Debug)]
pub struct Packer<N: Coord> {
    config: PackerConfig,
    closed: Vec<Bin<N>>,
    open: VecDeque<Bin<N>>,
    factories: BTreeMap<usize, BinFactory<N>>,
    next_factory: usize,
    pending_bins: Vec<PendingBin<N>>,
    pending_rects: Vec<PendingRect<N>>,
    pending_presets: Vec<PendingPreset<N>>,
}

impl<N: Coord> Packer<N> {
    pub fn new(config: PackerConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            closed: Vec::new(),
            open: VecDeque::new(),
            factories: BTreeMap::new(),
            next_factory: 0,
            pending_bins: Vec::new(),
            pending_rects: Vec::new(),
            pending_presets: Vec::new(),
        })
    }

    pub fn config(&self) -> &PackerConfig {
        &self.config
    }

    fn is_offline(&self) -> bool {
        self.config.mode == PackingMode::Offline
    }

    /// Adds `count` bins of `width x height`.
    pub fn add_bin(&mut self, width: N, height: N, count: usize) -> Result<()> {
        self.add_bin_with(width, height, BinCount::Limited(count), BinOptions::default())
    }

    /// Adds an unbounded supply of `width x height` bins.
    pub fn add_bin_factory(&mut self, width: N, height: N) -> Result<()> {
        self.add_bin_with(width, height, BinCount::Unbounded, BinOptions::default())
    }

    pub fn add_bin_with(
        &mut self,
        width: N,
        height: N,
        count: BinCount,
        options: BinOptions,
    ) -> Result<()> {
        check_dimensions(width, height)?;
        let bin = PendingBin {
            width,
            height,
            count,
            options,
        };
        if self.is_offline() {
            self.pending_bins.push(bin);
        } else {
            self.insert_factory(bin);
        }
        Ok(())
    }

    /// Adds a rectangle. Online mode returns where it went, or `None` if no bin could
    /// take it; Offline mode buffers it and always returns `None`.
    pub fn add_rect(
        &mut self,
        width: N,
        height: N,
        rid: Option<RectId>,
    ) -> Result<Option<PlacedRect<N>>> {
        check_dimensions(width, height)?;
        if self.is_offline() {
            self.pending_rects.push(PendingRect { width, height, rid });
            return Ok(None);
        }
        Ok(self.place(width, height, rid))
    }

    /// Forces a rectangle at `(x, y)` in the first bin that has the region free,
    /// opening a new bin if needed. Offline mode buffers it, returns `false`, and
    /// places it ahead of the regular rectangles on every `pack()`.
    pub fn add_preset_rect(
        &mut self,
        x: N,
        y: N,
        width: N,
        height: N,
        rid: Option<RectId>,
    ) -> Result<bool> {
        check_dimensions(width, height)?;
        let preset = PendingPreset {
            x,
            y,
            width,
            height,
            rid,
        };
        if self.is_offline() {
            self.pending_presets.push(preset);
            return Ok(false);
        }
        Ok(self.place_preset(preset))
    }

    /// Packs everything buffered so far, discarding any previous result.
    #[instrument(skip_all)]
    pub fn pack(&mut self) -> Result<()> {
        if !self.is_offline() {
            return Err(PackError::UnsupportedOperation(
                "pack() is only available in Offline mode",
            ));
        }
        self.reset();
        if self.pending_bins.is_empty()
            || (self.pending_rects.is_empty() && self.pending_presets.is_empty())
        {
            return Ok(());
        }

        for bin in self.pending_bins.clone() {
            self.insert_factory(bin);
        }
        for preset in self.pending_presets.clone() {
            if !self.place_preset(preset) {
                debug!(rid = ?preset.rid, "preset rectangle has no free region");
            }
        }

        let mut rects = self.pending_rects.clone();
        sort_by_order(&mut rects, self.config.sort_order, |r| (r.width, r.height));

        if self.config.bin_selection == BinSelection::Global {
            self.pack_global(rects);
        } else {
            for r in rects {
                if self.place(r.width, r.height, r.rid).is_none() {
                    debug!(rid = ?r.rid, "rectangle does not fit any bin");
                }
            }
        }
        debug!(
            bins = self.len(),
            placed = self.iter().map(|b| b.len()).sum::<usize>(),
            requested = self.pending_rects.len(),
            "pack finished"
        );
        Ok(())
    }

    /// Drops every bin and factory. Buffered Offline input is kept.
    pub fn reset(&mut self) {
        self.closed.clear();
        self.open.clear();
        self.factories.clear();
        self.next_factory = 0;
    }

    fn insert_factory(&mut self, bin: PendingBin<N>) {
        let factory = BinFactory::new(bin.width, bin.height, bin.count, self.config.clone())
            .with_options(bin.options);
        self.factories.insert(self.next_factory, factory);
        self.next_factory += 1;
    }

    /// Opens a bin from the first factory accepted by `fits`. Depleted factories are
    /// removed; rejected ones are removed too when `discard_unfit` is set.
    fn open_bin_where(
        &mut self,
        fits: impl Fn(&BinFactory<N>) -> bool,
        discard_unfit: bool,
    ) -> bool {
        let mut dropped = Vec::new();
        let mut opened = None;
        for (&key, factory) in self.factories.iter_mut() {
            if !fits(factory) {
                if discard_unfit {
                    dropped.push(key);
                }
                continue;
            }
            let Some(bin) = factory.new_bin() else {
                dropped.push(key);
                continue;
            };
            if factory.is_empty() {
                dropped.push(key);
            }
            opened = Some(bin);
            break;
        }
        for key in dropped {
            if let Some(f) = self.factories.remove(&key) {
                debug!(factory = key, width = ?f.width(), height = ?f.height(), "factory dropped");
            }
        }
        match opened {
            Some(bin) => {
                debug!(width = ?bin.width(), height = ?bin.height(), bid = ?bin.bid(), "bin opened");
                self.open.push_back(bin);
                true
            }
            None => false,
        }
    }

    fn open_bin_for(&mut self, width: N, height: N) -> bool {
        self.open_bin_where(|f| f.fits_inside(width, height), false)
    }

    fn close_front(&mut self) {
        if let Some(bin) = self.open.pop_front() {
            debug!(rects = bin.len(), "bin closed");
            self.closed.push(bin);
        }
    }

    fn place(&mut self, width: N, height: N, rid: Option<RectId>) -> Option<PlacedRect<N>> {
        let placed = match self.config.bin_selection {
            BinSelection::NextFit => self.place_next_fit(width, height, rid),
            BinSelection::FirstFit => self.place_first_fit(width, height, rid),
            BinSelection::BestFit | BinSelection::Global => self.place_best_fit(width, height, rid),
        };
        if let Some(p) = &placed {
            trace!(rid = ?p.rid, rect = ?p.rect, rotated = p.rotated, "placed");
        }
        placed
    }

    fn place_next_fit(&mut self, width: N, height: N, rid: Option<RectId>) -> Option<PlacedRect<N>> {
        loop {
            if self.open.is_empty() && !self.open_bin_for(width, height) {
                return None;
            }
            if let Some(placed) = self.open.front_mut()?.add_rect(width, height, rid) {
                return Some(placed);
            }
            self.close_front();
        }
    }

    fn place_first_fit(
        &mut self,
        width: N,
        height: N,
        rid: Option<RectId>,
    ) -> Option<PlacedRect<N>> {
        for bin in self.open.iter_mut() {
            if let Some(placed) = bin.add_rect(width, height, rid) {
                return Some(placed);
            }
        }
        self.place_in_new_bin(width, height, rid)
    }

    fn place_best_fit(
        &mut self,
        width: N,
        height: N,
        rid: Option<RectId>,
    ) -> Option<PlacedRect<N>> {
        let mut best: Option<(usize, Fitness<N>)> = None;
        for (idx, bin) in self.open.iter().enumerate() {
            if let Some(score) = bin.fitness(width, height) {
                if better(score, best.map(|b| b.1)) {
                    best = Some((idx, score));
                }
            }
        }
        if let Some((idx, _)) = best {
            if let Some(placed) = self.open[idx].add_rect(width, height, rid) {
                return Some(placed);
            }
        }
        self.place_in_new_bin(width, height, rid)
    }

    fn place_in_new_bin(
        &mut self,
        width: N,
        height: N,
        rid: Option<RectId>,
    ) -> Option<PlacedRect<N>> {
        loop {
            if !self.open_bin_for(width, height) {
                return None;
            }
            if let Some(placed) = self.open.back_mut()?.add_rect(width, height, rid) {
                return Some(placed);
            }
        }
    }

    fn place_preset(&mut self, p: PendingPreset<N>) -> bool {
        for bin in self.open.iter_mut() {
            if bin.add_preset_rect(p.x, p.y, p.width, p.height, p.rid) {
                return true;
            }
        }
        loop {
            if !self.open_bin_where(|f| f.fits_region(p.x, p.y, p.width, p.height), false) {
                return false;
            }
            let Some(bin) = self.open.back_mut() else {
                return false;
            };
            if bin.add_preset_rect(p.x, p.y, p.width, p.height, p.rid) {
                return true;
            }
        }
    }

    /// Fills one bin at a time with whichever remaining rectangle scores best
    /// against it, then moves on to the next bin that can hold any of them.
    fn pack_global(&mut self, rects: Vec<PendingRect<N>>) {
        let mut remaining: BTreeMap<usize, PendingRect<N>> =
            rects.into_iter().enumerate().collect();

        while !remaining.is_empty() {
            if self.open.is_empty() {
                let opened = self.open_bin_where(
                    |f| remaining.values().any(|r| f.fits_inside(r.width, r.height)),
                    true,
                );
                if !opened {
                    break;
                }
            }
            let Some(bin) = self.open.front_mut() else {
                break;
            };
            loop {
                let mut best: Option<(usize, Fitness<N>)> = None;
                for (&key, r) in &remaining {
                    if let Some(score) = bin.fitness(r.width, r.height) {
                        if better(score, best.map(|b| b.1)) {
                            best = Some((key, score));
                        }
                    }
                }
                let Some((key, _)) = best else {
                    break;
                };
                let Some(r) = remaining.remove(&key) else {
                    break;
                };
                match bin.add_rect(r.width, r.height, r.rid) {
                    Some(p) => trace!(rid = ?p.rid, rect = ?p.rect, rotated = p.rotated, "placed"),
                    None => debug!(rid = ?r.rid, "rectangle rejected despite a fitness score"),
                }
            }
            self.close_front();
        }

        if !remaining.is_empty() {
            debug!(left = remaining.len(), "rectangles left without a bin");
        }
    }

    /// Number of bins, closed and open.
    pub fn len(&self) -> usize {
        self.closed.len() + self.open.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Bin by position; negative indices count from the end.
    pub fn get(&self, index: isize) -> Option<&dyn PackingAlgorithm<N>> {
        let idx = if index < 0 {
            self.len().checked_sub(index.unsigned_abs())?
        } else {
            index as usize
        };
        if idx < self.closed.len() {
            self.closed.get(idx).map(|b| &**b)
        } else {
            self.open.get(idx - self.closed.len()).map(|b| &**b)
        }
    }

    /// Closed bins, then open bins.
    pub fn iter(&self) -> impl Iterator<Item = &dyn PackingAlgorithm<N>> + '_ {
        self.closed
            .iter()
            .chain(self.open.iter())
            .map(|b| &**b as &dyn PackingAlgorithm<N>)
    }

    /// Every placed rectangle as `(bin index, x, y, width, height, rid)`.
    pub fn rect_list(&self) -> Vec<PackedRect<N>> {
        self.iter()
            .enumerate()
            .flat_map(|(idx, bin)| {
                bin.rectangles().iter().map(move |p| {
                    PackedRect::new(idx, p.rect.x, p.rect.y, p.rect.width, p.rect.height, p.rid)
                })
            })
            .collect()
    }

    /// `(width, height)` of every bin holding at least one rectangle.
    pub fn bin_list(&self) -> Vec<(N, N)> {
        self.iter()
            .filter(|b| !b.is_empty())
            .map(|b| (b.width(), b.height()))
            .collect()
    }

    /// Checks every bin for rectangles outside its bounds or overlapping each other.
    pub fn validate_packing(&self) -> Result<()> {
        self.iter().try_for_each(|b| b.validate_packing())
    }

    pub fn stats(&self) -> PackStats<N> {
        let used: Vec<_> = self.iter().filter(|b| !b.is_empty()).collect();
        let total_bin_area = used
            .iter()
            .fold(N::zero(), |acc, b| acc + b.width() * b.height());
        let used_area = used.iter().fold(N::zero(), |acc, b| acc + b.used_area());
        let total = total_bin_area.as_f64();
        PackStats {
            num_bins: used.len(),
            num_rects: used.iter().map(|b| b.len()).sum(),
            total_bin_area,
            used_area,
            occupancy: if total > 0.0 {
                used_area.as_f64() / total
            } else {
                0.0
            },
            num_rotated: used
                .iter()
                .map(|b| b.rectangles().iter().filter(|p| p.rotated).count())
                .sum(),
        }
    }

    pub fn report(&self) -> PackReport<N> {
        PackReport {
            bins: self
                .iter()
                .filter(|b| !b.is_empty())
                .map(|b| BinReport {
                    width: b.width(),
                    height: b.height(),
                    bid: b.bid(),
                    rects: b.rectangles().to_vec(),
                })
                .collect(),
            stats: self.stats(),
        }
    }

    /// Pretty-printed JSON of [`Packer::report`].
    pub fn to_json(&self) -> Result<String>
    where
        N: Serialize,
    {
        Ok(serde_json::to_string_pretty(&self.report())?)
    }
}

fn check_dimensions<N: Coord>(width: N, height: N) -> Result<()> {
    if width.is_positive() && height.is_positive() {
        Ok(())
    } else {
        Err(PackError::invalid_dimensions(width, height))
    }
}

fn cmp_coord<N: Coord>(a: N, b: N) -> Ordering {
    a.partial_cmp(&b).unwrap_or(Ordering::Equal)
}

/// Stable descending sort by the key `order` selects; `SortOrder::None` keeps the
/// input order. `dims` extracts `(width, height)`, both positive.
pub fn sort_by_order<N: Coord, T>(items: &mut [T], order: SortOrder, dims: impl Fn(&T) -> (N, N)) {
    let key_cmp = |a: (N, N), b: (N, N)| -> Ordering {
        let ((aw, ah), (bw, bh)) = (a, b);
        match order {
            SortOrder::None => Ordering::Equal,
            SortOrder::Area => cmp_coord(aw * ah, bw * bh),
            SortOrder::Perimeter => cmp_coord(aw + ah, bw + bh),
            SortOrder::Diff => cmp_coord(aw.abs_diff_of(ah), bw.abs_diff_of(bh)),
            SortOrder::ShortSide => cmp_coord(aw.min_of(ah), bw.min_of(bh))
                .then_with(|| cmp_coord(aw.max_of(ah), bw.max_of(bh))),
            SortOrder::LongSide => cmp_coord(aw.max_of(ah), bw.max_of(bh))
                .then_with(|| cmp_coord(aw.min_of(ah), bw.min_of(bh))),
            SortOrder::Ratio => cmp_coord(aw * bh, bw * ah),
        }
    };
    if order != SortOrder::None {
        items.sort_by(|a, b| key_cmp(dims(b), dims(a)));
    }
}
