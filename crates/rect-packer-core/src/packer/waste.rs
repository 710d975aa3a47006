use super::{Fitness, Guillotine, PackingAlgorithm, Surface};
use crate::config::{GuillotineChoice, GuillotineSplit};
use crate::geometry::Rect;
use crate::model::{PlacedRect, RectId};
use crate::numeric::Coord;

/// Recovers pockets left below a skyline.
///
/// Starts with no free space; regions are registered with [`WasteManager::add_waste`]
/// and packed with best-short-side-fit plus shorter-axis splits. New regions are
/// merged with adjacent ones.
#[derive(Debug, Clone)]
pub struct WasteManager<N> {
    inner: Guillotine<N>,
}

impl<N: Coord> WasteManager<N> {
    /// `width x height` bounds the area waste may be registered in.
    pub fn new(width: N, height: N, rotation: bool) -> Self {
        let mut inner = Guillotine::new(
            width,
            height,
            rotation,
            GuillotineChoice::BestShortSideFit,
            GuillotineSplit::SplitShorterAxis,
        )
        .with_merge(true);
        inner.clear_sections();
        Self { inner }
    }

    pub fn add_waste(&mut self, x: N, y: N, width: N, height: N) {
        if !width.is_positive() || !height.is_positive() {
            return;
        }
        self.inner.add_section(Rect::new(x, y, width, height));
    }

    pub fn sections(&self) -> &[Rect<N>] {
        self.inner.sections()
    }

    /// Removes `rect` from the registered waste.
    pub(crate) fn carve(&mut self, rect: &Rect<N>) {
        self.inner.carve(rect);
    }
}

impl<N: Coord> PackingAlgorithm<N> for WasteManager<N> {
    fn surface(&self) -> &Surface<N> {
        self.inner.surface()
    }

    fn fitness(&self, width: N, height: N) -> Option<Fitness<N>> {
        self.inner.fitness(width, height)
    }

    fn add_rect(&mut self, width: N, height: N, rid: Option<RectId>) -> Option<PlacedRect<N>> {
        self.inner.add_rect(width, height, rid)
    }

    /// Waste only accepts rectangles through [`PackingAlgorithm::add_rect`].
    fn add_preset_rect(&mut self, _x: N, _y: N, _w: N, _h: N, _rid: Option<RectId>) -> bool {
        false
    }

    fn reset(&mut self) {
        self.inner.reset();
        self.inner.clear_sections();
    }
}
