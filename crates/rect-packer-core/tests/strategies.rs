use rect_packer_core::config::{GuillotineChoice, GuillotineSplit, MaxRectsHeuristic};
use rect_packer_core::geometry::Rect;
use rect_packer_core::packer::{Guillotine, MaxRects, PackingAlgorithm, Skyline};
use rect_packer_core::SkylineHeuristic;

fn placed_at<P: PackingAlgorithm<i32>>(bin: &mut P, w: i32, h: i32) -> Option<Rect<i32>> {
    bin.add_rect(w, h, None).map(|p| p.rect)
}

#[test]
fn maxrects_bssf_with_rotation() {
    let mut m = MaxRects::new(200, 100, true, MaxRectsHeuristic::BestShortSideFit);
    assert_eq!(placed_at(&mut m, 50, 30), Some(Rect::new(0, 0, 50, 30)));
    assert_eq!(placed_at(&mut m, 70, 200), Some(Rect::new(0, 30, 200, 70)));
    assert_eq!(placed_at(&mut m, 20, 20), Some(Rect::new(50, 0, 20, 20)));
    assert_eq!(placed_at(&mut m, 50, 50), None);
    assert_eq!(placed_at(&mut m, 30, 100), Some(Rect::new(70, 0, 100, 30)));
    assert_eq!(m.len(), 4);
    assert!(m.rectangles()[1].rotated);
    m.validate_packing().unwrap();
}

#[test]
fn maxrects_bottom_left_prefers_low_positions() {
    let mut m = MaxRects::new(100, 100, false, MaxRectsHeuristic::BottomLeft);
    assert_eq!(placed_at(&mut m, 40, 40), Some(Rect::new(0, 0, 40, 40)));
    assert_eq!(placed_at(&mut m, 20, 20), Some(Rect::new(40, 0, 20, 20)));
    assert_eq!(placed_at(&mut m, 60, 40), Some(Rect::new(40, 20, 60, 40)));
    m.validate_packing().unwrap();
}

#[test]
fn maxrects_fills_exactly() {
    for h in [
        MaxRectsHeuristic::BestAreaFit,
        MaxRectsHeuristic::BestShortSideFit,
        MaxRectsHeuristic::BestLongSideFit,
        MaxRectsHeuristic::BottomLeft,
        MaxRectsHeuristic::ContactPoint,
    ] {
        let mut m = MaxRects::new(100, 100, false, h);
        for _ in 0..4 {
            assert!(m.add_rect(50, 50, None).is_some(), "{h:?}");
        }
        assert!(m.add_rect(1, 1, None).is_none(), "{h:?}");
        assert_eq!(m.used_area(), 10_000);
        assert!(m.free_rects().is_empty());
    }
}

#[test]
fn guillotine_best_area_fit() {
    let mut g = Guillotine::new(
        100,
        100,
        false,
        GuillotineChoice::BestAreaFit,
        GuillotineSplit::SplitShorterAxis,
    );
    assert_eq!(placed_at(&mut g, 50, 20), Some(Rect::new(0, 0, 50, 20)));
    assert_eq!(placed_at(&mut g, 50, 80), Some(Rect::new(0, 20, 50, 80)));
    assert_eq!(placed_at(&mut g, 50, 20), Some(Rect::new(50, 0, 50, 20)));
    g.validate_packing().unwrap();
}

#[test]
fn strategies_reject_oversized_boxes() {
    let mut bins: Vec<Box<dyn PackingAlgorithm<i32>>> = vec![
        Box::new(MaxRects::new(50, 50, true, MaxRectsHeuristic::BestAreaFit)),
        Box::new(Guillotine::new(
            50,
            50,
            true,
            GuillotineChoice::BestShortSideFit,
            GuillotineSplit::SplitLongerLeftoverAxis,
        )),
        Box::new(Skyline::new(50, 50, true, SkylineHeuristic::BottomLeft)),
        Box::new(Skyline::new(50, 50, true, SkylineHeuristic::MinWaste).with_waste_management(true)),
    ];
    for bin in bins.iter_mut() {
        assert_eq!(bin.fitness(51, 10), None, "{bin:?}");
        assert!(bin.add_rect(10, 51, None).is_none(), "{bin:?}");
        assert!(bin.add_rect(50, 50, None).is_some(), "{bin:?}");
        assert!(!bin.is_empty());
        bin.reset();
        assert!(bin.is_empty());
        assert!(bin.add_rect(50, 10, None).is_some(), "{bin:?}");
    }
}

#[test]
fn rect_ids_and_negative_indexing() {
    let mut s = Skyline::new(100, 100, false, SkylineHeuristic::BottomLeft);
    s.add_rect(10, 10, Some(1)).unwrap();
    s.add_rect(20, 20, Some(2)).unwrap();
    assert_eq!(s.get(-1).and_then(|p| p.rid), Some(2));
    assert_eq!(s.get(0).and_then(|p| p.rid), Some(1));
    assert!(s.get(2).is_none());
    assert!(s.get(-3).is_none());
    assert_eq!(
        s.rect_list(),
        vec![(0, 0, 10, 10, Some(1)), (10, 0, 20, 20, Some(2))]
    );
}
