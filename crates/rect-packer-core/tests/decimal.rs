#![cfg(feature = "decimal")]

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rect_packer_core::prelude::*;
use rust_decimal::Decimal;

fn tenths(v: i64) -> Decimal {
    Decimal::new(v, 1)
}

fn pack_with(builder: PackerConfigBuilder) -> Packer<Decimal> {
    let mut rng = StdRng::seed_from_u64(2024);
    let cfg = builder
        .bin_selection(BinSelection::FirstFit)
        .allow_rotation(true)
        .build();
    let mut p = Packer::new(cfg).unwrap();
    p.add_bin(tenths(800), tenths(800), 1).unwrap();
    p.add_bin(tenths(1000), tenths(1000), 30).unwrap();
    for rid in 0..300 {
        let w = tenths(rng.gen_range(80..=300));
        let h = tenths(rng.gen_range(80..=300));
        p.add_rect(w, h, Some(rid)).unwrap();
    }
    p.pack().unwrap();
    p
}

#[test]
fn decimal_coordinates_pack_cleanly() {
    let builders = [
        PackerConfig::builder().mr_heuristic(MaxRectsHeuristic::BestShortSideFit),
        PackerConfig::builder()
            .g_choice(GuillotineChoice::BestShortSideFit)
            .g_split(GuillotineSplit::SplitShorterAxis),
        PackerConfig::builder()
            .skyline_heuristic(SkylineHeuristic::MinWaste)
            .use_waste_map(true),
    ];
    for builder in builders {
        let p = pack_with(builder);
        p.validate_packing().unwrap();
        assert!(p.len() > 1);
        assert_eq!(p.rect_list().len(), 300);
    }
}

#[test]
fn decimal_enclose() {
    let mut en = Enclose::new(false);
    en.add_rect(tenths(15), tenths(10));
    en.add_rect(tenths(15), tenths(10));
    let found = en.generate().unwrap();
    assert_eq!(found.area(), tenths(30) * tenths(10));
}
