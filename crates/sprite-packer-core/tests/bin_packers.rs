use sprite_packer_core::config::MaxRectsHeuristic;
use sprite_packer_core::model::{Frame, Rect};
use sprite_packer_core::packer::maxrects::MaxRectsPacker;
use sprite_packer_core::packer::skyline::SkylinePacker;
use sprite_packer_core::packer::{BinConfig, Packer};

fn disjoint(frames: &[Frame]) -> bool {
    for i in 0..frames.len() {
        for j in (i + 1)..frames.len() {
            if frames[i].frame.intersects(&frames[j].frame) {
                return false;
            }
        }
    }
    true
}

const SMALL_SET: [(u32, u32); 8] = [
    (64, 64),
    (32, 64),
    (64, 32),
    (48, 48),
    (16, 80),
    (80, 16),
    (40, 24),
    (24, 40),
];

fn fill<P: Packer<usize>>(p: &mut P) -> Vec<Frame> {
    SMALL_SET
        .iter()
        .enumerate()
        .filter_map(|(i, &(w, h))| p.pack(i, &Rect::new(0, 0, w, h)))
        .collect()
}

#[test]
fn maxrects_disjoint_on_small_set() {
    for h in [
        MaxRectsHeuristic::BestAreaFit,
        MaxRectsHeuristic::BestShortSideFit,
        MaxRectsHeuristic::BottomLeft,
    ] {
        let mut p = MaxRectsPacker::new(BinConfig::new(256, 256, 0), h);
        let frames = fill(&mut p);
        assert_eq!(frames.len(), SMALL_SET.len());
        assert!(disjoint(&frames), "{h:?}");
        let bin = Rect::new(0, 0, 256, 256);
        assert!(frames.iter().all(|f| bin.contains(&f.frame)));
    }
}

#[test]
fn skyline_disjoint_on_small_set() {
    let mut p = SkylinePacker::new(BinConfig::new(256, 256, 0));
    let frames = fill(&mut p);
    assert_eq!(frames.len(), SMALL_SET.len());
    assert!(disjoint(&frames));
}

#[test]
fn skyline_places_bottom_left_in_order() {
    let mut p = SkylinePacker::new(BinConfig::new(64, 64, 0));
    let a = <SkylinePacker as Packer<u8>>::pack(&mut p, 0, &Rect::new(0, 0, 32, 16)).expect("a");
    let b = <SkylinePacker as Packer<u8>>::pack(&mut p, 1, &Rect::new(0, 0, 32, 8)).expect("b");
    let c = <SkylinePacker as Packer<u8>>::pack(&mut p, 2, &Rect::new(0, 0, 32, 8)).expect("c");
    assert_eq!(a.frame, Rect::new(0, 0, 32, 16));
    assert_eq!(b.frame, Rect::new(32, 0, 32, 8));
    // lowest resting position is on top of b
    assert_eq!(c.frame, Rect::new(32, 8, 32, 8));
}

#[test]
fn padding_offsets_content_inside_slot() {
    let mut p = MaxRectsPacker::new(BinConfig::new(64, 64, 3), MaxRectsHeuristic::BestAreaFit);
    let f = <MaxRectsPacker as Packer<u8>>::pack(&mut p, 0, &Rect::new(0, 0, 10, 10)).expect("fits");
    assert_eq!(f.frame, Rect::new(1, 1, 10, 10));

    let mut s = SkylinePacker::new(BinConfig::new(64, 64, 4));
    let f = <SkylinePacker as Packer<u8>>::pack(&mut s, 0, &Rect::new(0, 0, 10, 10)).expect("fits");
    assert_eq!(f.frame, Rect::new(2, 2, 10, 10));
}

#[test]
fn perfect_fit_fills_the_bin() {
    let mut p = MaxRectsPacker::new(BinConfig::new(32, 32, 0), MaxRectsHeuristic::BestAreaFit);
    let f = <MaxRectsPacker as Packer<u8>>::pack(&mut p, 0, &Rect::new(0, 0, 32, 32)).expect("fits");
    assert_eq!(f.frame, Rect::new(0, 0, 32, 32));
    assert_eq!(p.free_list_len(), 0);
    assert!(!<MaxRectsPacker as Packer<u8>>::can_pack(&p, &Rect::new(0, 0, 1, 1)));
}

#[test]
fn empty_and_oversized_rects_are_refused() {
    let mut p = MaxRectsPacker::new(BinConfig::new(32, 32, 0), MaxRectsHeuristic::BestAreaFit);
    assert!(<MaxRectsPacker as Packer<u8>>::pack(&mut p, 0, &Rect::new(0, 0, 0, 4)).is_none());
    assert!(<MaxRectsPacker as Packer<u8>>::pack(&mut p, 0, &Rect::new(0, 0, 33, 4)).is_none());

    let mut s = SkylinePacker::new(BinConfig::new(32, 32, 0));
    assert!(<SkylinePacker as Packer<u8>>::pack(&mut s, 0, &Rect::new(0, 0, 4, 0)).is_none());
    assert!(<SkylinePacker as Packer<u8>>::pack(&mut s, 0, &Rect::new(0, 0, 4, 33)).is_none());
}

#[test]
fn maxrects_free_list_is_pruned() {
    let mut p = MaxRectsPacker::new(BinConfig::new(128, 128, 0), MaxRectsHeuristic::BestAreaFit);
    let _ = <MaxRectsPacker as Packer<u8>>::pack(&mut p, 0, &Rect::new(0, 0, 64, 64));
    // right strip and bottom strip; nothing contained in another
    assert_eq!(p.free_list_len(), 2);
}
