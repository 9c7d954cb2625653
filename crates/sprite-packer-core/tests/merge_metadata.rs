use sprite_packer_core::build::BuildWarning;
use sprite_packer_core::config::AtlasConfig;
use sprite_packer_core::merge::{MergeItem, assign_names, merge};
use sprite_packer_core::model::{
    Border, EntryOrigin, Rect, SourceEntry, SourceRef, SpriteAlignment, SpriteMetadata, SubImage,
    SubImageRef, Vec2,
};
use sprite_packer_core::packer::atlas::{PackedAtlas, pack_atlas};
use sprite_packer_core::pixel::PixelBuffer;

fn packed(sizes: &[Option<(u32, u32)>]) -> PackedAtlas {
    let buffers: Vec<_> = sizes
        .iter()
        .map(|s| s.map(|(w, h)| PixelBuffer::new(w, h)))
        .collect();
    pack_atlas(&buffers, &AtlasConfig::default()).expect("pack")
}

fn item(name: &str) -> MergeItem {
    MergeItem {
        name: name.into(),
        sub_image: None,
    }
}

#[test]
fn prior_record_keeps_border_and_pivot() {
    let atlas = packed(&[Some((20, 20)), Some((8, 8))]);
    let prior = vec![SpriteMetadata {
        name: "Hero".into(),
        rect: Rect::new(100, 100, 20, 20),
        border: Border::uniform(2.0),
        alignment: SpriteAlignment::Custom,
        pivot: Vec2::new(0.25, 0.75),
    }];
    let sheet = merge(&atlas, &prior, &[item("Hero"), item("Coin")], &AtlasConfig::default());
    assert_eq!(sheet.len(), 2);

    let hero = &sheet[0];
    assert_eq!(hero.name, "Hero");
    assert_eq!(hero.border, Border::uniform(2.0));
    assert_eq!(hero.alignment, SpriteAlignment::Custom);
    assert_eq!(hero.pivot, Vec2::new(0.25, 0.75));
    assert_eq!(Some(hero.rect), atlas.pixel_rect(0));

    let coin = &sheet[1];
    assert_eq!(coin.border, Border::ZERO);
    assert_eq!(coin.alignment, SpriteAlignment::Center);
    assert_eq!(coin.pivot, Vec2::CENTER);
}

#[test]
fn defaults_come_from_config() {
    let atlas = packed(&[Some((4, 4))]);
    let cfg = AtlasConfig::builder()
        .default_alignment(SpriteAlignment::BottomLeft)
        .default_custom_pivot(Vec2::new(0.1, 0.9))
        .build();
    let sheet = merge(&atlas, &[], &[item("a")], &cfg);
    assert_eq!(sheet[0].alignment, SpriteAlignment::BottomLeft);
    assert_eq!(sheet[0].pivot, Vec2::new(0.1, 0.9));
    assert_eq!(sheet[0].effective_pivot(), Vec2::new(0.0, 1.0));
}

#[test]
fn merging_twice_is_idempotent() {
    let atlas = packed(&[Some((16, 16)), Some((10, 30)), Some((5, 5))]);
    let items = [item("a"), item("b"), item("c")];
    let prior = vec![SpriteMetadata {
        name: "b".into(),
        rect: Rect::default(),
        border: Border {
            left: 1.0,
            bottom: 2.0,
            right: 3.0,
            top: 4.0,
        },
        alignment: SpriteAlignment::TopRight,
        pivot: Vec2::CENTER,
    }];
    let first = merge(&atlas, &prior, &items, &AtlasConfig::default());
    let second = merge(&atlas, &first, &items, &AtlasConfig::default());
    assert_eq!(first, second);
}

#[test]
fn sub_image_source_derives_custom_pivot() {
    let atlas = packed(&[Some((32, 16))]);
    let sub = SubImage {
        atlas: "other.png".into(),
        meta: SpriteMetadata {
            name: "door".into(),
            rect: Rect::new(0, 0, 32, 16),
            border: Border::uniform(3.0),
            alignment: SpriteAlignment::BottomCenter,
            pivot: Vec2::CENTER,
        },
    };
    let sheet = merge(
        &atlas,
        &[],
        &[MergeItem {
            name: "door".into(),
            sub_image: Some(sub),
        }],
        &AtlasConfig::default(),
    );
    let door = &sheet[0];
    assert_eq!(door.alignment, SpriteAlignment::Custom);
    assert_eq!(door.border, Border::uniform(3.0));
    assert!((door.pivot.x - 0.5).abs() < 1e-6);
    assert!((door.pivot.y - 1.0).abs() < 1e-6);
}

#[test]
fn zero_extent_axis_maps_to_middle() {
    let meta = SpriteMetadata {
        name: "line".into(),
        rect: Rect::new(0, 0, 10, 0),
        border: Border::ZERO,
        alignment: SpriteAlignment::TopLeft,
        pivot: Vec2::CENTER,
    };
    let pivot = meta.bounds().derived_pivot();
    assert!((pivot.x - 0.0).abs() < 1e-6);
    assert_eq!(pivot.y, 0.5);
}

#[test]
fn unplaced_items_produce_no_record() {
    let atlas = packed(&[Some((4, 4)), None, Some((6, 6))]);
    let sheet = merge(
        &atlas,
        &[],
        &[item("a"), item("gone"), item("c")],
        &AtlasConfig::default(),
    );
    let names: Vec<_> = sheet.iter().map(|m| m.name.as_str()).collect();
    assert_eq!(names, ["a", "c"]);
}

#[test]
fn names_prefer_target_then_source_then_index() {
    let mut renamed = SourceEntry::new(SourceRef::Texture("art/hero.png".into()), EntryOrigin::Manual);
    renamed.target = Some(SubImageRef::new("atlas.png", "Hero"));
    let entries = vec![
        renamed,
        SourceEntry::new(SourceRef::Texture("art/coin.png".into()), EntryOrigin::FolderWatched),
        SourceEntry::default(),
        SourceEntry::new(
            SourceRef::SubImage(SubImageRef::new("ui.png", "button")),
            EntryOrigin::Manual,
        ),
    ];
    let (names, warnings) = assign_names(&entries);
    assert_eq!(names, ["Hero", "coin", "sprite_2", "button"]);
    assert!(warnings.is_empty());
}

#[test]
fn colliding_names_are_suffixed() {
    let entries = vec![
        SourceEntry::new(SourceRef::Texture("a/icon.png".into()), EntryOrigin::FolderWatched),
        SourceEntry::new(SourceRef::Texture("b/icon.png".into()), EntryOrigin::FolderWatched),
        SourceEntry::new(SourceRef::Texture("c/icon_1.png".into()), EntryOrigin::FolderWatched),
        SourceEntry::new(SourceRef::Texture("d/icon.png".into()), EntryOrigin::FolderWatched),
    ];
    let (names, warnings) = assign_names(&entries);
    // "icon_1" is free when entry 1 is renamed; entry 2 then collides with it
    assert_eq!(names, ["icon", "icon_1", "icon_1_2", "icon_3"]);
    assert_eq!(warnings.len(), 3);
    assert_eq!(
        warnings[0],
        BuildWarning::DuplicateNameCollision {
            original: "icon".into(),
            renamed: "icon_1".into(),
        }
    );
}
