use sprite_packer_core::model::{SourceRef, SubImageRef};
use sprite_packer_core::pixel::PixelBuffer;
use sprite_packer_core::rebuild;
use sprite_packer_core::references::{
    ReplaceMode, SpriteField, SpriteReferences, count_replaceable, replacement_pairs,
};
use sprite_packer_core::registry::AtlasRegistry;
use sprite_packer_core::store::MemoryAssetStore;

fn tex(p: &str) -> SourceRef {
    SourceRef::Texture(p.into())
}

fn packed(name: &str) -> SourceRef {
    SourceRef::SubImage(SubImageRef::new("atlas.png", name))
}

fn built_registry() -> AtlasRegistry {
    let mut store = MemoryAssetStore::new();
    store.insert_image("atlas.png", PixelBuffer::new(1, 1));
    store.insert_image("art/hero.png", PixelBuffer::new(8, 8));
    store.insert_image("art/coin.png", PixelBuffer::new(4, 4));
    let mut reg = AtlasRegistry::new("atlas.png");
    reg.add_folder("art").expect("folder");
    rebuild(&mut reg, &mut store).into_result().expect("rebuild");
    reg
}

#[test]
fn pairs_follow_the_mode() {
    let reg = built_registry();
    let to_atlas = replacement_pairs(&reg, ReplaceMode::SourceWithAtlas);
    assert_eq!(to_atlas.len(), 2);
    assert_eq!(to_atlas.get(&tex("art/hero.png")), Some(&packed("hero")));

    let to_source = replacement_pairs(&reg, ReplaceMode::AtlasWithSource);
    assert_eq!(to_source.get(&packed("coin")), Some(&tex("art/coin.png")));
}

#[test]
fn replace_walks_every_field_shape() {
    let reg = built_registry();
    let map = replacement_pairs(&reg, ReplaceMode::SourceWithAtlas);

    let mut fields = vec![
        SpriteField::Single(Some(tex("art/hero.png"))),
        SpriteField::Single(None),
        SpriteField::List(vec![Some(tex("art/coin.png")), None, Some(tex("art/other.png"))]),
        SpriteField::Group(vec![
            SpriteField::Single(Some(tex("art/coin.png"))),
            SpriteField::List(vec![Some(tex("art/hero.png"))]),
        ]),
    ];
    assert_eq!(count_replaceable(&fields, &map), 4);

    assert_eq!(fields.replace(&map), 4);
    assert_eq!(fields[0], SpriteField::Single(Some(packed("hero"))));
    assert_eq!(
        fields[2],
        SpriteField::List(vec![Some(packed("coin")), None, Some(tex("art/other.png"))])
    );

    let mut seen = Vec::new();
    fields.scan(&mut |r| seen.push(r.clone()));
    assert_eq!(seen.len(), 5);
    assert_eq!(count_replaceable(&fields, &map), 0);
    assert_eq!(fields.replace(&map), 0);
}

#[test]
fn round_trip_back_to_sources() {
    let reg = built_registry();
    let mut field = Some(tex("art/hero.png"));
    SpriteReferences::replace(&mut field, &replacement_pairs(&reg, ReplaceMode::SourceWithAtlas));
    assert_eq!(field, Some(packed("hero")));
    SpriteReferences::replace(&mut field, &replacement_pairs(&reg, ReplaceMode::AtlasWithSource));
    assert_eq!(field, Some(tex("art/hero.png")));
}

#[test]
fn modes_parse_from_strings() {
    assert_eq!("source-with-atlas".parse::<ReplaceMode>(), Ok(ReplaceMode::SourceWithAtlas));
    assert_eq!("to_source".parse::<ReplaceMode>(), Ok(ReplaceMode::AtlasWithSource));
    assert!("sideways".parse::<ReplaceMode>().is_err());
}
