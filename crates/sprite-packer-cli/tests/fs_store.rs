use image::{Rgb, RgbImage, Rgba, RgbaImage};
use sprite_packer_cli::{FsAssetStore, load_registry, save_registry};
use sprite_packer_core::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};

fn scratch_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("sprite-packer-{}-{name}", std::process::id()));
    let _ = fs::remove_dir_all(&dir);
    fs::create_dir_all(&dir).expect("create scratch dir");
    dir
}

fn write_png(root: &Path, rel: &str, w: u32, h: u32, color: [u8; 4]) {
    let path = root.join(rel);
    fs::create_dir_all(path.parent().expect("parent")).expect("mkdir");
    RgbaImage::from_pixel(w, h, Rgba(color))
        .save(&path)
        .expect("write png");
}

#[test]
fn lists_images_recursively_and_skips_other_files() {
    let root = scratch_dir("list");
    write_png(&root, "sprites/a.png", 4, 4, [1, 2, 3, 255]);
    write_png(&root, "sprites/nested/b.png", 4, 4, [1, 2, 3, 255]);
    fs::write(root.join("sprites/notes.txt"), "not an image").expect("write");
    fs::write(root.join("sprites/a.png.sprites.json"), "{}").expect("write");

    let store = FsAssetStore::new(&root);
    let list = store.list_images(Path::new("sprites")).expect("list");
    assert_eq!(
        list,
        vec![
            PathBuf::from("sprites/a.png"),
            PathBuf::from("sprites/nested/b.png")
        ]
    );
    assert!(store.directory_exists(Path::new("sprites/nested")));
    assert!(!store.directory_exists(Path::new("missing")));
    assert!(store.asset_exists(Path::new("sprites/nested/b.png")));
    assert!(!store.asset_exists(Path::new("sprites/nested")));
    assert!(!store.asset_exists(Path::new("sprites/gone.png")));
}

#[test]
fn exclude_patterns_filter_listing() {
    let root = scratch_dir("exclude");
    write_png(&root, "sprites/keep.png", 2, 2, [0, 0, 0, 255]);
    write_png(&root, "sprites/wip/skip.png", 2, 2, [0, 0, 0, 255]);

    let store = FsAssetStore::new(&root)
        .with_exclude(&["**/wip/**".to_string()])
        .expect("globs");
    let list = store.list_images(Path::new("sprites")).expect("list");
    assert_eq!(list, vec![PathBuf::from("sprites/keep.png")]);
}

#[test]
fn pixels_need_read_access() {
    let root = scratch_dir("readable");
    write_png(&root, "a.png", 3, 2, [9, 8, 7, 255]);
    let mut store = FsAssetStore::new(&root);
    let a = Path::new("a.png");

    assert!(matches!(
        store.load_pixels(a),
        Err(SpritePackerError::UnreadableSource(_))
    ));
    store.set_readable(a, true).expect("readable");
    let pixels = store.load_pixels(a).expect("load");
    assert_eq!(pixels.dimensions(), (3, 2));
    assert_eq!(pixels.pixel(0, 0), [9, 8, 7, 255]);
    assert!(store.set_readable(Path::new("nope.png"), true).is_err());
}

#[test]
fn pixel_format_comes_from_the_file() {
    let root = scratch_dir("format");
    write_png(&root, "rgba.png", 2, 2, [0, 0, 0, 255]);
    RgbImage::from_pixel(2, 2, Rgb([5, 5, 5]))
        .save(root.join("rgb.png"))
        .expect("write");
    let mut store = FsAssetStore::new(&root);

    assert_eq!(store.pixel_format(Path::new("rgba.png")).expect("fmt"), PixelFormat::Rgba32);
    assert_eq!(store.pixel_format(Path::new("rgb.png")).expect("fmt"), PixelFormat::Rgb24);
    store
        .convert_format(Path::new("rgb.png"), &PixelFormat::Rgba32)
        .expect("convert");
    assert_eq!(store.pixel_format(Path::new("rgb.png")).expect("fmt"), PixelFormat::Rgba32);
}

#[test]
fn rebuild_writes_atlas_and_sheet() {
    let root = scratch_dir("rebuild");
    write_png(&root, "atlas.png", 1, 1, [0, 0, 0, 0]);
    write_png(&root, "sprites/hero.png", 16, 16, [255, 0, 0, 255]);
    write_png(&root, "sprites/coin.png", 8, 8, [255, 255, 0, 255]);

    let mut reg = AtlasRegistry::new("atlas.png");
    reg.add_folder("sprites").expect("folder");
    let mut store = FsAssetStore::new(&root);
    let report = rebuild(&mut reg, &mut store).into_result().expect("rebuild");
    assert_eq!(report.sprites, 2);

    let atlas = image::open(root.join("atlas.png")).expect("atlas").to_rgba8();
    assert_eq!(atlas.dimensions(), (report.atlas_width, report.atlas_height));
    assert!(store.sheet_path(Path::new("atlas.png")).is_file());

    let sheet = store.read_sprite_sheet(Path::new("atlas.png")).expect("sheet");
    let hero = sheet.iter().find(|m| m.name == "hero").expect("hero");
    assert_eq!((hero.rect.w, hero.rect.h), (16, 16));
    assert_eq!(atlas.get_pixel(hero.rect.x, hero.rect.y).0, [255, 0, 0, 255]);

    let registry_path = root.join("atlas.registry.json");
    save_registry(&registry_path, &reg).expect("save");
    let loaded = load_registry(&registry_path).expect("load");
    assert_eq!(loaded.entries(), reg.entries());
    assert!(loaded.entries().iter().all(|e| e.target.is_some()));
}

#[test]
fn missing_sheet_reads_as_empty() {
    let root = scratch_dir("empty-sheet");
    write_png(&root, "atlas.png", 1, 1, [0, 0, 0, 0]);
    let store = FsAssetStore::new(&root);
    assert!(store
        .read_sprite_sheet(Path::new("atlas.png"))
        .expect("sheet")
        .is_empty());
    assert!(store.find_sub_image_by_name(Path::new("atlas.png"), "x").is_none());
}
