use sprite_packer_core::build::reconcile_folders;
use sprite_packer_core::model::{EntryOrigin, SourceEntry, SourceRef, SubImageRef};
use sprite_packer_core::pixel::PixelBuffer;
use sprite_packer_core::reconcile::reconcile;
use sprite_packer_core::registry::AtlasRegistry;
use sprite_packer_core::store::MemoryAssetStore;
use std::path::PathBuf;

fn texture(p: &str) -> SourceRef {
    SourceRef::Texture(PathBuf::from(p))
}

fn store_with(paths: &[&str]) -> MemoryAssetStore {
    let mut store = MemoryAssetStore::new();
    for p in paths {
        store.insert_image(*p, PixelBuffer::new(4, 4));
    }
    store
}

#[test]
fn stale_folder_is_reported_and_removed() {
    let store = store_with(&["atlas.png", "sprites/a.png"]);
    let mut reg = AtlasRegistry::new("atlas.png");
    reg.add_folder("sprites").expect("add");
    reg.add_folder("deleted").expect("add");

    let report = reconcile_folders(&mut reg, &store).expect("reconcile");
    assert_eq!(report.removed_stale_folders, vec![PathBuf::from("deleted")]);
    assert_eq!(report.entries, 1);
    assert_eq!(reg.folders(), [PathBuf::from("sprites")]);
    assert_eq!(reg.entries()[0].source, Some(texture("sprites/a.png")));
    assert_eq!(reg.entries()[0].origin, EntryOrigin::FolderWatched);
}

#[test]
fn manual_entries_survive() {
    let store = store_with(&["sprites/a.png", "loose/b.png"]);
    let mut manual = SourceEntry::new(texture("loose/b.png"), EntryOrigin::Manual);
    manual.target = Some(SubImageRef::new("atlas.png", "b"));
    let existing = vec![manual.clone()];

    let rec = reconcile(&store, &[PathBuf::from("sprites")], &existing).expect("reconcile");
    assert_eq!(rec.entries.len(), 2);
    assert_eq!(rec.entries[0], manual);
    assert_eq!(rec.entries[1].source, Some(texture("sprites/a.png")));
    assert!(rec.stale_folders.is_empty());
}

#[test]
fn asset_already_present_is_not_added_again() {
    let store = store_with(&["sprites/a.png", "sprites/b.png"]);
    let existing = vec![SourceEntry::new(texture("sprites/a.png"), EntryOrigin::Manual)];
    let folders = [PathBuf::from("sprites"), PathBuf::from("sprites")];

    let rec = reconcile(&store, &folders, &existing).expect("reconcile");
    let sources: Vec<_> = rec.entries.iter().map(|e| e.source.clone()).collect();
    assert_eq!(
        sources,
        vec![Some(texture("sprites/a.png")), Some(texture("sprites/b.png"))]
    );
    assert_eq!(rec.entries[0].origin, EntryOrigin::Manual);
}

#[test]
fn rediscovered_folder_entries_keep_their_target() {
    let store = store_with(&["sprites/a.png", "sprites/b.png", "sprites/c.png"]);
    let mut a = SourceEntry::new(texture("sprites/a.png"), EntryOrigin::FolderWatched);
    a.target = Some(SubImageRef::new("atlas.png", "renamed_a"));
    let gone = SourceEntry::new(texture("sprites/old.png"), EntryOrigin::FolderWatched);
    let existing = vec![gone, a.clone()];

    let rec = reconcile(&store, &[PathBuf::from("sprites")], &existing).expect("reconcile");
    assert_eq!(rec.entries.len(), 3);
    assert_eq!(rec.entries[0], a);
    assert_eq!(rec.entries[0].name().as_deref(), Some("renamed_a"));
    assert!(rec.entries[1..].iter().all(|e| e.target.is_none()));
}

#[test]
fn nested_directories_are_scanned() {
    let store = store_with(&["sprites/ui/ok.png", "sprites/fx/spark.png", "elsewhere/x.png"]);
    let rec = reconcile(&store, &[PathBuf::from("sprites")], &[]).expect("reconcile");
    let mut names: Vec<_> = rec.entries.iter().filter_map(|e| e.name()).collect();
    names.sort();
    assert_eq!(names, ["ok", "spark"]);
}

#[test]
fn removed_folder_drops_its_entries_on_next_pass() {
    let mut store = store_with(&["sprites/a.png", "more/b.png"]);
    let mut reg = AtlasRegistry::new("atlas.png");
    reg.add_folder("sprites").expect("add");
    reg.add_folder("more").expect("add");
    reconcile_folders(&mut reg, &store).expect("first");
    assert_eq!(reg.entries().len(), 2);

    store.remove_directory(std::path::Path::new("more"));
    let report = reconcile_folders(&mut reg, &store).expect("second");
    assert_eq!(report.removed_stale_folders, vec![PathBuf::from("more")]);
    assert_eq!(reg.entries().len(), 1);
    assert_eq!(reg.folders().len(), 1);
}
