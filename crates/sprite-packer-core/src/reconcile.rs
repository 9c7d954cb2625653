use crate::error::Result;
use crate::model::{EntryOrigin, SourceEntry, SourceRef};
use crate::store::AssetStore;
use std::collections::HashSet;
use std::path::PathBuf;
use tracing::{debug, instrument, warn};

/// Entry set after folder discovery.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Reconciliation {
    pub entries: Vec<SourceEntry>,
    /// Included folders that no longer exist. Their contents were skipped.
    pub stale_folders: Vec<PathBuf>,
}

#[instrument(skip_all, fields(folders = folders.len(), existing = existing.len()))]
/// Rebuilds the entry set from the included folders.
///
/// - `Manual` entries are kept as they are.
/// - Folder-watched entries whose asset is discovered again keep their position and target;
///   the others are dropped.
/// - Newly discovered assets are appended as folder-watched entries without a target, in
///   folder order. An asset that already backs an entry is never added twice.
pub fn reconcile(
    store: &dyn AssetStore,
    folders: &[PathBuf],
    existing: &[SourceEntry],
) -> Result<Reconciliation> {
    let mut stale_folders = Vec::new();
    let mut discovered: Vec<SourceRef> = Vec::new();
    let mut seen: HashSet<SourceRef> = existing
        .iter()
        .filter(|e| e.origin == EntryOrigin::Manual)
        .filter_map(|e| e.source.clone())
        .collect();

    for folder in folders {
        if !store.directory_exists(folder) {
            warn!(folder = %folder.display(), "included folder no longer exists");
            stale_folders.push(folder.clone());
            continue;
        }
        for image in store.list_images(folder)? {
            let source = SourceRef::Texture(image);
            if seen.insert(source.clone()) {
                discovered.push(source);
            }
        }
    }

    let discovered_set: HashSet<&SourceRef> = discovered.iter().collect();
    let mut carried: HashSet<SourceRef> = HashSet::new();
    let mut entries = Vec::with_capacity(existing.len() + discovered.len());
    for entry in existing {
        match entry.origin {
            EntryOrigin::Manual => entries.push(entry.clone()),
            EntryOrigin::FolderWatched => {
                let Some(source) = &entry.source else {
                    continue;
                };
                if discovered_set.contains(source) && carried.insert(source.clone()) {
                    entries.push(entry.clone());
                }
            }
        }
    }
    let mut added = 0usize;
    for source in discovered {
        if !carried.contains(&source) {
            entries.push(SourceEntry::new(source, EntryOrigin::FolderWatched));
            added += 1;
        }
    }

    debug!(
        entries = entries.len(),
        carried = carried.len(),
        added,
        stale = stale_folders.len(),
        "reconciled"
    );
    Ok(Reconciliation {
        entries,
        stale_folders,
    })
}
