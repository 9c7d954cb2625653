//! Filesystem plumbing for the `sprite-packer` command line tool.

pub mod fs_store;

pub use fs_store::FsAssetStore;

use anyhow::Context;
use sprite_packer_core::registry::AtlasRegistry;
use std::fs;
use std::path::Path;

pub fn load_registry(path: &Path) -> anyhow::Result<AtlasRegistry> {
    let text =
        fs::read_to_string(path).with_context(|| format!("read registry {}", path.display()))?;
    AtlasRegistry::from_json(&text).with_context(|| format!("parse registry {}", path.display()))
}

pub fn save_registry(path: &Path, registry: &AtlasRegistry) -> anyhow::Result<()> {
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        fs::create_dir_all(dir).with_context(|| format!("create {}", dir.display()))?;
    }
    fs::write(path, registry.to_json()?)
        .with_context(|| format!("write registry {}", path.display()))
}
