use crate::config::{AtlasConfig, PackingStrategy};
use crate::error::{Result, SpritePackerError};
use crate::model::{EntryOrigin, SourceEntry, SourceRef, SubImageRef};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Persistent description of one atlas: where its bitmap lives, how it is packed and which
/// sources go into it.
///
/// The configuration can only be changed through validating setters. Entries and folders are
/// rewritten by the build pipeline; callers manage manual entries and included folders.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AtlasRegistry {
    atlas: PathBuf,
    #[serde(default)]
    config: AtlasConfig,
    #[serde(default)]
    entries: Vec<SourceEntry>,
    #[serde(default)]
    folders: Vec<PathBuf>,
    #[serde(skip)]
    build_lock: BuildLock,
}

/// Re-entrancy flag shared by every clone of a registry value.
#[derive(Debug, Clone, Default)]
struct BuildLock(Arc<AtomicBool>);

/// Held for the duration of a build; releases the registry's lock on drop.
#[derive(Debug)]
pub struct BuildGuard(Arc<AtomicBool>);

impl Drop for BuildGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl AtlasRegistry {
    pub fn new(atlas: impl Into<PathBuf>) -> Self {
        Self {
            atlas: atlas.into(),
            config: AtlasConfig::default(),
            entries: Vec::new(),
            folders: Vec::new(),
            build_lock: BuildLock::default(),
        }
    }

    pub fn with_config(atlas: impl Into<PathBuf>, config: AtlasConfig) -> Result<Self> {
        let mut reg = Self::new(atlas);
        reg.set_config(config)?;
        Ok(reg)
    }

    pub fn atlas(&self) -> &Path {
        &self.atlas
    }

    pub fn config(&self) -> &AtlasConfig {
        &self.config
    }

    pub fn entries(&self) -> &[SourceEntry] {
        &self.entries
    }

    pub fn folders(&self) -> &[PathBuf] {
        &self.folders
    }

    /// Replaces the whole configuration after validating it.
    pub fn set_config(&mut self, config: AtlasConfig) -> Result<()> {
        config.validate()?;
        self.config = config;
        Ok(())
    }

    pub fn set_padding(&mut self, padding: u32) -> Result<()> {
        self.update_config(|c| c.padding = padding)
    }

    pub fn set_max_size(&mut self, max_size: u32) -> Result<()> {
        self.update_config(|c| c.max_size = max_size)
    }

    pub fn set_packing_strategy(&mut self, strategy: PackingStrategy) -> Result<()> {
        self.update_config(|c| c.packing_strategy = strategy)
    }

    fn update_config(&mut self, f: impl FnOnce(&mut AtlasConfig)) -> Result<()> {
        let mut cfg = self.config.clone();
        f(&mut cfg);
        self.set_config(cfg)
    }

    /// True if some entry is already backed by `source`.
    pub fn contains_source(&self, source: &SourceRef) -> bool {
        self.entries.iter().any(|e| e.source.as_ref() == Some(source))
    }

    /// Adds a manual entry. Fails with `DuplicateSource` if the source is already present,
    /// unless the configuration allows duplicates.
    pub fn add_entry(&mut self, source: SourceRef) -> Result<()> {
        if !self.config.allow_duplicate_sources && self.contains_source(&source) {
            return Err(SpritePackerError::DuplicateSource);
        }
        self.entries.push(SourceEntry::new(source, EntryOrigin::Manual));
        Ok(())
    }

    pub fn remove_entry(&mut self, index: usize) -> Option<SourceEntry> {
        (index < self.entries.len()).then(|| self.entries.remove(index))
    }

    /// Removes every entry backed by `source`; returns how many were removed.
    pub fn remove_source(&mut self, source: &SourceRef) -> usize {
        let before = self.entries.len();
        self.entries.retain(|e| e.source.as_ref() != Some(source));
        before - self.entries.len()
    }

    pub fn add_folder(&mut self, folder: impl Into<PathBuf>) -> Result<()> {
        let folder = folder.into();
        if self.folders.contains(&folder) {
            return Err(SpritePackerError::DuplicateFolder(folder));
        }
        self.folders.push(folder);
        Ok(())
    }

    pub fn remove_folder(&mut self, folder: &Path) -> bool {
        let before = self.folders.len();
        self.folders.retain(|f| f != folder);
        before != self.folders.len()
    }

    /// Takes the build lock, or fails with `BuildInProgress` if it is already held.
    pub fn try_lock_build(&self) -> Result<BuildGuard> {
        self.build_lock
            .0
            .compare_exchange(false, true, Ordering::Acquire, Ordering::Relaxed)
            .map_err(|_| SpritePackerError::BuildInProgress)?;
        Ok(BuildGuard(Arc::clone(&self.build_lock.0)))
    }

    pub fn is_building(&self) -> bool {
        self.build_lock.0.load(Ordering::Acquire)
    }

    pub(crate) fn commit_reconciliation(&mut self, entries: Vec<SourceEntry>, stale: &[PathBuf]) {
        self.entries = entries;
        self.folders.retain(|f| !stale.contains(f));
    }

    /// Sets one target per entry, in entry order.
    pub(crate) fn commit_targets(&mut self, targets: Vec<Option<SubImageRef>>) {
        for (entry, target) in self.entries.iter_mut().zip(targets) {
            entry.target = target;
        }
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Parses a registry and validates its configuration. A folder listed twice is rejected
    /// with `DuplicateFolder`.
    pub fn from_json(s: &str) -> Result<Self> {
        let reg: Self = serde_json::from_str(s)?;
        reg.config.validate()?;
        for (i, folder) in reg.folders.iter().enumerate() {
            if reg.folders[..i].contains(folder) {
                return Err(SpritePackerError::DuplicateFolder(folder.clone()));
            }
        }
        Ok(reg)
    }
}
