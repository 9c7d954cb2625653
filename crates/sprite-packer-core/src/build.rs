//! Atlas build orchestration.
//!
//! A rebuild walks a fixed sequence of stages and mutates the registry at exactly two points:
//! after reconciliation (entries and folders) and after the atlas has been written (targets).
//! A failure in between leaves the reconciled entry set committed.
use crate::error::{Result, SpritePackerError};
use crate::merge::{MergeItem, assign_names, merge};
use crate::normalize::{self, LoadedSource};
use crate::packer::atlas::pack_atlas;
use crate::pixel::{PixelBuffer, PixelFormat};
use crate::reconcile::reconcile;
use crate::registry::AtlasRegistry;
use crate::store::AssetStore;
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;
use tracing::{debug, info, instrument, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildStage {
    Idle,
    ReconcilingSources,
    NormalizingSources,
    Packing,
    MergingMetadata,
    Committing,
}

impl fmt::Display for BuildStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Idle => "idle",
            Self::ReconcilingSources => "reconciling sources",
            Self::NormalizingSources => "normalizing sources",
            Self::Packing => "packing",
            Self::MergingMetadata => "merging metadata",
            Self::Committing => "committing",
        };
        f.write_str(s)
    }
}

/// Non-fatal conditions collected during a build.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum BuildWarning {
    #[error("{} has pixel format {format:?} and could not be converted", .asset.display())]
    UnsupportedFormat { asset: PathBuf, format: PixelFormat },
    #[error("entry {index} has no pixels and was not packed")]
    MissingPixels {
        index: usize,
        asset: Option<PathBuf>,
    },
    #[error("sprite name {original:?} was taken, renamed to {renamed:?}")]
    DuplicateNameCollision { original: String, renamed: String },
    #[error("included folder {} no longer exists and was removed", .0.display())]
    StaleFolder(PathBuf),
    #[error("{} could not be made unreadable again", .0.display())]
    ReleaseFailed(PathBuf),
}

#[derive(Debug, Clone, PartialEq)]
pub struct BuildReport {
    pub sprites: usize,
    pub atlas_width: u32,
    pub atlas_height: u32,
    pub occupancy: f64,
    pub warnings: Vec<BuildWarning>,
    pub removed_stale_folders: Vec<PathBuf>,
}

#[derive(Debug)]
pub enum BuildResult {
    Success(BuildReport),
    Aborted {
        stage: BuildStage,
        reason: SpritePackerError,
    },
}

impl BuildResult {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }

    pub fn report(&self) -> Option<&BuildReport> {
        match self {
            Self::Success(r) => Some(r),
            Self::Aborted { .. } => None,
        }
    }

    pub fn into_result(self) -> Result<BuildReport> {
        match self {
            Self::Success(r) => Ok(r),
            Self::Aborted { reason, .. } => Err(reason),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReconcileReport {
    pub removed_stale_folders: Vec<PathBuf>,
    pub entries: usize,
}

#[instrument(skip_all, fields(atlas = %registry.atlas().display()))]
/// Rebuilds the atlas bitmap and sprite sheet from the registry's sources.
///
/// Never panics on store failures: every fatal error ends the build as `Aborted` with the
/// stage it happened in. A concurrent rebuild of the same registry aborts at `Idle` with
/// `BuildInProgress`.
///
/// Entries whose source asset has been deleted are packed from their previous target and keep
/// their name; the registry still records the old source. With `disable_read_write_after_pack`
/// every touched asset, the atlas included, is made unreadable once packing returns.
pub fn rebuild(registry: &mut AtlasRegistry, store: &mut dyn AssetStore) -> BuildResult {
    let _guard = match registry.try_lock_build() {
        Ok(g) => g,
        Err(reason) => {
            warn!("rebuild requested while another one is running");
            return BuildResult::Aborted {
                stage: BuildStage::Idle,
                reason,
            };
        }
    };
    let mut stage = BuildStage::Idle;
    match run_stages(registry, store, &mut stage) {
        Ok(report) => {
            info!(
                sprites = report.sprites,
                width = report.atlas_width,
                height = report.atlas_height,
                warnings = report.warnings.len(),
                "atlas rebuilt"
            );
            BuildResult::Success(report)
        }
        Err(reason) => {
            warn!(%stage, error = %reason, "rebuild aborted");
            BuildResult::Aborted { stage, reason }
        }
    }
}

fn enter(stage: &mut BuildStage, next: BuildStage) {
    debug!(from = %stage, to = %next, "stage");
    *stage = next;
}

fn run_stages(
    registry: &mut AtlasRegistry,
    store: &mut dyn AssetStore,
    stage: &mut BuildStage,
) -> Result<BuildReport> {
    let atlas = registry.atlas().to_path_buf();
    store
        .set_readable(&atlas, true)
        .map_err(|_| SpritePackerError::UnresolvableAtlasAsset(atlas.clone()))?;

    enter(stage, BuildStage::ReconcilingSources);
    let rec = reconcile(&*store, registry.folders(), registry.entries())?;
    let mut warnings: Vec<BuildWarning> = rec
        .stale_folders
        .iter()
        .cloned()
        .map(BuildWarning::StaleFolder)
        .collect();
    let removed_stale_folders = rec.stale_folders.clone();
    registry.commit_reconciliation(rec.entries, &rec.stale_folders);

    enter(stage, BuildStage::NormalizingSources);
    let config = registry.config().clone();
    let entries = normalize::resolve_sources(&*store, registry.entries());
    let assets = normalize::backing_assets(&entries);
    normalize::make_readable(store, &assets)?;
    warnings.extend(normalize::correct_formats(store, &assets));

    enter(stage, BuildStage::Packing);
    let (loaded, load_warnings) = normalize::load_sources(&*store, &entries);
    warnings.extend(load_warnings);
    let (names, name_warnings) = assign_names(&entries);
    warnings.extend(name_warnings);
    let (buffers, items): (Vec<Option<PixelBuffer>>, Vec<MergeItem>) = loaded
        .into_iter()
        .zip(&names)
        .map(|(LoadedSource { pixels, sub_image }, name)| {
            (
                pixels,
                MergeItem {
                    name: name.clone(),
                    sub_image,
                },
            )
        })
        .unzip();
    let packed = pack_atlas(&buffers, &config);
    if config.disable_read_write_after_pack {
        let mut touched = assets;
        if !touched.contains(&atlas) {
            touched.push(atlas.clone());
        }
        warnings.extend(normalize::release(store, &touched));
    }
    let packed = packed?;

    enter(stage, BuildStage::MergingMetadata);
    let prior = store.read_sprite_sheet(&atlas)?;
    let sheet = merge(&packed, &prior, &items, &config);

    enter(stage, BuildStage::Committing);
    store.write_atlas_bitmap(&atlas, &packed.pixels)?;
    store.apply_sprite_sheet(&atlas, &sheet)?;
    store.set_readable(&atlas, false)?;
    let targets = names
        .iter()
        .enumerate()
        .map(|(i, name)| {
            packed
                .rects
                .get(i)
                .copied()
                .flatten()
                .and_then(|_| store.find_sub_image_by_name(&atlas, name))
        })
        .collect();
    registry.commit_targets(targets);

    let stats = packed.stats();
    Ok(BuildReport {
        sprites: sheet.len(),
        atlas_width: stats.atlas_width,
        atlas_height: stats.atlas_height,
        occupancy: stats.occupancy,
        warnings,
        removed_stale_folders,
    })
}

#[instrument(skip_all, fields(atlas = %registry.atlas().display()))]
/// Runs folder reconciliation alone and commits its result to the registry.
pub fn reconcile_folders(
    registry: &mut AtlasRegistry,
    store: &dyn AssetStore,
) -> Result<ReconcileReport> {
    let _guard = registry.try_lock_build()?;
    let rec = reconcile(store, registry.folders(), registry.entries())?;
    registry.commit_reconciliation(rec.entries, &rec.stale_folders);
    info!(
        entries = registry.entries().len(),
        stale = rec.stale_folders.len(),
        "folders reconciled"
    );
    Ok(ReconcileReport {
        removed_stale_folders: rec.stale_folders,
        entries: registry.entries().len(),
    })
}
