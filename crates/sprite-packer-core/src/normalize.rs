//! Gets source assets into a state the packer can read from.
use crate::build::BuildWarning;
use crate::error::{Result, SpritePackerError};
use crate::model::{SourceEntry, SourceRef, SubImage};
use crate::pixel::{PixelBuffer, PixelFormat};
use crate::store::AssetStore;
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use tracing::{debug, instrument, warn};

/// Copies of `entries` with sources that no longer exist in the store cleared, so their pixels
/// come from the previous target instead.
///
/// A texture is gone when its asset is; a sub-image when its atlas is or when the atlas sheet
/// no longer has a record by that name.
pub fn resolve_sources(store: &dyn AssetStore, entries: &[SourceEntry]) -> Vec<SourceEntry> {
    entries
        .iter()
        .enumerate()
        .map(|(index, entry)| {
            let mut entry = entry.clone();
            let gone = match &entry.source {
                Some(SourceRef::Texture(path)) => !store.asset_exists(path),
                Some(SourceRef::SubImage(r)) => {
                    !store.asset_exists(&r.atlas) || matches!(store.load_sub_image(r), Ok(None))
                }
                None => false,
            };
            if gone {
                debug!(index, has_target = entry.target.is_some(), "source asset is gone");
                entry.source = None;
            }
            entry
        })
        .collect()
}

/// De-duplicated image assets behind `entries`, in first-seen order.
pub fn backing_assets(entries: &[SourceEntry]) -> Vec<PathBuf> {
    let mut seen = HashSet::new();
    entries
        .iter()
        .filter_map(SourceEntry::backing_asset)
        .filter(|p| seen.insert(*p))
        .map(Path::to_path_buf)
        .collect()
}

#[instrument(skip_all, fields(assets = assets.len()))]
/// Marks every asset readable. All assets are attempted; the first failure is returned.
pub fn make_readable(store: &mut dyn AssetStore, assets: &[PathBuf]) -> Result<()> {
    let mut first_failure = None;
    for asset in assets {
        if let Err(e) = store.set_readable(asset, true) {
            warn!(asset = %asset.display(), error = %e, "could not make source readable");
            first_failure.get_or_insert_with(|| asset.clone());
        }
    }
    match first_failure {
        Some(path) => Err(SpritePackerError::UnreadableSource(path)),
        None => Ok(()),
    }
}

#[instrument(skip_all, fields(assets = assets.len()))]
/// Converts assets whose pixel format the packer cannot read to RGBA32.
/// Failures are reported as warnings and the asset is packed as is.
pub fn correct_formats(store: &mut dyn AssetStore, assets: &[PathBuf]) -> Vec<BuildWarning> {
    let mut warnings = Vec::new();
    for asset in assets {
        let format = match store.pixel_format(asset) {
            Ok(f) => f,
            Err(e) => {
                warn!(asset = %asset.display(), error = %e, "could not query pixel format");
                continue;
            }
        };
        if format.is_packable() {
            continue;
        }
        debug!(asset = %asset.display(), ?format, "converting to rgba32");
        if let Err(e) = store.convert_format(asset, &PixelFormat::CANONICAL) {
            warn!(asset = %asset.display(), error = %e, "format conversion failed");
            warnings.push(BuildWarning::UnsupportedFormat {
                asset: asset.clone(),
                format,
            });
        }
    }
    warnings
}

/// Marks every asset unreadable again. Failures become `ReleaseFailed` warnings.
pub fn release(store: &mut dyn AssetStore, assets: &[PathBuf]) -> Vec<BuildWarning> {
    assets
        .iter()
        .filter_map(|asset| match store.set_readable(asset, false) {
            Ok(()) => None,
            Err(e) => {
                warn!(asset = %asset.display(), error = %e, "could not release source");
                Some(BuildWarning::ReleaseFailed(asset.clone()))
            }
        })
        .collect()
}

/// Pixels of one entry plus the sheet record when it came from a sub-image.
#[derive(Debug, Clone, Default)]
pub struct LoadedSource {
    pub pixels: Option<PixelBuffer>,
    pub sub_image: Option<SubImage>,
}

#[instrument(skip_all, fields(entries = entries.len()))]
/// Loads the pixels of every entry, in entry order.
///
/// A texture is loaded whole, a sub-image is cropped out of its atlas, and an entry whose
/// source is gone is cropped out of its previous target. Entries that yield nothing get
/// `pixels: None` and a `MissingPixels` warning.
pub fn load_sources(
    store: &dyn AssetStore,
    entries: &[SourceEntry],
) -> (Vec<LoadedSource>, Vec<BuildWarning>) {
    let mut atlases: HashMap<PathBuf, PixelBuffer> = HashMap::new();
    let mut warnings = Vec::new();
    let mut loaded = Vec::with_capacity(entries.len());

    for (index, entry) in entries.iter().enumerate() {
        let result = match (&entry.source, &entry.target) {
            (Some(SourceRef::Texture(path)), _) => store.load_pixels(path).map(|p| LoadedSource {
                pixels: Some(p),
                sub_image: None,
            }),
            (Some(SourceRef::SubImage(r)), _) => store.load_sub_image(r).and_then(|sub| {
                let Some(sub) = sub else {
                    return Ok(LoadedSource::default());
                };
                let pixels = crop_from(store, &mut atlases, &sub)?;
                Ok(LoadedSource {
                    pixels: Some(pixels),
                    sub_image: Some(sub),
                })
            }),
            (None, Some(t)) => store.load_sub_image(t).and_then(|sub| match sub {
                Some(sub) => Ok(LoadedSource {
                    pixels: Some(crop_from(store, &mut atlases, &sub)?),
                    sub_image: None,
                }),
                None => Ok(LoadedSource::default()),
            }),
            (None, None) => Ok(LoadedSource::default()),
        };
        let source = result.unwrap_or_else(|e| {
            warn!(index, error = %e, "could not load source pixels");
            LoadedSource::default()
        });
        if source.pixels.is_none() {
            warnings.push(BuildWarning::MissingPixels {
                index,
                asset: entry.backing_asset().map(Path::to_path_buf),
            });
        }
        loaded.push(source);
    }
    (loaded, warnings)
}

fn crop_from(
    store: &dyn AssetStore,
    atlases: &mut HashMap<PathBuf, PixelBuffer>,
    sub: &SubImage,
) -> Result<PixelBuffer> {
    if !atlases.contains_key(&sub.atlas) {
        let pixels = store.load_pixels(&sub.atlas)?;
        atlases.insert(sub.atlas.clone(), pixels);
    }
    match atlases.get(&sub.atlas) {
        Some(atlas) => atlas.crop(&sub.meta.rect),
        None => Err(SpritePackerError::UnreadableSource(sub.atlas.clone())),
    }
}
