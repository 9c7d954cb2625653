use crate::build::BuildWarning;
use crate::config::AtlasConfig;
use crate::model::{Border, SourceEntry, SpriteAlignment, SpriteMetadata, SubImage};
use crate::packer::atlas::PackedAtlas;
use std::collections::{HashMap, HashSet};
use tracing::{debug, instrument, warn};

/// One packer input as the merge engine sees it.
#[derive(Debug, Clone, PartialEq)]
pub struct MergeItem {
    pub name: String,
    /// Sheet record of the source when it was a sub-image of another atlas.
    pub sub_image: Option<SubImage>,
}

#[instrument(skip_all, fields(items = items.len(), prior = prior.len()))]
/// Turns packer output into the atlas sprite sheet.
///
/// Rects come from `packed`; everything else is taken, in order of preference, from the prior
/// record with the same name, from the source sub-image, or from the configured defaults.
/// Items the packer did not place produce no record.
pub fn merge(
    packed: &PackedAtlas,
    prior: &[SpriteMetadata],
    items: &[MergeItem],
    config: &AtlasConfig,
) -> Vec<SpriteMetadata> {
    let mut prior_by_name: HashMap<&str, &SpriteMetadata> = HashMap::with_capacity(prior.len());
    for meta in prior {
        prior_by_name.entry(meta.name.as_str()).or_insert(meta);
    }
    let (width, height) = (packed.width(), packed.height());

    let mut sheet = Vec::with_capacity(items.len());
    for (index, item) in items.iter().enumerate() {
        let Some(norm) = packed.rects.get(index).copied().flatten() else {
            continue;
        };
        let rect = norm.to_pixels(width, height);
        let meta = if let Some(prev) = prior_by_name.get(item.name.as_str()) {
            SpriteMetadata {
                name: item.name.clone(),
                rect,
                ..(*prev).clone()
            }
        } else if let Some(sub) = &item.sub_image {
            SpriteMetadata {
                name: item.name.clone(),
                rect,
                border: sub.meta.border,
                alignment: SpriteAlignment::Custom,
                pivot: sub.meta.bounds().derived_pivot(),
            }
        } else {
            SpriteMetadata {
                name: item.name.clone(),
                rect,
                border: Border::ZERO,
                alignment: config.default_alignment,
                pivot: config.default_pivot(),
            }
        };
        sheet.push(meta);
    }
    debug!(records = sheet.len(), "sprite sheet merged");
    sheet
}

/// Gives every entry a unique sprite name.
///
/// The entry's own name is used when it has one, otherwise `sprite_<index>`. A name already
/// taken by an earlier entry gets `_<index>` appended until it is unique, and the rename is
/// reported as a `DuplicateNameCollision` warning.
pub fn assign_names(entries: &[SourceEntry]) -> (Vec<String>, Vec<BuildWarning>) {
    let mut used: HashSet<String> = HashSet::with_capacity(entries.len());
    let mut names = Vec::with_capacity(entries.len());
    let mut warnings = Vec::new();

    for (index, entry) in entries.iter().enumerate() {
        let base = entry.name().unwrap_or_else(|| format!("sprite_{index}"));
        let mut name = base.clone();
        while used.contains(&name) {
            name = format!("{name}_{index}");
        }
        if name != base {
            warn!(original = %base, renamed = %name, "sprite name collision");
            warnings.push(BuildWarning::DuplicateNameCollision {
                original: base,
                renamed: name.clone(),
            });
        }
        used.insert(name.clone());
        names.push(name);
    }
    (names, warnings)
}
