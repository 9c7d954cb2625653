//! The asset store collaborator: everything the pipeline needs from the asset database.
use crate::error::Result;
use crate::model::{SpriteMetadata, SubImage, SubImageRef};
use crate::pixel::{PixelBuffer, PixelFormat};
use std::path::{Path, PathBuf};

pub mod memory;

pub use memory::MemoryAssetStore;

/// Backing store for image assets and atlas sprite sheets.
///
/// All calls are blocking. Paths are asset identities; two equal paths are the same asset.
pub trait AssetStore {
    fn directory_exists(&self, dir: &Path) -> bool;

    /// Whether an image asset is present at `image`.
    fn asset_exists(&self, image: &Path) -> bool;

    /// Image assets under `dir`, recursively. Non-image and metadata files are excluded.
    fn list_images(&self, dir: &Path) -> Result<Vec<PathBuf>>;

    /// Allows or forbids reading the asset's pixels.
    fn set_readable(&mut self, image: &Path, readable: bool) -> Result<()>;

    fn pixel_format(&self, image: &Path) -> Result<PixelFormat>;

    fn convert_format(&mut self, image: &Path, format: &PixelFormat) -> Result<()>;

    /// Decoded RGBA pixels of a readable asset.
    fn load_pixels(&self, image: &Path) -> Result<PixelBuffer>;

    /// Sheet record of a sub-image, `None` if the atlas has no sub-image by that name.
    fn load_sub_image(&self, sub: &SubImageRef) -> Result<Option<SubImage>> {
        Ok(self
            .read_sprite_sheet(&sub.atlas)?
            .into_iter()
            .find(|m| m.name == sub.name)
            .map(|meta| SubImage {
                atlas: sub.atlas.clone(),
                meta,
            }))
    }

    /// Current sprite sheet of an atlas (empty if it has none yet).
    fn read_sprite_sheet(&self, atlas: &Path) -> Result<Vec<SpriteMetadata>>;

    fn write_atlas_bitmap(&mut self, atlas: &Path, pixels: &PixelBuffer) -> Result<()>;

    /// Replaces the atlas's sprite sheet.
    fn apply_sprite_sheet(&mut self, atlas: &Path, sheet: &[SpriteMetadata]) -> Result<()>;

    fn find_sub_image_by_name(&self, atlas: &Path, name: &str) -> Option<SubImageRef> {
        self.read_sprite_sheet(atlas)
            .ok()?
            .iter()
            .any(|m| m.name == name)
            .then(|| SubImageRef::new(atlas, name))
    }
}
