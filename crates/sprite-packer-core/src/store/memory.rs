use super::AssetStore;
use crate::error::{Result, SpritePackerError};
use crate::model::SpriteMetadata;
use crate::pixel::{PixelBuffer, PixelFormat};
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone)]
struct StoredImage {
    pixels: PixelBuffer,
    format: PixelFormat,
    readable: bool,
}

/// In-memory asset store. Useful for previews and for driving the pipeline in tests.
///
/// Pixels can only be loaded while an asset is readable, and failures can be injected per path.
#[derive(Debug, Clone, Default)]
pub struct MemoryAssetStore {
    images: BTreeMap<PathBuf, StoredImage>,
    directories: BTreeSet<PathBuf>,
    sheets: HashMap<PathBuf, Vec<SpriteMetadata>>,
    deny_readable: HashSet<PathBuf>,
    deny_convert: HashSet<PathBuf>,
    deny_write: HashSet<PathBuf>,
}

impl MemoryAssetStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds (or replaces) an unreadable RGBA32 image; parent directories are created.
    pub fn insert_image(&mut self, path: impl Into<PathBuf>, pixels: PixelBuffer) {
        self.insert_image_with_format(path, pixels, PixelFormat::Rgba32);
    }

    pub fn insert_image_with_format(
        &mut self,
        path: impl Into<PathBuf>,
        pixels: PixelBuffer,
        format: PixelFormat,
    ) {
        let path = path.into();
        let mut dir = path.parent();
        while let Some(d) = dir {
            if d.as_os_str().is_empty() {
                break;
            }
            self.directories.insert(d.to_path_buf());
            dir = d.parent();
        }
        self.images.insert(
            path,
            StoredImage {
                pixels,
                format,
                readable: false,
            },
        );
    }

    pub fn add_directory(&mut self, dir: impl Into<PathBuf>) {
        self.directories.insert(dir.into());
    }

    /// Deletes a directory together with every image below it.
    pub fn remove_directory(&mut self, dir: &Path) {
        self.directories.retain(|d| !d.starts_with(dir));
        self.images.retain(|p, _| !p.starts_with(dir));
    }

    pub fn remove_image(&mut self, path: &Path) {
        self.images.remove(path);
        self.sheets.remove(path);
    }

    pub fn set_sprite_sheet(&mut self, atlas: impl Into<PathBuf>, sheet: Vec<SpriteMetadata>) {
        self.sheets.insert(atlas.into(), sheet);
    }

    /// Makes `set_readable(path, true)` fail.
    pub fn deny_read_access(&mut self, path: impl Into<PathBuf>) {
        self.deny_readable.insert(path.into());
    }

    pub fn deny_conversion(&mut self, path: impl Into<PathBuf>) {
        self.deny_convert.insert(path.into());
    }

    pub fn deny_write(&mut self, path: impl Into<PathBuf>) {
        self.deny_write.insert(path.into());
    }

    pub fn is_readable(&self, path: &Path) -> bool {
        self.images.get(path).is_some_and(|i| i.readable)
    }

    pub fn contains(&self, path: &Path) -> bool {
        self.images.contains_key(path)
    }

    /// Stored pixels regardless of the readable flag.
    pub fn pixels(&self, path: &Path) -> Option<&PixelBuffer> {
        self.images.get(path).map(|i| &i.pixels)
    }

    pub fn format(&self, path: &Path) -> Option<&PixelFormat> {
        self.images.get(path).map(|i| &i.format)
    }

    pub fn sprite_sheet(&self, atlas: &Path) -> &[SpriteMetadata] {
        self.sheets.get(atlas).map(Vec::as_slice).unwrap_or(&[])
    }

    fn image(&self, path: &Path) -> Result<&StoredImage> {
        self.images
            .get(path)
            .ok_or_else(|| SpritePackerError::AssetStore(format!("no asset at {}", path.display())))
    }

    fn image_mut(&mut self, path: &Path) -> Result<&mut StoredImage> {
        self.images
            .get_mut(path)
            .ok_or_else(|| SpritePackerError::AssetStore(format!("no asset at {}", path.display())))
    }
}

impl AssetStore for MemoryAssetStore {
    fn directory_exists(&self, dir: &Path) -> bool {
        self.directories.contains(dir)
    }

    fn asset_exists(&self, image: &Path) -> bool {
        self.images.contains_key(image)
    }

    fn list_images(&self, dir: &Path) -> Result<Vec<PathBuf>> {
        if !self.directory_exists(dir) {
            return Err(SpritePackerError::StaleFolder(dir.to_path_buf()));
        }
        Ok(self
            .images
            .keys()
            .filter(|p| p.starts_with(dir))
            .cloned()
            .collect())
    }

    fn set_readable(&mut self, image: &Path, readable: bool) -> Result<()> {
        if readable && self.deny_readable.contains(image) {
            return Err(SpritePackerError::AssetStore(format!(
                "read access denied for {}",
                image.display()
            )));
        }
        self.image_mut(image)?.readable = readable;
        Ok(())
    }

    fn pixel_format(&self, image: &Path) -> Result<PixelFormat> {
        Ok(self.image(image)?.format.clone())
    }

    fn convert_format(&mut self, image: &Path, format: &PixelFormat) -> Result<()> {
        if self.deny_convert.contains(image) {
            return Err(SpritePackerError::UnsupportedFormat(image.to_path_buf()));
        }
        self.image_mut(image)?.format = format.clone();
        Ok(())
    }

    fn load_pixels(&self, image: &Path) -> Result<PixelBuffer> {
        let img = self.image(image)?;
        if !img.readable {
            return Err(SpritePackerError::UnreadableSource(image.to_path_buf()));
        }
        Ok(img.pixels.clone())
    }

    fn read_sprite_sheet(&self, atlas: &Path) -> Result<Vec<SpriteMetadata>> {
        Ok(self.sprite_sheet(atlas).to_vec())
    }

    fn write_atlas_bitmap(&mut self, atlas: &Path, pixels: &PixelBuffer) -> Result<()> {
        if self.deny_write.contains(atlas) {
            return Err(SpritePackerError::AssetStore(format!(
                "write denied for {}",
                atlas.display()
            )));
        }
        let img = self.image_mut(atlas)?;
        img.pixels = pixels.clone();
        img.format = PixelFormat::Rgba32;
        Ok(())
    }

    fn apply_sprite_sheet(&mut self, atlas: &Path, sheet: &[SpriteMetadata]) -> Result<()> {
        self.image(atlas)?;
        self.sheets.insert(atlas.to_path_buf(), sheet.to_vec());
        Ok(())
    }
}
