use globset::{Glob, GlobSet, GlobSetBuilder};
use image::{ColorType, ImageDecoder, ImageReader};
use serde::{Deserialize, Serialize};
use sprite_packer_core::error::{Result, SpritePackerError};
use sprite_packer_core::model::SpriteMetadata;
use sprite_packer_core::pixel::{PixelBuffer, PixelFormat};
use sprite_packer_core::store::AssetStore;
use std::collections::HashMap;
use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;
use walkdir::WalkDir;

/// Asset store over a directory tree.
///
/// Asset paths are relative to `root` (absolute paths are used as is). Readability and
/// converted formats only live for the lifetime of the store; sprite sheets are written next to
/// their atlas as `<atlas>.sprites.json`.
#[derive(Debug, Clone)]
pub struct FsAssetStore {
    root: PathBuf,
    exclude: Option<GlobSet>,
    readable: HashMap<PathBuf, bool>,
    formats: HashMap<PathBuf, PixelFormat>,
}

/// On-disk layout of a sprite sheet file.
#[derive(Debug, Serialize, Deserialize)]
struct SheetFile {
    image: String,
    sprites: Vec<SpriteMetadata>,
}

impl FsAssetStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            exclude: None,
            readable: HashMap::new(),
            formats: HashMap::new(),
        }
    }

    /// Skips files matching any of `patterns` (glob, matched against the `/`-separated path
    /// relative to the root) when listing folders.
    pub fn with_exclude(mut self, patterns: &[String]) -> Result<Self> {
        if patterns.is_empty() {
            self.exclude = None;
            return Ok(self);
        }
        let mut b = GlobSetBuilder::new();
        for pat in patterns {
            let glob = Glob::new(pat)
                .map_err(|e| SpritePackerError::InvalidConfig(format!("exclude {pat:?}: {e}")))?;
            b.add(glob);
        }
        self.exclude = Some(
            b.build()
                .map_err(|e| SpritePackerError::InvalidConfig(e.to_string()))?,
        );
        Ok(self)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn resolve(&self, p: &Path) -> PathBuf {
        if p.is_absolute() {
            p.to_path_buf()
        } else {
            self.root.join(p)
        }
    }

    fn relative(&self, p: &Path) -> PathBuf {
        p.strip_prefix(&self.root)
            .map(Path::to_path_buf)
            .unwrap_or_else(|_| p.to_path_buf())
    }

    fn require_file(&self, p: &Path) -> Result<PathBuf> {
        let full = self.resolve(p);
        if full.is_file() {
            Ok(full)
        } else {
            Err(SpritePackerError::AssetStore(format!(
                "no asset at {}",
                full.display()
            )))
        }
    }

    fn is_excluded(&self, rel: &Path) -> bool {
        let s = rel.to_string_lossy().replace('\\', "/");
        self.exclude.as_ref().is_some_and(|ex| ex.is_match(&s))
    }

    /// Path of the sprite sheet file that belongs to `atlas`.
    pub fn sheet_path(&self, atlas: &Path) -> PathBuf {
        let mut s: OsString = self.resolve(atlas).into_os_string();
        s.push(".sprites.json");
        PathBuf::from(s)
    }
}

pub fn is_image(p: &Path) -> bool {
    matches!(
        p.extension()
            .and_then(|e| e.to_str())
            .map(|s| s.to_ascii_lowercase()),
        Some(ext) if matches!(ext.as_str(), "png" | "jpg" | "jpeg" | "bmp" | "tga" | "gif")
    )
}

fn format_of(color: ColorType) -> PixelFormat {
    match color {
        ColorType::Rgba8 => PixelFormat::Rgba32,
        ColorType::Rgb8 => PixelFormat::Rgb24,
        other => PixelFormat::Other(format!("{other:?}").to_ascii_lowercase()),
    }
}

impl AssetStore for FsAssetStore {
    fn directory_exists(&self, dir: &Path) -> bool {
        self.resolve(dir).is_dir()
    }

    fn asset_exists(&self, image: &Path) -> bool {
        self.resolve(image).is_file()
    }

    fn list_images(&self, dir: &Path) -> Result<Vec<PathBuf>> {
        let full = self.resolve(dir);
        if !full.is_dir() {
            return Err(SpritePackerError::StaleFolder(dir.to_path_buf()));
        }
        let mut list = Vec::new();
        for entry in WalkDir::new(&full)
            .sort_by_file_name()
            .into_iter()
            .filter_map(|e| e.ok())
        {
            let p = entry.path();
            if !p.is_file() || !is_image(p) {
                continue;
            }
            let rel = self.relative(p);
            if self.is_excluded(&rel) {
                debug!(path = %rel.display(), "excluded");
                continue;
            }
            list.push(rel);
        }
        Ok(list)
    }

    fn set_readable(&mut self, image: &Path, readable: bool) -> Result<()> {
        self.require_file(image)?;
        self.readable.insert(image.to_path_buf(), readable);
        Ok(())
    }

    fn pixel_format(&self, image: &Path) -> Result<PixelFormat> {
        if let Some(f) = self.formats.get(image) {
            return Ok(f.clone());
        }
        let full = self.require_file(image)?;
        let decoder = ImageReader::open(&full)?
            .with_guessed_format()?
            .into_decoder()?;
        Ok(format_of(decoder.color_type()))
    }

    fn convert_format(&mut self, image: &Path, format: &PixelFormat) -> Result<()> {
        self.require_file(image)?;
        // decoding always yields RGBA8, so conversion only needs to be remembered
        self.formats.insert(image.to_path_buf(), format.clone());
        Ok(())
    }

    fn load_pixels(&self, image: &Path) -> Result<PixelBuffer> {
        if !self.readable.get(image).copied().unwrap_or(false) {
            return Err(SpritePackerError::UnreadableSource(image.to_path_buf()));
        }
        let full = self.require_file(image)?;
        let img = ImageReader::open(&full)?.with_guessed_format()?.decode()?;
        Ok(PixelBuffer::from_image(&img))
    }

    fn read_sprite_sheet(&self, atlas: &Path) -> Result<Vec<SpriteMetadata>> {
        let path = self.sheet_path(atlas);
        if !path.is_file() {
            return Ok(Vec::new());
        }
        let sheet: SheetFile = serde_json::from_str(&fs::read_to_string(&path)?)?;
        Ok(sheet.sprites)
    }

    fn write_atlas_bitmap(&mut self, atlas: &Path, pixels: &PixelBuffer) -> Result<()> {
        let full = self.resolve(atlas);
        if let Some(dir) = full.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir)?;
        }
        pixels.as_rgba().save(&full)?;
        self.formats.remove(atlas);
        debug!(path = %full.display(), w = pixels.width(), h = pixels.height(), "atlas bitmap written");
        Ok(())
    }

    fn apply_sprite_sheet(&mut self, atlas: &Path, sheet: &[SpriteMetadata]) -> Result<()> {
        let file = SheetFile {
            image: atlas
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default(),
            sprites: sheet.to_vec(),
        };
        let path = self.sheet_path(atlas);
        fs::write(&path, serde_json::to_string_pretty(&file)?)?;
        debug!(path = %path.display(), sprites = sheet.len(), "sprite sheet written");
        Ok(())
    }
}
