use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Axis-aligned rectangle (pixels). `x,y` is top-left; `w,h` are sizes.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct Rect {
    pub x: u32,
    pub y: u32,
    pub w: u32,
    pub h: u32,
}

impl Rect {
    pub fn new(x: u32, y: u32, w: u32, h: u32) -> Self {
        Self { x, y, w, h }
    }
    /// Exclusive right edge (`x + w`).
    pub fn right(&self) -> u32 {
        self.x + self.w
    }
    /// Exclusive bottom edge (`y + h`).
    pub fn bottom(&self) -> u32 {
        self.y + self.h
    }
    pub fn area(&self) -> u64 {
        self.w as u64 * self.h as u64
    }
    /// Returns true if `r` is fully inside `self`.
    pub fn contains(&self, r: &Rect) -> bool {
        r.x >= self.x && r.y >= self.y && r.right() <= self.right() && r.bottom() <= self.bottom()
    }
    pub fn intersects(&self, r: &Rect) -> bool {
        !(self.x >= r.right() || r.x >= self.right() || self.y >= r.bottom() || r.y >= self.bottom())
    }
}

/// A rectangle placed by a bin packer.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Frame<K = usize> {
    /// Caller key (the input index for atlas packing).
    pub key: K,
    /// Content rectangle within the bin, padding excluded.
    pub frame: Rect,
}

/// Rectangle in `[0, 1]` coordinates relative to the atlas it belongs to.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Default)]
pub struct NormRect {
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
}

impl NormRect {
    pub fn from_pixels(r: &Rect, atlas_w: u32, atlas_h: u32) -> Self {
        let (aw, ah) = (atlas_w.max(1) as f32, atlas_h.max(1) as f32);
        Self {
            x: r.x as f32 / aw,
            y: r.y as f32 / ah,
            w: r.w as f32 / aw,
            h: r.h as f32 / ah,
        }
    }

    /// Scales back to pixel space, rounding to the nearest pixel.
    pub fn to_pixels(&self, atlas_w: u32, atlas_h: u32) -> Rect {
        let (aw, ah) = (atlas_w as f32, atlas_h as f32);
        Rect::new(
            (self.x * aw).round() as u32,
            (self.y * ah).round() as u32,
            (self.w * aw).round() as u32,
            (self.h * ah).round() as u32,
        )
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Default)]
pub struct Vec2 {
    pub x: f32,
    pub y: f32,
}

impl Vec2 {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
    pub const CENTER: Vec2 = Vec2::new(0.5, 0.5);

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

/// Nine-slice insets in pixels.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Default)]
pub struct Border {
    pub left: f32,
    pub bottom: f32,
    pub right: f32,
    pub top: f32,
}

impl Border {
    pub const ZERO: Border = Border::uniform(0.0);

    pub const fn uniform(v: f32) -> Self {
        Self {
            left: v,
            bottom: v,
            right: v,
            top: v,
        }
    }

    pub fn is_zero(&self) -> bool {
        *self == Self::ZERO
    }
}

/// Anchor of a sprite. Every variant except `Custom` implies a fixed pivot.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum SpriteAlignment {
    #[default]
    Center,
    TopLeft,
    TopCenter,
    TopRight,
    LeftCenter,
    RightCenter,
    BottomLeft,
    BottomCenter,
    BottomRight,
    Custom,
}

impl SpriteAlignment {
    /// Normalized pivot implied by the alignment ((0,0) is top-left). `None` for `Custom`.
    pub fn pivot(&self) -> Option<Vec2> {
        let p = match self {
            Self::Center => Vec2::new(0.5, 0.5),
            Self::TopLeft => Vec2::new(0.0, 0.0),
            Self::TopCenter => Vec2::new(0.5, 0.0),
            Self::TopRight => Vec2::new(1.0, 0.0),
            Self::LeftCenter => Vec2::new(0.0, 0.5),
            Self::RightCenter => Vec2::new(1.0, 0.5),
            Self::BottomLeft => Vec2::new(0.0, 1.0),
            Self::BottomCenter => Vec2::new(0.5, 1.0),
            Self::BottomRight => Vec2::new(1.0, 1.0),
            Self::Custom => return None,
        };
        Some(p)
    }
}

impl FromStr for SpriteAlignment {
    type Err = ();
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().replace('-', "_").as_str() {
            "center" => Ok(Self::Center),
            "top_left" => Ok(Self::TopLeft),
            "top_center" => Ok(Self::TopCenter),
            "top_right" => Ok(Self::TopRight),
            "left_center" => Ok(Self::LeftCenter),
            "right_center" => Ok(Self::RightCenter),
            "bottom_left" => Ok(Self::BottomLeft),
            "bottom_center" => Ok(Self::BottomCenter),
            "bottom_right" => Ok(Self::BottomRight),
            "custom" => Ok(Self::Custom),
            _ => Err(()),
        }
    }
}

/// One named sub-image of an atlas, as stored in the atlas's sprite sheet.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SpriteMetadata {
    pub name: String,
    /// Pixel rectangle inside the atlas bitmap.
    pub rect: Rect,
    #[serde(default)]
    pub border: Border,
    #[serde(default)]
    pub alignment: SpriteAlignment,
    #[serde(default = "default_pivot")]
    pub pivot: Vec2,
}

fn default_pivot() -> Vec2 {
    Vec2::CENTER
}

impl SpriteMetadata {
    /// Pivot actually used when rendering: the alignment's pivot, or `pivot` for `Custom`.
    pub fn effective_pivot(&self) -> Vec2 {
        self.alignment.pivot().unwrap_or(self.pivot)
    }

    /// Geometric bounds of the sprite relative to its pivot.
    pub fn bounds(&self) -> SpriteBounds {
        let p = self.effective_pivot();
        let (w, h) = (self.rect.w as f32, self.rect.h as f32);
        SpriteBounds {
            center: Vec2::new((0.5 - p.x) * w, (0.5 - p.y) * h),
            extents: Vec2::new(w / 2.0, h / 2.0),
        }
    }
}

/// Sprite bounds in pixels, centred relative to the pivot.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpriteBounds {
    pub center: Vec2,
    pub extents: Vec2,
}

impl SpriteBounds {
    /// Recovers a normalized pivot: `0.5 - center / extent / 2` per axis.
    /// A zero extent maps to the middle on that axis.
    pub fn derived_pivot(&self) -> Vec2 {
        fn axis(c: f32, e: f32) -> f32 {
            if e == 0.0 { 0.5 } else { 0.5 - c / e / 2.0 }
        }
        Vec2::new(
            axis(self.center.x, self.extents.x),
            axis(self.center.y, self.extents.y),
        )
    }
}

/// Reference to a named sub-image inside an atlas asset.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct SubImageRef {
    pub atlas: PathBuf,
    pub name: String,
}

impl SubImageRef {
    pub fn new(atlas: impl Into<PathBuf>, name: impl Into<String>) -> Self {
        Self {
            atlas: atlas.into(),
            name: name.into(),
        }
    }
}

/// A resolved sub-image: where it lives and its sheet record.
#[derive(Debug, Clone, PartialEq)]
pub struct SubImage {
    pub atlas: PathBuf,
    pub meta: SpriteMetadata,
}

/// What a source entry points at. Exactly one kind by construction.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum SourceRef {
    /// A whole image asset.
    Texture(PathBuf),
    /// A sub-image of another atlas.
    SubImage(SubImageRef),
}

impl SourceRef {
    /// Image asset holding the pixels of this source.
    pub fn backing_asset(&self) -> &Path {
        match self {
            Self::Texture(p) => p,
            Self::SubImage(r) => &r.atlas,
        }
    }

    /// Identity name: the file stem of a texture or the sub-image name.
    pub fn name(&self) -> Option<String> {
        match self {
            Self::Texture(p) => p
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .filter(|s| !s.is_empty()),
            Self::SubImage(r) => Some(r.name.clone()).filter(|s| !s.is_empty()),
        }
    }
}

/// How an entry got into the registry.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum EntryOrigin {
    /// Added by hand; reconciliation never touches it.
    #[default]
    Manual,
    /// Discovered inside an included folder; replaced on every reconciliation.
    FolderWatched,
}

/// A source image declared for the atlas and the sub-image it currently occupies.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct SourceEntry {
    pub source: Option<SourceRef>,
    pub target: Option<SubImageRef>,
    #[serde(default)]
    pub origin: EntryOrigin,
}

impl SourceEntry {
    pub fn new(source: SourceRef, origin: EntryOrigin) -> Self {
        Self {
            source: Some(source),
            target: None,
            origin,
        }
    }

    /// Stable name: the target's name if packed before, else the source's name.
    pub fn name(&self) -> Option<String> {
        if let Some(t) = &self.target {
            if !t.name.is_empty() {
                return Some(t.name.clone());
            }
        }
        self.source.as_ref().and_then(SourceRef::name)
    }

    /// Image asset the entry's pixels come from: the source's, or the target atlas when the
    /// source is gone.
    pub fn backing_asset(&self) -> Option<&Path> {
        match (&self.source, &self.target) {
            (Some(s), _) => Some(s.backing_asset()),
            (None, Some(t)) => Some(&t.atlas),
            (None, None) => None,
        }
    }
}

/// Packing statistics for one atlas.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct PackStats {
    pub num_frames: usize,
    pub atlas_width: u32,
    pub atlas_height: u32,
    /// Sum of placed rect areas (unpadded).
    pub used_area: u64,
    /// used_area / (atlas_width * atlas_height).
    pub occupancy: f64,
}

impl PackStats {
    pub fn summary(&self) -> String {
        format!(
            "Frames: {}, Atlas: {}x{}, Occupancy: {:.2}%, Used Area: {} px²",
            self.num_frames,
            self.atlas_width,
            self.atlas_height,
            self.occupancy * 100.0,
            self.used_area,
        )
    }
}
