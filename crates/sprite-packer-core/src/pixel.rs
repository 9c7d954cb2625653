use crate::error::{Result, SpritePackerError};
use crate::model::Rect;
use image::{DynamicImage, RgbaImage};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// In-memory RGBA8 bitmap, top-left origin.
#[derive(Debug, Clone, PartialEq)]
pub struct PixelBuffer {
    rgba: RgbaImage,
}

impl PixelBuffer {
    /// Fully transparent buffer.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            rgba: RgbaImage::new(width, height),
        }
    }

    pub fn from_rgba(rgba: RgbaImage) -> Self {
        Self { rgba }
    }

    pub fn from_image(image: &DynamicImage) -> Self {
        Self {
            rgba: image.to_rgba8(),
        }
    }

    /// Builds a buffer filled with a single color.
    pub fn filled(width: u32, height: u32, color: [u8; 4]) -> Self {
        Self {
            rgba: RgbaImage::from_pixel(width, height, image::Rgba(color)),
        }
    }

    pub fn width(&self) -> u32 {
        self.rgba.width()
    }

    pub fn height(&self) -> u32 {
        self.rgba.height()
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.rgba.dimensions()
    }

    pub fn area(&self) -> u64 {
        self.width() as u64 * self.height() as u64
    }

    pub fn pixel(&self, x: u32, y: u32) -> [u8; 4] {
        self.rgba.get_pixel(x, y).0
    }

    pub fn as_rgba(&self) -> &RgbaImage {
        &self.rgba
    }

    pub fn into_rgba(self) -> RgbaImage {
        self.rgba
    }

    /// Copies `rect` out into a new buffer. Fails if `rect` leaves the bitmap.
    pub fn crop(&self, rect: &Rect) -> Result<PixelBuffer> {
        let bounds = Rect::new(0, 0, self.width(), self.height());
        if !bounds.contains(rect) {
            return Err(SpritePackerError::AssetStore(format!(
                "sub-rect {}x{}+{}+{} outside a {}x{} bitmap",
                rect.w,
                rect.h,
                rect.x,
                rect.y,
                self.width(),
                self.height()
            )));
        }
        let mut out = PixelBuffer::new(rect.w, rect.h);
        crate::compositing::blit_rgba(&self.rgba, &mut out.rgba, 0, 0, rect);
        Ok(out)
    }

    /// Copies the whole of `src` so its top-left lands on `(dx, dy)`; clipped to this buffer.
    pub fn blit(&mut self, src: &PixelBuffer, dx: u32, dy: u32) {
        let whole = Rect::new(0, 0, src.width(), src.height());
        crate::compositing::blit_rgba(&src.rgba, &mut self.rgba, dx, dy, &whole);
    }
}

/// Storage format of an image asset, as reported by the asset store.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PixelFormat {
    Rgba32,
    Argb32,
    Bgra32,
    Rgb24,
    Alpha8,
    Dxt1,
    Dxt5,
    /// Anything else (16-bit, float, other block compressions, ...).
    Other(String),
}

impl PixelFormat {
    /// Canonical format sources are converted to when they are not packable.
    pub const CANONICAL: PixelFormat = PixelFormat::Rgba32;

    /// Formats the packer can read pixels from directly.
    pub fn is_packable(&self) -> bool {
        !matches!(self, Self::Other(_))
    }
}

impl FromStr for PixelFormat {
    type Err = ();
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(match s.to_ascii_lowercase().as_str() {
            "rgba32" => Self::Rgba32,
            "argb32" => Self::Argb32,
            "bgra32" => Self::Bgra32,
            "rgb24" => Self::Rgb24,
            "alpha8" => Self::Alpha8,
            "dxt1" => Self::Dxt1,
            "dxt5" => Self::Dxt5,
            "" => return Err(()),
            other => Self::Other(other.to_string()),
        })
    }
}
