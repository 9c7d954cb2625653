//! Atlas build configuration.
//! Key notes:
//!   - `packing_strategy` selects the rectangle packer at build time (both are always available)
//!   - `disable_read_write_after_pack` and `allow_duplicate_sources` are per-atlas settings,
//!     not process-wide preferences
use crate::model::{SpriteAlignment, Vec2};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Rectangle packing algorithms.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum PackingStrategy {
    /// Maximal-free-rectangles bin packing, inputs sorted by descending area.
    #[default]
    MaxRects,
    /// Skyline bottom-left packing in input order.
    NativePacker,
}

impl FromStr for PackingStrategy {
    type Err = ();
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "maxrects" | "max_rects" => Ok(Self::MaxRects),
            "native" | "nativepacker" | "native_packer" | "skyline" => Ok(Self::NativePacker),
            _ => Err(()),
        }
    }
}

/// MaxRects placement heuristics.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum MaxRectsHeuristic {
    #[default]
    BestAreaFit,
    BestShortSideFit,
    BottomLeft,
}

impl FromStr for MaxRectsHeuristic {
    type Err = ();
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "baf" | "bestareafit" => Ok(Self::BestAreaFit),
            "bssf" | "bestshortsidefit" => Ok(Self::BestShortSideFit),
            "bl" | "bottomleft" => Ok(Self::BottomLeft),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AtlasConfig {
    /// Minimum pixel gap between packed sprites.
    #[serde(default = "default_padding")]
    pub padding: u32,
    /// Upper bound for atlas width and height.
    #[serde(default = "default_max_size")]
    pub max_size: u32,
    #[serde(default)]
    pub packing_strategy: PackingStrategy,
    #[serde(default)]
    pub max_rects_heuristic: MaxRectsHeuristic,

    /// Alignment given to sprites packed for the first time from a plain texture.
    #[serde(default)]
    pub default_alignment: SpriteAlignment,
    /// Pivot used with `default_alignment == Custom`.
    #[serde(default = "default_custom_pivot")]
    pub default_custom_pivot: Vec2,

    /// Mark every source asset unreadable again once packing has run.
    #[serde(default)]
    pub disable_read_write_after_pack: bool,
    /// Allow several manual entries backed by the same source.
    #[serde(default)]
    pub allow_duplicate_sources: bool,
}

impl Default for AtlasConfig {
    fn default() -> Self {
        Self {
            padding: default_padding(),
            max_size: default_max_size(),
            packing_strategy: PackingStrategy::default(),
            max_rects_heuristic: MaxRectsHeuristic::default(),
            default_alignment: SpriteAlignment::default(),
            default_custom_pivot: default_custom_pivot(),
            disable_read_write_after_pack: false,
            allow_duplicate_sources: false,
        }
    }
}

impl AtlasConfig {
    /// Validates the configuration parameters.
    ///
    /// Returns an error if:
    /// - `max_size` is zero
    /// - padding on both sides would leave no usable space
    /// - the default pivot is not finite
    pub fn validate(&self) -> crate::error::Result<()> {
        use crate::error::SpritePackerError;

        if self.max_size == 0 {
            return Err(SpritePackerError::InvalidConfig(
                "max_size must be greater than zero".into(),
            ));
        }
        if self.padding.saturating_mul(2) >= self.max_size {
            return Err(SpritePackerError::InvalidConfig(format!(
                "padding ({}) * 2 leaves no room in a {}x{} atlas",
                self.padding, self.max_size, self.max_size
            )));
        }
        if !self.default_custom_pivot.is_finite() {
            return Err(SpritePackerError::InvalidConfig(format!(
                "default_custom_pivot must be finite, got ({}, {})",
                self.default_custom_pivot.x, self.default_custom_pivot.y
            )));
        }
        Ok(())
    }

    /// Pivot assigned together with `default_alignment`.
    pub fn default_pivot(&self) -> Vec2 {
        self.default_custom_pivot
    }

    /// Create a fluent builder for `AtlasConfig`.
    pub fn builder() -> AtlasConfigBuilder {
        AtlasConfigBuilder::new()
    }
}

fn default_padding() -> u32 {
    1
}
fn default_max_size() -> u32 {
    4096
}
fn default_custom_pivot() -> Vec2 {
    Vec2::CENTER
}

/// Builder for `AtlasConfig` for ergonomic construction.
#[derive(Debug, Default, Clone)]
pub struct AtlasConfigBuilder {
    cfg: AtlasConfig,
}

impl AtlasConfigBuilder {
    pub fn new() -> Self {
        Self {
            cfg: AtlasConfig::default(),
        }
    }
    pub fn padding(mut self, v: u32) -> Self {
        self.cfg.padding = v;
        self
    }
    pub fn max_size(mut self, v: u32) -> Self {
        self.cfg.max_size = v;
        self
    }
    pub fn packing_strategy(mut self, v: PackingStrategy) -> Self {
        self.cfg.packing_strategy = v;
        self
    }
    pub fn max_rects_heuristic(mut self, v: MaxRectsHeuristic) -> Self {
        self.cfg.max_rects_heuristic = v;
        self
    }
    pub fn default_alignment(mut self, v: SpriteAlignment) -> Self {
        self.cfg.default_alignment = v;
        self
    }
    pub fn default_custom_pivot(mut self, v: Vec2) -> Self {
        self.cfg.default_custom_pivot = v;
        self
    }
    pub fn disable_read_write_after_pack(mut self, v: bool) -> Self {
        self.cfg.disable_read_write_after_pack = v;
        self
    }
    pub fn allow_duplicate_sources(mut self, v: bool) -> Self {
        self.cfg.allow_duplicate_sources = v;
        self
    }
    pub fn build(self) -> AtlasConfig {
        self.cfg
    }
}
