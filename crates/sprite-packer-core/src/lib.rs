//! Core library for building a sprite atlas from a changing set of source images.
//!
//! - Registry: `AtlasRegistry` records the atlas asset, its `AtlasConfig`, the source entries
//!   and the included folders; it is serde-serializable.
//! - Pipeline: `rebuild` reconciles folders, makes sources readable, packs them (MaxRects or
//!   skyline) and merges the result with the atlas's existing sprite sheet so names, pivots and
//!   borders survive rebuilds.
//! - Assets are reached through the `AssetStore` trait; `MemoryAssetStore` is an in-memory
//!   implementation.
//!
//! Quick example:
//! ```ignore
//! use sprite_packer_core::prelude::*;
//! # fn main() -> anyhow::Result<()> {
//! let mut store = MemoryAssetStore::new();
//! store.insert_image("atlas.png", PixelBuffer::new(1, 1));
//! store.insert_image("sprites/hero.png", PixelBuffer::filled(32, 32, [255, 0, 0, 255]));
//! let mut registry = AtlasRegistry::new("atlas.png");
//! registry.add_folder("sprites")?;
//! let report = rebuild(&mut registry, &mut store).into_result()?;
//! println!("{} sprites in {}x{}", report.sprites, report.atlas_width, report.atlas_height);
//! # Ok(()) }
//! ```

pub mod build;
pub mod compositing;
pub mod config;
pub mod error;
pub mod merge;
pub mod model;
pub mod normalize;
pub mod packer;
pub mod pixel;
pub mod reconcile;
pub mod references;
pub mod registry;
pub mod store;

pub use build::*;
pub use config::*;
pub use error::*;
pub use model::*;
pub use packer::atlas::{AtlasPacker, MaxRectsStrategy, NativeStrategy, PackedAtlas, pack, pack_atlas};
pub use pixel::*;
pub use registry::*;
pub use store::{AssetStore, MemoryAssetStore};

/// Convenience prelude for common types and functions.
/// Importing `sprite_packer_core::prelude::*` brings the primary APIs into scope.
pub mod prelude {
    pub use crate::build::{
        BuildReport, BuildResult, BuildStage, BuildWarning, ReconcileReport, rebuild,
        reconcile_folders,
    };
    pub use crate::config::{AtlasConfig, AtlasConfigBuilder, MaxRectsHeuristic, PackingStrategy};
    pub use crate::error::{Result, SpritePackerError};
    pub use crate::model::{
        Border, EntryOrigin, NormRect, PackStats, Rect, SourceEntry, SourceRef, SpriteAlignment,
        SpriteMetadata, SubImage, SubImageRef, Vec2,
    };
    pub use crate::packer::atlas::{PackedAtlas, pack_atlas};
    pub use crate::pixel::{PixelBuffer, PixelFormat};
    pub use crate::registry::AtlasRegistry;
    pub use crate::store::{AssetStore, MemoryAssetStore};
}
