use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SpritePackerError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("Atlas asset {0} could not be resolved or made readable")]
    UnresolvableAtlasAsset(PathBuf),
    #[error("Source asset {0} could not be made readable")]
    UnreadableSource(PathBuf),
    #[error("Source asset {0} has a pixel format that could not be converted")]
    UnsupportedFormat(PathBuf),
    #[error("Sprites do not fit into a {max_size}x{max_size} atlas (placed {placed}/{total})")]
    ExceedsMaxSize {
        max_size: u32,
        placed: usize,
        total: usize,
    },
    #[error("Sprite name {0:?} is used by more than one entry")]
    DuplicateNameCollision(String),
    #[error("Included folder {0} no longer exists")]
    StaleFolder(PathBuf),
    #[error("Source is already part of the atlas")]
    DuplicateSource,
    #[error("Folder {0} is already included")]
    DuplicateFolder(PathBuf),
    #[error("Another rebuild of this atlas is in progress")]
    BuildInProgress,
    #[error("Asset store error: {0}")]
    AssetStore(String),
}

pub type Result<T> = std::result::Result<T, SpritePackerError>;
