//! Asset store: loading splat textures and layer previews, persisting edits
//!
//! Working textures are persisted as 32-bit float OpenEXR so partially
//! painted weights survive a save/load cycle exactly.

use std::fmt;
use std::path::{Path, PathBuf};

use image::imageops::FilterType;
use image::{ImageFormat, ImageReader, Rgba32FImage};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

use crate::surface::CpuTexture;

/// Identity of a texture asset (a path relative to the store root)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AssetId(String);

impl AssetId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AssetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for AssetId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

#[derive(Debug, Error)]
pub enum AssetError {
    #[error("Failed to access {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to decode {path}: {source}")]
    Decode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("Failed to encode {path}: {source}")]
    Encode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("Texture data for {path} does not match {width}x{height}")]
    InvalidData {
        path: PathBuf,
        width: u32,
        height: u32,
    },
}

/// Texture loading and persistence
pub trait AssetStore {
    /// Load a texture at full resolution
    fn load_texture(&self, id: &AssetId) -> Result<CpuTexture, AssetError>;

    /// Load a texture resized to `size` x `size` for the channel selector
    fn load_preview(&self, id: &AssetId, size: u32) -> Result<CpuTexture, AssetError>;

    /// Persist a texture losslessly, replacing the asset's current content
    fn save_texture(&mut self, id: &AssetId, texture: &CpuTexture) -> Result<(), AssetError>;
}

/// Asset store backed by image files under a root directory
#[derive(Debug, Clone)]
pub struct FileAssetStore {
    root: PathBuf,
}

impl FileAssetStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Filesystem path of an asset
    pub fn path_of(&self, id: &AssetId) -> PathBuf {
        self.root.join(id.as_str())
    }

    /// Decode any supported image format, sniffing the content rather than
    /// trusting the extension
    fn decode(&self, id: &AssetId) -> Result<image::DynamicImage, AssetError> {
        let path = self.path_of(id);
        let reader = ImageReader::open(&path)
            .and_then(|reader| reader.with_guessed_format())
            .map_err(|source| AssetError::Io {
                path: path.clone(),
                source,
            })?;
        reader
            .decode()
            .map_err(|source| AssetError::Decode { path, source })
    }
}

impl AssetStore for FileAssetStore {
    fn load_texture(&self, id: &AssetId) -> Result<CpuTexture, AssetError> {
        let image = self.decode(id)?.into_rgba32f();
        let (width, height) = image.dimensions();
        debug!("Loaded texture {} ({}x{})", id, width, height);
        rgba32f_to_texture(image, self.path_of(id))
    }

    fn load_preview(&self, id: &AssetId, size: u32) -> Result<CpuTexture, AssetError> {
        let preview = self
            .decode(id)?
            .resize_exact(size, size, FilterType::Triangle)
            .into_rgba32f();
        rgba32f_to_texture(preview, self.path_of(id))
    }

    fn save_texture(&mut self, id: &AssetId, texture: &CpuTexture) -> Result<(), AssetError> {
        let path = self.path_of(id);
        let data: Vec<f32> = texture.pixels().iter().flatten().copied().collect();
        let image = Rgba32FImage::from_raw(texture.width, texture.height, data).ok_or(
            AssetError::InvalidData {
                path: path.clone(),
                width: texture.width,
                height: texture.height,
            },
        )?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|source| AssetError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }

        image
            .save_with_format(&path, ImageFormat::OpenExr)
            .map_err(|source| AssetError::Encode {
                path: path.clone(),
                source,
            })?;

        info!(
            "Saved texture {} ({}x{}) to {}",
            id,
            texture.width,
            texture.height,
            path.display()
        );
        Ok(())
    }
}

fn rgba32f_to_texture(image: Rgba32FImage, path: PathBuf) -> Result<CpuTexture, AssetError> {
    let (width, height) = image.dimensions();
    let pixels = image
        .pixels()
        .map(|pixel| pixel.0)
        .collect::<Vec<[f32; 4]>>();
    CpuTexture::from_pixels(width, height, pixels).ok_or(AssetError::InvalidData {
        path,
        width,
        height,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_store(name: &str) -> FileAssetStore {
        let root = std::env::temp_dir().join(format!(
            "splat_painter_asset_{}_{}",
            name,
            std::process::id()
        ));
        let _ = std::fs::remove_dir_all(&root);
        FileAssetStore::new(root)
    }

    fn gradient(width: u32, height: u32) -> CpuTexture {
        let mut texture = CpuTexture::new(width, height);
        for y in 0..height {
            for x in 0..width {
                let u = x as f32 / width as f32;
                let v = y as f32 / height as f32;
                texture.set_pixel(x, y, [u, v, 0.123_456_7, 1.0 - u]);
            }
        }
        texture
    }

    #[test]
    fn test_save_load_round_trip_is_exact() {
        let mut store = temp_store("round_trip");
        let id = AssetId::new("terrain/splat.exr");
        let texture = gradient(8, 4);

        store.save_texture(&id, &texture).unwrap();
        let loaded = store.load_texture(&id).unwrap();
        assert_eq!(loaded, texture);

        let _ = std::fs::remove_dir_all(store.root());
    }

    #[test]
    fn test_load_sniffs_content() {
        // Original path keeps its extension even though content is EXR
        let mut store = temp_store("sniff");
        let id = AssetId::new("splat.png");
        let texture = gradient(4, 4);

        store.save_texture(&id, &texture).unwrap();
        assert_eq!(store.load_texture(&id).unwrap(), texture);

        let _ = std::fs::remove_dir_all(store.root());
    }

    #[test]
    fn test_preview_is_resized() {
        let mut store = temp_store("preview");
        let id = AssetId::new("layer.exr");
        store.save_texture(&id, &gradient(32, 16)).unwrap();

        let preview = store.load_preview(&id, 8).unwrap();
        assert_eq!((preview.width, preview.height), (8, 8));

        let _ = std::fs::remove_dir_all(store.root());
    }

    #[test]
    fn test_missing_asset() {
        let store = temp_store("missing");
        let result = store.load_texture(&AssetId::new("nope.exr"));
        assert!(matches!(result, Err(AssetError::Io { .. })));
    }
}
