//! Identifier to local image path resolution

use crate::io::configuration::{ASSET_IMAGE_SUFFIX, DEFAULT_ASSET_DIR};
use crate::io::error::{MosaicError, Result};
use std::path::{Path, PathBuf};

/// Source of locally readable reference images
///
/// Downloading and caching happen outside this crate; a store only maps
/// identifiers to files that are already on disk.
pub trait AssetStore {
    /// Conventional location of an item's image, whether or not it exists
    fn path_for(&self, id: &str) -> PathBuf;

    /// Location of an item's image, guaranteed to exist
    ///
    /// # Errors
    ///
    /// Returns `AssetUnavailable` if no readable file is present
    fn resolve(&self, id: &str) -> Result<PathBuf> {
        let path = self.path_for(id);
        if path.is_file() {
            Ok(path)
        } else {
            Err(MosaicError::AssetUnavailable {
                id: id.to_string(),
                path,
            })
        }
    }
}

/// Flat directory of `{id}{suffix}` image files
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LocalAssetStore {
    root: PathBuf,
    suffix: String,
}

impl Default for LocalAssetStore {
    fn default() -> Self {
        Self::new(DEFAULT_ASSET_DIR)
    }
}

impl LocalAssetStore {
    /// Store rooted at `root` using the default file suffix
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self::with_suffix(root, ASSET_IMAGE_SUFFIX)
    }

    /// Store rooted at `root` with a custom file suffix
    pub fn with_suffix(root: impl Into<PathBuf>, suffix: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            suffix: suffix.into(),
        }
    }

    /// Directory holding the images
    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl AssetStore for LocalAssetStore {
    fn path_for(&self, id: &str) -> PathBuf {
        self.root.join(format!("{id}{}", self.suffix))
    }
}
