//! Error taxonomy for catalog, index and mosaic operations

use std::fmt;
use std::path::PathBuf;

/// Main error type for all mosaic operations
#[derive(Debug)]
pub enum MosaicError {
    /// Failed to decode an image from the filesystem
    ImageLoad {
        /// Path to the image file
        path: PathBuf,
        /// Underlying image loading error
        source: image::ImageError,
    },

    /// Failed to save a finished canvas to disk
    ImageExport {
        /// Path where export was attempted
        path: PathBuf,
        /// Underlying image export error
        source: image::ImageError,
    },

    /// Source photo decoded but cannot be tiled
    InvalidSourceImage {
        /// Path of the offending photo
        path: PathBuf,
        /// Description of what's wrong with it
        reason: String,
    },

    /// Parameter validation failed
    InvalidParameter {
        /// Name of the invalid parameter
        parameter: &'static str,
        /// Provided value that failed validation
        value: String,
        /// Explanation of why the value is invalid
        reason: String,
    },

    /// Attempted to build a color index over zero reference items
    EmptyIndex,

    /// Tree, item array and color matrix disagree on their length
    IndexMismatch {
        /// Number of points held by the spatial tree
        tree_points: usize,
        /// Number of reference items
        items: usize,
        /// Number of rows in the color matrix
        colors: usize,
    },

    /// Asset store could not provide a readable image for an item
    AssetUnavailable {
        /// Identifier of the reference item
        id: String,
        /// Path that was expected to hold the image
        path: PathBuf,
    },

    /// Catalog document could not be parsed or written
    Catalog {
        /// Path of the catalog document
        path: PathBuf,
        /// Underlying JSON error
        source: serde_json::Error,
    },

    /// Persisted index blob could not be encoded or decoded
    Persistence {
        /// Path of the index blob
        path: PathBuf,
        /// Underlying bincode error
        source: bincode::Error,
    },

    /// General file system operation failure
    FileSystem {
        /// Path involved in the operation
        path: PathBuf,
        /// Description of the operation that failed
        operation: &'static str,
        /// Underlying I/O error
        source: std::io::Error,
    },
}

impl fmt::Display for MosaicError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ImageLoad { path, source } => {
                write!(f, "Failed to load image '{}': {source}", path.display())
            }
            Self::ImageExport { path, source } => {
                write!(
                    f,
                    "Failed to export image to '{}': {source}",
                    path.display()
                )
            }
            Self::InvalidSourceImage { path, reason } => {
                write!(f, "Invalid source image '{}': {reason}", path.display())
            }
            Self::InvalidParameter {
                parameter,
                value,
                reason,
            } => {
                write!(f, "Invalid parameter '{parameter}' = '{value}': {reason}")
            }
            Self::EmptyIndex => {
                write!(f, "Cannot build a color index from an empty catalog")
            }
            Self::IndexMismatch {
                tree_points,
                items,
                colors,
            } => {
                write!(
                    f,
                    "Color index is inconsistent: tree holds {tree_points} points, \
                     catalog holds {items} items, color matrix holds {colors} rows"
                )
            }
            Self::AssetUnavailable { id, path } => {
                write!(f, "Asset for '{id}' is unavailable at '{}'", path.display())
            }
            Self::Catalog { path, source } => {
                write!(f, "Catalog error in '{}': {source}", path.display())
            }
            Self::Persistence { path, source } => {
                write!(f, "Index persistence error in '{}': {source}", path.display())
            }
            Self::FileSystem {
                path,
                operation,
                source,
            } => {
                write!(
                    f,
                    "File system error during {operation} on '{}': {source}",
                    path.display()
                )
            }
        }
    }
}

impl std::error::Error for MosaicError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::ImageLoad { source, .. } | Self::ImageExport { source, .. } => Some(source),
            Self::Catalog { source, .. } => Some(source),
            Self::Persistence { source, .. } => Some(source),
            Self::FileSystem { source, .. } => Some(source),
            _ => None,
        }
    }
}

/// Convenience type alias for mosaic results
pub type Result<T> = std::result::Result<T, MosaicError>;

impl From<image::ImageError> for MosaicError {
    fn from(err: image::ImageError) -> Self {
        Self::ImageLoad {
            path: PathBuf::from("<unknown>"),
            source: err,
        }
    }
}

impl From<std::io::Error> for MosaicError {
    fn from(err: std::io::Error) -> Self {
        Self::FileSystem {
            path: PathBuf::from("<unknown>"),
            operation: "unknown",
            source: err,
        }
    }
}

/// Create an invalid parameter error
pub fn invalid_parameter(
    parameter: &'static str,
    value: &impl ToString,
    reason: &impl ToString,
) -> MosaicError {
    MosaicError::InvalidParameter {
        parameter,
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

/// Create a file system error for a known path
pub fn file_system_error(
    path: impl Into<PathBuf>,
    operation: &'static str,
    source: std::io::Error,
) -> MosaicError {
    MosaicError::FileSystem {
        path: path.into(),
        operation,
        source,
    }
}
