//! Source photo loading and canvas export

use crate::io::error::{MosaicError, Result, file_system_error};
use image::RgbImage;
use std::path::Path;

/// Decode the photo a mosaic is built from
///
/// # Errors
///
/// Returns `ImageLoad` if the file cannot be decoded, or
/// `InvalidSourceImage` if it has no pixels
pub fn load_source_image<P: AsRef<Path>>(path: P) -> Result<RgbImage> {
    let path = path.as_ref();
    let decoded = image::open(path).map_err(|e| MosaicError::ImageLoad {
        path: path.to_path_buf(),
        source: e,
    })?;
    let image = decoded.to_rgb8();
    if image.width() == 0 || image.height() == 0 {
        return Err(MosaicError::InvalidSourceImage {
            path: path.to_path_buf(),
            reason: format!("image is {}x{} pixels", image.width(), image.height()),
        });
    }
    Ok(image)
}

/// Write a finished canvas, creating parent directories
///
/// The format follows the file extension.
///
/// # Errors
///
/// Returns an error if the directory cannot be created or the image
/// cannot be encoded
pub fn save_canvas<P: AsRef<Path>>(canvas: &RgbImage, path: P) -> Result<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .map_err(|e| file_system_error(parent, "create directory", e))?;
    }
    canvas.save(path).map_err(|e| MosaicError::ImageExport {
        path: path.to_path_buf(),
        source: e,
    })
}
