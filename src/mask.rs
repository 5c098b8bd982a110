//! Skin mask resolution and loading.
//!
//! Masks are stored as `{mask_root}/{image_id}_skin.{ext}` and loaded as
//! 8-bit grayscale. Resizing always uses nearest-neighbour sampling so the
//! binary foreground/background values survive untouched.

use crate::error::{OvalError, Result};
use crate::types::Mask;
use image::imageops::{self, FilterType};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Extension used when none is configured
pub const DEFAULT_MASK_EXTENSION: &str = "png";

/// File name of the skin mask for an image id
#[must_use]
pub fn mask_file_name(image_id: &str, extension: &str) -> String {
    format!("{image_id}_skin.{extension}")
}

/// Loads per-image skin masks from a mask directory
#[derive(Debug, Clone)]
pub struct MaskLoader {
    extension: String,
}

impl Default for MaskLoader {
    fn default() -> Self {
        Self::new(DEFAULT_MASK_EXTENSION)
    }
}

impl MaskLoader {
    #[must_use]
    pub fn new<S: Into<String>>(extension: S) -> Self {
        Self {
            extension: extension.into(),
        }
    }

    /// Location of the mask for `image_id` under `mask_root`
    #[must_use]
    pub fn mask_path<P: AsRef<Path>>(&self, mask_root: P, image_id: &str) -> PathBuf {
        mask_root
            .as_ref()
            .join(mask_file_name(image_id, &self.extension))
    }

    /// Load the mask for `image_id`, optionally resized to `target_size`
    /// given as `(width, height)`.
    ///
    /// # Errors
    /// * `NotFound` when the mask file does not exist
    /// * `Decode` when it exists but is not a readable image
    pub fn load<P: AsRef<Path>>(
        &self,
        mask_root: P,
        image_id: &str,
        target_size: Option<(u32, u32)>,
    ) -> Result<Mask> {
        let path = self.mask_path(mask_root, image_id);
        if !path.is_file() {
            return Err(OvalError::not_found(&path));
        }

        let gray = image::open(&path)
            .map_err(|e| OvalError::image_load_error(&path, e))?
            .into_luma8();

        let gray = match target_size {
            Some((width, height)) if gray.dimensions() != (width, height) => {
                if width == 0 || height == 0 {
                    return Err(OvalError::config_value_error(
                        "mask target size",
                        format!("{width}x{height}"),
                        "non-zero width and height",
                    ));
                }
                debug!(
                    mask = %path.display(),
                    from = ?gray.dimensions(),
                    to = ?(width, height),
                    "Resizing mask (nearest neighbour)"
                );
                imageops::resize(&gray, width, height, FilterType::Nearest)
            },
            _ => gray,
        };

        Ok(Mask::from_image(gray))
    }
}

/// Load a `png` skin mask; see [`MaskLoader::load`]
pub fn load_mask<P: AsRef<Path>>(
    mask_root: P,
    image_id: &str,
    target_size: Option<(u32, u32)>,
) -> Result<Mask> {
    MaskLoader::default().load(mask_root, image_id, target_size)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use image::{GrayImage, Luma};
    use std::collections::BTreeSet;
    use tempfile::tempdir;

    fn checkerboard(width: u32, height: u32, cell: u32) -> GrayImage {
        GrayImage::from_fn(width, height, |x, y| {
            if ((x / cell) + (y / cell)) % 2 == 0 {
                Luma([255])
            } else {
                Luma([0])
            }
        })
    }

    #[test]
    fn test_mask_file_name() {
        assert_eq!(mask_file_name("00030", "png"), "00030_skin.png");
        assert_eq!(
            MaskLoader::default().mask_path("/masks/0", "00030"),
            PathBuf::from("/masks/0").join("00030_skin.png")
        );
    }

    #[test]
    fn test_load_missing_mask_is_not_found() {
        let dir = tempdir().unwrap();
        let err = load_mask(dir.path(), "00001", None).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[test]
    fn test_load_corrupt_mask_is_decode_error() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("00002_skin.png"), b"definitely not a png").unwrap();
        let err = load_mask(dir.path(), "00002", None).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Decode);
    }

    #[test]
    fn test_load_without_resize_keeps_pixels() {
        let dir = tempdir().unwrap();
        let source = checkerboard(16, 12, 4);
        source.save(dir.path().join("00003_skin.png")).unwrap();

        let mask = load_mask(dir.path(), "00003", None).unwrap();
        assert_eq!(mask.dimensions(), (16, 12));
        assert_eq!(mask.as_image(), &source);
    }

    #[test]
    fn test_resize_preserves_binary_values() {
        let dir = tempdir().unwrap();
        checkerboard(64, 48, 5)
            .save(dir.path().join("00004_skin.png"))
            .unwrap();

        for target in [(128, 96), (37, 23), (64, 17), (200, 51)] {
            let mask = load_mask(dir.path(), "00004", Some(target)).unwrap();
            assert_eq!(mask.dimensions(), target);
            let values: BTreeSet<u8> = mask.as_image().as_raw().iter().copied().collect();
            assert!(
                values.iter().all(|v| *v == 0 || *v == 255),
                "unexpected values {values:?} at {target:?}"
            );
        }
    }

    #[test]
    fn test_custom_extension() {
        let dir = tempdir().unwrap();
        checkerboard(8, 8, 2)
            .save(dir.path().join("00005_skin.jpg"))
            .unwrap();
        let loader = MaskLoader::new("jpg");
        assert_eq!(loader.load(dir.path(), "00005", None).unwrap().dimensions(), (8, 8));
    }
}
