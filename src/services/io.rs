//! File I/O operations service
//!
//! This module separates file I/O operations from business logic,
//! making the extraction pipeline easier to test.

use crate::error::{OvalError, Result};
use crate::types::ExtractionInfo;
use image::{DynamicImage, ImageFormat};
use serde::Serialize;
use std::path::{Path, PathBuf};

/// Name of the failed-index log written into the output directory
pub const FAILED_LOG_NAME: &str = "failed.json";

/// Name of the per-index summary written into the output directory
pub const SUMMARY_NAME: &str = "summary.json";

/// One line of `summary.json`
#[derive(Debug, Serialize)]
struct SummaryEntry<'a> {
    index: usize,
    #[serde(flatten)]
    info: &'a ExtractionInfo,
}

/// Service for handling image and batch artifact input/output
pub struct ImageIOService;

impl ImageIOService {
    /// Load an image from a file path
    ///
    /// # Returns
    /// * `Err(OvalError::NotFound)` - No file at `path`
    /// * `Err(OvalError::Decode)` - The file exists but is not a readable image
    ///
    /// # Examples
    /// ```rust,no_run
    /// use oval_annotate::services::ImageIOService;
    ///
    /// let image = ImageIOService::load_image("images/30.jpg")?;
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn load_image<P: AsRef<Path>>(path: P) -> Result<DynamicImage> {
        let path_ref = path.as_ref();

        if !path_ref.is_file() {
            return Err(OvalError::not_found(path_ref));
        }

        match image::open(path_ref) {
            Ok(img) => Ok(img),
            Err(e) => {
                // Fall back to sniffing the content when the extension is wrong
                tracing::debug!(
                    "Extension-based loading failed for {}: {}. Attempting content-based \
                     detection.",
                    path_ref.display(),
                    e
                );
                let data = std::fs::read(path_ref).map_err(|io_err| {
                    OvalError::file_io_error("read image data", path_ref, &io_err)
                })?;
                image::load_from_memory(&data)
                    .map_err(|_| OvalError::image_load_error(path_ref, e))
            },
        }
    }

    /// Save an image, creating the parent directory when missing.
    ///
    /// The format is taken from the file extension.
    pub fn save_image<P: AsRef<Path>>(image: &DynamicImage, path: P) -> Result<()> {
        let path_ref = path.as_ref();
        Self::ensure_parent(path_ref)?;

        let format = ImageFormat::from_path(path_ref)
            .map_err(|e| OvalError::invalid_config(format!("unsupported output format: {e}")))?;
        let result = match format {
            // JPEG has no alpha channel
            ImageFormat::Jpeg => {
                DynamicImage::ImageRgb8(image.to_rgb8()).save_with_format(path_ref, format)
            },
            _ => image.save_with_format(path_ref, format),
        };
        result.map_err(OvalError::from)
    }

    /// Write the failed indices as a JSON array
    pub fn write_failed_log<P: AsRef<Path>>(output_dir: P, failed: &[usize]) -> Result<PathBuf> {
        let path = output_dir.as_ref().join(FAILED_LOG_NAME);
        Self::write_json(&path, &failed)?;
        Ok(path)
    }

    /// Read a failed-index log written by [`Self::write_failed_log`]
    pub fn read_failed_log<P: AsRef<Path>>(path: P) -> Result<Vec<usize>> {
        let path_ref = path.as_ref();
        let data = std::fs::read(path_ref)
            .map_err(|e| OvalError::file_io_error("read failure log", path_ref, &e))?;
        serde_json::from_slice(&data).map_err(|e| {
            OvalError::format(format!(
                "invalid failure log '{}': {e}",
                path_ref.display()
            ))
        })
    }

    /// Write per-index extraction info, sorted by index
    pub fn write_summary<P: AsRef<Path>>(
        output_dir: P,
        successes: &[(usize, ExtractionInfo)],
    ) -> Result<PathBuf> {
        let mut entries: Vec<SummaryEntry<'_>> = successes
            .iter()
            .map(|(index, info)| SummaryEntry {
                index: *index,
                info,
            })
            .collect();
        entries.sort_by_key(|e| e.index);

        let path = output_dir.as_ref().join(SUMMARY_NAME);
        Self::write_json(&path, &entries)?;
        Ok(path)
    }

    fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
        Self::ensure_parent(path)?;
        let json = serde_json::to_vec_pretty(value)
            .map_err(|e| OvalError::internal(format!("JSON serialization failed: {e}")))?;
        std::fs::write(path, json).map_err(|e| OvalError::file_io_error("write", path, &e))
    }

    fn ensure_parent(path: &Path) -> Result<()> {
        match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => std::fs::create_dir_all(parent)
                .map_err(|e| OvalError::file_io_error("create output directory", parent, &e)),
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::types::EllipseDescriptor;
    use image::{GrayImage, RgbImage};
    use tempfile::tempdir;

    #[test]
    fn test_load_missing_image() {
        let dir = tempdir().unwrap();
        let err = ImageIOService::load_image(dir.path().join("7.jpg")).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[test]
    fn test_load_corrupt_image() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("7.jpg");
        std::fs::write(&path, b"\xff\xd8 truncated").unwrap();
        assert_eq!(
            ImageIOService::load_image(&path).unwrap_err().kind(),
            ErrorKind::Decode
        );
    }

    #[test]
    fn test_load_detects_content_when_extension_lies() {
        let dir = tempdir().unwrap();
        let png = dir.path().join("real.png");
        GrayImage::new(6, 4).save(&png).unwrap();
        let disguised = dir.path().join("fake.jpg");
        std::fs::copy(&png, &disguised).unwrap();

        let image = ImageIOService::load_image(&disguised).unwrap();
        assert_eq!((image.width(), image.height()), (6, 4));
    }

    #[test]
    fn test_save_creates_directories() {
        let dir = tempdir().unwrap();
        let nested = dir.path().join("overlays").join("00001_overlay.jpg");
        ImageIOService::save_image(&DynamicImage::ImageRgb8(RgbImage::new(8, 8)), &nested).unwrap();
        assert!(nested.is_file());

        let gray = dir.path().join("oval_masks").join("00001_oval_mask.png");
        ImageIOService::save_image(&DynamicImage::ImageLuma8(GrayImage::new(8, 8)), &gray).unwrap();
        assert_eq!(ImageIOService::load_image(&gray).unwrap().width(), 8);
    }

    #[test]
    fn test_failed_log_round_trip() {
        let dir = tempdir().unwrap();
        let path = ImageIOService::write_failed_log(dir.path(), &[3, 17, 2]).unwrap();
        assert_eq!(path.file_name().unwrap(), FAILED_LOG_NAME);
        assert_eq!(ImageIOService::read_failed_log(&path).unwrap(), vec![3, 17, 2]);

        let raw: serde_json::Value =
            serde_json::from_slice(&std::fs::read(&path).unwrap()).unwrap();
        assert!(raw.is_array());
    }

    #[test]
    fn test_summary_sorted_by_index() {
        let dir = tempdir().unwrap();
        let info = |x: f64| ExtractionInfo {
            ellipse: EllipseDescriptor::new(x, 1.0, 4.0, 2.0, 0.0).unwrap(),
            num_pixels: 6,
        };
        let path =
            ImageIOService::write_summary(dir.path(), &[(9, info(9.0)), (2, info(2.0))]).unwrap();

        let raw: serde_json::Value = serde_json::from_slice(&std::fs::read(path).unwrap()).unwrap();
        let entries = raw.as_array().unwrap();
        assert_eq!(entries[0]["index"], 2);
        assert_eq!(entries[0]["center_x"], 2.0);
        assert_eq!(entries[1]["index"], 9);
        assert_eq!(entries[1]["num_pixels"], 6);
    }
}
