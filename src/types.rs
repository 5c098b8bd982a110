//! Core data types for oval extraction

use crate::error::{OvalError, Result};
use image::GrayImage;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Rotated ellipse describing one face region.
///
/// Axes are full lengths in pixels. `rotation_angle` is in degrees, measured
/// from the +x image axis toward +y, and gives the direction of the axis
/// whose length is `major_axis`. Values are held at single precision, which
/// is also the precision of the persisted record.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EllipseDescriptor {
    pub center_x: f32,
    pub center_y: f32,
    pub major_axis: f32,
    pub minor_axis: f32,
    pub rotation_angle: f32,
}

impl EllipseDescriptor {
    /// Field names in record order
    pub const FIELD_NAMES: [&'static str; 5] = [
        "center_x",
        "center_y",
        "major_axis",
        "minor_axis",
        "rotation_angle",
    ];

    /// Build a descriptor from double-precision fit output.
    ///
    /// Fails if any value is not finite once narrowed to `f32`.
    pub fn new(
        center_x: f64,
        center_y: f64,
        major_axis: f64,
        minor_axis: f64,
        rotation_angle: f64,
    ) -> Result<Self> {
        Self::from_array([
            center_x as f32,
            center_y as f32,
            major_axis as f32,
            minor_axis as f32,
            rotation_angle as f32,
        ])
    }

    /// Build a descriptor from its five fields in record order
    pub fn from_array(values: [f32; 5]) -> Result<Self> {
        for (name, value) in Self::FIELD_NAMES.iter().zip(values) {
            if !value.is_finite() {
                return Err(OvalError::format(format!(
                    "ellipse field '{name}' is not a finite number: {value}"
                )));
            }
        }
        let [center_x, center_y, major_axis, minor_axis, rotation_angle] = values;
        Ok(Self {
            center_x,
            center_y,
            major_axis,
            minor_axis,
            rotation_angle,
        })
    }

    /// The five fields in record order
    #[must_use]
    pub fn to_array(&self) -> [f32; 5] {
        [
            self.center_x,
            self.center_y,
            self.major_axis,
            self.minor_axis,
            self.rotation_angle,
        ]
    }

    /// Whether every field is finite
    #[must_use]
    pub fn is_finite(&self) -> bool {
        self.to_array().iter().all(|v| v.is_finite())
    }
}

/// Grayscale segmentation mask; non-zero pixels are foreground
#[derive(Debug, Clone, PartialEq)]
pub struct Mask {
    image: GrayImage,
}

impl Mask {
    /// Wrap a grayscale image
    #[must_use]
    pub fn from_image(image: GrayImage) -> Self {
        Self { image }
    }

    /// Build a mask from raw row-major pixel data
    pub fn from_raw(width: u32, height: u32, data: Vec<u8>) -> Result<Self> {
        GrayImage::from_raw(width, height, data)
            .map(Self::from_image)
            .ok_or_else(|| {
                OvalError::internal(format!("mask buffer does not match {width}x{height}"))
            })
    }

    /// Mask dimensions (width, height)
    #[must_use]
    pub fn dimensions(&self) -> (u32, u32) {
        self.image.dimensions()
    }

    #[must_use]
    pub fn as_image(&self) -> &GrayImage {
        &self.image
    }

    #[must_use]
    pub fn into_image(self) -> GrayImage {
        self.image
    }

    /// Number of non-zero pixels
    #[must_use]
    pub fn foreground_count(&self) -> usize {
        self.image.as_raw().iter().filter(|&&v| v > 0).count()
    }
}

/// Per-image result of a successful extraction
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ExtractionInfo {
    #[serde(flatten)]
    pub ellipse: EllipseDescriptor,
    /// Pixels inside the rasterized ellipse
    pub num_pixels: u64,
}

/// Self-describing unit of batch work for one image
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkItem {
    pub index: usize,
    pub image_dir: PathBuf,
    pub mask_dir: PathBuf,
    pub output_dir: PathBuf,
    /// Shard size: images are grouped into `index / images_per_folder` subfolders
    pub images_per_folder: usize,
    pub image_extension: String,
    pub mask_extension: String,
    pub save_mask: bool,
    pub save_overlay: bool,
}

impl WorkItem {
    /// Zero-padded 5-digit identifier used in mask and artifact names
    #[must_use]
    pub fn image_id(&self) -> String {
        format!("{:05}", self.index)
    }

    /// Mask subfolder number for this image
    #[must_use]
    pub fn shard(&self) -> usize {
        self.index / self.images_per_folder.max(1)
    }

    /// Source image location, `{image_dir}/{index}.{ext}`
    #[must_use]
    pub fn image_path(&self) -> PathBuf {
        self.image_dir
            .join(format!("{}.{}", self.index, self.image_extension))
    }

    /// Directory holding this image's mask, `{mask_dir}/{shard}`
    #[must_use]
    pub fn mask_folder(&self) -> PathBuf {
        self.mask_dir.join(self.shard().to_string())
    }
}
