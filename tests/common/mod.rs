//! Synthetic dataset fixtures shared by the integration tests

#![allow(dead_code)]

use image::{GrayImage, Luma, RgbImage};
use oval_annotate::ExtractionConfig;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Shard size used by the fixtures, small enough to exercise several folders
pub const IMAGES_PER_FOLDER: usize = 4;

/// Temporary dataset laid out like the real one:
/// `images/{i}.jpg`, `masks/{i / shard}/{i:05}_skin.png`, output in `out/`
pub struct Dataset {
    pub dir: TempDir,
}

impl Dataset {
    pub fn new() -> Self {
        let dir = TempDir::new().expect("Failed to create temp directory");
        for sub in ["images", "masks"] {
            std::fs::create_dir_all(dir.path().join(sub)).expect("Failed to create dataset dir");
        }
        Self { dir }
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    pub fn output_dir(&self) -> PathBuf {
        self.root().join("out")
    }

    pub fn image_path(&self, index: usize) -> PathBuf {
        self.root().join("images").join(format!("{index}.jpg"))
    }

    pub fn mask_path(&self, index: usize) -> PathBuf {
        self.root()
            .join("masks")
            .join((index / IMAGES_PER_FOLDER).to_string())
            .join(format!("{index:05}_skin.png"))
    }

    /// Write a `width` x `height` source image
    pub fn add_image(&self, index: usize, width: u32, height: u32) {
        RgbImage::from_pixel(width, height, image::Rgb([90, 70, 60]))
            .save(self.image_path(index))
            .expect("Failed to write image");
    }

    /// Write a mask for `index`
    pub fn add_mask(&self, index: usize, mask: &GrayImage) {
        let path = self.mask_path(index);
        std::fs::create_dir_all(path.parent().expect("mask path has a parent"))
            .expect("Failed to create mask shard");
        mask.save(path).expect("Failed to write mask");
    }

    /// Image plus a filled-disk mask of the same size
    pub fn add_disk_item(&self, index: usize, width: u32, height: u32, disk: (f64, f64, f64)) {
        self.add_image(index, width, height);
        self.add_mask(index, &disk_mask(width, height, &[disk]));
    }

    /// Config pointing at this dataset for `[start, end)`
    pub fn config(&self, start: usize, end: usize) -> ExtractionConfig {
        let mut config = ExtractionConfig::default();
        config.paths.image_dir = self.root().join("images");
        config.paths.mask_dir = self.root().join("masks");
        config.paths.output_dir = self.output_dir();
        config.dataset.images_per_folder = IMAGES_PER_FOLDER;
        config.processing.start = start;
        config.processing.end = end;
        config.workers = Some(3);
        config
    }
}

/// Mask with every pixel inside any of the `(cx, cy, r)` disks set to 255
pub fn disk_mask(width: u32, height: u32, disks: &[(f64, f64, f64)]) -> GrayImage {
    GrayImage::from_fn(width, height, |x, y| {
        let inside = disks.iter().any(|&(cx, cy, r)| {
            let (dx, dy) = (f64::from(x) - cx, f64::from(y) - cy);
            dx * dx + dy * dy <= r * r
        });
        Luma([if inside { 255 } else { 0 }])
    })
}
