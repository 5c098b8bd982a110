//! Configuration types for oval extraction runs
//!
//! A run is described by an [`ExtractionConfig`], normally read from a YAML
//! file and then adjusted with command-line overrides:
//!
//! ```yaml
//! paths:
//!   image_dir: data/CelebAMask-HQ/CelebA-HQ-img
//!   mask_dir: data/CelebAMask-HQ/CelebAMask-HQ-mask-anno
//!   output_dir: output/ovals
//! dataset:
//!   images_per_folder: 2000
//! processing:
//!   start: 0
//!   end: 30000
//!   save_masks: false
//!   save_overlays: false
//! workers: 8
//! ```

use crate::error::{OvalError, Result};
use crate::types::WorkItem;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default configuration file looked up by the CLI
pub const DEFAULT_CONFIG_FILE: &str = "config.yaml";

/// Input and output locations
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    /// Source images, named `{index}.{image_extension}`
    pub image_dir: PathBuf,
    /// Skin masks, sharded into `{index / images_per_folder}` subfolders
    pub mask_dir: PathBuf,
    /// Ellipse records, failure log and optional artifacts
    pub output_dir: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            image_dir: PathBuf::from("data/CelebAMask-HQ/CelebA-HQ-img"),
            mask_dir: PathBuf::from("data/CelebAMask-HQ/CelebAMask-HQ-mask-anno"),
            output_dir: PathBuf::from("output/ovals"),
        }
    }
}

/// Dataset layout
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatasetConfig {
    /// Shard size of the mask directory
    pub images_per_folder: usize,
    pub image_extension: String,
    pub mask_extension: String,
}

impl Default for DatasetConfig {
    fn default() -> Self {
        Self {
            images_per_folder: 2000,
            image_extension: "jpg".to_string(),
            mask_extension: "png".to_string(),
        }
    }
}

/// Index range and optional outputs
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProcessingConfig {
    /// First image index (inclusive)
    pub start: usize,
    /// Last image index (exclusive)
    pub end: usize,
    /// Write `oval_masks/{id}_oval_mask.png`
    pub save_masks: bool,
    /// Write `overlays/{id}_overlay.jpg`
    pub save_overlays: bool,
}

impl Default for ProcessingConfig {
    fn default() -> Self {
        Self {
            start: 0,
            end: 30_000,
            save_masks: false,
            save_overlays: false,
        }
    }
}

/// Complete configuration of an extraction run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionConfig {
    pub paths: PathsConfig,
    pub dataset: DatasetConfig,
    pub processing: ProcessingConfig,
    /// Worker pool size; `None` uses every available CPU
    pub workers: Option<usize>,
}

/// Optional command-line values layered over a loaded configuration
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractOverrides {
    pub workers: Option<usize>,
    pub start: Option<usize>,
    pub end: Option<usize>,
    pub image_dir: Option<PathBuf>,
    pub mask_dir: Option<PathBuf>,
    pub output_dir: Option<PathBuf>,
    /// Only ever switches mask output on
    pub save_masks: bool,
    /// Only ever switches overlay output on
    pub save_overlays: bool,
}

impl ExtractionConfig {
    /// Parse a configuration from YAML text; missing keys take defaults
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(yaml)
            .map_err(|e| OvalError::invalid_config(format!("invalid YAML configuration: {e}")))
    }

    /// Load a configuration file
    pub fn from_yaml_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| OvalError::file_io_error("read configuration", path, &e))?;
        Self::from_yaml_str(&text).map_err(|e| match e {
            OvalError::InvalidConfig(msg) => {
                OvalError::invalid_config(format!("{}: {msg}", path.display()))
            },
            other => other,
        })
    }

    /// Apply command-line overrides; only values that were given replace
    /// what the file said
    pub fn apply_overrides(&mut self, overrides: &ExtractOverrides) {
        if let Some(workers) = overrides.workers {
            self.workers = Some(workers);
        }
        if let Some(start) = overrides.start {
            self.processing.start = start;
        }
        if let Some(end) = overrides.end {
            self.processing.end = end;
        }
        if let Some(dir) = &overrides.image_dir {
            self.paths.image_dir.clone_from(dir);
        }
        if let Some(dir) = &overrides.mask_dir {
            self.paths.mask_dir.clone_from(dir);
        }
        if let Some(dir) = &overrides.output_dir {
            self.paths.output_dir.clone_from(dir);
        }
        if overrides.save_masks {
            self.processing.save_masks = true;
        }
        if overrides.save_overlays {
            self.processing.save_overlays = true;
        }
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        if self.dataset.images_per_folder == 0 {
            return Err(OvalError::config_value_error(
                "images_per_folder",
                0,
                "at least 1",
            ));
        }

        if self.processing.start > self.processing.end {
            return Err(OvalError::invalid_config(format!(
                "start index {} is after end index {}",
                self.processing.start, self.processing.end
            )));
        }

        if self.workers == Some(0) {
            return Err(OvalError::config_value_error("workers", 0, "at least 1"));
        }

        for (name, ext) in [
            ("image_extension", &self.dataset.image_extension),
            ("mask_extension", &self.dataset.mask_extension),
        ] {
            if ext.is_empty() || ext.contains(['.', '/', '\\']) {
                return Err(OvalError::config_value_error(
                    name,
                    format!("'{ext}'"),
                    "a bare file extension such as 'png'",
                ));
            }
        }

        Ok(())
    }

    /// Number of images in `[start, end)`
    #[must_use]
    pub fn item_count(&self) -> usize {
        self.processing.end.saturating_sub(self.processing.start)
    }

    /// Build one work item per index in `[start, end)`
    #[must_use]
    pub fn work_items(&self) -> Vec<WorkItem> {
        (self.processing.start..self.processing.end)
            .map(|index| WorkItem {
                index,
                image_dir: self.paths.image_dir.clone(),
                mask_dir: self.paths.mask_dir.clone(),
                output_dir: self.paths.output_dir.clone(),
                images_per_folder: self.dataset.images_per_folder,
                image_extension: self.dataset.image_extension.clone(),
                mask_extension: self.dataset.mask_extension.clone(),
                save_mask: self.processing.save_masks,
                save_overlay: self.processing.save_overlays,
            })
            .collect()
    }
}
