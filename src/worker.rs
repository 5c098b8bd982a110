//! Per-image extraction worker.
//!
//! [`process`] runs the whole pipeline for one [`WorkItem`]: read the source
//! image for its dimensions, load the matching skin mask at that size, fit the
//! dominant ellipse, persist the 20-byte record and, if requested, the oval
//! mask and overlay artifacts. Failures are returned as typed errors and
//! nothing is written for a failed item.

use crate::codec;
use crate::error::Result;
use crate::fitter::fit_ellipse;
use crate::mask::MaskLoader;
use crate::render::{self, OVERLAY_COLOR, OVERLAY_THICKNESS};
use crate::services::ImageIOService;
use crate::tracing_config::spans;
use crate::types::{EllipseDescriptor, ExtractionInfo, WorkItem};
use image::DynamicImage;
use std::path::PathBuf;
use tracing::{debug, warn};

/// Subdirectory of the output root holding binary oval masks
pub const OVAL_MASK_DIR: &str = "oval_masks";

/// Subdirectory of the output root holding overlay images
pub const OVERLAY_DIR: &str = "overlays";

/// Location of the optional oval mask artifact for an item
#[must_use]
pub fn oval_mask_path(item: &WorkItem) -> PathBuf {
    item.output_dir
        .join(OVAL_MASK_DIR)
        .join(format!("{}_oval_mask.png", item.image_id()))
}

/// Location of the optional overlay artifact for an item
#[must_use]
pub fn overlay_path(item: &WorkItem) -> PathBuf {
    item.output_dir
        .join(OVERLAY_DIR)
        .join(format!("{}_overlay.jpg", item.image_id()))
}

/// Extract, persist and summarise the ellipse for one image.
///
/// # Errors
/// * `NotFound` / `Decode` when the source image or its mask cannot be read
/// * `DegenerateGeometry` when the mask yields no ellipse
/// * `Io` / `Format` when the record cannot be written
pub fn process(item: &WorkItem) -> Result<ExtractionInfo> {
    let _span = spans::item(item.index).entered();
    let image = ImageIOService::load_image(item.image_path())?;
    let (width, height) = (image.width(), image.height());

    let image_id = item.image_id();
    let mask = MaskLoader::new(item.mask_extension.as_str()).load(
        item.mask_folder(),
        &image_id,
        Some((width, height)),
    )?;

    let ellipse = fit_ellipse(&mask)?;

    codec::save_record(codec::record_path(&item.output_dir, item.index), &ellipse)?;

    let oval_mask = render::rasterize_filled(&ellipse, width, height);
    let num_pixels = oval_mask.as_raw().iter().filter(|&&v| v > 0).count() as u64;

    if item.save_mask {
        save_artifact(item.index, oval_mask_path(item), &DynamicImage::ImageLuma8(oval_mask));
    }
    if item.save_overlay {
        save_overlay(item, &image, &ellipse);
    }

    debug!(
        index = item.index,
        center_x = ellipse.center_x,
        center_y = ellipse.center_y,
        major_axis = ellipse.major_axis,
        minor_axis = ellipse.minor_axis,
        rotation_angle = ellipse.rotation_angle,
        num_pixels,
        "Extracted ellipse"
    );

    Ok(ExtractionInfo { ellipse, num_pixels })
}

fn save_overlay(item: &WorkItem, image: &DynamicImage, ellipse: &EllipseDescriptor) {
    let overlay = render::draw_overlay(&image.to_rgb8(), ellipse, OVERLAY_COLOR, OVERLAY_THICKNESS);
    save_artifact(item.index, overlay_path(item), &DynamicImage::ImageRgb8(overlay));
}

/// Artifacts are diagnostics; failing to write one never fails the item
fn save_artifact(index: usize, path: PathBuf, image: &DynamicImage) {
    if let Err(e) = ImageIOService::save_image(image, &path) {
        warn!(index, path = %path.display(), error = %e, "Could not save artifact");
    }
}
