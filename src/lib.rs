#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::uninlined_format_args)]

//! # Oval Annotate
//!
//! Extracts one rotated ellipse per image from face skin-segmentation masks,
//! stores it as a fixed 20-byte record and runs the extraction over large
//! datasets in parallel, tolerating per-image failures.
//!
//! ## Pipeline
//!
//! - **Codec** ([`codec`]): five big-endian `f32` values per record, named
//!   `{index:05}.bin`
//! - **Mask loading** ([`mask`]): `{image_id}_skin.png`, resized with
//!   nearest-neighbour sampling so masks stay binary
//! - **Fitting** ([`fitter`]): largest external contour, direct least-squares
//!   ellipse fit
//! - **Worker** ([`worker`]): one image end to end, plus optional oval mask and
//!   overlay artifacts
//! - **Orchestration** ([`parallel`]): bounded parallel batch with per-item
//!   failure isolation
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use oval_annotate::{
//!     run_parallel, worker, ExtractionConfig, NoOpProgressReporter,
//! };
//! use std::sync::Arc;
//!
//! # async fn example() -> anyhow::Result<()> {
//! let mut config = ExtractionConfig::from_yaml_file("config.yaml")?;
//! config.processing.end = 100;
//! config.validate()?;
//!
//! let outcome = run_parallel(
//!     config.work_items(),
//!     Arc::new(worker::process),
//!     config.workers,
//!     &NoOpProgressReporter,
//! )
//! .await?;
//! println!(
//!     "{} succeeded, {} failed",
//!     outcome.successes.len(),
//!     outcome.failures.len()
//! );
//! # Ok(())
//! # }
//! ```
//!
//! Reading a record back:
//!
//! ```rust,no_run
//! use oval_annotate::codec;
//!
//! let ellipse = codec::load_record(codec::record_path("output/ovals", 42))?;
//! println!("centre ({}, {})", ellipse.center_x, ellipse.center_y);
//! # Ok::<(), oval_annotate::OvalError>(())
//! ```
//!
//! ### Feature Flags
//!
//! - `cli` (default): command-line interface, progress bar and subscriber setup
//! - `tracing-json`: JSON log output for the CLI

#[cfg(feature = "cli")]
pub mod cli;
pub mod codec;
pub mod config;
pub mod error;
pub mod fitter;
pub mod mask;
pub mod parallel;
pub mod render;
pub mod services;
pub mod tracing_config;
pub mod types;
pub mod worker;

pub use codec::{decode, encode, load_record, record_path, save_record, RECORD_LEN};
pub use config::{ExtractOverrides, ExtractionConfig};
pub use error::{ErrorKind, GeometryError, OvalError, Result};
pub use fitter::fit_ellipse;
pub use mask::{load_mask, MaskLoader};
pub use parallel::{run_parallel, BatchFailure, BatchItem, BatchOutcome};
pub use render::{count_inside, draw_overlay, rasterize_filled};
pub use services::{
    BatchProgressUpdate, ConsoleProgressReporter, ImageIOService, NoOpProgressReporter,
    ProgressReporter,
};
pub use tracing_config::{TracingConfig, TracingFormat};
pub use types::{EllipseDescriptor, ExtractionInfo, Mask, WorkItem};
