//! Services separating file I/O and progress reporting from the pipeline

pub mod io;
pub mod progress;

pub use io::{ImageIOService, FAILED_LOG_NAME, SUMMARY_NAME};
#[cfg(feature = "cli")]
pub use progress::IndicatifProgressReporter;
pub use progress::{
    create_cli_progress_reporter, BatchProgressTracker, BatchProgressUpdate,
    ConsoleProgressReporter, NoOpProgressReporter, ProgressReporter,
};
