//! Progress reporting service
//!
//! This module separates progress reporting concerns from business logic,
//! allowing different frontends to implement their own progress handling.
//! Progress is observational only: reporters never influence scheduling.

use instant::Instant;

/// Snapshot of batch progress after one item finished
#[derive(Debug, Clone, PartialEq)]
pub struct BatchProgressUpdate {
    /// Items finished so far, successful or not
    pub completed: usize,
    /// Items that failed so far
    pub failed: usize,
    /// Total number of items in the batch
    pub total: usize,
    /// Index of the item that just finished
    pub last_index: Option<usize>,
    /// Time since the batch started
    pub elapsed_ms: u64,
    /// Processing rate in items per second
    pub rate: f64,
    /// Estimated time remaining in seconds
    pub eta_seconds: Option<u64>,
}

impl BatchProgressUpdate {
    /// Completion percentage (0-100)
    #[must_use]
    pub fn percentage(&self) -> u8 {
        if self.total == 0 {
            return 100;
        }
        ((self.completed * 100) / self.total).min(100) as u8
    }
}

/// Tracks counts and timing for a running batch and produces updates
#[derive(Debug)]
pub struct BatchProgressTracker {
    start_time: Instant,
    total: usize,
    completed: usize,
    failed: usize,
}

impl BatchProgressTracker {
    #[must_use]
    pub fn new(total: usize) -> Self {
        Self {
            start_time: Instant::now(),
            total,
            completed: 0,
            failed: 0,
        }
    }

    /// Record one finished item and return the resulting update
    pub fn record(&mut self, index: Option<usize>, succeeded: bool) -> BatchProgressUpdate {
        self.completed += 1;
        if !succeeded {
            self.failed += 1;
        }

        let elapsed = self.start_time.elapsed();
        let secs = elapsed.as_secs_f64();
        let rate = if secs > 0.0 {
            self.completed as f64 / secs
        } else {
            0.0
        };
        let remaining = self.total.saturating_sub(self.completed);
        let eta_seconds = (rate > 0.0).then(|| (remaining as f64 / rate).ceil() as u64);

        BatchProgressUpdate {
            completed: self.completed,
            failed: self.failed,
            total: self.total,
            last_index: index,
            elapsed_ms: elapsed.as_millis() as u64,
            rate,
            eta_seconds,
        }
    }

    #[must_use]
    pub fn elapsed_ms(&self) -> u64 {
        self.start_time.elapsed().as_millis() as u64
    }
}

/// Trait for observing batch extraction progress
pub trait ProgressReporter: Send + Sync {
    /// A batch of `total` items is about to start
    fn start(&self, total: usize);

    /// One item finished
    ///
    /// # Arguments
    /// * `update` - Counts, rate and ETA after the item finished
    fn item_finished(&self, update: &BatchProgressUpdate);

    /// The batch is done
    fn finish(&self, succeeded: usize, failed: usize, elapsed_ms: u64);
}

/// No-op progress reporter that discards all progress updates
pub struct NoOpProgressReporter;

impl ProgressReporter for NoOpProgressReporter {
    fn start(&self, _total: usize) {
        // Intentionally empty - discards progress updates
    }

    fn item_finished(&self, _update: &BatchProgressUpdate) {
        // Intentionally empty - discards progress updates
    }

    fn finish(&self, _succeeded: usize, _failed: usize, _elapsed_ms: u64) {
        // Intentionally empty - discards completion notification
    }
}

/// Console progress reporter that logs progress through `tracing`
pub struct ConsoleProgressReporter {
    verbose: bool,
    /// Log every n-th completion when not verbose
    every: usize,
}

impl ConsoleProgressReporter {
    /// Create a new console progress reporter
    ///
    /// # Arguments
    /// * `verbose` - Log every finished item instead of periodic summaries
    #[must_use]
    pub fn new(verbose: bool) -> Self {
        Self { verbose, every: 100 }
    }

    fn format_eta(eta_seconds: Option<u64>) -> String {
        match eta_seconds {
            Some(s) if s >= 3600 => format!("{}h{:02}m", s / 3600, (s % 3600) / 60),
            Some(s) if s >= 60 => format!("{}m{:02}s", s / 60, s % 60),
            Some(s) => format!("{s}s"),
            None => "unknown".to_string(),
        }
    }
}

impl ProgressReporter for ConsoleProgressReporter {
    fn start(&self, total: usize) {
        tracing::info!(total, "Starting extraction batch");
    }

    fn item_finished(&self, update: &BatchProgressUpdate) {
        if self.verbose || update.completed % self.every == 0 || update.completed == update.total
        {
            tracing::info!(
                "[{}%] {}/{} items ({} failed, {:.1} items/sec) - ETA: {}",
                update.percentage(),
                update.completed,
                update.total,
                update.failed,
                update.rate,
                Self::format_eta(update.eta_seconds)
            );
        }
    }

    fn finish(&self, succeeded: usize, failed: usize, elapsed_ms: u64) {
        tracing::info!(succeeded, failed, elapsed_ms, "Extraction batch completed");
    }
}

/// Progress bar reporter for interactive terminals
#[cfg(feature = "cli")]
pub struct IndicatifProgressReporter {
    bar: indicatif::ProgressBar,
}

#[cfg(feature = "cli")]
impl IndicatifProgressReporter {
    #[must_use]
    pub fn new() -> Self {
        let bar = indicatif::ProgressBar::hidden();
        if let Ok(style) = indicatif::ProgressStyle::default_bar().template(
            "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({per_sec}, ETA {eta}) {msg}",
        ) {
            bar.set_style(style.progress_chars("#>-"));
        }
        Self { bar }
    }
}

#[cfg(feature = "cli")]
impl Default for IndicatifProgressReporter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(feature = "cli")]
impl ProgressReporter for IndicatifProgressReporter {
    fn start(&self, total: usize) {
        self.bar.set_length(total as u64);
        self.bar.set_position(0);
        self.bar
            .set_draw_target(indicatif::ProgressDrawTarget::stderr());
    }

    fn item_finished(&self, update: &BatchProgressUpdate) {
        self.bar.set_position(update.completed as u64);
        if update.failed > 0 {
            self.bar.set_message(format!("{} failed", update.failed));
        }
    }

    fn finish(&self, succeeded: usize, failed: usize, _elapsed_ms: u64) {
        self.bar
            .finish_with_message(format!("{succeeded} succeeded, {failed} failed"));
    }
}

/// Create the progress reporter for a CLI run
///
/// # Arguments
/// * `interactive` - Whether to draw a progress bar (otherwise log through tracing)
/// * `verbose` - Whether verbose logging is enabled
pub fn create_cli_progress_reporter(interactive: bool, verbose: bool) -> Box<dyn ProgressReporter> {
    match interactive_reporter() {
        Some(reporter) if interactive => reporter,
        _ => Box::new(ConsoleProgressReporter::new(verbose)),
    }
}

#[cfg(feature = "cli")]
fn interactive_reporter() -> Option<Box<dyn ProgressReporter>> {
    Some(Box::new(IndicatifProgressReporter::new()))
}

#[cfg(not(feature = "cli"))]
fn interactive_reporter() -> Option<Box<dyn ProgressReporter>> {
    None
}
