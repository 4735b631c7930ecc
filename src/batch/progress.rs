//! Progress tracking for batch runs.
//!
//! Workers bump a shared [`ProgressCounter`] after each successful file; the
//! [`ProgressTracker`] forwards the new value to a [`ProgressReporter`] so a
//! front end can draw it.

use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use tracing::{info, warn};

#[cfg(feature = "progress-tracking")]
use indicatif::{ProgressBar, ProgressStyle};

use super::error::FileFailure;
use super::outcome::RunReport;

/// Shared count of successfully processed files.
///
/// Invariant: `0 <= value <= total`, only ever increases during a run.
#[derive(Debug)]
pub struct ProgressCounter {
    value: Mutex<usize>,
    total: usize,
}

impl ProgressCounter {
    /// Create a counter at zero for a run of `total` files.
    pub fn new(total: usize) -> Self {
        Self {
            value: Mutex::new(0),
            total,
        }
    }

    /// Add one under the lock and return the new value.
    ///
    /// Saturates at `total`.
    pub fn increment(&self) -> usize {
        let mut value = self.value.lock();
        debug_assert!(*value < self.total, "progress counter overflow");
        if *value < self.total {
            *value += 1;
        }
        *value
    }

    /// Current value, read under the same lock.
    pub fn value(&self) -> usize {
        *self.value.lock()
    }

    /// Number of files in the run.
    pub const fn total(&self) -> usize {
        self.total
    }
}

/// Snapshot handed to reporters after each completed file.
#[derive(Debug, Clone)]
pub struct ProgressInfo {
    /// Files completed successfully so far.
    pub done: usize,
    /// Files in the run.
    pub total: usize,
    /// File that just completed.
    pub file_name: String,
    /// Time since the run started.
    pub elapsed: Duration,
}

impl ProgressInfo {
    /// Progress as a fraction (0.0 to 1.0).
    pub fn fraction(&self) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        self.done as f64 / self.total as f64
    }

    /// Estimated time left at the current rate.
    pub fn estimated_remaining(&self) -> Option<Duration> {
        if self.done == 0 || self.total < self.done {
            return None;
        }
        let per_item = self.elapsed.as_secs_f64() / self.done as f64;
        Some(Duration::from_secs_f64(
            per_item * (self.total - self.done) as f64,
        ))
    }
}

/// Receives progress notifications during a run.
///
/// Called from worker threads; implementations must be cheap and thread-safe.
pub trait ProgressReporter: Send + Sync {
    /// A run with `total` files over `workers` workers is starting.
    fn start(&self, total: usize, workers: usize) {
        let _ = (total, workers);
    }

    /// A file completed successfully.
    fn report_progress(&self, info: &ProgressInfo);

    /// A file failed. The run continues.
    fn report_failure(&self, failure: &FileFailure) {
        let _ = failure;
    }

    /// All workers have joined.
    fn finish(&self, report: &RunReport) {
        let _ = report;
    }
}

/// Reporter that does nothing.
#[derive(Debug, Default)]
pub struct NullProgressReporter;

impl ProgressReporter for NullProgressReporter {
    fn report_progress(&self, _info: &ProgressInfo) {}
}

/// Reporter that emits `tracing` events.
#[derive(Debug, Default)]
pub struct LogProgressReporter;

impl ProgressReporter for LogProgressReporter {
    fn start(&self, total: usize, workers: usize) {
        info!(total, workers, "amplification started");
    }

    fn report_progress(&self, info: &ProgressInfo) {
        info!(
            file = %info.file_name,
            done = info.done,
            total = info.total,
            percent = (info.fraction() * 100.0).round() as u32,
            eta_secs = info.estimated_remaining().map(|eta| eta.as_secs()),
            "amplified"
        );
    }

    fn report_failure(&self, failure: &FileFailure) {
        warn!(file = %failure.file_name, error = %failure.error, "amplification failed");
    }

    fn finish(&self, report: &RunReport) {
        info!(
            processed = report.processed,
            failed = report.outcome.failures().len(),
            elapsed_ms = report.elapsed.as_millis() as u64,
            "{}",
            report.outcome.summary()
        );
    }
}

/// Callback-based progress reporter.
#[derive(Debug)]
pub struct CallbackProgressReporter<F> {
    callback: F,
}

impl<F> CallbackProgressReporter<F>
where
    F: Fn(&ProgressInfo) + Send + Sync,
{
    /// Create a new callback progress reporter.
    pub fn new(callback: F) -> Self {
        Self { callback }
    }
}

impl<F> ProgressReporter for CallbackProgressReporter<F>
where
    F: Fn(&ProgressInfo) + Send + Sync,
{
    fn report_progress(&self, info: &ProgressInfo) {
        (self.callback)(info);
    }
}

/// Terminal progress bar using indicatif.
#[cfg(feature = "progress-tracking")]
#[derive(Debug)]
pub struct ProgressBarReporter {
    bar: ProgressBar,
}

#[cfg(feature = "progress-tracking")]
impl ProgressBarReporter {
    /// Create a progress bar; its length is set when the run starts.
    pub fn new() -> Self {
        let bar = ProgressBar::new(0);
        bar.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg} ({eta})")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("#>-"),
        );
        Self { bar }
    }

    /// Wrap an existing bar, e.g. one with a custom style or draw target.
    pub fn with_bar(bar: ProgressBar) -> Self {
        Self { bar }
    }
}

#[cfg(feature = "progress-tracking")]
impl Default for ProgressBarReporter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(feature = "progress-tracking")]
impl ProgressReporter for ProgressBarReporter {
    fn start(&self, total: usize, _workers: usize) {
        self.bar.set_length(total as u64);
        self.bar.set_position(0);
    }

    fn report_progress(&self, info: &ProgressInfo) {
        self.bar.set_position(info.done as u64);
        self.bar.set_message(info.file_name.clone());
    }

    fn report_failure(&self, failure: &FileFailure) {
        self.bar.println(format!("failed: {failure}"));
    }

    fn finish(&self, report: &RunReport) {
        if report.outcome.is_success() {
            self.bar.finish_with_message("done");
        } else {
            self.bar.abandon_with_message(report.outcome.summary());
        }
    }
}

/// Per-run counter plus the reporter observing it.
pub struct ProgressTracker {
    counter: ProgressCounter,
    reporter: Arc<dyn ProgressReporter>,
    started: Instant,
}

impl ProgressTracker {
    /// Start tracking a run of `total` files.
    pub fn new(total: usize, reporter: Arc<dyn ProgressReporter>) -> Self {
        Self {
            counter: ProgressCounter::new(total),
            reporter,
            started: Instant::now(),
        }
    }

    /// Record one successful file and notify the reporter.
    pub fn increment(&self, file_name: &str) -> usize {
        let done = self.counter.increment();
        self.reporter.report_progress(&ProgressInfo {
            done,
            total: self.counter.total(),
            file_name: file_name.to_string(),
            elapsed: self.started.elapsed(),
        });
        done
    }

    /// Notify the reporter of a failed file.
    pub fn failed(&self, failure: &FileFailure) {
        self.reporter.report_failure(failure);
    }

    /// The underlying counter.
    pub const fn counter(&self) -> &ProgressCounter {
        &self.counter
    }

    /// Time since tracking started.
    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }
}

impl std::fmt::Debug for ProgressTracker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProgressTracker")
            .field("counter", &self.counter)
            .field("started", &self.started)
            .finish()
    }
}
