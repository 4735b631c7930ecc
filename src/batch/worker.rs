//! Per-run state and the worker loop.

use std::sync::atomic::{AtomicUsize, Ordering};

use parking_lot::Mutex;
use tracing::debug;

use super::cancel::CancellationToken;
use super::error::FileFailure;
use super::partition::Chunk;
use super::progress::ProgressTracker;
use crate::job::Job;
use crate::transform::{AudioTransform, TransformParams};

/// Everything a run shares with its workers. Owned by the coordinator for
/// the duration of one run and dropped afterwards.
pub(crate) struct RunContext<'a> {
    job: &'a Job,
    params: TransformParams,
    transform: &'a dyn AudioTransform,
    tracker: ProgressTracker,
    failures: Mutex<Vec<FileFailure>>,
    skipped: AtomicUsize,
    cancel: CancellationToken,
}

/// What a run's workers produced once they have all joined.
pub(crate) struct RunTally {
    pub(crate) processed: usize,
    pub(crate) skipped: usize,
    pub(crate) failures: Vec<FileFailure>,
}

impl<'a> RunContext<'a> {
    pub(crate) fn new(
        job: &'a Job,
        transform: &'a dyn AudioTransform,
        tracker: ProgressTracker,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            job,
            params: TransformParams {
                gain_db: job.gain_db(),
                bitrate: job.bitrate().clone(),
                format: job.format(),
            },
            transform,
            tracker,
            failures: Mutex::new(Vec::new()),
            skipped: AtomicUsize::new(0),
            cancel,
        }
    }

    pub(crate) fn tracker(&self) -> &ProgressTracker {
        &self.tracker
    }

    /// Process one chunk in order. A failing file is recorded and the loop
    /// moves on; cancellation stops before the next file.
    pub(crate) fn run_chunk(&self, chunk: Chunk<'_, String>) {
        debug!(chunk = chunk.index, files = chunk.len(), "worker started");

        for (position, file_name) in chunk.items.iter().enumerate() {
            if self.cancel.is_cancelled() {
                let remaining = chunk.len() - position;
                self.skipped.fetch_add(remaining, Ordering::Relaxed);
                debug!(chunk = chunk.index, remaining, "cancelled, skipping rest of chunk");
                return;
            }

            let input = self.job.input_path(file_name);
            let output = self.job.output_path(file_name);
            match self.transform.transform(&input, &output, &self.params) {
                Ok(bytes) => {
                    debug!(file = %file_name, bytes, "file amplified");
                    self.tracker.increment(file_name);
                }
                Err(error) => {
                    let failure = FileFailure::new(file_name.as_str(), error);
                    self.tracker.failed(&failure);
                    self.failures.lock().push(failure);
                }
            }
        }

        debug!(chunk = chunk.index, "worker finished");
    }

    pub(crate) fn into_tally(self) -> RunTally {
        RunTally {
            processed: self.tracker.counter().value(),
            skipped: self.skipped.into_inner(),
            failures: self.failures.into_inner(),
        }
    }
}
