//! Orchestrates one run: validate, partition, fan out, join, report.

use std::fmt;
use std::fs;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{debug, error, info, info_span};

use super::cancel::CancellationToken;
use super::error::{BatchError, BatchResult, ValidationError};
use super::outcome::{RunOutcome, RunReport};
use super::partition::{detected_parallelism, partition};
use super::progress::{NullProgressReporter, ProgressReporter, ProgressTracker};
use super::worker::RunContext;
use crate::job::{Job, JobRequest};
use crate::transform::AudioTransform;

/// Where the coordinator is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RunState {
    /// Ready to accept a job.
    #[default]
    Idle,
    /// Checking the request and discovering files.
    Validating,
    /// Workers are running.
    Running,
    /// The last run finished and produced a report.
    Completed,
    /// The last run aborted with a fatal error.
    Failed,
}

impl RunState {
    /// Returns true while a run occupies the coordinator.
    pub const fn is_busy(&self) -> bool {
        matches!(self, Self::Validating | Self::Running)
    }
}

/// Runs amplification jobs against a transform backend.
///
/// One run at a time: a second [`amplify`](Self::amplify) while a run is
/// active is rejected with [`BatchError::RunInProgress`]. All run state
/// (counter, failures, cancellation) lives in a per-run context.
///
/// # Example
/// ```rust,no_run
/// use audio_amplify::{Backend, JobCoordinator, JobRequest};
///
/// let coordinator = JobCoordinator::new(Backend::Native.build(None)).worker_count(4);
/// let report = coordinator.amplify(&JobRequest::new("in", "out").gain_db(3.0))?;
/// println!("{}", report.outcome.summary());
/// # Ok::<(), audio_amplify::BatchError>(())
/// ```
pub struct JobCoordinator {
    transform: Arc<dyn AudioTransform>,
    reporter: Arc<dyn ProgressReporter>,
    worker_count: Option<usize>,
    state: Mutex<RunState>,
    active: Mutex<Option<CancellationToken>>,
}

impl JobCoordinator {
    /// Create a coordinator with no progress reporting and auto-detected
    /// parallelism.
    pub fn new(transform: Arc<dyn AudioTransform>) -> Self {
        Self {
            transform,
            reporter: Arc::new(NullProgressReporter),
            worker_count: None,
            state: Mutex::new(RunState::Idle),
            active: Mutex::new(None),
        }
    }

    /// Set the progress reporter.
    pub fn reporter<R: ProgressReporter + 'static>(self, reporter: R) -> Self {
        self.shared_reporter(Arc::new(reporter))
    }

    /// Set a progress reporter that is also held elsewhere.
    pub fn shared_reporter(mut self, reporter: Arc<dyn ProgressReporter>) -> Self {
        self.reporter = reporter;
        self
    }

    /// Use a fixed number of workers instead of the CPU count.
    ///
    /// Zero is rejected when a run starts.
    pub fn worker_count(mut self, worker_count: usize) -> Self {
        self.worker_count = Some(worker_count);
        self
    }

    /// Current lifecycle state.
    pub fn state(&self) -> RunState {
        *self.state.lock()
    }

    /// Ask the active run to stop after the files already in progress.
    ///
    /// Returns false if no run is active.
    pub fn cancel(&self) -> bool {
        match self.active.lock().as_ref() {
            Some(token) => {
                info!("cancellation requested, draining in-flight files");
                token.cancel();
                true
            }
            None => false,
        }
    }

    /// Validate `request`, then run it to completion.
    ///
    /// # Errors
    /// - [`BatchError::RunInProgress`] if another run is active
    /// - [`BatchError::Validation`] if the request is rejected; nothing is
    ///   created on disk and the state returns to [`RunState::Idle`]
    /// - any fatal error from [`run`](Self::run)
    ///
    /// Per-file failures are not errors; they are in the report's outcome.
    pub fn amplify(&self, request: &JobRequest) -> BatchResult<RunReport> {
        let workers = self.resolve_workers()?;
        let mut claim = self.claim(RunState::Validating)?;

        let job = match Job::from_request(request) {
            Ok(job) => job,
            Err(err) => {
                info!(error = %err, "job rejected");
                claim.finish(RunState::Idle);
                return Err(err.into());
            }
        };

        claim.set(RunState::Running);
        let result = self.execute(&job, workers);
        claim.finish(if result.is_ok() {
            RunState::Completed
        } else {
            RunState::Failed
        });
        result
    }

    /// Run an already validated job.
    ///
    /// # Errors
    /// [`BatchError::RunInProgress`], or a fatal error: the output folder
    /// could not be created, the worker threads could not be started or a
    /// worker panicked.
    pub fn run(&self, job: &Job) -> BatchResult<RunReport> {
        let workers = self.resolve_workers()?;
        let mut claim = self.claim(RunState::Running)?;
        let result = self.execute(job, workers);
        claim.finish(if result.is_ok() {
            RunState::Completed
        } else {
            RunState::Failed
        });
        result
    }

    fn claim(&self, next: RunState) -> BatchResult<StateClaim<'_>> {
        let mut state = self.state.lock();
        if state.is_busy() {
            return Err(BatchError::RunInProgress);
        }
        *state = next;
        Ok(StateClaim {
            state: &self.state,
            done: false,
        })
    }

    fn resolve_workers(&self) -> BatchResult<usize> {
        match self.worker_count {
            Some(0) => Err(ValidationError::InvalidWorkerCount.into()),
            Some(n) => Ok(n),
            None => Ok(detected_parallelism()),
        }
    }

    fn execute(&self, job: &Job, workers: usize) -> BatchResult<RunReport> {
        let span = info_span!("run", input = %job.input_folder().display(), backend = self.transform.name());
        let _enter = span.enter();

        if job.files().is_empty() {
            debug!("no files, nothing to do");
            return Ok(RunReport::empty());
        }

        fs::create_dir_all(job.output_folder()).map_err(|e| {
            error!(path = %job.output_folder().display(), error = %e, "cannot create output folder");
            BatchError::output_dir(job.output_folder(), e)
        })?;

        let chunks = partition(job.files(), workers);
        let total = job.files().len();
        info!(
            files = total,
            workers = chunks.len(),
            gain_db = job.gain_db(),
            bitrate = %job.bitrate(),
            format = %job.format(),
            "starting run"
        );

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(chunks.len())
            .thread_name(|i| format!("amplify-worker-{i}"))
            .build()
            .map_err(|e| BatchError::thread_pool(e.to_string()))?;

        let cancel = CancellationToken::new();
        *self.active.lock() = Some(cancel.clone());
        let _active = ActiveRun(&self.active);

        let tracker = ProgressTracker::new(total, Arc::clone(&self.reporter));
        let ctx = RunContext::new(job, &*self.transform, tracker, cancel.clone());
        self.reporter.start(total, chunks.len());

        let joined = panic::catch_unwind(AssertUnwindSafe(|| {
            pool.scope(|scope| {
                for chunk in &chunks {
                    let ctx = &ctx;
                    let chunk = *chunk;
                    scope.spawn(move |_| ctx.run_chunk(chunk));
                }
            });
        }));

        if let Err(payload) = joined {
            let message = panic_message(payload.as_ref());
            error!(%message, "worker panicked");
            return Err(BatchError::worker_panicked(message));
        }

        let elapsed = ctx.tracker().elapsed();
        let tally = ctx.into_tally();
        let report = RunReport {
            outcome: RunOutcome::from_parts(tally.failures, tally.skipped, cancel.is_cancelled()),
            total,
            processed: tally.processed,
            workers: chunks.len(),
            elapsed,
        };

        info!(
            processed = report.processed,
            failed = report.outcome.failures().len(),
            elapsed_ms = report.elapsed.as_millis() as u64,
            "run finished"
        );
        self.reporter.finish(&report);
        Ok(report)
    }
}

impl fmt::Debug for JobCoordinator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JobCoordinator")
            .field("transform", &self.transform.name())
            .field("worker_count", &self.worker_count)
            .field("state", &self.state())
            .finish()
    }
}

/// Holds the coordinator's busy state; falls back to `Failed` if dropped
/// without an explicit finish (e.g. on unwind).
struct StateClaim<'a> {
    state: &'a Mutex<RunState>,
    done: bool,
}

impl StateClaim<'_> {
    fn set(&mut self, next: RunState) {
        *self.state.lock() = next;
    }

    fn finish(&mut self, next: RunState) {
        self.set(next);
        self.done = true;
    }
}

impl Drop for StateClaim<'_> {
    fn drop(&mut self) {
        if !self.done {
            *self.state.lock() = RunState::Failed;
        }
    }
}

/// Clears the active cancellation token when the run ends.
struct ActiveRun<'a>(&'a Mutex<Option<CancellationToken>>);

impl Drop for ActiveRun<'_> {
    fn drop(&mut self) {
        self.0.lock().take();
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}
