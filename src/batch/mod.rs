//! Parallel batch amplification.
//!
//! A run partitions the job's files into contiguous chunks, gives each
//! chunk to its own worker thread and waits for all of them. Any file that
//! fails is recorded and skipped; the run itself only fails for problems
//! outside the per-file loop.

mod cancel;
mod coordinator;
mod error;
mod outcome;
mod partition;
pub mod progress;
mod worker;

#[cfg(test)]
pub(crate) mod test_support;

pub use cancel::CancellationToken;
pub use coordinator::{JobCoordinator, RunState};
pub use error::{BatchError, BatchResult, FileFailure, ValidationError};
pub use outcome::{RunOutcome, RunReport};
pub use partition::{Chunk, chunk_size, detected_parallelism, partition};
pub use progress::{ProgressCounter, ProgressInfo, ProgressReporter, ProgressTracker};
