use std::time::Duration;

use super::error::FileFailure;

/// Terminal result of a run, produced once after every worker has joined.
#[derive(Debug)]
pub enum RunOutcome {
    /// Every file was amplified.
    Success,
    /// Some files failed; the others were written.
    PartialFailure(Vec<FileFailure>),
    /// The run was cancelled; files already started were finished.
    Cancelled {
        /// Files that were never started.
        skipped: usize,
        /// Files that failed before the cancellation took effect.
        failures: Vec<FileFailure>,
    },
}

impl RunOutcome {
    /// Build the outcome from what the workers collected.
    pub(crate) fn from_parts(failures: Vec<FileFailure>, skipped: usize, cancelled: bool) -> Self {
        if cancelled && skipped > 0 {
            Self::Cancelled { skipped, failures }
        } else if failures.is_empty() {
            Self::Success
        } else {
            Self::PartialFailure(failures)
        }
    }

    /// Returns true if every file was amplified.
    pub const fn is_success(&self) -> bool {
        matches!(self, Self::Success)
    }

    /// Failed files, in no particular order across chunks.
    pub fn failures(&self) -> &[FileFailure] {
        match self {
            Self::Success => &[],
            Self::PartialFailure(failures) | Self::Cancelled { failures, .. } => failures,
        }
    }

    /// One-line, user-facing description.
    pub fn summary(&self) -> String {
        match self {
            Self::Success => "Amplification complete!".to_string(),
            Self::PartialFailure(failures) => {
                format!("Amplification finished with {} failed file(s)", failures.len())
            }
            Self::Cancelled { skipped, failures } => format!(
                "Amplification cancelled: {skipped} file(s) skipped, {} failed",
                failures.len()
            ),
        }
    }
}

/// Everything the front end needs to report a completed run.
#[derive(Debug)]
pub struct RunReport {
    /// How the run ended.
    pub outcome: RunOutcome,
    /// Files discovered for the run.
    pub total: usize,
    /// Files amplified successfully; the final progress counter value.
    pub processed: usize,
    /// Worker threads used.
    pub workers: usize,
    /// Wall-clock duration of the run.
    pub elapsed: Duration,
}

impl RunReport {
    /// Report for a run that had nothing to do.
    pub(crate) fn empty() -> Self {
        Self {
            outcome: RunOutcome::Success,
            total: 0,
            processed: 0,
            workers: 0,
            elapsed: Duration::ZERO,
        }
    }
}
