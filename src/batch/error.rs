//! Error types for batch amplification runs.

use std::path::PathBuf;

use thiserror::Error;

use crate::transform::TransformError;

/// Result type for batch operations.
pub type BatchResult<T> = Result<T, BatchError>;

/// Reasons a job is rejected before any work starts.
#[derive(Error, Debug)]
pub enum ValidationError {
    /// No input folder was selected.
    #[error("Please select an input folder")]
    MissingInputFolder,

    /// No output folder was selected.
    #[error("Please select an output folder")]
    MissingOutputFolder,

    /// The input folder contains no file with the selected extension.
    #[error("No {extension} files found in {}", folder.display())]
    NoMatchingFiles {
        /// Folder that was scanned.
        folder: PathBuf,
        /// Dotted extension that was searched for.
        extension: &'static str,
    },

    /// The input folder could not be listed.
    #[error("Cannot read input folder {}: {source}", path.display())]
    InputFolderUnreadable {
        /// Folder that was scanned.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// The gain is NaN or infinite.
    #[error("Invalid amplification: {0} dB")]
    InvalidGain(f64),

    /// The bitrate is not of the form `<digits>[k|m]`.
    #[error("Invalid bitrate {0:?}, expected something like \"192k\"")]
    InvalidBitrate(String),

    /// The extension is not one of the supported formats.
    #[error("Unsupported file extension {0:?}, expected one of .mp3, .ogg, .m4a, .wav")]
    UnsupportedExtension(String),

    /// The backend name is unknown.
    #[error("Unknown backend {0:?}, expected auto, native or ffmpeg")]
    UnknownBackend(String),

    /// The worker count is zero.
    #[error("Worker count must be at least 1")]
    InvalidWorkerCount,
}

/// Errors that can occur while running a batch.
///
/// Failures of individual files are not errors at this level; they are
/// collected into the run's [`RunOutcome`](super::RunOutcome).
#[derive(Error, Debug)]
pub enum BatchError {
    /// The job was rejected before any work started.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Another run is still active on this coordinator.
    #[error("An amplification run is already in progress")]
    RunInProgress,

    /// The output folder could not be created.
    #[error("Cannot create output folder {}: {source}", path.display())]
    OutputDir {
        /// Folder that was being created.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// The worker thread pool could not be created.
    #[error("Failed to start worker threads: {message}")]
    ThreadPool {
        /// Pool builder message.
        message: String,
    },

    /// A worker thread panicked.
    #[error("A worker thread panicked: {message}")]
    WorkerPanicked {
        /// Panic payload, if it was a string.
        message: String,
    },
}

impl BatchError {
    /// Create a new output directory error.
    pub fn output_dir(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::OutputDir {
            path: path.into(),
            source,
        }
    }

    /// Create a new thread pool error.
    pub fn thread_pool(message: impl Into<String>) -> Self {
        Self::ThreadPool {
            message: message.into(),
        }
    }

    /// Create a new worker panic error.
    pub fn worker_panicked(message: impl Into<String>) -> Self {
        Self::WorkerPanicked {
            message: message.into(),
        }
    }

    /// Returns true if the run never started.
    pub const fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }
}

/// A file that could not be amplified, with the reason.
#[derive(Debug)]
pub struct FileFailure {
    /// Input file name, relative to the input folder.
    pub file_name: String,
    /// What went wrong.
    pub error: TransformError,
}

impl FileFailure {
    /// Create a new failure record.
    pub fn new(file_name: impl Into<String>, error: TransformError) -> Self {
        Self {
            file_name: file_name.into(),
            error,
        }
    }
}

impl std::fmt::Display for FileFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.file_name, self.error)
    }
}
