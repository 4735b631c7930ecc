//! Error types and result utilities for the crate surface.

use std::path::PathBuf;

use thiserror::Error;

use crate::batch::{BatchError, ValidationError};
use crate::transform::TransformError;

/// Convenience type alias for results that may contain AmplifyError
pub type AmplifyResult<T> = Result<T, AmplifyError>;

/// Top-level error type returned by the public API and the CLI.
#[derive(Error, Debug)]
pub enum AmplifyError {
    /// A run was rejected or aborted.
    ///
    /// Per-file failures never show up here; they are part of the
    /// [`RunOutcome`](crate::RunOutcome) of a completed run.
    #[error(transparent)]
    Batch(#[from] BatchError),

    /// A single transform invoked outside of a batch run failed.
    #[error(transparent)]
    Transform(#[from] TransformError),

    /// The configuration file could not be read.
    #[error("Failed to read config file {}: {source}", path.display())]
    ConfigIo {
        /// Path of the configuration file.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// The configuration file is not valid TOML for [`AmplifyConfig`](crate::AmplifyConfig).
    #[error("Invalid config file {}: {source}", path.display())]
    ConfigParse {
        /// Path of the configuration file.
        path: PathBuf,
        /// The underlying parse error.
        source: toml::de::Error,
    },
}

impl From<ValidationError> for AmplifyError {
    fn from(err: ValidationError) -> Self {
        Self::Batch(BatchError::Validation(err))
    }
}

impl AmplifyError {
    /// Returns true if the error was raised before any work started.
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Batch(err) if err.is_validation())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    #[test]
    fn test_validation_classification() {
        let rejected: AmplifyError = ValidationError::MissingInputFolder.into();
        assert!(rejected.is_validation());

        assert!(!AmplifyError::from(BatchError::RunInProgress).is_validation());
        assert!(!AmplifyError::from(BatchError::worker_panicked("boom")).is_validation());
        assert!(
            !AmplifyError::from(TransformError::decode(Path::new("a.mp3"), "bad")).is_validation()
        );
    }
}
