//! Layered run configuration.
//!
//! Values come from three places, later ones winning: built-in defaults, a
//! TOML file, and command-line flags. Every field is optional so layers can
//! be merged field by field.
//!
//! ```toml
//! input_folder = "/music/raw"
//! output_folder = "/music/loud"
//! gain_db = 6.0
//! bitrate = "192k"
//! extension = ".mp3"
//! workers = 4
//! backend = "auto"
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::{AmplifyError, AmplifyResult};
use crate::format::{AudioFormat, Bitrate};
use crate::job::JobRequest;
use crate::transform::Backend;

/// One layer of configuration.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AmplifyConfig {
    /// Folder scanned for input files.
    pub input_folder: Option<PathBuf>,
    /// Folder receiving the amplified files.
    pub output_folder: Option<PathBuf>,
    /// Gain in decibels.
    pub gain_db: Option<f64>,
    /// Encoder bitrate, e.g. `"192k"`.
    pub bitrate: Option<Bitrate>,
    /// Input/output extension, e.g. `".mp3"`.
    pub extension: Option<AudioFormat>,
    /// Worker threads; defaults to the CPU count.
    pub workers: Option<usize>,
    /// Transform backend.
    pub backend: Option<Backend>,
    /// Path of the ffmpeg executable.
    pub ffmpeg: Option<PathBuf>,
    /// Whether to draw a progress bar.
    pub progress: Option<bool>,
}

impl AmplifyConfig {
    /// Read a configuration layer from a TOML file.
    ///
    /// # Errors
    /// [`AmplifyError::ConfigIo`] or [`AmplifyError::ConfigParse`].
    pub fn load(path: &Path) -> AmplifyResult<Self> {
        let text = fs::read_to_string(path).map_err(|source| AmplifyError::ConfigIo {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&text, path)
    }

    /// Parse a configuration layer; `origin` is only used in error messages.
    ///
    /// # Errors
    /// [`AmplifyError::ConfigParse`] if the text is not valid for this type.
    pub fn from_toml(text: &str, origin: &Path) -> AmplifyResult<Self> {
        toml::from_str(text).map_err(|source| AmplifyError::ConfigParse {
            path: origin.to_path_buf(),
            source,
        })
    }

    /// Overlay `other` on top of `self`; fields set in `other` win.
    pub fn merge(self, other: AmplifyConfig) -> AmplifyConfig {
        AmplifyConfig {
            input_folder: other.input_folder.or(self.input_folder),
            output_folder: other.output_folder.or(self.output_folder),
            gain_db: other.gain_db.or(self.gain_db),
            bitrate: other.bitrate.or(self.bitrate),
            extension: other.extension.or(self.extension),
            workers: other.workers.or(self.workers),
            backend: other.backend.or(self.backend),
            ffmpeg: other.ffmpeg.or(self.ffmpeg),
            progress: other.progress.or(self.progress),
        }
    }

    /// Set the input folder.
    pub fn input_folder(mut self, path: impl Into<PathBuf>) -> Self {
        self.input_folder = Some(path.into());
        self
    }

    /// Set the output folder.
    pub fn output_folder(mut self, path: impl Into<PathBuf>) -> Self {
        self.output_folder = Some(path.into());
        self
    }

    /// Set the gain in decibels.
    pub fn gain_db(mut self, gain_db: f64) -> Self {
        self.gain_db = Some(gain_db);
        self
    }

    /// Set the worker count.
    pub fn workers(mut self, workers: usize) -> Self {
        self.workers = Some(workers);
        self
    }

    /// Set the backend.
    pub fn backend(mut self, backend: Backend) -> Self {
        self.backend = Some(backend);
        self
    }

    /// The job request described by this configuration. Unset folders stay
    /// empty so that validation reports them.
    pub fn to_request(&self) -> JobRequest {
        JobRequest {
            input_folder: self.input_folder.clone().unwrap_or_default(),
            output_folder: self.output_folder.clone().unwrap_or_default(),
            gain_db: self.gain_db.unwrap_or(0.0),
            bitrate: self.bitrate.clone().unwrap_or_default(),
            format: self.extension.unwrap_or_default(),
        }
    }

    /// Backend, defaulting to [`Backend::Auto`].
    pub fn backend_or_default(&self) -> Backend {
        self.backend.unwrap_or_default()
    }

    /// Whether a progress bar should be drawn (default: yes).
    pub fn progress_enabled(&self) -> bool {
        self.progress.unwrap_or(true)
    }
}
