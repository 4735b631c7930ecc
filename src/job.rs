//! Job description and input discovery.
//!
//! A [`JobRequest`] is what the user filled in; a [`Job`] is the validated,
//! immutable snapshot a run works from, including the discovered file list.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::batch::ValidationError;
use crate::format::{AudioFormat, Bitrate};

/// Unvalidated user input for one amplification run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct JobRequest {
    /// Folder scanned for input files. Empty means "not selected".
    pub input_folder: PathBuf,
    /// Folder receiving the amplified files. Empty means "not selected".
    pub output_folder: PathBuf,
    /// Gain applied to every file, in decibels.
    pub gain_db: f64,
    /// Encoder bitrate for lossy formats.
    pub bitrate: Bitrate,
    /// Format used both to select inputs and to encode outputs.
    pub format: AudioFormat,
}

impl JobRequest {
    /// Create a request with zero gain and default bitrate and format.
    pub fn new(input_folder: impl Into<PathBuf>, output_folder: impl Into<PathBuf>) -> Self {
        Self {
            input_folder: input_folder.into(),
            output_folder: output_folder.into(),
            ..Default::default()
        }
    }

    /// Set the gain in decibels.
    pub fn gain_db(mut self, gain_db: f64) -> Self {
        self.gain_db = gain_db;
        self
    }

    /// Set the encoder bitrate.
    pub fn bitrate(mut self, bitrate: Bitrate) -> Self {
        self.bitrate = bitrate;
        self
    }

    /// Set the input/output format.
    pub fn format(mut self, format: AudioFormat) -> Self {
        self.format = format;
        self
    }
}

/// A validated job. Immutable once a run starts.
#[derive(Debug, Clone, PartialEq)]
pub struct Job {
    input_folder: PathBuf,
    output_folder: PathBuf,
    gain_db: f64,
    bitrate: Bitrate,
    format: AudioFormat,
    files: Vec<String>,
}

impl Job {
    /// Validate a request and discover its input files.
    ///
    /// Checks run cheapest first; an unset input folder is rejected without
    /// touching the filesystem.
    ///
    /// # Errors
    /// Any [`ValidationError`]; nothing is created on disk in either case.
    pub fn from_request(request: &JobRequest) -> Result<Self, ValidationError> {
        if request.input_folder.as_os_str().is_empty() {
            return Err(ValidationError::MissingInputFolder);
        }
        if request.output_folder.as_os_str().is_empty() {
            return Err(ValidationError::MissingOutputFolder);
        }
        if !request.gain_db.is_finite() {
            return Err(ValidationError::InvalidGain(request.gain_db));
        }

        let files = discover_files(&request.input_folder, request.format).map_err(|source| {
            ValidationError::InputFolderUnreadable {
                path: request.input_folder.clone(),
                source,
            }
        })?;

        if files.is_empty() {
            return Err(ValidationError::NoMatchingFiles {
                folder: request.input_folder.clone(),
                extension: request.format.dotted(),
            });
        }

        Ok(Self {
            input_folder: request.input_folder.clone(),
            output_folder: request.output_folder.clone(),
            gain_db: request.gain_db,
            bitrate: request.bitrate.clone(),
            format: request.format,
            files,
        })
    }

    /// Folder the inputs are read from.
    pub fn input_folder(&self) -> &Path {
        &self.input_folder
    }

    /// Folder the outputs are written to.
    pub fn output_folder(&self) -> &Path {
        &self.output_folder
    }

    /// Gain in decibels.
    pub const fn gain_db(&self) -> f64 {
        self.gain_db
    }

    /// Encoder bitrate.
    pub const fn bitrate(&self) -> &Bitrate {
        &self.bitrate
    }

    /// Input and output format.
    pub const fn format(&self) -> AudioFormat {
        self.format
    }

    /// Discovered file names, sorted.
    pub fn files(&self) -> &[String] {
        &self.files
    }

    /// Full path of an input file.
    pub fn input_path(&self, file_name: &str) -> PathBuf {
        self.input_folder.join(file_name)
    }

    /// Full path of the output for an input file; the file name is kept.
    pub fn output_path(&self, file_name: &str) -> PathBuf {
        self.output_folder.join(file_name)
    }
}

/// List regular files directly under `folder` whose name ends with the
/// format's extension (case-insensitive). The result is sorted by name.
///
/// Symlinks are followed. Names that are not valid UTF-8 are skipped.
///
/// # Errors
/// Returns the I/O error if `folder` cannot be listed.
pub fn discover_files(folder: &Path, format: AudioFormat) -> io::Result<Vec<String>> {
    let mut files = Vec::new();

    for entry in fs::read_dir(folder)? {
        let entry = entry?;
        let Some(name) = entry.file_name().to_str().map(str::to_owned) else {
            debug!(path = %entry.path().display(), "skipping non UTF-8 file name");
            continue;
        };
        if !format.matches_file_name(&name) {
            continue;
        }
        match fs::metadata(entry.path()) {
            Ok(meta) if meta.is_file() => files.push(name),
            Ok(_) => {}
            Err(err) => debug!(file = %name, error = %err, "skipping unreadable entry"),
        }
    }

    files.sort();
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;

    fn touch(dir: &Path, name: &str) {
        File::create(dir.join(name)).unwrap();
    }

    #[test]
    fn test_discover_filters_by_extension() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "c.mp3");
        touch(dir.path(), "a.MP3");
        touch(dir.path(), "b.wav");
        touch(dir.path(), "notes.txt");
        fs::create_dir(dir.path().join("folder.mp3")).unwrap();

        let files = discover_files(dir.path(), AudioFormat::Mp3).unwrap();
        assert_eq!(files, vec!["a.MP3".to_string(), "c.mp3".to_string()]);

        let files = discover_files(dir.path(), AudioFormat::Wav).unwrap();
        assert_eq!(files, vec!["b.wav".to_string()]);
    }

    #[test]
    fn test_discover_is_not_recursive() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join("nested")).unwrap();
        touch(&dir.path().join("nested"), "deep.mp3");
        touch(dir.path(), "top.mp3");

        let files = discover_files(dir.path(), AudioFormat::Mp3).unwrap();
        assert_eq!(files, vec!["top.mp3".to_string()]);
    }

    #[test]
    fn test_missing_input_folder() {
        let request = JobRequest::new("", "out");
        assert!(matches!(
            Job::from_request(&request),
            Err(ValidationError::MissingInputFolder)
        ));
    }

    #[test]
    fn test_missing_output_folder() {
        let dir = tempfile::tempdir().unwrap();
        let request = JobRequest::new(dir.path(), "");
        assert!(matches!(
            Job::from_request(&request),
            Err(ValidationError::MissingOutputFolder)
        ));
    }

    #[test]
    fn test_non_finite_gain_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let request = JobRequest::new(dir.path(), "out").gain_db(f64::NAN);
        assert!(matches!(
            Job::from_request(&request),
            Err(ValidationError::InvalidGain(_))
        ));
    }

    #[test]
    fn test_unreadable_input_folder() {
        let dir = tempfile::tempdir().unwrap();
        let request = JobRequest::new(dir.path().join("does-not-exist"), "out");
        assert!(matches!(
            Job::from_request(&request),
            Err(ValidationError::InputFolderUnreadable { .. })
        ));
    }

    #[test]
    fn test_no_matching_files() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "a.wav");
        let request = JobRequest::new(dir.path(), dir.path().join("out")).format(AudioFormat::Ogg);

        match Job::from_request(&request) {
            Err(ValidationError::NoMatchingFiles { extension, .. }) => assert_eq!(extension, ".ogg"),
            other => panic!("expected NoMatchingFiles, got {other:?}"),
        }
    }

    #[test]
    fn test_job_paths_keep_file_name() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "take1.wav");
        let out = dir.path().join("out");
        let request = JobRequest::new(dir.path(), &out)
            .gain_db(-3.0)
            .format(AudioFormat::Wav);

        let job = Job::from_request(&request).unwrap();
        assert_eq!(job.files(), ["take1.wav".to_string()]);
        assert_eq!(job.input_path("take1.wav"), dir.path().join("take1.wav"));
        assert_eq!(job.output_path("take1.wav"), out.join("take1.wav"));
        assert_eq!(job.gain_db(), -3.0);
    }
}
