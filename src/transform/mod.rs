//! Decode → gain → encode, behind a trait.
//!
//! The batch machinery only sees [`AudioTransform`]. Real work is done by
//! one of the backends:
//!
//! - [`NativeTransform`]: `symphonia` decode, gain on an `ndarray` matrix,
//!   `hound` WAV encode. WAV output only.
//! - [`FfmpegTransform`]: hands the whole job to an `ffmpeg` process.
//! - [`AutoTransform`]: native for WAV, ffmpeg for everything else.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;

use serde::Deserialize;
use thiserror::Error;

use crate::batch::ValidationError;
use crate::format::{AudioFormat, Bitrate};

mod decode;
mod decoded;
mod ffmpeg;
mod native;

pub use decode::decode_file;
pub use decoded::DecodedAudio;
pub use ffmpeg::FfmpegTransform;
pub use native::{NativeTransform, export_wav};

/// Result type for transform operations.
pub type TransformResult<T> = Result<T, TransformError>;

/// Errors that can occur while transforming a single file.
#[derive(Error, Debug)]
pub enum TransformError {
    /// Reading the input or writing the output failed.
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        /// File being read or written.
        path: PathBuf,
        /// The underlying error.
        source: std::io::Error,
    },

    /// The input could not be decoded.
    #[error("Failed to decode {}: {reason}", path.display())]
    Decode {
        /// Input file.
        path: PathBuf,
        /// Decoder message.
        reason: String,
    },

    /// The input has no track the decoder understands.
    #[error("No decodable audio track in {}", path.display())]
    NoAudioTrack {
        /// Input file.
        path: PathBuf,
    },

    /// The output could not be encoded.
    #[error("Failed to encode {}: {reason}", path.display())]
    Encode {
        /// Output file.
        path: PathBuf,
        /// Encoder message.
        reason: String,
    },

    /// The backend has no encoder for the requested format.
    #[error("The {backend} backend cannot encode {format} output")]
    UnsupportedFormat {
        /// Backend name.
        backend: &'static str,
        /// Requested output format.
        format: AudioFormat,
    },

    /// ffmpeg ran but reported failure.
    #[error("ffmpeg exited with {status} for {}: {stderr}", path.display())]
    Ffmpeg {
        /// Input file.
        path: PathBuf,
        /// Exit status as printed by the OS.
        status: String,
        /// Trimmed stderr output.
        stderr: String,
    },

    /// The ffmpeg executable could not be started.
    #[error("ffmpeg executable not found: {}", program.display())]
    FfmpegNotFound {
        /// Program that was attempted.
        program: PathBuf,
    },
}

impl TransformError {
    /// Create an I/O error for `path`.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Create a decode error for `path`.
    pub fn decode(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        Self::Decode {
            path: path.into(),
            reason: reason.to_string(),
        }
    }

    /// Create an encode error for `path`.
    pub fn encode(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        Self::Encode {
            path: path.into(),
            reason: reason.to_string(),
        }
    }
}

/// Parameters shared by every file of a run.
#[derive(Debug, Clone, PartialEq)]
pub struct TransformParams {
    /// Gain in decibels.
    pub gain_db: f64,
    /// Target bitrate for lossy encoders.
    pub bitrate: Bitrate,
    /// Input and output format.
    pub format: AudioFormat,
}

/// Turns one input file into one amplified output file.
///
/// Implementations must be callable from many worker threads at once and
/// must not leave a partial output behind on failure.
pub trait AudioTransform: Send + Sync {
    /// Decode `input`, apply `params.gain_db` and encode to `output`.
    ///
    /// # Returns
    /// Number of bytes written to `output`.
    fn transform(&self, input: &Path, output: &Path, params: &TransformParams)
    -> TransformResult<u64>;

    /// Short backend name for logs.
    fn name(&self) -> &'static str;
}

impl<T: AudioTransform + ?Sized> AudioTransform for Arc<T> {
    fn transform(
        &self,
        input: &Path,
        output: &Path,
        params: &TransformParams,
    ) -> TransformResult<u64> {
        (**self).transform(input, output, params)
    }

    fn name(&self) -> &'static str {
        (**self).name()
    }
}

/// Native for WAV, ffmpeg for compressed formats.
#[derive(Debug, Clone, Default)]
pub struct AutoTransform {
    native: NativeTransform,
    ffmpeg: FfmpegTransform,
}

impl AutoTransform {
    /// Create an auto transform using the given ffmpeg backend for lossy formats.
    pub fn new(ffmpeg: FfmpegTransform) -> Self {
        Self {
            native: NativeTransform,
            ffmpeg,
        }
    }
}

impl AudioTransform for AutoTransform {
    fn transform(
        &self,
        input: &Path,
        output: &Path,
        params: &TransformParams,
    ) -> TransformResult<u64> {
        match params.format {
            AudioFormat::Wav => self.native.transform(input, output, params),
            _ => self.ffmpeg.transform(input, output, params),
        }
    }

    fn name(&self) -> &'static str {
        "auto"
    }
}

/// Which transform implementation to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
pub enum Backend {
    /// Native for WAV, ffmpeg otherwise.
    #[default]
    Auto,
    /// In-process decode and WAV encode.
    Native,
    /// External ffmpeg process for every format.
    Ffmpeg,
}

impl Backend {
    /// Build the transform. `ffmpeg` overrides the ffmpeg executable path.
    pub fn build(self, ffmpeg: Option<PathBuf>) -> Arc<dyn AudioTransform> {
        let ffmpeg = ffmpeg.map(FfmpegTransform::new).unwrap_or_default();
        match self {
            Self::Auto => Arc::new(AutoTransform::new(ffmpeg)),
            Self::Native => Arc::new(NativeTransform),
            Self::Ffmpeg => Arc::new(ffmpeg),
        }
    }

    /// Whether this backend shells out to ffmpeg for `format`.
    pub const fn uses_ffmpeg(self, format: AudioFormat) -> bool {
        match self {
            Self::Auto => !matches!(format, AudioFormat::Wav),
            Self::Native => false,
            Self::Ffmpeg => true,
        }
    }
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Auto => "auto",
            Self::Native => "native",
            Self::Ffmpeg => "ffmpeg",
        })
    }
}

impl FromStr for Backend {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "auto" => Ok(Self::Auto),
            "native" => Ok(Self::Native),
            "ffmpeg" => Ok(Self::Ffmpeg),
            _ => Err(ValidationError::UnknownBackend(s.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backend_parsing() {
        assert_eq!("auto".parse::<Backend>().unwrap(), Backend::Auto);
        assert_eq!("Native".parse::<Backend>().unwrap(), Backend::Native);
        assert_eq!(" FFMPEG ".parse::<Backend>().unwrap(), Backend::Ffmpeg);
        assert!("sox".parse::<Backend>().is_err());
    }

    #[test]
    fn test_backend_names() {
        assert_eq!(Backend::Auto.build(None).name(), "auto");
        assert_eq!(Backend::Native.build(None).name(), "native");
        assert_eq!(Backend::Ffmpeg.build(None).name(), "ffmpeg");
    }

    #[test]
    fn test_backend_ffmpeg_routing() {
        assert!(!Backend::Auto.uses_ffmpeg(AudioFormat::Wav));
        assert!(Backend::Auto.uses_ffmpeg(AudioFormat::Mp3));
        assert!(!Backend::Native.uses_ffmpeg(AudioFormat::Ogg));
        assert!(Backend::Ffmpeg.uses_ffmpeg(AudioFormat::Wav));
    }

    #[test]
    fn test_auto_routes_wav_natively() {
        // A missing ffmpeg must not matter for WAV jobs.
        let auto = AutoTransform::new(FfmpegTransform::new("/definitely/not/ffmpeg"));
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("in.wav");
        let output = dir.path().join("out.wav");
        native::tests::write_test_wav(&input, &[0.1, -0.1, 0.2, -0.2], 1);

        let params = TransformParams {
            gain_db: 0.0,
            bitrate: Bitrate::default(),
            format: AudioFormat::Wav,
        };
        assert!(auto.transform(&input, &output, &params).unwrap() > 0);

        let params = TransformParams {
            format: AudioFormat::Mp3,
            ..params
        };
        assert!(matches!(
            auto.transform(&input, &dir.path().join("out.mp3"), &params),
            Err(TransformError::FfmpegNotFound { .. })
        ));
    }
}
