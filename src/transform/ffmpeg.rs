use std::ffi::{OsStr, OsString};
use std::fs;
use std::io::ErrorKind;
#[cfg(unix)]
use std::os::unix::process::CommandExt;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use tempfile::TempDir;
use tracing::debug;

use super::{AudioTransform, TransformError, TransformParams, TransformResult};
use crate::format::AudioFormat;

const DEFAULT_PROGRAM: &str = "ffmpeg";
const STDERR_LIMIT: usize = 2048;
const STAGING_PREFIX: &str = ".amplify-";

/// Backend that runs one `ffmpeg` process per file.
///
/// Gain is applied with the `volume` filter; the bitrate goes to `-b:a` for
/// lossy formats. ffmpeg writes into a staging directory next to the output
/// and the result is renamed into place only on success, so the output may
/// be the input file itself and a failed run never touches either.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FfmpegTransform {
    program: PathBuf,
}

impl Default for FfmpegTransform {
    fn default() -> Self {
        Self::new(DEFAULT_PROGRAM)
    }
}

impl FfmpegTransform {
    /// Use the given ffmpeg executable (name on `PATH` or full path).
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    /// The executable this backend runs.
    pub fn program(&self) -> &Path {
        &self.program
    }

    /// Returns true if `ffmpeg -version` runs successfully.
    pub fn is_available(&self) -> bool {
        self.command()
            .arg("-version")
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .is_ok_and(|status| status.success())
    }

    /// Arguments for one conversion, excluding the program itself.
    ///
    /// Paths are passed through as-is, so non UTF-8 names survive.
    pub fn arguments(
        &self,
        input: &Path,
        output: &Path,
        params: &TransformParams,
    ) -> Vec<OsString> {
        let mut args: Vec<OsString> = ["-hide_banner", "-nostdin", "-loglevel", "error", "-y", "-i"]
            .into_iter()
            .map(OsString::from)
            .collect();
        args.push(input.as_os_str().to_owned());
        args.push(OsString::from("-vn"));
        args.push(OsString::from("-filter:a"));
        args.push(OsString::from(format!("volume={}dB", params.gain_db)));

        let (codec, muxer) = codec_and_muxer(params.format);
        args.push(OsString::from("-c:a"));
        args.push(OsString::from(codec));
        if params.format.is_lossy() {
            args.push(OsString::from("-b:a"));
            args.push(OsString::from(params.bitrate.as_ffmpeg_arg()));
        }
        args.push(OsString::from("-f"));
        args.push(OsString::from(muxer));
        args.push(output.as_os_str().to_owned());
        args
    }

    fn command(&self) -> Command {
        let mut command = Command::new(&self.program);
        command.stdin(Stdio::null());
        // own process group: a terminal Ctrl-C only reaches the coordinator
        #[cfg(unix)]
        command.process_group(0);
        command
    }
}

fn codec_and_muxer(format: AudioFormat) -> (&'static str, &'static str) {
    match format {
        AudioFormat::Mp3 => ("libmp3lame", "mp3"),
        AudioFormat::Ogg => ("libvorbis", "ogg"),
        AudioFormat::M4a => ("aac", "ipod"),
        AudioFormat::Wav => ("pcm_s16le", "wav"),
    }
}

/// Hidden directory beside `output`, removed when dropped.
fn staging_dir(output: &Path) -> TransformResult<TempDir> {
    let parent = output
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    tempfile::Builder::new()
        .prefix(STAGING_PREFIX)
        .tempdir_in(parent)
        .map_err(|e| TransformError::io(parent, e))
}

fn truncate_stderr(raw: &[u8]) -> String {
    let mut stderr = String::from_utf8_lossy(raw).trim().to_string();
    if stderr.len() > STDERR_LIMIT {
        let mut cut = STDERR_LIMIT;
        while !stderr.is_char_boundary(cut) {
            cut -= 1;
        }
        stderr.truncate(cut);
    }
    stderr
}

impl AudioTransform for FfmpegTransform {
    fn transform(
        &self,
        input: &Path,
        output: &Path,
        params: &TransformParams,
    ) -> TransformResult<u64> {
        let staging = staging_dir(output)?;
        let staged = staging
            .path()
            .join(output.file_name().unwrap_or_else(|| OsStr::new("output")));

        let args = self.arguments(input, &staged, params);
        debug!(program = %self.program.display(), ?args, "running ffmpeg");

        let result = self
            .command()
            .args(&args)
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .output();

        let out = match result {
            Ok(out) => out,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(TransformError::FfmpegNotFound {
                    program: self.program.clone(),
                });
            }
            Err(e) => return Err(TransformError::io(&self.program, e)),
        };

        if !out.status.success() {
            return Err(TransformError::Ffmpeg {
                path: input.to_path_buf(),
                status: out.status.to_string(),
                stderr: truncate_stderr(&out.stderr),
            });
        }

        fs::rename(&staged, output).map_err(|e| TransformError::io(output, e))?;
        fs::metadata(output)
            .map(|m| m.len())
            .map_err(|e| TransformError::io(output, e))
    }

    fn name(&self) -> &'static str {
        "ffmpeg"
    }
}
