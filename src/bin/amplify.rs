//! `amplify`: batch-amplify every file with a given extension in a folder.
//!
//! ```text
//! amplify -i ./raw -o ./loud --gain-db 6 --bitrate 192k --extension .mp3
//! ```
//!
//! Ctrl-C stops scheduling new files and waits for the ones in progress;
//! a second Ctrl-C exits immediately.

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use audio_amplify::batch::progress::{LogProgressReporter, ProgressBarReporter};
use audio_amplify::transform::FfmpegTransform;
use audio_amplify::{
    AmplifyConfig, AmplifyError, AmplifyResult, AudioFormat, Backend, Bitrate, JobCoordinator,
    ProgressReporter, RunOutcome, RunReport,
};
use clap::{ArgAction, Parser};
use colored::Colorize;
use tracing::warn;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(author, version, about = "Batch-amplify audio files in a folder", long_about = None)]
struct Cli {
    /// Folder containing the files to amplify
    #[arg(short, long)]
    input: Option<PathBuf>,

    /// Folder receiving the amplified files (created if missing)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Amplification in dB; negative values attenuate
    #[arg(short, long = "gain-db", allow_hyphen_values = true)]
    gain_db: Option<f64>,

    /// Encoder bitrate, e.g. 192k
    #[arg(short, long)]
    bitrate: Option<Bitrate>,

    /// File extension to process: .mp3, .ogg, .m4a or .wav
    #[arg(short, long)]
    extension: Option<AudioFormat>,

    /// Worker threads [default: number of CPUs]
    #[arg(short = 'j', long)]
    workers: Option<usize>,

    /// Transform backend
    #[arg(long, value_enum)]
    backend: Option<Backend>,

    /// Path of the ffmpeg executable
    #[arg(long, env = "AMPLIFY_FFMPEG")]
    ffmpeg: Option<PathBuf>,

    /// TOML file with defaults for any of the options above
    #[arg(short, long, env = "AMPLIFY_CONFIG")]
    config: Option<PathBuf>,

    /// Do not draw a progress bar
    #[arg(long)]
    no_progress: bool,

    /// More log output (repeatable)
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,

    /// Only print errors
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,
}

impl Cli {
    fn as_config(&self) -> AmplifyConfig {
        AmplifyConfig {
            input_folder: self.input.clone(),
            output_folder: self.output.clone(),
            gain_db: self.gain_db,
            bitrate: self.bitrate.clone(),
            extension: self.extension,
            workers: self.workers,
            backend: self.backend,
            ffmpeg: self.ffmpeg.clone(),
            progress: (self.no_progress || self.quiet).then_some(false),
        }
    }
}

fn init_tracing(verbose: u8, quiet: bool) {
    let explicit = match (quiet, verbose) {
        (true, _) => Some("error"),
        (false, 0) => None,
        (false, 1) => Some("info"),
        (false, 2) => Some("debug"),
        _ => Some("trace"),
    };
    let filter = match explicit {
        Some(level) => EnvFilter::new(level),
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn install_interrupt_handler(coordinator: Arc<JobCoordinator>) {
    let interrupted = AtomicBool::new(false);
    let result = ctrlc::set_handler(move || {
        if interrupted.swap(true, Ordering::SeqCst) || !coordinator.cancel() {
            std::process::exit(130);
        }
        eprintln!("{}", "Interrupted, finishing files in progress...".yellow());
    });
    if let Err(err) = result {
        warn!(error = %err, "could not install Ctrl-C handler");
    }
}

fn run(cli: &Cli) -> AmplifyResult<RunReport> {
    let file_layer = match &cli.config {
        Some(path) => AmplifyConfig::load(path)?,
        None => AmplifyConfig::default(),
    };
    let config = file_layer.merge(cli.as_config());
    let request = config.to_request();
    let backend = config.backend_or_default();

    if backend.uses_ffmpeg(request.format) {
        let ffmpeg = config
            .ffmpeg
            .clone()
            .map(FfmpegTransform::new)
            .unwrap_or_default();
        if !ffmpeg.is_available() {
            warn!(
                program = %ffmpeg.program().display(),
                "ffmpeg does not seem to be runnable; {} files will fail",
                request.format
            );
        }
    }

    let reporter: Arc<dyn ProgressReporter> = if config.progress_enabled() {
        Arc::new(ProgressBarReporter::new())
    } else {
        Arc::new(LogProgressReporter)
    };

    let mut coordinator =
        JobCoordinator::new(backend.build(config.ffmpeg.clone())).shared_reporter(reporter);
    if let Some(workers) = config.workers {
        coordinator = coordinator.worker_count(workers);
    }
    let coordinator = Arc::new(coordinator);
    install_interrupt_handler(Arc::clone(&coordinator));

    Ok(coordinator.amplify(&request)?)
}

fn print_report(report: &RunReport) {
    let timing = format!(
        "{}/{} file(s) in {:.2}s on {} worker(s)",
        report.processed,
        report.total,
        report.elapsed.as_secs_f64(),
        report.workers
    );

    match &report.outcome {
        RunOutcome::Success => {
            println!("{} {}", report.outcome.summary().green().bold(), timing);
        }
        RunOutcome::PartialFailure(failures) | RunOutcome::Cancelled { failures, .. } => {
            println!("{} {}", report.outcome.summary().yellow().bold(), timing);
            for failure in failures {
                println!("  {} {}", "✘".red(), failure);
            }
        }
    }
}

/// Process exit status: 0 when every file was amplified, 2 when the job or
/// its config file was rejected before any work, 1 for everything else.
fn exit_status(result: &AmplifyResult<RunReport>) -> u8 {
    match result {
        Ok(report) if report.outcome.is_success() => 0,
        Ok(_) => 1,
        Err(err) if err.is_validation() || matches!(err, AmplifyError::ConfigParse { .. }) => 2,
        Err(_) => 1,
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.quiet);

    let result = run(&cli);
    match &result {
        Ok(report) => print_report(report),
        Err(err) => eprintln!("{} {err}", "error:".red().bold()),
    }
    ExitCode::from(exit_status(&result))
}

#[cfg(test)]
mod tests {
    use super::*;
    use audio_amplify::{BatchError, FileFailure, TransformError, ValidationError};
    use std::path::Path;
    use std::time::Duration;

    fn report(outcome: RunOutcome) -> AmplifyResult<RunReport> {
        Ok(RunReport {
            outcome,
            total: 2,
            processed: 1,
            workers: 1,
            elapsed: Duration::from_millis(5),
        })
    }

    fn failure() -> FileFailure {
        FileFailure::new("b.mp3", TransformError::decode(Path::new("b.mp3"), "bad header"))
    }

    #[test]
    fn test_exit_status_for_outcomes() {
        assert_eq!(exit_status(&report(RunOutcome::Success)), 0);
        assert_eq!(exit_status(&report(RunOutcome::PartialFailure(vec![failure()]))), 1);
        assert_eq!(
            exit_status(&report(RunOutcome::Cancelled {
                skipped: 1,
                failures: Vec::new(),
            })),
            1
        );
    }

    #[test]
    fn test_exit_status_for_errors() {
        let rejected: AmplifyError = ValidationError::MissingInputFolder.into();
        assert_eq!(exit_status(&Err(rejected)), 2);

        let bad_config = AmplifyConfig::from_toml("gain = 3.0", Path::new("amplify.toml"))
            .expect_err("unknown key");
        assert_eq!(exit_status(&Err(bad_config)), 2);

        let missing_config = AmplifyConfig::load(Path::new("/no/such/amplify.toml"))
            .expect_err("missing file");
        assert_eq!(exit_status(&Err(missing_config)), 1);

        let fatal = AmplifyError::from(BatchError::worker_panicked("boom"));
        assert_eq!(exit_status(&Err(fatal)), 1);
    }

    #[test]
    fn test_flags_become_config() {
        let cli = Cli::try_parse_from([
            "amplify", "-i", "raw", "-o", "loud", "--gain-db", "-3.5", "-b", "320K", "-e", "OGG",
            "-j", "3", "--backend", "native",
        ])
        .unwrap();
        let config = cli.as_config();

        assert_eq!(config.input_folder, Some(PathBuf::from("raw")));
        assert_eq!(config.output_folder, Some(PathBuf::from("loud")));
        assert_eq!(config.gain_db, Some(-3.5));
        assert_eq!(config.bitrate.as_ref().map(Bitrate::as_ffmpeg_arg), Some("320k"));
        assert_eq!(config.extension, Some(AudioFormat::Ogg));
        assert_eq!(config.workers, Some(3));
        assert_eq!(config.backend, Some(Backend::Native));
        assert_eq!(config.progress, None);
    }

    #[test]
    fn test_quiet_and_no_progress_disable_the_bar() {
        for flag in ["--quiet", "--no-progress"] {
            let cli = Cli::try_parse_from(["amplify", flag]).unwrap();
            assert!(!cli.as_config().progress_enabled(), "{flag}");
        }
        let cli = Cli::try_parse_from(["amplify"]).unwrap();
        assert!(cli.as_config().progress_enabled());
    }

    #[test]
    fn test_flags_override_config_file() {
        let file = AmplifyConfig::from_toml(
            "input_folder = \"from-file\"\ngain_db = 1.0\nprogress = true",
            Path::new("amplify.toml"),
        )
        .unwrap();
        let cli = Cli::try_parse_from(["amplify", "--gain-db", "9", "-q"]).unwrap();

        let merged = file.merge(cli.as_config());
        assert_eq!(merged.input_folder, Some(PathBuf::from("from-file")));
        assert_eq!(merged.gain_db, Some(9.0));
        assert!(!merged.progress_enabled());
    }

    #[test]
    fn test_rejects_bad_values() {
        assert!(Cli::try_parse_from(["amplify", "-b", "fast"]).is_err());
        assert!(Cli::try_parse_from(["amplify", "-e", ".flac"]).is_err());
        assert!(Cli::try_parse_from(["amplify", "-q", "-v"]).is_err());
    }
}
