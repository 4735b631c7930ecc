// Correctness and logic
#![warn(clippy::unit_cmp)] // Detects comparing unit types
#![warn(clippy::match_same_arms)]
// Duplicate match arms

// Performance-focused
#![warn(clippy::inefficient_to_string)] // `format!("{}", x)` vs `x.to_string()`
#![warn(clippy::map_clone)] // Cloning inside `map()` unnecessarily
#![warn(clippy::unnecessary_to_owned)] // Detects redundant `.to_owned()` or `.clone()`
#![warn(clippy::needless_collect)] // Avoids `.collect().iter()` chains

// Style and idiomatic Rust
#![warn(clippy::redundant_clone)] // Detects unnecessary `.clone()`
#![warn(clippy::needless_return)] // Avoids `return` at the end of functions
#![warn(clippy::manual_map)] // Use `.map()` instead of manual `match`
#![warn(clippy::unwrap_used)] // Avoids using `unwrap()`

// Maintainability
#![warn(clippy::missing_panics_doc)] // Docs for functions that might panic
#![deny(missing_docs)] // Documentation is a must for release

//! # audio_amplify
//!
//! Batch amplification of audio files: every file with a given extension in
//! an input folder is decoded, boosted (or attenuated) by a fixed gain in
//! decibels and re-encoded into an output folder at a chosen bitrate.
//!
//! ## Overview
//!
//! A run is a fixed fan-out. The discovered files are split into contiguous
//! chunks, one worker thread per chunk, and each worker transforms its files
//! in order. A shared progress counter is bumped after every successful
//! file, failures are collected per file and reported together once all
//! workers have joined.
//!
//! ```text
//! Job ──► BatchPartitioner ──► worker per chunk ──► AudioTransform
//!                                   │
//!                                   └──► ProgressCounter / failure list
//!                                                │
//!                        JobCoordinator ◄────────┘  (RunReport)
//! ```
//!
//! ## Features
//!
//! - `progress-tracking`: terminal progress bar reporter (adds `indicatif`)
//! - `cli`: the `amplify` binary (adds `clap`, `tracing-subscriber`, `ctrlc`)
//!
//! ## Error Handling
//!
//! Errors are layered. Validation problems are rejected before any work
//! starts, per-file transform errors are isolated and aggregated, and
//! everything else aborts the run:
//!
//! ```rust
//! use audio_amplify::{AmplifyError, BatchError, ValidationError};
//!
//! let err: AmplifyError = BatchError::Validation(ValidationError::MissingInputFolder).into();
//! match err {
//!     AmplifyError::Batch(BatchError::Validation(v)) => eprintln!("rejected: {v}"),
//!     other => eprintln!("failed: {other}"),
//! }
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use audio_amplify::{AudioFormat, Bitrate, Backend, JobCoordinator, JobRequest, RunOutcome};
//!
//! let request = JobRequest::new("in/", "out/")
//!     .gain_db(6.0)
//!     .bitrate(Bitrate::parse("192k")?)
//!     .format(AudioFormat::Mp3);
//!
//! let coordinator = JobCoordinator::new(Backend::Auto.build(None));
//! let report = coordinator.amplify(&request)?;
//! match report.outcome {
//!     RunOutcome::Success => println!("{} files amplified", report.processed),
//!     RunOutcome::PartialFailure(failures) => eprintln!("{} files failed", failures.len()),
//!     RunOutcome::Cancelled { .. } => eprintln!("run cancelled"),
//! }
//! # Ok::<(), audio_amplify::AmplifyError>(())
//! ```

mod error;

pub mod batch;
pub mod config;
pub mod format;
pub mod job;
pub mod transform;
pub mod utils;

pub use crate::batch::{
    BatchError, BatchResult, CancellationToken, Chunk, FileFailure, JobCoordinator,
    ProgressCounter, ProgressReporter, RunOutcome, RunReport, RunState, ValidationError,
    detected_parallelism, partition,
};
pub use crate::config::AmplifyConfig;
pub use crate::error::{AmplifyError, AmplifyResult};
pub use crate::format::{AudioFormat, Bitrate};
pub use crate::job::{Job, JobRequest};
pub use crate::transform::{AudioTransform, Backend, TransformError, TransformParams};
pub use crate::utils::audio_math::{amplitude_to_db, db_to_amplitude};
